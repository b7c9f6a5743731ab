use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tags::{MetadataTags, UploadTags, TAG_DOC_TYPE, TAG_PERSONA};

/// One object in a collection listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    pub key: String,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub metadata_tags: MetadataTags,
    pub url: String,
}

impl StoredObject {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.metadata_tags.get(key).map(String::as_str)
    }

    pub fn tags(&self) -> UploadTags {
        UploadTags::from_metadata(&self.metadata_tags)
    }

    /// Whether the object was uploaded for this persona and document type.
    pub fn matches_selection(&self, persona: &str, doc_type: &str) -> bool {
        self.tag(TAG_PERSONA) == Some(persona) && self.tag(TAG_DOC_TYPE) == Some(doc_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(tags: &[(&str, &str)]) -> StoredObject {
        StoredObject {
            key: "agreement.pdf".to_string(),
            size_bytes: 10,
            last_modified: None,
            content_type: Some("application/pdf".to_string()),
            metadata_tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            url: "http://localhost/reports/agreement.pdf".to_string(),
        }
    }

    #[test]
    fn selection_requires_both_tags() {
        let obj = object(&[("persona", "p1"), ("doctype", "loan")]);
        assert!(obj.matches_selection("p1", "loan"));
        assert!(!obj.matches_selection("p1", "lease"));

        let untagged = object(&[("persona", "p1")]);
        assert!(!untagged.matches_selection("p1", "loan"));
    }
}
