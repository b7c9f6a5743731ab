use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::storage::StoredObject;
use super::tags::{TAG_DOC_TYPE, TAG_PERMISSION, TAG_PERSONA};

pub const RESULTS_CONTAINER: &str = "Results";
pub const NO_ANSWER: &str = "<no-answer>";

/// One extracted answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultField {
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub extraction_prompt: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub time_stamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl ResultField {
    /// Empty answers and the `<no-answer>` marker both count as unanswered.
    pub fn is_answered(&self) -> bool {
        let answer = self.answer.trim();
        !answer.is_empty() && !answer.eq_ignore_ascii_case(NO_ANSWER)
    }
}

/// Extraction results for one imported document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultsDocument {
    pub id: String,
    #[serde(default)]
    pub document_name: String,
    #[serde(default)]
    pub document_size: u64,
    #[serde(default)]
    pub time_imported: String,
    #[serde(default)]
    pub fields: Vec<ResultField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    #[default]
    All,
    Answered,
    NotAnswered,
}

/// Field filters from the review pages. Blank filters match everything.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field_name: String,
    pub prompt: String,
    pub time_stamp: String,
    pub data_type: String,
    /// Only applied in [`AnswerMode::All`].
    pub answer_text: String,
    pub answer_mode: AnswerMode,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl FieldFilter {
    pub fn matches(&self, field: &ResultField) -> bool {
        if !contains_ignore_case(&field.field_name, &self.field_name)
            || !contains_ignore_case(&field.extraction_prompt, &self.prompt)
            || !contains_ignore_case(&field.time_stamp, &self.time_stamp)
            || !contains_ignore_case(field.data_type.as_deref().unwrap_or(""), &self.data_type)
        {
            return false;
        }

        match self.answer_mode {
            AnswerMode::Answered => field.is_answered(),
            AnswerMode::NotAnswered => !field.is_answered(),
            AnswerMode::All => contains_ignore_case(&field.answer, &self.answer_text),
        }
    }
}

impl ResultsDocument {
    pub fn filter_fields(&self, filter: &FieldFilter) -> Vec<&ResultField> {
        self.fields.iter().filter(|f| filter.matches(f)).collect()
    }

    /// Fill persona, document type and permission from the uploaded object's tags.
    /// Present values are never overwritten. Returns whether anything changed.
    pub fn backfill_from(&mut self, object: &StoredObject) -> bool {
        let mut changed = false;
        for (slot, tag) in [
            (&mut self.persona, TAG_PERSONA),
            (&mut self.doc_type, TAG_DOC_TYPE),
            (&mut self.permission, TAG_PERMISSION),
        ] {
            let missing = slot.as_deref().map_or(true, |v| v.trim().is_empty());
            if missing {
                if let Some(value) = object.tag(tag) {
                    *slot = Some(value.to_string());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Backfill from whichever listed object carries this document's name.
    pub fn backfill_from_listing(&mut self, objects: &[StoredObject]) -> bool {
        match objects.iter().find(|o| o.key == self.document_name) {
            Some(object) => self.backfill_from(object),
            None => false,
        }
    }

    /// Fields saved without a timestamp get `now`. Returns how many were stamped.
    pub fn stamp_missing_timestamps(&mut self, now: DateTime<Utc>) -> usize {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut stamped = 0;
        for field in self.fields.iter_mut().filter(|f| f.time_stamp.trim().is_empty()) {
            field.time_stamp = stamp.clone();
            stamped += 1;
        }
        stamped
    }

    pub fn answered_count(&self) -> usize {
        self.fields.iter().filter(|f| f.is_answered()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn field(name: &str, answer: &str) -> ResultField {
        ResultField {
            field_name: name.to_string(),
            extraction_prompt: format!("What is the {}?", name.to_lowercase()),
            answer: answer.to_string(),
            time_stamp: "2024-05-01T10:00:00.000Z".to_string(),
            data_type: Some("text".to_string()),
        }
    }

    fn doc() -> ResultsDocument {
        ResultsDocument {
            id: "r1".to_string(),
            document_name: "agreement.pdf".to_string(),
            fields: vec![
                field("Borrower", "Acme Corp"),
                field("Lender", "<NO-ANSWER>"),
                field("Maturity", ""),
                field("Borrower Address", "1 Main St"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn answer_modes() {
        let doc = doc();
        let answered = FieldFilter {
            answer_mode: AnswerMode::Answered,
            ..Default::default()
        };
        let names: Vec<_> = doc
            .filter_fields(&answered)
            .iter()
            .map(|f| f.field_name.as_str())
            .collect();
        assert_eq!(names, ["Borrower", "Borrower Address"]);

        let unanswered = FieldFilter {
            answer_mode: AnswerMode::NotAnswered,
            ..Default::default()
        };
        assert_eq!(doc.filter_fields(&unanswered).len(), 2);
    }

    #[test]
    fn answer_text_only_applies_in_all_mode() {
        let doc = doc();
        let mut filter = FieldFilter {
            answer_text: "acme".to_string(),
            ..Default::default()
        };
        assert_eq!(doc.filter_fields(&filter).len(), 1);

        filter.answer_mode = AnswerMode::Answered;
        assert_eq!(doc.filter_fields(&filter).len(), 2);
    }

    #[test]
    fn substring_filters_are_case_insensitive() {
        let doc = doc();
        let filter = FieldFilter {
            field_name: "BORROWER".to_string(),
            prompt: "address".to_string(),
            ..Default::default()
        };
        let matched = doc.filter_fields(&filter);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].field_name, "Borrower Address");
    }

    #[test]
    fn backfill_never_overwrites() {
        let mut doc = doc();
        doc.persona = Some("legal".to_string());
        let object = StoredObject {
            key: "agreement.pdf".to_string(),
            size_bytes: 1,
            last_modified: None,
            content_type: None,
            metadata_tags: [
                ("persona", "uw"),
                ("doctype", "loan"),
                ("permission", "Private"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            url: String::new(),
        };

        assert!(doc.backfill_from_listing(std::slice::from_ref(&object)));
        assert_eq!(doc.persona.as_deref(), Some("legal"));
        assert_eq!(doc.doc_type.as_deref(), Some("loan"));
        assert_eq!(doc.permission.as_deref(), Some("Private"));
        assert!(!doc.backfill_from(&object));
    }

    #[test]
    fn stamps_only_empty_timestamps() {
        let mut doc = doc();
        doc.fields[0].time_stamp.clear();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        assert_eq!(doc.stamp_missing_timestamps(now), 1);
        assert_eq!(doc.fields[0].time_stamp, "2024-06-01T12:00:00.000Z");
        assert_eq!(doc.fields[1].time_stamp, "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let doc: ResultsDocument =
            serde_json::from_str(r#"{"id":"x","fields":[{"fieldName":"A"}]}"#).unwrap();
        assert_eq!(doc.fields[0].answer, "");
        assert!(!doc.fields[0].is_answered());
    }
}
