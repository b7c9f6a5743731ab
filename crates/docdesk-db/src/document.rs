use crate::traits::{DocumentStoreError, DocumentStoreResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object with a required, non-empty string `id`.
///
/// Fields other than `id` are opaque to the store and preserved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn from_value(value: Value) -> DocumentStoreResult<Self> {
        match value {
            Value::Object(map) => Self::try_from(map),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Serialize a typed registry entry into a document.
    pub fn from_typed<T: Serialize>(value: &T) -> DocumentStoreResult<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| DocumentStoreError::InvalidDocument(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn to_typed<T: DeserializeOwned>(&self) -> DocumentStoreResult<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| DocumentStoreError::Decode(format!("document {}: {}", self.id(), e)))
    }

    pub fn id(&self) -> &str {
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl TryFrom<Map<String, Value>> for Document {
    type Error = DocumentStoreError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        match map.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => Ok(Document(map)),
            Some(Value::String(_)) => Err(DocumentStoreError::InvalidDocument(
                "id must not be empty".to_string(),
            )),
            Some(other) => Err(DocumentStoreError::InvalidDocument(format!(
                "id must be a string, got {}",
                json_kind(other)
            ))),
            None => Err(DocumentStoreError::InvalidDocument(
                "missing id".to_string(),
            )),
        }
    }
}

impl From<Document> for Map<String, Value> {
    fn from(document: Document) -> Self {
        document.0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_string_id() {
        assert!(Document::from_value(json!({"id": "p1", "personaName": "Underwriter"})).is_ok());
        assert!(matches!(
            Document::from_value(json!({"personaName": "Underwriter"})),
            Err(DocumentStoreError::InvalidDocument(_))
        ));
        assert!(Document::from_value(json!({"id": 7})).is_err());
        assert!(Document::from_value(json!({"id": ""})).is_err());
        assert!(Document::from_value(json!(["id"])).is_err());
    }

    #[test]
    fn preserves_unknown_fields() {
        let doc = Document::from_value(json!({"id": "r1", "_etag": "abc", "extra": [1, 2]})).unwrap();
        assert_eq!(doc.id(), "r1");
        assert_eq!(doc.get("_etag"), Some(&json!("abc")));
        assert_eq!(doc.into_value()["extra"], json!([1, 2]));
    }

    #[test]
    fn deserialization_validates_id() {
        let docs: Result<Vec<Document>, _> = serde_json::from_str(r#"[{"id":"a"},{"name":"b"}]"#);
        assert!(docs.is_err());

        let docs: Vec<Document> = serde_json::from_str(r#"[{"id":"a"},{"id":"b"}]"#).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn typed_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Entry {
            id: String,
            count: u32,
        }

        let entry = Entry {
            id: "e1".to_string(),
            count: 3,
        };
        let doc = Document::from_typed(&entry).unwrap();
        assert_eq!(doc.id(), "e1");
        assert_eq!(doc.to_typed::<Entry>().unwrap(), entry);
    }
}
