use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::results::{ResultField, ResultsDocument};

pub const QUALITY_CONTAINER: &str = "Quality";

/// A result field under human review.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QualityField {
    #[serde(flatten)]
    pub result: ResultField,
    #[serde(default)]
    pub quality_answer: String,
    /// Kept as entered (e.g. "97").
    #[serde(default)]
    pub match_pct: String,
    #[serde(default)]
    pub approved: bool,
}

impl From<&ResultField> for QualityField {
    fn from(result: &ResultField) -> Self {
        Self {
            result: result.clone(),
            quality_answer: String::new(),
            match_pct: String::new(),
            approved: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QualityDocument {
    pub id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub query_set: String,
    #[serde(default)]
    pub persona: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub fields: Vec<QualityField>,
}

impl QualityDocument {
    /// Start a review of `results`: every field copied, nothing approved yet.
    pub fn from_results(
        results: &ResultsDocument,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: results.document_name.clone(),
            query_set: results.doc_type.clone().unwrap_or_default(),
            persona: results.persona.clone().unwrap_or_default(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            fields: results.fields.iter().map(QualityField::from).collect(),
        }
    }

    pub fn approved_count(&self) -> usize {
        self.fields.iter().filter(|f| f.approved).count()
    }

    pub fn is_fully_approved(&self) -> bool {
        !self.fields.is_empty() && self.fields.iter().all(|f| f.approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn derives_review_from_results() {
        let results = ResultsDocument {
            id: "r1".to_string(),
            document_name: "agreement.pdf".to_string(),
            doc_type: Some("loan".to_string()),
            persona: None,
            fields: vec![ResultField {
                field_name: "Borrower".to_string(),
                answer: "Acme".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let quality = QualityDocument::from_results(&results, "q1", created);
        assert_eq!(quality.file_name, "agreement.pdf");
        assert_eq!(quality.query_set, "loan");
        assert_eq!(quality.persona, "");
        assert_eq!(quality.created_at, "2024-06-01T00:00:00.000Z");
        assert_eq!(quality.fields.len(), 1);
        assert_eq!(quality.fields[0].result.answer, "Acme");
        assert!(quality.fields[0].quality_answer.is_empty());
        assert!(!quality.is_fully_approved());
    }

    #[test]
    fn field_serializes_flat() {
        let field = QualityField {
            result: ResultField {
                field_name: "Lender".to_string(),
                ..Default::default()
            },
            match_pct: "97".to_string(),
            approved: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["fieldName"], "Lender");
        assert_eq!(json["matchPct"], "97");
        assert_eq!(json["approved"], true);
        assert!(json.get("result").is_none());
    }
}
