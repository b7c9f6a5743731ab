use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

pub const QUERY_SETS_CONTAINER: &str = "Queries";

/// Expected shape of an extracted answer.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Text,
    Date,
    Number,
    Currency,
    Summary50,
    Summary100,
}

impl Display for DataType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DataType::Text => write!(f, "text"),
            DataType::Date => write!(f, "date"),
            DataType::Number => write!(f, "number"),
            DataType::Currency => write!(f, "currency"),
            DataType::Summary50 => write!(f, "summary50"),
            DataType::Summary100 => write!(f, "summary100"),
        }
    }
}

impl FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(DataType::Text),
            "date" => Ok(DataType::Date),
            "number" => Ok(DataType::Number),
            "currency" => Ok(DataType::Currency),
            "summary50" => Ok(DataType::Summary50),
            "summary100" => Ok(DataType::Summary100),
            _ => Err(anyhow::anyhow!("Invalid data type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QueryField {
    pub field_name: String,
    pub extraction_prompt: String,
    #[serde(default)]
    pub data_type: DataType,
}

/// The extraction fields to run against one document type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuerySet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub document_type: String,
    #[serde(default)]
    pub fields: Vec<QueryField>,
}

impl QuerySet {
    /// Query sets are keyed by document type when saved without an explicit id.
    pub fn ensure_id(&mut self) -> &str {
        self.id.get_or_insert_with(|| self.document_type.clone())
    }

    pub fn field(&self, name: &str) -> Option<&QueryField> {
        self.fields.iter().find(|f| f.field_name == name)
    }
}
