use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Flat string-to-string metadata persisted alongside an object.
pub type MetadataTags = BTreeMap<String, String>;

pub const TAG_PERMISSION: &str = "permission";
pub const TAG_DOC_TYPE: &str = "doctype";
pub const TAG_PERSONA: &str = "persona";

/// Visibility level attached to an uploaded document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Permission {
    Private,
    #[serde(rename = "Org-Wide")]
    OrgWide,
    Public,
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Permission::Private => write!(f, "Private"),
            Permission::OrgWide => write!(f, "Org-Wide"),
            Permission::Public => write!(f, "Public"),
        }
    }
}

impl FromStr for Permission {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "private" => Ok(Permission::Private),
            "org-wide" | "orgwide" => Ok(Permission::OrgWide),
            "public" => Ok(Permission::Public),
            _ => Err(anyhow::anyhow!("Invalid permission: {}", s)),
        }
    }
}

/// The well-known tags the upload pages attach to every file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadTags {
    pub permission: Option<Permission>,
    pub doc_type: Option<String>,
    pub persona: Option<String>,
}

impl UploadTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    pub fn persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.permission.is_none() && self.doc_type.is_none() && self.persona.is_none()
    }

    /// Only present, non-blank tags are written.
    pub fn to_metadata(&self) -> MetadataTags {
        let mut tags = MetadataTags::new();
        if let Some(permission) = self.permission {
            tags.insert(TAG_PERMISSION.to_string(), permission.to_string());
        }
        if let Some(doc_type) = self.doc_type.as_deref().filter(|v| !v.trim().is_empty()) {
            tags.insert(TAG_DOC_TYPE.to_string(), doc_type.to_string());
        }
        if let Some(persona) = self.persona.as_deref().filter(|v| !v.trim().is_empty()) {
            tags.insert(TAG_PERSONA.to_string(), persona.to_string());
        }
        tags
    }

    /// Read the well-known tags back; an unrecognised permission value is dropped.
    pub fn from_metadata(tags: &MetadataTags) -> Self {
        Self {
            permission: tags.get(TAG_PERMISSION).and_then(|v| v.parse().ok()),
            doc_type: tags.get(TAG_DOC_TYPE).cloned(),
            persona: tags.get(TAG_PERSONA).cloned(),
        }
    }
}

impl From<UploadTags> for MetadataTags {
    fn from(tags: UploadTags) -> Self {
        tags.to_metadata()
    }
}
