use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::xml::XmlElement;

/// Classification of an effect definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Audio,
    Custom,
    Hidden,
}

impl AssetKind {
    /// Map an explicit `type` attribute value. Unknown values yield `None` so the
    /// caller can fall through to engine metadata.
    pub fn from_type_attr(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "custom" => Some(Self::Custom),
            "hidden" => Some(Self::Hidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Custom => "custom",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a definition came from, in increasing precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOrigin {
    /// Enumerated from the engine's own service registry
    Builtin,
    /// Definition file shipped with the application
    Bundled(PathBuf),
    /// Definition file from a user configuration directory
    User(PathBuf),
}

impl AssetOrigin {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Builtin => None,
            Self::Bundled(p) | Self::User(p) => Some(p),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::Bundled(_) => "bundled",
            Self::User(_) => "user",
        }
    }
}

/// One effect definition as held by the registry
///
/// Entries are immutable once built. A reload or a higher-precedence
/// registration replaces the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    /// Registry key
    pub id: String,

    /// Engine service name used to instantiate the filter
    pub service: String,

    /// Human-readable name
    pub display_name: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Classification
    pub kind: AssetKind,

    /// Parsed definition tree
    pub xml: XmlElement,

    /// Source of the definition
    pub origin: AssetOrigin,
}

/// Identifying pair returned after reloading a definition file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub id: String,
    pub service: String,
}

impl From<&AssetInfo> for AssetRef {
    fn from(info: &AssetInfo) -> Self {
        Self {
            id: info.id.clone(),
            service: info.service.clone(),
        }
    }
}
