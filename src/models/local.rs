// src/models/local.rs

//! Local catalog record shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved extra keys used to carry fields with no native local counterpart.
pub mod extra_keys {
    pub const ISSUED: &str = "dcat_issued";
    pub const MODIFIED: &str = "dcat_modified";
    pub const PUBLISHER_NAME: &str = "dcat_publisher_name";
    pub const PUBLISHER_EMAIL: &str = "dcat_publisher_email";
    pub const GUID: &str = "guid";
    pub const LANGUAGE: &str = "language";
    pub const SPATIAL: &str = "spatial";
}

/// A dataset record in the local catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// URL-safe unique name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Title keyed by locale
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub title_translated: BTreeMap<String, String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub notes_translated: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub extras: Vec<Extra>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_point: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_point_email: Option<String>,

    /// Issued date (`YYYY-MM-DD`) when dates are kept as top-level fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,

    /// Modified date (`YYYY-MM-DD`) when dates are kept as top-level fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,

    /// Access-level classification (e.g. "public")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,

    #[serde(default)]
    pub state: RecordState,

    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl LocalDataset {
    /// Value of the first extra with the given key.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    /// Set an extra, replacing any existing entries with the same key in place.
    pub fn set_extra(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.extras.iter().position(|e| e.key == key) {
            Some(idx) => {
                self.extras[idx].value = value;
                let mut seen = false;
                self.extras.retain(|e| {
                    if e.key != key {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.extras.push(Extra::new(key, value)),
        }
    }

    /// Title, falling back to the first translated title.
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or_else(|| self.title_translated.values().next().map(String::as_str))
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    pub fn is_active(&self) -> bool {
        self.state == RecordState::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// An open-ended key/value slot on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    pub key: String,
    pub value: String,
}

impl Extra {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Reference to a catalog group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    #[default]
    Active,
    Deleted,
}

/// A downloadable artifact attached to a local record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable identifier carried over from a previous import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}
