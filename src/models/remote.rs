// src/models/remote.rs

//! DCAT JSON dataset records as published by a remote catalog.
//!
//! Fields that sources publish in more than one shape (`publisher`,
//! `byteSize`) are resolved into a single canonical shape while
//! deserializing, so the converter only ever sees one representation.

use serde::{Deserialize, Deserializer, Serialize};

/// One dataset description from a remote DCAT catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDataset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,

    #[serde(default, deserialize_with = "string_list")]
    pub keyword: Vec<String>,

    /// Bounding box, `"minX,minY,maxX,maxY"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,

    #[serde(default, skip_serializing_if = "Publisher::is_empty")]
    pub publisher: Publisher,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_point: Option<ContactPoint>,

    #[serde(
        default,
        deserialize_with = "identifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub identifier: Option<String>,

    #[serde(default, deserialize_with = "string_list", skip_serializing_if = "Vec::is_empty")]
    pub language: Vec<String>,

    #[serde(default)]
    pub distribution: Vec<Distribution>,
}

/// Publisher in canonical form.
///
/// Sources send either a bare name or `{name, mbox}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PublisherShape")]
pub struct Publisher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mbox: Option<String>,
}

impl Publisher {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            mbox: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.mbox.is_none()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PublisherShape {
    Name(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default, alias = "mailbox")]
        mbox: Option<String>,
    },
    Other(serde_json::Value),
}

impl From<PublisherShape> for Publisher {
    fn from(shape: PublisherShape) -> Self {
        match shape {
            PublisherShape::Name(name) => Self {
                name: non_empty(name),
                mbox: None,
            },
            PublisherShape::Detailed { name, mbox } => Self {
                name: name.and_then(non_empty),
                mbox: mbox.and_then(non_empty),
            },
            PublisherShape::Other(_) => Self::default(),
        }
    }
}

/// Contact point (vCard subset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPoint {
    #[serde(rename = "fn", alias = "displayName", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// `mailto:` URI
    #[serde(rename = "hasEmail", alias = "mailbox", default, skip_serializing_if = "Option::is_none")]
    pub has_email: Option<String>,
}

impl ContactPoint {
    /// Email address without the `mailto:` scheme.
    pub fn email(&self) -> Option<String> {
        let raw = self.has_email.as_deref()?.trim();
        let address = match raw.split_once(':') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("mailto") => rest,
            _ => raw,
        };
        non_empty(address.to_string())
    }
}

/// One downloadable artifact of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(rename = "downloadURL", default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    #[serde(rename = "accessURL", default, skip_serializing_if = "Option::is_none")]
    pub access_url: Option<String>,

    #[serde(default, deserialize_with = "byte_size", skip_serializing_if = "Option::is_none")]
    pub byte_size: Option<u64>,
}

impl Distribution {
    /// The URL a client should use: download first, then access.
    pub fn url(&self) -> Option<&str> {
        self.download_url
            .as_deref()
            .or(self.access_url.as_deref())
            .filter(|u| !u.trim().is_empty())
    }
}

/// Keep a string only if it has visible content.
fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarShape {
    Int(u64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

/// `byteSize` arrives as an integer or a numeric string; anything else is dropped.
fn byte_size<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let shape = Option::<ScalarShape>::deserialize(deserializer)?;
    Ok(match shape {
        None => None,
        Some(ScalarShape::Int(n)) => Some(n),
        Some(ScalarShape::Float(f)) if f >= 0.0 && f.fract() == 0.0 => Some(f as u64),
        Some(ScalarShape::Text(text)) => match text.trim().parse::<u64>() {
            Ok(n) => Some(n),
            Err(_) => {
                log::debug!("Dropping non-numeric byteSize {text:?}");
                None
            }
        },
        Some(_) => {
            log::debug!("Dropping unusable byteSize value");
            None
        }
    })
}

/// Identifiers are usually strings, but some catalogs emit numbers.
fn identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let shape = Option::<ScalarShape>::deserialize(deserializer)?;
    Ok(match shape {
        Some(ScalarShape::Int(n)) => Some(n.to_string()),
        Some(ScalarShape::Text(text)) => non_empty(text),
        _ => None,
    })
}

/// Lists that some sources publish as a single string.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListShape {
        Many(Vec<serde_json::Value>),
        One(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<ListShape>::deserialize(deserializer)? {
        Some(ListShape::Many(values)) => values
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => non_empty(s),
                _ => None,
            })
            .collect(),
        Some(ListShape::One(value)) => non_empty(value).into_iter().collect(),
        Some(ListShape::Other(_)) | None => Vec::new(),
    })
}
