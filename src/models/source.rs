// src/models/source.rs

//! Harvest sources and their per-source configuration.
//!
//! A source's configuration travels as a JSON document (that is how catalog
//! operators store it on the source). It is parsed and validated once, before
//! any run starts, into a [`SourceConfig`] value that is then passed
//! explicitly through every stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{GroupRef, Tag};

/// A remote catalog to harvest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestSource {
    /// Unique source identifier
    pub id: String,

    /// Catalog URL or local path
    pub url: String,

    /// Organization that owns harvested records by default
    #[serde(default)]
    pub owner_org: Option<String>,

    /// Raw JSON configuration string
    #[serde(default)]
    pub config: Option<String>,
}

impl HarvestSource {
    /// Parse and validate this source's configuration.
    pub fn parsed_config(&self) -> Result<SourceConfig> {
        match self.config.as_deref() {
            Some(raw) if !raw.trim().is_empty() => SourceConfig::from_json(raw),
            _ => Ok(SourceConfig::default()),
        }
    }
}

/// How issued/modified timestamps are stored locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateConvention {
    /// Verbatim timestamps in `dcat_issued` / `dcat_modified` extras
    #[default]
    Extras,
    /// Date-only `released` / `modified` record fields
    TopLevel,
}

/// Deployment-specific knobs for the remote → local mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterProfile {
    #[serde(default)]
    pub date_convention: DateConvention,

    /// Locale under which titles/descriptions are also stored as translations
    #[serde(default)]
    pub locale: Option<String>,

    /// Split keywords on `keyword_separator` and sanitize them
    #[serde(default)]
    pub split_keywords: bool,

    #[serde(default = "defaults::keyword_separator")]
    pub keyword_separator: char,

    /// Formats floated to the front of the resource list, in order
    #[serde(default)]
    pub format_order: Vec<String>,

    /// Classification stamped on every record
    #[serde(default)]
    pub classification: Option<String>,
}

impl Default for ConverterProfile {
    fn default() -> Self {
        Self {
            date_convention: DateConvention::default(),
            locale: None,
            split_keywords: false,
            keyword_separator: defaults::keyword_separator(),
            format_order: Vec::new(),
            classification: None,
        }
    }
}

/// Validated per-source harvest configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub organizations_filter_include: Vec<String>,

    #[serde(default)]
    pub organizations_filter_exclude: Vec<String>,

    #[serde(default)]
    pub default_tags: Vec<Tag>,

    /// Group names or ids, resolved against the catalog before a run
    #[serde(default)]
    pub default_groups: Vec<String>,

    #[serde(default, skip_deserializing)]
    pub default_group_refs: Vec<GroupRef>,

    #[serde(default)]
    pub default_extras: BTreeMap<String, String>,

    /// Replace existing extras with defaults instead of only filling gaps
    #[serde(default)]
    pub override_extras: bool,

    /// Re-import every record as a change
    #[serde(default)]
    pub force_import: bool,

    /// Per-source payload limit in bytes
    #[serde(default)]
    pub max_file_size: Option<u64>,

    #[serde(default)]
    pub profile: ConverterProfile,
}

impl SourceConfig {
    /// Parse a JSON configuration string, rejecting malformed defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| AppError::config(format!("source config is not valid JSON: {e}")))?;
        Self::validate_shape(&value)?;
        serde_json::from_value(value).map_err(|e| AppError::config(e.to_string()))
    }

    fn validate_shape(value: &Value) -> Result<()> {
        let Some(obj) = value.as_object() else {
            return Err(AppError::config("source config must be a JSON object"));
        };

        if let Some(tags) = obj.get("default_tags") {
            let list = tags
                .as_array()
                .ok_or_else(|| AppError::config("default_tags must be a list"))?;
            if list.iter().any(|t| !t.is_object()) {
                return Err(AppError::config(
                    "default_tags must be a list of dictionaries",
                ));
            }
        }

        if let Some(groups) = obj.get("default_groups") {
            let list = groups.as_array().ok_or_else(|| {
                AppError::config("default_groups must be a *list* of group names/ids")
            })?;
            if list.iter().any(|g| !g.is_string()) {
                return Err(AppError::config(
                    "default_groups must be a list of group names/ids (i.e. strings)",
                ));
            }
        }

        if let Some(extras) = obj.get("default_extras") {
            let map = extras
                .as_object()
                .ok_or_else(|| AppError::config("default_extras must be a dictionary"))?;
            if map.values().any(|v| !v.is_string()) {
                return Err(AppError::config("default_extras values must be strings"));
            }
        }

        for key in ["organizations_filter_include", "organizations_filter_exclude"] {
            if let Some(filter) = obj.get(key) {
                let ok = filter
                    .as_array()
                    .is_some_and(|list| list.iter().all(Value::is_string));
                if !ok {
                    return Err(AppError::config(format!("{key} must be a list of strings")));
                }
            }
        }

        Ok(())
    }

    /// Whether a record from this publisher should be harvested.
    pub fn accepts_publisher(&self, publisher: Option<&str>) -> bool {
        if !self.organizations_filter_include.is_empty() {
            return publisher
                .is_some_and(|p| self.organizations_filter_include.iter().any(|o| o == p));
        }
        if !self.organizations_filter_exclude.is_empty() {
            return !publisher
                .is_some_and(|p| self.organizations_filter_exclude.iter().any(|o| o == p));
        }
        true
    }
}

mod defaults {
    pub fn keyword_separator() -> char {
        ';'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let source = HarvestSource {
            id: "boston".into(),
            url: "http://example.com/data.json".into(),
            owner_org: None,
            config: Some("  ".into()),
        };
        let config = source.parsed_config().unwrap();
        assert!(config.default_tags.is_empty());
        assert_eq!(config.profile.keyword_separator, ';');
    }

    #[test]
    fn parses_full_config() {
        let config = SourceConfig::from_json(
            r#"{
                "default_tags": [{"name": "geo"}],
                "default_groups": ["maps"],
                "default_extras": {"harvested_by": "dcat"},
                "override_extras": true,
                "profile": {"date_convention": "top_level", "split_keywords": true}
            }"#,
        )
        .unwrap();
        assert_eq!(config.default_tags, vec![Tag::new("geo")]);
        assert_eq!(config.default_groups, vec!["maps".to_string()]);
        assert!(config.override_extras);
        assert_eq!(config.profile.date_convention, DateConvention::TopLevel);
        assert!(config.profile.split_keywords);
    }

    #[test]
    fn rejects_tags_that_are_not_a_list() {
        let err = SourceConfig::from_json(r#"{"default_tags": "geo"}"#).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("must be a list")));
    }

    #[test]
    fn rejects_tags_that_are_strings() {
        let err = SourceConfig::from_json(r#"{"default_tags": ["geo"]}"#).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("dictionaries")));
    }

    #[test]
    fn rejects_groups_that_are_objects() {
        let err = SourceConfig::from_json(r#"{"default_groups": [{"name": "x"}]}"#).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn rejects_extras_that_are_a_list() {
        let err = SourceConfig::from_json(r#"{"default_extras": ["a"]}"#).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("dictionary")));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            SourceConfig::from_json("{not json").unwrap_err(),
            AppError::Config(_)
        ));
    }

    #[test]
    fn include_filter_wins_over_exclude() {
        let config = SourceConfig {
            organizations_filter_include: vec!["Parks".into()],
            organizations_filter_exclude: vec!["Parks".into()],
            ..SourceConfig::default()
        };
        assert!(config.accepts_publisher(Some("Parks")));
        assert!(!config.accepts_publisher(Some("Roads")));
        assert!(!config.accepts_publisher(None));
    }

    #[test]
    fn exclude_filter_drops_publisher() {
        let config = SourceConfig {
            organizations_filter_exclude: vec!["Roads".into()],
            ..SourceConfig::default()
        };
        assert!(!config.accepts_publisher(Some("Roads")));
        assert!(config.accepts_publisher(Some("Parks")));
        assert!(config.accepts_publisher(None));
    }
}
