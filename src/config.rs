// src/config.rs

//! Configuration loading utilities.
//!
//! Loads the application config and turns each source's raw JSON config
//! into a validated [`SourceConfig`] with its default groups resolved.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, HarvestSource, SourceConfig};
use crate::storage::CatalogActions;

/// Load configuration from a TOML file, validating it.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load(path)?
    } else {
        log::warn!("No config at {}, using defaults", path.display());
        Config::default()
    };
    config.validate()?;
    Ok(config)
}

/// Parse a source's config and resolve its default groups.
pub async fn prepare_source(
    source: &HarvestSource,
    catalog: &dyn CatalogActions,
) -> Result<SourceConfig> {
    let mut config = source.parsed_config()?;
    resolve_groups(&mut config, catalog).await?;
    log::debug!("Using config for {}: {:?}", source.id, config);
    Ok(config)
}

/// Look up every default group; an unknown group is a config error.
pub async fn resolve_groups(config: &mut SourceConfig, catalog: &dyn CatalogActions) -> Result<()> {
    let mut refs = Vec::with_capacity(config.default_groups.len());
    for name_or_id in &config.default_groups {
        let group = catalog
            .show_group(name_or_id)
            .await?
            .ok_or_else(|| AppError::config(format!("Default group not found: {name_or_id}")))?;
        refs.push(group);
    }
    config.default_group_refs = refs;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupRef;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn source(config: &str) -> HarvestSource {
        HarvestSource {
            id: "src".into(),
            url: "http://example.com/data.json".into(),
            owner_org: None,
            config: Some(config.into()),
        }
    }

    #[tokio::test]
    async fn resolves_known_groups() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage
            .add_group(GroupRef {
                id: Some("g-1".into()),
                name: "maps".into(),
            })
            .await
            .unwrap();

        let config = prepare_source(&source(r#"{"default_groups": ["g-1"]}"#), &storage)
            .await
            .unwrap();
        assert_eq!(config.default_group_refs[0].name, "maps");
    }

    #[tokio::test]
    async fn unknown_group_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let err = prepare_source(&source(r#"{"default_groups": ["nope"]}"#), &storage)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("nope")));
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert!(config.sources.is_empty());
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[import]\nconcurrency = 0\n").unwrap();
        assert!(matches!(load_config(&path), Err(AppError::Config(_))));
    }
}
