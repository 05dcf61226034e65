// src/pipeline/import.rs

//! Import stage: turn work items into catalog records.
//!
//! Each item is processed in isolation. A failing item is reported and the
//! rest of the run continues; records already written stay written.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::convert::{Conversion, remote_to_local};
use crate::error::{AppError, Result};
use crate::models::{
    HarvestReport, HarvestSource, ItemError, LocalDataset, RemoteDataset, SourceConfig, WorkItem,
    WorkStatus, extra_keys,
};
use crate::pipeline::fetch::{HarvestHooks, run_fetch};
use crate::storage::{CatalogActions, HarvestStore};
use crate::utils::slugify;

const MAX_NAME_LEN: usize = 100;
const MAX_NAME_SUFFIX: u32 = 1000;

/// Everything import needs for one source's run.
pub struct ImportContext<'a> {
    pub source: &'a HarvestSource,
    pub config: &'a SourceConfig,
    pub store: &'a dyn HarvestStore,
    pub catalog: &'a dyn CatalogActions,
    pub hooks: &'a dyn HarvestHooks,
    /// Acting user for catalog writes
    pub user: &'a str,
    /// Held from picking a generated name until the record is written
    naming: Mutex<()>,
}

impl<'a> ImportContext<'a> {
    pub fn new(
        source: &'a HarvestSource,
        config: &'a SourceConfig,
        store: &'a dyn HarvestStore,
        catalog: &'a dyn CatalogActions,
        hooks: &'a dyn HarvestHooks,
        user: &'a str,
    ) -> Self {
        Self {
            source,
            config,
            store,
            catalog,
            hooks,
            user,
            naming: Mutex::new(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Created,
    Updated,
    Deleted,
    Skipped,
}

/// Result of importing one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Imported {
    pub action: ImportAction,
    pub record_id: Option<String>,
    /// Fields dropped during conversion
    pub warnings: usize,
}

impl Imported {
    fn new(action: ImportAction, record_id: Option<String>) -> Self {
        Self {
            action,
            record_id,
            warnings: 0,
        }
    }
}

/// Import every item, up to `concurrency` at a time, tallying into `report`.
pub async fn run_import(
    ctx: &ImportContext<'_>,
    item_ids: &[Uuid],
    concurrency: usize,
    report: &mut HarvestReport,
) {
    let mut results = stream::iter(item_ids.iter().copied())
        .map(|id| async move { (id, process(ctx, id).await) })
        .buffer_unordered(concurrency.max(1));

    while let Some((id, (guid, result))) = results.next().await {
        match result {
            Ok(imported) => {
                report.conversion_warnings += imported.warnings;
                match imported.action {
                    ImportAction::Created => report.created += 1,
                    ImportAction::Updated => report.updated += 1,
                    ImportAction::Deleted => report.deleted += 1,
                    ImportAction::Skipped => report.skipped += 1,
                }
            }
            Err(err) => {
                log::warn!("Import failed for {guid} (item {id}): {err}");
                report.item_errors.push(ItemError {
                    item_id: id,
                    guid,
                    message: err.to_string(),
                });
            }
        }
    }
}

async fn process(ctx: &ImportContext<'_>, id: Uuid) -> (String, Result<Imported>) {
    let item = match ctx.store.load_item(id).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            return (String::new(), Err(AppError::validation(format!("work item {id} not found"))));
        }
        Err(err) => return (String::new(), Err(err)),
    };
    let result = fetch_and_import(ctx, &item).await;
    (item.guid, result)
}

async fn fetch_and_import(ctx: &ImportContext<'_>, item: &WorkItem) -> Result<Imported> {
    if !run_fetch(ctx.hooks, item)? {
        return Ok(Imported::new(ImportAction::Skipped, None));
    }
    import_item(ctx, item).await
}

/// Apply one work item to the catalog.
pub async fn import_item(ctx: &ImportContext<'_>, item: &WorkItem) -> Result<Imported> {
    let force = ctx.config.force_import;
    let status = match item.status {
        WorkStatus::Delete => WorkStatus::Delete,
        _ if force => WorkStatus::Change,
        other => other,
    };

    if status == WorkStatus::Delete {
        return delete_item(ctx, item).await;
    }

    let content = item
        .content
        .as_deref()
        .ok_or_else(|| AppError::validation(format!("Empty content for object {}", item.id)))?;
    let remote: RemoteDataset = serde_json::from_str(content)
        .map_err(|e| AppError::parse(format!("record {}", item.guid), e))?;

    let Conversion {
        mut record,
        warnings,
    } = remote_to_local(&remote, &ctx.config.profile);
    for warning in &warnings {
        log::warn!("{}: dropped {}", item.guid, warning);
    }

    let existing = match status {
        WorkStatus::Change => existing_record(ctx, item).await?,
        _ => None,
    };

    // A free name stays free only until the write that claims it.
    let naming = if record.name.is_none() {
        let guard = ctx.naming.lock().await;
        record.name = Some(record_name(ctx.catalog, &record, existing.as_ref(), &item.guid).await?);
        Some(guard)
    } else {
        None
    };
    record.set_extra(extra_keys::GUID, item.guid.as_str());

    if let Some(existing) = &existing {
        carry_resource_ids(&mut record, existing);
    }

    apply_source_defaults(&mut record, ctx.config);
    ctx.hooks.modify_record(&mut record, &remote, item);
    if record.owner_org.is_none() {
        record.owner_org = ctx.source.owner_org.clone();
    }

    let update_target = match status {
        WorkStatus::Change => item
            .record_id
            .clone()
            .or_else(|| existing.as_ref().and_then(|r| r.id.clone())),
        _ => None,
    };
    if status == WorkStatus::Change && update_target.is_none() {
        log::warn!("No existing record for changed guid {}, creating one", item.guid);
    }

    // Read before writing so the swap fails if another run got there first.
    let expected = if force {
        None
    } else {
        ctx.store
            .current_item(&ctx.source.id, &item.guid)
            .await?
            .map(|current| current.id)
    };

    let (action, record_id) = match update_target {
        Some(record_id) => {
            record.id = Some(record_id.clone());
            ctx.catalog.update_record(record, ctx.user).await?;
            log::info!("Updated record {record_id} for guid {}", item.guid);
            (ImportAction::Updated, record_id)
        }
        None => {
            let record_id = Uuid::new_v4().to_string();
            record.id = Some(record_id.clone());
            ctx.catalog.create_record(record, ctx.user).await?;
            log::info!("Created record {record_id} for guid {}", item.guid);
            (ImportAction::Created, record_id)
        }
    };
    drop(naming);

    if !force {
        ctx.store
            .swap_current(&ctx.source.id, &item.guid, expected, item.id, Some(&record_id))
            .await?;
    }

    Ok(Imported {
        action,
        record_id: Some(record_id),
        warnings: warnings.len(),
    })
}

async fn delete_item(ctx: &ImportContext<'_>, item: &WorkItem) -> Result<Imported> {
    match item.record_id.as_deref() {
        Some(record_id) => {
            ctx.catalog.delete_record(record_id, ctx.user).await?;
            log::info!("Deleted record {record_id} with guid {}", item.guid);
        }
        None => log::warn!("Nothing to delete for guid {}: no record attached", item.guid),
    }
    Ok(Imported::new(ImportAction::Deleted, item.record_id.clone()))
}

/// The active record previously harvested for this item's guid.
async fn existing_record(ctx: &ImportContext<'_>, item: &WorkItem) -> Result<Option<LocalDataset>> {
    if let Some(found) = ctx.catalog.lookup_by_external_id(&item.guid).await? {
        return Ok(Some(found));
    }
    match item.record_id.as_deref() {
        Some(record_id) => Ok(ctx
            .catalog
            .show_record(record_id)
            .await?
            .filter(LocalDataset::is_active)),
        None => Ok(None),
    }
}

/// Keep the existing name while the title is unchanged, else derive a new
/// unique one from the title (or the guid when there is no usable title).
async fn record_name(
    catalog: &dyn CatalogActions,
    record: &LocalDataset,
    existing: Option<&LocalDataset>,
    guid: &str,
) -> Result<String> {
    let own_name = existing.and_then(|e| e.name.as_deref());
    if let Some(existing) = existing {
        if existing.display_title() == record.display_title() {
            if let Some(name) = own_name {
                return Ok(name.to_string());
            }
        }
    }

    let mut base = record
        .display_title()
        .map(|t| slugify(t, MAX_NAME_LEN))
        .unwrap_or_default();
    if base.is_empty() {
        base = slugify(guid, MAX_NAME_LEN);
    }
    if base.is_empty() {
        return Err(AppError::validation(
            "Could not generate a unique name from the title or the GUID",
        ));
    }
    unique_name(catalog, &base, own_name).await
}

async fn unique_name(
    catalog: &dyn CatalogActions,
    base: &str,
    own_name: Option<&str>,
) -> Result<String> {
    let is_free = |candidate: &str| own_name == Some(candidate);
    if is_free(base) || !catalog.name_taken(base).await? {
        return Ok(base.to_string());
    }

    for n in 1..MAX_NAME_SUFFIX {
        let suffix = format!("-{n}");
        let mut stem = base.to_string();
        stem.truncate(MAX_NAME_LEN - suffix.len());
        let candidate = format!("{}{suffix}", stem.trim_end_matches('-'));
        if is_free(&candidate) || !catalog.name_taken(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::validation(format!(
        "Could not generate a unique name from {base:?}"
    )))
}

/// Reuse resource ids of the stored record wherever the URL is unchanged.
fn carry_resource_ids(record: &mut LocalDataset, existing: &LocalDataset) {
    let known: HashMap<&str, &str> = existing
        .resources
        .iter()
        .filter(|r| !r.url.is_empty())
        .filter_map(|r| Some((r.url.as_str(), r.id.as_deref()?)))
        .collect();

    for resource in &mut record.resources {
        if let Some(id) = known.get(resource.url.as_str()) {
            resource.id = Some(id.to_string());
        }
    }
}

/// Merge the source's default tags, groups and extras into a record.
pub fn apply_source_defaults(record: &mut LocalDataset, config: &SourceConfig) {
    record.tags.retain(|t| t.name.chars().count() > 1);

    for tag in &config.default_tags {
        if !record.has_tag(&tag.name) {
            record.tags.push(tag.clone());
        }
    }

    for group in &config.default_group_refs {
        let present = record.groups.iter().any(|g| {
            g.name == group.name || (g.id.is_some() && g.id == group.id)
        });
        if !present {
            record.groups.push(group.clone());
        }
    }

    for (key, value) in &config.default_extras {
        let exists = record.extra(key).is_some();
        if exists && !config.override_extras {
            continue;
        }
        record.extras.retain(|e| &e.key != key);
        record.set_extra(key, value.as_str());
    }
}
