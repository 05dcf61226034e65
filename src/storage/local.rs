// src/storage/local.rs

//! Local filesystem storage implementation.
//!
//! Keeps work items, catalog records, groups and run reports as JSON files
//! under one root directory. Every write goes to a temp file that is then
//! renamed over the target, so readers never see a half-written file.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── harvest_objects.json  # All work items
//! ├── groups.json           # Known groups
//! ├── records/
//! │   └── {id}.json
//! └── runs/
//!     └── {source}-{stamp}.json
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{GroupRef, HarvestReport, LocalDataset, RecordState, WorkItem, extra_keys};
use crate::storage::{CatalogActions, HarvestStore};

const ITEMS_KEY: &str = "harvest_objects.json";
const GROUPS_KEY: &str = "groups.json";
const RECORDS_DIR: &str = "records";
const RUNS_DIR: &str = "runs";

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    site_user: String,
    items_lock: Arc<Mutex<()>>,
    records_lock: Arc<Mutex<()>>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::with_site_user(root_dir, "harvest")
    }

    /// Create a LocalStorage that reports `site_user` as the acting user.
    pub fn with_site_user(root_dir: impl Into<PathBuf>, site_user: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            site_user: site_user.into(),
            items_lock: Arc::new(Mutex::new(())),
            records_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn record_key(id: &str) -> String {
        format!("{RECORDS_DIR}/{id}.json")
    }

    async fn load_items(&self) -> Result<Vec<WorkItem>> {
        Ok(self.read_json(ITEMS_KEY).await?.unwrap_or_default())
    }

    /// Every record on disk, deleted ones included.
    pub async fn list_records(&self) -> Result<Vec<LocalDataset>> {
        let dir = self.path(RECORDS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<LocalDataset>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// Register a group so sources can use it as a default.
    pub async fn add_group(&self, group: GroupRef) -> Result<()> {
        let mut groups: Vec<GroupRef> = self.read_json(GROUPS_KEY).await?.unwrap_or_default();
        groups.retain(|g| g.name != group.name);
        groups.push(group);
        self.write_json(GROUPS_KEY, &groups).await
    }

    /// Most recent run report for a source.
    pub async fn latest_run(&self, source_id: &str) -> Result<Option<HarvestReport>> {
        let dir = self.path(RUNS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Io(e)),
        };

        let prefix = format!("{source_id}-");
        let mut latest: Option<String> = None;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix)
                && name.ends_with(".json")
                && latest.as_ref().is_none_or(|l| name > *l)
            {
                latest = Some(name);
            }
        }

        match latest {
            Some(name) => self.read_json(&format!("{RUNS_DIR}/{name}")).await,
            None => Ok(None),
        }
    }

    /// Reject records the catalog would refuse.
    async fn validate_record(&self, record: &LocalDataset) -> Result<()> {
        let id = record
            .id
            .as_deref()
            .ok_or_else(|| AppError::validation("record id is missing"))?;
        if record.display_title().is_none_or(|t| t.trim().is_empty()) {
            return Err(AppError::validation(format!("record {id}: title is missing")));
        }
        let name = record
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::validation(format!("record {id}: name is missing")))?;

        let clash = self
            .list_records()
            .await?
            .into_iter()
            .any(|other| other.name.as_deref() == Some(name) && other.id.as_deref() != Some(id));
        if clash {
            return Err(AppError::validation(format!(
                "record {id}: name {name:?} is already in use"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl HarvestStore for LocalStorage {
    async fn current_guids(&self, source_id: &str) -> Result<HashMap<String, Option<String>>> {
        let _guard = self.items_lock.lock().await;
        Ok(self
            .load_items()
            .await?
            .into_iter()
            .filter(|item| item.current && item.source_id == source_id)
            .map(|item| (item.guid, item.record_id))
            .collect())
    }

    async fn save_items(&self, items: &[WorkItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let _guard = self.items_lock.lock().await;
        let mut all = self.load_items().await?;
        all.extend(items.iter().cloned());
        self.write_json(ITEMS_KEY, &all).await?;
        log::debug!("Saved {} work items ({} total)", items.len(), all.len());
        Ok(())
    }

    async fn load_item(&self, id: Uuid) -> Result<Option<WorkItem>> {
        let _guard = self.items_lock.lock().await;
        Ok(self.load_items().await?.into_iter().find(|item| item.id == id))
    }

    async fn current_item(&self, source_id: &str, guid: &str) -> Result<Option<WorkItem>> {
        let _guard = self.items_lock.lock().await;
        Ok(self
            .load_items()
            .await?
            .into_iter()
            .find(|item| item.current && item.source_id == source_id && item.guid == guid))
    }

    async fn retire_guids(&self, source_id: &str, guids: &[String]) -> Result<()> {
        if guids.is_empty() {
            return Ok(());
        }
        let _guard = self.items_lock.lock().await;
        let mut all = self.load_items().await?;
        for item in all
            .iter_mut()
            .filter(|item| item.source_id == source_id && guids.contains(&item.guid))
        {
            item.current = false;
        }
        self.write_json(ITEMS_KEY, &all).await
    }

    async fn commit_gather(
        &self,
        source_id: &str,
        items: &[WorkItem],
        retired: &[String],
    ) -> Result<()> {
        if items.is_empty() && retired.is_empty() {
            return Ok(());
        }
        let _guard = self.items_lock.lock().await;
        let mut all = self.load_items().await?;
        for item in all
            .iter_mut()
            .filter(|item| item.source_id == source_id && retired.contains(&item.guid))
        {
            item.current = false;
        }
        all.extend(items.iter().cloned());
        self.write_json(ITEMS_KEY, &all).await?;
        log::debug!(
            "Committed {} work items for {source_id}, retired {} guids",
            items.len(),
            retired.len()
        );
        Ok(())
    }

    async fn swap_current(
        &self,
        source_id: &str,
        guid: &str,
        expected: Option<Uuid>,
        new_current: Uuid,
        record_id: Option<&str>,
    ) -> Result<()> {
        let _guard = self.items_lock.lock().await;
        let mut all = self.load_items().await?;

        let actual = all
            .iter()
            .find(|item| item.current && item.source_id == source_id && item.guid == guid)
            .map(|item| item.id);
        if actual != expected {
            return Err(AppError::Conflict {
                guid: guid.to_string(),
            });
        }
        if !all.iter().any(|item| item.id == new_current) {
            return Err(AppError::validation(format!("unknown work item {new_current}")));
        }

        for item in all
            .iter_mut()
            .filter(|item| item.source_id == source_id && item.guid == guid)
        {
            item.current = item.id == new_current;
            if item.current {
                if let Some(record_id) = record_id {
                    item.record_id = Some(record_id.to_string());
                }
            }
        }
        self.write_json(ITEMS_KEY, &all).await
    }

    async fn record_run(&self, report: &HarvestReport) -> Result<()> {
        let stamp = report.started_at.format("%Y%m%dT%H%M%S%3f");
        let key = format!("{RUNS_DIR}/{}-{stamp}.json", report.source_id);
        self.write_json(&key, report).await?;
        log::debug!("Run report written to {key}");
        Ok(())
    }
}

#[async_trait]
impl CatalogActions for LocalStorage {
    async fn create_record(&self, mut record: LocalDataset, user: &str) -> Result<LocalDataset> {
        let _guard = self.records_lock.lock().await;
        self.validate_record(&record).await?;
        let id = record.id.clone().unwrap_or_default();
        if self.read_bytes(&Self::record_key(&id)).await?.is_some() {
            return Err(AppError::validation(format!("record {id} already exists")));
        }

        record.state = RecordState::Active;
        self.write_json(&Self::record_key(&id), &record).await?;
        log::debug!("{user} created record {id}");
        Ok(record)
    }

    async fn update_record(&self, mut record: LocalDataset, user: &str) -> Result<LocalDataset> {
        let _guard = self.records_lock.lock().await;
        self.validate_record(&record).await?;
        let id = record.id.clone().unwrap_or_default();
        if self.read_bytes(&Self::record_key(&id)).await?.is_none() {
            return Err(AppError::validation(format!("record {id} does not exist")));
        }

        record.state = RecordState::Active;
        self.write_json(&Self::record_key(&id), &record).await?;
        log::debug!("{user} updated record {id}");
        Ok(record)
    }

    async fn delete_record(&self, record_id: &str, user: &str) -> Result<()> {
        let _guard = self.records_lock.lock().await;
        let key = Self::record_key(record_id);
        let Some(mut record) = self.read_json::<LocalDataset>(&key).await? else {
            return Err(AppError::validation(format!("record {record_id} does not exist")));
        };
        record.state = RecordState::Deleted;
        self.write_json(&key, &record).await?;
        log::debug!("{user} deleted record {record_id}");
        Ok(())
    }

    async fn show_record(&self, record_id: &str) -> Result<Option<LocalDataset>> {
        self.read_json(&Self::record_key(record_id)).await
    }

    async fn lookup_by_external_id(&self, guid: &str) -> Result<Option<LocalDataset>> {
        let mut matches: Vec<LocalDataset> = self
            .list_records()
            .await?
            .into_iter()
            .filter(|r| r.is_active() && r.extra(extra_keys::GUID) == Some(guid))
            .collect();
        if matches.len() > 1 {
            log::error!("Found more than one record with the same guid: {guid}");
        }
        Ok((!matches.is_empty()).then(|| matches.swap_remove(0)))
    }

    async fn resolve_acting_user(&self) -> Result<String> {
        Ok(self.site_user.clone())
    }

    async fn show_group(&self, name_or_id: &str) -> Result<Option<GroupRef>> {
        let groups: Vec<GroupRef> = self.read_json(GROUPS_KEY).await?.unwrap_or_default();
        Ok(groups
            .into_iter()
            .find(|g| g.name == name_or_id || g.id.as_deref() == Some(name_or_id)))
    }

    async fn name_taken(&self, name: &str) -> Result<bool> {
        Ok(self
            .list_records()
            .await?
            .iter()
            .any(|r| r.name.as_deref() == Some(name)))
    }
}
