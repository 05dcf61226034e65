// src/storage/mod.rs

//! Storage abstractions for harvest state and the local catalog.
//!
//! Two collaborator seams:
//! - [`HarvestStore`]: work items and the per-guid `current` flag
//! - [`CatalogActions`]: the catalog that harvested records land in
//!
//! [`LocalStorage`] implements both on a directory of JSON files.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml
//! ├── harvest_objects.json  # Every work item ever gathered
//! ├── groups.json           # Catalog groups
//! ├── records/              # One file per local record
//! │   └── {id}.json
//! └── runs/                 # One report per harvest run
//!     └── {source}-{stamp}.json
//! ```

pub mod local;

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{GroupRef, HarvestReport, LocalDataset, WorkItem};

pub use local::LocalStorage;

/// Persistence for work items.
#[async_trait]
pub trait HarvestStore: Send + Sync {
    /// Guid to record id for every current item of a source.
    async fn current_guids(&self, source_id: &str) -> Result<HashMap<String, Option<String>>>;

    /// Persist newly gathered items (never current yet).
    async fn save_items(&self, items: &[WorkItem]) -> Result<()>;

    async fn load_item(&self, id: Uuid) -> Result<Option<WorkItem>>;

    /// The current item for a guid, if any.
    async fn current_item(&self, source_id: &str, guid: &str) -> Result<Option<WorkItem>>;

    /// Clear the current flag on every item of the given guids.
    async fn retire_guids(&self, source_id: &str, guids: &[String]) -> Result<()>;

    /// Persist a gathered worklist and retire the guids it deletes.
    ///
    /// Backends that can should do both in one write; the default runs
    /// [`save_items`](Self::save_items) then
    /// [`retire_guids`](Self::retire_guids).
    async fn commit_gather(
        &self,
        source_id: &str,
        items: &[WorkItem],
        retired: &[String],
    ) -> Result<()> {
        self.save_items(items).await?;
        self.retire_guids(source_id, retired).await
    }

    /// Make `new_current` the current item for its guid.
    ///
    /// Fails with [`AppError::Conflict`](crate::error::AppError::Conflict)
    /// unless the guid's current item is still `expected` (`None` meaning no
    /// current item). `record_id`, when given, is bound to the new item.
    async fn swap_current(
        &self,
        source_id: &str,
        guid: &str,
        expected: Option<Uuid>,
        new_current: Uuid,
        record_id: Option<&str>,
    ) -> Result<()>;

    async fn record_run(&self, report: &HarvestReport) -> Result<()>;
}

/// Record and group actions of the host catalog.
#[async_trait]
pub trait CatalogActions: Send + Sync {
    /// Create a record; its `id` must already be set.
    async fn create_record(&self, record: LocalDataset, user: &str) -> Result<LocalDataset>;

    async fn update_record(&self, record: LocalDataset, user: &str) -> Result<LocalDataset>;

    /// Soft-delete a record.
    async fn delete_record(&self, record_id: &str, user: &str) -> Result<()>;

    async fn show_record(&self, record_id: &str) -> Result<Option<LocalDataset>>;

    /// Active record carrying the given `guid` extra.
    async fn lookup_by_external_id(&self, guid: &str) -> Result<Option<LocalDataset>>;

    /// User that harvested changes are made as.
    async fn resolve_acting_user(&self) -> Result<String>;

    async fn show_group(&self, name_or_id: &str) -> Result<Option<GroupRef>>;

    async fn name_taken(&self, name: &str) -> Result<bool>;
}
