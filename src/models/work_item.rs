// src/models/work_item.rs

//! Work items: the unit of reconciliation output.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the import stage must do with a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkStatus {
    New,
    Change,
    Delete,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::New => "new",
            WorkStatus::Change => "change",
            WorkStatus::Delete => "delete",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external identifier's pending create/update/delete.
///
/// Built only through [`WorkItem::new_record`], [`WorkItem::changed`] and
/// [`WorkItem::deleted`], so a delete never carries content and a new item
/// never points at a previous record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: Uuid,
    pub source_id: String,
    /// Stable external identifier
    pub guid: String,
    pub status: WorkStatus,
    /// Raw remote record (JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Local record materialized from this lineage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default)]
    pub current: bool,
    pub created_at: DateTime<Utc>,
}

impl WorkItem {
    fn build(
        source_id: &str,
        guid: impl Into<String>,
        status: WorkStatus,
        content: Option<String>,
        record_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id: source_id.to_string(),
            guid: guid.into(),
            status,
            content,
            record_id,
            current: false,
            created_at: Utc::now(),
        }
    }

    /// A record never seen before from this source.
    pub fn new_record(source_id: &str, guid: impl Into<String>, content: String) -> Self {
        Self::build(source_id, guid, WorkStatus::New, Some(content), None)
    }

    /// A record already materialized locally that must be refreshed.
    pub fn changed(
        source_id: &str,
        guid: impl Into<String>,
        record_id: Option<String>,
        content: String,
    ) -> Self {
        Self::build(source_id, guid, WorkStatus::Change, Some(content), record_id)
    }

    /// A record that vanished from the source.
    pub fn deleted(source_id: &str, guid: impl Into<String>, record_id: Option<String>) -> Self {
        Self::build(source_id, guid, WorkStatus::Delete, None, record_id)
    }
}
