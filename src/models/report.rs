// src/models/report.rs

//! Per-run harvest report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A failure confined to one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub item_id: Uuid,
    pub guid: String,
    pub message: String,
}

/// Outcome of one harvest run for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub source_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Work items emitted by gather
    pub gathered: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Items declined by the fetch hook
    pub skipped: usize,
    /// Set when the run stopped before import
    #[serde(default)]
    pub gather_error: Option<String>,
    #[serde(default)]
    pub item_errors: Vec<ItemError>,
    /// Fields dropped while converting records
    pub conversion_warnings: usize,
}

impl HarvestReport {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            started_at: Utc::now(),
            finished_at: None,
            gathered: 0,
            created: 0,
            updated: 0,
            deleted: 0,
            skipped: 0,
            gather_error: None,
            item_errors: Vec::new(),
            conversion_warnings: 0,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whether every stage completed without any error.
    pub fn is_clean(&self) -> bool {
        self.gather_error.is_none() && self.item_errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} gathered, {} created, {} updated, {} deleted, {} skipped, {} errors",
            self.source_id,
            self.gathered,
            self.created,
            self.updated,
            self.deleted,
            self.skipped,
            self.item_errors.len() + usize::from(self.gather_error.is_some())
        )
    }
}
