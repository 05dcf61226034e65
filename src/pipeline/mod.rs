// src/pipeline/mod.rs

//! Harvest pipeline stages.
//!
//! - `run_gather`: Page through a source and persist the run's work items
//! - `run_fetch`: Confirm each item through the fetch hook
//! - `run_import`: Create, update or delete catalog records
//! - `Harvester`: All three stages for one source, plus the run report

pub mod fetch;
pub mod gather;
pub mod harvest;
pub mod import;
pub mod reconcile;
pub mod records;

pub use fetch::{DefaultHooks, HarvestHooks, run_fetch};
pub use gather::{GatherOutcome, run_gather};
pub use harvest::Harvester;
pub use import::{ImportAction, ImportContext, Imported, apply_source_defaults, import_item, run_import};
pub use reconcile::{PageVerdict, Reconciler, Reconciliation, StopReason};
pub use records::{PageRecord, PageRecords, content_hash, extract_records};
