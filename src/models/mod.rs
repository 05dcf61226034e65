// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod local;
mod remote;
mod report;
mod source;
mod work_item;

// Re-export all public types
pub use config::{Config, FetcherConfig, ImportConfig, LoggingConfig, StorageConfig};
pub use local::{Extra, GroupRef, LocalDataset, RecordState, Resource, Tag, extra_keys};
pub use remote::{ContactPoint, Distribution, Publisher, RemoteDataset};
pub use report::{HarvestReport, ItemError};
pub use source::{ConverterProfile, DateConvention, HarvestSource, SourceConfig};
pub use work_item::{WorkItem, WorkStatus};
