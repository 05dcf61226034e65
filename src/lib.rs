// src/lib.rs

//! DCAT JSON Harvester Library
//!
//! Synchronizes remote DCAT catalogs into a local record catalog across
//! repeated runs, creating, updating and deleting records as the remote
//! side changes.

pub mod config;
pub mod convert;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
