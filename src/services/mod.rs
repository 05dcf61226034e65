// src/services/mod.rs

//! Service layer for the harvester.
//!
//! - Catalog page fetching (`ContentFetcher`)

mod fetcher;

pub use fetcher::{
    ContentFetcher, FetchSettings, FetchedContent, TransportInterceptor,
};
