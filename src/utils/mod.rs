// src/utils/mod.rs

//! Utility functions and helpers.

pub mod media;
pub mod url;

pub use url::{is_remote, page_url, slugify};
