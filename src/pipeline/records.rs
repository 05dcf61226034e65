// src/pipeline/records.rs

//! Identifier extraction from one page of catalog content.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// One dataset pulled out of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub guid: String,
    /// The dataset re-serialized as JSON
    pub content: String,
}

/// Everything a page contributes to reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRecords {
    /// Records that passed the publisher filter
    pub records: Vec<PageRecord>,
    /// Every identifier on the page, filtered ones included
    pub page_guids: Vec<String>,
    /// Identifiers dropped by the publisher filter
    pub skipped: Vec<String>,
}

/// Parse a page: a JSON list of datasets, or an object with a `dataset` list.
pub fn extract_records(content: &str, config: &SourceConfig) -> Result<PageRecords> {
    let doc: Value =
        serde_json::from_str(content).map_err(|e| AppError::parse("catalog page", e))?;

    let datasets = match doc {
        Value::Array(list) => list,
        Value::Object(mut obj) => match obj.remove("dataset") {
            Some(Value::Array(list)) => list,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => return Err(AppError::parse("catalog page", "`dataset` is not a list")),
        },
        _ => return Err(AppError::parse("catalog page", "wrong JSON object")),
    };

    let mut page = PageRecords::default();
    for dataset in datasets {
        if !dataset.is_object() {
            return Err(AppError::parse("catalog page", "dataset entry is not an object"));
        }
        let content = serde_json::to_string(&dataset)?;
        let guid = identifier(&dataset).unwrap_or_else(|| content_hash(&content));

        page.page_guids.push(guid.clone());
        if config.accepts_publisher(publisher_name(&dataset)) {
            page.records.push(PageRecord { guid, content });
        } else {
            log::debug!("Skipping {guid}: publisher filtered out");
            page.skipped.push(guid);
        }
    }
    Ok(page)
}

/// Publisher name, whether published as a string or `{name: ...}`.
fn publisher_name(dataset: &Value) -> Option<&str> {
    match dataset.get("publisher")? {
        Value::String(name) => Some(name.as_str()),
        Value::Object(obj) => obj.get("name")?.as_str(),
        _ => None,
    }
}

fn identifier(dataset: &Value) -> Option<String> {
    match dataset.get("identifier")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// SHA-256 hex digest of a record's canonical JSON.
///
/// `serde_json` keeps object keys sorted, so equal records hash equally
/// regardless of the key order they were published in.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
