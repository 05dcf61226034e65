// src/pipeline/fetch.rs

//! Fetch stage and the per-item extension hooks.
//!
//! Gather already stores each record's full content, so fetching is a
//! confirmation step: a hook can veto an item before it is imported.

use crate::error::Result;
use crate::models::{LocalDataset, RemoteDataset, WorkItem};

/// Extension points called while processing individual work items.
pub trait HarvestHooks: Send + Sync {
    /// Confirm an item should be imported. Returning `false` skips it.
    fn fetch_item(&self, _item: &WorkItem) -> Result<bool> {
        Ok(true)
    }

    /// Adjust a record after source defaults are merged, before it is saved.
    fn modify_record(&self, _record: &mut LocalDataset, _remote: &RemoteDataset, _item: &WorkItem) {}
}

/// Hooks that accept everything and change nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl HarvestHooks for DefaultHooks {}

/// Run the fetch stage for one item.
pub fn run_fetch(hooks: &dyn HarvestHooks, item: &WorkItem) -> Result<bool> {
    let accepted = hooks.fetch_item(item)?;
    if !accepted {
        log::info!("Skipping {} ({}): declined by fetch hook", item.guid, item.status);
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeclineAll;

    impl HarvestHooks for DeclineAll {
        fn fetch_item(&self, _item: &WorkItem) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn default_hooks_accept() {
        let item = WorkItem::new_record("src", "A", "{}".into());
        assert!(run_fetch(&DefaultHooks, &item).unwrap());
    }

    #[test]
    fn custom_hook_can_decline() {
        let item = WorkItem::new_record("src", "A", "{}".into());
        assert!(!run_fetch(&DeclineAll, &item).unwrap());
    }
}
