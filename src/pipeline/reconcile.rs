// src/pipeline/reconcile.rs

//! Identifier-level reconciliation between a remote catalog and the store.
//!
//! Computes which guids must be created, updated or deleted by comparing
//! the guids seen across all pages of a run against the guids that were
//! current before the run started. Deletions are derived from absence.

use std::collections::{HashMap, HashSet};

use crate::models::WorkItem;
use crate::pipeline::records::PageRecords;

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page with no datasets
    EmptyPage,
    /// The page had exactly the previous page's identifiers
    RepeatedPage,
    /// The server answered 404 after the first page
    EndOfPagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageVerdict {
    Continue,
    Stop(StopReason),
}

/// Summary counts of a finished reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub new: usize,
    pub changed: usize,
    pub deleted: usize,
    pub skipped: usize,
}

/// Per-run reconciliation state.
#[derive(Debug)]
pub struct Reconciler {
    source_id: String,
    /// Guid to record id of the items current before this run
    known: HashMap<String, Option<String>>,
    seen: HashSet<String>,
    filtered: HashSet<String>,
    previous_page: Option<HashSet<String>>,
    items: Vec<WorkItem>,
    stats: ReconcileStats,
}

impl Reconciler {
    pub fn new(source_id: impl Into<String>, known: HashMap<String, Option<String>>) -> Self {
        Self {
            source_id: source_id.into(),
            known,
            seen: HashSet::new(),
            filtered: HashSet::new(),
            previous_page: None,
            items: Vec::new(),
            stats: ReconcileStats::default(),
        }
    }

    /// Feed one page and decide whether to fetch the next one.
    pub fn observe_page(&mut self, page: PageRecords) -> PageVerdict {
        for guid in page.skipped {
            if self.filtered.insert(guid) {
                self.stats.skipped += 1;
            }
        }

        for record in page.records {
            if !self.seen.insert(record.guid.clone()) {
                continue;
            }
            let item = match self.known.get(&record.guid) {
                Some(record_id) => {
                    self.stats.changed += 1;
                    WorkItem::changed(&self.source_id, record.guid, record_id.clone(), record.content)
                }
                None => {
                    self.stats.new += 1;
                    WorkItem::new_record(&self.source_id, record.guid, record.content)
                }
            };
            self.items.push(item);
        }

        if page.page_guids.is_empty() {
            return PageVerdict::Stop(StopReason::EmptyPage);
        }

        // Only identifiers are compared; a server that ignores the page
        // parameter repeats the same set.
        let ids: HashSet<String> = page.page_guids.into_iter().collect();
        if self.previous_page.as_ref() == Some(&ids) {
            return PageVerdict::Stop(StopReason::RepeatedPage);
        }
        self.previous_page = Some(ids);
        PageVerdict::Continue
    }

    /// Emit deletions for every known guid that no page mentioned.
    pub fn finish(mut self) -> Reconciliation {
        let mut gone: Vec<(String, Option<String>)> = self
            .known
            .into_iter()
            .filter(|(guid, _)| !self.seen.contains(guid))
            .collect();
        gone.sort();

        let mut deleted_guids = Vec::with_capacity(gone.len());
        for (guid, record_id) in gone {
            self.items
                .push(WorkItem::deleted(&self.source_id, guid.clone(), record_id));
            deleted_guids.push(guid);
        }
        self.stats.deleted = deleted_guids.len();

        Reconciliation {
            items: self.items,
            deleted_guids,
            stats: self.stats,
        }
    }
}

/// Final output of a run's reconciliation.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub items: Vec<WorkItem>,
    /// Guids whose current items must be retired
    pub deleted_guids: Vec<String>,
    pub stats: ReconcileStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkStatus;
    use crate::pipeline::records::PageRecord;
    use pretty_assertions::assert_eq;

    fn page(guids: &[&str]) -> PageRecords {
        PageRecords {
            records: guids
                .iter()
                .map(|g| PageRecord {
                    guid: g.to_string(),
                    content: format!(r#"{{"identifier":"{g}"}}"#),
                })
                .collect(),
            page_guids: guids.iter().map(|g| g.to_string()).collect(),
            skipped: Vec::new(),
        }
    }

    fn known(entries: &[(&str, &str)]) -> HashMap<String, Option<String>> {
        entries
            .iter()
            .map(|(g, r)| (g.to_string(), Some(r.to_string())))
            .collect()
    }

    fn statuses(items: &[WorkItem]) -> Vec<(String, WorkStatus, Option<String>)> {
        let mut out: Vec<_> = items
            .iter()
            .map(|i| (i.guid.clone(), i.status, i.record_id.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    #[test]
    fn test_mixed_changes() {
        let mut reconciler =
            Reconciler::new("src", known(&[("A", "rec-a"), ("B", "rec-b"), ("C", "rec-c")]));
        assert_eq!(reconciler.observe_page(page(&["B", "C", "D"])), PageVerdict::Continue);
        assert_eq!(
            reconciler.observe_page(page(&[])),
            PageVerdict::Stop(StopReason::EmptyPage)
        );

        let result = reconciler.finish();
        assert_eq!(
            statuses(&result.items),
            vec![
                ("A".into(), WorkStatus::Delete, Some("rec-a".into())),
                ("B".into(), WorkStatus::Change, Some("rec-b".into())),
                ("C".into(), WorkStatus::Change, Some("rec-c".into())),
                ("D".into(), WorkStatus::New, None),
            ]
        );
        assert_eq!(result.deleted_guids, vec!["A"]);
        assert_eq!(
            result.stats,
            ReconcileStats {
                new: 1,
                changed: 2,
                deleted: 1,
                skipped: 0
            }
        );
    }

    #[test]
    fn test_repeated_page_stops() {
        let mut reconciler = Reconciler::new("src", HashMap::new());
        assert_eq!(reconciler.observe_page(page(&["A", "B"])), PageVerdict::Continue);
        assert_eq!(
            reconciler.observe_page(page(&["B", "A"])),
            PageVerdict::Stop(StopReason::RepeatedPage)
        );
        let result = reconciler.finish();
        assert_eq!(result.items.len(), 2);
    }

    #[test]
    fn test_guid_emitted_once_across_pages() {
        let mut reconciler = Reconciler::new("src", HashMap::new());
        reconciler.observe_page(page(&["A", "B"]));
        reconciler.observe_page(page(&["B", "C"]));
        let result = reconciler.finish();
        let guids: Vec<_> = result.items.iter().map(|i| i.guid.as_str()).collect();
        assert_eq!(guids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_identical_rerun_has_no_new_or_delete() {
        let mut reconciler = Reconciler::new("src", known(&[("A", "1"), ("B", "2")]));
        reconciler.observe_page(page(&["A", "B"]));
        reconciler.observe_page(page(&["A", "B"]));
        let stats = reconciler.finish().stats;
        assert_eq!(stats.new, 0);
        assert_eq!(stats.deleted, 0);
        assert_eq!(stats.changed, 2);
    }

    #[test]
    fn test_filtered_records_are_deleted_but_keep_paging() {
        let mut reconciler = Reconciler::new("src", known(&[("B", "rec-b")]));
        let filtered = PageRecords {
            records: Vec::new(),
            page_guids: vec!["B".into()],
            skipped: vec!["B".into()],
        };
        assert_eq!(reconciler.observe_page(filtered), PageVerdict::Continue);
        let result = reconciler.finish();
        assert_eq!(result.deleted_guids, vec!["B"]);
        assert_eq!(result.stats.skipped, 1);
    }

    #[test]
    fn test_empty_source_deletes_everything() {
        let mut reconciler = Reconciler::new("src", known(&[("A", "1")]));
        assert_eq!(
            reconciler.observe_page(page(&[])),
            PageVerdict::Stop(StopReason::EmptyPage)
        );
        let result = reconciler.finish();
        assert_eq!(result.items.len(), 1);
        assert!(result.items[0].content.is_none());
    }
}
