// src/pipeline/gather.rs

//! Gather stage: page through a source and persist the run's worklist.

use uuid::Uuid;

use crate::error::Result;
use crate::models::{HarvestSource, SourceConfig};
use crate::pipeline::reconcile::{PageVerdict, ReconcileStats, Reconciler, StopReason};
use crate::pipeline::records::extract_records;
use crate::services::ContentFetcher;
use crate::storage::HarvestStore;

/// What gather produced for one run.
#[derive(Debug, Clone)]
pub struct GatherOutcome {
    /// Ids of the persisted work items, deletions last
    pub item_ids: Vec<Uuid>,
    pub stats: ReconcileStats,
    pub pages: u32,
    pub stop: StopReason,
}

/// Fetch every page of `source`, reconcile and persist the work items.
///
/// Nothing is written to the store unless every page was fetched and
/// parsed.
pub async fn run_gather(
    source: &HarvestSource,
    config: &SourceConfig,
    fetcher: &ContentFetcher,
    store: &dyn HarvestStore,
) -> Result<GatherOutcome> {
    log::debug!("Gathering {} from {}", source.id, source.url);

    let known = store.current_guids(&source.id).await?;
    log::debug!("{} guids currently harvested for {}", known.len(), source.id);
    let mut reconciler = Reconciler::new(&source.id, known);

    let mut page = 1;
    let stop = loop {
        let fetched = match fetcher.fetch(&source.url, page, None).await {
            Ok(fetched) => fetched,
            Err(err) if err.is_end_of_pagination(page) => {
                log::debug!("404 after first page, no more pages");
                break StopReason::EndOfPagination;
            }
            Err(err) => {
                log::error!("Could not get content for {}: {}", source.id, err);
                return Err(err.into());
            }
        };

        let records = extract_records(&fetched.content, config).inspect_err(|e| {
            log::error!("Error parsing {}: {}", fetched.url, e);
        })?;
        log::debug!(
            "Page {} of {}: {} records ({} filtered)",
            page,
            source.id,
            records.records.len(),
            records.skipped.len()
        );

        match reconciler.observe_page(records) {
            PageVerdict::Continue => page += 1,
            PageVerdict::Stop(reason) => break reason,
        }
    };

    let result = reconciler.finish();
    store
        .commit_gather(&source.id, &result.items, &result.deleted_guids)
        .await?;

    log::info!(
        "Gathered {}: {} new, {} changed, {} deleted over {} page(s) ({:?})",
        source.id,
        result.stats.new,
        result.stats.changed,
        result.stats.deleted,
        page,
        stop
    );

    Ok(GatherOutcome {
        item_ids: result.items.iter().map(|item| item.id).collect(),
        stats: result.stats,
        pages: page,
        stop,
    })
}
