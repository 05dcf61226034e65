// src/pipeline/harvest.rs

//! Full harvest run: gather → fetch → import for one source.

use std::sync::Arc;

use crate::config::prepare_source;
use crate::error::Result;
use crate::models::{Config, FetcherConfig, HarvestReport, HarvestSource, SourceConfig};
use crate::pipeline::fetch::{DefaultHooks, HarvestHooks};
use crate::pipeline::gather::run_gather;
use crate::pipeline::import::{ImportContext, run_import};
use crate::services::{ContentFetcher, FetchSettings, TransportInterceptor};
use crate::storage::{CatalogActions, HarvestStore};

/// Runs harvests against one store and catalog.
///
/// Runs for different sources may proceed concurrently; callers must not
/// start two runs for the same source at once.
pub struct Harvester {
    store: Arc<dyn HarvestStore>,
    catalog: Arc<dyn CatalogActions>,
    fetcher_config: FetcherConfig,
    import_concurrency: usize,
    interceptors: Vec<Arc<dyn TransportInterceptor>>,
    hooks: Arc<dyn HarvestHooks>,
}

impl Harvester {
    pub fn new(
        config: &Config,
        store: Arc<dyn HarvestStore>,
        catalog: Arc<dyn CatalogActions>,
    ) -> Self {
        Self {
            store,
            catalog,
            fetcher_config: config.fetcher.clone(),
            import_concurrency: config.import.concurrency,
            interceptors: Vec::new(),
            hooks: Arc::new(DefaultHooks),
        }
    }

    /// Add a hook that customizes the HTTP client of every run.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn TransportInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn HarvestHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Harvest one source.
    ///
    /// Run-level failures (bad config, unreachable source, unparseable page)
    /// end up in [`HarvestReport::gather_error`]; the returned error is only
    /// for failing to persist the report itself.
    pub async fn run(&self, source: &HarvestSource) -> Result<HarvestReport> {
        log::info!("Harvesting {} from {}", source.id, source.url);
        let mut report = HarvestReport::new(&source.id);

        if let Err(err) = self.run_stages(source, &mut report).await {
            log::error!("Harvest of {} stopped: {}", source.id, err);
            report.gather_error = Some(err.to_string());
        }

        report.finish();
        if report.is_clean() {
            log::info!("Harvest complete: {}", report.summary());
        } else {
            log::warn!("Harvest finished with errors: {}", report.summary());
        }
        self.store.record_run(&report).await?;
        Ok(report)
    }

    async fn run_stages(&self, source: &HarvestSource, report: &mut HarvestReport) -> Result<()> {
        let config = prepare_source(source, self.catalog.as_ref()).await?;
        let fetcher = self.fetcher_for(&config)?;
        // Gather retires guids, so everything import needs is settled first.
        let user = self.catalog.resolve_acting_user().await?;

        let gathered = run_gather(source, &config, &fetcher, self.store.as_ref()).await?;
        report.gathered = gathered.item_ids.len();
        report.skipped += gathered.stats.skipped;

        let ctx = ImportContext::new(
            source,
            &config,
            self.store.as_ref(),
            self.catalog.as_ref(),
            self.hooks.as_ref(),
            &user,
        );
        run_import(&ctx, &gathered.item_ids, self.import_concurrency, report).await;
        Ok(())
    }

    fn fetcher_for(&self, config: &SourceConfig) -> Result<ContentFetcher> {
        let settings =
            FetchSettings::from_config(&self.fetcher_config).with_max_bytes(config.max_file_size);
        Ok(ContentFetcher::for_run(settings, &self.interceptors)?)
    }
}
