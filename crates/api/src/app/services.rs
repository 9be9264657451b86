use std::sync::Arc;

use anyhow::Context;

use fantasy_infra::config::AppConfig;
use fantasy_infra::loader::{ImportPipeline, ImportSources, ImportSummary, LoadError};
use fantasy_infra::reporting::ReportEngine;
use fantasy_infra::store::{self, InMemoryStore, RetailStore};

/// Shared state behind every handler.
pub struct AppServices {
    store: Arc<dyn RetailStore>,
    reports: ReportEngine<dyn RetailStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn RetailStore>) -> Self {
        let reports = ReportEngine::new(store.clone());
        Self { store, reports }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    /// Open the configured store and run the startup import if enabled.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store = store::open_store(config.database_url.as_deref())
            .await
            .context("failed to open store")?;
        let services = Self::new(store);

        if let Some(import) = &config.import {
            let summary = services
                .import(&import.sources, import.recompute_after_import)
                .await
                .context("startup import failed")?;
            tracing::info!(records = summary.total(), "startup import complete");
        }

        Ok(services)
    }

    pub fn store(&self) -> &dyn RetailStore {
        &*self.store
    }

    pub fn reports(&self) -> &ReportEngine<dyn RetailStore> {
        &self.reports
    }

    /// Run the ordered bulk import, optionally followed by a total recompute.
    pub async fn import(
        &self,
        sources: &ImportSources,
        recompute: bool,
    ) -> anyhow::Result<ImportSummary> {
        let summary = ImportPipeline::new(self.store.clone())
            .run(sources)
            .await
            .map_err(|e: LoadError| {
                tracing::error!(kind = %e.kind(), error = %e, "import aborted");
                e
            })?;
        if recompute {
            self.reports
                .recompute_invoice_totals()
                .await
                .context("recompute after import failed")?;
        }
        Ok(summary)
    }
}
