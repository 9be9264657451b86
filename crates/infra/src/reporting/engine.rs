//! Aggregation engine: invoice total recompute + ranked/grouped reports.
//!
//! The engine owns no state. Each call is one store round trip, so report
//! generation is safe to re-invoke and there is nothing to retry or cancel.

use std::sync::Arc;

use tracing::instrument;

use crate::reporting::{ConditionTotal, TopCustomer, TopProduct};
use crate::store::{RetailStore, StoreResult};

/// Default number of rows for the ranked reports.
pub const DEFAULT_TOP_LIMIT: u32 = 5;

pub struct ReportEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for ReportEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> ReportEngine<S>
where
    S: RetailStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Make every invoice total authoritative again.
    ///
    /// Idempotent: with no intervening sale/product changes a second run writes the
    /// same values.
    #[instrument(skip(self), err)]
    pub async fn recompute_invoice_totals(&self) -> StoreResult<()> {
        self.store.recompute_invoice_totals().await?;
        tracing::info!("invoice totals recomputed");
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn top_products(&self, limit: u32) -> StoreResult<Vec<TopProduct>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let rows = self.store.top_products(limit).await?;
        tracing::debug!(rows = rows.len(), "top products computed");
        Ok(rows)
    }

    /// Totals grouped by customer condition.
    ///
    /// Values carry full precision; rounding is left to the presentation layer.
    #[instrument(skip(self), err)]
    pub async fn invoice_totals_by_condition(&self) -> StoreResult<Vec<ConditionTotal>> {
        let rows = self.store.invoice_totals_by_condition().await?;
        tracing::debug!(groups = rows.len(), "invoice totals grouped by condition");
        Ok(rows)
    }

    #[instrument(skip(self), err)]
    pub async fn top_customers(&self, limit: u32) -> StoreResult<Vec<TopCustomer>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let rows = self.store.top_customers(limit).await?;
        tracing::debug!(rows = rows.len(), "top customers computed");
        Ok(rows)
    }
}
