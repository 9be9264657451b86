//! Ordered import of the four sources.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::records::{CustomerRecord, InvoiceRecord, ProductRecord, SaleRecord};
use super::{LoadError, load_source};
use crate::store::RetailStore;

/// Paths of the four JSON array sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSources {
    pub customers: PathBuf,
    pub invoices: PathBuf,
    pub products: PathBuf,
    pub sales: PathBuf,
}

/// Records saved per kind by a completed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub customers: usize,
    pub invoices: usize,
    pub products: usize,
    pub sales: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.customers + self.invoices + self.products + self.sales
    }
}

/// One-shot bulk import.
///
/// Kinds load strictly one after another: customers, invoices, products, sales. Each
/// kind only references kinds loaded before it, so foreign keys resolve as long as the
/// sources are consistent. The first error stops the run; kinds already loaded are not
/// rolled back.
pub struct ImportPipeline<S: ?Sized> {
    store: Arc<S>,
}

impl<S> ImportPipeline<S>
where
    S: RetailStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn run(&self, sources: &ImportSources) -> Result<ImportSummary, LoadError> {
        let store = &*self.store;
        tracing::info!(?sources, "import started");

        let summary = ImportSummary {
            customers: load_source::<CustomerRecord, S>(store, &sources.customers).await?,
            invoices: load_source::<InvoiceRecord, S>(store, &sources.invoices).await?,
            products: load_source::<ProductRecord, S>(store, &sources.products).await?,
            sales: load_source::<SaleRecord, S>(store, &sources.sales).await?,
        };

        tracing::info!(
            customers = summary.customers,
            invoices = summary.invoices,
            products = summary.products,
            sales = summary.sales,
            "import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::testing::TempSources;
    use crate::reporting::ReportEngine;
    use crate::store::{InMemoryStore, Repository};
    use fantasy_core::EntityKind;
    use fantasy_invoicing::Invoice;
    use fantasy_parties::Customer;
    use fantasy_sales::Sale;

    const CUSTOMERS: &str = r#"[
        {"id":1,"first_name":"John","last_name":"Doe","condition":1},
        {"id":2,"first_name":"Jane","last_name":"Doe","condition":0}
    ]"#;
    const INVOICES: &str = r#"[
        {"id":1,"datetime":"2022-05-15 10:00:00","customer_id":1,"total":0},
        {"id":2,"datetime":"2022-05-16 10:00:00","customer_id":2,"total":0}
    ]"#;
    const PRODUCTS: &str = r#"[
        {"id":1,"description":"P1","price":10.0},
        {"id":2,"description":"P2","price":5.0}
    ]"#;
    const SALES: &str = r#"[
        {"id":1,"product_id":1,"invoice_id":1,"quantity":10},
        {"id":2,"product_id":2,"invoice_id":1,"quantity":10},
        {"id":3,"product_id":1,"invoice_id":2,"quantity":20}
    ]"#;

    #[tokio::test]
    async fn worked_example_imports_and_recomputes() {
        let fixture = TempSources::new(CUSTOMERS, INVOICES, PRODUCTS, SALES);
        let store = Arc::new(InMemoryStore::new());
        let summary = ImportPipeline::new(store.clone())
            .run(&fixture.sources)
            .await
            .unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                customers: 2,
                invoices: 2,
                products: 2,
                sales: 3
            }
        );
        assert_eq!(summary.total(), 9);

        ReportEngine::new(store.clone())
            .recompute_invoice_totals()
            .await
            .unwrap();
        let invoices: Vec<Invoice> = store.find_all().await.unwrap();
        let totals: Vec<f64> = invoices.iter().map(|i| i.total).collect();
        assert_eq!(totals, vec![150.0, 200.0]);
    }

    #[tokio::test]
    async fn sales_without_loaded_invoices_and_products_fail_the_run() {
        let fixture = TempSources::new(CUSTOMERS, "[]", "[]", SALES);
        let store = Arc::new(InMemoryStore::new());

        let err = ImportPipeline::new(store.clone())
            .run(&fixture.sources)
            .await
            .unwrap_err();
        match &err {
            LoadError::Store { kind, index, source } => {
                assert_eq!(*kind, EntityKind::Sale);
                assert_eq!(*index, 0);
                assert!(source.is_referential_violation(), "unexpected: {source}");
            }
            other => panic!("unexpected error: {other}"),
        }

        let customers: Vec<Customer> = store.find_all().await.unwrap();
        assert_eq!(customers.len(), 2);
        let sales: Vec<Sale> = store.find_all().await.unwrap();
        assert!(sales.is_empty());
    }

    #[tokio::test]
    async fn zero_quantity_sale_aborts_the_run() {
        let fixture = TempSources::new(
            CUSTOMERS,
            INVOICES,
            PRODUCTS,
            r#"[{"id":1,"product_id":1,"invoice_id":1,"quantity":10},
                {"id":2,"product_id":2,"invoice_id":1,"quantity":0},
                {"id":3,"product_id":1,"invoice_id":2,"quantity":20}]"#,
        );
        let store = Arc::new(InMemoryStore::new());

        let err = ImportPipeline::new(store.clone())
            .run(&fixture.sources)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), EntityKind::Sale);
        assert!(matches!(err, LoadError::Store { index: 1, .. }), "unexpected: {err}");
        assert!(err.store_error().is_some_and(|e| e.is_constraint_violation()));

        let sales: Vec<Sale> = store.find_all().await.unwrap();
        assert_eq!(sales.len(), 1);
    }

    #[tokio::test]
    async fn failure_keeps_earlier_kinds() {
        let fixture = TempSources::new(CUSTOMERS, INVOICES, "[{\"id\":1,", SALES);
        let store = Arc::new(InMemoryStore::new());

        let err = ImportPipeline::new(store.clone())
            .run(&fixture.sources)
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Decode { kind: EntityKind::Product, .. }));

        let customers: Vec<Customer> = store.find_all().await.unwrap();
        assert_eq!(customers.len(), 2);
        let invoices: Vec<Invoice> = Repository::<Invoice>::find_all(&*store).await.unwrap();
        assert_eq!(invoices.len(), 2);
    }
}
