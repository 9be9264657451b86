use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use fantasy_core::{CustomerId, Entity, EntityKind, InvoiceId, ProductId, SaleId};
use fantasy_invoicing::{Invoice, NewInvoice};
use fantasy_parties::{Customer, NewCustomer};
use fantasy_products::{NewProduct, Product};
use fantasy_sales::{NewSale, Sale};

use super::r#trait::{ReportQueries, Repository, StoreError, StoreResult};
use crate::reporting::{ConditionTotal, TopCustomer, TopProduct};

#[derive(Debug, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    invoices: BTreeMap<InvoiceId, Invoice>,
    products: BTreeMap<ProductId, Product>,
    sales: BTreeMap<SaleId, Sale>,
}

/// Next auto-increment value for a table keyed by ascending ids.
fn next_id<K, V>(table: &BTreeMap<K, V>) -> i64
where
    K: Copy + Into<i64>,
{
    table.keys().next_back().map(|k| (*k).into() + 1).unwrap_or(1)
}

/// Store `entity` under its own id and hand a copy back.
fn insert_row<E>(table: &mut BTreeMap<E::Id, E>, entity: E) -> E
where
    E: Entity,
    E::Id: Ord,
{
    table.insert(*entity.id(), entity.clone());
    entity
}

/// In-memory relational store.
///
/// Intended for tests/dev. Ids are assigned sequentially from 1 per table, foreign
/// keys are checked on save, and every report is a single hash reduction taken under
/// one lock, so readers never observe a half-applied recompute.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository<Customer> for InMemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<Customer>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.customers.values().cloned().collect())
    }

    async fn save(&self, draft: NewCustomer) -> StoreResult<Customer> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let id = CustomerId::new(next_id(&tables.customers));
        Ok(insert_row(&mut tables.customers, Customer::from_draft(id, draft)))
    }
}

#[async_trait]
impl Repository<Product> for InMemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.products.values().cloned().collect())
    }

    async fn save(&self, draft: NewProduct) -> StoreResult<Product> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        if draft.price.is_nan() || draft.price < 0.0 {
            return Err(StoreError::constraint(
                EntityKind::Product,
                format!("price {} must be >= 0", draft.price),
            ));
        }
        let id = ProductId::new(next_id(&tables.products));
        Ok(insert_row(&mut tables.products, Product::from_draft(id, draft)))
    }
}

#[async_trait]
impl Repository<Invoice> for InMemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<Invoice>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.invoices.values().cloned().collect())
    }

    async fn save(&self, draft: NewInvoice) -> StoreResult<Invoice> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        if !tables.customers.contains_key(&draft.customer_id) {
            return Err(StoreError::referential(
                EntityKind::Invoice,
                format!("customer_id {} does not exist", draft.customer_id),
            ));
        }
        let id = InvoiceId::new(next_id(&tables.invoices));
        Ok(insert_row(&mut tables.invoices, Invoice::from_draft(id, draft)))
    }
}

#[async_trait]
impl Repository<Sale> for InMemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<Sale>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.sales.values().cloned().collect())
    }

    async fn save(&self, draft: NewSale) -> StoreResult<Sale> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        if draft.quantity <= 0 {
            return Err(StoreError::constraint(
                EntityKind::Sale,
                format!("quantity {} must be > 0", draft.quantity),
            ));
        }
        if !tables.products.contains_key(&draft.product_id) {
            return Err(StoreError::referential(
                EntityKind::Sale,
                format!("product_id {} does not exist", draft.product_id),
            ));
        }
        if !tables.invoices.contains_key(&draft.invoice_id) {
            return Err(StoreError::referential(
                EntityKind::Sale,
                format!("invoice_id {} does not exist", draft.invoice_id),
            ));
        }
        let id = SaleId::new(next_id(&tables.sales));
        Ok(insert_row(&mut tables.sales, Sale::from_draft(id, draft)))
    }
}

#[async_trait]
impl ReportQueries for InMemoryStore {
    async fn recompute_invoice_totals(&self) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let tables = &mut *tables;

        // sales ⋈ products, grouped by invoice
        let mut sums: HashMap<InvoiceId, f64> = HashMap::new();
        for sale in tables.sales.values() {
            if let Some(product) = tables.products.get(&sale.product_id) {
                *sums.entry(sale.invoice_id).or_insert(0.0) += product.line_amount(sale.quantity);
            }
        }

        for (id, invoice) in tables.invoices.iter_mut() {
            invoice.total = sums.get(id).copied().unwrap_or(0.0);
        }
        Ok(())
    }

    async fn top_products(&self, limit: u32) -> StoreResult<Vec<TopProduct>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;

        let mut sold: HashMap<ProductId, i64> = HashMap::new();
        for sale in tables.sales.values() {
            *sold.entry(sale.product_id).or_insert(0) += sale.quantity;
        }

        let mut rows: Vec<TopProduct> = sold
            .into_iter()
            .filter_map(|(id, total)| {
                tables.products.get(&id).map(|p| TopProduct {
                    id,
                    description: p.description.clone(),
                    total,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total).then(a.id.cmp(&b.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn invoice_totals_by_condition(&self) -> StoreResult<Vec<ConditionTotal>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;

        let mut groups: BTreeMap<i32, f64> = BTreeMap::new();
        for invoice in tables.invoices.values() {
            if let Some(customer) = tables.customers.get(&invoice.customer_id) {
                *groups.entry(customer.condition).or_insert(0.0) += invoice.total;
            }
        }

        Ok(groups
            .into_iter()
            .map(|(condition, total)| ConditionTotal { condition, total })
            .collect())
    }

    async fn top_customers(&self, limit: u32) -> StoreResult<Vec<TopCustomer>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;

        let mut spent: HashMap<CustomerId, f64> = HashMap::new();
        for invoice in tables.invoices.values() {
            *spent.entry(invoice.customer_id).or_insert(0.0) += invoice.total;
        }

        let mut rows: Vec<TopCustomer> = tables
            .customers
            .values()
            .map(|c| TopCustomer {
                id: c.id,
                first_name: c.first_name.clone(),
                last_name: c.last_name.clone(),
                amount: spent.get(&c.id).copied().unwrap_or(0.0),
            })
            .collect();
        rows.sort_by(|a, b| b.amount.total_cmp(&a.amount).then(a.id.cmp(&b.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}
