use async_trait::async_trait;
use thiserror::Error;

use fantasy_core::{Entity, EntityKind};
use fantasy_invoicing::Invoice;
use fantasy_parties::Customer;
use fantasy_products::Product;
use fantasy_sales::Sale;

use crate::reporting::{ConditionTotal, TopCustomer, TopProduct};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// These are **infrastructure errors** (storage, integrity) as opposed to domain
/// errors (validation).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A save referenced a row that does not exist (foreign key).
    #[error("referential violation on {entity}: {detail}")]
    ReferentialViolation { entity: EntityKind, detail: String },

    /// A column value broke a row constraint (negative price, non-positive quantity).
    #[error("constraint violation on {entity}: {detail}")]
    ConstraintViolation { entity: EntityKind, detail: String },

    /// The backing database failed (connectivity, query, constraint other than FK).
    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A row came back in a shape the store cannot map.
    #[error("malformed row in {operation}: {message}")]
    MalformedRow {
        operation: &'static str,
        message: String,
    },

    /// An in-process lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn referential(entity: EntityKind, detail: impl Into<String>) -> Self {
        Self::ReferentialViolation {
            entity,
            detail: detail.into(),
        }
    }

    pub fn constraint(entity: EntityKind, detail: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            entity,
            detail: detail.into(),
        }
    }

    pub fn is_referential_violation(&self) -> bool {
        matches!(self, StoreError::ReferentialViolation { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation { .. })
    }
}

/// Per-entity persistence: list everything, or insert one draft.
///
/// `save` assigns the identifier and returns the stored entity. Implementations must
/// reject drafts whose foreign keys point at missing rows with
/// [`StoreError::ReferentialViolation`], and rows with a negative product price or a
/// non-positive sale quantity with [`StoreError::ConstraintViolation`].
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// All rows of this kind, ordered by id ascending.
    async fn find_all(&self) -> StoreResult<Vec<E>>;

    /// Insert a draft and return it with its assigned id.
    async fn save(&self, draft: E::Draft) -> StoreResult<E>;
}

/// Set-oriented aggregate queries.
///
/// Every method is one full pass over the relevant tables; none of them performs a
/// round trip per invoice or per product.
#[async_trait]
pub trait ReportQueries: Send + Sync {
    /// Set each invoice total to Σ(quantity × price) over its sales (0 when none).
    async fn recompute_invoice_totals(&self) -> StoreResult<()>;

    /// Products by summed quantity descending, ties by product id ascending.
    async fn top_products(&self, limit: u32) -> StoreResult<Vec<TopProduct>>;

    /// Σ invoice total per customer condition, ascending by condition.
    async fn invoice_totals_by_condition(&self) -> StoreResult<Vec<ConditionTotal>>;

    /// Customers by Σ invoice total descending, ties by customer id ascending.
    async fn top_customers(&self, limit: u32) -> StoreResult<Vec<TopCustomer>>;
}

/// The full persistence capability the loader and the report engine depend on.
pub trait RetailStore:
    Repository<Customer> + Repository<Invoice> + Repository<Product> + Repository<Sale> + ReportQueries
{
}

impl<T> RetailStore for T where
    T: Repository<Customer>
        + Repository<Invoice>
        + Repository<Product>
        + Repository<Sale>
        + ReportQueries
        + ?Sized
{
}
