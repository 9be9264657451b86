//! Derived reports over the persisted entity graph.
//!
//! The row types here are read models: they are computed on demand and never stored.

pub mod engine;

pub use engine::{DEFAULT_TOP_LIMIT, ReportEngine};

use serde::Serialize;

use fantasy_core::{CustomerId, ProductId};

/// A product ranked by units sold.
///
/// `total` is a unit count, not an amount of money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub id: ProductId,
    pub description: String,
    pub total: i64,
}

/// Σ invoice total for one customer condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionTotal {
    pub condition: i32,
    pub total: f64,
}

/// A customer ranked by Σ invoice total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub amount: f64,
}
