//! `fantasy-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the entity contract shared by the four record types, and the
//! domain error model.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, EntityKind};
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, InvoiceId, ProductId, SaleId};
