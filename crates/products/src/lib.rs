//! Products domain module.
//!
//! This crate contains the catalog record (description + unit price) and its
//! validation rules (no IO, no HTTP, no storage).

pub mod product;

pub use product::{NewProduct, Product};
