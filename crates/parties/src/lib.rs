//! Parties domain module (customers).
//!
//! This crate contains the customer record and its validation rules, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod customer;

pub use customer::{Customer, NewCustomer};
