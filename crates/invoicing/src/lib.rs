//! Invoicing domain module.
//!
//! Invoices belong to one customer and carry a `total` that is derived from their
//! sales. The derivation itself lives with the store (set-oriented recompute); this
//! crate only holds the record and its validation rules.

pub mod invoice;

pub use invoice::{Invoice, NewInvoice, parse_invoice_datetime};
