//! Sales domain module.
//!
//! A sale is one invoice line: a quantity of one product billed on one invoice.

pub mod sale;

pub use sale::{NewSale, Sale};
