//! Infrastructure layer: persistence, bulk import, reporting, config.

pub mod config;
pub mod loader;
pub mod reporting;
pub mod store;
