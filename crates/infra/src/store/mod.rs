//! Persistence capability and its two implementations.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

use std::sync::Arc;

pub use in_memory::InMemoryStore;
pub use r#trait::{ReportQueries, Repository, RetailStore, StoreError, StoreResult};
pub use sqlite::SqliteStore;

/// Open the store selected by `database_url`.
///
/// `None` selects the in-memory store; any `sqlite:` URL selects [`SqliteStore`].
pub async fn open_store(database_url: Option<&str>) -> StoreResult<Arc<dyn RetailStore>> {
    match database_url {
        None => {
            tracing::info!("using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        Some(url) => {
            tracing::info!(url, "using sqlite store");
            Ok(Arc::new(SqliteStore::connect(url).await?))
        }
    }
}
