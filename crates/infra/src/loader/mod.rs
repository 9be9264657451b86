//! Bulk import: stream JSON sources into the store in dependency order.
//!
//! ## Flow
//!
//! ```text
//! file ──► blocking decoder ──► bounded channel ──► async save loop ──► store
//! ```
//!
//! The decoder runs on the blocking pool and never holds more than the channel capacity
//! in memory. Saves happen one at a time in source order. The first failure (unreadable
//! file, malformed JSON, rejected save) aborts the load; rows saved before it stay saved.

pub mod pipeline;
pub mod records;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

use std::fs::File;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::instrument;

use fantasy_core::{Entity, EntityKind};

use crate::store::{Repository, StoreError};

pub use pipeline::{ImportPipeline, ImportSources, ImportSummary};
pub use records::{CustomerRecord, InvoiceRecord, ProductRecord, SaleRecord, SourceRecord};
pub use source::stream_json_array;

/// Records buffered between the decoder thread and the save loop.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {kind} source {}: {source}", .path.display())]
    SourceRead {
        kind: EntityKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {kind} source {}: {source}", .path.display())]
    Decode {
        kind: EntityKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("saving {kind} record #{index} failed: {source}")]
    Store {
        kind: EntityKind,
        index: usize,
        #[source]
        source: StoreError,
    },

    #[error("{kind} decoder stopped unexpectedly: {reason}")]
    Interrupted { kind: EntityKind, reason: String },
}

impl LoadError {
    pub fn kind(&self) -> EntityKind {
        match self {
            LoadError::SourceRead { kind, .. }
            | LoadError::Decode { kind, .. }
            | LoadError::Store { kind, .. }
            | LoadError::Interrupted { kind, .. } => *kind,
        }
    }

    /// The store error behind a failed save, if that is what stopped the load.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            LoadError::Store { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Stream one JSON array source of `R` records into `store`.
///
/// Returns the number of records saved.
#[instrument(skip_all, fields(path = %path.display()), err)]
pub async fn load_source<R, S>(store: &S, path: &Path) -> Result<usize, LoadError>
where
    R: SourceRecord,
    S: Repository<R::Entity> + ?Sized,
{
    let kind = <R::Entity as Entity>::KIND;
    let (tx, mut rx) = mpsc::channel::<R>(CHANNEL_CAPACITY);

    let source_path = path.to_path_buf();
    let decoder = tokio::task::spawn_blocking(move || -> Result<usize, LoadError> {
        let file = File::open(&source_path).map_err(|source| LoadError::SourceRead {
            kind,
            path: source_path.clone(),
            source,
        })?;
        // A closed receiver means the save loop gave up; stop reading.
        stream_json_array(file, |record: R| match tx.blocking_send(record) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        })
        .map_err(|source| LoadError::Decode {
            kind,
            path: source_path.clone(),
            source,
        })
    });

    let mut saved = 0usize;
    while let Some(record) = rx.recv().await {
        let source_id = record.source_id();
        if let Err(source) = Repository::<R::Entity>::save(store, record.into_draft()).await {
            tracing::warn!(%kind, index = saved, ?source_id, error = %source, "save rejected");
            rx.close();
            let _ = decoder.await;
            return Err(LoadError::Store {
                kind,
                index: saved,
                source,
            });
        }
        saved += 1;
    }

    let decoded = decoder.await.map_err(|e| LoadError::Interrupted {
        kind,
        reason: e.to_string(),
    })??;
    debug_assert_eq!(decoded, saved);

    tracing::info!(%kind, records = saved, "source imported");
    Ok(saved)
}
