//! Temp-file fixtures shared by the import tests.

use std::path::{Path, PathBuf};

use super::ImportSources;

/// A JSON source written to the temp dir and removed on drop.
pub(crate) struct TempSource {
    path: PathBuf,
}

impl TempSource {
    pub(crate) fn new(contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("fantasy-{}.json", uuid::Uuid::now_v7()));
        std::fs::write(&path, contents).unwrap();
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempSource {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Four temp sources and the `ImportSources` pointing at them.
pub(crate) struct TempSources {
    pub(crate) sources: ImportSources,
    _files: [TempSource; 4],
}

impl TempSources {
    pub(crate) fn new(customers: &str, invoices: &str, products: &str, sales: &str) -> Self {
        let files = [
            TempSource::new(customers),
            TempSource::new(invoices),
            TempSource::new(products),
            TempSource::new(sales),
        ];
        let sources = ImportSources {
            customers: files[0].path().to_path_buf(),
            invoices: files[1].path().to_path_buf(),
            products: files[2].path().to_path_buf(),
            sales: files[3].path().to_path_buf(),
        };
        Self {
            sources,
            _files: files,
        }
    }
}
