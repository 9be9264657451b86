//! Configuration loading from the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::loader::ImportSources;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },

    #[error("{var} must be true or false, got {value}")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var} must be set when IMPORT_ON_STARTUP=true")]
    MissingImportPath { var: &'static str },

    #[error("DATABASE_URL must be a sqlite: URL, got {0}")]
    UnsupportedDatabase(String),
}

/// Startup import settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub sources: ImportSources,
    pub recompute_after_import: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// `Some` when `IMPORT_ON_STARTUP=true`.
    pub import: Option<ImportConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidAddr {
            var: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let database_url = get("DATABASE_URL");
        if let Some(url) = &database_url {
            if !url.starts_with("sqlite:") {
                return Err(ConfigError::UnsupportedDatabase(url.clone()));
            }
        }

        let import_on_startup = parse_bool("IMPORT_ON_STARTUP", get("IMPORT_ON_STARTUP"), false)?;
        let import = if import_on_startup {
            let path = |var: &'static str| {
                get(var)
                    .map(PathBuf::from)
                    .ok_or(ConfigError::MissingImportPath { var })
            };
            Some(ImportConfig {
                sources: ImportSources {
                    customers: path("CUSTOMERS_PATH")?,
                    invoices: path("INVOICES_PATH")?,
                    products: path("PRODUCTS_PATH")?,
                    sales: path("SALES_PATH")?,
                },
                recompute_after_import: parse_bool(
                    "RECOMPUTE_AFTER_IMPORT",
                    get("RECOMPUTE_AFTER_IMPORT"),
                    true,
                )?,
            })
        } else {
            None
        };

        Ok(Self {
            bind_addr,
            database_url,
            import,
        })
    }
}

fn parse_bool(var: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidBool { var, value: v }),
        },
    }
}
