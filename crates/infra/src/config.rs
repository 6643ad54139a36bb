//! Configuration loading and representation.
//!
//! Everything comes from environment variables with development defaults.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use estatenest_invoicing::{
    generate_invoice_number, DraftHeader, InvoiceDraft, DEFAULT_INVOICE_PREFIX,
    DEFAULT_PAYMENT_TERMS_DAYS,
};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Which record store backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub invoice_number_prefix: String,
    pub payment_terms_days: u64,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` (environment-shaped key/value source).
    ///
    /// | variable | default |
    /// |---|---|
    /// | `ESTATENEST_BIND_ADDR` | `0.0.0.0:8080` |
    /// | `ESTATENEST_STORE` | `memory` (or `postgres`) |
    /// | `DATABASE_URL` | required when the store is `postgres` |
    /// | `INVOICE_NUMBER_PREFIX` | `INV-` |
    /// | `INVOICE_PAYMENT_TERMS_DAYS` | `14` |
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw =
            lookup("ESTATENEST_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                key: "ESTATENEST_BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let store = match lookup("ESTATENEST_STORE")
            .unwrap_or_else(|| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "ESTATENEST_STORE",
                    value: other.to_string(),
                    reason: "expected memory or postgres".to_string(),
                });
            }
        };

        let invoice_number_prefix = lookup("INVOICE_NUMBER_PREFIX")
            .unwrap_or_else(|| DEFAULT_INVOICE_PREFIX.to_string());

        let payment_terms_days = match lookup("INVOICE_PAYMENT_TERMS_DAYS") {
            None => DEFAULT_PAYMENT_TERMS_DAYS,
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: "INVOICE_PAYMENT_TERMS_DAYS",
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?,
        };

        if matches!(store, StoreBackend::Memory) {
            tracing::warn!("ESTATENEST_STORE=memory; records are lost on restart");
        }

        Ok(Self {
            bind_addr,
            store,
            invoice_number_prefix,
            payment_terms_days,
        })
    }

    /// A fresh draft numbered and dated for `now`.
    pub fn open_draft(&self, now: DateTime<Utc>) -> InvoiceDraft {
        InvoiceDraft::new(DraftHeader::opened_on(
            generate_invoice_number(&self.invoice_number_prefix, now),
            now.date_naive(),
            self.payment_terms_days,
        ))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            store: StoreBackend::Memory,
            invoice_number_prefix: DEFAULT_INVOICE_PREFIX.to_string(),
            payment_terms_days: DEFAULT_PAYMENT_TERMS_DAYS,
        }
    }
}
