//! Service wiring: record store, dispatch stage and the invoice workflow.

use std::sync::Arc;

use estatenest_infra::{
    AppConfig, InMemoryRecordStore, InvoiceDispatch, InvoiceWorkflow, LoggingDispatch,
    PostgresRecordStore, RecordStore, StoreBackend, StoreError,
};

pub type SharedStore = Arc<dyn RecordStore>;
pub type SharedDispatch = Arc<dyn InvoiceDispatch>;

/// Everything a handler needs, shared behind an `Arc`.
pub struct AppServices {
    pub config: AppConfig,
    pub store: SharedStore,
    pub workflow: InvoiceWorkflow<SharedStore, SharedDispatch>,
}

impl AppServices {
    pub fn new(config: AppConfig, store: SharedStore, dispatch: SharedDispatch) -> Self {
        Self {
            config,
            workflow: InvoiceWorkflow::new(store.clone(), dispatch),
            store,
        }
    }

    /// Connect the backend named by `config`. Invoices go through the logging
    /// dispatch stub.
    pub async fn from_config(config: AppConfig) -> Result<Self, StoreError> {
        let store: SharedStore = match &config.store {
            StoreBackend::Memory => Arc::new(InMemoryRecordStore::new()),
            StoreBackend::Postgres { database_url } => {
                Arc::new(PostgresRecordStore::connect(database_url).await?)
            }
        };
        tracing::info!(store = backend_name(&config.store), "record store ready");

        Ok(Self::new(config, store, Arc::new(LoggingDispatch::new())))
    }
}

fn backend_name(backend: &StoreBackend) -> &'static str {
    match backend {
        StoreBackend::Memory => "memory",
        StoreBackend::Postgres { .. } => "postgres",
    }
}
