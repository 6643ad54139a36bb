//! Infrastructure layer: record storage, invoice dispatch, the save/send
//! workflow, CSV export and configuration.

pub mod config;
pub mod dispatch;
pub mod export;
pub mod store;
pub mod workflow;

pub use config::{AppConfig, ConfigError, StoreBackend};
pub use dispatch::{
    DispatchAck, DispatchError, InvoiceDispatch, InvoiceReference, LoggingDispatch,
    RecordingDispatch,
};
pub use store::{InMemoryRecordStore, PostgresRecordStore, RecordStore, RowQuery, StoreError};
pub use workflow::{
    InvoiceSession, InvoiceWorkflow, PersistStage, SavedInvoice, SendOutcome, WorkflowError,
    WorkflowState,
};
