//! Tabular exports of stored records.

pub mod csv;

pub use self::csv::{to_csv, CsvRecord, ExportError};
