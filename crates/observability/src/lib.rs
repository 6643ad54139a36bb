//! Shared logging setup for the EstateNest binaries.

pub mod tracing;

/// Initialize process-wide logging with the default `info` filter.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}
