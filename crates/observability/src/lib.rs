//! Tracing and logging setup shared by the binary and the tests.

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, output format).
pub mod tracing;
