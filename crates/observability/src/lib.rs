//! Process-wide logging setup shared by the binaries.

/// Initialize tracing with the defaults (`RUST_LOG`, falling back to `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogConfig::from_env());
}

pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat};
