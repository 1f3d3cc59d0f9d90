//! Tracing and logging setup shared by the stowage binaries.

/// Initialize process-wide tracing with an `EnvFilter` directive, such as the
/// one carried by `StowageConfig::log_filter`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(directive: &str) {
    tracing::init(directive);
}

/// Subscriber construction (filter, JSON formatter).
pub mod tracing;
