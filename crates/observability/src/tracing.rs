//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";

/// A directive that does not parse falls back to `info`.
pub fn filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global JSON subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(directive: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(directive))
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directive_is_used() {
        assert_eq!(filter("stowage_infra=debug").to_string(), "stowage_infra=debug");
    }

    #[test]
    fn bad_directive_falls_back_to_info() {
        assert_eq!(filter("stowage=verbose").to_string(), "info");
    }

    #[test]
    fn init_is_idempotent() {
        init("warn");
        init("debug");
        ::tracing::info!("still running");
    }
}
