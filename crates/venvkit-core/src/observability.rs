//! Observability: tracing init.
//!
//! Reads `ObservabilityConfig` for VENVKIT_QUIET, VENVKIT_LOG_LEVEL and VENVKIT_LOG_JSON.
//! Logs always go to stderr so stdout stays free for the provisioning report.

use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::ObservabilityConfig;

/// Resolve the filter directive: quiet wins over the configured level.
pub fn filter_directive(cfg: &ObservabilityConfig) -> String {
    if cfg.quiet {
        "venvkit=warn".to_string()
    } else {
        cfg.log_level.clone()
    }
}

/// Initialize tracing. Call once at process startup; `RUST_LOG` overrides the config.
pub fn init_tracing() {
    let cfg = ObservabilityConfig::from_env();
    let level = filter_directive(cfg);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_level() {
        let cfg = ObservabilityConfig {
            quiet: true,
            log_level: "venvkit=debug".to_string(),
            log_json: false,
        };
        assert_eq!(filter_directive(&cfg), "venvkit=warn");
    }

    #[test]
    fn test_level_passthrough() {
        let cfg = ObservabilityConfig {
            quiet: false,
            log_level: "venvkit=trace,venvkit_provision=debug".to_string(),
            log_json: true,
        };
        assert_eq!(filter_directive(&cfg), "venvkit=trace,venvkit_provision=debug");
    }
}
