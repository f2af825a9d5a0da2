//! Logging and Telemetry Config

use std::time::Duration;

use clap::{ArgAction, Args, ValueEnum};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One line per event, for terminals.
    Compact,

    /// One JSON object per event, for log shippers.
    Json,
}

#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` carries no directives of its own
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// OTLP trace export and request timing.
#[derive(Debug, Args)]
pub struct ObservabilityConfig {
    /// Export traces over OTLP gRPC
    #[arg(long, env = "OTEL_ENABLED", default_value_t = false, action = ArgAction::Set)]
    pub otel_enabled: bool,

    /// Continue traces from an inbound `traceparent` header (only with export on)
    #[arg(
        long,
        env = "OTEL_PARENT_PROPAGATION_ENABLED",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub otel_parent_propagation_enabled: bool,

    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otel_exporter_otlp_endpoint: String,

    #[arg(long, env = "OTEL_EXPORTER_OTLP_TIMEOUT_SECONDS", default_value_t = 3)]
    pub otel_exporter_otlp_timeout_seconds: u64,

    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "stride-json")]
    pub otel_service_name: String,

    #[arg(long, env = "OTEL_SERVICE_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    pub otel_service_version: String,

    #[arg(long, env = "OTEL_DEPLOYMENT_ENVIRONMENT", default_value = "development")]
    pub otel_deployment_environment: String,

    /// Fraction of root traces kept; values outside 0..=1 are clamped
    #[arg(long, env = "OTEL_TRACE_SAMPLE_RATIO", default_value_t = 1.0)]
    pub otel_trace_sample_ratio: f64,

    /// Requests slower than this are logged at `warn`
    #[arg(long, env = "SLOW_REQUEST_THRESHOLD_MS", default_value_t = 1_000)]
    pub slow_request_threshold_ms: u64,
}

impl ObservabilityConfig {
    #[must_use]
    pub fn exporter_timeout(&self) -> Duration {
        Duration::from_secs(self.otel_exporter_otlp_timeout_seconds)
    }

    #[must_use]
    pub fn sample_ratio(&self) -> f64 {
        if self.otel_trace_sample_ratio.is_nan() {
            return 1.0;
        }

        self.otel_trace_sample_ratio.clamp(0.0, 1.0)
    }

    /// Parent extraction is pointless when nothing is exported.
    #[must_use]
    pub fn propagates_parent(&self) -> bool {
        self.otel_enabled && self.otel_parent_propagation_enabled
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        observability: ObservabilityConfig,
    }

    fn parse(args: &[&str]) -> ObservabilityConfig {
        Harness::parse_from(std::iter::once("stride-json").chain(args.iter().copied()))
            .observability
    }

    #[test]
    fn export_is_off_by_default() {
        let config = parse(&[]);

        assert!(!config.otel_enabled, "export must be opted into");
        assert_eq!(config.exporter_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn sample_ratio_is_clamped_to_unit_interval() {
        for (raw, expected) in [("-0.5", 0.0), ("0.25", 0.25), ("7", 1.0)] {
            let ratio = parse(&["--otel-trace-sample-ratio", raw]).sample_ratio();

            assert!((ratio - expected).abs() < f64::EPSILON, "{raw} -> {ratio}");
        }
    }

    #[test]
    fn parent_propagation_needs_export() {
        let without_export = parse(&["--otel-parent-propagation-enabled", "true"]);
        let with_export = parse(&[
            "--otel-enabled",
            "true",
            "--otel-parent-propagation-enabled",
            "true",
        ]);

        assert!(!without_export.propagates_parent(), "export is off");
        assert!(with_export.propagates_parent(), "both flags on");
    }
}
