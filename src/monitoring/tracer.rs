/*!
 * Structured Tracing
 * Subscriber setup for dispatcher logs using the tracing crate
 *
 * Logs always go to stderr; stdout is reserved for the report.
 *
 * Environment variables:
 * - RUST_LOG: Set log level (default: info)
 * - DISPATCH_TRACE_JSON: Enable JSON output (default: false)
 */

use crate::config::DispatcherConfig;
use tracing::{info, span, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Install the global subscriber
///
/// Returns false if a subscriber was already installed.
pub fn init_tracing(config: &DispatcherConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if config.trace_json {
        // JSON output for log collection
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = config.trace_json, "Structured tracing initialized");
    }
    installed
}

/// Span covering one run over `input`
pub fn span_simulation(input: &str, config: &DispatcherConfig) -> Span {
    span!(
        Level::INFO,
        "simulation",
        input = input,
        ordering = config.time_ordering.as_str(),
        strict = config.strict_invariants,
    )
}
