use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// Filters come from `RUST_LOG`, defaulting to `info`. Output goes to stderr;
/// ANSI colours are only used when stderr is a terminal.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span covering one unit-of-work invocation
pub fn unit_span(name: &str, build: &str) -> Span {
    span!(Level::INFO, "unit", unit = %name, build = %build)
}

/// Emit a structured event for unit completion
pub fn unit_completed(name: &str, outcome: &str, duration_ms: u64, success: bool) {
    if success {
        info!(
            unit = %name,
            outcome = %outcome,
            duration_ms = %duration_ms,
            "unit_completed"
        );
    } else {
        error!(
            unit = %name,
            outcome = %outcome,
            duration_ms = %duration_ms,
            "unit_failed"
        );
    }
}

/// Emit a structured event for cache operations
pub fn cache_event(name: &str, identity: &str, hit: bool) {
    if hit {
        debug!(unit = %name, identity = %identity, "cache_hit");
    } else {
        debug!(unit = %name, identity = %identity, "cache_miss");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_error() {
        let _ = init();
        assert!(init().is_err());
    }

    #[test]
    fn test_helpers_do_not_panic_without_subscriber() {
        let span = unit_span("compile", "build-1");
        let _guard = span.enter();
        unit_completed("compile", "EXECUTED", 12, true);
        unit_completed("compile", "FAILED", 3, false);
        cache_event("compile", "abc", true);
        cache_event("compile", "abc", false);
    }
}
