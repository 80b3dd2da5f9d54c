use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Filter applied when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn";

/// Initialize the tracing system
///
/// Honors `RUST_LOG`, falling back to `default_filter`. Output goes to stderr so
/// that command output on stdout stays machine-readable; ANSI colours are only
/// used when stderr is a terminal.
pub fn init_with_filter(
    default_filter: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

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

/// Initialize the tracing system with the default filter
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    init_with_filter(DEFAULT_FILTER)
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Create a span for one store operation
pub fn operation_span(operation: &str, storage_id: &str) -> Span {
    span!(Level::DEBUG, "store", operation = %operation, storage_id = %storage_id)
}
