use tracing::Level;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over the verbosity flag.
///
/// Records from the `log` facade (everything trellis-core emits) are forwarded
/// to tracing. Output goes to stderr so command output on stdout stays clean.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trellis={level},trellis_core={level}")));

    if let Err(e) = LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(verbosity > 0)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }
}
