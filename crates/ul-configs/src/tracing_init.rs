use tracing_subscriber::{fmt, EnvFilter};

use crate::LogConfig;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so it
/// does not interleave with the rendered list on stdout.
pub fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    if log.json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
