//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Where log lines are written.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    Stderr,
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(output: Output) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match output {
        Output::Stdout => builder.try_init(),
        Output::Stderr => builder.with_writer(std::io::stderr).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(Output::Stderr);
        init(Output::Stderr);
        init(Output::Stdout);
    }
}
