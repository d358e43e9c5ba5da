//! Tracing/logging setup shared by the shopcart binaries.

/// Initialize process-wide tracing with JSON logs on stdout.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::Output::Stdout);
}

/// Initialize process-wide tracing with logs on stderr.
///
/// For command-line tools whose stdout carries the actual output.
pub fn init_stderr() {
    tracing::init(tracing::Output::Stderr);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
