//! Logging setup shared by the binaries.

/// Initialize process-wide logging from the environment.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    subscriber::init(subscriber::LogFormat::from_env());
}

/// Subscriber configuration (filter and output format).
pub mod subscriber;
