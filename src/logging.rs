use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Honours `RUST_LOG`; falls back to `info`. Calling this more than once is harmless.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
