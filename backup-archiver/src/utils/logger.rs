//! Logging configuration using tracing.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging with the specified level and output stream.
///
/// `RUST_LOG` takes precedence over `level`. `output` is `stdout` or
/// `stderr`; anything else falls back to stderr so stdout stays free for
/// command output.
pub fn init(level: &str, output: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    if output.eq_ignore_ascii_case("stdout") {
        registry
            .with(fmt::layer().with_writer(std::io::stdout))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}
