use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system with tracing.
///
/// The `verbose` flag controls whether debug logs are shown;
/// `RUST_LOG` still overrides either default.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose {
        "trackstation=debug,warn"
    } else {
        "trackstation=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    Ok(())
}
