use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Install the global tracing subscriber for the host process
///
/// `RUST_LOG` takes precedence over `logging.level`. `logging.format` selects
/// `pretty` or compact single-line output.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.format == "pretty" {
        subscriber.pretty().try_init()?;
    } else {
        subscriber.compact().try_init()?;
    }
    Ok(())
}
