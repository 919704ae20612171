//! Initializes `tracing` output according to [`crate::config::Logger`].

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{self, LogFormat};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once is a no-op.
///
/// # Errors
///
/// Returns an error when another subscriber was already installed by a
/// different library.
pub fn init(config: &config::Logger) -> crate::Result<()> {
    if !config.enable || INITIALIZED.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("ontograph={}", config.level.as_directive())))
        .map_err(crate::Error::wrap)?;

    let layer = match config.format {
        LogFormat::Compact => fmt::layer().compact().with_ansi(true).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_ansi(true).boxed(),
        LogFormat::Json => fmt::layer().json().with_ansi(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(crate::Error::wrap)?;

    let _ = INITIALIZED.set(());
    Ok(())
}
