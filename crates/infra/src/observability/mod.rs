//! Tracing subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the configured level is used as the
//! filter directive. Installation happens at most once per process.

use once_cell::sync::OnceCell;
use pardot_domain::{LogSettings, PardotError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Install the global `tracing` subscriber described by `settings`.
///
/// Later calls are no-ops. An invalid level directive is a
/// `PardotError::Config`.
pub fn init_tracing(settings: &LogSettings) -> Result<()> {
    INITIALIZED.get_or_try_init(|| install(settings)).map(|_| ())
}

/// Whether [`init_tracing`] has completed successfully in this process.
pub fn is_initialized() -> bool {
    INITIALIZED.get().is_some()
}

fn install(settings: &LogSettings) -> Result<()> {
    let filter = build_filter(settings)?;

    let fmt_layer = if settings.json {
        tracing_subscriber::fmt::layer().json().with_target(true).with_level(true).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(true).with_level(true).boxed()
    };

    // Another subscriber may already be installed by the host process.
    if let Err(err) = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init() {
        tracing::debug!(error = %err, "global subscriber already set, keeping it");
    }
    Ok(())
}

fn build_filter(settings: &LogSettings) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&settings.level).map_err(|err| {
            PardotError::Config(format!("invalid log level '{}': {err}", settings.level))
        })
    })
}
