//! Tracing and Sentry setup.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ClientConfig, LogFormat};

const DEFAULT_FILTER: &str = "vitrine_client=info,vitrine_cli=info";

/// Initialize Sentry error tracking when a DSN is configured.
///
/// Returns a guard that must be held for the lifetime of the process.
#[must_use]
pub fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Into::into),
            send_default_pii: false,
            ..Default::default()
        },
    ));

    if guard.is_enabled() {
        tracing::info!("Sentry initialized");
    }
    Some(guard)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. With Sentry initialized, errors
/// and warnings become Sentry events and lower levels become breadcrumbs.
pub fn init_tracing(config: &ClientConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let sentry_layer = sentry_tracing::layer().event_filter(sentry_event_filter);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_layer);

    match config.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

/// Custom Sentry event filter for tracing integration.
///
/// - ERROR/WARN → Sentry events (captured as issues)
/// - INFO/DEBUG → Breadcrumbs (context for debugging)
/// - TRACE → Ignored
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}
