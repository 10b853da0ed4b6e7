//! Structured logging setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::Settings;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the `log_filter` setting. Calling this
/// more than once is harmless: later calls leave the first subscriber in place.
pub fn init_logging(settings: &Settings) {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(&settings.log_filter))
		.unwrap_or_else(|_| EnvFilter::new("info"));

	let installed = tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(true))
		.try_init()
		.is_ok();

	if installed {
		tracing::info!(
			filter = %settings.log_filter,
			debug = settings.debug,
			"Logging initialized"
		);
	}
}
