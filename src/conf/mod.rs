//! Application settings
//!
//! Settings are merged from layered sources, lowest priority first:
//! built-in defaults, `settings/base.toml`, `settings/{profile}.toml`,
//! then `RECIPES_*` environment variables. The profile comes from
//! `RECIPES_ENV` and defaults to `local`.

pub mod sources;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sources::{ConfigMap, ConfigSource, DefaultSource, EnvSource, SourceError, TomlFileSource};

pub const ENV_PREFIX: &str = "RECIPES_";
pub const PROFILE_VAR: &str = "RECIPES_ENV";

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to load {source_name}: {error}")]
	Source {
		source_name: String,
		#[source]
		error: SourceError,
	},

	#[error("Invalid settings: {0}")]
	Deserialize(#[from] serde_json::Error),

	#[error("Invalid value for {key}: {message}")]
	Validation { key: &'static str, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub host: String,
	pub port: u16,
	pub debug: bool,
	/// `memory` or an sqlx SQLite url such as `sqlite:recipes.db`
	pub database_url: String,
	pub media_root: PathBuf,
	/// Upper bound for a single uploaded attachment, in bytes
	pub max_upload_size: usize,
	pub session_cookie_name: String,
	pub session_ttl_secs: u64,
	pub session_cookie_secure: bool,
	/// `tracing_subscriber::EnvFilter` directives
	pub log_filter: String,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_string(),
			port: 8000,
			debug: false,
			database_url: "memory".to_string(),
			media_root: PathBuf::from("media"),
			max_upload_size: 10 * 1024 * 1024,
			session_cookie_name: "sessionid".to_string(),
			session_ttl_secs: 60 * 60 * 24 * 14,
			session_cookie_secure: false,
			log_filter: "info".to_string(),
		}
	}
}

impl Settings {
	/// Load settings from `settings_dir` and the environment.
	pub fn load(settings_dir: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let profile = std::env::var(PROFILE_VAR).unwrap_or_else(|_| "local".to_string());
		let settings_dir = settings_dir.as_ref();

		let settings = SettingsBuilder::new()
			.add_source(DefaultSource::new())
			.add_source(TomlFileSource::new(settings_dir.join("base.toml")))
			.add_source(TomlFileSource::new(
				settings_dir.join(format!("{}.toml", profile)),
			))
			.add_source(EnvSource::new().with_prefix(ENV_PREFIX))
			.build()?;

		tracing::debug!(profile = %profile, "settings loaded");
		Ok(settings)
	}

	/// Reject values the server cannot run with.
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::conf::Settings;
	///
	/// let mut settings = Settings::default();
	/// assert!(settings.validate().is_ok());
	///
	/// settings.port = 0;
	/// assert!(settings.validate().is_err());
	/// ```
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.port == 0 {
			return Err(SettingsError::Validation {
				key: "port",
				message: "must be between 1 and 65535".to_string(),
			});
		}
		if self.session_cookie_name.trim().is_empty() {
			return Err(SettingsError::Validation {
				key: "session_cookie_name",
				message: "must not be empty".to_string(),
			});
		}
		if self.max_upload_size == 0 {
			return Err(SettingsError::Validation {
				key: "max_upload_size",
				message: "must be greater than zero".to_string(),
			});
		}
		Ok(())
	}

	pub fn bind_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

/// Merges [`ConfigSource`]s by priority and deserializes the result.
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Merge every source into one map. Ties keep insertion order.
	pub fn merge(mut self) -> Result<ConfigMap, SettingsError> {
		self.sources.sort_by_key(|source| source.priority());

		let mut merged = ConfigMap::new();
		for source in &self.sources {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			merged.extend(values);
		}
		Ok(merged)
	}

	/// Merge, deserialize and validate.
	pub fn build(self) -> Result<Settings, SettingsError> {
		let merged = self.merge()?;
		let settings: Settings = serde_json::from_value(serde_json::Value::Object(merged))?;
		settings.validate()?;
		Ok(settings)
	}
}
