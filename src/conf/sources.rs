//! Configuration sources for layered settings
//!
//! Each source yields a flat map of keys to JSON values. The builder merges
//! them in priority order (environment variables > TOML files > defaults).

use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

pub type ConfigMap = Map<String, Value>;

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<ConfigMap, SourceError>;

	/// Priority of this source (higher wins)
	fn priority(&self) -> u8;

	fn description(&self) -> String;
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Parse error: {0}")]
	Parse(String),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

/// Environment variables, optionally filtered by a prefix
///
/// Keys are lowercased with the prefix stripped, so `RECIPES_PORT=9000`
/// becomes `port = 9000`.
#[derive(Default)]
pub struct EnvSource {
	prefix: Option<String>,
}

impl EnvSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Only load variables starting with `prefix`
	///
	/// # Examples
	///
	/// ```
	/// use recipe_box::conf::sources::{ConfigSource, EnvSource};
	///
	/// let source = EnvSource::new().with_prefix("RECIPES_");
	/// assert_eq!(source.description(), "Environment variables (prefix: RECIPES_)");
	/// ```
	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	fn parse_value(value: String) -> Value {
		match value.trim().to_lowercase().as_str() {
			"true" | "yes" | "on" => return Value::Bool(true),
			"false" | "no" | "off" => return Value::Bool(false),
			_ => {}
		}
		if let Ok(num) = value.parse::<i64>() {
			Value::Number(num.into())
		} else {
			Value::String(value)
		}
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<ConfigMap, SourceError> {
		let mut config = ConfigMap::new();

		for (key, value) in std::env::vars() {
			let clean_key = match &self.prefix {
				Some(prefix) => match key.strip_prefix(prefix.as_str()) {
					Some(stripped) => stripped,
					None => continue,
				},
				None => key.as_str(),
			};
			config.insert(clean_key.to_lowercase(), Self::parse_value(value));
		}

		Ok(config)
	}

	fn priority(&self) -> u8 {
		100
	}

	fn description(&self) -> String {
		match &self.prefix {
			Some(prefix) => format!("Environment variables (prefix: {})", prefix),
			None => "Environment variables".to_string(),
		}
	}
}

/// A TOML file. A missing file contributes nothing.
pub struct TomlFileSource {
	path: PathBuf,
}

impl TomlFileSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<ConfigMap, SourceError> {
		if !self.path.exists() {
			return Ok(ConfigMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;

		match serde_json::to_value(toml_value)? {
			Value::Object(map) => Ok(map),
			_ => Err(SourceError::Parse("Expected table at root".to_string())),
		}
	}

	fn priority(&self) -> u8 {
		50
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Fixed values, lowest priority
#[derive(Default)]
pub struct DefaultSource {
	values: ConfigMap,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<ConfigMap, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::io::Write;

	#[test]
	fn test_source_priority() {
		assert_eq!(EnvSource::new().priority(), 100);
		assert_eq!(TomlFileSource::new("x.toml").priority(), 50);
		assert_eq!(DefaultSource::new().priority(), 0);
	}

	#[rstest]
	#[case("true", Value::Bool(true))]
	#[case("Off", Value::Bool(false))]
	#[case("8080", Value::Number(8080.into()))]
	#[case("sqlite:recipes.db", Value::String("sqlite:recipes.db".into()))]
	fn test_env_value_parsing(#[case] raw: &str, #[case] expected: Value) {
		assert_eq!(EnvSource::parse_value(raw.to_string()), expected);
	}

	#[test]
	#[serial]
	fn test_env_source_strips_prefix() {
		// SAFETY: serialized with other env-mutating tests
		unsafe {
			std::env::set_var("RECIPESTEST_PORT", "9001");
		}
		let map = EnvSource::new().with_prefix("RECIPESTEST_").load().unwrap();
		unsafe {
			std::env::remove_var("RECIPESTEST_PORT");
		}

		assert_eq!(map.get("port"), Some(&Value::Number(9001.into())));
		assert_eq!(map.len(), 1);
	}

	#[test]
	fn test_toml_source() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "port = 9000\ndatabase_url = \"sqlite::memory:\"").unwrap();

		let map = TomlFileSource::new(file.path()).load().unwrap();
		assert_eq!(map.get("port"), Some(&Value::Number(9000.into())));
		assert_eq!(
			map.get("database_url"),
			Some(&Value::String("sqlite::memory:".into()))
		);
	}

	#[test]
	fn test_missing_toml_file_is_empty() {
		let map = TomlFileSource::new("/nonexistent/settings.toml")
			.load()
			.unwrap();
		assert!(map.is_empty());
	}
}
