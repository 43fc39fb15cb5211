//! Configuration for the printshop order service.
//!
//! Configuration is read from TOML. Values may reference environment
//! variables as `${VAR}` or `${VAR:-default}`, and a file may pull in other
//! files with `include = ["storage.toml"]` as long as every top-level section
//! is defined exactly once across all of them.

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		ConfigError::Parse(err.message().to_string())
	}
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub service: ServiceConfig,
	#[serde(default)]
	pub orders: OrdersConfig,
	#[serde(default)]
	pub pricing: PricingConfig,
	pub storage: StorageConfig,
	/// Remote document/blob backend. Without it every order is local-only.
	pub remote: Option<RemoteConfig>,
	pub api: Option<ApiConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Identifier of this shop; scopes the local storage keys.
	pub id: String,
}

/// Order numbering and intake limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersConfig {
	#[serde(default = "default_id_prefix")]
	pub id_prefix: String,
	/// Whether generated ids embed the current year (`P247-2025-000001`).
	#[serde(default = "default_include_year")]
	pub include_year: bool,
	#[serde(default = "default_max_files")]
	pub max_files: usize,
	/// Directory attached files are read from. File references on a draft
	/// must resolve inside it.
	#[serde(default = "default_upload_dir")]
	pub upload_dir: String,
}

impl Default for OrdersConfig {
	fn default() -> Self {
		Self {
			id_prefix: default_id_prefix(),
			include_year: default_include_year(),
			max_files: default_max_files(),
			upload_dir: default_upload_dir(),
		}
	}
}

fn default_id_prefix() -> String {
	"P247".to_string()
}

fn default_include_year() -> bool {
	true
}

fn default_max_files() -> usize {
	5
}

fn default_upload_dir() -> String {
	"./data/uploads".to_string()
}

/// Delivery fee parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
	#[serde(default = "default_delivery_base_fee")]
	pub delivery_base_fee: f64,
	#[serde(default = "default_delivery_included_miles")]
	pub delivery_included_miles: f64,
	#[serde(default = "default_delivery_per_mile")]
	pub delivery_per_mile: f64,
}

impl Default for PricingConfig {
	fn default() -> Self {
		Self {
			delivery_base_fee: default_delivery_base_fee(),
			delivery_included_miles: default_delivery_included_miles(),
			delivery_per_mile: default_delivery_per_mile(),
		}
	}
}

fn default_delivery_base_fee() -> f64 {
	10.0
}

fn default_delivery_included_miles() -> f64 {
	20.0
}

fn default_delivery_per_mile() -> f64 {
	0.6
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Implementation name to its raw TOML configuration.
	pub implementations: HashMap<String, toml::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
	pub primary: String,
	pub implementations: HashMap<String, toml::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Open drafts kept at once; creating one more is refused.
	#[serde(default = "default_max_drafts")]
	pub max_drafts: usize,
	/// Seconds a draft may go untouched before it is dropped.
	#[serde(default = "default_draft_idle_secs")]
	pub draft_idle_secs: u64,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			host: default_api_host(),
			port: default_api_port(),
			max_drafts: default_max_drafts(),
			draft_idle_secs: default_draft_idle_secs(),
		}
	}
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_max_drafts() -> usize {
	1000
}

fn default_draft_idle_secs() -> u64 {
	3600
}

/// Substitutes `${VAR}` and `${VAR:-default}` references with environment
/// values. A reference without a default to an unset variable is an error.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads a configuration file, following any `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation(
				"Service ID cannot be empty".into(),
			));
		}

		let prefix = &self.orders.id_prefix;
		if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
			return Err(ConfigError::Validation(format!(
				"Order id prefix must be non-empty and alphanumeric, got '{}'",
				prefix
			)));
		}
		if self.orders.upload_dir.trim().is_empty() {
			return Err(ConfigError::Validation(
				"orders.upload_dir cannot be empty".into(),
			));
		}
		if self.orders.max_files == 0 {
			return Err(ConfigError::Validation(
				"orders.max_files must be at least 1".into(),
			));
		}

		for (name, value) in [
			("delivery_base_fee", self.pricing.delivery_base_fee),
			(
				"delivery_included_miles",
				self.pricing.delivery_included_miles,
			),
			("delivery_per_mile", self.pricing.delivery_per_mile),
		] {
			if !value.is_finite() || value < 0.0 {
				return Err(ConfigError::Validation(format!(
					"pricing.{} must be a non-negative number, got {}",
					name, value
				)));
			}
		}

		validate_primary("storage", &self.storage.primary, &self.storage.implementations)?;

		if let Some(remote) = &self.remote {
			validate_primary("remote", &remote.primary, &remote.implementations)?;
		}

		if let Some(api) = &self.api {
			if api.enabled && api.port == 0 {
				return Err(ConfigError::Validation(
					"api.port must be non-zero when the API is enabled".into(),
				));
			}
			if api.max_drafts == 0 {
				return Err(ConfigError::Validation(
					"api.max_drafts must be at least 1".into(),
				));
			}
		}

		Ok(())
	}
}

fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{}.primary cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in {}.implementations",
			section, primary, section
		)));
	}
	Ok(())
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[service]
id = "printing247-denver"

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("PRINTSHOP_TEST_HOST", "localhost");
		std::env::set_var("PRINTSHOP_TEST_PORT", "8080");

		let input = "url = \"http://${PRINTSHOP_TEST_HOST}:${PRINTSHOP_TEST_PORT}/api\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8080/api\"");

		std::env::remove_var("PRINTSHOP_TEST_HOST");
		std::env::remove_var("PRINTSHOP_TEST_PORT");
	}

	#[test]
	fn test_env_var_default_and_missing() {
		let input = "prefix = \"${PRINTSHOP_UNSET_PREFIX:-P247}\"";
		assert_eq!(resolve_env_vars(input).unwrap(), "prefix = \"P247\"");

		let missing = "token = \"${PRINTSHOP_UNSET_TOKEN}\"";
		let err = resolve_env_vars(missing).unwrap_err();
		assert!(err.to_string().contains("PRINTSHOP_UNSET_TOKEN"));
	}

	#[test]
	fn test_defaults_applied() {
		let config: Config = MINIMAL.parse().unwrap();
		assert_eq!(config.service.id, "printing247-denver");
		assert_eq!(config.orders.id_prefix, "P247");
		assert!(config.orders.include_year);
		assert_eq!(config.orders.max_files, 5);
		assert_eq!(config.pricing.delivery_base_fee, 10.0);
		assert_eq!(config.pricing.delivery_included_miles, 20.0);
		assert_eq!(config.pricing.delivery_per_mile, 0.6);
		assert!(config.remote.is_none());
		assert!(config.api.is_none());
	}

	#[test]
	fn test_full_config() {
		let input = r#"
[service]
id = "shop"

[orders]
id_prefix = "ORD"
include_year = false
max_files = 3

[pricing]
delivery_base_fee = 12
delivery_per_mile = 1.5

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "/tmp/orders"

[remote]
primary = "http"
[remote.implementations.http]
base_url = "https://orders.example.com"

[api]
enabled = true
port = 8080
"#;
		let config: Config = input.parse().unwrap();
		assert_eq!(config.orders.id_prefix, "ORD");
		assert!(!config.orders.include_year);
		assert_eq!(config.pricing.delivery_base_fee, 12.0);
		assert_eq!(config.pricing.delivery_included_miles, 20.0);
		assert_eq!(config.remote.as_ref().unwrap().primary, "http");
		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 8080);
		assert_eq!(api.max_drafts, 1000);
		assert_eq!(api.draft_idle_secs, 3600);
	}

	#[test]
	fn test_validation_failures() {
		let empty_id = MINIMAL.replace("printing247-denver", " ");
		assert!(matches!(
			empty_id.parse::<Config>(),
			Err(ConfigError::Validation(_))
		));

		let unknown_primary = MINIMAL.replace("primary = \"memory\"", "primary = \"redis\"");
		let err = unknown_primary.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("redis"));

		let bad_prefix = format!("{}\n[orders]\nid_prefix = \"P-247\"\n", MINIMAL);
		assert!(bad_prefix.parse::<Config>().is_err());

		let negative_fee = format!("{}\n[pricing]\ndelivery_per_mile = -1.0\n", MINIMAL);
		assert!(negative_fee.parse::<Config>().is_err());

		let no_drafts = format!("{}\n[api]\nmax_drafts = 0\n", MINIMAL);
		assert!(no_drafts.parse::<Config>().is_err());

		let no_uploads = format!("{}\n[orders]\nupload_dir = \" \"\n", MINIMAL);
		assert!(no_uploads.parse::<Config>().is_err());
	}
}
