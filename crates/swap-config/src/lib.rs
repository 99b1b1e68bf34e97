//! Configuration loading for the swap core.
//!
//! The file is TOML. `${VAR}` placeholders are substituted from the
//! environment before parsing, then a small set of `SWAP_*` variables may
//! override individual settings.

use std::env;
use std::path::Path;
use swap_types::{toml_decimal, Decimal};
use thiserror::Error;
use tracing::debug;

mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "SWAP_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let Some(file_path) = &self.file_path else {
			return Err(ConfigError::FileNotFound(
				"No configuration file specified".to_string(),
			));
		};
		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.clone()));
		}

		let content = tokio::fs::read_to_string(file_path).await?;
		self.load_from_str(&content)
	}

	/// Parses, overrides and validates configuration text.
	pub fn load_from_str(&self, content: &str) -> Result<Config, ConfigError> {
		let substituted_content = substitute_env_vars(content)?;

		let mut config: Config = toml::from_str(&substituted_content)
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.app.log_level = log_level;
		}

		if let Ok(slippage) = env::var(format!("{}SLIPPAGE_TOLERANCE", self.env_prefix)) {
			debug!("Overriding slippage tolerance from environment");
			config.app.slippage_tolerance = toml_decimal(&toml::Value::String(slippage.clone()))
				.ok_or_else(|| {
					ConfigError::ValidationError(format!("Invalid slippage tolerance: {}", slippage))
				})?;
		}

		Ok(())
	}
}

/// Replaces every `${VAR_NAME}` with the variable's value.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = regex::Regex::new(r"\$\{([^}]+)\}")
		.map_err(|e| ConfigError::ParseError(e.to_string()))?;

	let mut result = content.to_string();
	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
	let slippage = config.app.slippage_tolerance;
	if slippage < Decimal::ZERO || slippage >= Decimal::ONE {
		return Err(ConfigError::ValidationError(format!(
			"Slippage tolerance must be in [0, 1), got {}",
			slippage
		)));
	}

	if config.app.poll_interval_secs == 0 {
		return Err(ConfigError::ValidationError(
			"Poll interval must be at least one second".to_string(),
		));
	}

	if config.network.native_token == config.network.wrapped_native {
		return Err(ConfigError::ValidationError(
			"Native placeholder and wrapped native token must differ".to_string(),
		));
	}

	for (i, token) in config.tokens.iter().enumerate() {
		if config.tokens[..i]
			.iter()
			.any(|other| other.address == token.address)
		{
			return Err(ConfigError::ValidationError(format!(
				"Token {} is listed more than once",
				token.symbol
			)));
		}
	}

	for (section, implementation) in [
		("wallet", &config.wallet),
		("market", &config.market),
		("order_book", &config.order_book),
		("storage", &config.storage),
	] {
		if implementation.implementation.trim().is_empty() {
			return Err(ConfigError::ValidationError(format!(
				"Section [{}] must name an implementation",
				section
			)));
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const BASE: &str = r#"
[app]
name = "swap-core"

[network]
chain_id = 1
rpc_url = "http://localhost:8545"
wrapped_native = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"

[[tokens]]
symbol = "ETH"
address = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE"
decimals = 18
usd_price = "3000"

[[tokens]]
symbol = "BNT"
address = "0x1F573D6Fb3F13d689FF844B4cE37794d79a7FF1C"
decimals = 18

[wallet]
implementation = "local"

[market]
implementation = "bancor"

[order_book]
implementation = "keeperdao"

[storage]
implementation = "memory"
"#;

	#[test]
	fn test_defaults_fill_in() {
		let config = ConfigLoader::new()
			.with_env_prefix("SWAP_TEST_DEFAULTS_")
			.load_from_str(BASE)
			.unwrap();
		assert_eq!(config.app.poll_interval_secs, 15);
		assert_eq!(config.app.debounce_ms, 300);
		assert_eq!(config.app.settle_delay_ms, 4000);
		assert_eq!(config.app.slippage_tolerance, Decimal::new(5, 3));
		assert_eq!(config.app.log_level, "info");
		assert!(config.network.is_native(&config.tokens[0].address));
		assert!(config
			.network
			.is_wrap_pair(&config.tokens[0].address, &config.network.wrapped_native));
		assert_eq!(
			config.tokens[0].to_token(1).usd_price,
			Some(Decimal::new(3000, 0))
		);
		assert!(config.wallet.config.as_table().unwrap().is_empty());
	}

	#[test]
	fn test_env_substitution() {
		env::set_var("SWAP_TEST_RPC_URL", "https://rpc.example");
		let text = BASE.replace("http://localhost:8545", "${SWAP_TEST_RPC_URL}");
		let config = ConfigLoader::new()
			.with_env_prefix("SWAP_TEST_SUBST_")
			.load_from_str(&text)
			.unwrap();
		assert_eq!(config.network.rpc_url, "https://rpc.example");
	}

	#[test]
	fn test_missing_env_var_fails() {
		let text = BASE.replace("http://localhost:8545", "${SWAP_TEST_DEFINITELY_UNSET}");
		let result = ConfigLoader::new().load_from_str(&text);
		assert!(matches!(result, Err(ConfigError::EnvVarNotFound(v)) if v == "SWAP_TEST_DEFINITELY_UNSET"));
	}

	#[test]
	fn test_slippage_override_and_bounds() {
		env::set_var("SWAP_TEST_OVR_SLIPPAGE_TOLERANCE", "0.01");
		let config = ConfigLoader::new()
			.with_env_prefix("SWAP_TEST_OVR_")
			.load_from_str(BASE)
			.unwrap();
		assert_eq!(config.app.slippage_tolerance, Decimal::new(1, 2));

		env::set_var("SWAP_TEST_BAD_SLIPPAGE_TOLERANCE", "1.5");
		let result = ConfigLoader::new()
			.with_env_prefix("SWAP_TEST_BAD_")
			.load_from_str(BASE);
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));
	}

	#[test]
	fn test_duplicate_tokens_rejected() {
		let text = BASE.replace(
			"[wallet]",
			"[[tokens]]\nsymbol = \"BNT2\"\naddress = \"0x1F573D6Fb3F13d689FF844B4cE37794d79a7FF1C\"\ndecimals = 18\n\n[wallet]",
		);
		let result = ConfigLoader::new()
			.with_env_prefix("SWAP_TEST_DUP_")
			.load_from_str(&text);
		assert!(matches!(result, Err(ConfigError::ValidationError(_))));
	}

	#[tokio::test]
	async fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(BASE.as_bytes()).unwrap();

		let config = ConfigLoader::new()
			.with_env_prefix("SWAP_TEST_FILE_")
			.with_file(file.path())
			.load()
			.await
			.unwrap();
		assert_eq!(config.app.name, "swap-core");

		let missing = ConfigLoader::new()
			.with_file("/nonexistent/swap.toml")
			.load()
			.await;
		assert!(matches!(missing, Err(ConfigError::FileNotFound(_))));
	}
}
