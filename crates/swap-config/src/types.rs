//! Configuration types for the swap core.

use serde::{Deserialize, Serialize};
use swap_types::{Address, Decimal, Token};

/// Complete configuration, one section per concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub app: AppConfig,
	pub network: NetworkConfig,
	/// Tokens offered for selection.
	#[serde(default)]
	pub tokens: Vec<TokenConfig>,
	pub wallet: ImplementationConfig,
	pub market: ImplementationConfig,
	pub order_book: ImplementationConfig,
	pub storage: ImplementationConfig,
}

/// Timings and trading defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
	pub name: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Quote refresh cadence while a pair is selected.
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
	/// Quiet period after the last keystroke before quoting.
	#[serde(default = "default_debounce_ms")]
	pub debounce_ms: u64,
	/// Wait after a confirmed receipt before re-reading balances.
	#[serde(default = "default_settle_delay_ms")]
	pub settle_delay_ms: u64,
	/// Fraction, e.g. `"0.005"`.
	#[serde(default = "default_slippage_tolerance")]
	pub slippage_tolerance: Decimal,
	/// Lifetime of limit orders when none is given.
	#[serde(default = "default_limit_duration_secs")]
	pub limit_duration_secs: u64,
}

/// Chain the core trades on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
	pub chain_id: u64,
	pub rpc_url: String,
	/// Placeholder address standing for the native currency.
	#[serde(default = "default_native_token")]
	pub native_token: Address,
	/// ERC-20 wrapper of the native currency (WETH).
	pub wrapped_native: Address,
}

impl NetworkConfig {
	pub fn is_native(&self, address: &Address) -> bool {
		*address == self.native_token
	}

	pub fn is_wrapped_native(&self, address: &Address) -> bool {
		*address == self.wrapped_native
	}

	/// True for the native/wrapped-native pair in either direction.
	pub fn is_wrap_pair(&self, from: &Address, to: &Address) -> bool {
		(self.is_native(from) && self.is_wrapped_native(to))
			|| (self.is_wrapped_native(from) && self.is_native(to))
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
	pub symbol: String,
	pub address: Address,
	pub decimals: u8,
	#[serde(default)]
	pub usd_price: Option<Decimal>,
}

impl TokenConfig {
	pub fn to_token(&self, chain_id: u64) -> Token {
		let token = Token::new(chain_id, self.address, self.symbol.clone(), self.decimals);
		match self.usd_price {
			Some(price) => token.with_usd_price(price),
			None => token,
		}
	}
}

/// A pluggable backend: which implementation, plus its own raw settings,
/// validated by that implementation's schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationConfig {
	pub implementation: String,
	#[serde(default = "empty_table")]
	pub config: toml::Value,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_poll_interval_secs() -> u64 {
	15
}

fn default_debounce_ms() -> u64 {
	300
}

fn default_settle_delay_ms() -> u64 {
	4000
}

fn default_slippage_tolerance() -> Decimal {
	Decimal::new(5, 3)
}

fn default_limit_duration_secs() -> u64 {
	7 * 24 * 60 * 60
}

fn default_native_token() -> Address {
	Address::repeat_byte(0xee)
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::map::Map::new())
}
