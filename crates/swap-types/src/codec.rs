//! Decimal-string codec for 256-bit integers crossing a JSON boundary.
//!
//! Order-book payloads carry amounts, salts and expiries that do not fit in
//! an IEEE double. Values are always written as base-10 strings. On read,
//! both quoted strings and bare JSON numbers are accepted; bare numbers are
//! only lossless because the workspace builds `serde_json` with
//! `arbitrary_precision`, which keeps the literal digits of every number.

use alloy::primitives::U256;
use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Parses a JSON string or number into a `U256`.
pub fn u256_from_json(value: &Value) -> Result<U256, String> {
	let digits = match value {
		Value::String(s) => s.trim().to_string(),
		Value::Number(n) => n.to_string(),
		other => return Err(format!("expected integer, got {}", other)),
	};
	parse_u256(&digits)
}

/// Parses a base-10 integer literal into a `U256`.
pub fn parse_u256(digits: &str) -> Result<U256, String> {
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return Err(format!("not a base-10 integer: {:?}", digits));
	}
	U256::from_str_radix(digits, 10).map_err(|e| format!("invalid integer {:?}: {}", digits, e))
}

/// `#[serde(with = "u256_decimal")]` for `U256` fields.
pub mod u256_decimal {
	use super::*;

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let value = Value::deserialize(deserializer)?;
		u256_from_json(&value).map_err(D::Error::custom)
	}
}
