//! Token snapshots and amount conversions.
//!
//! A [`Token`] is an immutable snapshot: balances and USD prices are
//! refreshed by replacing the snapshot, never by mutating a shared one.

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors converting between human-unit and raw on-chain amounts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
	#[error("Amount must not be negative: {0}")]
	Negative(String),
	#[error("Invalid amount: {0}")]
	Invalid(String),
	#[error("Amount does not fit: {0}")]
	Overflow(String),
}

/// A token as seen by the trading core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
	pub chain_id: u64,
	pub address: Address,
	pub symbol: String,
	pub decimals: u8,
	/// Unknown prices stay `None`; they are never displayed as zero.
	pub usd_price: Option<Decimal>,
	pub balance: Option<Decimal>,
}

impl Token {
	pub fn new(chain_id: u64, address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
		Self {
			chain_id,
			address,
			symbol: symbol.into(),
			decimals,
			usd_price: None,
			balance: None,
		}
	}

	pub fn with_usd_price(mut self, price: Decimal) -> Self {
		self.usd_price = Some(price);
		self
	}

	pub fn with_balance(mut self, balance: Decimal) -> Self {
		self.balance = Some(balance);
		self
	}

	/// Converts a human-unit amount into the token's raw integer units.
	///
	/// Digits beyond the token's precision are truncated.
	pub fn to_raw(&self, amount: Decimal) -> Result<U256, AmountError> {
		to_raw_units(amount, self.decimals)
	}

	/// Converts raw integer units into a human-unit amount.
	pub fn from_raw(&self, raw: U256) -> Result<Decimal, AmountError> {
		from_raw_units(raw, self.decimals)
	}

	/// Truncates an amount to the token's precision.
	pub fn sanitize(&self, amount: Decimal) -> Decimal {
		amount
			.round_dp_with_strategy(self.decimals as u32, rust_decimal::RoundingStrategy::ToZero)
			.normalize()
	}
}

/// Converts a human-unit amount into raw units with `decimals` places.
pub fn to_raw_units(amount: Decimal, decimals: u8) -> Result<U256, AmountError> {
	if amount.is_sign_negative() && !amount.is_zero() {
		return Err(AmountError::Negative(amount.to_string()));
	}

	let text = amount.normalize().to_string();
	let (whole, fraction) = match text.split_once('.') {
		Some((w, f)) => (w, f),
		None => (text.as_str(), ""),
	};

	let decimals = decimals as usize;
	let mut digits = String::with_capacity(whole.len() + decimals);
	digits.push_str(whole);
	if fraction.len() >= decimals {
		digits.push_str(&fraction[..decimals]);
	} else {
		digits.push_str(fraction);
		digits.extend(std::iter::repeat('0').take(decimals - fraction.len()));
	}

	U256::from_str_radix(&digits, 10).map_err(|e| AmountError::Overflow(e.to_string()))
}

/// Converts raw units with `decimals` places into a human-unit amount.
pub fn from_raw_units(raw: U256, decimals: u8) -> Result<Decimal, AmountError> {
	let digits = raw.to_string();
	let decimals = decimals as usize;

	let text = if digits.len() > decimals {
		let (whole, fraction) = digits.split_at(digits.len() - decimals);
		format!("{}.{}", whole, fraction)
	} else {
		format!("0.{}{}", "0".repeat(decimals - digits.len()), digits)
	};

	Decimal::from_str(text.trim_end_matches('.'))
		.map(|d| d.normalize())
		.map_err(|e| AmountError::Overflow(format!("{}: {}", text, e)))
}

/// Parses user input into a non-negative amount. Empty input is `None`.
pub fn parse_amount(input: &str) -> Result<Option<Decimal>, AmountError> {
	let input = input.trim();
	if input.is_empty() {
		return Ok(None);
	}
	let amount = Decimal::from_str(input).map_err(|_| AmountError::Invalid(input.to_string()))?;
	if amount.is_sign_negative() && !amount.is_zero() {
		return Err(AmountError::Negative(input.to_string()));
	}
	Ok(Some(amount))
}
