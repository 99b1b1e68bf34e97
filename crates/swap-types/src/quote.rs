//! Quote types.

use alloy::primitives::Address;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Token;

/// Raw answer from a market: total output for the requested input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRate {
	/// Destination amount received for the whole input amount.
	pub output_amount: Decimal,
	/// Estimated price impact, in percent.
	pub price_impact: Decimal,
}

/// The input snapshot a quote was requested for.
///
/// A quote is only meaningful for the exact key that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteKey {
	pub chain_id: u64,
	pub from: Address,
	pub to: Address,
	/// The literal amount typed by the user; empty when no input.
	pub amount: String,
}

impl QuoteKey {
	pub fn new(from: &Token, to: &Token, amount: impl Into<String>) -> Self {
		Self {
			chain_id: from.chain_id,
			from: from.address,
			to: to.address,
			amount: amount.into(),
		}
	}
}

/// A derived quote for a `(from, to, amount)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
	/// Destination units per one source unit.
	pub rate: Decimal,
	/// Price impact in percent, two decimals.
	pub price_impact: Decimal,
	/// Destination amount, truncated to the destination token's precision.
	pub output_amount: Decimal,
	/// `None` whenever the destination USD price is unknown.
	pub output_amount_usd: Option<Decimal>,
}

impl Quote {
	/// A rate of exactly zero means there is no route between the tokens.
	pub fn has_route(&self) -> bool {
		!self.rate.is_zero()
	}

	/// Rate as shown to the user, in either direction.
	///
	/// Inverting a zero rate yields zero rather than failing.
	pub fn display_rate(&self, inverted: bool) -> Decimal {
		if !inverted {
			return self.rate;
		}
		if self.rate.is_zero() {
			Decimal::ZERO
		} else {
			Decimal::ONE / self.rate
		}
	}
}

/// Rounds a percentage to two decimals, halves away from zero.
pub fn round_percent(percent: Decimal) -> Decimal {
	percent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price impact shown when there is no input amount.
pub fn zero_price_impact() -> Decimal {
	Decimal::new(0, 2)
}

/// Percentage difference between the USD value received and the USD value
/// paid, rounded to two decimals. `None` if either side is unknown or zero,
/// or the difference is out of range.
pub fn usd_slippage(from_usd: Option<Decimal>, to_usd: Option<Decimal>) -> Option<Decimal> {
	let (from_usd, to_usd) = (from_usd?, to_usd?);
	if from_usd.is_zero() {
		return None;
	}
	let ratio = to_usd.checked_sub(from_usd)?.checked_div(from_usd)?;
	ratio.checked_mul(Decimal::ONE_HUNDRED).map(round_percent)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn dec(s: &str) -> Decimal {
		s.parse().unwrap()
	}

	fn quote(rate: &str) -> Quote {
		Quote {
			rate: dec(rate),
			price_impact: zero_price_impact(),
			output_amount: Decimal::ZERO,
			output_amount_usd: None,
		}
	}

	#[test]
	fn test_zero_price_impact_renders_two_decimals() {
		assert_eq!(zero_price_impact().to_string(), "0.00");
	}

	#[test]
	fn test_display_rate_inversion() {
		assert_eq!(quote("4").display_rate(false), dec("4"));
		assert_eq!(quote("4").display_rate(true), dec("0.25"));
		assert_eq!(quote("0").display_rate(true), Decimal::ZERO);
		assert!(!quote("0").has_route());
	}

	#[test]
	fn test_usd_slippage() {
		assert_eq!(usd_slippage(Some(dec("100")), Some(dec("97"))), Some(dec("-3")));
		assert_eq!(usd_slippage(Some(dec("3")), Some(dec("2"))), Some(dec("-33.33")));
		assert_eq!(usd_slippage(None, Some(dec("97"))), None);
		assert_eq!(usd_slippage(Some(dec("0")), Some(dec("1"))), None);
	}

	#[test]
	fn test_round_percent_half_away_from_zero() {
		assert_eq!(round_percent(dec("2.345")), dec("2.35"));
		assert_eq!(round_percent(dec("2.355")), dec("2.36"));
		assert_eq!(round_percent(dec("-2.345")), dec("-2.35"));
		assert_eq!(round_percent(dec("2.344")), dec("2.34"));
	}
}
