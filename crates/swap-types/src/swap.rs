//! Frozen swap inputs.

use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Token;

/// The inputs used to build an on-chain trade.
///
/// Created at submit time; never modified after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
	pub from_token: Token,
	pub to_token: Token,
	pub from_amount: Decimal,
	pub to_amount: Decimal,
	/// Fraction, e.g. `0.005` for half a percent.
	pub slippage_tolerance: Decimal,
	pub user: Address,
}

impl SwapRequest {
	/// Smallest acceptable output after slippage, in the destination's
	/// precision.
	pub fn min_return(&self) -> Decimal {
		let min = self.to_amount * (Decimal::ONE - self.slippage_tolerance);
		self.to_token.sanitize(min.max(Decimal::ZERO))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_min_return_applies_slippage() {
		let from = Token::new(1, Address::repeat_byte(1), "BNT", 18);
		let to = Token::new(1, Address::repeat_byte(2), "USDC", 6);
		let request = SwapRequest {
			from_token: from,
			to_token: to,
			from_amount: "10".parse().unwrap(),
			to_amount: "25".parse().unwrap(),
			slippage_tolerance: "0.005".parse().unwrap(),
			user: Address::repeat_byte(9),
		};
		assert_eq!(request.min_return(), "24.875".parse::<Decimal>().unwrap());
	}
}
