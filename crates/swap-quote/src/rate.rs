//! Quote derivation from raw market answers.

use crate::{MarketService, QuoteError};
use std::sync::Arc;
use std::time::Duration;
use swap_types::{
	parse_amount, round_percent, zero_price_impact, Address, AmountError, Decimal, Quote, Token,
};

/// Amount quoted when the input is empty, so a rate can still be shown.
pub const PROBE_AMOUNT: Decimal = Decimal::ONE;

/// Derives [`Quote`]s for a pair and owns the refresh cadence.
pub struct RateQuoteService {
	market: Arc<MarketService>,
	native_token: Address,
	wrapped_native: Address,
	poll_interval: Duration,
}

impl RateQuoteService {
	pub fn new(
		market: Arc<MarketService>,
		native_token: Address,
		wrapped_native: Address,
		poll_interval: Duration,
	) -> Self {
		Self {
			market,
			native_token,
			wrapped_native,
			poll_interval,
		}
	}

	/// How often a selected pair is re-quoted.
	pub fn poll_interval(&self) -> Duration {
		self.poll_interval
	}

	/// Native currency and its wrapper, in either order.
	pub fn is_wrap_pair(&self, from: &Token, to: &Token) -> bool {
		let (native, wrapped) = (self.native_token, self.wrapped_native);
		(from.address == native && to.address == wrapped)
			|| (from.address == wrapped && to.address == native)
	}

	/// Quotes `amount` (literal user input) of `from` into `to`.
	///
	/// Empty or zero input is quoted with [`PROBE_AMOUNT`] to obtain a rate,
	/// and reports zero price impact and zero output. Failures propagate,
	/// including amounts too large to derive an output for; no rate is ever
	/// substituted for a failed lookup.
	pub async fn quote(&self, from: &Token, to: &Token, amount: &str) -> Result<Quote, QuoteError> {
		let entered = parse_amount(amount)?.filter(|a| !a.is_zero());
		let input = entered.unwrap_or(Decimal::ZERO);

		if self.is_wrap_pair(from, to) {
			return derive(Decimal::ONE, zero_price_impact(), input, to);
		}

		let queried = entered.unwrap_or(PROBE_AMOUNT);
		let market_rate = self.market.expected_return(from, to, queried).await?;
		let rate = market_rate
			.output_amount
			.checked_div(queried)
			.ok_or_else(|| overflow(market_rate.output_amount, queried))?;
		let price_impact = if entered.is_some() {
			round_percent(market_rate.price_impact)
		} else {
			zero_price_impact()
		};

		tracing::debug!(
			from = %from.symbol,
			to = %to.symbol,
			amount = %queried,
			%rate,
			%price_impact,
			"Quoted"
		);

		derive(rate, price_impact, input, to)
	}
}

fn overflow(lhs: Decimal, rhs: Decimal) -> QuoteError {
	QuoteError::Amount(AmountError::Overflow(format!("{} and {}", lhs, rhs)))
}

fn derive(
	rate: Decimal,
	price_impact: Decimal,
	input: Decimal,
	to: &Token,
) -> Result<Quote, QuoteError> {
	let output = input.checked_mul(rate).ok_or_else(|| overflow(input, rate))?;
	let output_amount_usd = match to.usd_price {
		Some(price) => Some(output.checked_mul(price).ok_or_else(|| overflow(output, price))?),
		None => None,
	};
	Ok(Quote {
		rate,
		price_impact,
		output_amount: to.sanitize(output),
		output_amount_usd,
	})
}
