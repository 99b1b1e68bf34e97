//! Trade button state, derived purely from the current inputs.

use swap_types::{parse_amount, Decimal};

/// Price impact, in percent, from which the label warns.
pub const HIGH_SLIPPAGE_LABEL: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
/// Price impact from which the button takes the error style.
pub const ERROR_SEVERITY: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
/// Price impact from which the figure itself is highlighted.
pub const HIGH_PRICE_IMPACT: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

pub const INSUFFICIENT_BALANCE_ERROR: &str = "Token balance is currently insufficient";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonVariant {
	Primary,
	Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeButton {
	pub label: &'static str,
	pub disabled: bool,
	pub variant: ButtonVariant,
}

#[derive(Debug, Clone, Copy)]
pub struct TradeInputs<'a> {
	pub destination_selected: bool,
	/// Literal amount typed by the user.
	pub amount: &'a str,
	/// Source balance, when known.
	pub balance: Option<Decimal>,
	/// `None` until a quote has landed.
	pub rate: Option<Decimal>,
	pub price_impact: Option<Decimal>,
	pub loading: bool,
	pub wallet_connected: bool,
	/// A submission is between approval check and confirmation.
	pub executing: bool,
}

/// Input validation message for the source amount.
pub fn input_error(amount: &str, balance: Option<Decimal>) -> Option<&'static str> {
	let amount = parse_amount(amount).ok().flatten()?;
	match balance {
		Some(balance) if amount > balance => Some(INSUFFICIENT_BALANCE_ERROR),
		_ => None,
	}
}

pub fn is_high_price_impact(price_impact: Decimal) -> bool {
	price_impact >= HIGH_PRICE_IMPACT
}

fn amount_is_zero(amount: &str) -> bool {
	!matches!(parse_amount(amount), Ok(Some(a)) if !a.is_zero())
}

pub fn trade_button(inputs: &TradeInputs<'_>) -> TradeButton {
	let no_route = inputs.rate.is_some_and(|r| r.is_zero());
	let zero_amount = amount_is_zero(inputs.amount);
	let impact = inputs.price_impact.unwrap_or(Decimal::ZERO);

	let disabled = inputs.loading
		|| inputs.executing
		|| input_error(inputs.amount, inputs.balance).is_some()
		|| no_route
		|| zero_amount
		|| !inputs.destination_selected;

	let label = if !inputs.destination_selected {
		"Select a token"
	} else if input_error(inputs.amount, inputs.balance).is_some() {
		"Insufficient balance"
	} else if zero_amount {
		"Enter Amount"
	} else if no_route {
		"Insufficient liquidity"
	} else if !inputs.wallet_connected {
		"Connect your wallet"
	} else if impact >= HIGH_SLIPPAGE_LABEL {
		"Trade with high slippage"
	} else {
		"Trade"
	};

	let variant = if impact >= ERROR_SEVERITY {
		ButtonVariant::Error
	} else {
		ButtonVariant::Primary
	};

	TradeButton {
		label,
		disabled,
		variant,
	}
}
