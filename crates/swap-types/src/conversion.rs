//! Conversion-funnel analytics records.
//!
//! These are ephemeral: the latest snapshot is persisted per session so
//! later funnel stages can reference it, and losing it is never fatal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::SwapRequest;

/// Slippage tolerance reported as the `Regular` setting.
pub const REGULAR_SLIPPAGE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Chain id reported as `Ropsten`; everything else is `MainNet`.
pub const ROPSTEN_CHAIN_ID: u64 = 3;

/// Snapshot of the user's choices at the moment they pressed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionEvent {
	pub conversion_type: String,
	pub conversion_blockchain_network: String,
	pub conversion_settings: String,
	pub conversion_token_pair: String,
	pub conversion_from_token: String,
	pub conversion_to_token: String,
	pub conversion_from_amount: String,
	pub conversion_from_amount_usd: Option<String>,
	pub conversion_to_amount: String,
	pub conversion_to_amount_usd: Option<String>,
	pub conversion_input_type: String,
	pub conversion_rate: String,
}

impl ConversionEvent {
	/// Builds a market-conversion snapshot.
	pub fn market(
		request: &SwapRequest,
		chain_id: u64,
		from_amount_usd: Option<Decimal>,
		to_amount_usd: Option<Decimal>,
		rate: Decimal,
		fiat_input: bool,
	) -> Self {
		let network = if chain_id == ROPSTEN_CHAIN_ID {
			"Ropsten"
		} else {
			"MainNet"
		};
		let settings = if request.slippage_tolerance == REGULAR_SLIPPAGE {
			"Regular"
		} else {
			"Advanced"
		};
		Self {
			conversion_type: "Market".to_string(),
			conversion_blockchain_network: network.to_string(),
			conversion_settings: settings.to_string(),
			conversion_token_pair: format!(
				"{}/{}",
				request.from_token.symbol, request.to_token.symbol
			),
			conversion_from_token: request.from_token.symbol.clone(),
			conversion_to_token: request.to_token.symbol.clone(),
			conversion_from_amount: request.from_amount.to_string(),
			conversion_from_amount_usd: from_amount_usd.map(|v| v.to_string()),
			conversion_to_amount: request.to_amount.to_string(),
			conversion_to_amount_usd: to_amount_usd.map(|v| v.to_string()),
			conversion_input_type: if fiat_input { "Fiat" } else { "Token" }.to_string(),
			conversion_rate: rate.to_string(),
		}
	}
}

/// Funnel stage being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
	Click,
	ApprovePop,
	Fail,
}

/// Body sent alongside a funnel event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionPayload {
	pub conversion: Option<ConversionEvent>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

/// Analytics transport for funnel events. Delivery is best effort.
pub trait ConversionTracker: Send + Sync {
	fn track(&self, kind: ConversionKind, payload: &ConversionPayload);
}
