//! Rate quoting for the swap core.
//!
//! A [`MarketInterface`] answers "how much `to` for this much `from`" and
//! builds the trade calldata. On top of it, [`RateQuoteService`] derives the
//! user-facing [`Quote`](swap_types::Quote), [`QuoteSequencer`] decides which
//! responses may reach the display, and [`Debouncer`] collapses keystrokes.

use async_trait::async_trait;
use swap_types::{
	Address, AmountError, ConfigSchema, Decimal, MarketRate, SwapRequest, Token, Transaction,
};
use thiserror::Error;

pub mod debounce;
pub mod rate;
pub mod sequencer;

pub mod implementations {
	pub mod bancor;
}

pub use debounce::Debouncer;
pub use rate::RateQuoteService;
pub use sequencer::{QuoteSequencer, QuoteTicket, QuoteView, Settled};

#[derive(Debug, Error)]
pub enum MarketError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Amount error: {0}")]
	Amount(#[from] AmountError),
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
}

#[derive(Debug, Error)]
pub enum QuoteError {
	#[error(transparent)]
	Market(#[from] MarketError),
	#[error("Invalid amount: {0}")]
	Amount(#[from] AmountError),
}

/// A liquidity source able to price and execute conversions.
#[async_trait]
pub trait MarketInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Total `to` output for `amount` of `from`, with its price impact.
	/// An output of zero means no route exists.
	async fn expected_return(
		&self,
		from: &Token,
		to: &Token,
		amount: Decimal,
	) -> Result<MarketRate, MarketError>;

	/// Calldata for executing `request`, honouring its minimum return.
	async fn build_swap(&self, request: &SwapRequest) -> Result<Transaction, MarketError>;

	/// Contract that must hold the allowance for the source token.
	fn spender(&self) -> Address;
}

pub struct MarketService {
	market: Box<dyn MarketInterface>,
}

impl MarketService {
	pub fn new(market: Box<dyn MarketInterface>) -> Self {
		Self { market }
	}

	pub async fn expected_return(
		&self,
		from: &Token,
		to: &Token,
		amount: Decimal,
	) -> Result<MarketRate, MarketError> {
		self.market.expected_return(from, to, amount).await
	}

	pub async fn build_swap(&self, request: &SwapRequest) -> Result<Transaction, MarketError> {
		self.market.build_swap(request).await
	}

	pub fn spender(&self) -> Address {
		self.market.spender()
	}
}
