//! Off-chain RFQ limit orders.
//!
//! An [`OrderBookInterface`] talks to an order-matching service. The
//! [`RfqOrderService`] builds orders from the service's fixed details, has
//! the wallet sign them as EIP-712 typed data and posts them, wrapping the
//! native currency first when it is the source token.

use async_trait::async_trait;
use swap_account::WalletError;
use swap_types::{
	Address, ConfigSchema, InfoResponse, OrderResponse, RfqOrder, SendOrdersResponse,
	TokenListResponse,
};
use thiserror::Error;

pub mod eip712;
pub mod limit;

pub mod implementations {
	pub mod keeper_dao;
}

pub use limit::RfqOrderService;

#[derive(Debug, Error)]
pub enum OrderError {
	#[error("Order book request failed: {0}")]
	Http(String),
	#[error("Invalid order book response: {0}")]
	Decode(String),
	#[error("Unexpected response from server, {0}")]
	UnexpectedResponse(String),
	#[error("Unexpected error during send order request {0}")]
	Submission(String),
	#[error("Invalid order: {0}")]
	InvalidOrder(String),
	#[error("Wrapping {0} failed")]
	DepositFailed(String),
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),
	#[error(transparent)]
	Wallet(#[from] WalletError),
}

impl OrderError {
	pub fn is_user_rejected(&self) -> bool {
		matches!(self, OrderError::Wallet(e) if e.is_user_rejected())
	}
}

/// An order-matching service accepting signed RFQ orders.
#[async_trait]
pub trait OrderBookInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	async fn token_list(&self) -> Result<TokenListResponse, OrderError>;

	/// Orders made by `maker`, with their fill status.
	async fn orders(&self, maker: Address) -> Result<OrderResponse, OrderError>;

	/// Fixed order fields (`txOrigin`, `pool`, verifying contract, ...).
	async fn info(&self) -> Result<InfoResponse, OrderError>;

	/// Posts signed orders. Anything but an explicit success message is an
	/// error, even on HTTP 200.
	async fn send_orders(&self, orders: &[RfqOrder]) -> Result<SendOrdersResponse, OrderError>;
}

pub struct OrderBookService {
	book: Box<dyn OrderBookInterface>,
}

impl OrderBookService {
	pub fn new(book: Box<dyn OrderBookInterface>) -> Self {
		Self { book }
	}

	pub async fn token_list(&self) -> Result<TokenListResponse, OrderError> {
		self.book.token_list().await
	}

	pub async fn orders(&self, maker: Address) -> Result<OrderResponse, OrderError> {
		self.book.orders(maker).await
	}

	pub async fn info(&self) -> Result<InfoResponse, OrderError> {
		self.book.info().await
	}

	/// The relayer address the service requires as `txOrigin`.
	pub async fn tx_origin(&self) -> Result<Address, OrderError> {
		Ok(self.book.info().await?.result.order_details.tx_origin)
	}

	pub async fn send_orders(&self, orders: &[RfqOrder]) -> Result<SendOrdersResponse, OrderError> {
		let response = self.book.send_orders(orders).await?;
		tracing::info!(
			count = orders.len(),
			hashes = response.result.as_ref().map(|r| r.hash_list.len()).unwrap_or(0),
			"Orders accepted"
		);
		Ok(response)
	}
}
