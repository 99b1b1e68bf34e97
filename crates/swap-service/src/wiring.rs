//! Builds the configured implementations and the services on top of them.

use crate::reporting::{LogConversionTracker, LogNotificationSink};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use swap_account::{implementations::local::create_local_wallet, WalletService};
use swap_config::{Config, ImplementationConfig};
use swap_core::{EventBus, ExecutorSettings, MarketSession, Selection, SwapExecutor, TokenStore};
use swap_order::{
	implementations::keeper_dao::create_keeper_dao_order_book, OrderBookService, RfqOrderService,
};
use swap_quote::{implementations::bancor::create_bancor_market, MarketService, RateQuoteService};
use swap_storage::{
	implementations::{file::create_storage, memory::create_memory_storage},
	StorageService,
};
use swap_types::Token;

pub fn create_wallet(section: &ImplementationConfig) -> Result<WalletService> {
	let wallet = match section.implementation.as_str() {
		"local" => create_local_wallet(&section.config)?,
		other => bail!("Unknown wallet implementation: {}", other),
	};
	Ok(WalletService::new(wallet))
}

pub fn create_market(section: &ImplementationConfig) -> Result<MarketService> {
	let market = match section.implementation.as_str() {
		"bancor" => create_bancor_market(&section.config)?,
		other => bail!("Unknown market implementation: {}", other),
	};
	Ok(MarketService::new(market))
}

pub fn create_order_book(section: &ImplementationConfig) -> Result<OrderBookService> {
	let book = match section.implementation.as_str() {
		"keeper_dao" => create_keeper_dao_order_book(&section.config)?,
		other => bail!("Unknown order book implementation: {}", other),
	};
	Ok(OrderBookService::new(book))
}

pub fn create_storage_service(section: &ImplementationConfig) -> Result<StorageService> {
	let backend = match section.implementation.as_str() {
		"memory" => create_memory_storage(&section.config),
		"file" => create_storage(&section.config),
		other => bail!("Unknown storage implementation: {}", other),
	};
	Ok(StorageService::new(backend))
}

/// Everything a command needs, built once from the configuration.
pub struct Services {
	pub config: Config,
	pub wallet: Arc<WalletService>,
	pub market: Arc<MarketService>,
	pub book: Arc<OrderBookService>,
	pub storage: Arc<StorageService>,
	pub store: Arc<TokenStore>,
	pub notifications: Arc<LogNotificationSink>,
	pub tracker: Arc<LogConversionTracker>,
	pub events: EventBus,
}

impl Services {
	pub fn build(config: Config) -> Result<Self> {
		let wallet = create_wallet(&config.wallet).context("Failed to create wallet")?;
		let market = create_market(&config.market).context("Failed to create market")?;
		let book = create_order_book(&config.order_book).context("Failed to create order book")?;
		let storage =
			create_storage_service(&config.storage).context("Failed to create storage")?;

		let chain_id = config.network.chain_id;
		let tokens = config.tokens.iter().map(|t| t.to_token(chain_id)).collect();

		Ok(Self {
			wallet: Arc::new(wallet),
			market: Arc::new(market),
			book: Arc::new(book),
			storage: Arc::new(storage),
			store: Arc::new(TokenStore::new(tokens)),
			notifications: Arc::new(LogNotificationSink::new()),
			tracker: Arc::new(LogConversionTracker),
			events: EventBus::new(256),
			config,
		})
	}

	pub async fn token(&self, symbol: &str) -> Result<Token> {
		match self.store.find_symbol(symbol).await {
			Some(token) => Ok(token),
			None => bail!("Token {} is not configured", symbol),
		}
	}

	pub fn quotes(&self) -> Arc<RateQuoteService> {
		Arc::new(RateQuoteService::new(
			self.market.clone(),
			self.config.network.native_token,
			self.config.network.wrapped_native,
			Duration::from_secs(self.config.app.poll_interval_secs),
		))
	}

	pub fn session(&self, from: Token, to: Token) -> Arc<MarketSession> {
		Arc::new(MarketSession::new(
			self.quotes(),
			self.store.clone(),
			Selection {
				from,
				to: Some(to),
				amount: String::new(),
			},
			self.config.network.native_token,
			self.config.network.wrapped_native,
			Duration::from_millis(self.config.app.debounce_ms),
		))
	}

	pub fn executor(&self) -> SwapExecutor {
		SwapExecutor::new(
			self.wallet.clone(),
			self.market.clone(),
			self.notifications.clone(),
			self.tracker.clone(),
			self.storage.clone(),
			self.store.clone(),
			self.events.clone(),
			ExecutorSettings {
				native_token: self.config.network.native_token,
				wrapped_native: self.config.network.wrapped_native,
				settle_delay: Duration::from_millis(self.config.app.settle_delay_ms),
				session: self.config.app.name.clone(),
			},
		)
	}

	pub async fn limit_orders(&self) -> Result<RfqOrderService> {
		let Some(wrapped) = self.store.get(self.config.network.wrapped_native).await else {
			bail!("The wrapped native token must be listed under [[tokens]]");
		};
		Ok(RfqOrderService::new(
			self.book.clone(),
			self.wallet.clone(),
			self.notifications.clone(),
			self.config.network.native_token,
			wrapped,
		))
	}
}
