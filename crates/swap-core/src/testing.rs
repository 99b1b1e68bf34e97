//! In-memory fakes of the wallet, market and reporting seams.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swap_account::{WalletError, WalletInterface, WalletService};
use swap_quote::{MarketError, MarketInterface, MarketService};
use swap_types::{
	Address, ConfigSchema, ConversionKind, ConversionPayload, ConversionTracker, Decimal,
	MarketRate, Notification, NotificationId, NotificationSink, Schema, Signature, SwapRequest,
	Token, Transaction, TransactionHash, TransactionReceipt, TxOutcome, ValidationError,
	WalletSnapshot, B256, U256,
};

pub fn spender() -> Address {
	Address::repeat_byte(0xbb)
}

pub fn eth() -> Token {
	Token::new(1, Address::repeat_byte(0xee), "ETH", 18)
}

pub fn weth() -> Token {
	Token::new(1, Address::repeat_byte(0xc0), "WETH", 18)
}

pub fn bnt() -> Token {
	Token::new(1, Address::repeat_byte(0x1f), "BNT", 18).with_usd_price(Decimal::from(2))
}

pub fn dec(s: &str) -> Decimal {
	s.parse().unwrap()
}

pub struct NoSchema;

impl ConfigSchema for NoSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub struct WalletState {
	pub account: Option<Address>,
	pub chain_id: u64,
	pub allowance: U256,
	pub native_balance: U256,
	pub token_balances: HashMap<Address, U256>,
	/// Consumed one per send; an empty queue means the send succeeds.
	pub send_errors: VecDeque<WalletError>,
	pub receipt_success: bool,
	/// Applied when a receipt is handed out, to simulate a switch.
	pub account_after_confirm: Option<Option<Address>>,
	pub sent: Vec<Transaction>,
	pub connection_requests: usize,
	pub allowance_reads: usize,
}

impl WalletState {
	pub fn connected(account: Address) -> Self {
		Self {
			account: Some(account),
			chain_id: 1,
			allowance: U256::MAX,
			native_balance: U256::ZERO,
			token_balances: HashMap::new(),
			send_errors: VecDeque::new(),
			receipt_success: true,
			account_after_confirm: None,
			sent: Vec::new(),
			connection_requests: 0,
			allowance_reads: 0,
		}
	}
}

#[derive(Clone)]
pub struct FakeWallet(pub Arc<Mutex<WalletState>>);

impl FakeWallet {
	pub fn new(state: WalletState) -> Self {
		Self(Arc::new(Mutex::new(state)))
	}

	pub fn service(&self) -> Arc<WalletService> {
		Arc::new(WalletService::new(Box::new(self.clone())))
	}

	pub fn sent(&self) -> Vec<Transaction> {
		self.0.lock().unwrap().sent.clone()
	}
}

#[async_trait]
impl WalletInterface for FakeWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoSchema)
	}

	async fn snapshot(&self) -> Result<WalletSnapshot, WalletError> {
		let state = self.0.lock().unwrap();
		Ok(WalletSnapshot {
			account: state.account,
			chain_id: state.chain_id,
		})
	}

	async fn request_connection(&self) -> Result<Address, WalletError> {
		let mut state = self.0.lock().unwrap();
		state.connection_requests += 1;
		state.account.ok_or(WalletError::UserRejected)
	}

	async fn native_balance(&self, _owner: Address) -> Result<U256, WalletError> {
		Ok(self.0.lock().unwrap().native_balance)
	}

	async fn token_balance(&self, token: Address, _owner: Address) -> Result<U256, WalletError> {
		let state = self.0.lock().unwrap();
		Ok(state.token_balances.get(&token).copied().unwrap_or_default())
	}

	async fn allowance(
		&self,
		_token: Address,
		_owner: Address,
		_spender: Address,
	) -> Result<U256, WalletError> {
		let mut state = self.0.lock().unwrap();
		state.allowance_reads += 1;
		Ok(state.allowance)
	}

	async fn send_transaction(&self, tx: Transaction) -> Result<TransactionHash, WalletError> {
		let mut state = self.0.lock().unwrap();
		if let Some(error) = state.send_errors.pop_front() {
			return Err(error);
		}
		state.sent.push(tx);
		Ok(TransactionHash(B256::with_last_byte(state.sent.len() as u8)))
	}

	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, WalletError> {
		let mut state = self.0.lock().unwrap();
		if let Some(account) = state.account_after_confirm.take() {
			state.account = account;
		}
		Ok(TransactionReceipt {
			hash: hash.clone(),
			block_number: 1,
			success: state.receipt_success,
		})
	}

	async fn sign_typed_data(&self, _digest: B256) -> Result<Signature, WalletError> {
		Err(WalletError::SigningFailed("not supported".into()))
	}
}

/// Quotes a fixed per-unit rate and builds a placeholder trade.
pub struct FakeMarket {
	rate: Mutex<Decimal>,
	failing: AtomicBool,
	pub calls: AtomicUsize,
	/// Time each lookup takes.
	pub delay: Duration,
}

impl FakeMarket {
	pub fn new(rate: &str) -> Arc<Self> {
		Self::slow(rate, Duration::ZERO)
	}

	pub fn slow(rate: &str, delay: Duration) -> Arc<Self> {
		Arc::new(Self {
			rate: Mutex::new(dec(rate)),
			failing: AtomicBool::new(false),
			calls: AtomicUsize::new(0),
			delay,
		})
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn set_rate(&self, rate: &str) {
		*self.rate.lock().unwrap() = dec(rate);
	}

	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	pub fn service(self: &Arc<Self>) -> Arc<MarketService> {
		Arc::new(MarketService::new(Box::new(SharedMarket(self.clone()))))
	}
}

struct SharedMarket(Arc<FakeMarket>);

#[async_trait]
impl MarketInterface for SharedMarket {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(NoSchema)
	}

	async fn expected_return(
		&self,
		_from: &Token,
		_to: &Token,
		amount: Decimal,
	) -> Result<MarketRate, MarketError> {
		self.0.calls.fetch_add(1, Ordering::SeqCst);
		if !self.0.delay.is_zero() {
			tokio::time::sleep(self.0.delay).await;
		}
		if self.0.failing.load(Ordering::SeqCst) {
			return Err(MarketError::Network("node unreachable".into()));
		}
		let rate = *self.0.rate.lock().unwrap();
		Ok(MarketRate {
			output_amount: amount * rate,
			price_impact: dec("0.25"),
		})
	}

	async fn build_swap(&self, request: &SwapRequest) -> Result<Transaction, MarketError> {
		Ok(Transaction {
			to: spender(),
			data: vec![0x01].into(),
			value: U256::ZERO,
			chain_id: request.from_token.chain_id,
		})
	}

	fn spender(&self) -> Address {
		spender()
	}
}

#[derive(Default)]
pub struct RecordingSink {
	pub dispatched: Mutex<Vec<Notification>>,
	pub resolved: Mutex<Vec<(NotificationId, TxOutcome)>>,
}

impl NotificationSink for RecordingSink {
	fn dispatch(&self, notification: Notification) {
		self.dispatched.lock().unwrap().push(notification);
	}

	fn resolve(&self, id: NotificationId, outcome: TxOutcome) {
		self.resolved.lock().unwrap().push((id, outcome));
	}
}

#[derive(Default)]
pub struct RecordingTracker {
	pub events: Mutex<Vec<(ConversionKind, ConversionPayload)>>,
}

impl RecordingTracker {
	pub fn kinds(&self) -> Vec<ConversionKind> {
		self.events.lock().unwrap().iter().map(|(k, _)| *k).collect()
	}
}

impl ConversionTracker for RecordingTracker {
	fn track(&self, kind: ConversionKind, payload: &ConversionPayload) {
		self.events.lock().unwrap().push((kind, payload.clone()));
	}
}
