//! Market-order execution.
//!
//! ```text
//! Idle -> CheckingApproval -> [AwaitingApproval -> Approved] -> Executing
//!      -> Confirming -> Settled | Failed
//! ```
//!
//! A wrapped-native source skips straight to `Executing` with an unwrap.
//! Progress is published on a watch channel and on the [`EventBus`].

use crate::{ApprovalGate, EventBus, SwapError, SwapEvent, TokenStore};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use std::time::Duration;
use swap_account::{contracts::IWETH, WalletService};
use swap_quote::MarketService;
use swap_storage::StorageService;
use swap_types::{
	Address, ConversionEvent, ConversionKind, ConversionPayload, ConversionTracker, Decimal,
	Notification, NotificationId, NotificationSink, SwapRequest, Token, Transaction,
	TransactionHash, TxOutcome, UpdatedInfo, WalletSnapshot, U256,
};
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
	Idle,
	CheckingApproval,
	AwaitingApproval,
	Approved,
	Executing,
	Confirming,
	Settled,
	Failed,
}

impl ExecutionState {
	/// States during which a new submission is refused.
	pub fn is_busy(self) -> bool {
		matches!(
			self,
			ExecutionState::CheckingApproval
				| ExecutionState::AwaitingApproval
				| ExecutionState::Approved
				| ExecutionState::Executing
				| ExecutionState::Confirming
		)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorView {
	pub state: ExecutionState,
	pub approval_prompt: bool,
}

/// What the user asked for when pressing trade. The account is filled in
/// from the wallet at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeSubmission {
	pub from_token: Token,
	pub to_token: Token,
	pub from_amount: Decimal,
	pub to_amount: Decimal,
	pub slippage_tolerance: Decimal,
	pub rate: Decimal,
	pub from_amount_usd: Option<Decimal>,
	pub to_amount_usd: Option<Decimal>,
	/// Whether the amount was typed in USD.
	pub fiat_input: bool,
}

impl TradeSubmission {
	pub fn freeze(&self, user: Address) -> SwapRequest {
		SwapRequest {
			from_token: self.from_token.clone(),
			to_token: self.to_token.clone(),
			from_amount: self.from_amount,
			to_amount: self.to_amount,
			slippage_tolerance: self.slippage_tolerance,
			user,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// No wallet was connected; the user was asked to connect instead.
	ConnectRequested,
	Settled(TransactionHash),
	Rejected,
	Failed(String),
}

pub struct ExecutorSettings {
	pub native_token: Address,
	pub wrapped_native: Address,
	/// Wait after a confirmed receipt before re-reading balances.
	pub settle_delay: Duration,
	/// Key of the persisted conversion snapshot.
	pub session: String,
}

pub struct SwapExecutor {
	wallet: Arc<WalletService>,
	market: Arc<MarketService>,
	gate: ApprovalGate,
	notifications: Arc<dyn NotificationSink>,
	tracker: Arc<dyn ConversionTracker>,
	storage: Arc<StorageService>,
	store: Arc<TokenStore>,
	events: EventBus,
	view: watch::Sender<ExecutorView>,
	submitting: Mutex<()>,
	settings: ExecutorSettings,
}

fn rejected_notification() -> Notification {
	Notification::error(
		"Transaction Rejected",
		"You rejected the trade. If this was by mistake, please try again.",
	)
}

fn trade_failed_msg(request: &SwapRequest) -> String {
	format!(
		"Trading {} {} for {} {} had failed. Please try again or contact support",
		request.from_amount, request.from_token.symbol, request.to_amount, request.to_token.symbol
	)
}

fn trade_pending(request: &SwapRequest) -> Notification {
	let (fa, fs) = (request.from_amount, &request.from_token.symbol);
	let (ta, ts) = (request.to_amount, &request.to_token.symbol);
	Notification::pending(
		"Pending Confirmation",
		format!("Trading {} {} is Pending Confirmation", fa, fs),
	)
	.with_updated_info(UpdatedInfo {
		success_title: "Success!".to_string(),
		success_msg: format!("Your trade {} {} for {} {} has been confirmed", fa, fs, ta, ts),
		error_title: "Transaction Failed".to_string(),
		error_msg: trade_failed_msg(request),
	})
}

fn unwrap_pending(request: &SwapRequest) -> Notification {
	let (amount, wrapped, native) = (
		request.from_amount,
		&request.from_token.symbol,
		&request.to_token.symbol,
	);
	Notification::pending(
		"Pending Confirmation",
		format!("Unwrapping {} {} is Pending Confirmation", amount, wrapped),
	)
	.with_updated_info(UpdatedInfo {
		success_title: "Success!".to_string(),
		success_msg: format!("Your {} {} have been unwrapped into {}", amount, wrapped, native),
		error_title: "Transaction Failed".to_string(),
		error_msg: format!(
			"Unwrapping {} {} into {} had failed. Please try again or contact support",
			amount, wrapped, native
		),
	})
}

impl SwapExecutor {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		wallet: Arc<WalletService>,
		market: Arc<MarketService>,
		notifications: Arc<dyn NotificationSink>,
		tracker: Arc<dyn ConversionTracker>,
		storage: Arc<StorageService>,
		store: Arc<TokenStore>,
		events: EventBus,
		settings: ExecutorSettings,
	) -> Self {
		let gate = ApprovalGate::new(
			wallet.clone(),
			tracker.clone(),
			settings.native_token,
			market.spender(),
		);
		let (view, _) = watch::channel(ExecutorView {
			state: ExecutionState::Idle,
			approval_prompt: false,
		});

		Self {
			wallet,
			market,
			gate,
			notifications,
			tracker,
			storage,
			store,
			events,
			view,
			submitting: Mutex::new(()),
			settings,
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<ExecutorView> {
		self.view.subscribe()
	}

	pub fn view(&self) -> ExecutorView {
		*self.view.borrow()
	}

	fn set_state(&self, state: ExecutionState) {
		self.view.send_modify(|view| view.state = state);
		tracing::debug!(?state, "Execution state");
		self.events.publish(SwapEvent::StateChanged(state));
	}

	/// Runs one trade to completion.
	///
	/// Failures after submission are reported to the user and returned as
	/// an outcome; `Err` is only returned when nothing was attempted.
	pub async fn submit(&self, submission: TradeSubmission) -> Result<SubmitOutcome, SwapError> {
		let _guard = self.submitting.try_lock().map_err(|_| SwapError::Busy)?;

		let snapshot = self.wallet.snapshot().await?;
		let Some(user) = snapshot.account else {
			match self.wallet.request_connection().await {
				Ok(account) => tracing::info!(%account, "Wallet connected"),
				Err(e) => tracing::warn!(error = %e, "Wallet connection declined"),
			}
			return Ok(SubmitOutcome::ConnectRequested);
		};

		let request = submission.freeze(user);
		let conversion = ConversionEvent::market(
			&request,
			snapshot.chain_id,
			submission.from_amount_usd,
			submission.to_amount_usd,
			submission.rate,
			submission.fiat_input,
		);
		if let Err(e) = self.storage.save_conversion(&self.settings.session, &conversion).await {
			tracing::warn!(error = %e, "Could not persist conversion snapshot");
		}
		self.tracker.track(
			ConversionKind::Click,
			&ConversionPayload {
				conversion: Some(conversion),
				error: None,
			},
		);

		let outcome = if request.from_token.address == self.settings.wrapped_native {
			self.unwrap(&request, snapshot).await
		} else {
			self.trade(&request, snapshot).await
		};

		let state = match outcome {
			SubmitOutcome::Settled(_) => ExecutionState::Settled,
			_ => ExecutionState::Failed,
		};
		self.view.send_modify(|view| view.approval_prompt = false);
		self.set_state(state);

		Ok(outcome)
	}

	async fn conversion_payload(&self, error: Option<String>) -> ConversionPayload {
		ConversionPayload {
			conversion: self.storage.latest_conversion(&self.settings.session).await,
			error,
		}
	}

	async fn trade(&self, request: &SwapRequest, snapshot: WalletSnapshot) -> SubmitOutcome {
		self.set_state(ExecutionState::CheckingApproval);

		match self
			.gate
			.requires_approval(&request.from_token, request.from_amount, request.user)
			.await
		{
			Ok(false) => {}
			Ok(true) => {
				self.view.send_modify(|view| view.approval_prompt = true);
				self.set_state(ExecutionState::AwaitingApproval);
				self.gate.prompted(&self.conversion_payload(None).await);

				if let Err(e) = self
					.gate
					.approve(&request.from_token, request.from_amount, snapshot.chain_id)
					.await
				{
					return self.approval_failed(&request.from_token, e);
				}
				self.set_state(ExecutionState::Approved);
			}
			Err(e) => return self.approval_failed(&request.from_token, e),
		}

		self.set_state(ExecutionState::Executing);
		let sent = match self.market.build_swap(request).await {
			Ok(tx) => self.wallet.send_transaction(tx).await.map_err(SwapError::from),
			Err(e) => Err(e.into()),
		};
		match sent {
			Ok(hash) => {
				let pending = trade_pending(request);
				self.confirm(hash, pending, request, snapshot).await
			}
			Err(e) => self.trade_failed(request, e).await,
		}
	}

	async fn unwrap(&self, request: &SwapRequest, snapshot: WalletSnapshot) -> SubmitOutcome {
		self.set_state(ExecutionState::Executing);

		let wad = match request.from_token.to_raw(request.from_amount) {
			Ok(wad) => wad,
			Err(e) => return self.trade_failed(request, e.into()).await,
		};
		let tx = Transaction {
			to: self.settings.wrapped_native,
			data: IWETH::withdrawCall { wad }.abi_encode().into(),
			value: U256::ZERO,
			chain_id: snapshot.chain_id,
		};

		match self.wallet.send_transaction(tx).await {
			Ok(hash) => {
				let pending = unwrap_pending(request);
				self.confirm(hash, pending, request, snapshot).await
			}
			Err(e) => self.trade_failed(request, e.into()).await,
		}
	}

	fn approval_failed(&self, token: &Token, error: SwapError) -> SubmitOutcome {
		tracing::warn!(token = %token.symbol, error = %error, "Approval failed");
		self.notifications.dispatch(Notification::error(
			"Transaction Failed",
			format!(
				"{} approval had failed. Please try again or contact support.",
				token.symbol
			),
		));
		SubmitOutcome::Failed(error.to_string())
	}

	async fn trade_failed(&self, request: &SwapRequest, error: SwapError) -> SubmitOutcome {
		if error.is_user_rejected() {
			tracing::info!("Trade rejected by user");
			self.notifications.dispatch(rejected_notification());
			return SubmitOutcome::Rejected;
		}

		let message = error.to_string();
		tracing::error!(error = %message, "Swap failed");
		self.tracker.track(
			ConversionKind::Fail,
			&self.conversion_payload(Some(message.clone())).await,
		);
		self.notifications.dispatch(Notification::error(
			"Transaction Failed",
			trade_failed_msg(request),
		));
		SubmitOutcome::Failed(message)
	}

	async fn confirm(
		&self,
		hash: TransactionHash,
		pending: Notification,
		request: &SwapRequest,
		snapshot: WalletSnapshot,
	) -> SubmitOutcome {
		let id: NotificationId = pending.id;
		self.notifications.dispatch(pending.with_tx_hash(hash.clone()));
		self.events.publish(SwapEvent::TransactionSent { hash: hash.clone() });
		self.set_state(ExecutionState::Confirming);

		match self.wallet.wait_for_confirmation(&hash).await {
			Ok(receipt) if receipt.success => {
				self.notifications.resolve(id, TxOutcome::Confirmed);
			}
			Ok(_) => {
				self.notifications.resolve(id, TxOutcome::Failed);
				return SubmitOutcome::Failed(SwapError::Reverted(hash.short()).to_string());
			}
			Err(e) => {
				self.notifications.resolve(id, TxOutcome::Failed);
				return SubmitOutcome::Failed(e.to_string());
			}
		}

		tokio::time::sleep(self.settings.settle_delay).await;
		self.refresh_balances([&request.from_token, &request.to_token], snapshot)
			.await;

		tracing::info!(tx_hash = %hash.short(), "Trade settled");
		SubmitOutcome::Settled(hash)
	}

	/// Re-reads both balances for the account that traded and publishes
	/// them, unless the wallet has moved to another account or network.
	async fn refresh_balances(&self, tokens: [&Token; 2], snapshot: WalletSnapshot) {
		let Some(account) = snapshot.account else {
			return;
		};

		let reads = tokens.map(|token| async move {
			let native = token.address == self.settings.native_token;
			let raw = self.wallet.balance(token.address, account, native).await?;
			Ok::<_, SwapError>((token.address, token.from_raw(raw)?))
		});

		let mut balances = Vec::new();
		for result in futures::future::join_all(reads).await {
			match result {
				Ok(balance) => balances.push(balance),
				Err(e) => tracing::warn!(error = %e, "Balance refresh failed"),
			}
		}

		match self.wallet.snapshot().await {
			Ok(current) if current == snapshot => {}
			Ok(_) => {
				tracing::debug!(%account, "Wallet changed; discarding refreshed balances");
				self.events.publish(SwapEvent::RefreshDiscarded { account });
				return;
			}
			Err(e) => {
				tracing::warn!(error = %e, "Could not re-check wallet");
				return;
			}
		}

		let tokens = self.store.update_balances(&balances).await;
		self.events
			.publish(SwapEvent::BalancesRefreshed { account, tokens });
	}
}
