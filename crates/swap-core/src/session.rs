//! The selected market and its live quote.
//!
//! A [`MarketSession`] owns the pair and amount the user is looking at and
//! keeps a quote for them fresh: on every selection change, once typing
//! settles, and on a fixed interval. All lookups go through the
//! [`QuoteSequencer`], so whatever the order responses arrive in, only a
//! result for the current inputs is displayed.

use crate::{trade_button, TokenStore, TradeButton, TradeInputs, TradeSubmission};
use std::sync::Arc;
use std::time::Duration;
use swap_quote::{Debouncer, QuoteSequencer, QuoteView, RateQuoteService, Settled};
use swap_types::{parse_amount, Address, Decimal, QuoteKey, Token};
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
	pub from: Token,
	pub to: Option<Token>,
	/// Amount currently being quoted, as typed.
	pub amount: String,
}

impl Selection {
	pub fn key(&self) -> Option<QuoteKey> {
		self.to
			.as_ref()
			.map(|to| QuoteKey::new(&self.from, to, self.amount.as_str()))
	}
}

pub struct MarketSession {
	quotes: Arc<RateQuoteService>,
	sequencer: QuoteSequencer,
	store: Arc<TokenStore>,
	selection: watch::Sender<Selection>,
	/// Latest keystroke, ahead of the debounced `selection.amount`.
	typed: watch::Sender<String>,
	debouncer: Debouncer<String>,
	debounced: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
	native_token: Address,
	wrapped_native: Address,
	shutdown_tx: broadcast::Sender<()>,
}

impl MarketSession {
	/// Must be called from within a tokio runtime.
	pub fn new(
		quotes: Arc<RateQuoteService>,
		store: Arc<TokenStore>,
		initial: Selection,
		native_token: Address,
		wrapped_native: Address,
		debounce: Duration,
	) -> Self {
		let (debouncer, debounced) = Debouncer::new(debounce);
		let sequencer = QuoteSequencer::new();
		if let Some(key) = initial.key() {
			sequencer.select(key);
		}
		let (typed, _) = watch::channel(initial.amount.clone());
		let (selection, _) = watch::channel(initial);
		let (shutdown_tx, _) = broadcast::channel(1);

		Self {
			quotes,
			sequencer,
			store,
			selection,
			typed,
			debouncer,
			debounced: Mutex::new(Some(debounced)),
			native_token,
			wrapped_native,
			shutdown_tx,
		}
	}

	pub fn selection(&self) -> Selection {
		self.selection.borrow().clone()
	}

	pub fn quote_view(&self) -> QuoteView {
		self.sequencer.view()
	}

	pub fn subscribe_quotes(&self) -> watch::Receiver<QuoteView> {
		self.sequencer.subscribe()
	}

	fn is_wrapped(&self, token: &Token) -> bool {
		token.address == self.wrapped_native
	}

	/// Applies `change` and makes the resulting key current, so responses
	/// for the previous inputs are dropped.
	fn update(&self, change: impl FnOnce(&mut Selection)) {
		self.selection.send_if_modified(|selection| {
			let before = selection.clone();
			change(selection);
			*selection != before
		});
		match self.selection.borrow().key() {
			Some(key) => self.sequencer.select(key),
			None => self.sequencer.clear(),
		}
	}

	/// Selecting the wrapped native token as source pins the destination
	/// to the native currency.
	pub async fn set_from(&self, token: Token) {
		let native = if self.is_wrapped(&token) {
			self.store.get(self.native_token).await
		} else {
			None
		};
		self.update(|selection| {
			selection.from = token;
			if native.is_some() {
				selection.to = native;
			}
		});
	}

	/// The wrapped native token is never a destination; choosing it clears
	/// the destination instead.
	pub fn set_to(&self, token: Token) {
		let to = if self.is_wrapped(&token) { None } else { Some(token) };
		self.update(|selection| selection.to = to);
	}

	/// Exchanges source and destination. Refused while the source is the
	/// wrapped native token or no destination is selected.
	pub fn switch(&self) -> bool {
		let current = self.selection();
		let Some(to) = current.to else {
			return false;
		};
		if self.is_wrapped(&current.from) {
			return false;
		}
		self.update(|selection| {
			selection.to = Some(std::mem::replace(&mut selection.from, to));
		});
		true
	}

	/// Records a keystroke. The amount is quoted once typing settles.
	pub fn set_amount(&self, amount: impl Into<String>) {
		let amount = amount.into();
		self.typed.send_replace(amount.clone());
		if !self.debouncer.push(amount) {
			tracing::warn!("Amount input closed");
		}
	}

	/// Makes `amount` the quoted amount right away.
	pub fn apply_amount(&self, amount: impl Into<String>) {
		let amount = amount.into();
		self.typed.send_replace(amount.clone());
		self.update(|selection| selection.amount = amount);
	}

	pub fn typed_amount(&self) -> String {
		self.typed.borrow().clone()
	}

	/// The typed amount has not been quoted yet.
	pub fn amount_pending(&self) -> bool {
		*self.typed.borrow() != self.selection.borrow().amount
	}

	/// Quotes the current selection once.
	///
	/// Returns how the result was reconciled, or `None` when there is
	/// nothing to quote.
	pub async fn refresh(&self) -> Option<Settled> {
		let selection = self.selection();
		let to = selection.to.as_ref()?;
		let key = selection.key()?;

		self.sequencer.select(key);
		let ticket = self.sequencer.begin()?;
		let result = self
			.quotes
			.quote(&selection.from, to, &selection.amount)
			.await;
		if let Err(e) = &result {
			tracing::warn!(
				from = %selection.from.symbol,
				to = %to.symbol,
				error = %e,
				"Quote lookup failed"
			);
		}
		Some(self.sequencer.settle(ticket, result))
	}

	/// Drives quoting until [`shutdown`](Self::shutdown) is called.
	///
	/// Each trigger spawns its own lookup; overlapping lookups are
	/// reconciled by the sequencer.
	pub async fn run(self: Arc<Self>) {
		let Some(mut debounced) = self.debounced.lock().await.take() else {
			tracing::warn!("Market session is already running");
			return;
		};
		let mut selection_rx = self.selection.subscribe();
		let mut shutdown_rx = self.shutdown_tx.subscribe();
		let mut interval = tokio::time::interval(self.quotes.poll_interval());
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = interval.tick() => self.spawn_refresh(),
				Ok(()) = selection_rx.changed() => self.spawn_refresh(),
				Some(amount) = debounced.recv() => self.apply_amount(amount),
				_ = shutdown_rx.recv() => {
					tracing::debug!("Market session stopped");
					break;
				}
			}
		}
	}

	fn spawn_refresh(self: &Arc<Self>) {
		let session = self.clone();
		tokio::spawn(async move {
			session.refresh().await;
		});
	}

	pub fn shutdown(&self) {
		let _ = self.shutdown_tx.send(());
	}

	/// Trade button for the current inputs.
	///
	/// Counts as loading while typing has not settled, so a quote for an
	/// earlier amount can never be traded.
	pub async fn trade_button(&self, wallet_connected: bool, executing: bool) -> TradeButton {
		let selection = self.selection();
		let view = self.quote_view();
		let amount = self.typed_amount();
		let balance = self
			.store
			.get(selection.from.address)
			.await
			.and_then(|token| token.balance);

		trade_button(&TradeInputs {
			destination_selected: selection.to.is_some(),
			amount: &amount,
			balance,
			rate: view.quote.as_ref().map(|q| q.rate),
			price_impact: view.quote.as_ref().map(|q| q.price_impact),
			loading: view.is_loading() || self.amount_pending(),
			wallet_connected,
			executing,
		})
	}

	/// The trade the user would submit now, if a quote for the typed,
	/// positive amount is displayed.
	pub fn submission(
		&self,
		slippage_tolerance: Decimal,
		fiat_input: bool,
	) -> Option<TradeSubmission> {
		if self.amount_pending() {
			return None;
		}
		let selection = self.selection();
		let to_token = selection.to?;
		let from_amount = parse_amount(&selection.amount)
			.ok()
			.flatten()
			.filter(|a| !a.is_zero())?;
		let quote = self.quote_view().quote?;

		Some(TradeSubmission {
			from_amount_usd: selection.from.usd_price.and_then(|p| p.checked_mul(from_amount)),
			from_token: selection.from,
			to_token,
			from_amount,
			to_amount: quote.output_amount,
			slippage_tolerance,
			rate: quote.rate,
			to_amount_usd: quote.output_amount_usd,
			fiat_input,
		})
	}
}
