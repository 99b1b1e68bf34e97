//! Reconciles racing quote requests into one displayed quote.
//!
//! Every request is issued against the current [`QuoteKey`] and carries a
//! [`QuoteTicket`] recording that key and whether the display was empty at
//! issue time. When the request settles:
//!
//! - a result for a key that is no longer current is dropped;
//! - a result issued while the display was empty only lands if nothing has
//!   landed since, so the first seeding response wins;
//! - any other result replaces the displayed quote.
//!
//! The loading flag is raised when a ticket is issued and lowered when its
//! request settles, whatever the outcome.

use swap_types::{Quote, QuoteKey};
use tokio::sync::watch;

/// What the display shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteView {
	pub key: Option<QuoteKey>,
	pub quote: Option<Quote>,
	/// Error text of the most recent failed lookup for this key.
	pub error: Option<String>,
	pub in_flight: usize,
}

impl QuoteView {
	pub fn is_loading(&self) -> bool {
		self.in_flight > 0
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteTicket {
	key: QuoteKey,
	seeding: bool,
}

impl QuoteTicket {
	pub fn key(&self) -> &QuoteKey {
		&self.key
	}

	pub fn is_seeding(&self) -> bool {
		self.seeding
	}
}

/// Outcome of settling a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
	Applied,
	/// The inputs changed while the request was in flight.
	Stale,
	/// Another seeding response already filled the display.
	Superseded,
	/// The lookup failed; the previous quote is kept.
	Failed,
}

pub struct QuoteSequencer {
	state: watch::Sender<QuoteView>,
}

impl Default for QuoteSequencer {
	fn default() -> Self {
		Self::new()
	}
}

impl QuoteSequencer {
	pub fn new() -> Self {
		let (state, _) = watch::channel(QuoteView::default());
		Self { state }
	}

	pub fn subscribe(&self) -> watch::Receiver<QuoteView> {
		self.state.subscribe()
	}

	pub fn view(&self) -> QuoteView {
		self.state.borrow().clone()
	}

	/// Makes `key` current. A different key invalidates the displayed quote.
	pub fn select(&self, key: QuoteKey) {
		self.state.send_if_modified(|view| {
			if view.key.as_ref() == Some(&key) {
				return false;
			}
			view.key = Some(key);
			view.quote = None;
			view.error = None;
			true
		});
	}

	/// Forgets the current key, e.g. when the destination is cleared.
	pub fn clear(&self) {
		self.state.send_modify(|view| {
			view.key = None;
			view.quote = None;
			view.error = None;
		});
	}

	/// Issues a ticket for the current key and raises the loading flag.
	/// Returns `None` when no key is selected.
	pub fn begin(&self) -> Option<QuoteTicket> {
		let mut ticket = None;
		self.state.send_if_modified(|view| {
			let Some(key) = view.key.clone() else {
				return false;
			};
			ticket = Some(QuoteTicket {
				key,
				seeding: view.quote.is_none(),
			});
			view.in_flight += 1;
			true
		});
		ticket
	}

	/// Settles `ticket` with its lookup result.
	pub fn settle<E: std::fmt::Display>(
		&self,
		ticket: QuoteTicket,
		result: Result<Quote, E>,
	) -> Settled {
		let mut outcome = Settled::Applied;
		self.state.send_modify(|view| {
			view.in_flight = view.in_flight.saturating_sub(1);

			if view.key.as_ref() != Some(&ticket.key) {
				outcome = Settled::Stale;
				return;
			}
			match result {
				Ok(quote) => {
					if ticket.seeding && view.quote.is_some() {
						outcome = Settled::Superseded;
					} else {
						view.quote = Some(quote);
						view.error = None;
					}
				}
				Err(e) => {
					view.error = Some(e.to_string());
					outcome = Settled::Failed;
				}
			}
		});

		tracing::trace!(amount = %ticket.key.amount, ?outcome, "Quote settled");
		outcome
	}
}
