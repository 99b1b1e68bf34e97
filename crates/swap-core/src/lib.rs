//! Swap execution core.
//!
//! Ties the quoting, wallet and storage services together: the
//! [`MarketSession`] keeps a consistent quote for the selected pair, the
//! [`ApprovalGate`] checks allowances, and the [`SwapExecutor`] drives a
//! submission through approval, execution and confirmation while reporting
//! progress to the user.

use swap_account::WalletError;
use swap_quote::MarketError;
use swap_types::{Address, AmountError, Token, TransactionHash};
use thiserror::Error;

pub mod approval;
pub mod button;
pub mod event_bus;
pub mod executor;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use approval::ApprovalGate;
pub use button::{is_high_price_impact, trade_button, ButtonVariant, TradeButton, TradeInputs};
pub use event_bus::EventBus;
pub use executor::{
	ExecutionState, ExecutorSettings, ExecutorView, SubmitOutcome, SwapExecutor, TradeSubmission,
};
pub use session::{MarketSession, Selection};
pub use store::TokenStore;

#[derive(Debug, Error)]
pub enum SwapError {
	#[error("A submission is already in progress")]
	Busy,
	#[error("Transaction {0} reverted")]
	Reverted(String),
	#[error(transparent)]
	Wallet(#[from] WalletError),
	#[error(transparent)]
	Market(#[from] MarketError),
	#[error(transparent)]
	Amount(#[from] AmountError),
}

impl SwapError {
	pub fn is_user_rejected(&self) -> bool {
		matches!(self, SwapError::Wallet(e) if e.is_user_rejected())
	}
}

/// Progress broadcast to anyone observing the core.
#[derive(Debug, Clone)]
pub enum SwapEvent {
	StateChanged(ExecutionState),
	TransactionSent {
		hash: TransactionHash,
	},
	BalancesRefreshed {
		account: Address,
		tokens: Vec<Token>,
	},
	/// Fresh balances arrived after the wallet switched account or network.
	RefreshDiscarded {
		account: Address,
	},
}
