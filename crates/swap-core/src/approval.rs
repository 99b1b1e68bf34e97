//! Allowance checks ahead of a trade.

use crate::SwapError;
use alloy::sol_types::SolCall;
use std::sync::Arc;
use swap_account::{contracts::IERC20, WalletService};
use swap_types::{
	Address, ConversionKind, ConversionPayload, ConversionTracker, Decimal, Token, Transaction,
	TransactionReceipt, U256,
};

/// Decides whether the trading contract may already move the source token
/// and, when it may not, collects the user's approval.
///
/// Nothing is cached: every attempt re-reads the allowance.
pub struct ApprovalGate {
	wallet: Arc<WalletService>,
	tracker: Arc<dyn ConversionTracker>,
	native_token: Address,
	spender: Address,
}

impl ApprovalGate {
	pub fn new(
		wallet: Arc<WalletService>,
		tracker: Arc<dyn ConversionTracker>,
		native_token: Address,
		spender: Address,
	) -> Self {
		Self {
			wallet,
			tracker,
			native_token,
			spender,
		}
	}

	pub fn spender(&self) -> Address {
		self.spender
	}

	/// True when the current allowance is below `amount`. The native
	/// currency never needs one.
	pub async fn requires_approval(
		&self,
		token: &Token,
		amount: Decimal,
		owner: Address,
	) -> Result<bool, SwapError> {
		if token.address == self.native_token {
			return Ok(false);
		}
		let needed = token.to_raw(amount)?;
		let allowance = self.wallet.allowance(token.address, owner, self.spender).await?;

		tracing::debug!(
			token = %token.symbol,
			%allowance,
			%needed,
			"Checked allowance"
		);
		Ok(allowance < needed)
	}

	/// Reports that the approval prompt was shown. Call once per prompt.
	pub fn prompted(&self, payload: &ConversionPayload) {
		self.tracker.track(ConversionKind::ApprovePop, payload);
	}

	/// Sends `approve(spender, amount)` and waits for it to be mined.
	pub async fn approve(
		&self,
		token: &Token,
		amount: Decimal,
		chain_id: u64,
	) -> Result<TransactionReceipt, SwapError> {
		let data = IERC20::approveCall {
			spender: self.spender,
			amount: token.to_raw(amount)?,
		}
		.abi_encode();

		let hash = self
			.wallet
			.send_transaction(Transaction {
				to: token.address,
				data: data.into(),
				value: U256::ZERO,
				chain_id,
			})
			.await?;

		let receipt = self.wallet.wait_for_confirmation(&hash).await?;
		if !receipt.success {
			return Err(SwapError::Reverted(hash.short()));
		}
		tracing::info!(token = %token.symbol, tx_hash = %hash.short(), "Approval confirmed");
		Ok(receipt)
	}
}
