//! Wallet capability for the swap core.
//!
//! Everything that needs the user's wallet goes through [`WalletInterface`]:
//! reading the connected account and network, balances and allowances,
//! sending transactions the user must approve, waiting for them to be mined,
//! and signing typed data. Tests substitute a deterministic fake.

use async_trait::async_trait;
use swap_types::{
	Address, ConfigSchema, Signature, Transaction, TransactionHash, TransactionReceipt,
	WalletSnapshot, B256, U256,
};
use thiserror::Error;

pub mod contracts;

pub mod implementations {
	pub mod local;
}

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum WalletError {
	#[error("Wallet not connected")]
	NotConnected,
	#[error("User denied transaction signature")]
	UserRejected,
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Provider error: {0}")]
	Provider(String),
	#[error("Timed out: {0}")]
	Timeout(String),
}

impl WalletError {
	pub fn is_user_rejected(&self) -> bool {
		matches!(self, WalletError::UserRejected)
	}

	/// Classifies a JSON-RPC error by its code.
	pub fn from_rpc_code(code: i64, message: impl Into<String>) -> Self {
		if code == USER_REJECTED_CODE {
			WalletError::UserRejected
		} else {
			WalletError::Provider(message.into())
		}
	}
}

#[async_trait]
pub trait WalletInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Current account (if connected) and network.
	async fn snapshot(&self) -> Result<WalletSnapshot, WalletError>;

	/// Prompts the user to connect; returns the connected account.
	async fn request_connection(&self) -> Result<Address, WalletError>;

	async fn native_balance(&self, owner: Address) -> Result<U256, WalletError>;

	async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, WalletError>;

	async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, WalletError>;

	/// Sends a transaction after the user confirms it. A refusal surfaces
	/// as [`WalletError::UserRejected`].
	async fn send_transaction(&self, tx: Transaction) -> Result<TransactionHash, WalletError>;

	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, WalletError>;

	/// Signs an EIP-712 digest.
	async fn sign_typed_data(&self, digest: B256) -> Result<Signature, WalletError>;
}

pub struct WalletService {
	wallet: Box<dyn WalletInterface>,
}

impl WalletService {
	pub fn new(wallet: Box<dyn WalletInterface>) -> Self {
		Self { wallet }
	}

	pub async fn snapshot(&self) -> Result<WalletSnapshot, WalletError> {
		self.wallet.snapshot().await
	}

	/// The connected account, or [`WalletError::NotConnected`].
	pub async fn account(&self) -> Result<Address, WalletError> {
		self.wallet
			.snapshot()
			.await?
			.account
			.ok_or(WalletError::NotConnected)
	}

	pub async fn request_connection(&self) -> Result<Address, WalletError> {
		self.wallet.request_connection().await
	}

	/// Raw balance; `native` selects the chain's currency over an ERC-20.
	pub async fn balance(
		&self,
		token: Address,
		owner: Address,
		native: bool,
	) -> Result<U256, WalletError> {
		if native {
			self.wallet.native_balance(owner).await
		} else {
			self.wallet.token_balance(token, owner).await
		}
	}

	pub async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, WalletError> {
		self.wallet.allowance(token, owner, spender).await
	}

	pub async fn send_transaction(&self, tx: Transaction) -> Result<TransactionHash, WalletError> {
		let hash = self.wallet.send_transaction(tx).await?;
		tracing::info!(tx_hash = %hash.short(), "Transaction sent");
		Ok(hash)
	}

	pub async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, WalletError> {
		self.wallet.wait_for_confirmation(hash).await
	}

	pub async fn sign_typed_data(&self, digest: B256) -> Result<Signature, WalletError> {
		self.wallet.sign_typed_data(digest).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rpc_code_classification() {
		assert!(WalletError::from_rpc_code(4001, "denied").is_user_rejected());
		assert!(matches!(
			WalletError::from_rpc_code(-32000, "nonce too low"),
			WalletError::Provider(msg) if msg == "nonce too low"
		));
	}
}
