//! Wallet-facing transaction types.
//!
//! These describe what the core asks a wallet to send and what comes back,
//! independent of how the wallet signs or broadcasts.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::truncate_hash;

/// A transaction the core wants the user to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	pub to: Address,
	pub data: Bytes,
	/// Native currency attached to the call.
	pub value: U256,
	pub chain_id: u64,
}

impl From<Transaction> for TransactionRequest {
	fn from(tx: Transaction) -> Self {
		TransactionRequest::default()
			.with_to(tx.to)
			.with_input(tx.data)
			.with_value(tx.value)
			.with_chain_id(tx.chain_id)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub B256);

impl TransactionHash {
	/// Shortened form for log lines.
	pub fn short(&self) -> String {
		truncate_hash(&self.to_string())
	}
}

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	pub hash: TransactionHash,
	pub block_number: u64,
	/// Whether execution succeeded (status 1).
	pub success: bool,
}

/// The wallet's current account and network, captured together so later
/// results can be checked against the context that requested them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
	pub account: Option<Address>,
	pub chain_id: u64,
}

impl WalletSnapshot {
	pub fn is_connected(&self) -> bool {
		self.account.is_some()
	}
}
