//! Local-key wallet over an HTTP JSON-RPC endpoint.
//!
//! Without a `private_key` the wallet is read-only: balances and allowances
//! work, but the snapshot reports no account and sends fail with
//! [`WalletError::NotConnected`].

use crate::{contracts::IERC20, WalletError, WalletInterface};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::{local::PrivateKeySigner, Signer};
use alloy::transports::http::reqwest::Url;
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use swap_types::{
	http_url_validator, private_key_validator, Address, ConfigSchema, Field, FieldType, Schema,
	Signature, Transaction, TransactionHash, TransactionReceipt, ValidationError, WalletSnapshot,
	B256, U256,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(600);

pub struct LocalWallet {
	provider: DynProvider,
	signer: Option<PrivateKeySigner>,
	poll_interval: Duration,
	confirmation_timeout: Duration,
}

impl LocalWallet {
	pub fn new(rpc_url: &str, chain_id: u64, private_key: Option<&str>) -> Result<Self, WalletError> {
		let url: Url = rpc_url
			.parse()
			.map_err(|e| WalletError::Provider(format!("Invalid RPC URL: {}", e)))?;

		let signer = private_key
			.map(|key| {
				key.parse::<PrivateKeySigner>()
					.map(|signer| signer.with_chain_id(Some(chain_id)))
					.map_err(|e| WalletError::InvalidKey(format!("Invalid private key: {}", e)))
			})
			.transpose()?;

		let provider = match &signer {
			Some(signer) => ProviderBuilder::new()
				.wallet(EthereumWallet::from(signer.clone()))
				.connect_http(url)
				.erased(),
			None => ProviderBuilder::new().connect_http(url).erased(),
		};

		Ok(Self {
			provider,
			signer,
			poll_interval: DEFAULT_POLL_INTERVAL,
			confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
		})
	}

	pub fn with_timing(mut self, poll_interval: Duration, confirmation_timeout: Duration) -> Self {
		self.poll_interval = poll_interval;
		self.confirmation_timeout = confirmation_timeout;
		self
	}

	pub fn address(&self) -> Option<Address> {
		self.signer.as_ref().map(|signer| signer.address())
	}

	fn signer(&self) -> Result<&PrivateKeySigner, WalletError> {
		self.signer.as_ref().ok_or(WalletError::NotConnected)
	}
}

fn map_rpc_error(context: &str, e: TransportError) -> WalletError {
	match e.as_error_resp() {
		Some(payload) => {
			WalletError::from_rpc_code(payload.code, format!("{}: {}", context, payload.message))
		}
		None => WalletError::Provider(format!("{}: {}", context, e)),
	}
}

pub struct LocalWalletSchema;

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("rpc_url", FieldType::String).with_validator(http_url_validator),
				Field::new(
					"chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
			vec![
				Field::new("private_key", FieldType::String).with_validator(private_key_validator),
				Field::new(
					"poll_interval_secs",
					FieldType::Integer {
						min: Some(1),
						max: Some(60),
					},
				),
				Field::new(
					"confirmation_timeout_secs",
					FieldType::Integer {
						min: Some(1),
						max: Some(3600),
					},
				),
			],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn snapshot(&self) -> Result<WalletSnapshot, WalletError> {
		let chain_id = self
			.provider
			.get_chain_id()
			.await
			.map_err(|e| map_rpc_error("Failed to read chain id", e))?;
		Ok(WalletSnapshot {
			account: self.address(),
			chain_id,
		})
	}

	async fn request_connection(&self) -> Result<Address, WalletError> {
		self.address().ok_or(WalletError::NotConnected)
	}

	async fn native_balance(&self, owner: Address) -> Result<U256, WalletError> {
		self.provider
			.get_balance(owner)
			.await
			.map_err(|e| map_rpc_error("Failed to read balance", e))
	}

	async fn token_balance(&self, token: Address, owner: Address) -> Result<U256, WalletError> {
		IERC20::new(token, self.provider.clone())
			.balanceOf(owner)
			.call()
			.await
			.map_err(|e| WalletError::Provider(format!("Failed to read token balance: {}", e)))
	}

	async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, WalletError> {
		IERC20::new(token, self.provider.clone())
			.allowance(owner, spender)
			.call()
			.await
			.map_err(|e| WalletError::Provider(format!("Failed to read allowance: {}", e)))
	}

	async fn send_transaction(&self, tx: Transaction) -> Result<TransactionHash, WalletError> {
		let from = self.signer()?.address();
		let request: TransactionRequest = tx.into();
		let request = request.with_from(from);

		let pending = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| map_rpc_error("Failed to send transaction", e))?;

		Ok(TransactionHash(*pending.tx_hash()))
	}

	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, WalletError> {
		let start_time = tokio::time::Instant::now();
		tracing::debug!(tx_hash = %hash.short(), "Waiting for receipt");

		loop {
			if start_time.elapsed() > self.confirmation_timeout {
				return Err(WalletError::Timeout(format!(
					"no receipt for {} after {} seconds",
					hash.short(),
					self.confirmation_timeout.as_secs()
				)));
			}

			match self.provider.get_transaction_receipt(hash.0).await {
				Ok(Some(receipt)) => {
					return Ok(TransactionReceipt {
						hash: TransactionHash(receipt.transaction_hash),
						block_number: receipt.block_number.unwrap_or(0),
						success: receipt.status(),
					});
				}
				Ok(None) => tokio::time::sleep(self.poll_interval).await,
				Err(e) => return Err(map_rpc_error("Failed to get receipt", e)),
			}
		}
	}

	async fn sign_typed_data(&self, digest: B256) -> Result<Signature, WalletError> {
		self.signer()?
			.sign_hash(&digest)
			.await
			.map_err(|e| WalletError::SigningFailed(e.to_string()))
	}
}

/// Creates a local wallet from its `[wallet.config]` section.
///
/// Configuration parameters:
/// - `rpc_url`: HTTP JSON-RPC endpoint
/// - `chain_id`: network the key signs for
/// - `private_key`: optional; omit for a read-only wallet
pub fn create_local_wallet(config: &toml::Value) -> Result<Box<dyn WalletInterface>, WalletError> {
	LocalWalletSchema
		.validate(config)
		.map_err(|e| WalletError::Provider(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.unwrap_or_default();
	let chain_id = config
		.get("chain_id")
		.and_then(|v| v.as_integer())
		.unwrap_or(1) as u64;
	let private_key = config.get("private_key").and_then(|v| v.as_str());

	let poll_interval = config
		.get("poll_interval_secs")
		.and_then(|v| v.as_integer())
		.map(|secs| Duration::from_secs(secs as u64))
		.unwrap_or(DEFAULT_POLL_INTERVAL);
	let confirmation_timeout = config
		.get("confirmation_timeout_secs")
		.and_then(|v| v.as_integer())
		.map(|secs| Duration::from_secs(secs as u64))
		.unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT);

	let wallet = LocalWallet::new(rpc_url, chain_id, private_key)?
		.with_timing(poll_interval, confirmation_timeout);
	Ok(Box::new(wallet))
}
