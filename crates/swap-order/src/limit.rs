//! Limit-order submission.

use crate::{eip712, OrderBookService, OrderError};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use std::time::Duration;
use swap_account::{contracts::IWETH, WalletService};
use swap_types::{
	Address, Id, Notification, NotificationSink, OrderDetails, RfqOrder, SendOrdersResponse, Token,
	Transaction, TxOutcome, UnsignedRfqOrder, UpdatedInfo, U256,
};

pub struct RfqOrderService {
	book: Arc<OrderBookService>,
	wallet: Arc<WalletService>,
	notifications: Arc<dyn NotificationSink>,
	native_token: Address,
	wrapped_native: Token,
}

impl RfqOrderService {
	pub fn new(
		book: Arc<OrderBookService>,
		wallet: Arc<WalletService>,
		notifications: Arc<dyn NotificationSink>,
		native_token: Address,
		wrapped_native: Token,
	) -> Self {
		Self {
			book,
			wallet,
			notifications,
			native_token,
			wrapped_native,
		}
	}

	/// Offers `from_amount` of `from` for `to_amount` of `to` until
	/// `duration` from now. Amounts are raw token units.
	///
	/// A native source is wrapped first and the wrapper becomes the maker
	/// token, since orders can only move ERC-20s.
	pub async fn submit_limit_order(
		&self,
		from: &Token,
		to: &Token,
		from_amount: U256,
		to_amount: U256,
		user: Address,
		duration: Duration,
	) -> Result<SendOrdersResponse, OrderError> {
		let maker_token = if from.address == self.native_token {
			self.wrap(from, from_amount).await?;
			self.wrapped_native.address
		} else {
			from.address
		};

		let details = self.book.info().await?.result.order_details;
		let order = build_order(
			&details,
			user,
			maker_token,
			to.address,
			from_amount,
			to_amount,
			expiry_after(duration),
		);

		let digest = eip712::signing_hash(&order)?;
		let signature = self.wallet.sign_typed_data(digest).await?;
		let signed = order.into_signed(eip712::rfq_signature(&signature));

		tracing::info!(
			maker = %user,
			maker_token = %signed.maker_token,
			taker_token = %signed.taker_token,
			expiry = %signed.expiry,
			"Submitting limit order"
		);

		self.book.send_orders(&[signed]).await
	}

	async fn wrap(&self, native: &Token, amount: U256) -> Result<(), OrderError> {
		let human = native
			.from_raw(amount)
			.map(|a| a.to_string())
			.unwrap_or_else(|_| amount.to_string());
		let (native_symbol, wrapped_symbol) = (&native.symbol, &self.wrapped_native.symbol);

		let tx = Transaction {
			to: self.wrapped_native.address,
			data: IWETH::depositCall {}.abi_encode().into(),
			value: amount,
			chain_id: self.wrapped_native.chain_id,
		};
		let hash = self.wallet.send_transaction(tx).await?;

		let pending = Notification::pending(
			"Pending Confirmation",
			format!(
				"Wrapping {} {} into {} is Pending Confirmation",
				human, native_symbol, wrapped_symbol
			),
		)
		.with_updated_info(UpdatedInfo {
			success_title: "Success!".to_string(),
			success_msg: format!(
				"Your {} {} have been wrapped into {}",
				human, native_symbol, wrapped_symbol
			),
			error_title: "Transaction Failed".to_string(),
			error_msg: format!(
				"Wrapping {} {} into {} had failed. Please try again or contact support",
				human, native_symbol, wrapped_symbol
			),
		})
		.with_tx_hash(hash.clone());
		let id = pending.id;
		self.notifications.dispatch(pending);

		match self.wallet.wait_for_confirmation(&hash).await {
			Ok(receipt) if receipt.success => {
				self.notifications.resolve(id, TxOutcome::Confirmed);
				Ok(())
			}
			Ok(_) => {
				tracing::warn!(tx_hash = %hash.short(), "Wrap reverted");
				self.notifications.resolve(id, TxOutcome::Failed);
				Err(OrderError::DepositFailed(native_symbol.clone()))
			}
			Err(e) => {
				self.notifications.resolve(id, TxOutcome::Failed);
				Err(e.into())
			}
		}
	}
}

fn expiry_after(duration: Duration) -> U256 {
	let now = chrono::Utc::now().timestamp().max(0) as u64;
	U256::from(now.saturating_add(duration.as_secs()))
}

fn build_order(
	details: &OrderDetails,
	maker: Address,
	maker_token: Address,
	taker_token: Address,
	maker_amount: U256,
	taker_amount: U256,
	expiry: U256,
) -> UnsignedRfqOrder {
	UnsignedRfqOrder {
		maker,
		taker: details.taker,
		maker_token,
		taker_token,
		maker_amount,
		taker_amount,
		tx_origin: details.tx_origin,
		pool: details.pool,
		expiry,
		salt: U256::from(Id::<RfqOrder>::new().as_u128()),
		chain_id: details.chain_id,
		verifying_contract: details.verifying_contract,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::OrderBookInterface;
	use alloy::signers::{local::PrivateKeySigner, SignerSync};
	use async_trait::async_trait;
	use std::sync::Mutex;
	use swap_account::{WalletError, WalletInterface};
	use swap_types::{
		ConfigSchema, HashList, InfoResponse, InfoResult, NotificationId, OrderResponse, Schema,
		Signature, TokenListResponse, TransactionHash, TransactionReceipt, ValidationError,
		WalletSnapshot, B256,
	};

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	struct NoSchema;

	impl ConfigSchema for NoSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	fn details() -> OrderDetails {
		OrderDetails {
			verifying_contract: Address::repeat_byte(0xdf),
			chain_id: 1,
			tx_origin: Address::repeat_byte(0x70),
			taker: Address::ZERO,
			pool: B256::repeat_byte(0x01),
		}
	}

	#[derive(Default)]
	struct FakeBook {
		sent: Mutex<Vec<RfqOrder>>,
	}

	struct SharedBook(Arc<FakeBook>);

	#[async_trait]
	impl OrderBookInterface for SharedBook {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoSchema)
		}

		async fn token_list(&self) -> Result<TokenListResponse, OrderError> {
			Err(OrderError::Http("unused".into()))
		}

		async fn orders(&self, _maker: Address) -> Result<OrderResponse, OrderError> {
			Err(OrderError::Http("unused".into()))
		}

		async fn info(&self) -> Result<InfoResponse, OrderError> {
			Ok(InfoResponse {
				result: InfoResult {
					order_details: details(),
					token_list: None,
					recommended_min_trade_amounts: None,
				},
				message: "ok".into(),
			})
		}

		async fn send_orders(&self, orders: &[RfqOrder]) -> Result<SendOrdersResponse, OrderError> {
			self.0.sent.lock().unwrap().extend_from_slice(orders);
			Ok(SendOrdersResponse {
				message: "Order creation succeeded".into(),
				result: Some(HashList {
					hash_list: vec!["0x1".into()],
				}),
			})
		}
	}

	struct FakeWallet {
		signer: PrivateKeySigner,
		reject_signing: bool,
		receipt_success: bool,
		sent: Mutex<Vec<Transaction>>,
	}

	struct SharedWallet(Arc<FakeWallet>);

	#[async_trait]
	impl WalletInterface for SharedWallet {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoSchema)
		}

		async fn snapshot(&self) -> Result<WalletSnapshot, WalletError> {
			Ok(WalletSnapshot {
				account: Some(self.0.signer.address()),
				chain_id: 1,
			})
		}

		async fn request_connection(&self) -> Result<Address, WalletError> {
			Ok(self.0.signer.address())
		}

		async fn native_balance(&self, _owner: Address) -> Result<U256, WalletError> {
			Ok(U256::ZERO)
		}

		async fn token_balance(&self, _token: Address, _owner: Address) -> Result<U256, WalletError> {
			Ok(U256::ZERO)
		}

		async fn allowance(
			&self,
			_token: Address,
			_owner: Address,
			_spender: Address,
		) -> Result<U256, WalletError> {
			Ok(U256::ZERO)
		}

		async fn send_transaction(&self, tx: Transaction) -> Result<TransactionHash, WalletError> {
			self.0.sent.lock().unwrap().push(tx);
			Ok(TransactionHash(B256::repeat_byte(0xaa)))
		}

		async fn wait_for_confirmation(
			&self,
			hash: &TransactionHash,
		) -> Result<TransactionReceipt, WalletError> {
			Ok(TransactionReceipt {
				hash: hash.clone(),
				block_number: 1,
				success: self.0.receipt_success,
			})
		}

		async fn sign_typed_data(&self, digest: B256) -> Result<Signature, WalletError> {
			if self.0.reject_signing {
				return Err(WalletError::UserRejected);
			}
			self.0
				.signer
				.sign_hash_sync(&digest)
				.map_err(|e| WalletError::SigningFailed(e.to_string()))
		}
	}

	#[derive(Default)]
	struct RecordingSink {
		dispatched: Mutex<Vec<Notification>>,
		resolved: Mutex<Vec<(NotificationId, TxOutcome)>>,
	}

	impl NotificationSink for RecordingSink {
		fn dispatch(&self, notification: Notification) {
			self.dispatched.lock().unwrap().push(notification);
		}

		fn resolve(&self, id: NotificationId, outcome: TxOutcome) {
			self.resolved.lock().unwrap().push((id, outcome));
		}
	}

	struct Harness {
		book: Arc<FakeBook>,
		wallet: Arc<FakeWallet>,
		sink: Arc<RecordingSink>,
		service: RfqOrderService,
	}

	fn eth() -> Token {
		Token::new(1, Address::repeat_byte(0xee), "ETH", 18)
	}

	fn weth() -> Token {
		Token::new(1, Address::repeat_byte(0xc0), "WETH", 18)
	}

	fn dai() -> Token {
		Token::new(1, Address::repeat_byte(0xda), "DAI", 18)
	}

	fn harness(reject_signing: bool, receipt_success: bool) -> Harness {
		let book = Arc::new(FakeBook::default());
		let wallet = Arc::new(FakeWallet {
			signer: KEY.parse().unwrap(),
			reject_signing,
			receipt_success,
			sent: Mutex::new(Vec::new()),
		});
		let sink = Arc::new(RecordingSink::default());
		let service = RfqOrderService::new(
			Arc::new(OrderBookService::new(Box::new(SharedBook(book.clone())))),
			Arc::new(WalletService::new(Box::new(SharedWallet(wallet.clone())))),
			sink.clone(),
			eth().address,
			weth(),
		);
		Harness {
			book,
			wallet,
			sink,
			service,
		}
	}

	fn unsigned(order: &RfqOrder) -> UnsignedRfqOrder {
		UnsignedRfqOrder {
			maker: order.maker,
			taker: order.taker,
			maker_token: order.maker_token,
			taker_token: order.taker_token,
			maker_amount: order.maker_amount,
			taker_amount: order.taker_amount,
			tx_origin: order.tx_origin,
			pool: order.pool,
			expiry: order.expiry,
			salt: order.salt,
			chain_id: order.chain_id,
			verifying_contract: order.verifying_contract,
		}
	}

	#[tokio::test]
	async fn test_token_order_is_signed_and_sent() {
		let h = harness(false, true);
		let user = h.wallet.signer.address();
		let before = chrono::Utc::now().timestamp() as u64;

		h.service
			.submit_limit_order(
				&dai(),
				&weth(),
				U256::from(1000u64),
				U256::from(3u64),
				user,
				Duration::from_secs(3600),
			)
			.await
			.unwrap();

		assert!(h.wallet.sent.lock().unwrap().is_empty());
		let sent = h.book.sent.lock().unwrap();
		let order = &sent[0];
		assert_eq!(order.maker, user);
		assert_eq!(order.maker_token, dai().address);
		assert_eq!(order.taker_token, weth().address);
		assert_eq!(order.tx_origin, details().tx_origin);
		assert_eq!(order.pool, details().pool);
		assert_eq!(order.verifying_contract, details().verifying_contract);

		let expiry: u64 = order.expiry.to::<u64>();
		assert!(expiry >= before + 3600 && expiry <= before + 3700);

		let digest = eip712::signing_hash(&unsigned(order)).unwrap();
		let signature = Signature::new(
			U256::from_be_bytes(order.signature.r.0),
			U256::from_be_bytes(order.signature.s.0),
			order.signature.v == 28,
		);
		assert_eq!(signature.recover_address_from_prehash(&digest).unwrap(), user);
	}

	#[tokio::test]
	async fn test_native_source_is_wrapped_first() {
		let h = harness(false, true);
		let user = h.wallet.signer.address();
		let amount = U256::from(10u64).pow(U256::from(18u64));

		h.service
			.submit_limit_order(&eth(), &dai(), amount, U256::from(3000u64), user, Duration::from_secs(60))
			.await
			.unwrap();

		let txs = h.wallet.sent.lock().unwrap();
		assert_eq!(txs.len(), 1);
		assert_eq!(txs[0].to, weth().address);
		assert_eq!(txs[0].value, amount);

		let dispatched = h.sink.dispatched.lock().unwrap();
		assert_eq!(dispatched[0].msg, "Wrapping 1 ETH into WETH is Pending Confirmation");
		assert_eq!(
			*h.sink.resolved.lock().unwrap(),
			vec![(dispatched[0].id, TxOutcome::Confirmed)]
		);

		assert_eq!(h.book.sent.lock().unwrap()[0].maker_token, weth().address);
	}

	#[tokio::test]
	async fn test_reverted_wrap_aborts() {
		let h = harness(false, false);
		let user = h.wallet.signer.address();

		let result = h
			.service
			.submit_limit_order(&eth(), &dai(), U256::from(1u64), U256::from(1u64), user, Duration::from_secs(60))
			.await;

		assert!(matches!(result, Err(OrderError::DepositFailed(symbol)) if symbol == "ETH"));
		assert_eq!(h.sink.resolved.lock().unwrap()[0].1, TxOutcome::Failed);
		assert!(h.book.sent.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_rejected_signature_sends_nothing() {
		let h = harness(true, true);
		let user = h.wallet.signer.address();

		let err = h
			.service
			.submit_limit_order(&dai(), &weth(), U256::from(1u64), U256::from(1u64), user, Duration::from_secs(60))
			.await
			.unwrap_err();

		assert!(err.is_user_rejected());
		assert!(h.book.sent.lock().unwrap().is_empty());
	}
}
