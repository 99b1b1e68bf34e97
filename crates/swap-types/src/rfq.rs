//! RFQ limit orders and the order-matching service's wire payloads.
//!
//! Amounts, salts and expiries are `U256` end to end. They are written as
//! decimal strings and read back from either strings or bare JSON numbers
//! via [`crate::codec::u256_decimal`]; `chainId` and signature `v` are
//! small and stay plain numbers.

use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::codec::u256_decimal;

/// Signature scheme tag understood by the exchange proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SignatureType {
	Illegal = 0,
	Invalid = 1,
	Eip712 = 2,
	EthSign = 3,
}

impl From<SignatureType> for u8 {
	fn from(value: SignatureType) -> Self {
		value as u8
	}
}

impl TryFrom<u8> for SignatureType {
	type Error = String;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(SignatureType::Illegal),
			1 => Ok(SignatureType::Invalid),
			2 => Ok(SignatureType::Eip712),
			3 => Ok(SignatureType::EthSign),
			other => Err(format!("unknown signature type {}", other)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqSignature {
	pub signature_type: SignatureType,
	/// 27 or 28.
	pub v: u8,
	pub r: B256,
	pub s: B256,
}

/// An order before signing. Built from the service's `/info` details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedRfqOrder {
	pub maker: Address,
	pub taker: Address,
	pub maker_token: Address,
	pub taker_token: Address,
	pub maker_amount: U256,
	pub taker_amount: U256,
	pub tx_origin: Address,
	pub pool: B256,
	/// Unix seconds.
	pub expiry: U256,
	pub salt: U256,
	pub chain_id: u64,
	pub verifying_contract: Address,
}

impl UnsignedRfqOrder {
	pub fn into_signed(self, signature: RfqSignature) -> RfqOrder {
		RfqOrder {
			maker: self.maker,
			taker: self.taker,
			maker_token: self.maker_token,
			taker_token: self.taker_token,
			maker_amount: self.maker_amount,
			taker_amount: self.taker_amount,
			tx_origin: self.tx_origin,
			pool: self.pool,
			expiry: self.expiry,
			salt: self.salt,
			chain_id: self.chain_id,
			verifying_contract: self.verifying_contract,
			signature,
		}
	}
}

/// A signed RFQ order as posted to and read back from the order book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqOrder {
	pub maker: Address,
	pub taker: Address,
	pub maker_token: Address,
	pub taker_token: Address,
	#[serde(with = "u256_decimal")]
	pub maker_amount: U256,
	#[serde(with = "u256_decimal")]
	pub taker_amount: U256,
	pub tx_origin: Address,
	pub pool: B256,
	#[serde(with = "u256_decimal")]
	pub expiry: U256,
	#[serde(with = "u256_decimal")]
	pub salt: U256,
	pub chain_id: u64,
	pub verifying_contract: Address,
	pub signature: RfqSignature,
}

/// All-string rendering of an order, used when handing it to tooling that
/// cannot carry big integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringRfqOrder {
	pub maker_token: String,
	pub taker_token: String,
	pub maker_amount: String,
	pub taker_amount: String,
	pub maker: String,
	pub taker: String,
	pub tx_origin: String,
	pub pool: String,
	pub expiry: String,
	pub salt: String,
}

impl From<&RfqOrder> for StringRfqOrder {
	fn from(order: &RfqOrder) -> Self {
		Self {
			maker_token: order.maker_token.to_string(),
			taker_token: order.taker_token.to_string(),
			maker_amount: order.maker_amount.to_string(),
			taker_amount: order.taker_amount.to_string(),
			maker: order.maker.to_string(),
			taker: order.taker.to_string(),
			tx_origin: order.tx_origin.to_string(),
			pool: order.pool.to_string(),
			expiry: order.expiry.to_string(),
			salt: order.salt.to_string(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OrderStatus {
	Invalid = 0,
	Fillable = 1,
	Filled = 2,
	Cancelled = 3,
	Expired = 4,
}

impl From<OrderStatus> for u8 {
	fn from(value: OrderStatus) -> Self {
		value as u8
	}
}

impl TryFrom<u8> for OrderStatus {
	type Error = String;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(OrderStatus::Invalid),
			1 => Ok(OrderStatus::Fillable),
			2 => Ok(OrderStatus::Filled),
			3 => Ok(OrderStatus::Cancelled),
			4 => Ok(OrderStatus::Expired),
			other => Err(format!("unknown order status {}", other)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetaData {
	#[serde(rename = "orderHash")]
	pub order_hash: String,
	#[serde(rename = "makerBalance_makerToken", with = "u256_decimal")]
	pub maker_balance: U256,
	#[serde(rename = "makerAllowance_makerToken", with = "u256_decimal")]
	pub maker_allowance: U256,
	pub status: OrderStatus,
	#[serde(rename = "filledAmount_takerToken", with = "u256_decimal")]
	pub filled_amount: U256,
	#[serde(rename = "remainingFillableAmount_takerToken", with = "u256_decimal")]
	pub remaining_fillable_amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderElement {
	pub order: RfqOrder,
	pub meta_data: OrderMetaData,
}

/// `GET /orders?maker=` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
	pub orders: Vec<OrderElement>,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeeperToken {
	pub address: Address,
	pub chain_id: u64,
	pub decimals: u8,
	pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenListVersion {
	pub major: u32,
	pub minor: u32,
	pub patch: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoTokenList {
	#[serde(default)]
	pub keywords: Vec<String>,
	#[serde(rename = "logoURI", default)]
	pub logo_uri: String,
	pub name: String,
	#[serde(default)]
	pub timestamp: String,
	pub tokens: Vec<KeeperToken>,
	pub version: TokenListVersion,
}

/// `GET /tokenList` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenListResponse {
	pub result: DaoTokenList,
	pub message: String,
}

/// Fixed order fields the service expects every maker to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
	pub verifying_contract: Address,
	pub chain_id: u64,
	pub tx_origin: Address,
	pub taker: Address,
	pub pool: B256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResult {
	pub order_details: OrderDetails,
	#[serde(default)]
	pub token_list: Option<DaoTokenList>,
	#[serde(default)]
	pub recommended_min_trade_amounts: Option<serde_json::Value>,
}

/// `GET /info` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoResponse {
	pub result: InfoResult,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashList {
	pub hash_list: Vec<String>,
}

/// `POST /orders` body. Only a specific `message` means success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOrdersResponse {
	pub message: String,
	#[serde(default)]
	pub result: Option<HashList>,
}
