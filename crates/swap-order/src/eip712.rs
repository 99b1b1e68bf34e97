//! EIP-712 hashing for 0x v4 RFQ orders.

use crate::OrderError;
use alloy::sol;
use alloy::sol_types::{eip712_domain, SolStruct};
use swap_types::{RfqSignature, Signature, SignatureType, UnsignedRfqOrder, B256, U256};

sol! {
	/// Typed-data layout verified by the exchange proxy.
	struct RfqOrder {
		address makerToken;
		address takerToken;
		uint128 makerAmount;
		uint128 takerAmount;
		address maker;
		address taker;
		address txOrigin;
		bytes32 pool;
		uint64 expiry;
		uint256 salt;
	}
}

pub const DOMAIN_NAME: &str = "ZeroEx";
pub const DOMAIN_VERSION: &str = "1.0.0";

fn narrow_u128(value: U256, field: &str) -> Result<u128, OrderError> {
	u128::try_from(value)
		.map_err(|_| OrderError::InvalidOrder(format!("{} does not fit in uint128: {}", field, value)))
}

/// Digest the maker signs for `order`.
pub fn signing_hash(order: &UnsignedRfqOrder) -> Result<B256, OrderError> {
	let expiry = u64::try_from(order.expiry)
		.map_err(|_| OrderError::InvalidOrder(format!("expiry out of range: {}", order.expiry)))?;

	let typed = RfqOrder {
		makerToken: order.maker_token,
		takerToken: order.taker_token,
		makerAmount: narrow_u128(order.maker_amount, "makerAmount")?,
		takerAmount: narrow_u128(order.taker_amount, "takerAmount")?,
		maker: order.maker,
		taker: order.taker,
		txOrigin: order.tx_origin,
		pool: order.pool,
		expiry,
		salt: order.salt,
	};

	let domain = eip712_domain! {
		name: DOMAIN_NAME,
		version: DOMAIN_VERSION,
		chain_id: order.chain_id,
		verifying_contract: order.verifying_contract,
	};

	Ok(typed.eip712_signing_hash(&domain))
}

/// Splits a wallet signature into the `{v, r, s}` form the service expects.
pub fn rfq_signature(signature: &Signature) -> RfqSignature {
	RfqSignature {
		signature_type: SignatureType::Eip712,
		v: 27 + signature.v() as u8,
		r: B256::from(signature.r().to_be_bytes::<32>()),
		s: B256::from(signature.s().to_be_bytes::<32>()),
	}
}
