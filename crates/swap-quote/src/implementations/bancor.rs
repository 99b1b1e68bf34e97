//! Bancor network market.
//!
//! Rates come from `conversionPath` + `rateByPath`; trades go through
//! `convertByPath`. Price impact compares the effective rate for the full
//! amount against the rate for a tiny reference amount along the same path.

use crate::{MarketError, MarketInterface};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use alloy::sol_types::SolCall;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use swap_types::{
	address_validator, http_url_validator, round_percent, Address, AmountError, ConfigSchema,
	Decimal, Field, FieldType, MarketRate, Schema, SwapRequest, Token, Transaction,
	ValidationError, U256,
};

sol! {
	#[sol(rpc)]
	interface IBancorNetwork {
		function conversionPath(address sourceToken, address targetToken) external view returns (address[] memory);
		function rateByPath(address[] path, uint256 amount) external view returns (uint256);
		function convertByPath(
			address[] path,
			uint256 amount,
			uint256 minReturn,
			address beneficiary,
			address affiliateAccount,
			uint256 affiliateFee
		) external payable returns (uint256);
	}
}

/// Reference amount used for the spot rate: one thousandth of a token.
const REFERENCE_DECIMALS_OFFSET: u8 = 3;

pub struct BancorMarket {
	provider: DynProvider,
	network: Address,
	native_token: Address,
	chain_id: u64,
}

impl BancorMarket {
	pub fn new(
		rpc_url: &str,
		network: Address,
		native_token: Address,
		chain_id: u64,
	) -> Result<Self, MarketError> {
		let url: Url = rpc_url
			.parse()
			.map_err(|e| MarketError::InvalidConfig(format!("Invalid RPC URL: {}", e)))?;
		let provider = ProviderBuilder::new().connect_http(url).erased();

		Ok(Self {
			provider,
			network,
			native_token,
			chain_id,
		})
	}

	fn contract(&self) -> IBancorNetwork::IBancorNetworkInstance<DynProvider> {
		IBancorNetwork::new(self.network, self.provider.clone())
	}

	async fn path(&self, from: &Token, to: &Token) -> Result<Vec<Address>, MarketError> {
		self.contract()
			.conversionPath(from.address, to.address)
			.call()
			.await
			.map_err(|e| MarketError::Network(format!("conversionPath failed: {}", e)))
	}

	async fn rate_by_path(&self, path: &[Address], amount: U256) -> Result<U256, MarketError> {
		self.contract()
			.rateByPath(path.to_vec(), amount)
			.call()
			.await
			.map_err(|e| MarketError::Network(format!("rateByPath failed: {}", e)))
	}
}

/// Price impact in percent, two decimals, never negative.
///
/// `spot` is the per-unit rate for a negligible amount; `effective` the
/// per-unit rate actually obtained.
pub fn price_impact(spot: Decimal, effective: Decimal) -> Decimal {
	if spot.is_zero() {
		return Decimal::new(0, 2);
	}
	let impact = effective
		.checked_div(spot)
		.and_then(|ratio| (Decimal::ONE - ratio).checked_mul(Decimal::ONE_HUNDRED))
		.unwrap_or(Decimal::ZERO);
	round_percent(impact.max(Decimal::ZERO))
}

pub struct BancorMarketSchema;

impl ConfigSchema for BancorMarketSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("rpc_url", FieldType::String).with_validator(http_url_validator),
				Field::new("network_address", FieldType::String).with_validator(address_validator),
				Field::new(
					"chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
			vec![Field::new("native_token", FieldType::String).with_validator(address_validator)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl MarketInterface for BancorMarket {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(BancorMarketSchema)
	}

	async fn expected_return(
		&self,
		from: &Token,
		to: &Token,
		amount: Decimal,
	) -> Result<MarketRate, MarketError> {
		let raw_amount = from.to_raw(amount)?;
		let path = self.path(from, to).await?;
		if path.is_empty() || raw_amount.is_zero() {
			return Ok(MarketRate {
				output_amount: Decimal::ZERO,
				price_impact: Decimal::new(0, 2),
			});
		}

		let raw_output = self.rate_by_path(&path, raw_amount).await?;
		let output_amount = to.from_raw(raw_output)?;

		let reference_raw = U256::from(10u64)
			.pow(U256::from(from.decimals.saturating_sub(REFERENCE_DECIMALS_OFFSET)))
			.min(raw_amount);
		let reference_output = to.from_raw(self.rate_by_path(&path, reference_raw).await?)?;
		let reference_amount = from.from_raw(reference_raw)?;

		let per_unit = |output: Decimal, input: Decimal| {
			output
				.checked_div(input)
				.ok_or_else(|| AmountError::Overflow(format!("{} / {}", output, input)))
		};
		let spot = per_unit(reference_output, reference_amount)?;
		let effective = per_unit(output_amount, amount)?;

		tracing::debug!(
			from = %from.symbol,
			to = %to.symbol,
			%amount,
			%output_amount,
			hops = path.len(),
			"Bancor rate"
		);

		Ok(MarketRate {
			output_amount,
			price_impact: price_impact(spot, effective),
		})
	}

	async fn build_swap(&self, request: &SwapRequest) -> Result<Transaction, MarketError> {
		let path = self.path(&request.from_token, &request.to_token).await?;
		if path.is_empty() {
			return Err(MarketError::Network(format!(
				"no conversion path from {} to {}",
				request.from_token.symbol, request.to_token.symbol
			)));
		}

		let amount = request.from_token.to_raw(request.from_amount)?;
		let min_return = request.to_token.to_raw(request.min_return())?;

		let data = IBancorNetwork::convertByPathCall {
			path,
			amount,
			minReturn: min_return,
			beneficiary: request.user,
			affiliateAccount: Address::ZERO,
			affiliateFee: U256::ZERO,
		}
		.abi_encode();

		let value = if request.from_token.address == self.native_token {
			amount
		} else {
			U256::ZERO
		};

		Ok(Transaction {
			to: self.network,
			data: data.into(),
			value,
			chain_id: self.chain_id,
		})
	}

	fn spender(&self) -> Address {
		self.network
	}
}

/// Creates a Bancor market from its `[market.config]` section.
///
/// Configuration parameters:
/// - `rpc_url`: HTTP JSON-RPC endpoint
/// - `network_address`: BancorNetwork contract
/// - `chain_id`: network id written into built transactions
/// - `native_token`: optional native placeholder (default `0xEeee…EEeE`)
pub fn create_bancor_market(
	config: &toml::Value,
) -> Result<Box<dyn MarketInterface>, MarketError> {
	BancorMarketSchema
		.validate(config)
		.map_err(|e| MarketError::InvalidConfig(e.to_string()))?;

	let parse_address = |key: &str| -> Result<Option<Address>, MarketError> {
		config
			.get(key)
			.and_then(|v| v.as_str())
			.map(|s| {
				s.parse::<Address>()
					.map_err(|e| MarketError::InvalidConfig(format!("{}: {}", key, e)))
			})
			.transpose()
	};

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.unwrap_or_default();
	let network = parse_address("network_address")?
		.ok_or_else(|| MarketError::InvalidConfig("network_address is required".to_string()))?;
	let native_token = parse_address("native_token")?.unwrap_or(Address::repeat_byte(0xee));
	let chain_id = config
		.get("chain_id")
		.and_then(|v| v.as_integer())
		.unwrap_or(1) as u64;

	Ok(Box::new(BancorMarket::new(
		rpc_url,
		network,
		native_token,
		chain_id,
	)?))
}
