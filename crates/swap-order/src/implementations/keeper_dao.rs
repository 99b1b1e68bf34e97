//! KeeperDAO hiding-book order-matching API.
//!
//! Bodies are read as text and decoded with `serde_json`, so integers wider
//! than 64 bits keep every digit.

use crate::{OrderBookInterface, OrderError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use swap_types::{
	http_url_validator, Address, ConfigSchema, Field, FieldType, InfoResponse, OrderResponse,
	RfqOrder, Schema, SendOrdersResponse, TokenListResponse, ValidationError,
};

pub const DEFAULT_BASE_URL: &str = "https://hidingbook.keeperdao.com/api/v1";

/// The only `message` that marks a successful `POST /orders`.
pub const ORDER_CREATION_SUCCEEDED: &str = "Order creation succeeded";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct KeeperDaoOrderBook {
	client: reqwest::Client,
	base_url: String,
	timeout: Duration,
}

impl KeeperDaoOrderBook {
	pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.into().trim_end_matches('/').to_string(),
			timeout,
		}
	}

	async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, OrderError> {
		let url = format!("{}{}", self.base_url, path);
		tracing::debug!(%url, "Order book request");

		let response = self
			.client
			.get(&url)
			.timeout(self.timeout)
			.send()
			.await
			.map_err(|e| OrderError::Http(e.to_string()))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| OrderError::Http(e.to_string()))?;
		if !status.is_success() {
			return Err(OrderError::Http(format!("{} returned {}", path, status)));
		}

		decode(&body)
	}

	async fn post_orders(&self, orders: &[RfqOrder]) -> Result<SendOrdersResponse, OrderError> {
		let payload =
			serde_json::to_string(orders).map_err(|e| OrderError::InvalidOrder(e.to_string()))?;

		let response = self
			.client
			.post(format!("{}/orders", self.base_url))
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.body(payload)
			.timeout(self.timeout)
			.send()
			.await
			.map_err(|e| OrderError::Http(e.to_string()))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| OrderError::Http(e.to_string()))?;
		if !status.is_success() {
			return Err(match decode::<SendOrdersResponse>(&body) {
				Ok(rejected) => OrderError::UnexpectedResponse(rejected.message),
				Err(_) => OrderError::Http(format!("/orders returned {}", status)),
			});
		}

		check_send_response(&body)
	}
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, OrderError> {
	serde_json::from_str(body).map_err(|e| OrderError::Decode(e.to_string()))
}

/// Accepts a `POST /orders` body only if it reports order creation.
pub fn check_send_response(body: &str) -> Result<SendOrdersResponse, OrderError> {
	let response: SendOrdersResponse = decode(body)?;
	if response.message == ORDER_CREATION_SUCCEEDED {
		Ok(response)
	} else {
		Err(OrderError::UnexpectedResponse(response.message))
	}
}

pub struct KeeperDaoSchema;

impl ConfigSchema for KeeperDaoSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("base_url", FieldType::String).with_validator(http_url_validator),
				Field::new(
					"timeout_secs",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl OrderBookInterface for KeeperDaoOrderBook {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(KeeperDaoSchema)
	}

	async fn token_list(&self) -> Result<TokenListResponse, OrderError> {
		self.get("/tokenList").await
	}

	async fn orders(&self, maker: Address) -> Result<OrderResponse, OrderError> {
		self.get(&format!("/orders?maker={}", maker)).await
	}

	async fn info(&self) -> Result<InfoResponse, OrderError> {
		self.get("/info").await
	}

	async fn send_orders(&self, orders: &[RfqOrder]) -> Result<SendOrdersResponse, OrderError> {
		self.post_orders(orders)
			.await
			.map_err(|e| OrderError::Submission(e.to_string()))
	}
}

/// Creates the KeeperDAO client from its `[order_book.config]` section.
///
/// Configuration parameters:
/// - `base_url`: API root (default the public hiding-book endpoint)
/// - `timeout_secs`: per-request timeout
pub fn create_keeper_dao_order_book(
	config: &toml::Value,
) -> Result<Box<dyn OrderBookInterface>, OrderError> {
	KeeperDaoSchema
		.validate(config)
		.map_err(|e| OrderError::InvalidConfig(e.to_string()))?;

	let base_url = config
		.get("base_url")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_BASE_URL);
	let timeout = config
		.get("timeout_secs")
		.and_then(|v| v.as_integer())
		.map(|secs| Duration::from_secs(secs as u64))
		.unwrap_or(DEFAULT_TIMEOUT);

	Ok(Box::new(KeeperDaoOrderBook::new(base_url, timeout)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use swap_types::{OrderStatus, RfqSignature, SignatureType, UnsignedRfqOrder, B256, U256};
	use wiremock::matchers::{method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const BIG: &str = "123456789012345678901234567890";

	fn order() -> RfqOrder {
		UnsignedRfqOrder {
			maker: Address::repeat_byte(1),
			taker: Address::ZERO,
			maker_token: Address::repeat_byte(2),
			taker_token: Address::repeat_byte(3),
			maker_amount: BIG.parse().unwrap(),
			taker_amount: U256::from(5u64),
			tx_origin: Address::repeat_byte(4),
			pool: B256::ZERO,
			expiry: U256::from(1_700_000_000u64),
			salt: U256::from(42u64),
			chain_id: 1,
			verifying_contract: Address::repeat_byte(5),
		}
		.into_signed(RfqSignature {
			signature_type: SignatureType::Eip712,
			v: 27,
			r: B256::repeat_byte(6),
			s: B256::repeat_byte(7),
		})
	}

	async fn answer(server: &MockServer, verb: &str, route: &str, body: String) {
		Mock::given(method(verb))
			.and(path(route))
			.respond_with(
				ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "application/json"),
			)
			.expect(1)
			.mount(server)
			.await;
	}

	async fn received_body(server: &MockServer) -> String {
		let requests = server.received_requests().await.unwrap();
		String::from_utf8(requests[0].body.clone()).unwrap()
	}

	#[tokio::test]
	async fn test_send_orders_success() {
		let server = MockServer::start().await;
		let body = r#"{"message":"Order creation succeeded","result":{"hashList":["0xabc"]}}"#;
		answer(&server, "POST", "/orders", body.to_string()).await;
		let book = KeeperDaoOrderBook::new(server.uri(), Duration::from_secs(5));

		let response = book.send_orders(&[order()]).await.unwrap();
		assert_eq!(response.result.unwrap().hash_list, vec!["0xabc".to_string()]);

		let sent = received_body(&server).await;
		assert!(sent.contains(&format!("\"makerAmount\":\"{}\"", BIG)));
	}

	#[tokio::test]
	async fn test_other_message_is_error_even_on_200() {
		let server = MockServer::start().await;
		let body = r#"{"message":"Order creation failed"}"#;
		answer(&server, "POST", "/orders", body.to_string()).await;
		let book = KeeperDaoOrderBook::new(server.uri(), Duration::from_secs(5));

		let err = book.send_orders(&[order()]).await.unwrap_err();
		assert_eq!(
			err.to_string(),
			"Unexpected error during send order request Unexpected response from server, Order creation failed"
		);
	}

	#[tokio::test]
	async fn test_rejection_message_on_error_status() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/orders"))
			.respond_with(
				ResponseTemplate::new(400)
					.set_body_raw(r#"{"message":"Invalid signature"}"#, "application/json"),
			)
			.mount(&server)
			.await;
		let book = KeeperDaoOrderBook::new(server.uri(), Duration::from_secs(5));

		let err = book.send_orders(&[order()]).await.unwrap_err();
		assert!(err.to_string().ends_with("Invalid signature"));
	}

	#[tokio::test]
	async fn test_transport_failure_is_wrapped() {
		// Nothing listens on the discard port.
		let book = KeeperDaoOrderBook::new("http://127.0.0.1:9", Duration::from_secs(5));
		let err = book.send_orders(&[order()]).await.unwrap_err();
		assert!(matches!(err, OrderError::Submission(_)));
		assert!(err.to_string().starts_with("Unexpected error during send order request "));
	}

	#[tokio::test]
	async fn test_orders_decode_big_bare_numbers() {
		let order_json = serde_json::to_string(&order())
			.unwrap()
			.replace(&format!("\"{}\"", BIG), BIG);
		let body = format!(
			r#"{{"message":"ok","orders":[{{"order":{},"metaData":{{"orderHash":"0x1","makerBalance_makerToken":0,"makerAllowance_makerToken":0,"status":4,"filledAmount_takerToken":0,"remainingFillableAmount_takerToken":{}}}}}]}}"#,
			order_json, BIG
		);
		assert!(body.contains(&format!("\"makerAmount\":{}", BIG)));

		let server = MockServer::start().await;
		let maker = Address::repeat_byte(1);
		Mock::given(method("GET"))
			.and(path("/orders"))
			.and(query_param("maker", maker.to_string()))
			.respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "application/json"))
			.expect(1)
			.mount(&server)
			.await;
		let book = KeeperDaoOrderBook::new(format!("{}/", server.uri()), Duration::from_secs(5));

		let response = book.orders(maker).await.unwrap();
		let element = &response.orders[0];
		assert_eq!(element.order.maker_amount.to_string(), BIG);
		assert_eq!(element.meta_data.status, OrderStatus::Expired);
	}

	#[tokio::test]
	async fn test_token_list() {
		let server = MockServer::start().await;
		let body = r#"{"message":"ok","result":{"name":"Hiding Book","tokens":[{"address":"0x0202020202020202020202020202020202020202","chainId":1,"decimals":18,"symbol":"WETH"}],"version":{"major":1,"minor":2,"patch":0}}}"#;
		answer(&server, "GET", "/tokenList", body.to_string()).await;
		let book = KeeperDaoOrderBook::new(server.uri(), Duration::from_secs(5));

		let list = book.token_list().await.unwrap().result;
		assert_eq!(list.name, "Hiding Book");
		assert_eq!(list.tokens[0].symbol, "WETH");
		assert_eq!(list.tokens[0].address, Address::repeat_byte(2));
		assert!(list.keywords.is_empty());
	}

	#[test]
	fn test_check_send_response() {
		assert!(check_send_response(r#"{"message":"Order creation succeeded"}"#).is_ok());
		assert!(matches!(
			check_send_response(r#"{"message":"nope"}"#),
			Err(OrderError::UnexpectedResponse(msg)) if msg == "nope"
		));
		assert!(matches!(
			check_send_response("<html>"),
			Err(OrderError::Decode(_))
		));
	}

	#[test]
	fn test_factory_defaults_and_validation() {
		let empty = toml::Value::Table(toml::map::Map::new());
		assert!(create_keeper_dao_order_book(&empty).is_ok());

		let bad = toml::Value::Table(toml::from_str("base_url = \"ftp://x\"").unwrap());
		assert!(matches!(
			create_keeper_dao_order_book(&bad),
			Err(OrderError::InvalidConfig(_))
		));
	}
}
