//! Key-value persistence for the swap core.
//!
//! Backends store opaque bytes under string keys; [`StorageService`] layers
//! typed JSON access on top. The only state the core persists is the latest
//! conversion-funnel snapshot for each session.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use swap_types::{ConfigSchema, ConversionEvent};
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

const CONVERSION_NAMESPACE: &str = "conversion";

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Low-level byte storage a backend must provide.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Writes `value`, replacing whatever was stored under `key`.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deleting a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Typed storage over a boxed backend.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Serializes `data` to JSON under `namespace:id`.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	pub async fn contains(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	/// Overwrites the session's conversion snapshot.
	pub async fn save_conversion(
		&self,
		session: &str,
		event: &ConversionEvent,
	) -> Result<(), StorageError> {
		self.store(CONVERSION_NAMESPACE, session, event).await
	}

	/// The session's last snapshot, if any. A missing or unreadable entry
	/// is reported as `None`.
	pub async fn latest_conversion(&self, session: &str) -> Option<ConversionEvent> {
		match self.retrieve(CONVERSION_NAMESPACE, session).await {
			Ok(event) => Some(event),
			Err(StorageError::NotFound) => None,
			Err(e) => {
				tracing::warn!(session, error = %e, "Discarding unreadable conversion snapshot");
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;

	fn event(pair: &str) -> ConversionEvent {
		ConversionEvent {
			conversion_type: "Market".into(),
			conversion_blockchain_network: "MainNet".into(),
			conversion_settings: "Regular".into(),
			conversion_token_pair: pair.into(),
			conversion_from_token: "ETH".into(),
			conversion_to_token: "BNT".into(),
			conversion_from_amount: "1".into(),
			conversion_from_amount_usd: None,
			conversion_to_amount: "250".into(),
			conversion_to_amount_usd: None,
			conversion_input_type: "Token".into(),
			conversion_rate: "250".into(),
		}
	}

	#[tokio::test]
	async fn test_conversion_snapshot_is_overwritten() {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		assert!(storage.latest_conversion("session-1").await.is_none());

		storage.save_conversion("session-1", &event("ETH/BNT")).await.unwrap();
		storage.save_conversion("session-1", &event("BNT/ETH")).await.unwrap();

		let latest = storage.latest_conversion("session-1").await.unwrap();
		assert_eq!(latest.conversion_token_pair, "BNT/ETH");
		assert!(storage.latest_conversion("session-2").await.is_none());
	}

	#[tokio::test]
	async fn test_typed_round_trip_and_remove() {
		let storage = StorageService::new(Box::new(MemoryStorage::new()));
		storage.store("ns", "a", &vec![1u32, 2, 3]).await.unwrap();
		assert!(storage.contains("ns", "a").await.unwrap());

		let values: Vec<u32> = storage.retrieve("ns", "a").await.unwrap();
		assert_eq!(values, vec![1, 2, 3]);

		storage.remove("ns", "a").await.unwrap();
		assert!(matches!(
			storage.retrieve::<Vec<u32>>("ns", "a").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_corrupt_snapshot_reads_as_none() {
		let backend = MemoryStorage::new();
		backend
			.set_bytes("conversion:s", b"not json".to_vec())
			.await
			.unwrap();
		let storage = StorageService::new(Box::new(backend));
		assert!(storage.latest_conversion("s").await.is_none());
	}
}
