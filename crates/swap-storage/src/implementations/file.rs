//! File-backed storage: one file per key under a base directory.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::path::PathBuf;
use swap_types::{ConfigSchema, Field, FieldType, Schema, ValidationError};
use tokio::fs;

pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Maps a key to a filesystem-safe path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':', '\\'], "_");
		self.base_path.join(format!("{}.json", safe_key))
	}
}

pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String)],
		);
		schema.validate(config)
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		match fs::read(self.get_file_path(key)).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// Write to a sibling then rename so readers never see a partial file.
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.get_file_path(key)).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

/// Creates a file storage backend.
///
/// Configuration parameters:
/// - `storage_path`: base directory (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Box<dyn StorageInterface> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Box::new(FileStorage::new(PathBuf::from(storage_path)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_file_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path().join("nested"));

		assert!(matches!(
			storage.get_bytes("conversion:abc").await,
			Err(StorageError::NotFound)
		));
		assert!(!storage.exists("conversion:abc").await.unwrap());

		storage.set_bytes("conversion:abc", b"one".to_vec()).await.unwrap();
		storage.set_bytes("conversion:abc", b"two".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes("conversion:abc").await.unwrap(), b"two");
		assert!(storage.exists("conversion:abc").await.unwrap());

		storage.delete("conversion:abc").await.unwrap();
		storage.delete("conversion:abc").await.unwrap();
		assert!(!storage.exists("conversion:abc").await.unwrap());
	}

	#[test]
	fn test_keys_are_sanitized() {
		let storage = FileStorage::new(PathBuf::from("/tmp/base"));
		assert_eq!(
			storage.get_file_path("conversion:a/b"),
			PathBuf::from("/tmp/base/conversion_a_b.json")
		);
	}

	#[test]
	fn test_schema_rejects_non_string_path() {
		let config: toml::Value = toml::Value::Table(toml::from_str("storage_path = 5").unwrap());
		assert!(FileStorageSchema.validate(&config).is_err());
	}
}
