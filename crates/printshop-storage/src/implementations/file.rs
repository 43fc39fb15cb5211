//! File-based storage backend.
//!
//! Each key is stored as one file under the configured directory. Writes go
//! to a temporary file first and are renamed into place, so a crash never
//! leaves a half-written order history behind.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use printshop_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;

const DEFAULT_STORAGE_PATH: &str = "./data/storage";

pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Maps a key to a filesystem-safe path inside the base directory.
	fn get_file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.json", safe_key))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);
		match fs::read(&path).await {
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

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		tracing::debug!(key = %key, path = ?path, "Stored value");
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		match fs::remove_file(&path).await {
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

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if path.trim().is_empty() => {
						Err("storage_path cannot be empty".to_string())
					},
					_ => Ok(()),
				}
			})],
		);
		schema.validate(config)
	}
}

/// Factory function for the file backend.
///
/// Configuration parameters:
/// - `storage_path`: base directory (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = crate::StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl crate::StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_persists_across_instances() {
		let dir = TempDir::new().unwrap();
		let key = "order_history:printing247";

		let storage = FileStorage::new(dir.path().to_path_buf());
		storage.set_bytes(key, b"[]".to_vec()).await.unwrap();
		assert!(storage.exists(key).await.unwrap());
		assert!(dir.path().join("order_history_printing247.json").exists());
		assert!(!dir.path().join("order_history_printing247.tmp").exists());

		let reopened = FileStorage::new(dir.path().to_path_buf());
		assert_eq!(reopened.get_bytes(key).await.unwrap(), b"[]".to_vec());

		reopened.delete(key).await.unwrap();
		assert!(matches!(
			reopened.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
		reopened.delete(key).await.unwrap();
	}

	#[tokio::test]
	async fn test_creates_missing_directory() {
		let dir = TempDir::new().unwrap();
		let nested = dir.path().join("nested").join("store");
		let storage = FileStorage::new(nested.clone());
		storage.set_bytes("order_counter:x", b"1".to_vec()).await.unwrap();
		assert!(nested.join("order_counter_x.json").exists());
	}

	#[test]
	fn test_factory_validates_config() {
		let dir = TempDir::new().unwrap();
		let mut table = toml::map::Map::new();
		table.insert(
			"storage_path".into(),
			toml::Value::String(dir.path().display().to_string()),
		);
		assert!(create_storage(&toml::Value::Table(table)).is_ok());

		let mut bad = toml::map::Map::new();
		bad.insert("storage_path".into(), toml::Value::Integer(3));
		assert!(matches!(
			create_storage(&toml::Value::Table(bad)),
			Err(StorageError::Configuration(_))
		));
	}
}
