//! Local key-value storage for the printshop order system.
//!
//! Order history and the order-number counter live in a small key-value
//! store. Backends implement [`StorageInterface`] over raw bytes; the
//! [`StorageService`] layers JSON (de)serialization and `namespace:id` keys on
//! top of whichever backend the configuration selects.

use async_trait::async_trait;
use printshop_types::{ConfigSchema, ImplementationRegistry, StorageKey};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Low-level interface for storage backends.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key, or `NotFound`.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value for `key`. Deleting a missing key succeeds.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Factory signature every storage backend provides.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// All storage backends compiled into this crate, as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Typed storage operations over a backend.
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

	/// Serializes `data` as JSON and stores it under `namespace:id`.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes)
			.await
	}

	/// Retrieves and deserializes the value under `namespace:id`.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Like [`retrieve`](Self::retrieve) but maps `NotFound` to `None`.
	pub async fn retrieve_optional<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	/// Shorthand for operations on one of the well-known namespaces.
	pub async fn store_record<T: Serialize>(
		&self,
		key: StorageKey,
		scope: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.store(key.as_str(), scope, data).await
	}

	pub async fn retrieve_record<T: DeserializeOwned>(
		&self,
		key: StorageKey,
		scope: &str,
	) -> Result<Option<T>, StorageError> {
		self.retrieve_optional(key.as_str(), scope).await
	}

	pub async fn remove_record(&self, key: StorageKey, scope: &str) -> Result<(), StorageError> {
		self.remove(key.as_str(), scope).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Entry {
		id: String,
		total: f64,
	}

	#[tokio::test]
	async fn test_typed_round_trip() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		let entry = Entry {
			id: "P247-1".into(),
			total: 10.0,
		};

		service.store("entries", "a", &entry).await.unwrap();
		assert!(service.exists("entries", "a").await.unwrap());
		let back: Entry = service.retrieve("entries", "a").await.unwrap();
		assert_eq!(back, entry);

		service.remove("entries", "a").await.unwrap();
		assert!(matches!(
			service.retrieve::<Entry>("entries", "a").await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_retrieve_optional_maps_not_found() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		let missing: Option<String> = service
			.retrieve_record(StorageKey::OrderCounter, "shop")
			.await
			.unwrap();
		assert!(missing.is_none());

		service
			.store_record(StorageKey::OrderCounter, "shop", &"7")
			.await
			.unwrap();
		let present: Option<String> = service
			.retrieve_record(StorageKey::OrderCounter, "shop")
			.await
			.unwrap();
		assert_eq!(present.as_deref(), Some("7"));
	}

	#[tokio::test]
	async fn test_malformed_value_is_serialization_error() {
		let backend = MemoryStorage::new();
		backend
			.set_bytes("order_history:shop", b"not json".to_vec())
			.await
			.unwrap();
		let service = StorageService::new(Box::new(backend));
		let result: Result<Option<Vec<Entry>>, _> = service
			.retrieve_record(StorageKey::OrderHistory, "shop")
			.await;
		assert!(matches!(result, Err(StorageError::Serialization(_))));
	}

	#[test]
	fn test_registered_implementations() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["file", "memory"]);
	}
}
