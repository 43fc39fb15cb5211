//! Fixtures shared by the unit tests in this crate.

use crate::draft::DraftStore;
use async_trait::async_trait;
use printshop_pricing::catalog::{find_location, photo_config};
use printshop_pricing::DeliveryPricing;
use printshop_storage::implementations::memory::{MemoryStorage, MemoryStorageSchema};
use printshop_storage::{StorageError, StorageInterface, StorageService};
use printshop_types::{
	Binding, ConfigSchema, OrderConfiguration, OrderType, PaperSize, PickedFile, PrintConfig,
	PrintType, UserInfo,
};
use std::sync::Arc;

/// Backend whose every operation fails.
pub struct BrokenStorage;

#[async_trait]
impl StorageInterface for BrokenStorage {
	async fn get_bytes(&self, _key: &str) -> Result<Vec<u8>, StorageError> {
		Err(StorageError::Backend("disk unavailable".into()))
	}

	async fn set_bytes(&self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
		Err(StorageError::Backend("disk unavailable".into()))
	}

	async fn delete(&self, _key: &str) -> Result<(), StorageError> {
		Err(StorageError::Backend("disk unavailable".into()))
	}

	async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
		Err(StorageError::Backend("disk unavailable".into()))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

pub fn memory_storage() -> Arc<StorageService> {
	Arc::new(StorageService::new(Box::new(MemoryStorage::new())))
}

pub fn broken_storage() -> Arc<StorageService> {
	Arc::new(StorageService::new(Box::new(BrokenStorage)))
}

pub fn ana() -> UserInfo {
	UserInfo::new("Ana Ruiz", "+50688889999", "ana@example.com")
}

/// Two 4R prints at San José Centro, no files, no delivery.
pub fn photo_store(id: &str) -> DraftStore {
	let mut store = DraftStore::new(id, DeliveryPricing::default(), 5);
	store.set_order_type(OrderType::Photo);
	store.set_user_info(ana()).unwrap();
	store.set_location(find_location("sj-cr-003").unwrap());
	store
		.set_configuration(OrderConfiguration::Photo(photo_config("4R", 2, None).unwrap()))
		.unwrap();
	store
}

/// A two-copy letter print of the given files.
pub fn print_store(id: &str, files: Vec<PickedFile>) -> DraftStore {
	let mut store = DraftStore::new(id, DeliveryPricing::default(), 5);
	store.set_order_type(OrderType::Document);
	store.set_user_info(ana()).unwrap();
	store.set_location(find_location("denver-001").unwrap());
	store
		.set_configuration(OrderConfiguration::Print(
			PrintConfig::build(PaperSize::Letter, 2, PrintType::Bw, Binding::None)
				.unwrap()
				.with_unit_price(0.1),
		))
		.unwrap();
	store.attach_files(files).unwrap();
	store
}
