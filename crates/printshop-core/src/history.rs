//! Local order history.
//!
//! The history is a single JSON array per scope, newest record first. It is
//! the source of truth for status lookups on this service.

use crate::engine::event_bus::EventBus;
use crate::state::is_valid_record_transition;
use printshop_storage::StorageService;
use printshop_types::{HistoryEvent, OrderEvent, OrderRecord, RecordStatus, StorageKey};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum HistoryError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Invalid status transition from {from} to {to}")]
	InvalidTransition {
		from: RecordStatus,
		to: RecordStatus,
	},
}

pub struct OrderHistory {
	storage: Arc<StorageService>,
	scope: String,
	event_bus: EventBus,
	/// Held across read-modify-write cycles on the history array.
	write_lock: Mutex<()>,
}

impl OrderHistory {
	pub fn new(storage: Arc<StorageService>, scope: impl Into<String>, event_bus: EventBus) -> Self {
		Self {
			storage,
			scope: scope.into(),
			event_bus,
			write_lock: Mutex::new(()),
		}
	}

	/// All records, most recently created first. A history that cannot be
	/// read or parsed is an error, not an empty list.
	pub async fn list(&self) -> Result<Vec<OrderRecord>, HistoryError> {
		let records: Option<Vec<OrderRecord>> = self
			.storage
			.retrieve_record(StorageKey::OrderHistory, &self.scope)
			.await
			.map_err(|e| HistoryError::Storage(e.to_string()))?;
		Ok(records.unwrap_or_default())
	}

	pub async fn find(&self, id: &str) -> Result<Option<OrderRecord>, HistoryError> {
		Ok(self.list().await?.into_iter().find(|record| record.id == id))
	}

	/// Prepends `record`. Either the whole history is written or nothing is.
	pub async fn save(&self, record: OrderRecord) -> Result<(), HistoryError> {
		let _guard = self.write_lock.lock().await;
		let mut records = self.list().await?;
		records.insert(0, record);
		self.write(&records).await
	}

	/// Changes the status of one record in place.
	pub async fn update_status(
		&self,
		id: &str,
		status: RecordStatus,
	) -> Result<OrderRecord, HistoryError> {
		let _guard = self.write_lock.lock().await;
		let mut records = self.list().await?;
		let record = records
			.iter_mut()
			.find(|record| record.id == id)
			.ok_or_else(|| HistoryError::NotFound(id.to_string()))?;

		let from = record.status;
		if !is_valid_record_transition(from, status) {
			return Err(HistoryError::InvalidTransition { from, to: status });
		}
		if from == status {
			return Ok(record.clone());
		}

		record.status = status;
		let updated = record.clone();
		self.write(&records).await?;

		tracing::info!(order_id = %id, from = %from, to = %status, "Order status updated");
		self.event_bus
			.publish(OrderEvent::History(HistoryEvent::StatusChanged {
				order_id: id.to_string(),
				from,
				to: status,
			}))
			.ok();
		Ok(updated)
	}

	/// Removes the history and resets the order counter.
	pub async fn clear(&self) -> Result<(), HistoryError> {
		let _guard = self.write_lock.lock().await;
		for key in StorageKey::all() {
			self.storage
				.remove_record(key, &self.scope)
				.await
				.map_err(|e| HistoryError::Storage(e.to_string()))?;
		}
		tracing::info!(scope = %self.scope, "Order history cleared");
		self.event_bus
			.publish(OrderEvent::History(HistoryEvent::Cleared))
			.ok();
		Ok(())
	}

	async fn write(&self, records: &[OrderRecord]) -> Result<(), HistoryError> {
		self.storage
			.store_record(StorageKey::OrderHistory, &self.scope, &records)
			.await
			.map_err(|e| HistoryError::Storage(e.to_string()))
	}
}
