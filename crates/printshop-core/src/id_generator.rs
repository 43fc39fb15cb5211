//! Sequential order numbers backed by the local store.

use printshop_storage::{StorageError, StorageService};
use printshop_types::{current_millis, current_year, StorageKey};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Issues `PREFIX-YEAR-NNNNNN` (or `PREFIX-NNNNNN`) identifiers from a
/// persisted counter.
///
/// When the counter cannot be read or written, `PREFIX-<epoch millis>` is
/// returned instead, so [`generate`](Self::generate) never fails.
pub struct IdGenerator {
	storage: Arc<StorageService>,
	scope: String,
	prefix: String,
	include_year: bool,
	/// Serializes read-increment-write within this process.
	lock: Mutex<()>,
}

impl IdGenerator {
	pub fn new(
		storage: Arc<StorageService>,
		scope: impl Into<String>,
		prefix: impl Into<String>,
		include_year: bool,
	) -> Self {
		Self {
			storage,
			scope: scope.into(),
			prefix: prefix.into(),
			include_year,
			lock: Mutex::new(()),
		}
	}

	pub async fn generate(&self) -> String {
		let _guard = self.lock.lock().await;
		match self.next_counter().await {
			Ok(counter) => {
				let year = self.include_year.then(current_year);
				format_order_id(&self.prefix, year, counter)
			},
			Err(e) => {
				tracing::warn!(error = %e, "Order counter unavailable, using timestamp id");
				format!("{}-{}", self.prefix, current_millis())
			},
		}
	}

	async fn next_counter(&self) -> Result<u64, StorageError> {
		let current: Option<String> = self
			.storage
			.retrieve_record(StorageKey::OrderCounter, &self.scope)
			.await?;
		let current = match current {
			Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
				StorageError::Serialization(format!("Invalid order counter '{}': {}", raw, e))
			})?,
			None => 0,
		};

		let next = current.checked_add(1).ok_or_else(|| {
			StorageError::Serialization(format!("Order counter exhausted at {}", current))
		})?;
		self.storage
			.store_record(StorageKey::OrderCounter, &self.scope, &next.to_string())
			.await?;
		Ok(next)
	}
}

/// Joins prefix, optional year and the counter padded to six digits.
pub fn format_order_id(prefix: &str, year: Option<i32>, counter: u64) -> String {
	match year {
		Some(year) => format!("{}-{}-{:06}", prefix, year, counter),
		None => format!("{}-{:06}", prefix, counter),
	}
}
