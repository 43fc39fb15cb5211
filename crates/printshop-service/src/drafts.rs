//! Drafts held by the API, one per customer session.
//!
//! The registry is bounded: drafts untouched for longer than the idle
//! timeout are dropped, and once `max_drafts` are open a new one is refused
//! until space frees up.

use dashmap::DashMap;
use printshop_core::{DraftStore, OrderEngine};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("Too many open drafts (max {0})")]
	Full(usize),
}

struct DraftEntry {
	store: DraftStore,
	touched: Instant,
}

pub struct DraftRegistry {
	drafts: DashMap<String, DraftEntry>,
	max_drafts: usize,
	idle_timeout: Duration,
}

impl DraftRegistry {
	pub fn new(max_drafts: usize, idle_timeout: Duration) -> Self {
		Self {
			drafts: DashMap::new(),
			max_drafts,
			idle_timeout,
		}
	}

	/// Opens a fresh draft and returns its id.
	pub fn create(&self, engine: &OrderEngine) -> Result<String, RegistryError> {
		self.purge_idle();
		if self.len() >= self.max_drafts {
			return Err(RegistryError::Full(self.max_drafts));
		}
		let id = uuid::Uuid::new_v4().to_string();
		self.drafts.insert(
			id.clone(),
			DraftEntry {
				store: engine.new_draft(id.clone()),
				touched: Instant::now(),
			},
		);
		Ok(id)
	}

	pub fn read<T>(&self, id: &str, f: impl FnOnce(&DraftStore) -> T) -> Option<T> {
		self.drafts.get_mut(id).map(|mut entry| {
			entry.touched = Instant::now();
			f(&entry.store)
		})
	}

	pub fn update<T>(&self, id: &str, f: impl FnOnce(&mut DraftStore) -> T) -> Option<T> {
		self.drafts.get_mut(id).map(|mut entry| {
			entry.touched = Instant::now();
			f(&mut entry.store)
		})
	}

	#[allow(clippy::len_without_is_empty)]
	pub fn len(&self) -> usize {
		self.drafts.len()
	}

	/// Drops drafts idle for longer than the timeout.
	pub fn purge_idle(&self) {
		let before = self.drafts.len();
		self.drafts
			.retain(|_, entry| entry.touched.elapsed() <= self.idle_timeout);
		let dropped = before.saturating_sub(self.drafts.len());
		if dropped > 0 {
			tracing::debug!(dropped, "Idle drafts dropped");
		}
	}
}
