//! Builder for constructing an [`OrderEngine`] from configuration.
//!
//! Backends are created through factory functions keyed by implementation
//! name. Every implementation listed in the configuration that has a known
//! factory is created (and thereby validated); the one named `primary` is
//! used.

use crate::engine::{event_bus::EventBus, OrderEngine};
use printshop_config::Config;
use printshop_remote::{RemoteError, RemoteInterface, RemoteService};
use printshop_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Factory functions for every backend kind, keyed by implementation name.
pub struct OrderFactories<SF, RF> {
	pub storage_factories: HashMap<String, SF>,
	pub remote_factories: HashMap<String, RF>,
}

pub struct OrderEngineBuilder {
	config: Config,
	event_capacity: usize,
}

impl OrderEngineBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			event_capacity: 1000,
		}
	}

	pub fn with_event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity;
		self
	}

	pub fn build<SF, RF>(self, factories: OrderFactories<SF, RF>) -> Result<OrderEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		RF: Fn(&toml::Value) -> Result<Box<dyn RemoteInterface>, RemoteError>,
	{
		// Create storage implementations
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = factories.storage_factories.get(name) else {
				tracing::warn!(component = "storage", implementation = %name, "Unknown implementation, skipped");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					storage_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		// Create remote implementations, if a remote is configured at all
		let remote = match &self.config.remote {
			None => {
				tracing::info!(component = "remote", "No remote configured, orders stay local");
				None
			},
			Some(remote_config) => {
				let mut remote_impls = HashMap::new();
				for (name, config) in &remote_config.implementations {
					let Some(factory) = factories.remote_factories.get(name) else {
						tracing::warn!(component = "remote", implementation = %name, "Unknown implementation, skipped");
						continue;
					};
					match factory(config) {
						Ok(implementation) => {
							remote_impls.insert(name.clone(), implementation);
							let is_primary = &remote_config.primary == name;
							tracing::info!(component = "remote", implementation = %name, enabled = %is_primary, "Loaded");
						},
						Err(e) => {
							tracing::error!(
								component = "remote",
								implementation = %name,
								error = %e,
								"Failed to create remote implementation"
							);
							return Err(BuilderError::Config(format!(
								"Failed to create remote implementation '{}': {}",
								name, e
							)));
						},
					}
				}

				let backend = remote_impls.remove(&remote_config.primary).ok_or_else(|| {
					BuilderError::Config(format!(
						"Primary remote '{}' failed to load or has invalid configuration",
						remote_config.primary
					))
				})?;
				Some(Arc::new(RemoteService::new(
					backend,
					&self.config.orders.upload_dir,
				)))
			},
		};

		Ok(OrderEngine::new(
			self.config,
			storage,
			remote,
			EventBus::new(self.event_capacity),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use printshop_remote::RemoteFactory;
	use printshop_storage::StorageFactory;

	fn factories() -> OrderFactories<StorageFactory, RemoteFactory> {
		OrderFactories {
			storage_factories: printshop_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			remote_factories: printshop_remote::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	fn config(extra: &str) -> Config {
		format!(
			r#"
			[service]
			id = "shop"

			[storage]
			primary = "memory"
			[storage.implementations.memory]
			{}
			"#,
			extra
		)
		.parse()
		.unwrap()
	}

	#[test]
	fn test_build_without_remote() {
		let engine = OrderEngineBuilder::new(config("")).build(factories()).unwrap();
		assert!(!engine.remote_enabled());
	}

	#[test]
	fn test_build_with_memory_remote() {
		let engine = OrderEngineBuilder::new(config(
			r#"
			[remote]
			primary = "memory"
			[remote.implementations.memory]
			fail_on = "upload"
			"#,
		))
		.build(factories())
		.unwrap();
		assert!(engine.remote_enabled());
	}

	#[test]
	fn test_invalid_backend_config_fails_build() {
		let result = OrderEngineBuilder::new(config(
			r#"
			[remote]
			primary = "memory"
			[remote.implementations.memory]
			fail_on = "sometimes"
			"#,
		))
		.build(factories());
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[test]
	fn test_unknown_primary_fails_build() {
		let result = OrderEngineBuilder::new(config(
			r#"
			[remote]
			primary = "carrier-pigeon"
			[remote.implementations.carrier-pigeon]
			"#,
		))
		.build(factories());
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}
}
