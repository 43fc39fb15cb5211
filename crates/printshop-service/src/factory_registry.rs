//! Registry of every backend factory compiled into the service.
//!
//! Backends register themselves through their crate's
//! `get_all_implementations()`; the configuration then picks among them by
//! name.

use printshop_config::Config;
use printshop_core::{OrderEngine, OrderEngineBuilder, OrderFactories};
use printshop_remote::RemoteFactory;
use printshop_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub remote: HashMap<String, RemoteFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			remote: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_remote(&mut self, name: impl Into<String>, factory: RemoteFactory) {
		self.remote.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in printshop_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in printshop_remote::get_all_implementations() {
			tracing::debug!("Registering remote implementation: {}", name);
			registry.register_remote(name, factory);
		}

		registry
	})
}

/// Picks the factory for every implementation named in a config section.
/// Unknown names are an error listing the available ones.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

pub fn build_engine_from_config(config: Config) -> Result<OrderEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let remote_factories = match &config.remote {
		Some(remote) => build_factories!(registry, remote.implementations, remote, "remote"),
		None => HashMap::new(),
	};

	let factories = OrderFactories {
		storage_factories,
		remote_factories,
	};
	Ok(OrderEngineBuilder::new(config).build(factories)?)
}
