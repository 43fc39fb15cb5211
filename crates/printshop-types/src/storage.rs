//! Storage-related types for the order system.

use std::str::FromStr;

/// Storage namespaces for the records kept in the local key-value store.
///
/// Keys are combined with a scope (the service id) as `namespace:scope`, so
/// several shops can share one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// JSON array of order records, newest first.
	OrderHistory,
	/// Last issued order number, stored as an integer string.
	OrderCounter,
}

impl StorageKey {
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::OrderHistory => "order_history",
			StorageKey::OrderCounter => "order_counter",
		}
	}

	pub fn all() -> impl Iterator<Item = Self> {
		[Self::OrderHistory, Self::OrderCounter].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"order_history" => Ok(Self::OrderHistory),
			"order_counter" => Ok(Self::OrderCounter),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
