//! In-process remote backend.
//!
//! Documents and blobs are held in memory. A failure point can be configured
//! so the rest of the system can be run against a remote that is down.

use crate::{RemoteError, RemoteInterface, ORDERS_COLLECTION};
use async_trait::async_trait;
use bytes::Bytes;
use printshop_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Operation that always fails when configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
	Create,
	Update,
	Upload,
}

impl FromStr for FailurePoint {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"create" => Ok(Self::Create),
			"update" => Ok(Self::Update),
			"upload" => Ok(Self::Upload),
			other => Err(format!("unknown failure point '{}'", other)),
		}
	}
}

#[derive(Default)]
struct RemoteState {
	documents: HashMap<String, serde_json::Value>,
	blobs: HashMap<String, Bytes>,
}

/// Memory backend. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryRemote {
	state: Arc<RwLock<RemoteState>>,
	fail_on: Option<FailurePoint>,
}

impl MemoryRemote {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_failure(point: FailurePoint) -> Self {
		Self {
			fail_on: Some(point),
			..Self::default()
		}
	}

	fn check(&self, point: FailurePoint) -> Result<(), RemoteError> {
		if self.fail_on == Some(point) {
			return Err(RemoteError::Unavailable(format!(
				"{:?} disabled by configuration",
				point
			)));
		}
		Ok(())
	}

	/// Order document by id.
	pub async fn document(&self, id: &str) -> Option<serde_json::Value> {
		self.state
			.read()
			.await
			.documents
			.get(&format!("{}/{}", ORDERS_COLLECTION, id))
			.cloned()
	}

	/// Ids of all order documents.
	pub async fn document_ids(&self) -> Vec<String> {
		let prefix = format!("{}/", ORDERS_COLLECTION);
		self.state
			.read()
			.await
			.documents
			.keys()
			.filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
			.collect()
	}

	pub async fn document_count(&self) -> usize {
		self.state.read().await.documents.len()
	}

	pub async fn blob(&self, path: &str) -> Option<Bytes> {
		self.state.read().await.blobs.get(path).cloned()
	}
}

#[async_trait]
impl RemoteInterface for MemoryRemote {
	async fn create_document(
		&self,
		collection: &str,
		document: serde_json::Value,
	) -> Result<String, RemoteError> {
		self.check(FailurePoint::Create)?;
		let id = uuid::Uuid::new_v4().simple().to_string();
		let mut state = self.state.write().await;
		state
			.documents
			.insert(format!("{}/{}", collection, id), document);
		Ok(id)
	}

	async fn update_document(
		&self,
		collection: &str,
		id: &str,
		patch: serde_json::Value,
	) -> Result<(), RemoteError> {
		self.check(FailurePoint::Update)?;
		let mut state = self.state.write().await;
		let document = state
			.documents
			.get_mut(&format!("{}/{}", collection, id))
			.ok_or_else(|| RemoteError::NotFound(id.to_string()))?;

		if let (Some(target), serde_json::Value::Object(fields)) = (document.as_object_mut(), patch)
		{
			for (key, value) in fields {
				target.insert(key, value);
			}
		}
		Ok(())
	}

	async fn delete_document(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
		let mut state = self.state.write().await;
		state.documents.remove(&format!("{}/{}", collection, id));
		Ok(())
	}

	async fn upload_blob(
		&self,
		path: &str,
		data: Bytes,
		_content_type: Option<String>,
	) -> Result<String, RemoteError> {
		self.check(FailurePoint::Upload)?;
		let mut state = self.state.write().await;
		state.blobs.insert(path.to_string(), data);
		Ok(format!("memory://{}", path))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryRemoteSchema)
	}
}

pub struct MemoryRemoteSchema;

impl ConfigSchema for MemoryRemoteSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("fail_on", FieldType::String).with_validator(|value| {
				value
					.as_str()
					.map(FailurePoint::from_str)
					.transpose()
					.map(|_| ())
			})],
		);
		schema.validate(config)
	}
}

/// Factory function for the memory backend.
///
/// Configuration parameters:
/// - `fail_on`: optional, one of "create", "update", "upload"
pub fn create_remote(config: &toml::Value) -> Result<Box<dyn RemoteInterface>, RemoteError> {
	MemoryRemoteSchema
		.validate(config)
		.map_err(|e| RemoteError::Configuration(e.to_string()))?;

	let remote = match config.get("fail_on").and_then(|v| v.as_str()) {
		Some(point) => MemoryRemote::with_failure(
			point.parse().map_err(RemoteError::Configuration)?,
		),
		None => MemoryRemote::new(),
	};
	Ok(Box::new(remote))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = crate::RemoteFactory;

	fn factory() -> Self::Factory {
		create_remote
	}
}

impl crate::RemoteRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_document_lifecycle() {
		let remote = MemoryRemote::new();
		let id = remote
			.create_document("orders", serde_json::json!({ "status": "pending", "notes": "" }))
			.await
			.unwrap();

		remote
			.update_document("orders", &id, serde_json::json!({ "status": "upload_failed" }))
			.await
			.unwrap();
		assert_eq!(remote.document_ids().await, vec![id.clone()]);
		let doc = remote.document(&id).await.unwrap();
		assert_eq!(doc["status"], "upload_failed");
		assert_eq!(doc["notes"], "");

		remote.delete_document("orders", &id).await.unwrap();
		assert_eq!(remote.document_count().await, 0);
		assert!(matches!(
			remote
				.update_document("orders", &id, serde_json::json!({}))
				.await,
			Err(RemoteError::NotFound(_))
		));
	}

	#[tokio::test]
	async fn test_failure_point() {
		let remote = MemoryRemote::with_failure(FailurePoint::Upload);
		assert!(remote
			.create_document("orders", serde_json::json!({}))
			.await
			.is_ok());
		assert!(matches!(
			remote
				.upload_blob("orders/x/a.pdf", Bytes::from_static(b"x"), None)
				.await,
			Err(RemoteError::Unavailable(_))
		));
	}

	#[test]
	fn test_factory_config() {
		let ok: toml::Value = toml::from_str(r#"fail_on = "create""#).unwrap();
		assert!(create_remote(&ok).is_ok());
		let bad: toml::Value = toml::from_str(r#"fail_on = "sometimes""#).unwrap();
		assert!(matches!(
			create_remote(&bad),
			Err(RemoteError::Configuration(_))
		));
	}
}
