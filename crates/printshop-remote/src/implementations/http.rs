//! REST remote backend.
//!
//! Talks JSON to a document/blob gateway:
//! - `POST   {base}/collections/{collection}/documents` returns `{"id": ...}`
//! - `PATCH  {base}/collections/{collection}/documents/{id}`
//! - `DELETE {base}/collections/{collection}/documents/{id}`
//! - `PUT    {base}/blobs/{path}` returns `{"downloadUrl": ...}`

use crate::{RemoteError, RemoteInterface};
use async_trait::async_trait;
use bytes::Bytes;
use printshop_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

pub struct HttpRemote {
	client: Client,
	base_url: String,
	auth_token: Option<String>,
}

#[derive(Deserialize)]
struct CreatedDocument {
	id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedBlob {
	download_url: String,
}

impl HttpRemote {
	pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Result<Self, RemoteError> {
		let client = Client::builder()
			.build()
			.map_err(|e| RemoteError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
		Ok(Self {
			client,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			auth_token,
		})
	}

	fn document_url(&self, collection: &str, id: Option<&str>) -> String {
		match id {
			Some(id) => format!(
				"{}/collections/{}/documents/{}",
				self.base_url, collection, id
			),
			None => format!("{}/collections/{}/documents", self.base_url, collection),
		}
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match &self.auth_token {
			Some(token) => request.bearer_auth(token),
			None => request,
		}
	}

	async fn send(
		&self,
		request: reqwest::RequestBuilder,
		what: &str,
	) -> Result<reqwest::Response, RemoteError> {
		let response = self
			.authorize(request)
			.send()
			.await
			.map_err(|e| RemoteError::Network(format!("{} request failed: {}", what, e)))?;

		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}

		let body = response.text().await.unwrap_or_default();
		Err(match status {
			StatusCode::NOT_FOUND => RemoteError::NotFound(format!("{}: {}", what, body)),
			StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
				RemoteError::MissingField(format!("{} rejected: {}", what, body))
			},
			_ => RemoteError::Network(format!("{} failed with status {}: {}", what, status, body)),
		})
	}
}

#[async_trait]
impl RemoteInterface for HttpRemote {
	async fn create_document(
		&self,
		collection: &str,
		document: serde_json::Value,
	) -> Result<String, RemoteError> {
		let request = self
			.client
			.post(self.document_url(collection, None))
			.json(&document);
		let created: CreatedDocument = self
			.send(request, "create document")
			.await?
			.json()
			.await
			.map_err(|e| RemoteError::Serialization(e.to_string()))?;
		Ok(created.id)
	}

	async fn update_document(
		&self,
		collection: &str,
		id: &str,
		patch: serde_json::Value,
	) -> Result<(), RemoteError> {
		let request = self
			.client
			.patch(self.document_url(collection, Some(id)))
			.json(&patch);
		self.send(request, "update document").await?;
		Ok(())
	}

	async fn delete_document(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
		let request = self.client.delete(self.document_url(collection, Some(id)));
		match self.send(request, "delete document").await {
			Ok(_) | Err(RemoteError::NotFound(_)) => Ok(()),
			Err(e) => Err(e),
		}
	}

	async fn upload_blob(
		&self,
		path: &str,
		data: Bytes,
		content_type: Option<String>,
	) -> Result<String, RemoteError> {
		let mut request = self
			.client
			.put(format!("{}/blobs/{}", self.base_url, path))
			.body(data);
		if let Some(content_type) = content_type {
			request = request.header(header::CONTENT_TYPE, content_type);
		}

		let uploaded: UploadedBlob = self
			.send(request, "upload blob")
			.await
			.map_err(|e| RemoteError::Upload(e.to_string()))?
			.json()
			.await
			.map_err(|e| RemoteError::Serialization(e.to_string()))?;
		Ok(uploaded.download_url)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpRemoteSchema)
	}
}

pub struct HttpRemoteSchema;

impl ConfigSchema for HttpRemoteSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("base_url", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
					_ => Err("base_url must start with http:// or https://".to_string()),
				}
			})],
			vec![Field::new("auth_token", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Factory function for the HTTP backend.
///
/// Configuration parameters:
/// - `base_url`: gateway root, e.g. "https://orders.example.com/v1"
/// - `auth_token`: optional bearer token
pub fn create_remote(config: &toml::Value) -> Result<Box<dyn RemoteInterface>, RemoteError> {
	HttpRemoteSchema
		.validate(config)
		.map_err(|e| RemoteError::Configuration(e.to_string()))?;

	let base_url = config
		.get("base_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| RemoteError::Configuration("base_url is required".into()))?;
	let auth_token = config
		.get("auth_token")
		.and_then(|v| v.as_str())
		.filter(|token| !token.is_empty())
		.map(str::to_string);

	Ok(Box::new(HttpRemote::new(base_url, auth_token)?))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::RemoteFactory;

	fn factory() -> Self::Factory {
		create_remote
	}
}

impl crate::RemoteRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_urls() {
		let remote = HttpRemote::new("https://orders.example.com/v1/", None).unwrap();
		assert_eq!(
			remote.document_url("orders", None),
			"https://orders.example.com/v1/collections/orders/documents"
		);
		assert_eq!(
			remote.document_url("orders", Some("abc")),
			"https://orders.example.com/v1/collections/orders/documents/abc"
		);
	}

	#[test]
	fn test_factory_requires_http_url() {
		let ok: toml::Value =
			toml::from_str("base_url = \"https://orders.example.com\"\nauth_token = \"t\"").unwrap();
		assert!(create_remote(&ok).is_ok());

		let missing: toml::Value = toml::from_str("auth_token = \"t\"").unwrap();
		assert!(matches!(
			create_remote(&missing),
			Err(RemoteError::Configuration(_))
		));

		let bad_scheme: toml::Value = toml::from_str("base_url = \"ftp://x\"").unwrap();
		assert!(create_remote(&bad_scheme).is_err());
	}

	#[tokio::test]
	async fn test_unreachable_gateway_is_network_error() {
		let remote = HttpRemote::new("http://127.0.0.1:9", None).unwrap();
		let result = remote
			.create_document("orders", serde_json::json!({ "status": "pending" }))
			.await;
		assert!(matches!(result, Err(RemoteError::Network(_))));
	}
}
