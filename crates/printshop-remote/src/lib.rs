//! Remote order synchronization for the printshop order system.
//!
//! Submitted orders are mirrored to a remote document database, and their
//! files to blob storage, so the back office can pick them up. Backends
//! implement [`RemoteInterface`]; [`RemoteService`] implements the order
//! workflow on top: required-field checks, document creation, file upload and
//! cleanup when an upload fails.

use async_trait::async_trait;
use bytes::Bytes;
use printshop_types::{
	current_rfc3339, truncate_id, ConfigSchema, ImplementationRegistry, NewOrderDocument,
	OrderDocument, PickedFile, RemoteOrderStatus, UploadedFile,
};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub mod implementations {
	pub mod http;
	pub mod memory;
}

/// Collection holding one document per submitted order.
pub const ORDERS_COLLECTION: &str = "orders";

/// Errors that can occur while talking to the remote backend.
#[derive(Debug, Error)]
pub enum RemoteError {
	/// A required order field is missing; nothing was written.
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Network error: {0}")]
	Network(String),
	#[error("Upload failed: {0}")]
	Upload(String),
	/// A file reference points outside the upload directory.
	#[error("Invalid file source: {0}")]
	InvalidSource(String),
	#[error("Document not found: {0}")]
	NotFound(String),
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Failing on purpose; used to exercise degraded mode.
	#[error("Remote unavailable: {0}")]
	Unavailable(String),
}

/// Low-level document database and blob storage operations.
#[async_trait]
pub trait RemoteInterface: Send + Sync {
	/// Creates a document and returns its generated id.
	async fn create_document(
		&self,
		collection: &str,
		document: serde_json::Value,
	) -> Result<String, RemoteError>;

	/// Merges the top-level fields of `patch` into an existing document.
	async fn update_document(
		&self,
		collection: &str,
		id: &str,
		patch: serde_json::Value,
	) -> Result<(), RemoteError>;

	async fn delete_document(&self, collection: &str, id: &str) -> Result<(), RemoteError>;

	/// Stores a blob at `path` and returns its download URL.
	async fn upload_blob(
		&self,
		path: &str,
		data: Bytes,
		content_type: Option<String>,
	) -> Result<String, RemoteError>;

	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Factory signature every remote backend provides.
pub type RemoteFactory = fn(&toml::Value) -> Result<Box<dyn RemoteInterface>, RemoteError>;

pub trait RemoteRegistry: ImplementationRegistry<Factory = RemoteFactory> {}

pub fn get_all_implementations() -> Vec<(&'static str, RemoteFactory)> {
	use implementations::{http, memory};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
	name.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
				c
			} else {
				'_'
			}
		})
		.collect()
}

/// Blob storage path for an order file.
pub fn storage_path(order_id: &str, file_name: &str) -> String {
	format!(
		"{}/{}/{}",
		ORDERS_COLLECTION,
		order_id,
		sanitize_file_name(file_name)
	)
}

/// Resolves a file reference to a path inside `upload_dir`.
///
/// Accepts `file://` URIs and plain paths. Relative paths are taken relative
/// to `upload_dir`; absolute ones must already lie inside it. Parent
/// components and other URI schemes are rejected. The check is lexical, see
/// [`RemoteService::read_source`] for the one that follows symlinks.
pub fn resolve_upload_path(upload_dir: &Path, uri: &str) -> Result<PathBuf, RemoteError> {
	let raw = uri.strip_prefix("file://").unwrap_or(uri);
	if raw.is_empty() || raw.contains("://") {
		return Err(RemoteError::InvalidSource(uri.to_string()));
	}

	let path = Path::new(raw);
	if path
		.components()
		.any(|component| matches!(component, Component::ParentDir))
	{
		return Err(RemoteError::InvalidSource(uri.to_string()));
	}

	let resolved = if path.is_absolute() {
		path.to_path_buf()
	} else {
		upload_dir.join(path)
	};
	if !resolved.starts_with(upload_dir) {
		return Err(RemoteError::InvalidSource(uri.to_string()));
	}
	Ok(resolved)
}

/// Called after each uploaded file with (uploaded, total).
pub type UploadProgress<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// Result of a successful remote submission.
#[derive(Debug, Clone)]
pub struct RemoteSubmission {
	pub document_id: String,
	pub files: Vec<UploadedFile>,
}

/// Order workflow over a remote backend.
pub struct RemoteService {
	backend: Box<dyn RemoteInterface>,
	/// Only files under this directory are ever read.
	upload_dir: PathBuf,
}

impl RemoteService {
	pub fn new(backend: Box<dyn RemoteInterface>, upload_dir: impl Into<PathBuf>) -> Self {
		Self {
			backend,
			upload_dir: upload_dir.into(),
		}
	}

	/// Creates the order document with status `pending`.
	///
	/// Fails closed: the order type, every contact field, the branch id, the
	/// configuration and at least one file description are required, and
	/// nothing is written when one is missing.
	pub async fn create_order_doc(&self, order: &NewOrderDocument) -> Result<String, RemoteError> {
		let order_type = order
			.order_type
			.ok_or_else(|| RemoteError::MissingField("orderType".into()))?;
		let user_info = order
			.user_info
			.as_ref()
			.ok_or_else(|| RemoteError::MissingField("userInfo".into()))?;
		if let Some(blank) = user_info.blank_fields().first() {
			return Err(RemoteError::MissingField(format!("userInfo.{}", blank)));
		}
		if order.branch_id.trim().is_empty() {
			return Err(RemoteError::MissingField("branchId".into()));
		}
		let config = order
			.config
			.clone()
			.ok_or_else(|| RemoteError::MissingField("config".into()))?;
		if order.files_metadata.is_empty() {
			return Err(RemoteError::MissingField("filesMetadata".into()));
		}

		let now = current_rfc3339();
		let document = OrderDocument {
			status: RemoteOrderStatus::Pending,
			created_at: now.clone(),
			updated_at: now,
			branch_id: order.branch_id.clone(),
			order_type,
			user_info: user_info.clone(),
			delivery: order.delivery.clone(),
			notes: order.notes.clone(),
			config,
			files_metadata: order.files_metadata.clone(),
			estimated_total: order.estimated_total,
			files: None,
		};
		let value = serde_json::to_value(&document)
			.map_err(|e| RemoteError::Serialization(e.to_string()))?;

		let id = self
			.backend
			.create_document(ORDERS_COLLECTION, value)
			.await?;
		tracing::info!(document_id = %truncate_id(&id), "Created remote order document");
		Ok(id)
	}

	/// Uploads the files in order, one at a time, under `orders/<id>/`.
	pub async fn upload_order_files(
		&self,
		order_id: &str,
		files: &[PickedFile],
		on_progress: Option<UploadProgress<'_>>,
	) -> Result<Vec<UploadedFile>, RemoteError> {
		let mut uploaded = Vec::with_capacity(files.len());

		for (index, file) in files.iter().enumerate() {
			let path = storage_path(order_id, &file.name);
			let data = self.read_source(&file.uri).await?;
			let download_url = self
				.backend
				.upload_blob(&path, data, file.mime_type.clone())
				.await?;

			uploaded.push(UploadedFile {
				name: file.name.clone(),
				mime_type: file.mime_type.clone(),
				size: file.size,
				pages: file.pages,
				storage_path: path,
				download_url,
			});

			if let Some(progress) = on_progress {
				progress(index + 1, files.len());
			}
		}

		Ok(uploaded)
	}

	/// Creates the document, uploads the files and records them on it.
	///
	/// If anything after document creation fails, the document is marked
	/// `upload_failed`, or deleted when even that update fails, and the
	/// original error is returned.
	pub async fn submit_order(
		&self,
		order: &NewOrderDocument,
		files: &[PickedFile],
		on_progress: Option<UploadProgress<'_>>,
	) -> Result<RemoteSubmission, RemoteError> {
		let document_id = self.create_order_doc(order).await?;

		match self
			.upload_and_attach(&document_id, files, on_progress)
			.await
		{
			Ok(files) => Ok(RemoteSubmission { document_id, files }),
			Err(upload_err) => {
				self.abandon_order_doc(&document_id).await;
				Err(upload_err)
			},
		}
	}

	async fn upload_and_attach(
		&self,
		document_id: &str,
		files: &[PickedFile],
		on_progress: Option<UploadProgress<'_>>,
	) -> Result<Vec<UploadedFile>, RemoteError> {
		let uploaded = self
			.upload_order_files(document_id, files, on_progress)
			.await?;
		let records = serde_json::to_value(&uploaded)
			.map_err(|e| RemoteError::Serialization(e.to_string()))?;
		self.backend
			.update_document(
				ORDERS_COLLECTION,
				document_id,
				serde_json::json!({
					"files": records,
					"status": RemoteOrderStatus::Pending,
					"updatedAt": current_rfc3339(),
				}),
			)
			.await?;
		Ok(uploaded)
	}

	async fn abandon_order_doc(&self, document_id: &str) {
		let marked = self
			.backend
			.update_document(
				ORDERS_COLLECTION,
				document_id,
				serde_json::json!({
					"status": RemoteOrderStatus::UploadFailed,
					"updatedAt": current_rfc3339(),
				}),
			)
			.await;

		match marked {
			Ok(()) => {
				tracing::warn!(document_id = %truncate_id(document_id), "Marked remote order as upload_failed");
			},
			Err(e) => {
				tracing::warn!(
					document_id = %truncate_id(document_id),
					error = %e,
					"Could not mark remote order as failed, deleting it"
				);
				if let Err(e) = self
					.backend
					.delete_document(ORDERS_COLLECTION, document_id)
					.await
				{
					tracing::warn!(document_id = %truncate_id(document_id), error = %e, "Failed to delete remote order");
				}
			},
		}
	}

	/// Reads a file from the upload directory.
	///
	/// Both paths are canonicalized before the containment check, so a
	/// symlink inside the directory cannot point out of it.
	pub async fn read_source(&self, uri: &str) -> Result<Bytes, RemoteError> {
		let path = resolve_upload_path(&self.upload_dir, uri)?;

		let root = tokio::fs::canonicalize(&self.upload_dir)
			.await
			.map_err(|e| RemoteError::Upload(format!("Upload directory unavailable: {}", e)))?;
		let real = tokio::fs::canonicalize(&path)
			.await
			.map_err(|e| RemoteError::Upload(format!("Failed to read {}: {}", uri, e)))?;
		if !real.starts_with(&root) {
			tracing::warn!(uri = %uri, "File source escapes the upload directory");
			return Err(RemoteError::InvalidSource(uri.to_string()));
		}

		tokio::fs::read(&real)
			.await
			.map(Bytes::from)
			.map_err(|e| RemoteError::Upload(format!("Failed to read {}: {}", uri, e)))
	}
}
