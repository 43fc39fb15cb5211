//! File upload endpoint. Attached files must come from the upload directory,
//! so this is how a client gets them there.

use crate::apis::error::ApiError;
use crate::server::AppState;
use axum::{
	body::Bytes,
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use printshop_remote::sanitize_file_name;
use printshop_types::PickedFile;
use std::path::PathBuf;

/// POST /api/uploads/{name}
///
/// Stores the raw request body under a fresh name and returns the
/// [`PickedFile`] to attach. Its `uri` is relative to the upload directory.
pub async fn upload_file(
	Path(name): Path<String>,
	State(state): State<AppState>,
	body: Bytes,
) -> Result<(StatusCode, Json<PickedFile>), ApiError> {
	let mut file = PickedFile {
		name,
		uri: String::new(),
		size: Some(body.len() as u64),
		mime_type: None,
		pages: None,
	};
	if !file.has_allowed_extension() {
		return Err(ApiError::bad_request(
			"INVALID_FILES",
			format!("Unsupported file: {}", file.name),
		));
	}
	if body.is_empty() {
		return Err(ApiError::bad_request("INVALID_FILES", "Empty upload"));
	}

	let upload_dir = PathBuf::from(&state.engine.config().orders.upload_dir);
	let stored = format!(
		"{}-{}",
		uuid::Uuid::new_v4().simple(),
		sanitize_file_name(&file.name)
	);
	tokio::fs::create_dir_all(&upload_dir)
		.await
		.map_err(upload_failed)?;
	tokio::fs::write(upload_dir.join(&stored), &body)
		.await
		.map_err(upload_failed)?;

	tracing::debug!(name = %file.name, stored = %stored, bytes = body.len(), "Upload stored");
	file.uri = stored;
	Ok((StatusCode::CREATED, Json(file)))
}

fn upload_failed(err: std::io::Error) -> ApiError {
	tracing::error!(error = %err, "Failed to store upload");
	ApiError::InternalServerError {
		error_type: "UPLOAD_FAILED".to_string(),
		message: "Failed to store upload".to_string(),
	}
}
