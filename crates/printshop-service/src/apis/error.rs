//! API error type and its JSON body.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use crate::drafts::RegistryError;
use printshop_core::{DraftError, HistoryError, SubmissionError};
use printshop_types::VariantError;
use serde::Serialize;
use std::fmt;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
	/// Seconds after which a retry may succeed.
	#[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
	pub retry_after: Option<u64>,
}

#[derive(Debug)]
pub enum ApiError {
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	NotFound {
		error_type: String,
		message: String,
	},
	Conflict {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
	UnprocessableEntity {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	ServiceUnavailable {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
	InternalServerError {
		error_type: String,
		message: String,
	},
}

impl ApiError {
	pub fn bad_request(error_type: &str, message: impl Into<String>) -> Self {
		Self::BadRequest {
			error_type: error_type.to_string(),
			message: message.into(),
			details: None,
		}
	}

	pub fn draft_not_found(id: &str) -> Self {
		Self::NotFound {
			error_type: "DRAFT_NOT_FOUND".to_string(),
			message: format!("Draft {} not found", id),
		}
	}

	pub fn order_not_found(id: &str) -> Self {
		Self::NotFound {
			error_type: "ORDER_NOT_FOUND".to_string(),
			message: format!("Order {} not found", id),
		}
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
			ApiError::Conflict { .. } => StatusCode::CONFLICT,
			ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
			ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
			ApiError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			ApiError::BadRequest {
				error_type,
				message,
				details,
			}
			| ApiError::UnprocessableEntity {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
				retry_after: None,
			},
			ApiError::Conflict {
				error_type,
				message,
				retry_after,
			}
			| ApiError::ServiceUnavailable {
				error_type,
				message,
				retry_after,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
				retry_after: *retry_after,
			},
			ApiError::NotFound {
				error_type,
				message,
			}
			| ApiError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
				retry_after: None,
			},
		}
	}
}

impl fmt::Display for ApiError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let response = self.to_error_response();
		write!(f, "{}: {}", response.error, response.message)
	}
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		(self.status_code(), Json(self.to_error_response())).into_response()
	}
}

impl From<DraftError> for ApiError {
	fn from(err: DraftError) -> Self {
		match err {
			DraftError::ConfigurationMismatch { .. } => ApiError::UnprocessableEntity {
				error_type: "CONFIGURATION_MISMATCH".to_string(),
				message: err.to_string(),
				details: None,
			},
			DraftError::InvalidTransition { .. } => ApiError::Conflict {
				error_type: "INVALID_TRANSITION".to_string(),
				message: err.to_string(),
				retry_after: None,
			},
			DraftError::InvalidUserInfo(_) => ApiError::bad_request("INVALID_USER_INFO", err.to_string()),
			DraftError::TooManyFiles { .. } | DraftError::UnsupportedFile(_) => {
				ApiError::bad_request("INVALID_FILES", err.to_string())
			},
		}
	}
}

impl From<VariantError> for ApiError {
	fn from(err: VariantError) -> Self {
		ApiError::bad_request("INVALID_CONFIGURATION", err.to_string())
	}
}

impl From<SubmissionError> for ApiError {
	fn from(err: SubmissionError) -> Self {
		match &err {
			SubmissionError::NotReady(missing) => ApiError::UnprocessableEntity {
				error_type: "DRAFT_NOT_READY".to_string(),
				message: err.to_string(),
				details: Some(serde_json::json!({ "missing": missing })),
			},
			SubmissionError::AlreadyInFlight(_) => ApiError::Conflict {
				error_type: "SUBMISSION_IN_PROGRESS".to_string(),
				message: err.to_string(),
				retry_after: Some(1),
			},
			SubmissionError::AlreadySubmitted(_) => ApiError::Conflict {
				error_type: "ALREADY_SUBMITTED".to_string(),
				message: err.to_string(),
				retry_after: None,
			},
			SubmissionError::LocalPersistence(_) => ApiError::ServiceUnavailable {
				error_type: "PERSISTENCE_FAILED".to_string(),
				message: err.to_string(),
				retry_after: Some(5),
			},
		}
	}
}

impl From<RegistryError> for ApiError {
	fn from(err: RegistryError) -> Self {
		ApiError::ServiceUnavailable {
			error_type: "TOO_MANY_DRAFTS".to_string(),
			message: err.to_string(),
			retry_after: Some(60),
		}
	}
}

impl From<HistoryError> for ApiError {
	fn from(err: HistoryError) -> Self {
		match &err {
			HistoryError::NotFound(id) => ApiError::order_not_found(id),
			HistoryError::InvalidTransition { .. } => ApiError::Conflict {
				error_type: "INVALID_TRANSITION".to_string(),
				message: err.to_string(),
				retry_after: None,
			},
			HistoryError::Storage(_) => ApiError::InternalServerError {
				error_type: "STORAGE_ERROR".to_string(),
				message: err.to_string(),
			},
		}
	}
}
