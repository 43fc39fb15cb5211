//! Local order history endpoints.

use crate::apis::error::ApiError;
use crate::server::AppState;
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use printshop_types::{OrderRecord, RecordStatus};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
	pub status: RecordStatus,
}

/// GET /api/orders, newest first.
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderRecord>>, ApiError> {
	Ok(Json(state.engine.history().list().await?))
}

/// GET /api/orders/{id}
pub async fn get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<OrderRecord>, ApiError> {
	state
		.engine
		.history()
		.find(&id)
		.await?
		.map(Json)
		.ok_or_else(|| ApiError::order_not_found(&id))
}

/// PUT /api/orders/{id}/status
pub async fn update_order_status(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<StatusRequest>,
) -> Result<Json<OrderRecord>, ApiError> {
	Ok(Json(
		state
			.engine
			.history()
			.update_status(&id, request.status)
			.await?,
	))
}

/// DELETE /api/orders
///
/// Wipes the local history together with the order counter.
pub async fn clear_orders(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
	state.engine.history().clear().await?;
	Ok(StatusCode::NO_CONTENT)
}
