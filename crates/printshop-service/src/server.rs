//! HTTP server for the printshop order API.
//!
//! All routes live under `/api`. Drafts are kept in memory for the lifetime
//! of the process; submitted orders go to the engine's history.

use crate::apis;
use crate::drafts::DraftRegistry;
use axum::{
	routing::{get, post, put},
	Router,
};
use printshop_config::ApiConfig;
use printshop_core::OrderEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<OrderEngine>,
	/// Open drafts by id.
	pub drafts: Arc<DraftRegistry>,
}

impl AppState {
	pub fn new(engine: Arc<OrderEngine>, api_config: &ApiConfig) -> Self {
		Self {
			engine,
			drafts: Arc::new(DraftRegistry::new(
				api_config.max_drafts,
				Duration::from_secs(api_config.draft_idle_secs),
			)),
		}
	}
}

pub fn router(state: AppState) -> Router {
	use apis::drafts::*;
	use apis::orders::*;

	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/catalog", get(apis::catalog::get_catalog))
				.route("/uploads/{name}", post(apis::uploads::upload_file))
				.route("/drafts", post(create_draft))
				.route("/drafts/{id}", get(get_draft).delete(reset_draft))
				.route("/drafts/{id}/order-type", put(set_order_type))
				.route("/drafts/{id}/user-info", put(set_user_info))
				.route("/drafts/{id}/location", put(set_location))
				.route(
					"/drafts/{id}/configuration",
					put(set_configuration).delete(clear_configuration),
				)
				.route("/drafts/{id}/files", put(attach_files))
				.route("/drafts/{id}/notes", put(set_notes))
				.route("/drafts/{id}/delivery", put(set_delivery))
				.route("/drafts/{id}/summary", get(get_summary))
				.route("/drafts/{id}/submit", post(submit_draft))
				.route("/orders", get(list_orders).delete(clear_orders))
				.route("/orders/{id}", get(get_order))
				.route("/orders/{id}/status", put(update_order_status)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<OrderEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(AppState::new(engine, &api_config));

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Printshop API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}
