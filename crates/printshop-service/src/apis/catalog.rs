use axum::response::Json;
use printshop_pricing::catalog::{catalog, Catalog};

/// GET /api/catalog
pub async fn get_catalog() -> Json<Catalog> {
	Json(catalog())
}
