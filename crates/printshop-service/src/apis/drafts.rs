//! Draft endpoints: the steps of the order wizard.
//!
//! Each mutation returns the updated [`DraftView`] so a client can show
//! what is still missing without a second request.

use crate::apis::error::ApiError;
use crate::server::AppState;
use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::Json,
};
use printshop_core::{
	is_ready_for_summary, is_ready_to_submit, missing_for_summary, DraftStore, MissingField,
	OrderDraft, SubmissionOutcome, SyncOutcome,
};
use printshop_pricing::{
	catalog::{find_location, photo_config, poster_config, PosterSize},
	coerce_number, confirmed_total, estimated_total, format_money,
};
use printshop_remote::resolve_upload_path;
use printshop_types::{
	check_quantity, Binding, OrderConfiguration, OrderFlow, OrderType, PaperSize, PickedFile,
	PrintConfig, PrintType, UserInfo, VariantError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
	pub id: String,
	pub draft: OrderDraft,
	pub missing: Vec<MissingField>,
	pub ready_for_summary: bool,
	pub ready_to_submit: bool,
}

impl DraftView {
	fn new(id: &str, draft: &OrderDraft) -> Self {
		Self {
			id: id.to_string(),
			draft: draft.clone(),
			missing: missing_for_summary(draft),
			ready_for_summary: is_ready_for_summary(draft),
			ready_to_submit: is_ready_to_submit(draft),
		}
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
	pub id: String,
	pub flow: Option<OrderFlow>,
	pub missing: Vec<MissingField>,
	pub ready_to_submit: bool,
	pub estimated_total: f64,
	pub delivery_fee: f64,
	pub confirmed_total: f64,
	pub display: SummaryDisplay,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDisplay {
	pub estimated_total: String,
	pub delivery_fee: String,
	pub confirmed_total: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
	#[serde(flatten)]
	pub outcome: SubmissionOutcome,
	pub total_display: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTypeRequest {
	pub order_type: OrderType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
	pub location_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FilesRequest {
	pub files: Vec<PickedFile>,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
	pub notes: String,
}

/// Delivery request as typed by the customer. Miles may arrive as a number
/// or as text.
#[derive(Debug, Deserialize)]
pub struct DeliveryRequest {
	pub enabled: bool,
	#[serde(default)]
	pub address: String,
	#[serde(default)]
	pub miles: serde_json::Value,
}

/// Configuration for one flow. Quantities and prices may arrive as numbers
/// or as text.
#[derive(Debug, Deserialize)]
#[serde(tag = "flow", rename_all = "lowercase")]
pub enum ConfigurationRequest {
	#[serde(rename_all = "camelCase")]
	Print {
		paper: PaperSize,
		#[serde(default)]
		copies: serde_json::Value,
		print_type: PrintType,
		binding: Binding,
		#[serde(default)]
		unit_price: serde_json::Value,
	},
	#[serde(rename_all = "camelCase")]
	Photo {
		size_code: String,
		#[serde(default)]
		quantity: serde_json::Value,
		custom_width_in: Option<f64>,
		custom_height_in: Option<f64>,
	},
	#[serde(rename_all = "camelCase")]
	Poster {
		size: PosterSize,
		material_id: String,
		lamination_id: String,
	},
}

/// Reads a copy count or quantity. Unreadable input counts as one; the
/// result must still be within the allowed range.
fn quantity_from(value: &serde_json::Value) -> Result<u32, VariantError> {
	check_quantity(coerce_number(value, 1.0).trunc() as u32)
}

impl ConfigurationRequest {
	fn into_configuration(self) -> Result<OrderConfiguration, VariantError> {
		match self {
			ConfigurationRequest::Print {
				paper,
				copies,
				print_type,
				binding,
				unit_price,
			} => {
				let print = PrintConfig::build(paper, quantity_from(&copies)?, print_type, binding)?
					.with_unit_price(coerce_number(&unit_price, 0.0).max(0.0));
				Ok(OrderConfiguration::Print(print))
			},
			ConfigurationRequest::Photo {
				size_code,
				quantity,
				custom_width_in,
				custom_height_in,
			} => {
				let custom = custom_width_in.zip(custom_height_in);
				let photo = photo_config(&size_code, quantity_from(&quantity)?, custom)?;
				Ok(OrderConfiguration::Photo(photo))
			},
			ConfigurationRequest::Poster {
				size,
				material_id,
				lamination_id,
			} => Ok(OrderConfiguration::Poster(poster_config(
				&size,
				&material_id,
				&lamination_id,
			)?)),
		}
	}
}

/// Runs a mutation against a draft and returns the resulting view.
///
/// A draft whose submission is in flight is frozen. The check runs under the
/// draft's entry lock and submission claims its guard before reading the
/// draft, so a mutation either lands before that read or is refused.
fn mutate<F>(state: &AppState, id: &str, f: F) -> Result<Json<DraftView>, ApiError>
where
	F: FnOnce(&mut DraftStore) -> Result<(), ApiError>,
{
	let submission = state.engine.submission();
	state
		.drafts
		.update(id, |store| -> Result<DraftView, ApiError> {
			if submission.is_in_flight(id) {
				return Err(ApiError::Conflict {
					error_type: "SUBMISSION_IN_PROGRESS".to_string(),
					message: format!("Draft {} is being submitted", id),
					retry_after: Some(1),
				});
			}
			f(store)?;
			Ok(DraftView::new(store.id(), store.draft()))
		})
		.ok_or_else(|| ApiError::draft_not_found(id))?
		.map(Json)
}

/// POST /api/drafts
pub async fn create_draft(
	State(state): State<AppState>,
) -> Result<(StatusCode, Json<DraftView>), ApiError> {
	let id = state.drafts.create(&state.engine)?;
	tracing::debug!(draft_id = %id, "Draft opened");
	let view = state
		.drafts
		.read(&id, |store| DraftView::new(store.id(), store.draft()))
		.ok_or_else(|| ApiError::draft_not_found(&id))?;
	Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/drafts/{id}
pub async fn get_draft(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<DraftView>, ApiError> {
	state
		.drafts
		.read(&id, |store| DraftView::new(store.id(), store.draft()))
		.map(Json)
		.ok_or_else(|| ApiError::draft_not_found(&id))
}

/// DELETE /api/drafts/{id}
///
/// Starts the draft over; the id stays valid.
pub async fn reset_draft(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<DraftView>, ApiError> {
	mutate(&state, &id, |store| {
		store.reset();
		Ok(())
	})
}

/// PUT /api/drafts/{id}/order-type
pub async fn set_order_type(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<OrderTypeRequest>,
) -> Result<Json<DraftView>, ApiError> {
	mutate(&state, &id, |store| {
		store.set_order_type(request.order_type);
		Ok(())
	})
}

/// PUT /api/drafts/{id}/user-info
pub async fn set_user_info(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<UserInfo>,
) -> Result<Json<DraftView>, ApiError> {
	mutate(&state, &id, |store| {
		store.set_user_info(request).map_err(ApiError::from)
	})
}

/// PUT /api/drafts/{id}/location
pub async fn set_location(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<LocationRequest>,
) -> Result<Json<DraftView>, ApiError> {
	let location = find_location(&request.location_id).ok_or_else(|| {
		ApiError::bad_request(
			"UNKNOWN_LOCATION",
			format!("Unknown location: {}", request.location_id),
		)
	})?;
	mutate(&state, &id, |store| {
		store.set_location(location);
		Ok(())
	})
}

/// PUT /api/drafts/{id}/configuration
pub async fn set_configuration(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<ConfigurationRequest>,
) -> Result<Json<DraftView>, ApiError> {
	let configuration = request.into_configuration()?;
	mutate(&state, &id, |store| {
		store
			.set_configuration(configuration)
			.map_err(ApiError::from)
	})
}

/// DELETE /api/drafts/{id}/configuration
pub async fn clear_configuration(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<DraftView>, ApiError> {
	mutate(&state, &id, |store| {
		store.clear_configuration();
		Ok(())
	})
}

/// PUT /api/drafts/{id}/files
///
/// Every file must live in the upload directory; see `POST /api/uploads`.
pub async fn attach_files(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<FilesRequest>,
) -> Result<Json<DraftView>, ApiError> {
	let upload_dir = std::path::Path::new(&state.engine.config().orders.upload_dir);
	for file in &request.files {
		resolve_upload_path(upload_dir, &file.uri)
			.map_err(|e| ApiError::bad_request("INVALID_FILE_SOURCE", e.to_string()))?;
	}
	mutate(&state, &id, |store| {
		store.attach_files(request.files).map_err(ApiError::from)
	})
}

/// PUT /api/drafts/{id}/notes
pub async fn set_notes(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<NotesRequest>,
) -> Result<Json<DraftView>, ApiError> {
	mutate(&state, &id, |store| {
		store.set_notes(request.notes);
		Ok(())
	})
}

/// PUT /api/drafts/{id}/delivery
pub async fn set_delivery(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<DeliveryRequest>,
) -> Result<Json<DraftView>, ApiError> {
	let miles = coerce_number(&request.miles, 0.0);
	mutate(&state, &id, |store| {
		store.set_delivery_request(request.enabled, request.address, miles);
		Ok(())
	})
}

/// GET /api/drafts/{id}/summary
pub async fn get_summary(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<SummaryView>, ApiError> {
	state
		.drafts
		.read(&id, |store| summarize(store.id(), store.draft()))
		.map(Json)
		.ok_or_else(|| ApiError::draft_not_found(&id))
}

fn summarize(id: &str, draft: &OrderDraft) -> SummaryView {
	let estimated = draft.matching_configuration().map_or(0.0, estimated_total);
	let confirmed = confirmed_total(estimated, &draft.delivery);
	let fee = if draft.delivery.enabled {
		draft.delivery.fee
	} else {
		0.0
	};
	SummaryView {
		id: id.to_string(),
		flow: draft.flow(),
		missing: missing_for_summary(draft),
		ready_to_submit: is_ready_to_submit(draft),
		estimated_total: estimated,
		delivery_fee: fee,
		confirmed_total: confirmed,
		display: SummaryDisplay {
			estimated_total: format_money(estimated),
			delivery_fee: format_money(fee),
			confirmed_total: format_money(confirmed),
		},
	}
}

/// POST /api/drafts/{id}/submit
///
/// The in-flight guard is taken before the draft is read and held until the
/// draft is marked submitted, so two requests for the same draft can never
/// both pass the status check.
pub async fn submit_draft(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
	let submission = state.engine.submission();
	let guard = submission.begin(&id)?;

	let draft = state
		.drafts
		.read(&id, |store| store.draft().clone())
		.ok_or_else(|| ApiError::draft_not_found(&id))?;

	let outcome = submission.submit_guarded(&guard, &draft).await?;

	match state
		.drafts
		.update(&id, |store| store.mark_submitted(outcome.order_id.clone()))
	{
		Some(Ok(())) => {},
		Some(Err(e)) => {
			tracing::warn!(draft_id = %id, error = %e, "Draft could not be marked submitted");
		},
		None => {
			tracing::warn!(draft_id = %id, "Draft discarded during submission");
		},
	}
	drop(guard);

	if let SyncOutcome::LocalOnly { reason } = &outcome.sync {
		tracing::info!(order_id = %outcome.order_id, reason = %reason, "Order saved locally only");
	}

	let total_display = format_money(outcome.total);
	Ok((
		StatusCode::CREATED,
		Json(SubmitResponse {
			outcome,
			total_display,
		}),
	))
}
