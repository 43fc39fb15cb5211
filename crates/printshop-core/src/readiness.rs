//! Readiness checks for moving a draft to the summary and to submission.
//!
//! All functions here are pure. [`missing_for_summary`] lists every missing
//! or invalid field in a fixed order, and the boolean predicates are defined
//! in terms of it so the two never disagree.

use crate::draft::OrderDraft;
use printshop_types::{DraftStatus, OrderFlow};
use serde::Serialize;
use std::fmt;

/// A required field that is missing or invalid, in checking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingField {
	OrderType,
	UserInfo,
	Location,
	Configuration,
	Files,
	DeliveryAddress,
	DeliveryMiles,
}

impl MissingField {
	pub fn as_str(&self) -> &'static str {
		match self {
			MissingField::OrderType => "orderType",
			MissingField::UserInfo => "userInfo",
			MissingField::Location => "location",
			MissingField::Configuration => "configuration",
			MissingField::Files => "files",
			MissingField::DeliveryAddress => "deliveryAddress",
			MissingField::DeliveryMiles => "deliveryMiles",
		}
	}
}

impl fmt::Display for MissingField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Whether a flow needs attached files before it can be summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRequirement {
	Required,
	Optional,
}

impl FileRequirement {
	/// Prints and posters are produced from customer files. Photo orders are
	/// catalog prints and may be submitted without attachments.
	pub fn for_flow(flow: OrderFlow) -> Self {
		match flow {
			OrderFlow::Print | OrderFlow::Poster => FileRequirement::Required,
			OrderFlow::Photo => FileRequirement::Optional,
		}
	}
}

/// Every missing or invalid field, in the fixed checking order.
pub fn missing_for_summary(draft: &OrderDraft) -> Vec<MissingField> {
	let mut missing = Vec::new();

	if draft.order_type.is_none() {
		missing.push(MissingField::OrderType);
	}
	if draft
		.user_info
		.as_ref()
		.is_none_or(|info| !info.blank_fields().is_empty())
	{
		missing.push(MissingField::UserInfo);
	}
	if draft
		.selected_location
		.as_ref()
		.is_none_or(|location| location.id.trim().is_empty())
	{
		missing.push(MissingField::Location);
	}
	if draft.matching_configuration().is_none() {
		missing.push(MissingField::Configuration);
	}

	// Without an order type the strictest rule applies.
	let files = draft
		.flow()
		.map_or(FileRequirement::Required, FileRequirement::for_flow);
	if files == FileRequirement::Required && draft.files.is_empty() {
		missing.push(MissingField::Files);
	}

	if draft.delivery.enabled {
		if draft.delivery.address.trim().is_empty() {
			missing.push(MissingField::DeliveryAddress);
		}
		let miles = draft.delivery.miles;
		if !miles.is_finite() || miles <= 0.0 {
			missing.push(MissingField::DeliveryMiles);
		}
	}

	missing
}

pub fn is_ready_for_summary(draft: &OrderDraft) -> bool {
	missing_for_summary(draft).is_empty()
}

/// Ready for the summary and not submitted yet.
pub fn is_ready_to_submit(draft: &OrderDraft) -> bool {
	draft.status == DraftStatus::Draft && is_ready_for_summary(draft)
}
