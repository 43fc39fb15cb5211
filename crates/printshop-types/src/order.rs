//! Order model for the printshop wizard.
//!
//! Defines the draft-facing value types (order type, contact info, location,
//! picked files, delivery request), the draft and history statuses, and the
//! compact record kept in the local order history.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// The kind of product the customer is ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
	Document,
	Photo,
	Poster,
}

impl OrderType {
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderType::Document => "document",
			OrderType::Photo => "photo",
			OrderType::Poster => "poster",
		}
	}

	/// Returns the configuration flow used for this order type.
	///
	/// Documents are configured through the print flow; photos and posters
	/// have flows of their own.
	pub fn flow(&self) -> OrderFlow {
		match self {
			OrderType::Document => OrderFlow::Print,
			OrderType::Photo => OrderFlow::Photo,
			OrderType::Poster => OrderFlow::Poster,
		}
	}
}

impl fmt::Display for OrderType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"document" => Ok(Self::Document),
			"photo" => Ok(Self::Photo),
			"poster" => Ok(Self::Poster),
			other => Err(format!("unknown order type '{}'", other)),
		}
	}
}

/// Configuration flow selected by the order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderFlow {
	Print,
	Photo,
	Poster,
}

impl OrderFlow {
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderFlow::Print => "print",
			OrderFlow::Photo => "photo",
			OrderFlow::Poster => "poster",
		}
	}
}

impl fmt::Display for OrderFlow {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Contact details for the person placing the order.
///
/// Values are trimmed on construction. The validation rules mirror the
/// contact screen: name of at least three characters, phone of at least
/// seven, and an email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
	#[validate(length(min = 3, message = "full name must have at least 3 characters"))]
	pub full_name: String,
	#[validate(length(min = 7, message = "phone must have at least 7 characters"))]
	pub phone: String,
	#[validate(email(message = "email address is not valid"))]
	pub email: String,
}

impl UserInfo {
	pub fn new(
		full_name: impl Into<String>,
		phone: impl Into<String>,
		email: impl Into<String>,
	) -> Self {
		Self {
			full_name: full_name.into().trim().to_string(),
			phone: phone.into().trim().to_string(),
			email: email.into().trim().to_string(),
		}
	}

	/// Returns a copy with all fields trimmed.
	pub fn normalized(&self) -> Self {
		Self::new(&*self.full_name, &*self.phone, &*self.email)
	}

	/// Names of the fields that are empty after trimming.
	pub fn blank_fields(&self) -> Vec<&'static str> {
		let mut blank = Vec::new();
		if self.full_name.trim().is_empty() {
			blank.push("fullName");
		}
		if self.phone.trim().is_empty() {
			blank.push("phone");
		}
		if self.email.trim().is_empty() {
			blank.push("email");
		}
		blank
	}
}

/// A fulfillment branch the customer picks up from (or is delivered from).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
	pub id: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub whatsapp: Option<String>,
}

/// A file chosen for the order, referenced by its source URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedFile {
	pub name: String,
	pub uri: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pages: Option<u32>,
}

/// Extensions accepted by the file picker.
pub const ALLOWED_FILE_EXTENSIONS: &[&str] =
	&["pdf", "doc", "docx", "jpg", "jpeg", "png", "tiff", "psd"];

impl PickedFile {
	/// Lowercased extension of the file name, if any.
	pub fn extension(&self) -> Option<String> {
		self.name
			.rsplit_once('.')
			.map(|(_, ext)| ext.to_ascii_lowercase())
			.filter(|ext| !ext.is_empty())
	}

	pub fn has_allowed_extension(&self) -> bool {
		self.extension()
			.map(|ext| ALLOWED_FILE_EXTENSIONS.contains(&ext.as_str()))
			.unwrap_or(false)
	}
}

/// Delivery request attached to a draft. The fee is always derived from
/// the distance and is never set directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryInfo {
	pub enabled: bool,
	pub address: String,
	pub miles: f64,
	pub fee: f64,
}

/// Lifecycle of a draft held by a draft store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
	#[default]
	Draft,
	Submitted,
	Pending,
	Completed,
	Cancelled,
}

impl DraftStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			DraftStatus::Draft => "draft",
			DraftStatus::Submitted => "submitted",
			DraftStatus::Pending => "pending",
			DraftStatus::Completed => "completed",
			DraftStatus::Cancelled => "cancelled",
		}
	}
}

impl fmt::Display for DraftStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Status of an order in the local history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
	#[default]
	Pending,
	Completed,
	Cancelled,
}

impl RecordStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			RecordStatus::Pending => "pending",
			RecordStatus::Completed => "completed",
			RecordStatus::Cancelled => "cancelled",
		}
	}
}

impl fmt::Display for RecordStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for RecordStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(Self::Pending),
			"completed" => Ok(Self::Completed),
			"cancelled" => Ok(Self::Cancelled),
			other => Err(format!("unknown order status '{}'", other)),
		}
	}
}

/// Compact summary of a submitted order kept in the local history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
	pub id: String,
	/// RFC3339 creation time.
	pub created_at: String,
	pub flow: OrderFlow,
	pub location_name: String,
	pub total: f64,
	pub status: RecordStatus,
}
