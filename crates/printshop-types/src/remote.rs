//! Remote order document schema.
//!
//! One document is created per submitted order in the remote document
//! database. Field names follow the camelCase layout shared with the
//! fulfillment back office.

use crate::order::{DeliveryInfo, OrderFlow, UserInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an order document in the remote database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteOrderStatus {
	Pending,
	InProgress,
	Completed,
	Cancelled,
	/// Set when file upload failed after the document was created.
	UploadFailed,
}

impl RemoteOrderStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			RemoteOrderStatus::Pending => "pending",
			RemoteOrderStatus::InProgress => "in_progress",
			RemoteOrderStatus::Completed => "completed",
			RemoteOrderStatus::Cancelled => "cancelled",
			RemoteOrderStatus::UploadFailed => "upload_failed",
		}
	}
}

impl fmt::Display for RemoteOrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// File description stored before any upload happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pages: Option<u32>,
}

/// A file that was uploaded to blob storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub mime_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pages: Option<u32>,
	pub storage_path: String,
	pub download_url: String,
}

/// Everything needed to create a remote order document.
///
/// Fields are optional here because the remote service performs its own
/// required-field checks before writing anything.
#[derive(Debug, Clone, Default)]
pub struct NewOrderDocument {
	pub order_type: Option<OrderFlow>,
	pub user_info: Option<UserInfo>,
	pub branch_id: String,
	pub delivery: DeliveryInfo,
	pub notes: String,
	pub config: Option<serde_json::Value>,
	pub files_metadata: Vec<FileMetadata>,
	pub estimated_total: f64,
}

/// Order document as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
	pub status: RemoteOrderStatus,
	pub created_at: String,
	pub updated_at: String,
	pub branch_id: String,
	pub order_type: OrderFlow,
	pub user_info: UserInfo,
	pub delivery: DeliveryInfo,
	pub notes: String,
	pub config: serde_json::Value,
	pub files_metadata: Vec<FileMetadata>,
	pub estimated_total: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub files: Option<Vec<UploadedFile>>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_document_layout() {
		let doc = OrderDocument {
			status: RemoteOrderStatus::Pending,
			created_at: "2025-03-01T10:00:00Z".into(),
			updated_at: "2025-03-01T10:00:00Z".into(),
			branch_id: "denver-001".into(),
			order_type: OrderFlow::Photo,
			user_info: UserInfo::new("Ana", "5551234", "ana@example.com"),
			delivery: DeliveryInfo::default(),
			notes: String::new(),
			config: serde_json::json!({ "sizeCode": "4R" }),
			files_metadata: vec![FileMetadata {
				name: "a.jpg".into(),
				size: Some(10),
				mime_type: None,
				pages: None,
			}],
			estimated_total: 5.0,
			files: None,
		};
		let json = serde_json::to_value(&doc).unwrap();
		assert_eq!(json["branchId"], "denver-001");
		assert_eq!(json["orderType"], "photo");
		assert_eq!(json["userInfo"]["fullName"], "Ana");
		assert_eq!(json["filesMetadata"][0]["name"], "a.jpg");
		assert!(json["filesMetadata"][0].get("mimeType").is_none());
		assert!(json.get("files").is_none());
		assert_eq!(
			serde_json::to_value(RemoteOrderStatus::UploadFailed).unwrap(),
			"upload_failed"
		);
	}
}
