//! The order draft and the store that owns it.
//!
//! A [`DraftStore`] holds exactly one [`OrderDraft`] for one customer session.
//! Every mutation goes through the store so that the draft's invariants hold
//! at all times: the configuration always matches the order type, the
//! delivery fee is always derived from the distance, and the status only
//! moves forward.

use crate::state::is_valid_draft_transition;
use printshop_pricing::{delivery_fee, safe_number, DeliveryPricing};
use printshop_types::{
	DeliveryInfo, DraftStatus, LocationInfo, OrderConfiguration, OrderFlow, OrderType, PickedFile,
	UserInfo,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Errors returned by draft mutations. A failed mutation leaves the draft
/// unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
	#[error("Invalid contact info: {0}")]
	InvalidUserInfo(String),
	#[error("Configuration for {found} does not match order flow {expected}")]
	ConfigurationMismatch { expected: OrderFlow, found: OrderFlow },
	#[error("Too many files: {count} attached, at most {max} allowed")]
	TooManyFiles { count: usize, max: usize },
	#[error("Unsupported file type: {0}")]
	UnsupportedFile(String),
	#[error("Invalid status transition from {from} to {to}")]
	InvalidTransition { from: DraftStatus, to: DraftStatus },
}

/// The in-progress order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
	pub order_type: Option<OrderType>,
	pub user_info: Option<UserInfo>,
	pub selected_location: Option<LocationInfo>,
	pub configuration: Option<OrderConfiguration>,
	pub files: Vec<PickedFile>,
	pub notes: String,
	pub delivery: DeliveryInfo,
	pub status: DraftStatus,
	pub order_id: Option<String>,
}

impl OrderDraft {
	/// Flow selected by the order type, if one is set.
	pub fn flow(&self) -> Option<OrderFlow> {
		self.order_type.map(|t| t.flow())
	}

	/// The configuration, but only when it belongs to the selected flow.
	pub fn matching_configuration(&self) -> Option<&OrderConfiguration> {
		let flow = self.flow()?;
		self.configuration.as_ref().filter(|c| c.flow() == flow)
	}

	/// Sum of the page counts reported for the attached files.
	pub fn total_pages(&self) -> u32 {
		self.files
			.iter()
			.filter_map(|f| f.pages)
			.fold(0u32, |acc, pages| acc.saturating_add(pages))
	}
}

/// Session-scoped owner of a single draft.
#[derive(Debug, Clone)]
pub struct DraftStore {
	id: String,
	draft: OrderDraft,
	pricing: DeliveryPricing,
	max_files: usize,
}

impl DraftStore {
	pub fn new(id: impl Into<String>, pricing: DeliveryPricing, max_files: usize) -> Self {
		Self {
			id: id.into(),
			draft: OrderDraft::default(),
			pricing,
			max_files,
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn draft(&self) -> &OrderDraft {
		&self.draft
	}

	pub fn pricing(&self) -> &DeliveryPricing {
		&self.pricing
	}

	/// Selects the order type. A configuration for a different flow is
	/// dropped.
	pub fn set_order_type(&mut self, order_type: OrderType) {
		self.draft.order_type = Some(order_type);
		if self
			.draft
			.configuration
			.as_ref()
			.is_some_and(|c| c.flow() != order_type.flow())
		{
			tracing::debug!(draft_id = %self.id, order_type = %order_type, "Dropped configuration for previous flow");
			self.draft.configuration = None;
		}
	}

	/// Sets the contact details after trimming and validating them.
	pub fn set_user_info(&mut self, user_info: UserInfo) -> Result<(), DraftError> {
		let user_info = user_info.normalized();
		user_info
			.validate()
			.map_err(|e| DraftError::InvalidUserInfo(e.to_string()))?;
		self.draft.user_info = Some(user_info);
		Ok(())
	}

	pub fn set_location(&mut self, location: LocationInfo) {
		self.draft.selected_location = Some(location);
	}

	/// Sets the configuration for the selected flow.
	///
	/// A print configuration picks up the page total of the files already
	/// attached.
	pub fn set_configuration(
		&mut self,
		mut configuration: OrderConfiguration,
	) -> Result<(), DraftError> {
		if let Some(expected) = self.draft.flow() {
			if configuration.flow() != expected {
				return Err(DraftError::ConfigurationMismatch {
					expected,
					found: configuration.flow(),
				});
			}
		}
		configuration.apply_total_pages(self.draft.total_pages());
		self.draft.configuration = Some(configuration);
		Ok(())
	}

	pub fn clear_configuration(&mut self) {
		self.draft.configuration = None;
	}

	/// Replaces the attached files and recomputes the print page total.
	pub fn attach_files(&mut self, files: Vec<PickedFile>) -> Result<(), DraftError> {
		if files.len() > self.max_files {
			return Err(DraftError::TooManyFiles {
				count: files.len(),
				max: self.max_files,
			});
		}
		if let Some(file) = files.iter().find(|f| !f.has_allowed_extension()) {
			return Err(DraftError::UnsupportedFile(file.name.clone()));
		}

		self.draft.files = files;
		let total_pages = self.draft.total_pages();
		if let Some(configuration) = self.draft.configuration.as_mut() {
			configuration.apply_total_pages(total_pages);
		}
		Ok(())
	}

	pub fn set_notes(&mut self, notes: impl Into<String>) {
		self.draft.notes = notes.into();
	}

	/// Records the delivery request; the fee is derived from `miles`.
	pub fn set_delivery_request(&mut self, enabled: bool, address: impl Into<String>, miles: f64) {
		let miles = safe_number(miles, 0.0);
		let fee = if enabled {
			delivery_fee(miles, &self.pricing)
		} else {
			0.0
		};
		self.draft.delivery = DeliveryInfo {
			enabled,
			address: address.into(),
			miles,
			fee,
		};
	}

	/// Moves the draft to `status`. Backward moves are rejected.
	pub fn set_status(&mut self, status: DraftStatus) -> Result<(), DraftError> {
		let from = self.draft.status;
		if !is_valid_draft_transition(from, status) {
			return Err(DraftError::InvalidTransition { from, to: status });
		}
		self.draft.status = status;
		Ok(())
	}

	pub fn set_order_id(&mut self, order_id: Option<String>) {
		self.draft.order_id = order_id;
	}

	/// Records a completed submission on the draft.
	pub fn mark_submitted(&mut self, order_id: impl Into<String>) -> Result<(), DraftError> {
		self.set_status(DraftStatus::Submitted)?;
		self.draft.order_id = Some(order_id.into());
		Ok(())
	}

	/// Restores the initial empty draft.
	pub fn reset(&mut self) {
		self.draft = OrderDraft::default();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use printshop_pricing::catalog::photo_config;
	use printshop_types::{Binding, PaperSize, PrintConfig, PrintType};

	fn store() -> DraftStore {
		DraftStore::new("draft-1", DeliveryPricing::default(), 5)
	}

	fn file(name: &str, pages: Option<u32>) -> PickedFile {
		PickedFile {
			name: name.to_string(),
			uri: format!("file:///tmp/{}", name),
			size: Some(1024),
			mime_type: None,
			pages,
		}
	}

	fn print_config() -> OrderConfiguration {
		OrderConfiguration::Print(
			PrintConfig::build(PaperSize::Letter, 2, PrintType::Bw, Binding::None).unwrap(),
		)
	}

	#[test]
	fn test_configuration_must_match_order_type() {
		let mut store = store();
		store.set_order_type(OrderType::Photo);
		let result = store.set_configuration(print_config());
		assert_eq!(
			result,
			Err(DraftError::ConfigurationMismatch {
				expected: OrderFlow::Photo,
				found: OrderFlow::Print,
			})
		);
		assert!(store.draft().configuration.is_none());
	}

	#[test]
	fn test_changing_order_type_drops_configuration() {
		let mut store = store();
		store.set_order_type(OrderType::Document);
		store.set_configuration(print_config()).unwrap();

		store.set_order_type(OrderType::Document);
		assert!(store.draft().configuration.is_some());

		store.set_order_type(OrderType::Poster);
		assert!(store.draft().configuration.is_none());
	}

	#[test]
	fn test_attach_files_recomputes_pages() {
		let mut store = store();
		store.set_order_type(OrderType::Document);
		store.set_configuration(print_config()).unwrap();

		store
			.attach_files(vec![file("a.pdf", Some(3)), file("b.docx", Some(4))])
			.unwrap();
		match store.draft().configuration.as_ref() {
			Some(OrderConfiguration::Print(p)) => assert_eq!(p.total_pages, Some(7)),
			other => panic!("unexpected configuration: {:?}", other),
		}

		// Files without page counts keep the previous total.
		store.attach_files(vec![file("c.png", None)]).unwrap();
		match store.draft().configuration.as_ref() {
			Some(OrderConfiguration::Print(p)) => assert_eq!(p.total_pages, Some(7)),
			other => panic!("unexpected configuration: {:?}", other),
		}
	}

	#[test]
	fn test_configuration_set_after_files_uses_page_total() {
		let mut store = store();
		store.set_order_type(OrderType::Document);
		store.attach_files(vec![file("a.pdf", Some(12))]).unwrap();
		store.set_configuration(print_config()).unwrap();
		match store.draft().configuration.as_ref() {
			Some(OrderConfiguration::Print(p)) => assert_eq!(p.total_pages, Some(12)),
			other => panic!("unexpected configuration: {:?}", other),
		}
	}

	#[test]
	fn test_attach_files_limits() {
		let mut store = DraftStore::new("d", DeliveryPricing::default(), 2);
		let too_many = vec![file("a.pdf", None), file("b.pdf", None), file("c.pdf", None)];
		assert_eq!(
			store.attach_files(too_many),
			Err(DraftError::TooManyFiles { count: 3, max: 2 })
		);
		assert_eq!(
			store.attach_files(vec![file("virus.exe", None)]),
			Err(DraftError::UnsupportedFile("virus.exe".into()))
		);
		assert!(store.draft().files.is_empty());
	}

	#[test]
	fn test_user_info_is_validated() {
		let mut store = store();
		let bad = UserInfo::new("Al", "123", "not-an-email");
		assert!(matches!(
			store.set_user_info(bad),
			Err(DraftError::InvalidUserInfo(_))
		));
		assert!(store.draft().user_info.is_none());

		store
			.set_user_info(UserInfo {
				full_name: " Ana Ruiz ".into(),
				phone: "+50688889999".into(),
				email: "ana@example.com".into(),
			})
			.unwrap();
		assert_eq!(store.draft().user_info.as_ref().unwrap().full_name, "Ana Ruiz");
	}

	#[test]
	fn test_delivery_fee_is_derived() {
		let mut store = store();
		store.set_delivery_request(true, "Calle 1", 25.0);
		assert!((store.draft().delivery.fee - 13.0).abs() < 1e-9);

		store.set_delivery_request(true, "Calle 1", f64::NAN);
		assert_eq!(store.draft().delivery.miles, 0.0);
		assert_eq!(store.draft().delivery.fee, 0.0);

		store.set_delivery_request(false, "", 50.0);
		assert_eq!(store.draft().delivery.fee, 0.0);
	}

	#[test]
	fn test_status_moves_forward() {
		let mut store = store();
		assert!(matches!(
			store.set_status(DraftStatus::Completed),
			Err(DraftError::InvalidTransition { .. })
		));
		store.mark_submitted("P247-2025-000001").unwrap();
		assert_eq!(store.draft().status, DraftStatus::Submitted);
		assert_eq!(store.draft().order_id.as_deref(), Some("P247-2025-000001"));
		assert!(store.set_status(DraftStatus::Draft).is_err());
		assert!(store.mark_submitted("again").is_ok());
	}

	#[test]
	fn test_reset_restores_empty_draft() {
		let mut store = store();
		store.set_order_type(OrderType::Photo);
		store
			.set_configuration(OrderConfiguration::Photo(photo_config("4R", 2, None).unwrap()))
			.unwrap();
		store.set_notes("sin bordes");
		store.reset();
		assert_eq!(store.draft(), &OrderDraft::default());
		assert_eq!(store.id(), "draft-1");
	}
}
