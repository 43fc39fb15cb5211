//! Dual-write submission of a confirmed draft.
//!
//! Submitting writes the order to the remote order database when one is
//! configured and always writes a record to the local history. The remote
//! write is best effort: when it fails the order continues under a locally
//! generated id, and the returned [`SyncOutcome`] says which path was taken.
//! A failed local write fails the whole submission and leaves the draft as
//! it was.

use crate::draft::{DraftStore, OrderDraft};
use crate::engine::event_bus::EventBus;
use crate::history::OrderHistory;
use crate::id_generator::IdGenerator;
use crate::readiness::{missing_for_summary, MissingField};
use dashmap::DashSet;
use printshop_pricing::{confirmed_total, estimated_total};
use printshop_remote::{RemoteService, UploadProgress};
use printshop_types::{
	current_rfc3339, truncate_id, DraftStatus, FileMetadata, NewOrderDocument, OrderConfiguration,
	OrderEvent, OrderRecord, RecordStatus, SubmissionEvent,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum SubmissionError {
	#[error("Submission already in progress for draft {0}")]
	AlreadyInFlight(String),
	#[error("Draft is not ready, missing: {}", join_missing(.0))]
	NotReady(Vec<MissingField>),
	#[error("Draft {0} was already submitted")]
	AlreadySubmitted(String),
	#[error("Local persistence failed: {0}")]
	LocalPersistence(String),
}

fn join_missing(fields: &[MissingField]) -> String {
	fields
		.iter()
		.map(MissingField::as_str)
		.collect::<Vec<_>>()
		.join(", ")
}

/// Which persistence path an accepted submission took.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum SyncOutcome {
	/// The remote document exists and all files were uploaded to it.
	#[serde(rename_all = "camelCase")]
	RemoteConfirmed {
		document_id: String,
		uploaded_files: usize,
	},
	/// Only the local history has the order.
	LocalOnly { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
	/// Canonical id: the remote document id, or a local one.
	pub order_id: String,
	/// Estimated total plus delivery.
	pub total: f64,
	pub sync: SyncOutcome,
}

/// Marks a draft as being submitted. The mark is removed when the guard is
/// dropped.
pub struct InFlightGuard<'a> {
	drafts: &'a DashSet<String>,
	draft_id: String,
}

impl InFlightGuard<'_> {
	pub fn draft_id(&self) -> &str {
		&self.draft_id
	}
}

impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.drafts.remove(&self.draft_id);
	}
}

pub struct SubmissionEngine {
	history: Arc<OrderHistory>,
	ids: Arc<IdGenerator>,
	remote: Option<Arc<RemoteService>>,
	event_bus: EventBus,
	in_flight: DashSet<String>,
}

impl SubmissionEngine {
	pub fn new(
		history: Arc<OrderHistory>,
		ids: Arc<IdGenerator>,
		remote: Option<Arc<RemoteService>>,
		event_bus: EventBus,
	) -> Self {
		Self {
			history,
			ids,
			remote,
			event_bus,
			in_flight: DashSet::new(),
		}
	}

	/// Submits the store's draft and marks it submitted on success.
	pub async fn submit(&self, store: &mut DraftStore) -> Result<SubmissionOutcome, SubmissionError> {
		let outcome = self.submit_draft(store.id(), store.draft()).await?;
		store
			.mark_submitted(outcome.order_id.clone())
			.map_err(|_| SubmissionError::AlreadySubmitted(store.id().to_string()))?;
		Ok(outcome)
	}

	/// Persists a snapshot of a draft without touching the draft itself.
	///
	/// A second call for the same draft id while the first is running is
	/// rejected with `AlreadyInFlight`.
	pub async fn submit_draft(
		&self,
		draft_id: &str,
		draft: &OrderDraft,
	) -> Result<SubmissionOutcome, SubmissionError> {
		let guard = self.begin(draft_id)?;
		self.submit_guarded(&guard, draft).await
	}

	/// Claims `draft_id` for submission.
	///
	/// Callers that keep the draft elsewhere take the guard before reading
	/// the draft and keep it until the outcome has been applied with
	/// [`DraftStore::mark_submitted`], so no other submission can read the
	/// draft in between.
	pub fn begin(&self, draft_id: &str) -> Result<InFlightGuard<'_>, SubmissionError> {
		if !self.in_flight.insert(draft_id.to_string()) {
			tracing::warn!(draft_id = %truncate_id(draft_id), "Submission already in progress");
			return Err(SubmissionError::AlreadyInFlight(draft_id.to_string()));
		}
		Ok(InFlightGuard {
			drafts: &self.in_flight,
			draft_id: draft_id.to_string(),
		})
	}

	/// Whether a submission for `draft_id` currently holds a guard.
	pub fn is_in_flight(&self, draft_id: &str) -> bool {
		self.in_flight.contains(draft_id)
	}

	/// Submits `draft` under a guard obtained from [`begin`](Self::begin).
	#[instrument(skip_all, fields(draft_id = %truncate_id(guard.draft_id())))]
	pub async fn submit_guarded(
		&self,
		guard: &InFlightGuard<'_>,
		draft: &OrderDraft,
	) -> Result<SubmissionOutcome, SubmissionError> {
		let draft_id = guard.draft_id();

		if draft.status != DraftStatus::Draft {
			return Err(self.reject(
				draft_id,
				SubmissionError::AlreadySubmitted(draft_id.to_string()),
			));
		}
		let missing = missing_for_summary(draft);
		if !missing.is_empty() {
			return Err(self.reject(draft_id, SubmissionError::NotReady(missing)));
		}
		let Some(configuration) = draft.matching_configuration() else {
			return Err(self.reject(
				draft_id,
				SubmissionError::NotReady(vec![MissingField::Configuration]),
			));
		};

		let estimated = estimated_total(configuration);
		let total = confirmed_total(estimated, &draft.delivery);

		let sync = self
			.sync_remote(draft_id, draft, configuration, estimated)
			.await;
		let order_id = match &sync {
			SyncOutcome::RemoteConfirmed { document_id, .. } => document_id.clone(),
			SyncOutcome::LocalOnly { .. } => self.ids.generate().await,
		};

		let record = OrderRecord {
			id: order_id.clone(),
			created_at: current_rfc3339(),
			flow: configuration.flow(),
			location_name: draft
				.selected_location
				.as_ref()
				.map(|location| location.name.clone())
				.unwrap_or_default(),
			total,
			status: RecordStatus::Pending,
		};
		if let Err(e) = self.history.save(record).await {
			tracing::error!(order_id = %order_id, error = %e, "Failed to write order record");
			return Err(self.reject(
				draft_id,
				SubmissionError::LocalPersistence(e.to_string()),
			));
		}

		tracing::info!(
			order_id = %order_id,
			flow = %configuration.flow(),
			total = total,
			remote = matches!(sync, SyncOutcome::RemoteConfirmed { .. }),
			"Order submitted"
		);
		self.event_bus
			.publish(OrderEvent::Submission(SubmissionEvent::Completed {
				draft_id: draft_id.to_string(),
				order_id: order_id.clone(),
				flow: configuration.flow(),
				total,
			}))
			.ok();

		Ok(SubmissionOutcome {
			order_id,
			total,
			sync,
		})
	}

	fn reject(&self, draft_id: &str, error: SubmissionError) -> SubmissionError {
		tracing::info!(reason = %error, "Submission rejected");
		self.event_bus
			.publish(OrderEvent::Submission(SubmissionEvent::Rejected {
				draft_id: draft_id.to_string(),
				reason: error.to_string(),
			}))
			.ok();
		error
	}

	/// One attempt at the remote write. Failures are logged and reported as
	/// `LocalOnly`, never returned as errors.
	async fn sync_remote(
		&self,
		draft_id: &str,
		draft: &OrderDraft,
		configuration: &OrderConfiguration,
		estimated: f64,
	) -> SyncOutcome {
		let Some(remote) = &self.remote else {
			return SyncOutcome::LocalOnly {
				reason: "remote sync is not configured".to_string(),
			};
		};

		let config = match configuration.payload() {
			Ok(config) => config,
			Err(e) => return self.degraded(draft_id, format!("Serialization error: {}", e)),
		};
		let document = NewOrderDocument {
			order_type: Some(configuration.flow()),
			user_info: draft.user_info.clone(),
			branch_id: draft
				.selected_location
				.as_ref()
				.map(|location| location.id.clone())
				.unwrap_or_default(),
			delivery: draft.delivery.clone(),
			notes: draft.notes.clone(),
			config: Some(config),
			files_metadata: draft
				.files
				.iter()
				.map(|file| FileMetadata {
					name: file.name.clone(),
					size: file.size,
					mime_type: file.mime_type.clone(),
					pages: file.pages,
				})
				.collect(),
			estimated_total: estimated,
		};

		let progress: UploadProgress<'_> = &|uploaded: usize, total: usize| {
			tracing::debug!(uploaded, total, "Uploaded order file");
		};
		match remote
			.submit_order(&document, &draft.files, Some(progress))
			.await
		{
			Ok(submission) => {
				let uploaded_files = submission.files.len();
				self.event_bus
					.publish(OrderEvent::Submission(SubmissionEvent::RemoteConfirmed {
						draft_id: draft_id.to_string(),
						document_id: submission.document_id.clone(),
						uploaded_files,
					}))
					.ok();
				SyncOutcome::RemoteConfirmed {
					document_id: submission.document_id,
					uploaded_files,
				}
			},
			Err(e) => self.degraded(draft_id, e.to_string()),
		}
	}

	fn degraded(&self, draft_id: &str, reason: String) -> SyncOutcome {
		tracing::warn!(error = %reason, "Remote sync failed, continuing with local order");
		self.event_bus
			.publish(OrderEvent::Submission(SubmissionEvent::RemoteDegraded {
				draft_id: draft_id.to_string(),
				reason: reason.clone(),
			}))
			.ok();
		SyncOutcome::LocalOnly { reason }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{broken_storage, memory_storage, photo_store, print_store};
	use async_trait::async_trait;
	use bytes::Bytes;
	use mockall::mock;
	use printshop_remote::implementations::memory::{FailurePoint, MemoryRemote};
	use printshop_remote::{RemoteError, RemoteInterface};
	use printshop_storage::StorageService;
	use printshop_types::{ConfigSchema, OrderFlow, PickedFile, RemoteOrderStatus};
	use std::io::Write;
	use tempfile::NamedTempFile;
	use tokio::sync::Notify;

	mock! {
		pub Remote {}

		#[async_trait]
		impl RemoteInterface for Remote {
			async fn create_document(
				&self,
				collection: &str,
				document: serde_json::Value,
			) -> Result<String, RemoteError>;
			async fn update_document(
				&self,
				collection: &str,
				id: &str,
				patch: serde_json::Value,
			) -> Result<(), RemoteError>;
			async fn delete_document(&self, collection: &str, id: &str) -> Result<(), RemoteError>;
			async fn upload_blob(
				&self,
				path: &str,
				data: Bytes,
				content_type: Option<String>,
			) -> Result<String, RemoteError>;
			fn config_schema(&self) -> Box<dyn ConfigSchema>;
		}
	}

	/// Remote whose document creation waits until released.
	struct GatedRemote {
		entered: Arc<Notify>,
		release: Arc<Notify>,
	}

	#[async_trait]
	impl RemoteInterface for GatedRemote {
		async fn create_document(
			&self,
			_collection: &str,
			_document: serde_json::Value,
		) -> Result<String, RemoteError> {
			self.entered.notify_one();
			self.release.notified().await;
			Ok("gated-doc".to_string())
		}

		async fn update_document(
			&self,
			_collection: &str,
			_id: &str,
			_patch: serde_json::Value,
		) -> Result<(), RemoteError> {
			Ok(())
		}

		async fn delete_document(&self, _collection: &str, _id: &str) -> Result<(), RemoteError> {
			Ok(())
		}

		async fn upload_blob(
			&self,
			path: &str,
			_data: Bytes,
			_content_type: Option<String>,
		) -> Result<String, RemoteError> {
			Ok(format!("gated://{}", path))
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			MemoryRemote::new().config_schema()
		}
	}

	struct Harness {
		engine: Arc<SubmissionEngine>,
		history: Arc<OrderHistory>,
		events: tokio::sync::broadcast::Receiver<OrderEvent>,
	}

	fn harness(storage: Arc<StorageService>, remote: Option<Box<dyn RemoteInterface>>) -> Harness {
		let bus = EventBus::new(64);
		let events = bus.subscribe();
		let history = Arc::new(OrderHistory::new(storage.clone(), "shop", bus.clone()));
		let ids = Arc::new(IdGenerator::new(storage, "shop", "P247", false));
		let remote =
			remote.map(|backend| Arc::new(RemoteService::new(backend, std::env::temp_dir())));
		Harness {
			engine: Arc::new(SubmissionEngine::new(history.clone(), ids, remote, bus)),
			history,
			events,
		}
	}

	fn temp_pdf(pages: u32) -> (NamedTempFile, PickedFile) {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(b"%PDF-1.4 test").unwrap();
		let picked = PickedFile {
			name: "Tesis final.pdf".to_string(),
			uri: format!("file://{}", file.path().display()),
			size: Some(13),
			mime_type: Some("application/pdf".to_string()),
			pages: Some(pages),
		};
		(file, picked)
	}

	fn is_local_id(id: &str) -> bool {
		id.strip_prefix("P247-")
			.is_some_and(|n| n.len() == 6 && n.chars().all(|c| c.is_ascii_digit()))
	}

	#[tokio::test]
	async fn test_photo_order_without_remote() {
		let h = harness(memory_storage(), None);
		let mut store = photo_store("draft-1");

		let outcome = h.engine.submit(&mut store).await.unwrap();
		assert_eq!(outcome.order_id, "P247-000001");
		assert!((outcome.total - 10.0).abs() < 1e-9);
		assert!(matches!(outcome.sync, SyncOutcome::LocalOnly { .. }));

		assert_eq!(store.draft().status, DraftStatus::Submitted);
		assert_eq!(store.draft().order_id.as_deref(), Some("P247-000001"));

		let records = h.history.list().await.unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].flow, OrderFlow::Photo);
		assert_eq!(records[0].status, RecordStatus::Pending);
		assert_eq!(records[0].location_name, "Printing24/7 — San José Centro");
	}

	#[tokio::test]
	async fn test_total_includes_delivery() {
		let h = harness(memory_storage(), None);
		let mut store = photo_store("draft-1");
		store.set_delivery_request(true, "Avenida Central 10", 25.0);

		let outcome = h.engine.submit(&mut store).await.unwrap();
		assert!((outcome.total - 23.0).abs() < 1e-9);
		assert!((h.history.list().await.unwrap()[0].total - 23.0).abs() < 1e-9);
	}

	#[tokio::test]
	async fn test_remote_confirmed_uses_document_id() {
		let remote = MemoryRemote::new();
		let h = harness(memory_storage(), Some(Box::new(remote.clone())));
		let (_file, picked) = temp_pdf(4);
		let mut store = print_store("draft-2", vec![picked]);

		let outcome = h.engine.submit(&mut store).await.unwrap();
		let SyncOutcome::RemoteConfirmed {
			document_id,
			uploaded_files,
		} = &outcome.sync
		else {
			panic!("expected remote confirmation, got {:?}", outcome.sync);
		};
		assert_eq!(&outcome.order_id, document_id);
		assert_eq!(*uploaded_files, 1);
		// 4 pages x 2 copies x 0.10
		assert!((outcome.total - 0.8).abs() < 1e-9);

		let document = remote.document(document_id).await.unwrap();
		assert_eq!(document["status"], "pending");
		assert_eq!(document["orderType"], "print");
		assert_eq!(document["branchId"], "denver-001");
		assert_eq!(document["config"]["totalPages"], 4);
		assert_eq!(document["filesMetadata"][0]["name"], "Tesis final.pdf");
		assert_eq!(document["files"].as_array().unwrap().len(), 1);

		let path = format!("orders/{}/Tesis_final.pdf", document_id);
		assert_eq!(
			remote.blob(&path).await.unwrap(),
			Bytes::from_static(b"%PDF-1.4 test")
		);
		assert_eq!(h.history.find(document_id).await.unwrap().unwrap().total, outcome.total);
	}

	#[tokio::test]
	async fn test_remote_failure_degrades_to_local_id() {
		let mut h = harness(
			memory_storage(),
			Some(Box::new(MemoryRemote::with_failure(FailurePoint::Create))),
		);
		let (_file, picked) = temp_pdf(1);
		let mut store = print_store("draft-3", vec![picked]);

		let outcome = h.engine.submit(&mut store).await.unwrap();
		assert!(is_local_id(&outcome.order_id), "got {}", outcome.order_id);
		assert!(matches!(outcome.sync, SyncOutcome::LocalOnly { .. }));
		assert_eq!(store.draft().status, DraftStatus::Submitted);
		assert!(h.history.find(&outcome.order_id).await.unwrap().is_some());

		let mut saw_degraded = false;
		while let Ok(event) = h.events.try_recv() {
			if matches!(
				event,
				OrderEvent::Submission(SubmissionEvent::RemoteDegraded { .. })
			) {
				saw_degraded = true;
			}
		}
		assert!(saw_degraded);
	}

	#[tokio::test]
	async fn test_upload_failure_marks_document() {
		let remote = MemoryRemote::with_failure(FailurePoint::Upload);
		let h = harness(memory_storage(), Some(Box::new(remote.clone())));
		let (_file, picked) = temp_pdf(2);
		let mut store = print_store("draft-4", vec![picked]);

		let outcome = h.engine.submit(&mut store).await.unwrap();
		assert!(is_local_id(&outcome.order_id));

		let ids = remote.document_ids().await;
		assert_eq!(ids.len(), 1);
		let document = remote.document(&ids[0]).await.unwrap();
		assert_eq!(document["status"], RemoteOrderStatus::UploadFailed.as_str());
	}

	#[tokio::test]
	async fn test_photo_without_files_stays_local() {
		let remote = MemoryRemote::new();
		let h = harness(memory_storage(), Some(Box::new(remote.clone())));
		let mut store = photo_store("draft-5");

		let outcome = h.engine.submit(&mut store).await.unwrap();
		match &outcome.sync {
			SyncOutcome::LocalOnly { reason } => assert!(reason.contains("filesMetadata")),
			other => panic!("unexpected sync outcome {:?}", other),
		}
		assert_eq!(remote.document_count().await, 0);
	}

	#[tokio::test]
	async fn test_failed_create_makes_no_further_calls() {
		let mut mock = MockRemote::new();
		mock.expect_create_document()
			.times(1)
			.returning(|_, _| Err(RemoteError::Network("connection refused".into())));
		mock.expect_upload_blob().never();
		mock.expect_update_document().never();
		mock.expect_delete_document().never();

		let h = harness(memory_storage(), Some(Box::new(mock)));
		let (_file, picked) = temp_pdf(1);
		let mut store = print_store("draft-6", vec![picked]);

		let outcome = h.engine.submit(&mut store).await.unwrap();
		assert_eq!(outcome.order_id, "P247-000001");
	}

	#[tokio::test]
	async fn test_document_deleted_when_it_cannot_be_marked_failed() {
		let mut mock = MockRemote::new();
		mock.expect_create_document()
			.times(1)
			.returning(|_, _| Ok("doc-9".to_string()));
		mock.expect_upload_blob()
			.times(1)
			.returning(|_, _, _| Err(RemoteError::Upload("quota exceeded".into())));
		mock.expect_update_document()
			.times(1)
			.returning(|_, _, _| Err(RemoteError::Network("connection reset".into())));
		mock.expect_delete_document()
			.withf(|collection, id| collection.to_string() == "orders" && id.to_string() == "doc-9")
			.times(1)
			.returning(|_, _| Ok(()));

		let h = harness(memory_storage(), Some(Box::new(mock)));
		let (_file, picked) = temp_pdf(1);
		let mut store = print_store("draft-7", vec![picked]);

		let outcome = h.engine.submit(&mut store).await.unwrap();
		assert!(is_local_id(&outcome.order_id));
	}

	#[tokio::test]
	async fn test_not_ready_persists_nothing() {
		let h = harness(memory_storage(), None);
		let mut store = photo_store("draft-8");
		store.set_delivery_request(true, "", 15.0);
		let before = store.draft().clone();

		match h.engine.submit(&mut store).await {
			Err(SubmissionError::NotReady(missing)) => {
				assert_eq!(missing, vec![MissingField::DeliveryAddress]);
			},
			other => panic!("unexpected result {:?}", other),
		}
		assert_eq!(store.draft(), &before);
		assert!(h.history.list().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_second_submission_is_rejected() {
		let h = harness(memory_storage(), None);
		let mut store = photo_store("draft-9");
		h.engine.submit(&mut store).await.unwrap();

		assert!(matches!(
			h.engine.submit(&mut store).await,
			Err(SubmissionError::AlreadySubmitted(_))
		));
		assert_eq!(h.history.list().await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_local_failure_leaves_draft_unchanged() {
		let h = harness(broken_storage(), None);
		let mut store = photo_store("draft-10");

		assert!(matches!(
			h.engine.submit(&mut store).await,
			Err(SubmissionError::LocalPersistence(_))
		));
		assert_eq!(store.draft().status, DraftStatus::Draft);
		assert!(store.draft().order_id.is_none());
	}

	#[tokio::test]
	async fn test_guard_is_released_on_drop() {
		let h = harness(memory_storage(), None);
		assert!(!h.engine.is_in_flight("draft-13"));
		let guard = h.engine.begin("draft-13").unwrap();
		assert_eq!(guard.draft_id(), "draft-13");
		assert!(h.engine.is_in_flight("draft-13"));
		assert!(matches!(
			h.engine.begin("draft-13"),
			Err(SubmissionError::AlreadyInFlight(_))
		));
		drop(guard);
		assert!(!h.engine.is_in_flight("draft-13"));
		assert!(h.engine.begin("draft-13").is_ok());
	}

	#[tokio::test]
	async fn test_concurrent_submission_of_same_draft_is_rejected() {
		let entered = Arc::new(Notify::new());
		let release = Arc::new(Notify::new());
		let h = harness(
			memory_storage(),
			Some(Box::new(GatedRemote {
				entered: entered.clone(),
				release: release.clone(),
			})),
		);
		let (_file, picked) = temp_pdf(1);
		let store = print_store("draft-11", vec![picked]);
		let draft = store.draft().clone();

		let engine = h.engine.clone();
		let first_draft = draft.clone();
		let first =
			tokio::spawn(async move { engine.submit_draft("draft-11", &first_draft).await });

		entered.notified().await;
		assert!(matches!(
			h.engine.submit_draft("draft-11", &draft).await,
			Err(SubmissionError::AlreadyInFlight(_))
		));
		// A different draft is not blocked.
		let other = photo_store("draft-12");
		assert!(h.engine.submit_draft("draft-12", other.draft()).await.is_ok());

		release.notify_one();
		let outcome = first.await.unwrap().unwrap();
		assert_eq!(outcome.order_id, "gated-doc");
		assert_eq!(h.history.list().await.unwrap().len(), 2);
	}
}
