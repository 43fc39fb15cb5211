//! Event types for order lifecycle notifications.
//!
//! Events flow through the engine's event bus so that other parts of the
//! service (logging, API listeners) can react to submissions and status
//! changes without coupling to the submission engine.

use crate::order::{OrderFlow, RecordStatus};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all order events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	Submission(SubmissionEvent),
	History(HistoryEvent),
}

/// Events emitted while a draft is being submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubmissionEvent {
	/// The remote document was created and every file uploaded.
	RemoteConfirmed {
		draft_id: String,
		document_id: String,
		uploaded_files: usize,
	},
	/// Remote sync failed; the order continues locally.
	RemoteDegraded { draft_id: String, reason: String },
	/// The order record was written to the local history.
	Completed {
		draft_id: String,
		order_id: String,
		flow: OrderFlow,
		total: f64,
	},
	/// Submission stopped before anything was persisted locally.
	Rejected { draft_id: String, reason: String },
}

/// Events emitted by the local order history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HistoryEvent {
	StatusChanged {
		order_id: String,
		from: RecordStatus,
		to: RecordStatus,
	},
	Cleared,
}
