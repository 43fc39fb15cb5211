//! Status transition rules.
//!
//! Drafts and history records only ever move forward. Each table maps a
//! status to the statuses it may move to; terminal statuses map to an empty
//! set. Setting a status to its current value is always accepted and treated
//! as a no-op by callers.

use once_cell::sync::Lazy;
use printshop_types::{DraftStatus, RecordStatus};
use std::collections::{HashMap, HashSet};

static DRAFT_TRANSITIONS: Lazy<HashMap<DraftStatus, HashSet<DraftStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(DraftStatus::Draft, HashSet::from([DraftStatus::Submitted]));
	m.insert(
		DraftStatus::Submitted,
		HashSet::from([
			DraftStatus::Pending,
			DraftStatus::Completed,
			DraftStatus::Cancelled,
		]),
	);
	m.insert(
		DraftStatus::Pending,
		HashSet::from([DraftStatus::Completed, DraftStatus::Cancelled]),
	);
	m.insert(DraftStatus::Completed, HashSet::new()); // terminal
	m.insert(DraftStatus::Cancelled, HashSet::new()); // terminal
	m
});

static RECORD_TRANSITIONS: Lazy<HashMap<RecordStatus, HashSet<RecordStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		RecordStatus::Pending,
		HashSet::from([RecordStatus::Completed, RecordStatus::Cancelled]),
	);
	m.insert(RecordStatus::Completed, HashSet::new());
	m.insert(RecordStatus::Cancelled, HashSet::new());
	m
});

/// Checks a draft status change. Same-status changes are valid.
pub fn is_valid_draft_transition(from: DraftStatus, to: DraftStatus) -> bool {
	from == to
		|| DRAFT_TRANSITIONS
			.get(&from)
			.is_some_and(|allowed| allowed.contains(&to))
}

/// Checks a history record status change. Same-status changes are valid.
pub fn is_valid_record_transition(from: RecordStatus, to: RecordStatus) -> bool {
	from == to
		|| RECORD_TRANSITIONS
			.get(&from)
			.is_some_and(|allowed| allowed.contains(&to))
}
