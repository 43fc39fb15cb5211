//! Core order workflow for the printshop service.
//!
//! This crate holds the draft model that the order wizard mutates, the
//! readiness checks that gate submission, and the submission engine that
//! persists a confirmed draft to the local history and, when configured, to
//! the remote order database. The [`OrderEngine`] ties these together and is
//! built from configuration by the [`OrderEngineBuilder`].

pub mod builder;
pub mod draft;
pub mod engine;
pub mod history;
pub mod id_generator;
pub mod readiness;
pub mod state;
pub mod submission;

pub use builder::{BuilderError, OrderEngineBuilder, OrderFactories};
pub use draft::{DraftError, DraftStore, OrderDraft};
pub use engine::{event_bus::EventBus, EngineError, OrderEngine};
pub use history::{HistoryError, OrderHistory};
pub use id_generator::IdGenerator;
pub use readiness::{
	is_ready_for_summary, is_ready_to_submit, missing_for_summary, FileRequirement, MissingField,
};
pub use submission::{
	InFlightGuard, SubmissionEngine, SubmissionError, SubmissionOutcome, SyncOutcome,
};

#[cfg(test)]
pub(crate) mod test_support;
