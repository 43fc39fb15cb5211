//! Common types module for the printshop order system.
//!
//! This module defines the core data types shared by every printshop crate:
//! the order model, the per-flow configuration variants, the remote document
//! schema, events, storage keys and configuration validation primitives.

/// Per-flow configuration variants (print, photo, poster).
pub mod config_variant;
/// Event types published while drafts are submitted and orders change status.
pub mod events;
/// Order model: order types, statuses, contact info, files, delivery and history records.
pub mod order;
/// Self-registration trait for pluggable backend implementations.
pub mod registry;
/// Remote order document schema.
pub mod remote;
/// Storage types for managing persistent data.
pub mod storage;
/// Utility functions for formatting and time.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use config_variant::*;
pub use events::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use remote::*;
pub use storage::*;
pub use utils::{current_millis, current_rfc3339, current_year, truncate_id};
pub use validation::*;
