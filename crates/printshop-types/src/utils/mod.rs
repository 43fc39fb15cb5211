//! Utility functions shared across the order system.

pub mod formatting;
pub mod helpers;

pub use formatting::truncate_id;
pub use helpers::{current_millis, current_rfc3339, current_year};
