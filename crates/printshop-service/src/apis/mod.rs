pub mod catalog;
pub mod drafts;
pub mod error;
pub mod orders;
pub mod uploads;
