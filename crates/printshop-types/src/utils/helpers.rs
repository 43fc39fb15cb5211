//! Time helpers.

use chrono::{Datelike, SecondsFormat, Utc};

/// Milliseconds since the UNIX epoch, or 0 if the clock is before it.
pub fn current_millis() -> u64 {
	u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Current UTC time as an RFC3339 string with millisecond precision.
pub fn current_rfc3339() -> String {
	Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn current_year() -> i32 {
	Utc::now().year()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rfc3339_parses_back() {
		let now = current_rfc3339();
		assert!(chrono::DateTime::parse_from_rfc3339(&now).is_ok());
		assert!(now.ends_with('Z'));
		assert!(current_millis() > 0);
		assert!(current_year() >= 2024);
	}
}
