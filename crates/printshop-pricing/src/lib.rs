//! Placeholder pricing for printshop orders.
//!
//! Totals are computed in `f64` from the configuration a draft holds. Inputs
//! that are missing or not finite fall back to fixed defaults instead of
//! failing, so an estimate is always available. Amounts are rounded to cents
//! with [`round_money`] only when they are displayed.

pub mod catalog;

use printshop_types::{DeliveryInfo, OrderConfiguration};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Delivery fee parameters: a flat fee covering the first miles, then a
/// per-mile rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPricing {
	pub base_fee: f64,
	pub included_miles: f64,
	pub per_mile: f64,
}

impl Default for DeliveryPricing {
	fn default() -> Self {
		Self {
			base_fee: 10.0,
			included_miles: 20.0,
			per_mile: 0.6,
		}
	}
}

/// Returns `value` if it is finite, otherwise `fallback`.
pub fn safe_number(value: f64, fallback: f64) -> f64 {
	if value.is_finite() {
		value
	} else {
		fallback
	}
}

/// Reads a number out of loosely typed JSON input.
///
/// Numbers and numeric strings are accepted; anything else, including empty
/// strings and non-finite results, yields `fallback`.
pub fn coerce_number(value: &serde_json::Value, fallback: f64) -> f64 {
	let parsed = match value {
		serde_json::Value::Number(n) => n.as_f64(),
		serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
		_ => None,
	};
	parsed.map_or(fallback, |n| safe_number(n, fallback))
}

/// Delivery fee for a distance in miles.
///
/// Zero, negative and non-finite distances cost nothing. Up to the included
/// miles the base fee applies; beyond that each extra mile adds `per_mile`.
pub fn delivery_fee(miles: f64, pricing: &DeliveryPricing) -> f64 {
	if !miles.is_finite() || miles <= 0.0 {
		return 0.0;
	}
	if miles <= pricing.included_miles {
		return pricing.base_fee;
	}
	pricing.base_fee + (miles - pricing.included_miles) * pricing.per_mile
}

/// Estimated product total for a configuration, before delivery.
///
/// Photos cost quantity times unit price. Prints cost pages times copies
/// times the per-page price, where unknown page counts count as one page.
/// Posters are quoted at the counter and estimate to zero.
pub fn estimated_total(configuration: &OrderConfiguration) -> f64 {
	match configuration {
		OrderConfiguration::Photo(photo) => {
			let quantity = safe_number(f64::from(photo.quantity), 1.0);
			let price = safe_number(photo.price, 0.0);
			quantity * price
		},
		OrderConfiguration::Print(print) => {
			let pages = print.total_pages.map_or(1.0, f64::from);
			let copies = safe_number(f64::from(print.copies), 1.0);
			let unit = safe_number(print.unit_price, 0.0);
			pages * copies * unit
		},
		OrderConfiguration::Poster(_) => 0.0,
	}
}

/// Estimated total plus the delivery fee when delivery is requested.
pub fn confirmed_total(estimated: f64, delivery: &DeliveryInfo) -> f64 {
	let estimated = safe_number(estimated, 0.0);
	if delivery.enabled {
		estimated + safe_number(delivery.fee, 0.0)
	} else {
		estimated
	}
}

/// Rounds an amount to cents, half away from zero. Non-finite amounts
/// become zero.
pub fn round_money(amount: f64) -> Decimal {
	Decimal::from_f64(safe_number(amount, 0.0))
		.unwrap_or(Decimal::ZERO)
		.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount for display, e.g. `$10.00 USD`.
pub fn format_money(amount: f64) -> String {
	format!("${:.2} USD", round_money(amount))
}
