//! Flow-specific order configuration.
//!
//! A draft holds at most one configuration, tagged by the flow it belongs to.
//! Each variant is a closed record with its required fields spelled out, so a
//! configuration built for one flow can never be read as another.

use crate::order::OrderFlow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for copies and photo quantities.
pub const MAX_QUANTITY: u32 = 999;

/// Errors raised while building a configuration variant.
#[derive(Debug, Error, PartialEq)]
pub enum VariantError {
	#[error("Quantity must be between 1 and {max}, got {value}")]
	QuantityOutOfRange { value: u32, max: u32 },
	#[error("Unknown size: {0}")]
	UnknownSize(String),
	#[error("Unknown material: {0}")]
	UnknownMaterial(String),
	#[error("Unknown lamination: {0}")]
	UnknownLamination(String),
	#[error("Invalid dimensions: {0}")]
	InvalidDimensions(String),
}

/// Checks that a copy count or quantity is within `1..=MAX_QUANTITY`.
pub fn check_quantity(value: u32) -> Result<u32, VariantError> {
	if (1..=MAX_QUANTITY).contains(&value) {
		Ok(value)
	} else {
		Err(VariantError::QuantityOutOfRange {
			value,
			max: MAX_QUANTITY,
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperSize {
	Letter,
	Legal,
	A4,
	A3,
	Tabloid,
}

impl PaperSize {
	pub const ALL: [PaperSize; 5] = [
		PaperSize::Letter,
		PaperSize::Legal,
		PaperSize::A4,
		PaperSize::A3,
		PaperSize::Tabloid,
	];

	pub fn id(&self) -> &'static str {
		match self {
			PaperSize::Letter => "letter",
			PaperSize::Legal => "legal",
			PaperSize::A4 => "a4",
			PaperSize::A3 => "a3",
			PaperSize::Tabloid => "tabloid",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			PaperSize::Letter => "Carta (8.5\" × 11\")",
			PaperSize::Legal => "Legal (8.5\" × 14\")",
			PaperSize::A4 => "A4 (210mm × 297mm)",
			PaperSize::A3 => "A3 (297mm × 420mm)",
			PaperSize::Tabloid => "Tabloide (11\" × 17\")",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintType {
	Bw,
	Color,
	CardMatte,
	CardGlossy,
}

impl PrintType {
	pub const ALL: [PrintType; 4] = [
		PrintType::Bw,
		PrintType::Color,
		PrintType::CardMatte,
		PrintType::CardGlossy,
	];

	pub fn id(&self) -> &'static str {
		match self {
			PrintType::Bw => "bw",
			PrintType::Color => "color",
			PrintType::CardMatte => "card_matte",
			PrintType::CardGlossy => "card_glossy",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			PrintType::Bw => "Blanco y Negro",
			PrintType::Color => "A Todo Color",
			PrintType::CardMatte => "Cartón Grueso Mate",
			PrintType::CardGlossy => "Cartón Grueso Brillante",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
	None,
	OneSide,
	BothSides,
	Spiral,
	Staples,
}

impl Binding {
	pub const ALL: [Binding; 5] = [
		Binding::None,
		Binding::OneSide,
		Binding::BothSides,
		Binding::Spiral,
		Binding::Staples,
	];

	pub fn id(&self) -> &'static str {
		match self {
			Binding::None => "none",
			Binding::OneSide => "one_side",
			Binding::BothSides => "both_sides",
			Binding::Spiral => "spiral",
			Binding::Staples => "staples",
		}
	}

	pub fn label(&self) -> &'static str {
		match self {
			Binding::None => "Sin Encuadernación",
			Binding::OneSide => "A Un Lado",
			Binding::BothSides => "Ambos Lados",
			Binding::Spiral => "Encuadernación en Espiral",
			Binding::Staples => "Solo Grapas",
		}
	}
}

/// Document printing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintConfig {
	pub paper: PaperSize,
	pub paper_label: String,
	pub copies: u32,
	pub print_type: PrintType,
	pub print_type_label: String,
	pub binding: Binding,
	pub binding_label: String,
	/// Sum of the attached files' page counts, once known.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total_pages: Option<u32>,
	#[serde(default)]
	pub unit_price: f64,
}

impl PrintConfig {
	/// Builds a print configuration, deriving every label from the option ids.
	pub fn build(
		paper: PaperSize,
		copies: u32,
		print_type: PrintType,
		binding: Binding,
	) -> Result<Self, VariantError> {
		Ok(Self {
			paper,
			paper_label: paper.label().to_string(),
			copies: check_quantity(copies)?,
			print_type,
			print_type_label: print_type.label().to_string(),
			binding,
			binding_label: binding.label().to_string(),
			total_pages: None,
			unit_price: 0.0,
		})
	}

	pub fn with_unit_price(mut self, unit_price: f64) -> Self {
		self.unit_price = unit_price;
		self
	}
}

/// Photo printing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoConfig {
	pub size_code: String,
	pub label: String,
	pub width_in: f64,
	pub height_in: f64,
	pub width_cm: f64,
	pub height_cm: f64,
	/// Unit price from the photo catalog; zero for custom sizes.
	pub price: f64,
	pub quantity: u32,
	pub is_custom: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosterSizeMode {
	Preset,
	Custom,
}

/// Poster printing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterConfig {
	pub size_mode: PosterSizeMode,
	pub size_id: String,
	pub label: String,
	pub name: String,
	pub width_cm: f64,
	pub height_cm: f64,
	pub width_in: f64,
	pub height_in: f64,
	pub material_id: String,
	pub material_label: String,
	pub lamination_id: String,
	pub lamination_label: String,
}

/// The configuration of a draft, tagged with its flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flow", rename_all = "lowercase")]
pub enum OrderConfiguration {
	Print(PrintConfig),
	Photo(PhotoConfig),
	Poster(PosterConfig),
}

impl OrderConfiguration {
	pub fn flow(&self) -> OrderFlow {
		match self {
			OrderConfiguration::Print(_) => OrderFlow::Print,
			OrderConfiguration::Photo(_) => OrderFlow::Photo,
			OrderConfiguration::Poster(_) => OrderFlow::Poster,
		}
	}

	/// Serializes the variant body without the flow tag.
	///
	/// Remote documents carry the flow through `orderType`, so the config
	/// object is stored untagged.
	pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
		match self {
			OrderConfiguration::Print(c) => serde_json::to_value(c),
			OrderConfiguration::Photo(c) => serde_json::to_value(c),
			OrderConfiguration::Poster(c) => serde_json::to_value(c),
		}
	}

	/// Applies a page total to a print configuration. Other flows ignore it,
	/// as does a non-positive total.
	pub fn apply_total_pages(&mut self, total_pages: u32) {
		if let OrderConfiguration::Print(print) = self {
			if total_pages > 0 {
				print.total_pages = Some(total_pages);
			}
		}
	}
}
