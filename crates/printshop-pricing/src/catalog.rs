//! Fixed product catalogs and configuration builders.
//!
//! Photo sizes carry their unit prices; poster presets, materials and
//! laminations carry the labels shown to customers. The builders look entries
//! up by id and produce fully labelled configuration variants.

use printshop_types::{
	check_quantity, Binding, LocationInfo, PaperSize, PhotoConfig, PosterConfig, PosterSizeMode,
	PrintType, VariantError, ALLOWED_FILE_EXTENSIONS, MAX_QUANTITY,
};
use serde::{Deserialize, Serialize};

const CM_PER_INCH: f64 = 2.54;

pub const CUSTOM_PHOTO_CODE: &str = "CUSTOM";
const CUSTOM_PHOTO_NAME: &str = "Tamaño Personalizado";
const CUSTOM_POSTER_ID: &str = "custom";
const CUSTOM_POSTER_LABEL: &str = "Personalizado";

fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSizeGroup {
	Common,
	Large,
	Custom,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSize {
	pub code: &'static str,
	pub name: &'static str,
	pub width_in: f64,
	pub height_in: f64,
	pub width_cm: f64,
	pub height_cm: f64,
	pub price: f64,
	pub group: PhotoSizeGroup,
}

const fn photo(
	code: &'static str,
	name: &'static str,
	inches: (f64, f64),
	cm: (f64, f64),
	price: f64,
	group: PhotoSizeGroup,
) -> PhotoSize {
	PhotoSize {
		code,
		name,
		width_in: inches.0,
		height_in: inches.1,
		width_cm: cm.0,
		height_cm: cm.1,
		price,
		group,
	}
}

pub const PHOTO_SIZES: &[PhotoSize] = &[
	photo("1.4x2.2", "Tamaño credencial", (1.4, 2.2), (3.5, 5.5), 20.0, PhotoSizeGroup::Common),
	photo("2x2", "Foto carnet / pasaporte", (2.0, 2.0), (5.08, 5.08), 20.0, PhotoSizeGroup::Common),
	photo("2R", "2R", (2.5, 3.5), (6.35, 8.89), 2.5, PhotoSizeGroup::Common),
	photo("3R", "3R", (3.5, 5.0), (8.9, 12.7), 5.0, PhotoSizeGroup::Common),
	photo("4R", "4R", (4.0, 6.0), (10.2, 15.2), 5.0, PhotoSizeGroup::Common),
	photo("5R", "5R", (5.0, 7.0), (12.7, 17.8), 7.5, PhotoSizeGroup::Common),
	photo("6R", "6R", (6.0, 8.0), (15.2, 20.3), 20.0, PhotoSizeGroup::Common),
	photo("8R", "8R", (8.0, 10.0), (20.3, 25.4), 20.0, PhotoSizeGroup::Common),
	photo("S8R", "S8R Super 8R", (8.0, 12.0), (20.3, 30.5), 23.0, PhotoSizeGroup::Common),
	photo("10R", "10R", (10.0, 12.0), (25.4, 30.5), 25.0, PhotoSizeGroup::Large),
	photo("11R", "11R", (11.0, 14.0), (27.9, 35.6), 26.0, PhotoSizeGroup::Large),
	photo("12R", "12R", (12.0, 15.0), (30.5, 38.1), 27.0, PhotoSizeGroup::Large),
	photo("14R", "14R", (14.0, 17.0), (35.6, 43.2), 35.0, PhotoSizeGroup::Large),
	photo("16R", "16R", (16.0, 20.0), (40.6, 50.8), 50.0, PhotoSizeGroup::Large),
	photo("20R", "20R", (20.0, 24.0), (50.8, 61.0), 66.0, PhotoSizeGroup::Large),
	photo("24R", "24R", (20.0, 30.0), (50.8, 76.2), 83.0, PhotoSizeGroup::Large),
	photo("30R", "30R", (30.0, 40.0), (76.2, 101.6), 166.0, PhotoSizeGroup::Large),
	photo("S12R", "S12R Super 12R", (12.0, 18.0), (30.5, 45.7), 30.0, PhotoSizeGroup::Large),
	photo(CUSTOM_PHOTO_CODE, CUSTOM_PHOTO_NAME, (0.0, 0.0), (0.0, 0.0), 0.0, PhotoSizeGroup::Custom),
];

pub fn find_photo_size(code: &str) -> Option<&'static PhotoSize> {
	PHOTO_SIZES.iter().find(|size| size.code == code)
}

/// Builds a photo configuration for a catalog size, or for a custom size
/// given in inches.
///
/// Custom sizes are priced at zero (quoted later) and their centimetre
/// dimensions are derived from the inches, rounded to two decimals.
pub fn photo_config(
	code: &str,
	quantity: u32,
	custom_inches: Option<(f64, f64)>,
) -> Result<PhotoConfig, VariantError> {
	let quantity = check_quantity(quantity)?;

	if code == CUSTOM_PHOTO_CODE {
		let (width_in, height_in) = custom_inches.ok_or_else(|| {
			VariantError::InvalidDimensions("custom photo size needs width and height".into())
		})?;
		check_dimensions(width_in, height_in)?;
		return Ok(PhotoConfig {
			size_code: CUSTOM_PHOTO_CODE.to_string(),
			label: CUSTOM_PHOTO_NAME.to_string(),
			width_in,
			height_in,
			width_cm: round2(width_in * CM_PER_INCH),
			height_cm: round2(height_in * CM_PER_INCH),
			price: 0.0,
			quantity,
			is_custom: true,
		});
	}

	let size = find_photo_size(code).ok_or_else(|| VariantError::UnknownSize(code.to_string()))?;
	Ok(PhotoConfig {
		size_code: size.code.to_string(),
		label: size.name.to_string(),
		width_in: size.width_in,
		height_in: size.height_in,
		width_cm: size.width_cm,
		height_cm: size.height_cm,
		price: size.price,
		quantity,
		is_custom: false,
	})
}

fn check_dimensions(width: f64, height: f64) -> Result<(), VariantError> {
	let valid = |v: f64| v.is_finite() && v > 0.0;
	if valid(width) && valid(height) {
		Ok(())
	} else {
		Err(VariantError::InvalidDimensions(format!(
			"{} x {} is not a valid size",
			width, height
		)))
	}
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterPreset {
	pub id: &'static str,
	pub label: &'static str,
	pub name: &'static str,
	pub width_cm: f64,
	pub height_cm: f64,
	pub width_in: f64,
	pub height_in: f64,
	pub note: &'static str,
}

const fn poster(
	id: &'static str,
	name: &'static str,
	cm: (f64, f64),
	inches: (f64, f64),
	note: &'static str,
) -> PosterPreset {
	PosterPreset {
		id,
		label: id,
		name,
		width_cm: cm.0,
		height_cm: cm.1,
		width_in: inches.0,
		height_in: inches.1,
		note,
	}
}

pub const POSTER_PRESETS: &[PosterPreset] = &[
	poster("A4", "21 x 29.7 cm", (21.0, 29.7), (8.27, 11.69), "Tamaño estándar pequeño"),
	poster("A3", "29.7 x 42 cm", (29.7, 42.0), (11.69, 16.54), "Popular para pósters"),
	poster("A2", "42 x 59.4 cm", (42.0, 59.4), (16.54, 23.39), "Impacto medio"),
	poster("A1", "59.4 x 84.1 cm", (59.4, 84.1), (23.39, 33.11), "Gran formato"),
	poster("A0", "84.1 x 118.9 cm", (84.1, 118.9), (33.11, 46.81), "Extra grande"),
	poster("30x40", "30 x 40 cm", (30.0, 40.0), (11.81, 15.75), "Decorativo / juvenil"),
	poster("40x60", "40 x 60 cm", (40.0, 60.0), (15.75, 23.62), "Póster mediano"),
	poster("50x70", "50 x 70 cm", (50.0, 70.0), (19.69, 27.56), "Clásico y versátil"),
	poster("60x90", "60 x 90 cm", (60.0, 90.0), (23.62, 35.43), "Gran impacto visual"),
	poster("70x100", "70 x 100 cm", (70.0, 100.0), (27.56, 39.37), "Extra grande"),
];

/// An id with its customer-facing label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogOption {
	pub id: &'static str,
	pub label: &'static str,
}

pub const POSTER_MATERIALS: &[CatalogOption] = &[
	CatalogOption {
		id: "poster200",
		label: "Papel Poster 200g",
	},
	CatalogOption {
		id: "photo260",
		label: "Photo Satin 260g",
	},
	CatalogOption {
		id: "vinyl",
		label: "Vinyl Adhesivo",
	},
	CatalogOption {
		id: "canvas",
		label: "Canvas",
	},
];

pub const POSTER_LAMINATIONS: &[CatalogOption] = &[
	CatalogOption {
		id: "none",
		label: "Sin laminado",
	},
	CatalogOption {
		id: "matte",
		label: "Mate",
	},
	CatalogOption {
		id: "gloss",
		label: "Brillante",
	},
];

fn find_option(options: &'static [CatalogOption], id: &str) -> Option<&'static CatalogOption> {
	options.iter().find(|option| option.id == id)
}

/// Poster size selection: a preset id or custom dimensions in centimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PosterSize {
	Preset {
		id: String,
	},
	Custom {
		#[serde(rename = "widthCm")]
		width_cm: f64,
		#[serde(rename = "heightCm")]
		height_cm: f64,
	},
}

/// Builds a poster configuration.
///
/// Custom sizes are named `"<w> x <h> cm"` and their inch dimensions are
/// derived from the centimetres, rounded to two decimals.
pub fn poster_config(
	size: &PosterSize,
	material_id: &str,
	lamination_id: &str,
) -> Result<PosterConfig, VariantError> {
	let material = find_option(POSTER_MATERIALS, material_id)
		.ok_or_else(|| VariantError::UnknownMaterial(material_id.to_string()))?;
	let lamination = find_option(POSTER_LAMINATIONS, lamination_id)
		.ok_or_else(|| VariantError::UnknownLamination(lamination_id.to_string()))?;

	let (size_mode, size_id, label, name, width_cm, height_cm, width_in, height_in) = match size {
		PosterSize::Preset { id } => {
			let preset = POSTER_PRESETS
				.iter()
				.find(|preset| preset.id == id)
				.ok_or_else(|| VariantError::UnknownSize(id.clone()))?;
			(
				PosterSizeMode::Preset,
				preset.id.to_string(),
				preset.label.to_string(),
				preset.name.to_string(),
				preset.width_cm,
				preset.height_cm,
				preset.width_in,
				preset.height_in,
			)
		},
		PosterSize::Custom {
			width_cm,
			height_cm,
		} => {
			check_dimensions(*width_cm, *height_cm)?;
			(
				PosterSizeMode::Custom,
				CUSTOM_POSTER_ID.to_string(),
				CUSTOM_POSTER_LABEL.to_string(),
				format!("{} x {} cm", width_cm, height_cm),
				*width_cm,
				*height_cm,
				round2(width_cm / CM_PER_INCH),
				round2(height_cm / CM_PER_INCH),
			)
		},
	};

	Ok(PosterConfig {
		size_mode,
		size_id,
		label,
		name,
		width_cm,
		height_cm,
		width_in,
		height_in,
		material_id: material.id.to_string(),
		material_label: material.label.to_string(),
		lamination_id: lamination.id.to_string(),
		lamination_label: lamination.label.to_string(),
	})
}

/// Branches customers can pick from.
pub fn locations() -> Vec<LocationInfo> {
	let branch = |id: &str, name: &str, city: &str, country: &str| LocationInfo {
		id: id.to_string(),
		name: name.to_string(),
		city: Some(city.to_string()),
		address: None,
		country: Some(country.to_string()),
		whatsapp: None,
	};
	vec![
		branch("denver-001", "Printing24/7 — Denver Downtown", "Denver, CO", "USA"),
		branch("aurora-002", "Printing24/7 — Aurora Central", "Aurora, CO", "USA"),
		branch("sj-cr-003", "Printing24/7 — San José Centro", "San José", "Costa Rica"),
	]
}

pub fn find_location(id: &str) -> Option<LocationInfo> {
	locations().into_iter().find(|location| location.id == id)
}

/// Everything a client needs to render the configuration screens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
	pub paper_sizes: Vec<CatalogOption>,
	pub print_types: Vec<CatalogOption>,
	pub bindings: Vec<CatalogOption>,
	pub photo_sizes: &'static [PhotoSize],
	pub poster_presets: &'static [PosterPreset],
	pub poster_materials: &'static [CatalogOption],
	pub poster_laminations: &'static [CatalogOption],
	pub locations: Vec<LocationInfo>,
	pub max_quantity: u32,
	pub allowed_file_extensions: &'static [&'static str],
}

pub fn catalog() -> Catalog {
	Catalog {
		paper_sizes: PaperSize::ALL
			.iter()
			.map(|p| CatalogOption {
				id: p.id(),
				label: p.label(),
			})
			.collect(),
		print_types: PrintType::ALL
			.iter()
			.map(|p| CatalogOption {
				id: p.id(),
				label: p.label(),
			})
			.collect(),
		bindings: Binding::ALL
			.iter()
			.map(|b| CatalogOption {
				id: b.id(),
				label: b.label(),
			})
			.collect(),
		photo_sizes: PHOTO_SIZES,
		poster_presets: POSTER_PRESETS,
		poster_materials: POSTER_MATERIALS,
		poster_laminations: POSTER_LAMINATIONS,
		locations: locations(),
		max_quantity: MAX_QUANTITY,
		allowed_file_extensions: ALLOWED_FILE_EXTENSIONS,
	}
}
