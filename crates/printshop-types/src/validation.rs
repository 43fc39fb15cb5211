//! Schema validation for backend configuration tables.
//!
//! Storage and remote backends describe the TOML table they accept as a
//! [`Schema`]; the configuration loader runs those schemas before any backend
//! is constructed so misconfiguration surfaces at startup with the full field
//! path in the message.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
}

/// Custom check run after the type check passes.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of a TOML table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	///
	/// Required fields must be present; optional fields are checked only when
	/// present.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(field_name, "string", value));
			}
		},
	}

	Ok(())
}

/// Implemented by every backend to validate its configuration table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn remote_schema() -> Schema {
		Schema::new(
			vec![Field::new("base_url", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some(s) if s.starts_with("http") => Ok(()),
					_ => Err("must be an http(s) url".to_string()),
				}
			})],
			vec![Field::new("auth_token", FieldType::String)],
		)
	}

	#[test]
	fn test_valid_table() {
		let value: toml::Value = toml::from_str(
			r#"
base_url = "https://orders.example.com"
auth_token = "abc"
"#,
		)
		.unwrap();
		assert!(remote_schema().validate(&value).is_ok());
	}

	#[test]
	fn test_missing_and_custom_validator() {
		let missing: toml::Value = toml::from_str(r#"auth_token = "abc""#).unwrap();
		assert!(matches!(
			remote_schema().validate(&missing),
			Err(ValidationError::MissingField(f)) if f == "base_url"
		));

		let bad_url: toml::Value = toml::from_str(r#"base_url = "ftp://x""#).unwrap();
		assert!(matches!(
			remote_schema().validate(&bad_url),
			Err(ValidationError::InvalidValue { field, .. }) if field == "base_url"
		));
	}

	#[test]
	fn test_type_mismatch_and_non_table_root() {
		let numeric: toml::Value = toml::from_str(r#"base_url = 42"#).unwrap();
		assert!(matches!(
			remote_schema().validate(&numeric),
			Err(ValidationError::TypeMismatch { field, expected, actual })
				if field == "base_url" && expected == "string" && actual == "integer"
		));

		let scalar = toml::Value::String("not a table".to_string());
		assert!(matches!(
			remote_schema().validate(&scalar),
			Err(ValidationError::TypeMismatch { field, .. }) if field == "root"
		));
	}
}
