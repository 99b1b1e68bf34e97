//! TOML schema checks for implementation-specific config sections.
//!
//! Each pluggable backend (market, wallet, order book, storage) keeps its
//! settings as a raw `toml::Value` and publishes a [`ConfigSchema`] that is
//! run at load time, so a bad section fails before anything connects.

use rust_decimal::Decimal;
use std::str::FromStr;
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
	#[error("Failed to deserialize config: {0}")]
	DeserializationError(String),
}

impl ValidationError {
	fn nested(self, parent: &str) -> Self {
		match self {
			ValidationError::MissingField(f) => {
				ValidationError::MissingField(format!("{}.{}", parent, f))
			}
			ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
				field: format!("{}.{}", parent, field),
				message,
			},
			ValidationError::TypeMismatch {
				field,
				expected,
				actual,
			} => ValidationError::TypeMismatch {
				field: format!("{}.{}", parent, field),
				expected,
				actual,
			},
			other => other,
		}
	}
}

/// Type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	/// A decimal written as a TOML string or float, e.g. `"0.005"`.
	Decimal {
		min: Option<Decimal>,
		max: Option<Decimal>,
	},
	Boolean,
	Array(Box<FieldType>),
	Table(Schema),
}

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

	/// Adds a custom check run after the type check passes.
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

/// Schema definition with required and optional fields.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

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

fn mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn out_of_range<T: std::fmt::Display>(
	field_name: &str,
	value: T,
	min: Option<T>,
	max: Option<T>,
) -> Option<ValidationError>
where
	T: PartialOrd,
{
	if let Some(min) = min {
		if value < min {
			return Some(ValidationError::InvalidValue {
				field: field_name.to_string(),
				message: format!("Value {} is less than minimum {}", value, min),
			});
		}
	}
	if let Some(max) = max {
		if value > max {
			return Some(ValidationError::InvalidValue {
				field: field_name.to_string(),
				message: format!("Value {} is greater than maximum {}", value, max),
			});
		}
	}
	None
}

/// Reads a decimal from a TOML string, float or integer.
pub fn toml_decimal(value: &toml::Value) -> Option<Decimal> {
	match value {
		toml::Value::String(s) => Decimal::from_str(s.trim()).ok(),
		toml::Value::Integer(i) => Some(Decimal::from(*i)),
		toml::Value::Float(f) => Decimal::from_str(&f.to_string()).ok(),
		_ => None,
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
				return Err(mismatch(field_name, "string", value));
			}
		}
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| mismatch(field_name, "integer", value))?;
			if let Some(err) = out_of_range(field_name, int_val, *min, *max) {
				return Err(err);
			}
		}
		FieldType::Decimal { min, max } => {
			let dec_val = toml_decimal(value).ok_or_else(|| mismatch(field_name, "decimal", value))?;
			if let Some(err) = out_of_range(field_name, dec_val, *min, *max) {
				return Err(err);
			}
		}
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch(field_name, "boolean", value));
			}
		}
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| mismatch(field_name, "array", value))?;
			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		}
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| e.nested(field_name))?;
		}
	}

	Ok(())
}

/// Validator for `0x`-prefixed 20-byte addresses.
pub fn address_validator(value: &toml::Value) -> Result<(), String> {
	let text = value.as_str().unwrap_or_default();
	text.parse::<alloy::primitives::Address>()
		.map(|_| ())
		.map_err(|e| format!("Invalid address {:?}: {}", text, e))
}

/// Validator for `http://` / `https://` endpoints.
pub fn http_url_validator(value: &toml::Value) -> Result<(), String> {
	let url = value.as_str().unwrap_or_default();
	if url.starts_with("http://") || url.starts_with("https://") {
		Ok(())
	} else {
		Err("URL must start with http:// or https://".to_string())
	}
}

/// Validator for hex private keys, with or without `0x`.
pub fn private_key_validator(value: &toml::Value) -> Result<(), String> {
	let key = value.as_str().unwrap_or_default();
	let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

	if key_without_prefix.len() != 64 {
		return Err("Private key must be 64 hex characters (32 bytes)".to_string());
	}
	if hex::decode(key_without_prefix).is_err() {
		return Err("Private key must be valid hexadecimal".to_string());
	}
	Ok(())
}

/// A configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn schema() -> Schema {
		Schema::new(
			vec![
				Field::new("api_url", FieldType::String).with_validator(http_url_validator),
				Field::new(
					"chain_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
			vec![
				Field::new(
					"slippage",
					FieldType::Decimal {
						min: Some(Decimal::ZERO),
						max: Some(Decimal::ONE),
					},
				),
				Field::new(
					"network",
					FieldType::Table(Schema::new(
						vec![Field::new("weth", FieldType::String).with_validator(address_validator)],
						vec![],
					)),
				),
			],
		)
	}

	fn parse(text: &str) -> toml::Value {
		toml::Value::Table(toml::from_str(text).unwrap())
	}

	#[test]
	fn test_valid_config_passes() {
		let config = parse(
			r#"
			api_url = "https://hidingbook.keeperdao.com/api/v1"
			chain_id = 1
			slippage = "0.005"
			[network]
			weth = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
			"#,
		);
		schema().validate(&config).unwrap();
	}

	#[test]
	fn test_missing_and_mismatched_fields() {
		let missing = parse(r#"api_url = "https://x""#);
		assert!(matches!(
			schema().validate(&missing),
			Err(ValidationError::MissingField(f)) if f == "chain_id"
		));

		let wrong_type = parse(
			r#"
			api_url = "https://x"
			chain_id = "one"
			"#,
		);
		assert!(matches!(
			schema().validate(&wrong_type),
			Err(ValidationError::TypeMismatch { .. })
		));
	}

	#[test]
	fn test_custom_validators_and_ranges() {
		let bad_url = parse(
			r#"
			api_url = "ftp://x"
			chain_id = 1
			"#,
		);
		assert!(matches!(
			schema().validate(&bad_url),
			Err(ValidationError::InvalidValue { .. })
		));

		let too_much_slippage = parse(
			r#"
			api_url = "https://x"
			chain_id = 1
			slippage = 1.5
			"#,
		);
		assert!(matches!(
			schema().validate(&too_much_slippage),
			Err(ValidationError::InvalidValue { field, .. }) if field == "slippage"
		));
	}

	#[test]
	fn test_nested_errors_carry_path() {
		let config = parse(
			r#"
			api_url = "https://x"
			chain_id = 1
			[network]
			weth = "not-an-address"
			"#,
		);
		assert!(matches!(
			schema().validate(&config),
			Err(ValidationError::InvalidValue { field, .. }) if field == "network.weth"
		));
	}

	#[test]
	fn test_private_key_validator() {
		let key = toml::Value::String(format!("0x{}", "ab".repeat(32)));
		assert!(private_key_validator(&key).is_ok());
		assert!(private_key_validator(&toml::Value::String("0x1234".into())).is_err());
	}
}
