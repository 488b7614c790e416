//! Field-level validation error types for request bodies.
//!
//! Inputs report every failing field at once instead of stopping at the
//! first problem, so a client can fix a body in one round trip.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Why a field was refused, serialized as a lowercase string.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationCode {
    Required,
    Range,
    Pattern,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field name as the client spells it (`numEmployees`).
    pub field: String,
    pub code: ValidationCode,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

/// Every field error found in one body, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    items: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, err: FieldError) {
        self.items.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn has(&self, field: &str) -> bool {
        self.items.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for err in &self.items {
            write!(f, "{sep}{}: {}", err.field, err.message)?;
            sep = "; ";
        }
        Ok(())
    }
}

/// Deserialize a tri-state patch field.
///
/// Used with `#[serde(default)]`: an absent key stays `None`, an explicit
/// `null` becomes `Some(None)` and a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        logo: Option<Option<String>>,
    }

    #[test]
    fn double_option_distinguishes_absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"logo": null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"logo": "x"}"#).unwrap();

        assert_eq!(absent.logo, None);
        assert_eq!(null.logo, Some(None));
        assert_eq!(value.logo, Some(Some("x".to_string())));
    }

    #[test]
    fn display_joins_field_messages() {
        let mut errors = ValidationErrors::default();
        errors.push(FieldError::new("name", ValidationCode::Required, "must not be empty"));
        errors.push(FieldError::new("logoUrl", ValidationCode::Url, "must be a valid URL"));

        assert_eq!(
            errors.to_string(),
            "name: must not be empty; logoUrl: must be a valid URL"
        );
        assert!(errors.has("logoUrl"));
        assert!(!errors.has("handle"));
    }

    #[test]
    fn codes_serialize_as_strings() {
        let err = FieldError::new("salary", ValidationCode::Range, "must be >= 0");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "range");
    }
}
