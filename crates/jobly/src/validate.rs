//! Validation helpers used by the request input types.

use crate::changeset::{FieldError, ValidationCode, ValidationErrors};
use crate::error::JoblyResult;
use rust_decimal::Decimal;
use std::sync::OnceLock;

/// Inputs that can check themselves before reaching a repository.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Run [`Validate::validate`] and convert failures into [`JoblyError::InvalidInput`].
///
/// [`JoblyError::InvalidInput`]: crate::JoblyError::InvalidInput
pub fn ensure_valid<T: Validate>(input: &T) -> JoblyResult<()> {
    input.validate().map_err(Into::into)
}

/// Company handles: lowercase letters, digits and dashes, at most 25 chars.
pub fn is_handle(s: &str) -> bool {
    static HANDLE_RE: OnceLock<regex::Regex> = OnceLock::new();
    HANDLE_RE
        .get_or_init(|| regex::Regex::new(r"^[a-z0-9-]{1,25}$").expect("invalid built-in handle regex"))
        .is_match(s)
}

pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

pub(crate) fn check_not_empty(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(
            field,
            ValidationCode::Required,
            "must not be empty",
        ));
    }
}

pub(crate) fn check_min(errors: &mut ValidationErrors, field: &str, value: i32, min: i32) {
    if value < min {
        errors.push(FieldError::new(
            field,
            ValidationCode::Range,
            format!("must be >= {min}"),
        ));
    }
}

pub(crate) fn check_fraction(errors: &mut ValidationErrors, field: &str, value: Decimal) {
    if value < Decimal::ZERO || value > Decimal::ONE {
        errors.push(FieldError::new(
            field,
            ValidationCode::Range,
            "must be between 0 and 1",
        ));
    }
}

pub(crate) fn check_url(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !is_url(value) {
        errors.push(FieldError::new(
            field,
            ValidationCode::Url,
            "must be a valid URL",
        ));
    }
}

pub(crate) fn check_handle(errors: &mut ValidationErrors, field: &str, value: &str) {
    if !is_handle(value) {
        errors.push(FieldError::new(
            field,
            ValidationCode::Pattern,
            "must be 1-25 lowercase letters, digits or dashes",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles() {
        assert!(is_handle("anderson-arias-morrow"));
        assert!(is_handle("c1"));
        assert!(!is_handle(""));
        assert!(!is_handle("Upper"));
        assert!(!is_handle("has space"));
        assert!(!is_handle("a-very-long-handle-that-is-too-long"));
    }

    #[test]
    fn urls() {
        assert!(is_url("http://c1.img"));
        assert!(!is_url("not a url"));
    }

    #[test]
    fn fraction_bounds_are_inclusive() {
        let mut errors = ValidationErrors::default();
        check_fraction(&mut errors, "equity", Decimal::ZERO);
        check_fraction(&mut errors, "equity", Decimal::ONE);
        assert!(errors.is_empty());

        check_fraction(&mut errors, "equity", Decimal::new(11, 1));
        assert_eq!(errors.len(), 1);
    }
}
