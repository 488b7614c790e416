//! The error type shared by every jobly operation.

use crate::changeset::ValidationErrors;
use thiserror::Error;

pub type JoblyResult<T> = Result<T, JoblyError>;

/// Everything that can go wrong between a request and the database.
///
/// Callers usually only need the three predicates: [`is_not_found`],
/// [`is_duplicate`] and [`is_validation`]. Anything else is a server-side
/// failure.
///
/// [`is_not_found`]: JoblyError::is_not_found
/// [`is_duplicate`]: JoblyError::is_duplicate
/// [`is_validation`]: JoblyError::is_validation
#[derive(Debug, Error)]
pub enum JoblyError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// No row for the requested key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A create collided with an existing natural key (company handle, or
    /// job title at the same company).
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// The row references a company that does not exist.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Input the builders cannot turn into SQL: no fields to update, an
    /// inverted range, an unparsable query parameter.
    #[error("{0}")]
    Validation(String),

    /// A request body failed field checks.
    #[error("Invalid input: {0}")]
    InvalidInput(ValidationErrors),

    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    #[error("{0}")]
    Other(String),
}

impl JoblyError {
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    /// True for every error caused by client input rather than the database.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InvalidInput(_)
                | Self::ForeignKeyViolation(_)
                | Self::CheckViolation(_)
        )
    }

    /// Classify a driver error by SQLSTATE.
    ///
    /// 23505 (unique) becomes `Duplicate`, 23503 (foreign key) and 23514
    /// (check) become client errors; everything else stays a `Query` error.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let Some(db_err) = err.as_db_error() else {
            return Self::Query(err);
        };
        let code = db_err.code().clone();
        let detail = format!(
            "{}: {}",
            db_err.constraint().unwrap_or("unknown"),
            db_err.message()
        );

        match code.code() {
            "23505" => Self::Duplicate(detail),
            "23503" => Self::ForeignKeyViolation(detail),
            "23514" => Self::CheckViolation(detail),
            _ => Self::Query(err),
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for JoblyError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

impl From<ValidationErrors> for JoblyError {
    fn from(errors: ValidationErrors) -> Self {
        Self::InvalidInput(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::{FieldError, ValidationCode};

    #[test]
    fn client_error_classes() {
        assert!(JoblyError::validation("No data").is_validation());
        assert!(JoblyError::ForeignKeyViolation("fk".into()).is_validation());
        assert!(JoblyError::CheckViolation("ck".into()).is_validation());
        assert!(JoblyError::not_found("x").is_not_found());
        assert!(JoblyError::duplicate("x").is_duplicate());

        let other = JoblyError::Other("boom".into());
        assert!(!other.is_validation() && !other.is_not_found() && !other.is_duplicate());
    }

    #[test]
    fn field_errors_become_invalid_input() {
        let mut errors = ValidationErrors::default();
        errors.push(FieldError::new("name", ValidationCode::Required, "must not be empty"));

        let err = JoblyError::from(errors);
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Invalid input: name: must not be empty");
    }
}
