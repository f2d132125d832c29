use thiserror::Error;

/// Resolution failures that fail a single test instead of the whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Could not find field: {field}")]
    FieldNotFound { field: String },

    #[error("No validation fields specified: {expression:?}")]
    NoFieldsSpecified { expression: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;
