use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("validation failed for `{field}`: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },
    #[error("invariant violated: {message}")]
    Invariant { message: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Reject empty or whitespace-only input for a required text field.
pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Clamp-check a percentage-style score or progress value.
pub fn ensure_percent(value: i32, field: &'static str) -> Result<(), DomainError> {
    if !(0..=100).contains(&value) {
        return Err(DomainError::validation(field, "must be between 0 and 100"));
    }
    Ok(())
}
