// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

use crate::error::ApiError;

/// Validates that a required string field is not empty or whitespace only
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Field must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Parses a numeric `:id` path segment
///
/// Non-numeric or non-positive ids are a client error, reported before any lookup runs.
pub fn parse_path_id(raw: &str) -> Result<i32, ApiError> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest("Invalid url param".to_string())),
    }
}
