//! Shared field validation helpers.
//!
//! Pure checks over already-deserialized values; no I/O. Repositories call
//! the per-entity `validate()` methods (which call these) before any write.

use crate::error::{StoreError, StoreResult};

/// Require a non-blank string field.
pub(crate) fn non_empty(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> StoreResult<()> {
    if value.trim().is_empty() {
        Err(StoreError::validation(entity, field, "must not be empty"))
    } else {
        Ok(())
    }
}

/// Require an integer field within an inclusive range.
pub(crate) fn in_range(
    entity: &'static str,
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> StoreResult<()> {
    if value < min || value > max {
        Err(StoreError::validation(
            entity,
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ))
    } else {
        Ok(())
    }
}

/// Require a non-negative integer field.
pub(crate) fn non_negative(
    entity: &'static str,
    field: &'static str,
    value: i64,
) -> StoreResult<()> {
    if value < 0 {
        Err(StoreError::validation(
            entity,
            field,
            format!("must not be negative, got {}", value),
        ))
    } else {
        Ok(())
    }
}

/// Require a strictly positive integer field.
pub(crate) fn positive(entity: &'static str, field: &'static str, value: i64) -> StoreResult<()> {
    if value <= 0 {
        Err(StoreError::validation(
            entity,
            field,
            format!("must be greater than 0, got {}", value),
        ))
    } else {
        Ok(())
    }
}

/// Require a 2-3 letter ASCII country/federation code.
pub(crate) fn federation_code(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> StoreResult<()> {
    let code = value.trim();
    if (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(StoreError::validation(
            entity,
            field,
            "must be 2-3 ASCII letters",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert!(non_empty("team", "name", "Team A").is_ok());
        assert!(non_empty("team", "name", "").is_err());
        assert!(non_empty("team", "name", "   ").is_err());
    }

    #[test]
    fn test_in_range() {
        assert!(in_range("player", "jersey_number", 7, 1, 99).is_ok());
        assert!(in_range("player", "jersey_number", 0, 1, 99).is_err());
        assert!(in_range("player", "jersey_number", 100, 1, 99).is_err());
    }

    #[test]
    fn test_positive_and_non_negative() {
        assert!(positive("video", "duration_secs", 1).is_ok());
        assert!(positive("video", "duration_secs", 0).is_err());
        assert!(non_negative("rally", "home_score", 0).is_ok());
        assert!(non_negative("rally", "home_score", -1).is_err());
    }

    #[test]
    fn test_federation_code() {
        assert!(federation_code("nation", "code", "IT").is_ok());
        assert!(federation_code("nation", "code", "ita").is_ok());
        assert!(federation_code("nation", "code", "I").is_err());
        assert!(federation_code("nation", "code", "ITAL").is_err());
        assert!(federation_code("nation", "code", "I7").is_err());
    }
}
