//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest display name accepted for a player, in characters.
pub const MAX_USERNAME_CHARS: usize = 64;

/// Validates that a display name is non-blank and at most [`MAX_USERNAME_CHARS`] long.
///
/// # Examples
///
/// ```ignore
/// validate_username("alice") // Ok
/// validate_username("   ")   // Err - blank
/// ```
pub fn validate_username(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("username_blank");
        err.message = Some("Username must not be empty".into());
        return Err(err);
    }

    let len = name.chars().count();
    if len > MAX_USERNAME_CHARS {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!("Username must be at most {MAX_USERNAME_CHARS} characters (got {len})").into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that an entity id was supplied.
pub fn validate_entity_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        let mut err = ValidationError::new("entity_id_required");
        err.message = Some("Entity ID is required".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("Ünïcødé näme").is_ok());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_CHARS)).is_ok());
    }

    #[test]
    fn test_validate_username_blank() {
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("\t\n").is_err());
    }

    #[test]
    fn test_validate_username_too_long() {
        let err = validate_username(&"x".repeat(MAX_USERNAME_CHARS + 1)).unwrap_err();
        assert_eq!(err.code, "username_length");
    }

    #[test]
    fn test_validate_entity_id() {
        assert!(validate_entity_id("3f1c").is_ok());
        assert!(validate_entity_id("").is_err());
        assert!(validate_entity_id(" ").is_err());
    }
}
