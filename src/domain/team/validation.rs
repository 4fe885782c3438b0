//! Team validation

use thiserror::Error;

/// Errors that can occur during team validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TeamValidationError {
    #[error("Team name cannot be empty")]
    EmptyName,

    #[error("Team name cannot exceed {0} characters")]
    NameTooLong(usize),

    #[error("Team name can only contain alphanumeric characters, hyphens and underscores")]
    InvalidNameCharacters,

    #[error("Team name must start with a letter")]
    InvalidNameStart,
}

const MAX_TEAM_NAME_LENGTH: usize = 63;

/// Validate a team name
///
/// Team names double as repository-backend group names, so they are kept to a
/// conservative character set.
pub fn validate_team_name(name: &str) -> Result<(), TeamValidationError> {
    if name.is_empty() {
        return Err(TeamValidationError::EmptyName);
    }

    if name.len() > MAX_TEAM_NAME_LENGTH {
        return Err(TeamValidationError::NameTooLong(MAX_TEAM_NAME_LENGTH));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TeamValidationError::InvalidNameCharacters);
    }

    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(TeamValidationError::InvalidNameStart);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_team_names() {
        assert!(validate_team_name("core").is_ok());
        assert!(validate_team_name("cobrateam").is_ok());
        assert!(validate_team_name("team-123").is_ok());
        assert!(validate_team_name("Platform_Ops").is_ok());
    }

    #[test]
    fn test_empty_team_name() {
        assert_eq!(validate_team_name(""), Err(TeamValidationError::EmptyName));
    }

    #[test]
    fn test_team_name_too_long() {
        let long_name = "a".repeat(64);
        assert_eq!(
            validate_team_name(&long_name),
            Err(TeamValidationError::NameTooLong(63))
        );
    }

    #[test]
    fn test_invalid_team_name_characters() {
        assert_eq!(
            validate_team_name("team name"),
            Err(TeamValidationError::InvalidNameCharacters)
        );
        assert_eq!(
            validate_team_name("team.name"),
            Err(TeamValidationError::InvalidNameCharacters)
        );
    }

    #[test]
    fn test_invalid_team_name_start() {
        assert_eq!(
            validate_team_name("-team"),
            Err(TeamValidationError::InvalidNameStart)
        );
        assert_eq!(
            validate_team_name("1team"),
            Err(TeamValidationError::InvalidNameStart)
        );
    }
}
