//! Caller identity validation.
//!
//! User ids arrive from a trusted upstream header and are forwarded to the credential
//! store, including as a URL path segment by the HTTP lookup. Anything outside a
//! conservative character set is rejected before it reaches either.

/// Longest accepted user id, in bytes.
pub const MAX_USER_ID_LEN: usize = 128;

/// Errors from identity validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Authenticated request is missing a user id")]
    MissingUserId,

    #[error("User id exceeds {MAX_USER_ID_LEN} characters")]
    UserIdTooLong,

    #[error("User id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

impl ValidationError {
    /// Name of the offending parameter, for error bodies.
    pub fn param(&self) -> &'static str {
        "user_id"
    }
}

/// Validate a user id and return it unchanged.
///
/// Accepts ASCII letters, digits and `. _ @ : -`, which covers emails, UUIDs and
/// `provider:subject` style ids.
pub fn validate_user_id(user_id: Option<&str>) -> Result<&str, ValidationError> {
    let user_id = user_id.ok_or(ValidationError::MissingUserId)?;

    if user_id.is_empty() {
        return Err(ValidationError::MissingUserId);
    }
    if user_id.len() > MAX_USER_ID_LEN {
        return Err(ValidationError::UserIdTooLong);
    }
    if let Some(c) = user_id.chars().find(|c| !is_allowed(*c)) {
        return Err(ValidationError::InvalidCharacter(c));
    }

    Ok(user_id)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | ':' | '-')
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::simple("alice")]
    #[case::email("alice@example.com")]
    #[case::uuid("0b9e6a3c-4a51-4f4e-9c1b-2f5f0d0c7e11")]
    #[case::scoped("github:12345")]
    #[case::underscore("svc_batch.runner")]
    fn test_valid_user_ids(#[case] user_id: &str) {
        assert_eq!(validate_user_id(Some(user_id)), Ok(user_id));
    }

    #[rstest]
    #[case::absent(None, ValidationError::MissingUserId)]
    #[case::empty(Some(""), ValidationError::MissingUserId)]
    #[case::slash(Some("../admin"), ValidationError::InvalidCharacter('/'))]
    #[case::space(Some("alice smith"), ValidationError::InvalidCharacter(' '))]
    #[case::non_ascii(Some("alicé"), ValidationError::InvalidCharacter('é'))]
    fn test_invalid_user_ids(#[case] user_id: Option<&str>, #[case] expected: ValidationError) {
        assert_eq!(validate_user_id(user_id), Err(expected));
    }

    #[test]
    fn test_length_limit() {
        let at_limit = "a".repeat(MAX_USER_ID_LEN);
        assert!(validate_user_id(Some(&at_limit)).is_ok());

        let over = "a".repeat(MAX_USER_ID_LEN + 1);
        assert_eq!(
            validate_user_id(Some(&over)),
            Err(ValidationError::UserIdTooLong)
        );
    }
}
