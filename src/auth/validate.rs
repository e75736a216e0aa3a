//! Username and password policy.
//!
//! One policy for every entry point: registration, admin-created accounts
//! and the new password of a password change all go through here.
//! Rules are checked in order and the first failure is reported.

use thiserror::Error;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 50;
/// bcrypt only reads this many bytes of input.
pub const PASSWORD_MAX_BYTES: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username cannot be empty")]
    UsernameEmpty,

    #[error("Username must be between {min} and {max} characters (got {len})", min = USERNAME_MIN_LEN, max = USERNAME_MAX_LEN)]
    UsernameLength { len: usize },

    #[error("Username can only contain letters and numbers")]
    UsernameCharacters,

    #[error("Password cannot be empty")]
    PasswordEmpty,

    #[error("Password must be between {min} and {max} characters (got {len})", min = PASSWORD_MIN_LEN, max = PASSWORD_MAX_LEN)]
    PasswordLength { len: usize },

    #[error("Password must be at most {max} bytes (got {bytes})", max = PASSWORD_MAX_BYTES)]
    PasswordTooLong { bytes: usize },

    #[error("Password must contain at least one number")]
    PasswordMissingDigit,

    #[error("Password must contain at least one uppercase letter")]
    PasswordMissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    PasswordMissingLowercase,

    #[error("Password must contain at least one special character")]
    PasswordMissingSpecial,
}

/// Validate username format: 3-20 ASCII letters or digits.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }

    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ValidationError::UsernameLength { len });
    }

    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::UsernameCharacters);
    }

    Ok(())
}

/// Validate password strength against the registration policy.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordEmpty);
    }

    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(ValidationError::PasswordLength { len });
    }

    if password.len() > PASSWORD_MAX_BYTES {
        return Err(ValidationError::PasswordTooLong {
            bytes: password.len(),
        });
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::PasswordMissingUppercase);
    }

    if !password.chars().any(char::is_lowercase) {
        return Err(ValidationError::PasswordMissingLowercase);
    }

    if password.chars().all(char::is_alphanumeric) {
        return Err(ValidationError::PasswordMissingSpecial);
    }

    Ok(())
}

/// Both checks, username first.
pub fn validate_credentials(username: &str, password: &str) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_password(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_usernames() {
        assert_eq!(validate_username("alice"), Ok(()));
        assert_eq!(validate_username("bob42"), Ok(()));
        assert_eq!(validate_username("ABC"), Ok(()));
        assert_eq!(validate_username("a".repeat(20).as_str()), Ok(()));
    }

    #[test]
    fn rejects_short_username_with_length_reason() {
        let err = validate_username("ab").unwrap_err();
        assert_eq!(err, ValidationError::UsernameLength { len: 2 });
        assert!(err.to_string().contains("between 3 and 20"));
    }

    #[test]
    fn rejects_bad_usernames() {
        assert_eq!(validate_username(""), Err(ValidationError::UsernameEmpty));
        assert_eq!(
            validate_username(&"a".repeat(21)),
            Err(ValidationError::UsernameLength { len: 21 })
        );
        assert_eq!(validate_username("al_ice"), Err(ValidationError::UsernameCharacters));
        assert_eq!(validate_username("al-ice"), Err(ValidationError::UsernameCharacters));
        assert_eq!(validate_username("al,ice"), Err(ValidationError::UsernameCharacters));
        assert_eq!(validate_username("ålice"), Err(ValidationError::UsernameCharacters));
    }

    #[test]
    fn accepts_strong_password() {
        assert_eq!(validate_password("SecurePass123!"), Ok(()));
        assert_eq!(validate_password("NewPass456!"), Ok(()));
    }

    #[test]
    fn password_rules_short_circuit_in_order() {
        assert_eq!(validate_password(""), Err(ValidationError::PasswordEmpty));
        assert_eq!(validate_password("Ab1!"), Err(ValidationError::PasswordLength { len: 4 }));
        assert_eq!(
            validate_password(&format!("Ab1!{}", "x".repeat(47))),
            Err(ValidationError::PasswordLength { len: 51 })
        );
        assert_eq!(validate_password("Password!"), Err(ValidationError::PasswordMissingDigit));
        assert_eq!(validate_password("password1!"), Err(ValidationError::PasswordMissingUppercase));
        assert_eq!(validate_password("PASSWORD1!"), Err(ValidationError::PasswordMissingLowercase));
        assert_eq!(validate_password("Password1"), Err(ValidationError::PasswordMissingSpecial));
    }

    #[test]
    fn multibyte_password_is_bounded_in_bytes() {
        // 46 characters, 88 bytes
        let long = format!("Ab1!{}", "é".repeat(42));
        assert_eq!(long.chars().count(), 46);
        assert_eq!(validate_password(&long), Err(ValidationError::PasswordTooLong { bytes: 88 }));

        let fits = format!("Ab1!{}", "é".repeat(34));
        assert_eq!(fits.len(), 72);
        assert_eq!(validate_password(&fits), Ok(()));
    }

    #[test]
    fn validates_username_before_password() {
        assert_eq!(
            validate_credentials("ab", "weak"),
            Err(ValidationError::UsernameLength { len: 2 })
        );
        assert_eq!(
            validate_credentials("alice", "weak"),
            Err(ValidationError::PasswordLength { len: 4 })
        );
    }
}
