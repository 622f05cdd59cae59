//! Sign-up and profile field checks.
//!
//! Each validator returns the first rule the value breaks; the error's
//! `Display` is the message shown under the field.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 24;
pub const DISPLAY_NAME_MIN_LENGTH: usize = 2;
pub const DISPLAY_NAME_MAX_LENGTH: usize = 30;
pub const BIO_MAX_LENGTH: usize = 80;
pub const BIO_MAX_LINES: usize = 4;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static USERNAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.]+$").expect("valid regex"));
static REPEATED_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_.]{2,}").expect("valid regex"));
static DISPLAY_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\s\-_.]+$").expect("valid regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Please enter a valid email address")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least {} characters long", PASSWORD_MIN_LENGTH)]
    PasswordTooShort,
    #[error("Password must contain at least one letter and one number")]
    PasswordTooSimple,
    #[error("Username is required")]
    UsernameRequired,
    #[error("Username must be at least {} characters long", USERNAME_MIN_LENGTH)]
    UsernameTooShort,
    #[error("Username cannot exceed {} characters", USERNAME_MAX_LENGTH)]
    UsernameTooLong,
    #[error("Username can only contain letters, numbers, underscores, and periods")]
    UsernameCharacters,
    #[error("Username cannot start with underscore or period")]
    UsernameLeadingSeparator,
    #[error("Username cannot end with underscore or period")]
    UsernameTrailingSeparator,
    #[error("Username cannot have consecutive periods or underscores")]
    UsernameRepeatedSeparator,
    #[error("Display name is required")]
    DisplayNameRequired,
    #[error("Display name must be at least {} characters long", DISPLAY_NAME_MIN_LENGTH)]
    DisplayNameTooShort,
    #[error("Display name cannot exceed {} characters", DISPLAY_NAME_MAX_LENGTH)]
    DisplayNameTooLong,
    #[error("Display name contains invalid characters")]
    DisplayNameCharacters,
    #[error("Bio cannot exceed {} characters", BIO_MAX_LENGTH)]
    BioTooLong,
    #[error("Bio cannot exceed {} lines", BIO_MAX_LINES)]
    BioTooManyLines,
}

pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.is_empty() {
        return Err(FieldError::EmailRequired);
    }
    if !EMAIL.is_match(email) {
        return Err(FieldError::EmailInvalid);
    }
    Ok(())
}

/// Sign-in only needs a password; sign-up also enforces strength.
pub fn validate_password(password: &str, is_signup: bool) -> Result<(), FieldError> {
    if password.is_empty() {
        return Err(FieldError::PasswordRequired);
    }
    if is_signup {
        if password.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(FieldError::PasswordTooShort);
        }
        let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_letter && has_digit) {
            return Err(FieldError::PasswordTooSimple);
        }
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), FieldError> {
    let len = username.chars().count();
    if username.is_empty() {
        return Err(FieldError::UsernameRequired);
    }
    if len < USERNAME_MIN_LENGTH {
        return Err(FieldError::UsernameTooShort);
    }
    if len > USERNAME_MAX_LENGTH {
        return Err(FieldError::UsernameTooLong);
    }
    if !USERNAME_CHARS.is_match(username) {
        return Err(FieldError::UsernameCharacters);
    }
    if username.starts_with(['_', '.']) {
        return Err(FieldError::UsernameLeadingSeparator);
    }
    if username.ends_with(['_', '.']) {
        return Err(FieldError::UsernameTrailingSeparator);
    }
    if REPEATED_SEPARATOR.is_match(username) {
        return Err(FieldError::UsernameRepeatedSeparator);
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), FieldError> {
    let len = name.chars().count();
    if name.is_empty() {
        return Err(FieldError::DisplayNameRequired);
    }
    if len < DISPLAY_NAME_MIN_LENGTH {
        return Err(FieldError::DisplayNameTooShort);
    }
    if len > DISPLAY_NAME_MAX_LENGTH {
        return Err(FieldError::DisplayNameTooLong);
    }
    if !DISPLAY_NAME_CHARS.is_match(name) {
        return Err(FieldError::DisplayNameCharacters);
    }
    Ok(())
}

/// An empty bio is fine.
pub fn validate_bio(bio: &str) -> Result<(), FieldError> {
    if bio.chars().count() > BIO_MAX_LENGTH {
        return Err(FieldError::BioTooLong);
    }
    if bio.split('\n').count() > BIO_MAX_LINES {
        return Err(FieldError::BioTooManyLines);
    }
    Ok(())
}
