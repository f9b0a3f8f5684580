//! Email validation

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest address accepted, per RFC 5321
pub const MAX_EMAIL_LENGTH: usize = 254;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

/// Decides whether a string is a well-formed email address
pub trait EmailValidator: Send + Sync {
    fn is_valid(&self, value: &str) -> bool;
}

/// Pattern-based validator
///
/// Checks the shape of the address only. No DNS lookup is made.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexEmailValidator;

impl EmailValidator for RegexEmailValidator {
    fn is_valid(&self, value: &str) -> bool {
        !value.is_empty() && value.len() <= MAX_EMAIL_LENGTH && EMAIL_REGEX.is_match(value)
    }
}

impl<F> EmailValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &str) -> bool {
        self(value)
    }
}
