//! Password hashing

use crate::error::{Error, Result};
use crate::security::validation::{EmailValidator, RegexEmailValidator};
use std::fmt;
use std::sync::Arc;

/// Work factor used when nothing else is configured
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Lowest work factor bcrypt accepts
pub const MIN_BCRYPT_COST: u32 = 4;
/// Highest work factor bcrypt accepts
pub const MAX_BCRYPT_COST: u32 = 31;

/// One-way password hashing
pub trait PasswordHasher: Send + Sync {
    /// Hash a password with the given work factor. A random salt is drawn
    /// when none is given.
    fn hash(&self, password: &str, salt: Option<[u8; 16]>, cost: u32) -> Result<String>;

    /// Check a password against a stored hash. Malformed hashes never verify.
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// Whether a stored hash was produced with a different algorithm or cost
    fn needs_rehash(&self, hash: &str, cost: u32) -> bool;
}

/// bcrypt in the `$2y$` format
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptHasher;

impl BcryptHasher {
    /// Work factor encoded in a `$2?$NN$...` hash
    pub fn cost_of(hash: &str) -> Option<u32> {
        let mut parts = hash.split('$');
        if !parts.next()?.is_empty() {
            return None;
        }
        let version = parts.next()?;
        if !matches!(version, "2a" | "2b" | "2x" | "2y") {
            return None;
        }
        let cost = parts.next()?;
        if cost.len() != 2 {
            return None;
        }
        cost.parse().ok()
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str, salt: Option<[u8; 16]>, cost: u32) -> Result<String> {
        let salt = salt.unwrap_or_else(rand::random);
        bcrypt::hash_with_salt(password, cost, salt)
            .map(|parts| parts.format_for_version(bcrypt::Version::TwoY))
            .map_err(|e| {
                log::error!("Password hashing failed: {}", e);
                Error::operation_failed("Password hashing")
            })
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    fn needs_rehash(&self, hash: &str, cost: u32) -> bool {
        Self::cost_of(hash) != Some(cost)
    }
}

/// Hasher, email validator and work factor shared by the models of an application
#[derive(Clone)]
pub struct Security {
    hasher: Arc<dyn PasswordHasher>,
    email: Arc<dyn EmailValidator>,
    cost: u32,
}

impl Security {
    pub fn new(hasher: Arc<dyn PasswordHasher>, email: Arc<dyn EmailValidator>, cost: u32) -> Self {
        Self { hasher, email, cost }
    }

    /// Replace the work factor
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Replace the password hasher
    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the email validator
    pub fn with_email_validator(mut self, email: Arc<dyn EmailValidator>) -> Self {
        self.email = email;
        self
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hasher(&self) -> &dyn PasswordHasher {
        self.hasher.as_ref()
    }

    pub fn email_validator(&self) -> &dyn EmailValidator {
        self.email.as_ref()
    }

    /// Hash with the configured work factor
    pub fn hash(&self, password: &str) -> Result<String> {
        self.hasher.hash(password, None, self.cost)
    }

    /// Hash with an explicit salt and work factor
    pub fn hash_with(&self, password: &str, salt: Option<[u8; 16]>, cost: u32) -> Result<String> {
        self.hasher.hash(password, salt, cost)
    }

    pub fn verify(&self, password: &str, hash: &str) -> bool {
        self.hasher.verify(password, hash)
    }

    pub fn needs_rehash(&self, hash: &str) -> bool {
        self.hasher.needs_rehash(hash, self.cost)
    }

    pub fn needs_rehash_with_cost(&self, hash: &str, cost: u32) -> bool {
        self.hasher.needs_rehash(hash, cost)
    }

    pub fn is_email(&self, value: &str) -> bool {
        self.email.is_valid(value)
    }
}

impl Default for Security {
    fn default() -> Self {
        Self::new(
            Arc::new(BcryptHasher),
            Arc::new(RegexEmailValidator),
            DEFAULT_BCRYPT_COST,
        )
    }
}

impl fmt::Debug for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Security").field("cost", &self.cost).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = BcryptHasher;
        let hash = hasher.hash("hunter2", None, MIN_BCRYPT_COST).unwrap();

        assert!(hash.starts_with("$2y$04$"));
        assert_eq!(hash.len(), 60);
        assert!(hasher.verify("hunter2", &hash));
        assert!(!hasher.verify("hunter3", &hash));
    }

    #[test]
    fn test_salted() {
        let hasher = BcryptHasher;
        let first = hasher.hash("secret", None, MIN_BCRYPT_COST).unwrap();
        let second = hasher.hash("secret", None, MIN_BCRYPT_COST).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_fixed_salt_is_deterministic() {
        let salt = [7u8; 16];
        let first = BcryptHasher.hash("secret", Some(salt), MIN_BCRYPT_COST).unwrap();
        let second = BcryptHasher.hash("secret", Some(salt), MIN_BCRYPT_COST).unwrap();
        assert_eq!(first, second);
        assert!(BcryptHasher.verify("secret", &first));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!BcryptHasher.verify("secret", "not-a-hash"));
        assert!(!BcryptHasher.verify("secret", ""));
    }

    #[test]
    fn test_invalid_cost_fails() {
        let err = BcryptHasher.hash("secret", None, 2).unwrap_err();
        assert_eq!(err.to_string(), "Password hashing failed.");
    }

    #[test]
    fn test_needs_rehash() {
        let hash = BcryptHasher.hash("secret", None, 5).unwrap();
        assert!(!BcryptHasher.needs_rehash(&hash, 5));
        assert!(BcryptHasher.needs_rehash(&hash, 6));
        assert!(BcryptHasher.needs_rehash("5f4dcc3b5aa765d61d8327deb882cf99", 5));
    }

    #[test]
    fn test_cost_of() {
        assert_eq!(
            BcryptHasher::cost_of("$2y$10$abcdefghijklmnopqrstuu"),
            Some(10)
        );
        assert_eq!(BcryptHasher::cost_of("$2b$07$x"), Some(7));
        assert_eq!(BcryptHasher::cost_of("$1$10$x"), None);
        assert_eq!(BcryptHasher::cost_of("plain"), None);
    }

    #[test]
    fn test_security_defaults() {
        let security = Security::default();
        assert_eq!(security.cost(), DEFAULT_BCRYPT_COST);
        assert!(security.is_email("user@example.com"));

        let fast = security.with_cost(MIN_BCRYPT_COST);
        let hash = fast.hash("pw").unwrap();
        assert!(fast.verify("pw", &hash));
        assert!(!fast.needs_rehash(&hash));
    }
}
