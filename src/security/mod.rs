//! Security helpers used by models
//!
//! Password hashing and email validation sit behind traits so a model can be
//! handed a different implementation, e.g. a cheap hasher in tests.

pub mod password;
pub mod validation;

pub use password::{BcryptHasher, PasswordHasher, Security, DEFAULT_BCRYPT_COST};
pub use validation::{EmailValidator, RegexEmailValidator};
