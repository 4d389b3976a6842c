use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::SaltString;
use rand_core::OsRng;

use super::Password;

/// A salted argon2 hash of a password in PHC string form, as stored in the
/// `password` column.
#[derive(Clone, Debug, PartialEq)]
pub struct Hash(String);

impl Hash {
    /// Hash a validated password with a fresh salt.
    pub fn of(password: &Password) -> anyhow::Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default().hash_password(password.as_bytes(), salt.as_ref())?;

        Ok(Self(phc.to_string()))
    }

    /// Wrap a stored hash, rejecting values that are not PHC strings.
    pub fn parse(stored: &str) -> anyhow::Result<Self> {
        PasswordHash::new(stored)?;

        Ok(Self(stored.to_owned()))
    }

    /// Check a login attempt against the hash.
    ///
    /// A wrong password is `Ok(false)`. Errors are reserved for hashes argon2
    /// cannot work with.
    pub fn verify(&self, attempt: &str) -> anyhow::Result<bool> {
        let phc = PasswordHash::new(&self.0)?;

        match Argon2::default().verify_password(attempt.as_bytes(), &phc) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(other) => Err(other.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
