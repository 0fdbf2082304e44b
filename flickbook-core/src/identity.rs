use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use flickbook_shared::pii::Masked;
use rand::rngs::OsRng;

use crate::{CoreError, CoreResult};

/// Argon2id hashing with a per-user salt and a server-wide pepper.
///
/// The pepper is fed to Argon2 as its secret input, so a leaked database
/// alone is not enough to brute-force passwords.
#[derive(Clone)]
pub struct Credentials {
    pepper: Masked<Vec<u8>>,
}

impl Credentials {
    pub fn new(pepper: impl Into<Vec<u8>>) -> Self {
        Self {
            pepper: Masked(pepper.into()),
        }
    }

    fn argon(&self) -> CoreResult<Argon2<'_>> {
        Argon2::new_with_secret(
            self.pepper.expose(),
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| CoreError::IdentityError(e.to_string()))
    }

    /// Returns the PHC hash string and the salt it embeds.
    pub fn hash_password(&self, password: &str) -> CoreResult<(Masked<String>, String)> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CoreError::IdentityError(e.to_string()))?
            .to_string();

        Ok((Masked(hash), salt.as_str().to_string()))
    }

    pub fn verify_password(&self, password: &str, stored_hash: &str) -> CoreResult<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| CoreError::IdentityError(e.to_string()))?;

        match self.argon()?.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CoreError::IdentityError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let credentials = Credentials::new("pepper");
        let (hash, salt) = credentials.hash_password("Valid123!").unwrap();

        assert!(hash.expose().contains(&salt));
        assert!(credentials.verify_password("Valid123!", hash.expose()).unwrap());
        assert!(!credentials.verify_password("WrongPass1!", hash.expose()).unwrap());
    }

    #[test]
    fn test_pepper_is_part_of_the_hash() {
        let (hash, _) = Credentials::new("pepper-a").hash_password("Valid123!").unwrap();
        let other = Credentials::new("pepper-b");

        assert!(!other.verify_password("Valid123!", hash.expose()).unwrap());
    }

    #[test]
    fn test_salts_differ_per_hash() {
        let credentials = Credentials::new("pepper");
        let (_, first) = credentials.hash_password("Valid123!").unwrap();
        let (_, second) = credentials.hash_password("Valid123!").unwrap();
        assert_ne!(first, second);
    }
}
