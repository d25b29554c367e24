use argon2::password_hash::rand_core::OsRng;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use shared::{Error, Result};

const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with Argon2 and a fresh random salt, returning the PHC string
pub fn hash_password(password: &str) -> Result<String> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::internal("password hashing failed", e))
}

/// Verify a password against a stored PHC hash. A malformed hash is an internal error
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| Error::internal("stored password hash is invalid", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::invalid(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_number = password.chars().any(|c| c.is_numeric());

    if !has_letter || !has_number {
        return Err(Error::invalid(
            "password must contain at least one letter and one digit",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("seller_pass1").unwrap();

        assert!(verify_password("seller_pass1", &hash).unwrap());
        assert!(!verify_password("seller_pass2", &hash).unwrap());
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password_strength("phone1234").is_ok());

        // Too short
        assert!(validate_password_strength("ph1").is_err());
        // No digit
        assert!(validate_password_strength("phonephone").is_err());
        // No letter
        assert!(validate_password_strength("12345678").is_err());
    }

    #[test]
    fn test_garbage_hash_is_internal_error() {
        let result = verify_password("whatever1", "not-a-phc-string");
        assert!(matches!(result, Err(Error::Internal(_))));
    }
}
