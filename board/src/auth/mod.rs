pub mod password;
pub mod token;

pub use password::{hash_password, validate_password_strength, verify_password};
pub use token::{Claims, IssuedToken, TokenIssuer};

use crate::domain::Identity;
use shared::{Error, Result};

/// Turns an optional caller into a hard requirement.
pub fn require_identity(caller: Option<&Identity>) -> Result<&Identity> {
    caller.ok_or(Error::Unauthenticated)
}
