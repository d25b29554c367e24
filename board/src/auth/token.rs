use crate::domain::{Identity, UserId};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// JWT payload carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: Duration,
}

/// Signs and verifies HS256 access tokens with a secret loaded at startup.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: UserId) -> Result<IssuedToken> {
        let now = unix_now();
        let claims = Claims {
            user_id,
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        let token = self.sign(&claims)?;
        Ok(IssuedToken {
            token,
            expires_in: self.ttl,
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Error::internal("failed to sign token", e))
    }

    /// Every rejection (bad signature, expired, malformed) collapses into `Unauthenticated`.
    pub fn verify(&self, token: &str) -> Result<Identity> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "rejected access token");
                Error::Unauthenticated
            })?;

        if data.claims.user_id <= 0 {
            return Err(Error::Unauthenticated);
        }

        Ok(Identity::new(data.claims.user_id))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
