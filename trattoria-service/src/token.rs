use std::fmt;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Customer => f.write_str("customer"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    exp: usize,
    iat: usize,
    sub: String,
    role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Cannot issue token")]
    Issue,
    #[error("Invalid token")]
    Invalid,
    #[error("Session expired")]
    Expired,
    #[error("Token is not valid for this role")]
    WrongRole,
}

/// Signs and verifies the session tokens carried in cookies.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires: TimeDelta,
}

impl TokenIssuer {
    pub const DEFAULT_EXPIRY_DAYS: i64 = 7;

    pub fn new(secret_key: &[u8]) -> Self {
        Self::with_expiry(secret_key, TimeDelta::days(Self::DEFAULT_EXPIRY_DAYS))
    }

    pub fn with_expiry(secret_key: &[u8], expires: TimeDelta) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret_key),
            decoding_key: DecodingKey::from_secret(secret_key),
            expires,
        }
    }

    pub fn expires_in(&self) -> TimeDelta {
        self.expires
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            exp: (now + self.expires).timestamp() as usize,
            iat: now.timestamp() as usize,
            sub: principal.id.to_string(),
            role: principal.role,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Issue)
    }

    pub fn verify(&self, token: &str, role: Role) -> Result<Principal, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })?;

        if data.claims.role != role {
            return Err(TokenError::WrongRole);
        }
        let id = Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)?;
        Ok(Principal { id, role })
    }
}
