use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domains::auth::models::{Role, User};

/// Session tokens are valid for 7 days.
const TOKEN_VALIDITY_DAYS: i64 = 7;

/// JWT Claims - data stored in the session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // Subject (user id as string)
    pub user_id: Uuid,         // User UUID
    pub email: String,         // Email channel
    pub mobile_number: String, // Mobile channel
    pub role: Role,            // Access role
    pub exp: i64,              // Expiration timestamp
    pub iat: i64,              // Issued at timestamp
    pub iss: String,           // Issuer
    pub jti: String,           // JWT ID (unique token identifier)
}

/// Why an inbound token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
}

/// JWT Service - creates and verifies session tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// Create new JWT service with secret and issuer
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Mint a session token for a user.
    ///
    /// Token expires after 7 days.
    pub fn create_token(&self, user: &User) -> anyhow::Result<String> {
        self.create_token_with_validity(user, chrono::Duration::days(TOKEN_VALIDITY_DAYS))
    }

    fn create_token_with_validity(
        &self,
        user: &User,
        validity: chrono::Duration,
    ) -> anyhow::Result<String> {
        let now = chrono::Utc::now();
        let exp = now + validity;

        let claims = Claims {
            sub: user.id.to_string(),
            user_id: user.id,
            email: user.email.clone(),
            mobile_number: user.mobile_number.clone(),
            role: user.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a session token.
    ///
    /// Expiry and signature failures are reported distinctly so the API can
    /// tell the client whether to re-login or to fix its request.
    pub fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}
