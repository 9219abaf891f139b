use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::baas::Identity;

/// Role stored in the user metadata of every enrolled rider
pub const ROLE_RIDER: &str = "rider";

/// Audience the BaaS puts on end-user access tokens
pub const JWT_AUDIENCE: &str = "authenticated";

/// Upper bound on token lifetime; longer configured values are clamped
pub const MAX_TOKEN_HOURS: u64 = 24 * 365;

/// Access token claims, in the shape the BaaS issues them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<Value>,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn for_identity(identity: &Identity, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let ttl = Duration::try_hours(expiry_hours.min(MAX_TOKEN_HOURS) as i64).unwrap_or_else(Duration::zero);
        let exp = now.checked_add_signed(ttl).unwrap_or(now).timestamp();

        Self {
            sub: identity.id,
            email: Some(identity.email.clone()),
            role: Some(JWT_AUDIENCE.to_string()),
            user_metadata: Some(json!({ "role": identity.role })),
            aud: JWT_AUDIENCE.to_string(),
            exp,
            iat: now.timestamp(),
        }
    }

    /// Application role from the user metadata
    pub fn app_role(&self) -> Option<&str> {
        self.user_metadata
            .as_ref()
            .and_then(|m| m.get("role"))
            .and_then(|r| r.as_str())
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_audience(&[JWT_AUDIENCE]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

/// Authenticated dashboard operator, extracted from a validated access token
#[derive(Clone, Debug, Serialize)]
pub struct StaffUser {
    pub id: Uuid,
    pub email: String,
    pub role: Option<String>,
    #[serde(skip)]
    pub access_token: String,
}

impl StaffUser {
    pub fn from_claims(claims: Claims, access_token: String) -> Self {
        let role = claims.app_role().map(str::to_string);
        Self {
            id: claims.sub,
            email: claims.email.unwrap_or_default(),
            role,
            access_token,
        }
    }

    pub fn is_rider(&self) -> bool {
        self.role.as_deref() == Some(ROLE_RIDER)
    }
}
