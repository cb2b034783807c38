//! Bearer token decoding for tokens issued by the CMS
//!
//! The CMS (Strapi) signs user tokens with HMAC and a shared secret. Its
//! claims carry the numeric user id as `id` rather than `sub`. This service
//! only decodes tokens to learn who is calling; it never issues them outside
//! of tests and never rejects a request because of them.
//!
//! # Example
//!
//! ```
//! use ipl_shared::auth::jwt::{create_token, decode_token, extract_bearer_token, Claims};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let secret = "local-development-secret";
//! let token = create_token(&Claims::new(7, Some("warga@example.com".into())), secret)?;
//!
//! let header = format!("Bearer {}", token);
//! let claims = decode_token(extract_bearer_token(&header)?, secret)?;
//! assert_eq!(claims.id, 7);
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Authorization header is empty
    #[error("authorization header is required")]
    MissingHeader,

    /// Authorization header is not `Bearer <token>`
    #[error("authorization header format must be Bearer {{token}}")]
    InvalidFormat,

    /// Failed to create token
    #[error("failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("token has expired")]
    Expired,

    /// Signature, algorithm or payload rejected
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Claims of a CMS user token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (`up_users.id`)
    pub id: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims valid for 30 days, the CMS default
    pub fn new(user_id: i32, email: Option<String>) -> Self {
        Self::with_expiration(user_id, email, Duration::days(30))
    }

    /// Creates claims with a custom lifetime
    pub fn with_expiration(user_id: i32, email: Option<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            id: user_id,
            email,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }
}

/// Extracts the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(header_value: &str) -> Result<&str, JwtError> {
    let header_value = header_value.trim();
    if header_value.is_empty() {
        return Err(JwtError::MissingHeader);
    }

    let (scheme, token) = header_value
        .split_once(' ')
        .ok_or(JwtError::InvalidFormat)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(JwtError::InvalidFormat);
    }

    Ok(token)
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Verifies a token's HMAC signature and expiry and returns its claims
///
/// Any HMAC variant is accepted; asymmetric algorithms are rejected.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(e.to_string()),
    })?;

    Ok(token_data.claims)
}
