//! Optional bearer token decoding
//!
//! Tokens issued by the CMS are decoded when `JWT_SECRET` is configured and
//! the caller identity is attached to the request as a [`RequestUser`]
//! extension. Requests are never rejected here; a token that cannot be
//! decoded only means no `RequestUser` is attached.

use crate::app::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use ipl_shared::auth::jwt::{self, JwtError};

/// Caller identity decoded from a bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUser {
    pub id: i32,
    pub email: Option<String>,
}

/// Decodes the `Authorization` header into a [`RequestUser`] when possible
pub async fn decode_bearer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(secret) = state.config.jwt.secret.as_deref() {
        let header_value = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        if let Some(header_value) = header_value {
            match decode_request_user(header_value, secret) {
                Ok(user) => {
                    tracing::debug!(user_id = user.id, "Bearer token accepted");
                    req.extensions_mut().insert(user);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring unusable bearer token");
                }
            }
        }
    }

    next.run(req).await
}

fn decode_request_user(header_value: &str, secret: &str) -> Result<RequestUser, JwtError> {
    let token = jwt::extract_bearer_token(header_value)?;
    let claims = jwt::decode_token(token, secret)?;

    Ok(RequestUser {
        id: claims.id,
        email: claims.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipl_shared::auth::jwt::{create_token, Claims};

    const SECRET: &str = "test-secret";

    #[test]
    fn test_decode_request_user() {
        let claims = Claims::new(7, Some("warga@example.com".to_string()));
        let token = create_token(&claims, SECRET).unwrap();

        let user = decode_request_user(&format!("Bearer {}", token), SECRET).unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.email.as_deref(), Some("warga@example.com"));
    }

    #[test]
    fn test_decode_request_user_rejects_wrong_secret() {
        let token = create_token(&Claims::new(7, None), SECRET).unwrap();
        assert!(decode_request_user(&format!("Bearer {}", token), "other").is_err());
        assert!(decode_request_user("Basic abc", SECRET).is_err());
    }
}
