//! Access-control gate.
//!
//! Tokens are issued elsewhere; this module only verifies them and turns the
//! claims into a service [`Identity`]. Every protected handler takes an
//! [`Authenticated`] argument, so a request without a valid bearer token is
//! rejected before any handler logic runs.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use model::entities::user_detail::Role;
use serde::{Deserialize, Serialize};
use service::Identity;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::error::ApiError;
use crate::schemas::AppState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Authorization header is not a bearer token")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Unknown role '{0}' in token")]
    UnknownRole(String),
}

/// Claims carried by the access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id, as a string
    pub sub: String,
    /// `Admin`, `Supervisor` or `Student`
    pub role: String,
    /// Expiry as a unix timestamp
    pub exp: usize,
}

/// Turns a bearer token into the identity it vouches for.
pub trait TokenVerifier: Send + Sync + fmt::Debug {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Verifies HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        let user_id = data.claims.sub.parse::<i32>().map_err(|_| {
            debug!("Token subject '{}' is not a user id", data.claims.sub);
            AuthError::InvalidToken
        })?;
        let role = Role::parse(&data.claims.role)
            .ok_or_else(|| AuthError::UnknownRole(data.claims.role.clone()))?;

        Ok(Identity::new(user_id, role))
    }
}

/// Extractor yielding the caller's identity from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Identity);

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::MalformedHeader),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        trace!("Authenticating {} {}", parts.method, parts.uri.path());
        let token = bearer_token(parts).inspect_err(|e| {
            warn!("Rejected request to {}: {}", parts.uri.path(), e);
        })?;
        let identity = state.verifier.verify(token).inspect_err(|e| {
            warn!("Rejected request to {}: {}", parts.uri.path(), e);
        })?;
        debug!(
            "Authenticated user {} as {}",
            identity.user_id,
            identity.role.as_str()
        );
        Ok(Authenticated(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &[u8] = b"unit-test-secret";

    fn token(sub: &str, role: &str, exp: usize) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    fn in_an_hour() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_verify_accepts_valid_token() {
        let verifier = JwtVerifier::new(SECRET);
        let identity = verifier.verify(&token("7", "Supervisor", in_an_hour())).unwrap();
        assert_eq!(identity, Identity::new(7, Role::Supervisor));
    }

    #[test]
    fn test_verify_rejects_bad_tokens() {
        let verifier = JwtVerifier::new(SECRET);
        let expired = (chrono::Utc::now().timestamp() - 3600) as usize;

        assert_eq!(verifier.verify(&token("7", "Admin", expired)), Err(AuthError::InvalidToken));
        assert_eq!(verifier.verify(&token("abc", "Admin", in_an_hour())), Err(AuthError::InvalidToken));
        assert_eq!(
            verifier.verify(&token("7", "Janitor", in_an_hour())),
            Err(AuthError::UnknownRole("Janitor".to_string()))
        );
        assert_eq!(verifier.verify("not-a-jwt"), Err(AuthError::InvalidToken));

        let other = JwtVerifier::new(b"another-secret");
        assert_eq!(other.verify(&token("7", "Admin", in_an_hour())), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let parts = |value: Option<&str>| {
            let mut builder = Request::builder().uri("/api/v1/users");
            if let Some(value) = value {
                builder = builder.header(AUTHORIZATION, value);
            }
            builder.body(()).unwrap().into_parts().0
        };

        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Ok("abc"));
        assert_eq!(bearer_token(&parts(Some("bearer abc"))), Ok("abc"));
        assert_eq!(bearer_token(&parts(None)), Err(AuthError::MissingToken));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), Err(AuthError::MalformedHeader));
        assert_eq!(bearer_token(&parts(Some("Bearer "))), Err(AuthError::MalformedHeader));
    }
}
