use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{error::AppError, models::AppState};

/// Audience every accepted token must carry.
pub const AUDIENCE: &str = "authenticated";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,
    #[error("authorization header is not a bearer token")]
    MalformedHeader,
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token audience is invalid")]
    InvalidAudience,
    #[error("token has no subject")]
    MissingSubject,
    #[error("invalid token: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: String,
    pub exp: u64,
    pub aud: String,
}

/// Caller identity, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        validation.set_required_spec_claims(&["exp", "aud", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature, expiry and audience and return the subject.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] kind describing why the token was refused.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => {
                    AuthError::MissingSubject
                }
                _ => AuthError::Invalid(e.to_string()),
            }
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }
        Ok(data.claims.sub)
    }

    /// Parse an `Authorization` header value and verify the bearer token.
    ///
    /// # Errors
    ///
    /// See [`JwtVerifier::verify`]; also fails on absent or non-bearer headers.
    pub fn verify_header(&self, value: Option<&str>) -> Result<String, AuthError> {
        let value = value.ok_or(AuthError::MissingHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedHeader)?;
        self.verify(token)
    }
}

/// Mint an HS256 token for `sub` that this service will accept.
///
/// # Errors
///
/// Will return err if signing fails.
pub fn issue_token(secret: &str, sub: &str, exp: u64) -> jsonwebtoken::errors::Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub: sub.to_string(),
            exp,
            aud: AUDIENCE.to_string(),
        },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Reject the request unless it carries a valid bearer token, then hand the
/// subject to handlers as [`AuthUser`].
///
/// # Errors
///
/// [`AppError::Auth`] with the reason the token was refused.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let user_id = state.jwt.verify_header(header_value).map_err(|e| {
        tracing::info!(reason = %e, "rejected request");
        AppError::Auth(e)
    })?;

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    fn now() -> u64 {
        u64::try_from(chrono::Utc::now().timestamp()).unwrap()
    }

    fn token_with(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_yields_subject() {
        let v = JwtVerifier::new(SECRET);
        let token = issue_token(SECRET, "user-123", now() + 3600).unwrap();
        assert_eq!(v.verify(&token).unwrap(), "user-123");
        assert_eq!(
            v.verify_header(Some(&format!("Bearer {token}"))).unwrap(),
            "user-123"
        );
    }

    #[test]
    fn expired_and_bad_signature_are_distinct() {
        let v = JwtVerifier::new(SECRET);

        let expired = issue_token(SECRET, "u", now() - 3600).unwrap();
        assert_eq!(v.verify(&expired), Err(AuthError::Expired));

        let forged = issue_token("someone-else", "u", now() + 3600).unwrap();
        assert_eq!(v.verify(&forged), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let v = JwtVerifier::new(SECRET);
        let token = token_with(
            &serde_json::json!({"sub": "u", "exp": now() + 3600, "aud": "anon"}),
            SECRET,
        );
        assert_eq!(v.verify(&token), Err(AuthError::InvalidAudience));
    }

    #[test]
    fn empty_subject_is_rejected() {
        let v = JwtVerifier::new(SECRET);
        let token = token_with(
            &serde_json::json!({"sub": "", "exp": now() + 3600, "aud": AUDIENCE}),
            SECRET,
        );
        assert_eq!(v.verify(&token), Err(AuthError::MissingSubject));
    }

    #[test]
    fn absent_subject_is_rejected() {
        let v = JwtVerifier::new(SECRET);
        let token = token_with(
            &serde_json::json!({"exp": now() + 3600, "aud": AUDIENCE}),
            SECRET,
        );
        assert_eq!(v.verify(&token), Err(AuthError::MissingSubject));
    }

    #[test]
    fn header_shape_is_checked() {
        let v = JwtVerifier::new(SECRET);
        assert_eq!(v.verify_header(None), Err(AuthError::MissingHeader));
        assert_eq!(
            v.verify_header(Some("Basic abc")),
            Err(AuthError::MalformedHeader)
        );
        assert_eq!(
            v.verify_header(Some("Bearer ")),
            Err(AuthError::MalformedHeader)
        );
        assert!(matches!(
            v.verify_header(Some("Bearer not-a-jwt")),
            Err(AuthError::Invalid(_))
        ));
    }
}
