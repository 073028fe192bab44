//! Connection admission.
//!
//! Bearer tokens are minted by the credential service; this module only
//! checks them and turns the claims into an `Identity`.

use actix_web::HttpRequest;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;

use crate::server::matchmaking::types::Identity;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Auth required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "AUTH_REQUIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
        }
    }
}

/// Verifies a bearer credential and returns who it belongs to.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    id: Value,
    username: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// HS256 tokens signed with a shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Login tokens carry no expiry; `exp` is still checked when present.
        validation.required_spec_claims.clear();
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            log::debug!("[Auth] Token rejected: {}", e);
            AuthError::InvalidToken
        })?;
        let claims = data.claims;
        let user_id = match claims.id {
            Value::String(id) => id,
            Value::Number(id) => id.to_string(),
            _ => return Err(AuthError::InvalidToken),
        };
        Ok(Identity {
            user_id,
            username: claims.display_name.unwrap_or(claims.username),
        })
    }
}

/// Token from `Authorization: Bearer <t>`, or the `token` query parameter
/// for browser websockets which cannot set headers.
pub fn extract_token(req: &HttpRequest) -> Option<String> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());
    if let Some(token) = header.filter(|t| !t.is_empty()) {
        return Some(token);
    }
    token_from_query(req.query_string())
}

fn token_from_query(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|kv| kv.split_once('='))
        .find(|(key, _)| *key == "token")
        .and_then(|(_, raw)| urlencoding::decode(raw).ok())
        .map(|token| token.into_owned())
        .filter(|token| !token.is_empty())
}

/// Resolve the request's identity, or the reason admission is refused.
pub fn authenticate(req: &HttpRequest, verifier: &dyn TokenVerifier) -> Result<Identity, AuthError> {
    let token = extract_token(req).ok_or(AuthError::MissingToken)?;
    verifier.verify(&token)
}
