use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use http::request::Parts;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Role, User};

type HmacSha256 = Hmac<Sha256>;

pub const STAFF_ROLES: &[Role] = &[Role::Servant, Role::Admin];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("invalid signing key")]
    InvalidKey,
}

/// HS256 signing secret shared with the issuing auth service.
#[derive(Clone)]
pub struct JwtKey(Arc<str>);

impl JwtKey {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.0.as_bytes()).map_err(|_| AuthError::InvalidKey)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: Uuid,
    role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<i64>,
}

pub fn sign_token(user: &User, key: &JwtKey, ttl: Duration) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user.id,
        role: user.role,
        stage: user.stage.clone(),
        level: user.level.clone(),
        iat: Some(now.timestamp()),
        exp: Some((now + ttl).timestamp()),
        nbf: None,
    };

    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let header_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).map_err(|_| AuthError::InvalidToken)?);
    let payload_b64 =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).map_err(|_| AuthError::InvalidToken)?);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac = key.mac()?;
    mac.update(signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{sig_b64}"))
}

pub fn verify_token(token: &str, key: &JwtKey) -> Result<User, AuthError> {
    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let payload_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let sig_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    if parts.next().is_some() {
        return Err(AuthError::InvalidToken);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let header: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| AuthError::InvalidToken)?;
    if header.get("alg").and_then(|v| v.as_str()) != Some("HS256") {
        return Err(AuthError::InvalidToken);
    }

    let sig = URL_SAFE_NO_PAD
        .decode(sig_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let mut mac = key.mac()?;
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    mac.verify_slice(&sig).map_err(|_| AuthError::InvalidToken)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;

    let now = Utc::now().timestamp();
    if claims.exp.is_some_and(|exp| now >= exp) {
        return Err(AuthError::Expired);
    }
    if claims.nbf.is_some_and(|nbf| now < nbf) {
        return Err(AuthError::NotYetValid);
    }

    Ok(User {
        id: claims.user_id,
        role: claims.role,
        stage: claims.stage,
        level: claims.level,
    })
}

/// Role gate applied by handlers before running a component.
pub fn authorize(user: &User, required: &[Role]) -> bool {
    required.is_empty() || required.contains(&user.role)
}

/// Authenticated caller, taken from a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn require(&self, roles: &[Role]) -> Result<&User, AppError> {
        if authorize(&self.0, roles) {
            Ok(&self.0)
        } else {
            Err(AppError::Forbidden(format!(
                "role `{}` may not perform this action",
                self.0.role.as_str()
            )))
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    JwtKey: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized("missing bearer token".into()))?;

        let key = JwtKey::from_ref(state);
        let user = verify_token(bearer.token(), &key).map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            AppError::Unauthorized(e.to_string())
        })?;
        Ok(AuthUser(user))
    }
}

/// Caller holding a staff role. Extracted from headers alone, so a
/// non-staff caller is refused before any request body is parsed.
#[derive(Debug, Clone)]
pub struct Staff(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Staff
where
    JwtKey: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        auth.require(STAFF_ROLES)?;
        Ok(Staff(auth.0))
    }
}
