use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use common_auth::{token_from_header, JwtVerifier};
use common_http_errors::ApiError;
use serde::{Deserialize, Serialize};
use tracing::Span;

use crate::error::SecurityError;
use crate::roles::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityContext {
    pub subject: Option<String>,
    pub roles: Vec<Role>,
}

/// Raw, non-empty `Authorization` header value. The token itself is not decoded.
#[derive(Debug, Clone)]
pub struct AuthHeader(pub String);

/// Verified caller identity decoded from the bearer token.
pub struct SecurityCtxExtractor(pub SecurityContext);

fn authorization_from_headers(headers: &HeaderMap) -> Result<String, SecurityError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();
    if value.is_empty() {
        return Err(SecurityError::MissingAuthorization);
    }
    Ok(value.to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthHeader where S: Send + Sync {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthHeader(authorization_from_headers(&parts.headers)?))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SecurityCtxExtractor
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);
        let header = authorization_from_headers(&parts.headers)?;
        let token = token_from_header(&header).map_err(SecurityError::from)?;
        let claims = verifier.verify(token).map_err(SecurityError::from)?;

        let roles = claims.roles.iter().map(|r| Role::from_str(r)).collect();
        if let Some(subject) = claims.subject.as_deref() {
            Span::current().record("subject", tracing::field::display(subject));
        }

        Ok(SecurityCtxExtractor(SecurityContext { subject: claims.subject, roles }))
    }
}
