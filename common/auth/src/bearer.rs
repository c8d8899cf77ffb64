use crate::error::{AuthError, AuthResult};

/// Returns the token part of an `Authorization` value: everything after the first space.
pub fn token_from_header(raw: &str) -> AuthResult<&str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AuthError::MissingAuthorization);
    }

    let (_, token) = raw
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthorization)?;
    let token = token.trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization);
    }

    Ok(token)
}
