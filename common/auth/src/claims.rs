use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Application-focused representation of verified JWT claims.
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Option<String>,
    pub roles: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub issuer: Option<String>,
    pub raw: serde_json::Value,
}

impl Claims {
    /// Convenience helper for role checks.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|value| value == role)
    }

    /// First role claim, which is what single-role issuers put on the token.
    pub fn role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    role: Option<RoleRepr>,
    #[serde(default)]
    roles: Option<RoleRepr>,
    #[serde(default, rename = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role")]
    role_uri: Option<RoleRepr>,
    exp: i64,
    #[serde(default)]
    iss: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoleRepr {
    Single(String),
    Many(Vec<String>),
}

impl RoleRepr {
    fn into_vec(self) -> Vec<String> {
        match self {
            RoleRepr::Single(item) => vec![item],
            RoleRepr::Many(items) => items,
        }
    }
}

impl TryFrom<ClaimsRepr> for Claims {
    type Error = AuthError;

    fn try_from(value: ClaimsRepr) -> AuthResult<Self> {
        let expires_at = Utc
            .timestamp_opt(value.exp, 0)
            .single()
            .ok_or_else(|| AuthError::InvalidClaim("exp", value.exp.to_string()))?;

        // Issuers may repeat the role under several keys; keep first-seen order without duplicates.
        let mut roles: Vec<String> = Vec::new();
        for repr in [value.role, value.roles, value.role_uri].into_iter().flatten() {
            for item in repr.into_vec() {
                if !roles.contains(&item) {
                    roles.push(item);
                }
            }
        }

        Ok(Self {
            subject: value.sub,
            roles,
            expires_at,
            issuer: value.iss,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for Claims {
    type Error = AuthError;

    fn try_from(value: serde_json::Value) -> AuthResult<Self> {
        let repr: ClaimsRepr = serde_json::from_value(value.clone())
            .map_err(|err| AuthError::InvalidJson(err.to_string()))?;
        let mut claims = Claims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}
