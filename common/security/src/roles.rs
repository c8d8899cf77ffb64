use common_auth::{ROLE_ADMIN, ROLE_SALES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Sales,
    Unknown(String),
}

impl Role {
    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" | ROLE_ADMIN => Role::Admin,
            "sales" | ROLE_SALES => Role::Sales,
            other => Role::Unknown(other.to_string()),
        }
    }
}
