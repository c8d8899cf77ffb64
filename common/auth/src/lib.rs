pub mod bearer;
pub mod claims;
pub mod config;
pub mod error;
pub mod roles;
pub mod verifier;

pub use bearer::token_from_header;
pub use claims::Claims;
pub use config::JwtConfig;
pub use error::{AuthError, AuthResult};
pub use roles::{ROLE_ADMIN, ROLE_CLAIM_URI, ROLE_SALES};
pub use verifier::{JwtVerifier, JwtVerifierBuilder};
