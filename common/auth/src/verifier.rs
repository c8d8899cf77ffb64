use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

#[derive(Clone)]
pub struct JwtVerifier {
    config: JwtConfig,
    key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtVerifier {
    /// HS256 verifier backed by a shared secret.
    pub fn with_hmac_secret(config: JwtConfig, secret: &[u8]) -> Self {
        Self {
            config,
            key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    pub fn builder(config: JwtConfig) -> JwtVerifierBuilder {
        JwtVerifierBuilder::new(config)
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }
        validation.leeway = self.config.leeway_seconds.into();

        let token_data = decode::<Value>(token, &self.key, &validation)?;
        let claims = Claims::try_from(token_data.claims)?;
        debug!(subject = ?claims.subject, roles = ?claims.roles, "verified JWT successfully");
        Ok(claims)
    }
}

pub struct JwtVerifierBuilder {
    config: JwtConfig,
    key: Option<(DecodingKey, Algorithm)>,
}

impl JwtVerifierBuilder {
    fn new(config: JwtConfig) -> Self {
        Self { config, key: None }
    }

    pub fn with_hmac_secret(mut self, secret: &[u8]) -> Self {
        self.key = Some((DecodingKey::from_secret(secret), Algorithm::HS256));
        self
    }

    pub fn with_rsa_pem(mut self, pem: &[u8]) -> AuthResult<Self> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(|err| AuthError::KeyParse(err.to_string()))?;
        self.key = Some((key, Algorithm::RS256));
        Ok(self)
    }

    pub fn build(self) -> AuthResult<JwtVerifier> {
        let (key, algorithm) = self.key.ok_or(AuthError::MissingKey)?;
        Ok(JwtVerifier {
            config: self.config,
            key,
            algorithm,
        })
    }
}
