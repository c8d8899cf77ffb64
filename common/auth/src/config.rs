/// Runtime configuration for JWT verification.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Expected issuer claim (iss). Not checked when unset.
    pub issuer: Option<String>,
    /// Expected audience claim (aud). Not checked when unset.
    pub audience: Option<String>,
    /// Allowable clock skew in seconds when validating exp/nbf.
    pub leeway_seconds: u32,
}

impl JwtConfig {
    /// Construct config with sensible defaults (30 second leeway, no iss/aud checks).
    pub fn new() -> Self {
        Self {
            issuer: None,
            audience: None,
            leeway_seconds: 30,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Adjust the allowed leeway.
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::new()
    }
}
