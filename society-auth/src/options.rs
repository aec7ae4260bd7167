use std::time::Duration;

use society_core::ConfigSnapshot;

use crate::core::AuthError;

pub const DEFAULT_ISSUER: &str = "society-api";

/// HS256 settings, read from the `auth.jwt.*` config keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JwtOptions {
    /// HMAC secret.
    pub secret: String,
    /// Expected `iss` claim; empty disables the check.
    pub issuer: String,
    /// Clock skew tolerated on `exp`.
    pub leeway_secs: u64,
    /// Lifetime of tokens signed by [`JwtVerifier::issue`](crate::JwtVerifier::issue).
    pub access_token_expires_in: Duration,
}

impl JwtOptions {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            leeway_secs: 30,
            access_token_expires_in: Duration::from_secs(3600),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// `auth.jwt.secret` is required; `auth.jwt.issuer`,
    /// `auth.jwt.leeway_secs` and `auth.jwt.expires_in_secs` are optional.
    pub fn from_config(cfg: &ConfigSnapshot) -> Result<Self, AuthError> {
        let secret = cfg
            .get_string("auth.jwt.secret")
            .filter(|s| !s.trim().is_empty())
            .ok_or(AuthError::MissingSecret)?;

        let mut options = Self::new(secret);
        if let Some(issuer) = cfg.get_string("auth.jwt.issuer") {
            options.issuer = issuer;
        }
        if let Some(leeway) = cfg.get_u64("auth.jwt.leeway_secs") {
            options.leeway_secs = leeway;
        }
        if let Some(secs) = cfg.get_u64("auth.jwt.expires_in_secs") {
            options.access_token_expires_in = Duration::from_secs(secs);
        }
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.secret.trim().is_empty() {
            return Err(AuthError::MissingSecret);
        }
        if self.secret.len() < 32 {
            return Err(AuthError::WeakSecret);
        }
        if self.access_token_expires_in.as_secs() == 0 {
            return Err(AuthError::Config(
                "access token expiration must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use society_core::SocietyConfig;

    use super::*;

    #[test]
    fn reads_jwt_keys_from_config() {
        let mut cfg = SocietyConfig::new();
        cfg.set("auth.jwt.secret", "0123456789abcdef0123456789abcdef");
        cfg.set("auth.jwt.issuer", "green-acres");
        cfg.set("auth.jwt.expires_in_secs", "600");

        let options = JwtOptions::from_config(&cfg.snapshot()).unwrap();
        assert_eq!(options.issuer, "green-acres");
        assert_eq!(options.leeway_secs, 30);
        assert_eq!(options.access_token_expires_in, Duration::from_secs(600));
    }

    #[test]
    fn short_or_missing_secrets_are_rejected() {
        let cfg = SocietyConfig::new();
        assert_eq!(JwtOptions::from_config(&cfg.snapshot()), Err(AuthError::MissingSecret));
        assert_eq!(JwtOptions::new("short").validate(), Err(AuthError::WeakSecret));
    }
}
