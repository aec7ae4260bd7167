// Token verification core.

use std::collections::HashMap;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use society_core::{Actor, Role, SocietyError};
use thiserror::Error;

use crate::options::JwtOptions;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("JWT secret is not configured")]
    MissingSecret,
    #[error("JWT secret must be at least 32 characters")]
    WeakSecret,
    #[error("invalid authentication configuration: {0}")]
    Config(String),
    #[error("Not authenticated")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl From<AuthError> for SocietyError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) => SocietyError::not_authenticated(message),
            AuthError::MissingSecret | AuthError::WeakSecret | AuthError::Config(_) => {
                SocietyError::general_error(message)
            }
        }
    }
}

impl AuthError {
    pub fn into_anyhow(self) -> anyhow::Error {
        SocietyError::from(self).into_anyhow()
    }
}

/// Access token payload.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Resident id, guard id, or the society id for the admin portal.
    pub sub: String,
    pub role: Role,
    pub society_id: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.sub.clone(),
            role: self.role,
        }
    }
}

/// `Authorization: Bearer <token>`; header names are matched case-insensitively.
pub fn extract_bearer_token(headers: &HashMap<String, String>) -> Option<String> {
    let v = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
        .map(|(_, v)| v.trim())?;
    let token = v.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Signs and verifies HS256 tokens for one configuration.
pub struct JwtVerifier {
    options: JwtOptions,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(options: JwtOptions) -> Result<Self, AuthError> {
        options.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = options.leeway_secs;
        if !options.issuer.is_empty() {
            validation.set_issuer(&[options.issuer.as_str()]);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(options.secret.as_bytes()),
            decoding: DecodingKey::from_secret(options.secret.as_bytes()),
            validation,
            options,
        })
    }

    pub fn options(&self) -> &JwtOptions {
        &self.options
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// Sign a token for `sub` valid for the configured lifetime.
    pub fn issue(&self, sub: &str, role: Role, society_id: &str) -> Result<String, AuthError> {
        let lifetime = i64::try_from(self.options.access_token_expires_in.as_secs())
            .map_err(|_| AuthError::Config("token lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: sub.to_string(),
            role,
            society_id: society_id.to_string(),
            exp: Utc::now().timestamp() + lifetime,
            iss: (!self.options.issuer.is_empty()).then(|| self.options.issuer.clone()),
        };
        self.sign(&claims)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = data.claims;
        if claims.sub.trim().is_empty() || claims.society_id.trim().is_empty() {
            return Err(AuthError::InvalidToken("missing subject or society".to_string()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(JwtOptions::new(SECRET)).unwrap()
    }

    #[test]
    fn bearer_token_is_extracted_from_any_header_case() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer abc.def".to_string());
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert("Authorization".to_string(), "Basic abc".to_string());
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let v = verifier();
        let token = v.issue("res:1", Role::Resident, "soc-1").unwrap();
        let claims = v.verify(&token).unwrap();
        assert_eq!(claims.sub, "res:1");
        assert_eq!(claims.role, Role::Resident);
        assert_eq!(claims.society_id, "soc-1");
        assert_eq!(claims.iss.as_deref(), Some("society-api"));
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let v = verifier();
        let expired = v
            .sign(&Claims {
                sub: "g-1".into(),
                role: Role::Guard,
                society_id: "soc-1".into(),
                exp: Utc::now().timestamp() - 3600,
                iss: Some("society-api".into()),
            })
            .unwrap();
        assert!(matches!(v.verify(&expired), Err(AuthError::InvalidToken(_))));

        let other = JwtVerifier::new(JwtOptions::new("ffffffffffffffffffffffffffffffff")).unwrap();
        let token = other.issue("g-1", Role::Guard, "soc-1").unwrap();
        assert!(matches!(v.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let v = verifier();
        let other = JwtVerifier::new(JwtOptions::new(SECRET).with_issuer("someone-else")).unwrap();
        let token = other.issue("adm", Role::Admin, "soc-1").unwrap();
        assert!(v.verify(&token).is_err());
    }
}
