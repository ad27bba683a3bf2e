use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{Config, IdentityProviderKind};
use crate::error::{Error, Result};

/// A signed-in operator as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub email: String,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("identity provider is misconfigured: {0}")]
    Misconfigured(String),

    #[error("sign-in was cancelled")]
    Cancelled,

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("email address is not verified")]
    Unverified,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Verifies the credential produced by the external sign-in flow.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, credential: &str) -> std::result::Result<Identity, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: Option<String>,
    email: Option<String>,
    email_verified: Option<bool>,
}

/// HS256 ID tokens signed with a secret shared with the provider.
pub struct JwtIdentityProvider {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, issuer: Option<&str>, audience: Option<&str>) -> Self {
        let key = (!secret.is_empty()).then(|| DecodingKey::from_secret(secret.as_bytes()));
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        Self { key, validation }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, credential: &str) -> std::result::Result<Identity, IdentityError> {
        let Some(key) = &self.key else {
            return Err(IdentityError::Misconfigured(
                "no signing secret configured".to_string(),
            ));
        };
        if credential.trim().is_empty() {
            return Err(IdentityError::Cancelled);
        }
        let data = decode::<IdTokenClaims>(credential, key, &self.validation)
            .map_err(|e| IdentityError::InvalidCredential(e.to_string()))?;
        identity_from_claims(data.claims.email, data.claims.email_verified, data.claims.sub)
    }
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    email_verified: Option<bool>,
    aud: Option<String>,
    sub: Option<String>,
}

/// Token-info endpoints report booleans either as JSON booleans or as
/// `"true"`/`"false"` strings.
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Repr>::deserialize(deserializer)? {
        Some(Repr::Bool(b)) => Some(b),
        Some(Repr::Text(s)) => Some(s.eq_ignore_ascii_case("true")),
        None => None,
    })
}

/// Delegates verification to the provider's token-info endpoint.
pub struct TokenInfoIdentityProvider {
    client: Client,
    endpoint: String,
    audience: Option<String>,
}

impl TokenInfoIdentityProvider {
    pub fn new(client: Client, endpoint: impl Into<String>, audience: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            audience,
        }
    }
}

#[async_trait]
impl IdentityProvider for TokenInfoIdentityProvider {
    async fn verify(&self, credential: &str) -> std::result::Result<Identity, IdentityError> {
        if self.endpoint.is_empty() {
            return Err(IdentityError::Misconfigured(
                "no token-info endpoint configured".to_string(),
            ));
        }
        if credential.trim().is_empty() {
            return Err(IdentityError::Cancelled);
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(IdentityError::InvalidCredential(
                    "token rejected by provider".to_string(),
                ))
            }
            other => {
                return Err(IdentityError::Unavailable(format!(
                    "provider responded with {}",
                    other
                )))
            }
        }

        let info: TokenInfo = resp
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if let Some(expected) = &self.audience {
            if info.aud.as_deref() != Some(expected.as_str()) {
                return Err(IdentityError::InvalidCredential(
                    "token issued for another audience".to_string(),
                ));
            }
        }
        identity_from_claims(info.email, info.email_verified, info.sub)
    }
}

fn identity_from_claims(
    email: Option<String>,
    email_verified: Option<bool>,
    subject: Option<String>,
) -> std::result::Result<Identity, IdentityError> {
    let email = email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| IdentityError::InvalidCredential("token carries no email".to_string()))?;
    if email_verified == Some(false) {
        return Err(IdentityError::Unverified);
    }
    Ok(Identity { email, subject })
}

/// Builds the provider selected by configuration.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn IdentityProvider>> {
    match config.identity_provider {
        IdentityProviderKind::Jwt => {
            let secret = config.identity_jwt_secret.as_deref().unwrap_or_default();
            if secret.is_empty() {
                tracing::warn!("IDENTITY_JWT_SECRET is not set; admin sign-in will fail");
            }
            Ok(Arc::new(JwtIdentityProvider::new(
                secret,
                config.identity_issuer.as_deref(),
                config.identity_audience.as_deref(),
            )))
        }
        IdentityProviderKind::TokenInfo => {
            let endpoint = config.identity_tokeninfo_url.clone().ok_or_else(|| {
                Error::Config("IDENTITY_TOKENINFO_URL is required for the tokeninfo provider".into())
            })?;
            let client = Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .map_err(|e| Error::Internal(format!("HTTP client: {}", e)))?;
            Ok(Arc::new(TokenInfoIdentityProvider::new(
                client,
                endpoint,
                config.identity_audience.clone(),
            )))
        }
    }
}
