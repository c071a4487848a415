use std::sync::Arc;

use jsonwebtoken::{Algorithm, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::jwks::{JwksCache, KeySource};
use super::AuthError;
use crate::BridgeConfig;

/// Clock-skew tolerance applied to `exp` and `nbf`.
const LEEWAY_SECS: u64 = 60;

/// What an access token must satisfy.
#[derive(Clone, Debug)]
pub struct EntraSettings {
    pub tenant_id: String,
    pub audience: String,
    pub issuer: String,
    pub leeway_secs: u64,
}

impl EntraSettings {
    pub fn new(tenant_id: impl Into<String>, audience: impl Into<String>) -> Self {
        let tenant_id = tenant_id.into();
        Self {
            issuer: format!("https://sts.windows.net/{tenant_id}/"),
            tenant_id,
            audience: audience.into(),
            leeway_secs: LEEWAY_SECS,
        }
    }
}

/// Claims of a validated Entra access token. Unlisted claims stay in `extra`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntraClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub aud: Value,
    #[serde(default)]
    pub iss: String,
    pub exp: i64,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntraClaims {
    /// Who the token belongs to, for logs.
    pub fn user_label(&self) -> &str {
        self.preferred_username
            .as_deref()
            .or(self.sub.as_deref())
            .unwrap_or("unknown")
    }
}

/// Verifies Entra ID access tokens: RS256 signature by a tenant key, audience, issuer,
/// expiry and not-before.
#[derive(Clone)]
pub struct EntraValidator {
    settings: Arc<EntraSettings>,
    keys: Arc<JwksCache>,
}

impl EntraValidator {
    pub fn new(settings: EntraSettings, keys: JwksCache) -> Self {
        Self {
            settings: Arc::new(settings),
            keys: Arc::new(keys),
        }
    }

    /// Validator for the tenant in `config`, or `None` when auth is not configured.
    pub fn from_config(config: &BridgeConfig) -> Result<Option<Self>, AuthError> {
        if !config.auth_enabled() {
            return Ok(None);
        }
        let keys = JwksCache::new(
            KeySource::Http {
                uri: config.jwks_uri(),
                cache_ttl: config.jwks_cache_ttl(),
            },
            config.jwks_fetches_per_minute,
        )?;
        let settings = EntraSettings::new(config.tenant_id.clone(), config.audience.clone());
        Ok(Some(Self::new(settings, keys)))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = self.settings.leeway_secs;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.set_audience(std::slice::from_ref(&self.settings.audience));
        validation.set_issuer(std::slice::from_ref(&self.settings.issuer));
        validation
    }

    pub async fn validate(&self, token: &str) -> Result<EntraClaims, AuthError> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header.kid.ok_or(AuthError::MissingKeyId)?;
        let jwk = self.keys.get(&kid).await?;
        let key = jwk.decoding_key()?;

        let data = jsonwebtoken::decode::<EntraClaims>(token, &key, &self.validation())?;
        tracing::info!(
            target: "agui::auth",
            user = data.claims.user_label(),
            "Token validated successfully"
        );
        Ok(data.claims)
    }
}

/// Token carried by an `Authorization: Bearer <token>` header.
///
/// Some proxies append further comma-separated values; only the first token-like value is
/// kept.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let rest = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingCredentials)?;
    let token = rest
        .trim()
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .split(' ')
        .next()
        .unwrap_or_default()
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(token)
}

/// Authorization value forwarded upstream: the first of possibly several comma-joined
/// values, trimmed.
pub fn forwardable_authorization(header: Option<&str>) -> Option<String> {
    header
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
