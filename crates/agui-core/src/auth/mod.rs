//! Entra ID bearer-token validation.
//!
//! `jwks` keeps the tenant's signing keys (cached, fetch rate-limited); `entra` verifies
//! signature, audience, issuer and lifetime of an access token against those keys.

mod entra;
mod jwks;

pub use entra::{bearer_token, forwardable_authorization, EntraClaims, EntraSettings, EntraValidator};
pub use jwks::{Jwk, JwksCache, KeySource};

use thiserror::Error;

/// Why a request could not be authenticated. Every variant maps to HTTP 401.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing or invalid Authorization header")]
    MissingCredentials,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token header has no key id (kid)")]
    MissingKeyId,

    #[error("No signing key found for kid '{0}'")]
    UnknownKey(String),

    #[error("Signing key unusable: {0}")]
    UnusableKey(String),

    #[error("Unable to retrieve signing keys: {0}")]
    KeySet(String),

    #[error("Signing key fetch rate limit exceeded")]
    RateLimited,

    #[error("Token has expired")]
    Expired,

    #[error("Token not yet valid (nbf claim)")]
    NotYetValid,

    #[error("Invalid token audience")]
    InvalidAudience,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

impl AuthError {
    /// Value for the `WWW-Authenticate` response header.
    pub fn www_authenticate(&self) -> String {
        match self {
            Self::MissingCredentials => r#"Bearer realm="api""#.to_string(),
            other => format!(
                r#"Bearer realm="api", error="invalid_token", error_description="{}""#,
                other.to_string().replace('"', "'")
            ),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                Self::Malformed(err.to_string())
            }
            _ => Self::Invalid(err.to_string()),
        }
    }
}
