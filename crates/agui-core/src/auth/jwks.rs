use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::AuthError;

const RATE_WINDOW: Duration = Duration::from_secs(60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One entry of a JSON Web Key Set. Only RSA keys (`n`/`e`) can verify Entra tokens.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    pub kid: String,
    #[serde(default)]
    pub kty: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
}

impl Jwk {
    /// RSA verification key for this entry.
    pub fn decoding_key(&self) -> Result<jsonwebtoken::DecodingKey, AuthError> {
        if self.kty != "RSA" {
            return Err(AuthError::UnusableKey(format!(
                "unsupported key type '{}' for kid '{}'",
                self.kty, self.kid
            )));
        }
        let n = self
            .n
            .as_deref()
            .ok_or_else(|| AuthError::UnusableKey("rsa modulus missing".into()))?;
        let e = self
            .e
            .as_deref()
            .ok_or_else(|| AuthError::UnusableKey("rsa exponent missing".into()))?;
        jsonwebtoken::DecodingKey::from_rsa_components(n, e)
            .map_err(|err| AuthError::UnusableKey(format!("failed to build rsa key: {err}")))
    }
}

#[derive(Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Where signing keys come from.
#[derive(Clone, Debug)]
pub enum KeySource {
    /// Fixed key set (tests, air-gapped deployments). Never refreshed.
    Static(Vec<Jwk>),
    /// Published key set, re-downloaded once the cached copy is older than `cache_ttl`.
    Http { uri: String, cache_ttl: Duration },
}

#[derive(Clone)]
struct CachedKeys {
    keys: HashMap<String, Jwk>,
    expires_at: Option<Instant>,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.expires_at.map_or(true, |at| at > Instant::now())
    }
}

/// Signing-key cache with a per-minute cap on downloads.
///
/// A `kid` missing from a fresh cache forces one refresh so rotated keys are picked up
/// without waiting for the TTL; the rate limit keeps forged `kid`s from hammering the
/// identity provider.
pub struct JwksCache {
    source: KeySource,
    client: reqwest::Client,
    cache: RwLock<Option<CachedKeys>>,
    fetches: Mutex<VecDeque<Instant>>,
    fetches_per_minute: u32,
    loading: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

impl JwksCache {
    pub fn new(source: KeySource, fetches_per_minute: u32) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| AuthError::KeySet(format!("failed to build http client: {err}")))?;
        Ok(Self::with_client(source, fetches_per_minute, client))
    }

    pub fn with_client(source: KeySource, fetches_per_minute: u32, client: reqwest::Client) -> Self {
        let cache = match &source {
            KeySource::Static(keys) => Some(CachedKeys {
                keys: keys.iter().map(|k| (k.kid.clone(), k.clone())).collect(),
                expires_at: None,
            }),
            KeySource::Http { .. } => None,
        };
        Self {
            source,
            client,
            cache: RwLock::new(cache),
            fetches: Mutex::new(VecDeque::new()),
            fetches_per_minute: fetches_per_minute.max(1),
            loading: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Key for `kid`, downloading the key set when the cache is cold, stale, or does not
    /// know the id yet.
    ///
    /// Downloads are single-flight: concurrent misses queue on `loading`, and a waiter whose
    /// miss was answered by another caller's download does not fetch again.
    pub async fn get(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(jwk) = self.fresh_key(kid) {
            return Ok(jwk);
        }

        if let KeySource::Http { uri, cache_ttl } = &self.source {
            let generation = self.generation.load(Ordering::Acquire);
            let _loading = self.loading.lock().await;
            if let Some(jwk) = self.fresh_key(kid) {
                return Ok(jwk);
            }
            if self.generation.load(Ordering::Acquire) == generation {
                self.refresh(uri, *cache_ttl).await?;
            }
        }

        let guard = self.cache.read();
        guard
            .as_ref()
            .and_then(|cache| cache.keys.get(kid).cloned())
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }

    fn fresh_key(&self, kid: &str) -> Option<Jwk> {
        let guard = self.cache.read();
        guard
            .as_ref()
            .filter(|cache| cache.is_fresh())
            .and_then(|cache| cache.keys.get(kid).cloned())
    }

    fn take_fetch_slot(&self) -> bool {
        let now = Instant::now();
        let mut fetches = self.fetches.lock();
        while fetches
            .front()
            .is_some_and(|at| now.duration_since(*at) >= RATE_WINDOW)
        {
            fetches.pop_front();
        }
        if fetches.len() >= self.fetches_per_minute as usize {
            return false;
        }
        fetches.push_back(now);
        true
    }

    async fn refresh(&self, uri: &str, ttl: Duration) -> Result<(), AuthError> {
        if !self.take_fetch_slot() {
            tracing::warn!(target: "agui::auth", "JWKS fetch refused: rate limit reached");
            return Err(AuthError::RateLimited);
        }

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|err| AuthError::KeySet(format!("jwks fetch error: {err}")))?;
        if response.status() != StatusCode::OK {
            return Err(AuthError::KeySet(format!(
                "jwks fetch status: {}",
                response.status()
            )));
        }
        let body: JwkSet = response
            .json()
            .await
            .map_err(|err| AuthError::KeySet(format!("jwks decode error: {err}")))?;

        tracing::info!(target: "agui::auth", keys = body.keys.len(), "Fetched JWKS signing keys");
        *self.cache.write() = Some(CachedKeys {
            keys: body.keys.into_iter().map(|k| (k.kid.clone(), k)).collect(),
            expires_at: Some(Instant::now() + ttl),
        });
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rsa_jwk(kid: &str) -> Jwk {
        Jwk {
            kid: kid.into(),
            kty: "RSA".into(),
            alg: Some("RS256".into()),
            key_use: Some("sig".into()),
            n: Some("tGfRi8mx7lVGkXIChvdlZGnd-IIXlpEefsKhia5H6fdFHYwpz8HvHpEJ3hMxtCl8ksnIw0GcZCXPEY1LfW1h2Ye4tzj8qSr7JfdfAaP6ah4qQBvFAyHUQUiUaX6Iq5bz-o-qJKB8Ouj9ltwFx7dLfOb5AWvv0O5_aZPJg1qILbhZBzTAoYe_JJI_t2EjPvvXLaZ6kFtyIb-f1rV_N8__Twllg8zGAVdva9s2bBPnOERWg8zUJkhSlAMocLs2ukQbwktFN1cBQf5TvKf-O6JT2l8eewx4Ez1ZLaWMU3qsGEeKgAw49UtVGrG6vL0kDhyG2eibBxQhjz6zvLxHfTGslw".into()),
            e: Some("AQAB".into()),
        }
    }

    #[tokio::test]
    async fn static_source_serves_known_kid() {
        let cache = JwksCache::new(KeySource::Static(vec![rsa_jwk("k1")]), 10).unwrap();
        assert_eq!(cache.get("k1").await.unwrap().kid, "k1");
    }

    #[tokio::test]
    async fn static_source_rejects_unknown_kid() {
        let cache = JwksCache::new(KeySource::Static(vec![rsa_jwk("k1")]), 10).unwrap();
        assert_eq!(
            cache.get("nope").await.unwrap_err(),
            AuthError::UnknownKey("nope".into())
        );
    }

    #[test]
    fn fetch_slots_are_capped_per_minute() {
        let cache = JwksCache::new(KeySource::Static(vec![]), 2).unwrap();
        assert!(cache.take_fetch_slot());
        assert!(cache.take_fetch_slot());
        assert!(!cache.take_fetch_slot());
    }

    #[test]
    fn non_rsa_key_is_unusable() {
        let jwk = Jwk {
            kty: "EC".into(),
            ..rsa_jwk("ec")
        };
        assert!(matches!(jwk.decoding_key(), Err(AuthError::UnusableKey(_))));
    }

    #[test]
    fn rsa_components_build_a_key() {
        assert!(rsa_jwk("k1").decoding_key().is_ok());
    }

    #[test]
    fn key_set_json_uses_use_field() {
        let raw = r#"{"keys":[{"kid":"a","kty":"RSA","use":"sig","n":"AQAB","e":"AQAB","x5t":"ignored"}]}"#;
        let set: JwkSet = serde_json::from_str(raw).unwrap();
        assert_eq!(set.keys[0].key_use.as_deref(), Some("sig"));
    }
}
