//! Integration test: Entra ID token validation against a JWKS endpoint.
//!
//! A local axum server plays login.microsoftonline.com: it publishes the test signing key
//! and counts how often the key set is downloaded.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use agui_core::{AuthError, EntraSettings, EntraValidator, Jwk, JwksCache, KeySource};
use axum::{extract::State, routing::get, Json, Router};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

const SIGNING_KEY: &[u8] = include_bytes!("fixtures/signing_key.pem");
const ROGUE_KEY: &[u8] = include_bytes!("fixtures/rogue_key.pem");
const MODULUS: &str = "tGfRi8mx7lVGkXIChvdlZGnd-IIXlpEefsKhia5H6fdFHYwpz8HvHpEJ3hMxtCl8ksnIw0GcZCXPEY1LfW1h2Ye4tzj8qSr7JfdfAaP6ah4qQBvFAyHUQUiUaX6Iq5bz-o-qJKB8Ouj9ltwFx7dLfOb5AWvv0O5_aZPJg1qILbhZBzTAoYe_JJI_t2EjPvvXLaZ6kFtyIb-f1rV_N8__Twllg8zGAVdva9s2bBPnOERWg8zUJkhSlAMocLs2ukQbwktFN1cBQf5TvKf-O6JT2l8eewx4Ez1ZLaWMU3qsGEeKgAw49UtVGrG6vL0kDhyG2eibBxQhjz6zvLxHfTGslw";

const TENANT: &str = "11111111-2222-3333-4444-555555555555";
const AUDIENCE: &str = "api://agui-bridge";

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

fn jwk(kid: &str) -> Jwk {
    Jwk {
        kid: kid.into(),
        kty: "RSA".into(),
        alg: Some("RS256".into()),
        key_use: Some("sig".into()),
        n: Some(MODULUS.into()),
        e: Some("AQAB".into()),
    }
}

fn sign(kid: &str, claims: serde_json::Value, pem: &[u8]) -> String {
    let header = Header {
        alg: Algorithm::RS256,
        kid: Some(kid.into()),
        ..Header::default()
    };
    encode(&header, &claims, &EncodingKey::from_rsa_pem(pem).unwrap()).unwrap()
}

fn good_claims() -> serde_json::Value {
    json!({
        "sub": "user-123",
        "preferred_username": "ada@example.com",
        "aud": AUDIENCE,
        "iss": format!("https://sts.windows.net/{TENANT}/"),
        "iat": now(),
        "nbf": now() - 10,
        "exp": now() + 600,
    })
}

fn static_validator() -> EntraValidator {
    let keys = JwksCache::new(KeySource::Static(vec![jwk("k1")]), 10).unwrap();
    EntraValidator::new(EntraSettings::new(TENANT, AUDIENCE), keys)
}

#[derive(Clone)]
struct JwksServer {
    hits: Arc<AtomicUsize>,
    kids: Arc<parking_lot::Mutex<Vec<String>>>,
}

async fn serve_keys(State(server): State<JwksServer>) -> Json<serde_json::Value> {
    server.hits.fetch_add(1, Ordering::SeqCst);
    let keys: Vec<Jwk> = server.kids.lock().iter().map(|k| jwk(k)).collect();
    Json(json!({ "keys": keys }))
}

async fn spawn_jwks(kids: &[&str]) -> (String, JwksServer) {
    let server = JwksServer {
        hits: Arc::new(AtomicUsize::new(0)),
        kids: Arc::new(parking_lot::Mutex::new(
            kids.iter().map(|k| k.to_string()).collect(),
        )),
    };
    let app = Router::new()
        .route("/discovery/v2.0/keys", get(serve_keys))
        .with_state(server.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/discovery/v2.0/keys"), server)
}

fn http_validator(uri: String, per_minute: u32) -> EntraValidator {
    http_validator_with_ttl(uri, per_minute, Duration::from_secs(86_400))
}

fn http_validator_with_ttl(uri: String, per_minute: u32, cache_ttl: Duration) -> EntraValidator {
    let keys = JwksCache::new(KeySource::Http { uri, cache_ttl }, per_minute).unwrap();
    EntraValidator::new(EntraSettings::new(TENANT, AUDIENCE), keys)
}

/// Validates `token` from `n` tasks at once; returns the failures.
async fn validate_burst(validator: &EntraValidator, token: &str, n: usize) -> Vec<AuthError> {
    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..n {
        let validator = validator.clone();
        let token = token.to_string();
        tasks.spawn(async move { validator.validate(&token).await });
    }
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined.unwrap() {
            failures.push(err);
        }
    }
    failures
}

#[tokio::test]
async fn valid_token_yields_claims() {
    let token = sign("k1", good_claims(), SIGNING_KEY);
    let claims = static_validator().validate(&token).await.unwrap();
    assert_eq!(claims.user_label(), "ada@example.com");
    assert_eq!(claims.sub.as_deref(), Some("user-123"));
}

#[tokio::test]
async fn wrong_audience_is_rejected() {
    let mut claims = good_claims();
    claims["aud"] = json!("api://someone-else");
    let token = sign("k1", claims, SIGNING_KEY);
    assert_eq!(
        static_validator().validate(&token).await.unwrap_err(),
        AuthError::InvalidAudience
    );
}

#[tokio::test]
async fn wrong_issuer_is_rejected() {
    let mut claims = good_claims();
    claims["iss"] = json!("https://login.microsoftonline.com/other/v2.0");
    let token = sign("k1", claims, SIGNING_KEY);
    assert_eq!(
        static_validator().validate(&token).await.unwrap_err(),
        AuthError::InvalidIssuer
    );
}

#[tokio::test]
async fn expired_token_is_rejected_beyond_leeway() {
    let mut claims = good_claims();
    claims["exp"] = json!(now() - 300);
    let token = sign("k1", claims, SIGNING_KEY);
    assert_eq!(
        static_validator().validate(&token).await.unwrap_err(),
        AuthError::Expired
    );
}

#[tokio::test]
async fn expiry_within_leeway_is_accepted() {
    let mut claims = good_claims();
    claims["exp"] = json!(now() - 20);
    let token = sign("k1", claims, SIGNING_KEY);
    assert!(static_validator().validate(&token).await.is_ok());
}

#[tokio::test]
async fn future_nbf_is_rejected() {
    let mut claims = good_claims();
    claims["nbf"] = json!(now() + 3600);
    let token = sign("k1", claims, SIGNING_KEY);
    assert_eq!(
        static_validator().validate(&token).await.unwrap_err(),
        AuthError::NotYetValid
    );
}

#[tokio::test]
async fn signature_from_another_key_is_rejected() {
    let token = sign("k1", good_claims(), ROGUE_KEY);
    assert_eq!(
        static_validator().validate(&token).await.unwrap_err(),
        AuthError::InvalidSignature
    );
}

#[tokio::test]
async fn garbage_token_is_malformed() {
    let err = static_validator().validate("not-a-jwt").await.unwrap_err();
    assert!(matches!(err, AuthError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn token_without_kid_is_rejected() {
    let header = Header::new(Algorithm::RS256);
    let token = encode(
        &header,
        &good_claims(),
        &EncodingKey::from_rsa_pem(SIGNING_KEY).unwrap(),
    )
    .unwrap();
    assert_eq!(
        static_validator().validate(&token).await.unwrap_err(),
        AuthError::MissingKeyId
    );
}

#[tokio::test]
async fn keys_are_cached_between_requests() {
    let (uri, server) = spawn_jwks(&["k1"]).await;
    let validator = http_validator(uri, 10);
    let token = sign("k1", good_claims(), SIGNING_KEY);
    validator.validate(&token).await.unwrap();
    validator.validate(&token).await.unwrap();
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rotated_key_triggers_one_refresh() {
    let (uri, server) = spawn_jwks(&["k1"]).await;
    let validator = http_validator(uri, 10);
    validator
        .validate(&sign("k1", good_claims(), SIGNING_KEY))
        .await
        .unwrap();

    server.kids.lock().push("k2".into());
    validator
        .validate(&sign("k2", good_claims(), SIGNING_KEY))
        .await
        .unwrap();
    assert_eq!(server.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cold_cache_burst_downloads_keys_once() {
    let (uri, server) = spawn_jwks(&["k1"]).await;
    let validator = http_validator(uri, 10);
    let token = sign("k1", good_claims(), SIGNING_KEY);

    let failures = validate_burst(&validator, &token, 30).await;
    assert!(failures.is_empty(), "failures: {failures:?}");
    assert_eq!(server.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stale_cache_burst_downloads_keys_once_more() {
    let (uri, server) = spawn_jwks(&["k1"]).await;
    let validator = http_validator_with_ttl(uri, 3, Duration::from_millis(500));
    let token = sign("k1", good_claims(), SIGNING_KEY);
    validator.validate(&token).await.unwrap();

    tokio::time::sleep(Duration::from_millis(600)).await;
    let failures = validate_burst(&validator, &token, 20).await;
    assert!(failures.is_empty(), "failures: {failures:?}");
    assert_eq!(server.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn expired_cache_is_downloaded_again() {
    let (uri, server) = spawn_jwks(&["k1"]).await;
    let validator = http_validator_with_ttl(uri, 10, Duration::ZERO);
    let token = sign("k1", good_claims(), SIGNING_KEY);
    validator.validate(&token).await.unwrap();
    validator.validate(&token).await.unwrap();
    assert_eq!(server.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_kids_hit_the_rate_limit() {
    let (uri, server) = spawn_jwks(&["k1"]).await;
    let validator = http_validator(uri, 2);
    let forged = sign("forged", good_claims(), SIGNING_KEY);

    assert_eq!(
        validator.validate(&forged).await.unwrap_err(),
        AuthError::UnknownKey("forged".into())
    );
    assert_eq!(
        validator.validate(&forged).await.unwrap_err(),
        AuthError::UnknownKey("forged".into())
    );
    assert_eq!(
        validator.validate(&forged).await.unwrap_err(),
        AuthError::RateLimited
    );
    assert_eq!(server.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_key_set_is_a_key_set_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let validator = http_validator(format!("http://{addr}/keys"), 10);
    let err = validator
        .validate(&sign("k1", good_claims(), SIGNING_KEY))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::KeySet(_)), "got {err:?}");
}
