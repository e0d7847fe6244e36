// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Sign-In ID token verification (federated identity).

use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;

const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const FALLBACK_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedPrincipal {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

/// ID token verification failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OidcError {
    /// The token is malformed, expired, or its claims do not match.
    #[error("federated token rejected: {0}")]
    Rejected(String),
    /// Google's key endpoints could not be reached or parsed.
    #[error("federated key lookup failed: {0}")]
    Transient(String),
}

enum KeySource {
    /// Google discovery document + JWKS endpoint
    Google(JwksCache),
    /// One fixed key, for tests
    Static {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

struct CachedValue<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CachedValue<T> {
    fn fresh(&self) -> Option<&T> {
        (self.expires_at > Instant::now()).then_some(&self.value)
    }
}

/// TTL cache of Google's signing keys, honouring `Cache-Control: max-age`.
struct JwksCache {
    http_client: reqwest::Client,
    jwks_uri: RwLock<Option<CachedValue<String>>>,
    keys: RwLock<Option<CachedValue<HashMap<String, Arc<DecodingKey>>>>>,
    refresh_lock: Mutex<()>,
}

/// Verifier for Google-issued ID tokens presented at sign-in.
pub struct GoogleIdTokenVerifier {
    audience: String,
    keys: KeySource,
}

impl GoogleIdTokenVerifier {
    /// Verifier that fetches and caches Google's published keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building OIDC HTTP client")?;

        tracing::info!(audience = %config.google_client_id, "Initialized Google ID token verifier");

        Ok(Self {
            audience: config.google_client_id.clone(),
            keys: KeySource::Google(JwksCache {
                http_client,
                jwks_uri: RwLock::new(None),
                keys: RwLock::new(None),
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    /// Verifier pinned to a single RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static OIDC kid must not be empty");
        }

        Ok(Self {
            audience: config.google_client_id.clone(),
            keys: KeySource::Static {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        })
    }

    /// Verify a raw ID token and return the principal it asserts.
    pub async fn verify_id_token(&self, token: &str) -> Result<FederatedPrincipal, OidcError> {
        let header = decode_header(token)
            .map_err(|e| OidcError::Rejected(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(OidcError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| OidcError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&GOOGLE_ISSUERS);
        validation.set_audience(&[self.audience.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<IdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| OidcError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        check_issued_at(claims.iat)?;

        let email = claims
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| OidcError::Rejected("missing email claim".to_string()))?;

        if claims.email_verified != Some(true) {
            return Err(OidcError::Rejected("email is not verified".to_string()));
        }

        tracing::debug!(subject = %claims.sub, "Google ID token verified");

        Ok(FederatedPrincipal {
            subject: claims.sub,
            email,
            name: claims.name,
        })
    }

    async fn key_for(&self, kid: &str) -> Result<Arc<DecodingKey>, OidcError> {
        match &self.keys {
            KeySource::Static {
                kid: static_kid,
                decoding_key,
            } if kid == static_kid.as_str() => Ok(decoding_key.clone()),
            KeySource::Static { .. } => Err(OidcError::Rejected(format!(
                "unknown JWT kid for static verifier: {kid}"
            ))),
            KeySource::Google(cache) => cache.key_for(kid).await,
        }
    }
}

impl JwksCache {
    async fn key_for(&self, kid: &str) -> Result<Arc<DecodingKey>, OidcError> {
        if let Some(key) = self.cached_key(kid).await {
            return Ok(key);
        }

        // A kid we have never seen may mean Google rotated keys early.
        for force in [false, true] {
            self.refresh(force).await?;
            if let Some(key) = self.cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(OidcError::Rejected(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        self.keys
            .read()
            .await
            .as_ref()
            .and_then(CachedValue::fresh)
            .and_then(|keys| keys.get(kid))
            .cloned()
    }

    async fn refresh(&self, force: bool) -> Result<(), OidcError> {
        let _guard = self.refresh_lock.lock().await;

        if !force && self.keys.read().await.as_ref().and_then(CachedValue::fresh).is_some() {
            return Ok(());
        }

        let jwks_uri = self.jwks_uri(force).await;
        tracing::debug!(jwks_uri = %jwks_uri, "Refreshing Google JWKS cache");

        let response = self
            .http_client
            .get(&jwks_uri)
            .send()
            .await
            .map_err(|e| OidcError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OidcError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl(response.headers());
        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| OidcError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let keys: HashMap<String, Arc<DecodingKey>> = jwks
            .keys
            .into_iter()
            .filter(Jwk::is_rs256_signing_key)
            .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => Some((jwk.kid, Arc::new(key))),
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                    None
                }
            })
            .collect();

        if keys.is_empty() {
            return Err(OidcError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.keys.write().await = Some(CachedValue {
            value: keys,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Google JWKS cache refreshed");
        Ok(())
    }

    /// Resolve the JWKS URI from discovery, falling back to the last known
    /// URI (or Google's well-known default) when discovery is unavailable.
    async fn jwks_uri(&self, force: bool) -> String {
        let cached = self.jwks_uri.read().await.as_ref().map(|entry| {
            (entry.fresh().cloned(), entry.value.clone())
        });

        if let (false, Some((Some(fresh), _))) = (force, &cached) {
            return fresh.clone();
        }

        let fallback = cached
            .map(|(_, last_known)| last_known)
            .unwrap_or_else(|| FALLBACK_JWKS_URL.to_string());

        let response = match self.http_client.get(DISCOVERY_URL).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "OIDC discovery failed; using fallback JWKS URI");
                return fallback;
            }
            Err(e) => {
                tracing::warn!(error = %e, "OIDC discovery request failed; using fallback JWKS URI");
                return fallback;
            }
        };

        let ttl = cache_ttl(response.headers());
        match response.json::<OpenIdConfig>().await {
            Ok(discovery) => {
                *self.jwks_uri.write().await = Some(CachedValue {
                    value: discovery.jwks_uri.clone(),
                    expires_at: Instant::now() + ttl,
                });
                discovery.jwks_uri
            }
            Err(e) => {
                tracing::warn!(error = %e, "Invalid OIDC discovery document; using fallback JWKS URI");
                fallback
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenIdConfig {
    jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    #[serde(default)]
    n: String,
    #[serde(default)]
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

impl Jwk {
    fn is_rs256_signing_key(&self) -> bool {
        self.kty == "RSA"
            && !self.kid.trim().is_empty()
            && !self.n.is_empty()
            && self.alg.as_deref().is_none_or(|alg| alg == "RS256")
            && self.use_.as_deref().is_none_or(|u| u == "sig")
    }
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    iat: Option<u64>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

fn check_issued_at(iat: Option<u64>) -> Result<(), OidcError> {
    let iat = iat.ok_or_else(|| OidcError::Rejected("missing iat claim".to_string()))?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if iat > now + CLOCK_SKEW_SECS {
        return Err(OidcError::Rejected("iat claim is in the future".to_string()));
    }
    Ok(())
}

fn cache_ttl(headers: &reqwest::header::HeaderMap) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(max_age_secs)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_CACHE_TTL)
}

fn max_age_secs(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}
