use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use governor::DefaultDirectRateLimiter;
use governor::Quota;
use governor::RateLimiter;
use jsonwebtoken::jwk::Jwk;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::config::KeyStoreConfig;
use crate::error::fetch_jwks_error;
use crate::error::parse_jwks_error;
use crate::error::timeout_error;
use crate::error::Error;
use crate::error::Result;
use crate::signing_key::SigningKey;

/// Key set document; entries are parsed one by one so a single odd key does not
/// poison the whole set
#[derive(Debug, Deserialize)]
struct RawJwkSet {
    keys: Vec<Value>,
}

/// Signing keys of one key set URL
///
/// Keys are cached by `kid` and never evicted: a `kid` is assumed to name the same key
/// for the life of the process. Fetches are serialized, and a caller that queued
/// behind a successful fetch reuses its result instead of fetching again. Every
/// fetch must pass the rate limiter first.
pub struct KeySetCache {
    jwks_url: String,
    keys: RwLock<HashMap<String, Arc<SigningKey>>>,
    fetch_lock: Mutex<()>,
    fetches: AtomicU64,
    /// Bumped after each fetch whose keys made it into the cache
    generation: AtomicU64,
    limiter: DefaultDirectRateLimiter,
    client: Client,
    fetch_timeout: Duration,
}

impl KeySetCache {
    fn new(jwks_url: String, client: Client, config: &KeyStoreConfig) -> Self {
        let per_minute =
            NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            jwks_url,
            keys: RwLock::new(HashMap::new()),
            fetch_lock: Mutex::new(()),
            fetches: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
            client,
            fetch_timeout: config.fetch_timeout,
        }
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Number of key set fetches attempted so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Key ids currently cached
    pub async fn cached_kids(&self) -> Vec<String> {
        self.keys.read().await.keys().cloned().collect()
    }

    /// Get the signing key for `kid`, fetching the key set on a cache miss
    pub async fn get_signing_key(&self, kid: &str) -> Result<Arc<SigningKey>> {
        if let Some(key) = self.try_get_cached(kid).await {
            debug!(jwks_url = %self.jwks_url, kid, "Signing key cache hit");
            return Ok(key);
        }

        let seen_generation = self.generation.load(Ordering::SeqCst);
        let _guard = self.fetch_lock.lock().await;

        // Another caller may have populated the cache while we waited
        if let Some(key) = self.try_get_cached(kid).await {
            return Ok(key);
        }
        if self.generation.load(Ordering::SeqCst) != seen_generation {
            return Err(Error::SigningKeyNotFound(kid.to_string()));
        }

        debug!(jwks_url = %self.jwks_url, kid, "Signing key cache miss, fetching key set");
        self.refresh().await?;

        self.try_get_cached(kid)
            .await
            .ok_or_else(|| Error::SigningKeyNotFound(kid.to_string()))
    }

    async fn try_get_cached(&self, kid: &str) -> Option<Arc<SigningKey>> {
        self.keys.read().await.get(kid).cloned()
    }

    /// Fetch the key set and add its keys to the cache; callers hold `fetch_lock`
    async fn refresh(&self) -> Result<()> {
        if self.limiter.check().is_err() {
            warn!(jwks_url = %self.jwks_url, "Key set fetch rate limited");
            return Err(Error::RateLimited {
                jwks_url: self.jwks_url.clone(),
            });
        }

        self.fetches.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();

        let jwks = tokio::time::timeout(self.fetch_timeout, self.fetch_jwks())
            .await
            .map_err(|_| timeout_error(&self.jwks_url, self.fetch_timeout))??;

        let keys = parse_signing_keys(&self.jwks_url, jwks)?;
        let key_count = keys.len();

        let mut cache = self.keys.write().await;
        for key in keys {
            cache
                .entry(key.kid().to_string())
                .or_insert_with(|| Arc::new(key));
        }
        drop(cache);
        self.generation.fetch_add(1, Ordering::SeqCst);

        info!(
            jwks_url = %self.jwks_url,
            key_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched key set"
        );

        Ok(())
    }

    async fn fetch_jwks(&self) -> Result<RawJwkSet> {
        self.client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(fetch_jwks_error)?
            .error_for_status()
            .map_err(fetch_jwks_error)?
            .json()
            .await
            .map_err(parse_jwks_error)
    }
}

/// Turn every usable entry of a key set into a signing key
fn parse_signing_keys(jwks_url: &str, jwks: RawJwkSet) -> Result<Vec<SigningKey>> {
    let mut keys = Vec::with_capacity(jwks.keys.len());

    for entry in jwks.keys {
        let parsed = serde_json::from_value::<Jwk>(entry)
            .map_err(|e| format!("unrecognized JWK: {e}"))
            .and_then(|jwk| SigningKey::from_jwk(&jwk));

        match parsed {
            Ok(key) => {
                debug!(jwks_url, kid = key.kid(), family = ?key.family(), "Loaded JWK");
                keys.push(key);
            }
            Err(reason) => warn!(jwks_url, reason, "Skipping JWK"),
        }
    }

    if keys.is_empty() {
        return Err(Error::KeyRetrieval(format!(
            "The key set at {jwks_url} does not contain any signing keys"
        )));
    }

    Ok(keys)
}

/// Process-wide registry of key set caches, one per key set URL
///
/// Create it once, share it behind an `Arc` and pass it to every validation call so
/// keys and rate limiter state outlive individual requests.
pub struct KeyStore {
    caches: RwLock<HashMap<String, Arc<KeySetCache>>>,
    client: Client,
    config: KeyStoreConfig,
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new(KeyStoreConfig::default())
    }
}

impl KeyStore {
    /// Create a new key store with the given configuration
    pub fn new(config: KeyStoreConfig) -> Self {
        let client = match config.http_client.clone() {
            Some(client) => client,
            None => Client::builder()
                .timeout(config.fetch_timeout)
                .build()
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to build HTTP client, falling back to defaults");
                    Client::new()
                }),
        };

        Self {
            caches: RwLock::new(HashMap::new()),
            client,
            config,
        }
    }

    /// Resolve `kid` against the key set published at `jwks_url`
    ///
    /// # Errors
    /// - `Error::SigningKeyNotFound` if the fetched key set has no key with this `kid`
    /// - `Error::KeyRetrieval` on network, status, parse or timeout failures
    /// - `Error::RateLimited` if a fetch is needed but the per-URL budget is spent
    pub async fn get_signing_key(&self, jwks_url: &str, kid: &str) -> Result<Arc<SigningKey>> {
        self.cache_for(jwks_url).await.get_signing_key(kid).await
    }

    /// Get the cache for `jwks_url`, creating it on first use
    pub async fn cache_for(&self, jwks_url: &str) -> Arc<KeySetCache> {
        if let Some(cache) = self.caches.read().await.get(jwks_url) {
            return Arc::clone(cache);
        }

        let mut caches = self.caches.write().await;
        let cache = caches.entry(jwks_url.to_string()).or_insert_with(|| {
            Arc::new(KeySetCache::new(
                jwks_url.to_string(),
                self.client.clone(),
                &self.config,
            ))
        });

        Arc::clone(cache)
    }

    /// Number of key set URLs seen so far
    pub async fn len(&self) -> usize {
        self.caches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.caches.read().await.is_empty()
    }
}
