use parking_lot::RwLock;
use serde::Deserialize;
use std::time::{Duration, Instant};
use url::Url;

use crate::error::{GatewayError, Result};

/// Subset of the OpenID Connect discovery document used by the login flow
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderMetadata {
    #[serde(default)]
    pub issuer: Option<String>,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
    pub userinfo_endpoint: Url,
}

/// Time-bounded holder for the last good discovery document
pub struct MetadataCache {
    ttl: Duration,
    entry: RwLock<Option<(Instant, ProviderMetadata)>>,
}

impl MetadataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<ProviderMetadata> {
        let entry = self.entry.read();
        match &*entry {
            Some((cached_at, metadata)) if cached_at.elapsed() < self.ttl => Some(metadata.clone()),
            _ => None,
        }
    }

    pub fn put(&self, metadata: ProviderMetadata) {
        *self.entry.write() = Some((Instant::now(), metadata));
    }

    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }
}

/// Resolves provider endpoints from the discovery URL.
///
/// Without a cache TTL every call goes to the network.
pub struct DiscoveryClient {
    http_client: reqwest::Client,
    discovery_url: Url,
    cache: Option<MetadataCache>,
}

impl DiscoveryClient {
    pub fn new(http_client: reqwest::Client, discovery_url: Url, cache_ttl: Duration) -> Self {
        let cache = if cache_ttl.is_zero() {
            None
        } else {
            Some(MetadataCache::new(cache_ttl))
        };

        Self {
            http_client,
            discovery_url,
            cache,
        }
    }

    pub fn discovery_url(&self) -> &Url {
        &self.discovery_url
    }

    /// Provider metadata, from the cache when enabled and fresh
    pub async fn provider_metadata(&self) -> Result<ProviderMetadata> {
        if let Some(metadata) = self.cache.as_ref().and_then(MetadataCache::get) {
            tracing::debug!("Using cached provider metadata");
            return Ok(metadata);
        }

        let metadata = self.fetch().await?;

        if let Some(cache) = &self.cache {
            cache.put(metadata.clone());
        }

        Ok(metadata)
    }

    /// Drop any cached document so the next lookup hits the network
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate();
        }
    }

    async fn fetch(&self) -> Result<ProviderMetadata> {
        tracing::debug!("Fetching provider metadata from {}", self.discovery_url);

        let response = self
            .http_client
            .get(self.discovery_url.clone())
            .send()
            .await
            .map_err(|e| GatewayError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::ProviderUnavailable(format!(
                "discovery endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<ProviderMetadata>()
            .await
            .map_err(|e| GatewayError::ProviderUnavailable(format!("invalid discovery document: {}", e)))
    }
}
