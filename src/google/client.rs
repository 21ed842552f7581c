//! HTTP client for the Google Maps web services.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::response::{DistanceMatrixResponse, GeocodeResponse};
use super::{GeoClient, TravelMode};
use crate::error::LookupError;
use crate::models::{Coordinate, TravelSummary};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/";

/// Environment variable holding the service credential
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Upper bound on a single backoff sleep
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// `base * 2^(attempt-1)`, capped at [`MAX_RETRY_DELAY`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

/// Transport and retry settings for [`GoogleMapsClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts for transient failures; 0 disables retrying
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    /// Client-wide request quota; `None` is unthrottled
    pub requests_per_second: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            requests_per_second: None,
        }
    }
}

/// Geocoding and distance matrix lookups over HTTP.
///
/// Holds everything one run needs to talk to the service: the connection pool,
/// credential, optional rate limiter and a request counter.
pub struct GoogleMapsClient {
    client: Client,
    api_key: String,
    geocode_url: Url,
    distance_matrix_url: Url,
    max_retries: u32,
    retry_base_delay: Duration,
    limiter: Option<Limiter>,
    requests: AtomicU64,
}

impl GoogleMapsClient {
    pub fn new(api_key: String, config: ClientConfig) -> Result<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).with_context(|| format!("Invalid base URL {}", base))?;

        let client = Client::builder()
            .user_agent(concat!("geopair/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let limiter = config
            .requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            api_key,
            geocode_url: base.join("geocode/json")?,
            distance_matrix_url: base.join("distancematrix/json")?,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            limiter,
            requests: AtomicU64::new(0),
        })
    }

    /// Build a client with the key from `GOOGLE_MAPS_API_KEY`.
    pub fn from_env(config: ClientConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{} is not set", API_KEY_ENV))?;
        Self::new(api_key, config)
    }

    /// Number of HTTP requests sent so far, retries included
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, LookupError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        self.requests.fetch_add(1, Ordering::Relaxed);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(LookupError::Service {
                status: status.to_string(),
                message: response.text().await.ok().filter(|t| !t.is_empty()),
                transient: status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| LookupError::Malformed(e.to_string()))
    }

    /// Repeat `operation` on transient failures with exponential backoff.
    async fn with_retry<T, F, Fut>(&self, operation: F) -> Result<T, LookupError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(self.retry_base_delay, attempt);
                    warn!(
                        "Transient lookup failure (attempt {}/{}): {}. Retrying in {:?}",
                        attempt, self.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl GeoClient for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Coordinate, LookupError> {
        let mut url = self.geocode_url.clone();
        url.query_pairs_mut()
            .append_pair("address", address)
            .append_pair("key", &self.api_key);

        debug!("Geocoding '{}'", address);

        self.with_retry(|| {
            let url = url.clone();
            async move {
                self.get_json::<GeocodeResponse>(url)
                    .await?
                    .into_coordinate(address)
            }
        })
        .await
    }

    async fn distance(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<TravelSummary, LookupError> {
        let mut url = self.distance_matrix_url.clone();
        url.query_pairs_mut()
            .append_pair("origins", origin)
            .append_pair("destinations", destination)
            .append_pair("mode", mode.as_str())
            .append_pair("key", &self.api_key);

        debug!("Distance matrix '{}' -> '{}' ({})", origin, destination, mode);

        self.with_retry(|| {
            let url = url.clone();
            async move {
                self.get_json::<DistanceMatrixResponse>(url)
                    .await?
                    .into_summary(origin, destination)
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_join_base_without_slash() {
        let config = ClientConfig {
            base_url: "http://localhost:8080/maps/api".to_string(),
            ..ClientConfig::default()
        };
        let client = GoogleMapsClient::new("key".to_string(), config).unwrap();
        assert_eq!(
            client.geocode_url.as_str(),
            "http://localhost:8080/maps/api/geocode/json"
        );
        assert_eq!(
            client.distance_matrix_url.as_str(),
            "http://localhost:8080/maps/api/distancematrix/json"
        );
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(GoogleMapsClient::new("key".to_string(), config).is_err());
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let config = ClientConfig {
            retry_base_delay: Duration::from_millis(1),
            ..ClientConfig::default()
        };
        let client = GoogleMapsClient::new("key".to_string(), config).unwrap();
        let calls = AtomicU64::new(0);

        let result: Result<(), LookupError> = client
            .with_retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(LookupError::NoResult("x".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let config = ClientConfig {
            max_retries: 2,
            retry_base_delay: Duration::from_millis(1),
            ..ClientConfig::default()
        };
        let client = GoogleMapsClient::new("key".to_string(), config).unwrap();
        let calls = AtomicU64::new(0);

        let result: Result<(), LookupError> = client
            .with_retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(LookupError::Service {
                        status: "OVER_QUERY_LIMIT".to_string(),
                        message: None,
                        transient: true,
                    })
                }
            })
            .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 40), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(Duration::MAX, 2), MAX_RETRY_DELAY);
        assert_eq!(backoff_delay(Duration::ZERO, u32::MAX), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_many_retries_do_not_overflow() {
        let config = ClientConfig {
            max_retries: 40,
            retry_base_delay: Duration::ZERO,
            ..ClientConfig::default()
        };
        let client = GoogleMapsClient::new("key".to_string(), config).unwrap();
        let calls = AtomicU64::new(0);

        let result: Result<(), LookupError> = client
            .with_retry(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(LookupError::Service {
                        status: "UNKNOWN_ERROR".to_string(),
                        message: None,
                        transient: true,
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 41);
    }
}
