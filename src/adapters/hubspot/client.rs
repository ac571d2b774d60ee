//! HubSpot CRM v3 client
//!
//! Every request goes through [`HubSpotClient::execute`], which holds the
//! rate limiter for the whole exchange (one request in flight per client),
//! absorbs `429` responses by sleeping for `Retry-After`, and retries transport
//! failures and every other non-success status with exponential backoff plus
//! jitter.

use super::models::{
    ConnectionReport, ListDealsResponse, Pipeline, PropertyDefinition, RateLimitInfo,
    ResultsEnvelope, DEFAULT_DEAL_PROPERTIES, MAX_PAGE_SIZE,
};
use super::rate_limit::RateLimiter;
use crate::config::{HubSpotConfig, RateLimitConfig, RetryConfig};
use crate::core::extract::DealSource;
use crate::domain::{Cursor, DealPage, EtlError, RawDeal, RemoteError, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEALS_PATH: &str = "/crm/v3/objects/deals";
const DEAL_PROPERTIES_PATH: &str = "/crm/v3/properties/deals";
const DEAL_PIPELINES_PATH: &str = "/crm/v3/pipelines/deals";

/// Wait applied to a 429 without a usable `Retry-After` header
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// HubSpot deals API client
///
/// # Example
///
/// ```no_run
/// use deal_etl::adapters::hubspot::HubSpotClient;
/// use deal_etl::config::{secret_string, HubSpotConfig};
///
/// # async fn example() -> deal_etl::domain::Result<()> {
/// let config = HubSpotConfig::new(
///     "https://api.hubapi.com",
///     secret_string("pat-na1-0000".to_string()),
/// );
/// let client = HubSpotClient::new(&config)?;
///
/// let page = client.list_page(100, None, None, false).await?;
/// println!("{} deals, more: {}", page.results.len(), page.has_more());
/// # Ok(())
/// # }
/// ```
pub struct HubSpotClient {
    /// Base URL without trailing slash
    base_url: String,

    /// HTTP client carrying auth and content headers
    client: Client,

    retry: RetryConfig,

    rate_limit: RateLimitConfig,

    /// Dispatch clock; locked for the duration of each request
    limiter: Mutex<RateLimiter>,
}

impl HubSpotClient {
    /// Build a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`EtlError::Configuration`] if no access token is configured
    /// or the HTTP client cannot be built.
    pub fn new(config: &HubSpotConfig) -> Result<Self> {
        let token = match &config.access_token {
            Some(token) if !token.expose_secret().is_blank() => token,
            _ => {
                return Err(EtlError::Configuration(
                    "No access token found in auth configuration".to_string(),
                ))
            }
        };

        let token: &str = token.expose_secret().as_ref();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            EtlError::Configuration("Access token contains invalid characters".to_string())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|_| {
            EtlError::Configuration(format!("Invalid user agent: {}", config.user_agent))
        })?;
        headers.insert(USER_AGENT, user_agent);

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| EtlError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!(
            base_url = %config.base_url,
            requests = config.rate_limit.requests,
            period_seconds = config.rate_limit.period_seconds,
            "HubSpot client initialized"
        );

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            retry: config.retry.clone(),
            rate_limit: config.rate_limit.clone(),
            limiter: Mutex::new(RateLimiter::new(config.rate_limit.min_interval())),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request under the rate limiter and retry policy
    ///
    /// `build` is called once per attempt. `429` responses sleep for
    /// `Retry-After` seconds and do not consume an attempt; they are capped by
    /// `max_rate_limit_waits`. Transport failures and any other non-success
    /// status are retried up to `max_attempts` in total, then reported as
    /// [`RemoteError::RetriesExhausted`] with the last status and error.
    async fn execute<F>(&self, operation: &'static str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut limiter = self.limiter.lock().await;
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt: u32 = 0;
        let mut rate_limit_waits: u32 = 0;

        loop {
            limiter.acquire().await;

            let (status, message) = match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    rate_limit_waits += 1;
                    if rate_limit_waits > self.retry.max_rate_limit_waits {
                        return Err(RemoteError::RateLimitExceeded {
                            waits: rate_limit_waits,
                        }
                        .into());
                    }

                    let wait = retry_after(&response, self.retry.max_retry_after());
                    tracing::warn!(
                        operation,
                        retry_after_secs = wait.as_secs_f64(),
                        waits = rate_limit_waits,
                        "Rate limited by HubSpot API, waiting"
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    (Some(status.as_u16()), format!("HTTP {status}: {body}"))
                }
                Err(e) => (e.status().map(|s| s.as_u16()), e.to_string()),
            };

            attempt += 1;
            if attempt >= max_attempts {
                tracing::error!(
                    operation,
                    attempts = attempt,
                    status = ?status,
                    error = %message,
                    "HubSpot request failed, retries exhausted"
                );
                return Err(RemoteError::RetriesExhausted {
                    attempts: attempt,
                    status,
                    message,
                }
                .into());
            }

            let delay = self.retry.backoff_delay(attempt - 1) + self.jitter();
            tracing::warn!(
                operation,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                status = ?status,
                error = %message,
                "Retrying HubSpot request after error"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn jitter(&self) -> Duration {
        if self.retry.max_jitter_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(0..=self.retry.max_jitter_ms);
        Duration::from_millis(ms)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .execute(operation, || self.client.get(url).query(query))
            .await?;

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::InvalidResponse(format!("{operation}: {e}")).into())
    }

    /// Check that the token is accepted by the deals endpoint
    ///
    /// Issues a single `limit=1` list call. Never fails: any error yields `false`.
    pub async fn validate_credentials(&self) -> bool {
        let url = self.url(DEALS_PATH);
        let query = [("limit", "1".to_string())];

        match self
            .get_json::<ListDealsResponse>("validate_credentials", &url, &query)
            .await
        {
            Ok(_) => {
                tracing::info!("HubSpot credentials validated");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "HubSpot credential validation failed");
                false
            }
        }
    }

    /// Fetch one page of deals
    ///
    /// `limit` is clamped to 100. `properties` defaults to
    /// [`DEFAULT_DEAL_PROPERTIES`]. Query parameters are sent in the order
    /// `limit`, `archived`, `after`, `properties`.
    pub async fn list_page(
        &self,
        limit: u32,
        after: Option<&Cursor>,
        properties: Option<&[String]>,
        archived: bool,
    ) -> Result<DealPage> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let properties = match properties {
            Some(props) if !props.is_empty() => props.join(","),
            _ => DEFAULT_DEAL_PROPERTIES.join(","),
        };

        let mut query: Vec<(&str, String)> = vec![
            ("limit", limit.to_string()),
            ("archived", archived.to_string()),
        ];
        if let Some(cursor) = after {
            query.push(("after", cursor.as_str().to_string()));
        }
        query.push(("properties", properties));

        tracing::info!(
            limit,
            has_after = after.is_some(),
            archived,
            "Retrieving deals from HubSpot"
        );

        let started = Instant::now();
        let url = self.url(DEALS_PATH);
        let response: ListDealsResponse = self.get_json("list_deals", &url, &query).await?;
        let page = DealPage::from(response);

        tracing::info!(
            deals_count = page.results.len(),
            has_more = page.has_more(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Deals retrieved successfully"
        );

        Ok(page)
    }

    /// Fetch a single deal by id
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotFound`] when the deal does not exist.
    pub async fn get_deal(&self, deal_id: &str, properties: Option<&[String]>) -> Result<RawDeal> {
        let url = self.url(&format!("{DEALS_PATH}/{deal_id}"));
        let mut query = Vec::new();
        if let Some(props) = properties.filter(|p| !p.is_empty()) {
            query.push(("properties", props.join(",")));
        }

        match self.get_json::<RawDeal>("get_deal", &url, &query).await {
            Err(EtlError::Remote(RemoteError::RetriesExhausted {
                status: Some(404),
                ..
            })) => {
                Err(RemoteError::NotFound(format!("deal {deal_id}")).into())
            }
            other => other,
        }
    }

    /// Fetch the deal property schema
    pub async fn get_deal_properties(&self) -> Result<Vec<PropertyDefinition>> {
        let url = self.url(DEAL_PROPERTIES_PATH);
        let envelope: ResultsEnvelope<PropertyDefinition> =
            self.get_json("get_deal_properties", &url, &[]).await?;
        tracing::debug!(count = envelope.results.len(), "Deal properties retrieved");
        Ok(envelope.results)
    }

    /// Fetch deal pipelines with their stages
    pub async fn get_pipelines(&self) -> Result<Vec<Pipeline>> {
        let url = self.url(DEAL_PIPELINES_PATH);
        let envelope: ResultsEnvelope<Pipeline> =
            self.get_json("get_pipelines", &url, &[]).await?;
        tracing::debug!(count = envelope.results.len(), "Deal pipelines retrieved");
        Ok(envelope.results)
    }

    /// Probe every endpoint the extractor touches
    ///
    /// Stops at the first failure and records it in [`ConnectionReport::error`].
    pub async fn test_connection(&self) -> ConnectionReport {
        let mut report = ConnectionReport {
            rate_limit_info: Some(self.rate_limit_info()),
            ..Default::default()
        };

        report.credentials_valid = self.validate_credentials().await;
        if !report.credentials_valid {
            report.error = Some("Invalid credentials".to_string());
            return report;
        }
        report.api_reachable = true;

        if let Err(e) = self.list_page(1, None, None, false).await {
            report.error = Some(format!("Deals endpoint failed: {e}"));
            return report;
        }
        report.deals_accessible = true;

        if let Err(e) = self.get_deal_properties().await {
            report.error = Some(format!("Properties endpoint failed: {e}"));
            return report;
        }
        report.properties_accessible = true;

        if let Err(e) = self.get_pipelines().await {
            report.error = Some(format!("Pipelines endpoint failed: {e}"));
            return report;
        }
        report.pipelines_accessible = true;

        report
    }

    fn rate_limit_info(&self) -> RateLimitInfo {
        let period = self.rate_limit.period_seconds.max(1) as f64;
        RateLimitInfo {
            limit: self.rate_limit.requests,
            period_seconds: self.rate_limit.period_seconds,
            requests_per_second: self.rate_limit.requests as f64 / period,
        }
    }
}

#[async_trait]
impl DealSource for HubSpotClient {
    async fn fetch_page(
        &self,
        limit: u32,
        after: Option<&Cursor>,
        properties: Option<&[String]>,
        archived: bool,
    ) -> Result<DealPage> {
        self.list_page(limit, after, properties, archived).await
    }
}

fn retry_after(response: &Response, ceiling: Duration) -> Duration {
    let header = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok());
    parse_retry_after(header, ceiling)
}

/// `Retry-After` in whole (or fractional) seconds, capped at `ceiling`
///
/// Missing, negative or unparseable values fall back to one second.
fn parse_retry_after(value: Option<&str>, ceiling: Duration) -> Duration {
    let wait = value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| *secs >= 0.0)
        .map(|secs| Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
        .unwrap_or(DEFAULT_RETRY_AFTER);
    wait.min(ceiling)
}
