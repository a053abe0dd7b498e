//! HTTP client for the Falabella Seller Center API.
//!
//! Wraps `reqwest` with request signing, the configured wire format, pacing
//! and bounded retries. A product update is a single signed `POST`; any 2xx
//! answer counts as accepted.

use std::time::Duration;

use chrono::{DateTime, Utc};
use fbsync_core::{AppConfig, ProductSyncRecord, ProtocolVariant, SyncCredentials};
use reqwest::{Client, Url};

use crate::error::SellerCenterError;
use crate::params::RequestParameters;
use crate::protocol::{build_params, extract_error_message, WireProtocol};
use crate::rate_limit::{retry_with_backoff, RateLimiter};
use crate::signer::sign;

pub const DEFAULT_BASE_URL: &str = "https://sellercenter-api.falabella.com/";

/// `<SellerID>/<Lang>/<LangVersion>/<IntegrationType>/<CountryCode>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    pub seller_id: String,
    pub language: String,
    pub language_version: String,
    pub integration_type: String,
    pub country_code: String,
}

impl UserAgent {
    #[must_use]
    pub fn new(seller_id: &str, integration_type: &str, country_code: &str) -> Self {
        Self {
            seller_id: seller_id.to_owned(),
            language: "Rust".to_owned(),
            language_version: env!("CARGO_PKG_RUST_VERSION").to_owned(),
            integration_type: integration_type.to_owned(),
            country_code: country_code.to_owned(),
        }
    }
}

impl std::fmt::Display for UserAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.seller_id,
            self.language,
            self.language_version,
            self.integration_type,
            self.country_code
        )
    }
}

/// Everything the client needs besides credentials.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub protocol: ProtocolVariant,
    pub action: String,
    pub api_version: String,
    pub user_agent: UserAgent,
    /// Business unit code written into the XML body.
    pub operator_code: String,
    pub timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_concurrent_requests: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            protocol: ProtocolVariant::default(),
            action: "ProductUpdate".to_owned(),
            api_version: "1.0".to_owned(),
            user_agent: UserAgent::new("", "PROPIA", "FAPE"),
            operator_code: "FAPE".to_owned(),
            timeout_secs: 30,
            inter_request_delay_ms: 1000,
            max_retries: 2,
            retry_backoff_base_ms: 1000,
            max_concurrent_requests: 1,
        }
    }
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            protocol: config.protocol,
            action: config.action.clone(),
            api_version: config.api_version.clone(),
            user_agent: UserAgent::new(
                &config.effective_seller_id(),
                &config.integration_type,
                &config.country_code,
            ),
            operator_code: config.country_code.clone(),
            timeout_secs: config.request_timeout_secs,
            inter_request_delay_ms: config.inter_request_delay_ms,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            max_concurrent_requests: config.max_concurrent_requests,
        }
    }
}

/// A fully signed request, ready to send.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: Url,
    pub params: RequestParameters,
    pub content_type: &'static str,
    pub accept: &'static str,
    pub body: Vec<u8>,
}

/// Client for the Seller Center product update endpoint.
///
/// Use [`SellerCenterClient::new`] with [`ClientSettings::default`] for
/// production, or override `base_url` to point at a mock server in tests.
pub struct SellerCenterClient {
    client: Client,
    base_url: Url,
    settings: ClientSettings,
    limiter: RateLimiter,
}

impl SellerCenterClient {
    /// Creates a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SellerCenterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SellerCenterError::InvalidBaseUrl`] if
    /// `settings.base_url` does not parse.
    pub fn new(settings: ClientSettings) -> Result<Self, SellerCenterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.to_string())
            .build()?;

        let base_url =
            Url::parse(&settings.base_url).map_err(|e| SellerCenterError::InvalidBaseUrl {
                url: settings.base_url.clone(),
                reason: e.to_string(),
            })?;

        let limiter = RateLimiter::new(Duration::from_millis(settings.inter_request_delay_ms));

        Ok(Self {
            client,
            base_url,
            settings,
            limiter,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Builds and signs the product update request for `record` at time `now`.
    ///
    /// # Errors
    ///
    /// - [`SellerCenterError::Signature`] if the secret is missing.
    /// - [`SellerCenterError::Encode`] if the body cannot be encoded.
    pub fn prepare_request(
        &self,
        record: &ProductSyncRecord,
        credentials: &SyncCredentials,
        now: DateTime<Utc>,
    ) -> Result<PreparedRequest, SellerCenterError> {
        let protocol = self.settings.protocol;
        let mut params = build_params(
            protocol,
            &self.settings.action,
            &self.settings.api_version,
            credentials.user(),
            record,
            now,
        );

        let signature = sign(&params, credentials.secret(), protocol.canonicalization())?;
        params.set_signature(signature);

        let body = protocol.serialize_body(record, &params, &self.settings.operator_code)?;

        let mut url = self.base_url.clone();
        if let Some(query) = protocol.query_string(&params) {
            url.set_query(Some(&query));
        }

        Ok(PreparedRequest {
            url,
            params,
            content_type: body.content_type,
            accept: body.accept,
            body: body.bytes,
        })
    }

    /// Pushes one product update, retrying transient failures.
    ///
    /// Each attempt waits for the rate limiter first and is then signed with
    /// the current time, so the `Timestamp` is never older than the send.
    /// Returns the time the update was accepted.
    ///
    /// # Errors
    ///
    /// - [`SellerCenterError::Status`] for a non-2xx answer (after retries for 429/5xx).
    /// - [`SellerCenterError::Http`] on network failure or timeout after retries.
    /// - [`SellerCenterError::Signature`] / [`SellerCenterError::Encode`] when the
    ///   request cannot be built (never retried).
    pub async fn send_product_update(
        &self,
        record: &ProductSyncRecord,
        credentials: &SyncCredentials,
    ) -> Result<DateTime<Utc>, SellerCenterError> {
        retry_with_backoff(
            self.settings.max_retries,
            self.settings.retry_backoff_base_ms,
            || async move {
                self.limiter.acquire().await;
                let request = self.prepare_request(record, credentials, Utc::now())?;
                self.execute(&record.sku, request).await
            },
        )
        .await
    }

    async fn execute(
        &self,
        sku: &str,
        request: PreparedRequest,
    ) -> Result<DateTime<Utc>, SellerCenterError> {
        tracing::debug!(
            sku,
            url = %request.url,
            content_type = request.content_type,
            "sending Seller Center product update"
        );

        let response = self
            .client
            .post(request.url)
            .header(reqwest::header::CONTENT_TYPE, request.content_type)
            .header(reqwest::header::ACCEPT, request.accept)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(sku, status = status.as_u16(), "product synced with Seller Center");
            return Ok(Utc::now());
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);
        tracing::error!(
            sku,
            status = status.as_u16(),
            error_message = message.as_deref().unwrap_or(""),
            "Seller Center rejected product update"
        );
        Err(SellerCenterError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
