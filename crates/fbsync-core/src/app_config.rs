use std::path::PathBuf;

use crate::products::SyncCredentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Seller Center wire format. The variants are not wire-compatible with each
/// other: each fixes its own body encoding, signature canonicalization and
/// timestamp style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProtocolVariant {
    /// XML `<Request><Product>` body, signed parameters in the query string.
    #[default]
    Xml,
    /// All parameters, product fields included, as a form-encoded body.
    Form,
    /// All parameters, product fields included, as a flat JSON object.
    Json,
}

impl std::fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolVariant::Xml => write!(f, "xml"),
            ProtocolVariant::Form => write!(f, "form"),
            ProtocolVariant::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ProtocolVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(ProtocolVariant::Xml),
            "form" => Ok(ProtocolVariant::Form),
            "json" => Ok(ProtocolVariant::Json),
            other => Err(format!(
                "unknown protocol '{other}'; expected one of: xml, form, json"
            )),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub falabella_user: Option<String>,
    pub falabella_token: Option<String>,
    pub seller_id: Option<String>,
    pub api_url: String,
    pub protocol: ProtocolVariant,
    pub api_version: String,
    pub action: String,
    pub integration_type: String,
    pub country_code: String,
    pub catalog_path: PathBuf,
    /// Warehouse codes whose stock is summed. Empty means every warehouse.
    pub warehouses: Vec<String>,
    pub request_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_concurrent_requests: usize,
    pub sync_schedule: String,
    pub change_window_minutes: i64,
}

impl AppConfig {
    /// Credentials as configured, possibly empty. Presence is checked at sync
    /// time so a missing token is reported by the run, not at startup.
    #[must_use]
    pub fn credentials(&self) -> SyncCredentials {
        SyncCredentials::new(
            self.falabella_user.clone().unwrap_or_default(),
            self.falabella_token.clone().unwrap_or_default(),
        )
    }

    /// Seller id for the `User-Agent` header, falling back to the API user.
    #[must_use]
    pub fn effective_seller_id(&self) -> String {
        self.seller_id
            .clone()
            .or_else(|| self.falabella_user.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("falabella_user", &self.falabella_user)
            .field(
                "falabella_token",
                &self.falabella_token.as_ref().map(|_| "[redacted]"),
            )
            .field("seller_id", &self.seller_id)
            .field("api_url", &self.api_url)
            .field("protocol", &self.protocol)
            .field("api_version", &self.api_version)
            .field("action", &self.action)
            .field("integration_type", &self.integration_type)
            .field("country_code", &self.country_code)
            .field("catalog_path", &self.catalog_path)
            .field("warehouses", &self.warehouses)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("sync_schedule", &self.sync_schedule)
            .field("change_window_minutes", &self.change_window_minutes)
            .finish()
    }
}
