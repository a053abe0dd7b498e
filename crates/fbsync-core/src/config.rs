use crate::app_config::{AppConfig, Environment, ProtocolVariant};
use crate::ConfigError;

const DEFAULT_API_URL: &str = "https://sellercenter-api.falabella.com/";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials are optional here. A missing `FALABELLA_TOKEN` surfaces as a
/// per-run configuration error from the sync pass.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("FBSYNC_ENV", "development"))?;
    let log_level = or_default("FBSYNC_LOG_LEVEL", "info");

    let falabella_user = optional("FALABELLA_USER");
    let falabella_token = optional("FALABELLA_TOKEN");
    let seller_id = optional("FALABELLA_SELLER_ID");

    let api_url = or_default("FBSYNC_API_URL", DEFAULT_API_URL);
    if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
        return Err(invalid(
            "FBSYNC_API_URL",
            format!("'{api_url}' is not an http(s) URL"),
        ));
    }

    let protocol = or_default("FBSYNC_PROTOCOL", "xml")
        .parse::<ProtocolVariant>()
        .map_err(|reason| invalid("FBSYNC_PROTOCOL", reason))?;

    let api_version = or_default("FBSYNC_API_VERSION", "1.0");
    let action = or_default("FBSYNC_ACTION", "ProductUpdate");
    let integration_type = or_default("FBSYNC_INTEGRATION_TYPE", "PROPIA");
    let country_code = or_default("FBSYNC_COUNTRY_CODE", "FAPE");
    let catalog_path = PathBuf::from(or_default("FBSYNC_CATALOG_PATH", "./config/catalog.yaml"));
    let warehouses = parse_warehouses(&or_default("FBSYNC_WAREHOUSES", ""));

    let request_timeout_secs = parse_u64("FBSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "FBSYNC_REQUEST_TIMEOUT_SECS",
            "timeout must be at least 1 second".to_string(),
        ));
    }
    let inter_request_delay_ms = parse_u64("FBSYNC_INTER_REQUEST_DELAY_MS", "1000")?;
    let max_retries = parse_u32("FBSYNC_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("FBSYNC_RETRY_BACKOFF_BASE_MS", "1000")?;
    let max_concurrent_requests = parse_usize("FBSYNC_MAX_CONCURRENT_REQUESTS", "1")?;
    let sync_schedule = or_default("FBSYNC_SYNC_SCHEDULE", "0 */5 * * * *");
    let change_window_minutes = or_default("FBSYNC_CHANGE_WINDOW_MINUTES", "5")
        .parse::<u32>()
        .map(i64::from)
        .map_err(|e| invalid("FBSYNC_CHANGE_WINDOW_MINUTES", e.to_string()))?;

    Ok(AppConfig {
        env,
        log_level,
        falabella_user,
        falabella_token,
        seller_id,
        api_url,
        protocol,
        api_version,
        action,
        integration_type,
        country_code,
        catalog_path,
        warehouses,
        request_timeout_secs,
        inter_request_delay_ms,
        max_retries,
        retry_backoff_base_ms,
        max_concurrent_requests,
        sync_schedule,
        change_window_minutes,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FBSYNC_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_warehouses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
