use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with credentials populated; everything else is defaulted.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("FALABELLA_USER", "seller@example.com");
    m.insert("FALABELLA_TOKEN", "topsecret");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "FBSYNC_ENV"));
}

#[test]
fn build_app_config_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.api_url, "https://sellercenter-api.falabella.com/");
    assert_eq!(cfg.protocol, ProtocolVariant::Xml);
    assert_eq!(cfg.api_version, "1.0");
    assert_eq!(cfg.action, "ProductUpdate");
    assert_eq!(cfg.integration_type, "PROPIA");
    assert_eq!(cfg.country_code, "FAPE");
    assert_eq!(
        cfg.catalog_path,
        std::path::PathBuf::from("./config/catalog.yaml")
    );
    assert!(cfg.warehouses.is_empty());
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.inter_request_delay_ms, 1000);
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
    assert_eq!(cfg.max_concurrent_requests, 1);
    assert_eq!(cfg.sync_schedule, "0 */5 * * * *");
    assert_eq!(cfg.change_window_minutes, 5);
}

#[test]
fn build_app_config_succeeds_without_credentials() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("credentials are optional");
    assert!(cfg.falabella_user.is_none());
    assert!(cfg.falabella_token.is_none());
    assert!(matches!(
        cfg.credentials().ensure_present(),
        Err(ConfigError::MissingCredential("falabella.user"))
    ));
}

#[test]
fn blank_credentials_count_as_missing() {
    let mut map = full_env();
    map.insert("FALABELLA_TOKEN", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.falabella_token.is_none());
    assert!(matches!(
        cfg.credentials().ensure_present(),
        Err(ConfigError::MissingCredential("falabella.token"))
    ));
}

#[test]
fn seller_id_falls_back_to_user() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.effective_seller_id(), "seller@example.com");

    let mut map = full_env();
    map.insert("FALABELLA_SELLER_ID", "SC4ACDC");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.effective_seller_id(), "SC4ACDC");
}

#[test]
fn protocol_override_is_case_insensitive() {
    let mut map = full_env();
    map.insert("FBSYNC_PROTOCOL", "JSON");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.protocol, ProtocolVariant::Json);
}

#[test]
fn protocol_invalid() {
    let mut map = full_env();
    map.insert("FBSYNC_PROTOCOL", "soap");
    let result = build_app_config(lookup_from_map(&map));
    assert_eq!(
        invalid_var(&result),
        Some("FBSYNC_PROTOCOL"),
        "got: {result:?}"
    );
}

#[test]
fn api_url_must_be_http() {
    let mut map = full_env();
    map.insert("FBSYNC_API_URL", "ftp://sellercenter");
    let result = build_app_config(lookup_from_map(&map));
    assert_eq!(
        invalid_var(&result),
        Some("FBSYNC_API_URL"),
        "got: {result:?}"
    );
}

#[test]
fn warehouses_are_split_and_trimmed() {
    let mut map = full_env();
    map.insert("FBSYNC_WAREHOUSES", " WH1, ,WH2 ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.warehouses, vec!["WH1".to_string(), "WH2".to_string()]);
}

#[test]
fn request_timeout_override() {
    let mut map = full_env();
    map.insert("FBSYNC_REQUEST_TIMEOUT_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.request_timeout_secs, 60);
}

#[test]
fn request_timeout_zero_is_rejected() {
    let mut map = full_env();
    map.insert("FBSYNC_REQUEST_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert_eq!(
        invalid_var(&result),
        Some("FBSYNC_REQUEST_TIMEOUT_SECS"),
        "got: {result:?}"
    );
}

#[test]
fn max_retries_invalid() {
    let mut map = full_env();
    map.insert("FBSYNC_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert_eq!(
        invalid_var(&result),
        Some("FBSYNC_MAX_RETRIES"),
        "got: {result:?}"
    );
}

#[test]
fn max_concurrent_requests_override() {
    let mut map = full_env();
    map.insert("FBSYNC_MAX_CONCURRENT_REQUESTS", "4");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_concurrent_requests, 4);
}

#[test]
fn change_window_rejects_negative() {
    let mut map = full_env();
    map.insert("FBSYNC_CHANGE_WINDOW_MINUTES", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert_eq!(
        invalid_var(&result),
        Some("FBSYNC_CHANGE_WINDOW_MINUTES"),
        "got: {result:?}"
    );
}

#[test]
fn debug_redacts_token() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("topsecret"), "token leaked: {rendered}");
    assert!(rendered.contains("[redacted]"));
}

fn invalid_var(result: &Result<AppConfig, ConfigError>) -> Option<&str> {
    match result {
        Err(ConfigError::InvalidEnvVar { var, .. }) => Some(var.as_str()),
        _ => None,
    }
}
