use thiserror::Error;

/// Errors from computing a request signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    /// The shared secret (`falabella.token`) is unset or empty.
    #[error("signing secret is missing or empty")]
    MissingSecret,

    /// Rejected by `Mac::new_from_slice`. HMAC-SHA256 takes keys of any
    /// length, so this only surfaces if the MAC type is swapped for one with
    /// a fixed key size; it keeps `sign` free of `expect`.
    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Errors returned by the Seller Center client for a single request.
#[derive(Debug, Error)]
pub enum SellerCenterError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Seller Center returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("signature error: {0}")]
    Signature(#[from] SignError),

    /// The request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Errors that abort a whole batch before any request is sent.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(#[from] fbsync_core::ConfigError),
}
