//! HMAC-SHA256 request signing for the Seller Center API.
//!
//! The signature is computed over a canonical rendering of the request
//! parameters (every key except `Signature`, sorted by key) keyed with the
//! seller's API token, and sent as a lowercase hex digest.

use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::SignError;
use crate::params::{RequestParameters, SIGNATURE_KEY};

type HmacSha256 = Hmac<Sha256>;

/// Everything except the RFC 3986 unreserved characters is percent-encoded.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// How the sorted parameters are rendered before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonicalization {
    /// `key1value1key2value2...` with no separator.
    Concatenated,
    /// `key1=value1&key2=value2...` with keys and values percent-encoded.
    PercentEncoded,
}

/// Percent-encodes a single key or value (spaces become `%20`).
pub(crate) fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Renders `params` as the exact string that gets signed.
#[must_use]
pub fn canonical_string(params: &RequestParameters, scheme: Canonicalization) -> String {
    let mut pairs: Vec<(&str, &str)> = params.iter().filter(|(k, _)| *k != SIGNATURE_KEY).collect();
    pairs.sort_unstable();

    match scheme {
        Canonicalization::Concatenated => pairs.iter().map(|(k, v)| format!("{k}{v}")).collect(),
        Canonicalization::PercentEncoded => pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&"),
    }
}

/// Computes the lowercase hex HMAC-SHA256 signature of `params`.
///
/// Any `Signature` already present is ignored, so re-signing a signed mapping
/// yields the same digest.
///
/// # Errors
///
/// Returns [`SignError::MissingSecret`] when `secret` is empty or blank.
pub fn sign(
    params: &RequestParameters,
    secret: &str,
    scheme: Canonicalization,
) -> Result<String, SignError> {
    if secret.trim().is_empty() {
        tracing::error!("no Seller Center token configured; cannot sign request");
        return Err(SignError::MissingSecret);
    }

    let canonical = canonical_string(params, scheme);
    tracing::debug!(%canonical, ?scheme, "signing Seller Center request");

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignError::InvalidKey(e.to_string()))?;
    mac.update(canonical.as_bytes());
    Ok(format!("{:x}", mac.finalize().into_bytes()))
}

/// Returns `true` if the `Signature` carried by `params` matches a fresh
/// signature computed with `secret`. Comparison is constant-time.
#[must_use]
pub fn verify(params: &RequestParameters, secret: &str, scheme: Canonicalization) -> bool {
    let Some(given) = params.signature() else {
        return false;
    };
    let Ok(expected) = sign(params, secret, scheme) else {
        return false;
    };
    expected.as_bytes().ct_eq(given.as_bytes()).into()
}
