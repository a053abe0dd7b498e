use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::ConfigError;

/// Seller Center API credentials, passed explicitly to every sync call.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncCredentials {
    user: String,
    secret: String,
}

impl SyncCredentials {
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
        }
    }

    /// The `UserID` sent with every request.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The shared secret used as the HMAC key.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Checks that both the user and the secret are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] naming the first blank value.
    pub fn ensure_present(&self) -> Result<(), ConfigError> {
        if self.user.trim().is_empty() {
            return Err(ConfigError::MissingCredential("falabella.user"));
        }
        if self.secret.trim().is_empty() {
            return Err(ConfigError::MissingCredential("falabella.token"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SyncCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCredentials")
            .field("user", &self.user)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// The per-product view pushed to Seller Center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSyncRecord {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    /// On-hand stock summed across the selected warehouses.
    pub quantity: i64,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl ProductSyncRecord {
    /// Price rendered with exactly two decimal places, e.g. `"19.90"`.
    #[must_use]
    pub fn price_string(&self) -> String {
        let mut price = self.price.round_dp(2);
        price.rescale(2);
        price.to_string()
    }
}
