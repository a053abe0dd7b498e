//! Per-product and batch sync entry points.
//!
//! Every product yields exactly one [`SyncResult`]. Failures are values, not
//! errors: a rejected or unreachable product never stops the rest of the
//! batch. Only missing credentials abort a batch, and they do so before any
//! request is sent.

use chrono::{DateTime, Utc};
use fbsync_core::{LookupError, ProductSyncRecord, SyncCredentials};
use futures::stream::{self, StreamExt};
use tokio::sync::watch;

use crate::client::SellerCenterClient;
use crate::error::{SellerCenterError, SyncError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Accepted by Seller Center; `synced_at` is what gets persisted.
    Success { synced_at: DateTime<Utc> },
    HttpError { status: u16, body: String },
    SignatureError { reason: String },
    TransportError { reason: String },
    LookupError { reason: String },
    /// The run was cancelled before this product was started.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    /// SKU, or a product label when the lookup failed before a SKU was known.
    pub sku: String,
    pub outcome: SyncOutcome,
}

impl SyncResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Success { .. })
    }

    /// The time to write back as `last_synced_at`, only for successes.
    #[must_use]
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        match self.outcome {
            SyncOutcome::Success { synced_at } => Some(synced_at),
            _ => None,
        }
    }

    #[must_use]
    pub fn lookup_failed(label: impl Into<String>, err: &LookupError) -> Self {
        Self {
            sku: label.into(),
            outcome: SyncOutcome::LookupError {
                reason: err.to_string(),
            },
        }
    }

    fn from_send(sku: &str, result: Result<DateTime<Utc>, SellerCenterError>) -> Self {
        let outcome = match result {
            Ok(synced_at) => SyncOutcome::Success { synced_at },
            Err(SellerCenterError::Status { status, body }) => {
                SyncOutcome::HttpError { status, body }
            }
            Err(SellerCenterError::Signature(e)) => SyncOutcome::SignatureError {
                reason: e.to_string(),
            },
            Err(err @ (SellerCenterError::Http(_)
            | SellerCenterError::Encode(_)
            | SellerCenterError::InvalidBaseUrl { .. })) => SyncOutcome::TransportError {
                reason: err.to_string(),
            },
        };
        Self {
            sku: sku.to_owned(),
            outcome,
        }
    }
}

impl SellerCenterClient {
    /// Syncs a single product. Never fails; the outcome carries any error.
    pub async fn sync_product(
        &self,
        record: &ProductSyncRecord,
        credentials: &SyncCredentials,
    ) -> SyncResult {
        let result = self.send_product_update(record, credentials).await;
        let sync_result = SyncResult::from_send(&record.sku, result);
        match &sync_result.outcome {
            SyncOutcome::Success { .. } | SyncOutcome::HttpError { .. } => {}
            SyncOutcome::SignatureError { reason } => {
                tracing::error!(
                    sku = %record.sku,
                    %reason,
                    "could not sign product update; skipping"
                );
            }
            SyncOutcome::TransportError { reason } => {
                tracing::error!(
                    sku = %record.sku,
                    %reason,
                    "transport failure syncing product; skipping"
                );
            }
            SyncOutcome::LookupError { .. } | SyncOutcome::Cancelled => {}
        }
        sync_result
    }

    /// Syncs every record, one result per input, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] when the user or secret is missing;
    /// no request is sent in that case.
    pub async fn sync_many(
        &self,
        records: &[ProductSyncRecord],
        credentials: &SyncCredentials,
    ) -> Result<Vec<SyncResult>, SyncError> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.sync_many_until(records, credentials, &cancel_rx).await
    }

    /// Like [`SellerCenterClient::sync_many`], but stops starting new products
    /// once `cancel` reads `true`. Requests already in flight run to completion
    /// or timeout; products never started are reported as
    /// [`SyncOutcome::Cancelled`].
    ///
    /// At most `max_concurrent_requests` products are in flight at once.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] when the user or secret is missing.
    pub async fn sync_many_until(
        &self,
        records: &[ProductSyncRecord],
        credentials: &SyncCredentials,
        cancel: &watch::Receiver<bool>,
    ) -> Result<Vec<SyncResult>, SyncError> {
        if let Err(e) = credentials.ensure_present() {
            tracing::error!(error = %e, "missing Seller Center credentials; aborting sync run");
            return Err(SyncError::Configuration(e));
        }

        if records.is_empty() {
            tracing::info!("no products to sync");
            return Ok(Vec::new());
        }

        tracing::info!(count = records.len(), "starting Seller Center sync");
        let concurrency = self.settings().max_concurrent_requests.max(1);

        // Iterate by index so the per-item future does not capture a
        // higher-ranked `&ProductSyncRecord`, which breaks `Send` inference
        // for callers that box this future (e.g. the cron scheduler).
        let results: Vec<SyncResult> = stream::iter(0..records.len())
            .map(|i| {
                let record = &records[i];
                async move {
                    let cancelled = *cancel.borrow();
                    if cancelled {
                        return SyncResult {
                            sku: record.sku.clone(),
                            outcome: SyncOutcome::Cancelled,
                        };
                    }
                    self.sync_product(record, credentials).await
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let cancelled = results
            .iter()
            .filter(|r| r.outcome == SyncOutcome::Cancelled)
            .count();
        let failed = results.len() - succeeded - cancelled;
        if failed > 0 {
            tracing::warn!(
                succeeded,
                failed,
                cancelled,
                "Seller Center sync finished with failures"
            );
        } else {
            tracing::info!(succeeded, cancelled, "Seller Center sync finished");
        }

        Ok(results)
    }
}
