//! One sync pass: select changed products, resolve them, push them, and
//! record confirmed syncs back into the catalog.

use chrono::{Duration, Utc};
use fbsync_core::{resolve_sync_record, AppConfig, Catalog, ProductSyncRecord};
use fbsync_sellercenter::{SellerCenterClient, SyncOutcome, SyncResult};
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub(crate) struct RunOptions {
    /// Push every product instead of only the recently changed ones.
    pub full: bool,
    /// Resolve and print what would be sent without calling the API.
    pub dry_run: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub selected: usize,
    pub succeeded: usize,
    /// Lookup, signature, HTTP and transport failures together.
    pub failed: usize,
    pub cancelled: usize,
}

impl RunSummary {
    fn tally(selected: usize, results: &[SyncResult]) -> Self {
        let mut summary = Self {
            selected,
            ..Self::default()
        };
        for result in results {
            match result.outcome {
                SyncOutcome::Success { .. } => summary.succeeded += 1,
                SyncOutcome::Cancelled => summary.cancelled += 1,
                SyncOutcome::HttpError { .. }
                | SyncOutcome::SignatureError { .. }
                | SyncOutcome::TransportError { .. }
                | SyncOutcome::LookupError { .. } => summary.failed += 1,
            }
        }
        summary
    }
}

/// Runs one sync pass against `catalog`.
///
/// Products are selected by `updated_at` within the configured change window,
/// or all of them with `options.full`. Only products the API accepted get
/// `last_synced_at` written, and the catalog is flushed once at the end.
///
/// # Errors
///
/// Returns an error when credentials are missing or the catalog cannot be
/// updated. Per-product failures are counted in the summary instead.
pub(crate) async fn run_sync<C: Catalog>(
    config: &AppConfig,
    client: &SellerCenterClient,
    catalog: &mut C,
    options: &RunOptions,
    cancel: &watch::Receiver<bool>,
) -> anyhow::Result<RunSummary> {
    let mut products = if options.full {
        catalog.all_products()
    } else {
        let cutoff = Utc::now() - Duration::minutes(config.change_window_minutes);
        catalog.changed_since(cutoff)
    };
    if let Some(limit) = options.limit {
        products.truncate(limit);
    }
    let selected = products.len();
    tracing::info!(selected, full = options.full, "selected products for sync");

    let mut product_ids: Vec<i64> = Vec::with_capacity(products.len());
    let mut records: Vec<ProductSyncRecord> = Vec::with_capacity(products.len());
    let mut lookup_failures: Vec<SyncResult> = Vec::new();
    for product in &products {
        match resolve_sync_record(product, &config.warehouses) {
            Ok(record) => {
                product_ids.push(product.id);
                records.push(record);
            }
            Err(e) => {
                tracing::warn!(product_id = product.id, error = %e, "skipping product");
                lookup_failures.push(SyncResult::lookup_failed(
                    format!("product {}", product.id),
                    &e,
                ));
            }
        }
    }

    if options.dry_run {
        println!("dry-run: would sync {} products", records.len());
        for record in &records {
            println!(
                "  {}  price={}  quantity={}",
                record.sku,
                record.price_string(),
                record.quantity
            );
        }
        for failure in &lookup_failures {
            println!("  {}  skipped", failure.sku);
        }
        return Ok(RunSummary {
            selected,
            failed: lookup_failures.len(),
            ..RunSummary::default()
        });
    }

    let results = client
        .sync_many_until(&records, &config.credentials(), cancel)
        .await?;

    let mut marked = 0usize;
    for (product_id, result) in product_ids.iter().zip(&results) {
        if let Some(at) = result.synced_at() {
            catalog.mark_synced(*product_id, at)?;
            marked += 1;
        }
    }
    if marked > 0 {
        catalog.flush()?;
    }

    let mut all_results = lookup_failures;
    all_results.extend(results);
    Ok(RunSummary::tally(selected, &all_results))
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
