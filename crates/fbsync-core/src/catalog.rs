//! Product catalog collaborator.
//!
//! The sync runner only needs three things from the catalog: the products that
//! changed since a cutoff (or all of them), a way to resolve each product into
//! a [`ProductSyncRecord`], and a way to persist `last_synced_at`. [`Catalog`]
//! is that seam; [`YamlCatalog`] is the file-backed implementation shipped with
//! the CLI.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::products::ProductSyncRecord;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog YAML: {0}")]
    Parse(#[source] serde_yaml::Error),

    #[error("failed to serialize catalog YAML: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),

    #[error("product {0} is not in the catalog")]
    UnknownProduct(i64),
}

/// Why a catalog product could not be turned into a sync record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("product {product_id} ('{name}') has no variants")]
    NoVariant { product_id: i64, name: String },

    #[error("no stock location found for product {product_id} ('{name}')")]
    NoStockLocation { product_id: i64, name: String },
}

/// On-hand quantity of one variant at one warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub warehouse: String,
    pub on_hand: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVariant {
    pub id: i64,
    /// Internal reference used as the seller SKU when present.
    #[serde(default)]
    pub default_code: Option<String>,
    #[serde(default)]
    pub stock: Vec<StockLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: i64,
    pub name: String,
    pub list_price: Decimal,
    /// Last modification of the catalog record. Writing `last_synced_at`
    /// does not touch it.
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub variants: Vec<CatalogVariant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
}

pub trait Catalog {
    /// Products whose record changed strictly after `cutoff`.
    fn changed_since(&self, cutoff: DateTime<Utc>) -> Vec<CatalogProduct>;

    fn all_products(&self) -> Vec<CatalogProduct>;

    /// Records a confirmed sync for the product.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownProduct`] if `product_id` is not present,
    /// or an implementation-specific persistence error.
    fn mark_synced(&mut self, product_id: i64, at: DateTime<Utc>) -> Result<(), CatalogError>;

    /// Persists pending `mark_synced` writes. In-memory catalogs need nothing.
    ///
    /// # Errors
    ///
    /// Returns an implementation-specific persistence error.
    fn flush(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

/// Resolve a catalog product into the record pushed to Seller Center.
///
/// The first variant supplies the SKU (its `default_code`, or its id when no
/// code is set). Quantity is the on-hand sum across the warehouses listed in
/// `warehouses`, or across all warehouses when the list is empty. The sum is
/// truncated toward zero and negative totals are sent as 0.
///
/// # Errors
///
/// Returns [`LookupError`] when the product has no variant or no matching
/// stock location.
pub fn resolve_sync_record(
    product: &CatalogProduct,
    warehouses: &[String],
) -> Result<ProductSyncRecord, LookupError> {
    let variant = product
        .variants
        .first()
        .ok_or_else(|| LookupError::NoVariant {
            product_id: product.id,
            name: product.name.clone(),
        })?;

    let lines: Vec<&StockLine> = variant
        .stock
        .iter()
        .filter(|line| warehouses.is_empty() || warehouses.contains(&line.warehouse))
        .collect();

    if lines.is_empty() {
        return Err(LookupError::NoStockLocation {
            product_id: product.id,
            name: product.name.clone(),
        });
    }

    let total: Decimal = lines.iter().map(|line| line.on_hand).sum();
    let quantity = total.trunc().to_i64().unwrap_or(0).max(0);
    if total.is_sign_negative() && !total.is_zero() {
        tracing::debug!(
            product_id = product.id,
            on_hand = %total,
            "negative on-hand stock; sending 0"
        );
    }

    let sku = variant
        .default_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map_or_else(|| variant.id.to_string(), str::to_string);

    Ok(ProductSyncRecord {
        sku,
        name: product.name.clone(),
        price: product.list_price,
        quantity,
        last_synced_at: product.last_synced_at,
    })
}

/// Catalog backed by a YAML file such as `config/catalog.yaml`.
#[derive(Debug, Clone)]
pub struct YamlCatalog {
    path: Option<PathBuf>,
    file: CatalogFile,
}

impl YamlCatalog {
    /// Load and validate the catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut catalog = Self::from_yaml_str(&content)?;
        catalog.path = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Parse a catalog that is not tied to a file; [`YamlCatalog::save`] is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the YAML cannot be parsed or fails validation.
    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(content).map_err(CatalogError::Parse)?;
        validate_catalog(&file)?;
        Ok(Self { path: None, file })
    }

    #[must_use]
    pub fn products(&self) -> &[CatalogProduct] {
        &self.file.products
    }

    /// Write the catalog back to its file through a temporary sibling and a rename.
    ///
    /// The file is re-rendered from the parsed data, so YAML comments and
    /// custom formatting in the original are not preserved.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if serialization or any filesystem step fails.
    pub fn save(&self) -> Result<(), CatalogError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let yaml = serde_yaml::to_string(&self.file).map_err(CatalogError::Serialize)?;
        let tmp = path.with_extension("yaml.tmp");
        let io_err = |source| CatalogError::Io {
            path: tmp.display().to_string(),
            source,
        };
        std::fs::write(&tmp, yaml).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}

impl Catalog for YamlCatalog {
    fn changed_since(&self, cutoff: DateTime<Utc>) -> Vec<CatalogProduct> {
        self.file
            .products
            .iter()
            .filter(|p| p.updated_at > cutoff)
            .cloned()
            .collect()
    }

    fn all_products(&self) -> Vec<CatalogProduct> {
        self.file.products.clone()
    }

    fn mark_synced(&mut self, product_id: i64, at: DateTime<Utc>) -> Result<(), CatalogError> {
        let product = self
            .file
            .products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or(CatalogError::UnknownProduct(product_id))?;
        product.last_synced_at = Some(at);
        Ok(())
    }

    fn flush(&self) -> Result<(), CatalogError> {
        self.save()
    }
}

fn validate_catalog(file: &CatalogFile) -> Result<(), CatalogError> {
    let mut seen_ids = HashSet::new();

    for product in &file.products {
        if product.name.trim().is_empty() {
            return Err(CatalogError::Validation(format!(
                "product {} has an empty name",
                product.id
            )));
        }

        if product.list_price.is_sign_negative() && !product.list_price.is_zero() {
            return Err(CatalogError::Validation(format!(
                "product '{}' has a negative price {}",
                product.name, product.list_price
            )));
        }

        if !seen_ids.insert(product.id) {
            return Err(CatalogError::Validation(format!(
                "duplicate product id: {}",
                product.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
