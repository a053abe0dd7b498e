pub mod app_config;
pub mod catalog;
pub mod config;
pub mod products;

pub use app_config::{AppConfig, Environment, ProtocolVariant};
pub use catalog::{
    resolve_sync_record, Catalog, CatalogError, CatalogFile, CatalogProduct, CatalogVariant,
    LookupError, StockLine, YamlCatalog,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{ProductSyncRecord, SyncCredentials};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    /// A Seller Center credential (`falabella.user` / `falabella.token`) is
    /// unset or empty.
    #[error("missing Falabella credential '{0}'; check FALABELLA_USER and FALABELLA_TOKEN")]
    MissingCredential(&'static str),
}
