//! Startup configuration supplied by the host app as JSON.
//!
//! ```json
//! {
//!   "db_name": "vayara",
//!   "map_size_mb": 10,
//!   "fallback_language": "en",
//!   "simulated_scan_code": "1234567890123",
//!   "catalog": null
//! }
//! ```
//!
//! Every field is optional; omitted fields take the [`Default`] values. A
//! missing `catalog` means the built-in seed products.

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::product_catalog::{seed_products, ProductCatalog};
use crate::product_model::Product;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base name of the LMDB directory (`<db_name>.lmdb`).
    pub db_name: String,

    pub map_size_mb: usize,

    pub fallback_language: String,

    /// Code emitted when the simulated camera scan completes.
    pub simulated_scan_code: String,

    pub catalog: Option<Vec<Product>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_name: "vayara".to_string(),
            map_size_mb: 10,
            fallback_language: "en".to_string(),
            simulated_scan_code: "1234567890123".to_string(),
            catalog: None,
        }
    }
}

impl AppConfig {
    pub fn named(db_name: &str) -> Self {
        Self {
            db_name: db_name.to_string(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, AppResponse> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.db_name.trim().is_empty() {
            return Err(AppResponse::ValidationError("db_name cannot be empty".to_string()));
        }
        if self.map_size_mb == 0 {
            return Err(AppResponse::ValidationError("map_size_mb must be positive".to_string()));
        }
        if self.fallback_language.trim().is_empty() {
            return Err(AppResponse::ValidationError(
                "fallback_language cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Builds the catalog from the configured products, or the seed set.
    pub fn build_catalog(&self) -> Result<ProductCatalog, AppResponse> {
        match &self.catalog {
            Some(products) => ProductCatalog::new(products.clone()),
            None => ProductCatalog::new(seed_products()),
        }
    }
}
