//! Catalog sources for the matching engine.
//!
//! Provides the `CatalogSource` trait and its implementations. A source
//! hands out an owned, platform-filtered snapshot per fetch, so nothing is
//! held open while the engine scores pairs.

mod storefront;

pub use storefront::{CatalogPage, Credentials, Storefront, StorefrontCatalog};

use shelfmatch_model::{Platform, ProductRecord};
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from catalog source operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source not available")]
    Unavailable,
}

/// Trait for catalog sources (export files, HTTP exports, storefront clients).
///
/// The engine only ever sees the records a source returns.
pub trait CatalogSource {
    /// Fetch every record of one storefront.
    fn fetch_catalog(
        &self,
        platform: Platform,
    ) -> impl Future<Output = Result<Vec<ProductRecord>, CatalogError>> + Send;

    /// Check if the source is reachable.
    fn health_check(&self) -> impl Future<Output = Result<(), CatalogError>> + Send;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}

/// Extract the records of `platform` from a JSON export.
///
/// Accepts either a bare array or an object with a `products` array.
/// Entries that do not deserialize are logged and dropped.
pub fn parse_catalog(
    value: serde_json::Value,
    platform: Platform,
) -> Result<Vec<ProductRecord>, CatalogError> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("products") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(CatalogError::ParseError(
                    "Missing products array".to_string(),
                ))
            }
        },
        _ => {
            return Err(CatalogError::ParseError(
                "Expected an array of products".to_string(),
            ))
        }
    };

    let total = items.len();
    let mut records = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<ProductRecord>(item) {
            Ok(record) if record.platform == platform => records.push(record),
            Ok(_) => {}
            Err(e) => tracing::warn!(index, error = %e, "Dropping malformed product entry"),
        }
    }

    tracing::debug!(%platform, total, kept = records.len(), "Parsed catalog export");
    Ok(records)
}

/// Catalog stored as a JSON export on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CatalogSource for JsonFileSource {
    async fn fetch_catalog(&self, platform: Platform) -> Result<Vec<ProductRecord>, CatalogError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        parse_catalog(value, platform)
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        if metadata.is_file() {
            Ok(())
        } else {
            Err(CatalogError::Unavailable)
        }
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

/// HTTP export source configuration.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL of the product export service
    pub base_url: String,
    /// Path of the product listing, relative to the base URL
    pub products_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            products_path: "api/products".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Catalog served as a JSON export over HTTP.
pub struct HttpJsonSource {
    config: HttpSourceConfig,
    client: reqwest::Client,
}

impl HttpJsonSource {
    /// Create a new HTTP source.
    pub fn new(config: HttpSourceConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// URL of the product listing.
    fn products_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.products_path.trim_start_matches('/')
        )
    }
}

impl CatalogSource for HttpJsonSource {
    async fn fetch_catalog(&self, platform: Platform) -> Result<Vec<ProductRecord>, CatalogError> {
        let url = self.products_url();

        tracing::debug!(url = %url, %platform, "Fetching catalog export");

        let response = self
            .client
            .get(&url)
            .query(&[("platform", platform.as_str())])
            .send()
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::RequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))?;

        parse_catalog(json, platform)
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        let response = self
            .client
            .head(self.products_url())
            .send()
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CatalogError::Unavailable)
        }
    }

    fn name(&self) -> &'static str {
        "http-json"
    }
}
