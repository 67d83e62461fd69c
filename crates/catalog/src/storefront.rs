//! Storefront client capability.
//!
//! A storefront client knows how to log in and page through one
//! storefront's catalog. The engine never talks to a client directly;
//! `StorefrontCatalog` turns any client into a `CatalogSource`.

use crate::{CatalogError, CatalogSource};
use shelfmatch_model::{Platform, ProductRecord};
use std::future::Future;

/// Login credentials for a storefront account.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One page of catalog listings.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub products: Vec<ProductRecord>,
    pub has_next: bool,
}

/// Trait for storefront clients, one implementation per transport.
pub trait Storefront {
    /// Storefront this client talks to.
    fn platform(&self) -> Platform;

    /// Log in; later calls run as this account.
    fn authenticate(
        &mut self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    /// Fetch one page of listings, starting at page 1.
    fn fetch_catalog_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send;

    /// Fetch full details for one product.
    fn fetch_product_detail(
        &self,
        platform_id: &str,
    ) -> impl Future<Output = Result<ProductRecord, CatalogError>> + Send;
}

/// Adapts a storefront client into a catalog source by reading every page.
pub struct StorefrontCatalog<S> {
    storefront: S,
    max_pages: u32,
}

impl<S: Storefront> StorefrontCatalog<S> {
    pub fn new(storefront: S, max_pages: u32) -> Self {
        Self {
            storefront,
            max_pages,
        }
    }

    pub fn into_inner(self) -> S {
        self.storefront
    }
}

impl<S: Storefront + Sync> CatalogSource for StorefrontCatalog<S> {
    async fn fetch_catalog(&self, platform: Platform) -> Result<Vec<ProductRecord>, CatalogError> {
        if platform != self.storefront.platform() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for page in 1..=self.max_pages {
            let listing = self.storefront.fetch_catalog_page(page).await?;
            records.extend(listing.products);
            if !listing.has_next {
                break;
            }
        }

        tracing::debug!(%platform, records = records.len(), "Read storefront catalog");
        Ok(records)
    }

    async fn health_check(&self) -> Result<(), CatalogError> {
        self.storefront.fetch_catalog_page(1).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "storefront"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory storefront serving fixed pages of two products each.
    struct FakeStorefront {
        products: Vec<ProductRecord>,
        logged_in: bool,
    }

    impl FakeStorefront {
        fn new(count: usize) -> Self {
            let products = (0..count)
                .map(|i| ProductRecord::new(Platform::Dlsite, format!("RJ{i}"), format!("作品{i}")))
                .collect();
            Self {
                products,
                logged_in: false,
            }
        }
    }

    impl Storefront for FakeStorefront {
        fn platform(&self) -> Platform {
            Platform::Dlsite
        }

        async fn authenticate(&mut self, credentials: &Credentials) -> Result<(), CatalogError> {
            if credentials.password.is_empty() {
                return Err(CatalogError::Authentication("empty password".to_string()));
            }
            self.logged_in = true;
            Ok(())
        }

        async fn fetch_catalog_page(&self, page: u32) -> Result<CatalogPage, CatalogError> {
            if !self.logged_in {
                return Err(CatalogError::Unavailable);
            }
            let start = (page as usize - 1) * 2;
            let products: Vec<_> = self.products.iter().skip(start).take(2).cloned().collect();
            Ok(CatalogPage {
                has_next: start + 2 < self.products.len(),
                products,
            })
        }

        async fn fetch_product_detail(&self, platform_id: &str) -> Result<ProductRecord, CatalogError> {
            self.products
                .iter()
                .find(|p| p.platform_id == platform_id)
                .cloned()
                .ok_or_else(|| CatalogError::RequestFailed(format!("no product {platform_id}")))
        }
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            username: "user".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_reads_all_pages() {
        let mut storefront = FakeStorefront::new(5);
        storefront.authenticate(&credentials("secret")).await.unwrap();

        let source = StorefrontCatalog::new(storefront, 10);
        assert!(source.health_check().await.is_ok());
        let records = source.fetch_catalog(Platform::Dlsite).await.unwrap();
        assert_eq!(records.len(), 5);
        assert!(source.fetch_catalog(Platform::Dmm).await.unwrap().is_empty());

        let detail = source.into_inner().fetch_product_detail("RJ3").await.unwrap();
        assert_eq!(detail.title, "作品3");
    }

    #[tokio::test]
    async fn test_page_limit() {
        let mut storefront = FakeStorefront::new(10);
        storefront.authenticate(&credentials("secret")).await.unwrap();
        let source = StorefrontCatalog::new(storefront, 2);
        assert_eq!(source.fetch_catalog(Platform::Dlsite).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_authentication_required() {
        let mut storefront = FakeStorefront::new(3);
        assert!(storefront.authenticate(&credentials("")).await.is_err());
        let source = StorefrontCatalog::new(storefront, 10);
        assert!(matches!(
            source.fetch_catalog(Platform::Dlsite).await,
            Err(CatalogError::Unavailable)
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let debug = format!("{:?}", credentials("hunter2"));
        assert!(!debug.contains("hunter2"));
    }
}
