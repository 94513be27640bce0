use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ProductResult;
use crate::models::{NewProduct, Product, ProductId};

/// Data access for products.
///
/// Every method is a single store query or mutation; absence is reported as
/// `None` or an empty `Vec`, never as an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products
    async fn find_all(&self) -> ProductResult<Vec<Product>>;

    /// The product with this SKU, if any
    async fn find_by_sku(&self, sku: &str) -> ProductResult<Option<Product>>;

    /// Products whose category equals `category`
    async fn find_by_category(&self, category: &str) -> ProductResult<Vec<Product>>;

    async fn find_by_id(&self, id: &ProductId) -> ProductResult<Option<Product>>;

    /// Each distinct category value exactly once
    async fn distinct_categories(&self) -> ProductResult<Vec<String>>;

    /// Persist a new product with a generated id and timestamps
    async fn create(&self, input: NewProduct) -> ProductResult<Product>;

    /// Replace the stored product that has `product.id`
    async fn save(&self, product: Product) -> ProductResult<Product>;

    /// Delete the stored product that has `product.id`
    async fn remove(&self, product: Product) -> ProductResult<()>;

    /// Cheap round trip proving the store is reachable
    async fn health_check(&self) -> ProductResult<()>;
}

/// Lets a caller keep a handle on a repository it hands to a service.
#[async_trait]
impl<T: ProductRepository + ?Sized> ProductRepository for Arc<T> {
    async fn find_all(&self) -> ProductResult<Vec<Product>> {
        (**self).find_all().await
    }

    async fn find_by_sku(&self, sku: &str) -> ProductResult<Option<Product>> {
        (**self).find_by_sku(sku).await
    }

    async fn find_by_category(&self, category: &str) -> ProductResult<Vec<Product>> {
        (**self).find_by_category(category).await
    }

    async fn find_by_id(&self, id: &ProductId) -> ProductResult<Option<Product>> {
        (**self).find_by_id(id).await
    }

    async fn distinct_categories(&self) -> ProductResult<Vec<String>> {
        (**self).distinct_categories().await
    }

    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        (**self).create(input).await
    }

    async fn save(&self, product: Product) -> ProductResult<Product> {
        (**self).save(product).await
    }

    async fn remove(&self, product: Product) -> ProductResult<()> {
        (**self).remove(product).await
    }

    async fn health_check(&self) -> ProductResult<()> {
        (**self).health_check().await
    }
}
