//! Product Service - one method per controller operation

use std::sync::Arc;
use tracing::instrument;

use crate::error::ProductResult;
use crate::models::{NewProduct, Product, ProductId, ProductPatch};
use crate::repository::ProductRepository;

/// Product operations over a [`ProductRepository`].
///
/// Lookups return `Option`/`Vec` and leave the not-found decision to the
/// caller. The mutating steps (`save`, `remove`) only run once the target
/// has been fetched.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> ProductResult<Vec<Product>> {
        self.repository.find_all().await
    }

    #[instrument(skip(self))]
    pub async fn get_by_sku(&self, sku: &str) -> ProductResult<Option<Product>> {
        self.repository.find_by_sku(sku).await
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> ProductResult<Vec<String>> {
        self.repository.distinct_categories().await
    }

    #[instrument(skip(self))]
    pub async fn list_by_category(&self, category: &str) -> ProductResult<Vec<Product>> {
        self.repository.find_by_category(category).await
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: NewProduct) -> ProductResult<Product> {
        self.repository.create(input).await
    }

    /// Fetch by id, deep-merge `patch`, persist.
    ///
    /// `Ok(None)` when no product has this id; nothing is saved then.
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> ProductResult<Option<Product>> {
        let Some(existing) = self.repository.find_by_id(id).await? else {
            return Ok(None);
        };

        let merged = existing.merge(&patch)?;
        self.repository.save(merged).await.map(Some)
    }

    /// `Ok(false)` when no product has this id; nothing is removed then.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> ProductResult<bool> {
        let Some(existing) = self.repository.find_by_id(id).await? else {
            return Ok(false);
        };

        self.repository.remove(existing).await?;
        Ok(true)
    }

    pub async fn health_check(&self) -> ProductResult<()> {
        self.repository.health_check().await
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
