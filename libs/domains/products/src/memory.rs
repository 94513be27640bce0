//! In-process ProductRepository for local development and tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{NewProduct, Product, ProductId};
use crate::repository::ProductRepository;

/// Products keyed by id, so listings come back in creation order for
/// generated ids.
///
/// SKU uniqueness is enforced the way the Mongo unique index does it: a
/// conflicting write fails as a store error.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing products, keeping their ids.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|product| (product.id.clone(), product))
            .collect();
        Self {
            products: RwLock::new(products),
        }
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

fn ensure_sku_free(
    products: &BTreeMap<ProductId, Product>,
    sku: Option<&str>,
    owner: &ProductId,
) -> ProductResult<()> {
    let Some(sku) = sku else {
        return Ok(());
    };
    let taken = products
        .values()
        .any(|other| other.id != *owner && other.sku.as_deref() == Some(sku));
    if taken {
        return Err(ProductError::Database(format!(
            "E11000 duplicate key error dup key: {{ sku: \"{sku}\" }}"
        )));
    }
    Ok(())
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_all(&self) -> ProductResult<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn find_by_sku(&self, sku: &str) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .find(|p| p.sku.as_deref() == Some(sku))
            .cloned())
    }

    async fn find_by_category(&self, category: &str) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| p.category.as_deref() == Some(category))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &ProductId) -> ProductResult<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn distinct_categories(&self) -> ProductResult<Vec<String>> {
        let products = self.products.read().await;
        let categories: BTreeSet<&str> = products
            .values()
            .filter_map(|p| p.category.as_deref())
            .collect();
        Ok(categories.into_iter().map(str::to_string).collect())
    }

    #[instrument(skip(self, input), fields(sku = ?input.sku))]
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let product = Product::new(input);
        let mut products = self.products.write().await;
        ensure_sku_free(&products, product.sku.as_deref(), &product.id)?;
        products.insert(product.id.clone(), product.clone());

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn save(&self, product: Product) -> ProductResult<Product> {
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Err(ProductError::Database(format!(
                "No document found for query {{ _id: \"{}\" }}",
                product.id
            )));
        }
        ensure_sku_free(&products, product.sku.as_deref(), &product.id)?;
        products.insert(product.id.clone(), product.clone());

        tracing::info!(product_id = %product.id, "Product updated successfully");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn remove(&self, product: Product) -> ProductResult<()> {
        self.products.write().await.remove(&product.id);
        tracing::info!(product_id = %product.id, "Product deleted");
        Ok(())
    }

    async fn health_check(&self) -> ProductResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    fn new_product(value: Value) -> NewProduct {
        match value {
            Value::Object(map) => NewProduct::try_from(map).unwrap(),
            _ => NewProduct::try_from(Map::new()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_then_lookup() {
        let repo = InMemoryProductRepository::new();
        let created = repo
            .create(new_product(json!({ "sku": "X1", "category": "tools" })))
            .await
            .unwrap();

        assert_eq!(repo.len().await, 1);
        assert_eq!(repo.find_by_sku("X1").await.unwrap(), Some(created.clone()));
        assert_eq!(repo.find_by_id(&created.id).await.unwrap(), Some(created));
        assert!(repo.find_by_sku("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_distinct_categories_are_unique() {
        let repo = InMemoryProductRepository::new();
        for (sku, category) in [("A", "tools"), ("B", "garden"), ("C", "tools")] {
            repo.create(new_product(json!({ "sku": sku, "category": category })))
                .await
                .unwrap();
        }
        repo.create(new_product(json!({ "sku": "D" }))).await.unwrap();

        assert_eq!(
            repo.distinct_categories().await.unwrap(),
            vec!["garden", "tools"]
        );
        assert_eq!(repo.find_by_category("tools").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_store_error() {
        let repo = InMemoryProductRepository::new();
        repo.create(new_product(json!({ "sku": "X1" }))).await.unwrap();

        let err = repo
            .create(new_product(json!({ "sku": "X1" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::Database(ref msg) if msg.contains("duplicate key")));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_products_without_sku_do_not_conflict() {
        let repo = InMemoryProductRepository::new();
        repo.create(new_product(json!({}))).await.unwrap();
        repo.create(new_product(json!({}))).await.unwrap();
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_save_of_missing_product_fails() {
        let repo = InMemoryProductRepository::new();
        let orphan = Product::new(new_product(json!({ "sku": "X1" })));
        assert!(matches!(
            repo.save(orphan).await,
            Err(ProductError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_remove() {
        let repo = InMemoryProductRepository::new();
        let created = repo.create(new_product(json!({ "sku": "X1" }))).await.unwrap();
        repo.remove(created).await.unwrap();
        assert!(repo.is_empty().await);
    }
}
