//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Bson, Document, doc, oid::ObjectId},
    options::IndexOptions,
};
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{NewProduct, Product, ProductId};
use crate::repository::ProductRepository;

pub const DEFAULT_COLLECTION: &str = "products";

pub struct MongoProductRepository {
    database: Database,
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, DEFAULT_COLLECTION)
    }

    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            database: db.clone(),
            collection: db.collection::<Product>(collection_name),
        }
    }

    /// Unique sparse index on `sku` and a lookup index on `category`.
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "sku": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .sparse(true)
                        .name("idx_sku_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "category": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!(
            collection = self.collection.name(),
            "Product indexes created successfully"
        );
        Ok(())
    }

    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// A hex id may be stored as a string or as an `ObjectId`; match either.
    fn id_filter(id: &ProductId) -> Document {
        match ObjectId::parse_str(id.as_str()) {
            Ok(oid) => doc! { "_id": { "$in": [id.as_str(), oid] } },
            Err(_) => doc! { "_id": id.as_str() },
        }
    }

    /// Replacement body for `save`. `_id` is left out so the stored value,
    /// string or `ObjectId`, is kept.
    fn replacement(product: &Product) -> ProductResult<Document> {
        let mut document = bson::to_document(product)
            .map_err(|e| ProductError::Internal(format!("Failed to encode product: {e}")))?;
        document.remove("_id");
        Ok(document)
    }
}

/// Keep string values from a `distinct` result.
fn string_values(values: Vec<Bson>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Bson::String(s) => Some(s),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> ProductResult<Vec<Product>> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn find_by_sku(&self, sku: &str) -> ProductResult<Option<Product>> {
        Ok(self.collection.find_one(doc! { "sku": sku }).await?)
    }

    #[instrument(skip(self))]
    async fn find_by_category(&self, category: &str) -> ProductResult<Vec<Product>> {
        let cursor = self.collection.find(doc! { "category": category }).await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn find_by_id(&self, id: &ProductId) -> ProductResult<Option<Product>> {
        Ok(self.collection.find_one(Self::id_filter(id)).await?)
    }

    #[instrument(skip(self))]
    async fn distinct_categories(&self) -> ProductResult<Vec<String>> {
        let values = self.collection.distinct("category", doc! {}).await?;
        Ok(string_values(values))
    }

    #[instrument(skip(self, input), fields(sku = ?input.sku))]
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let product = Product::new(input);

        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn save(&self, product: Product) -> ProductResult<Product> {
        let result = self
            .collection
            .clone_with_type::<Document>()
            .replace_one(Self::id_filter(&product.id), Self::replacement(&product)?)
            .await?;

        if result.matched_count == 0 {
            return Err(ProductError::Database(format!(
                "No document found for query {{ _id: \"{}\" }}",
                product.id
            )));
        }

        tracing::info!(product_id = %product.id, "Product updated successfully");
        Ok(product)
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn remove(&self, product: Product) -> ProductResult<()> {
        let result = self
            .collection
            .delete_one(Self::id_filter(&product.id))
            .await?;

        tracing::info!(
            product_id = %product.id,
            deleted = result.deleted_count,
            "Product deleted"
        );
        Ok(())
    }

    async fn health_check(&self) -> ProductResult<()> {
        let status = database::mongodb::check_health_detailed(&self.database).await;
        tracing::debug!(
            healthy = status.healthy,
            response_time_ms = status.response_time_ms,
            "MongoDB ping"
        );
        if status.healthy {
            Ok(())
        } else {
            Err(ProductError::Database(
                status.message.unwrap_or_else(|| "ping failed".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductPatch;
    use serde_json::{Map, Value, json};

    #[test]
    fn test_id_filter_uses_string_id() {
        let filter = MongoProductRepository::id_filter(&ProductId::from("42"));
        assert_eq!(filter.get_str("_id").unwrap(), "42");
    }

    #[test]
    fn test_id_filter_matches_hex_id_in_both_forms() {
        let oid = ObjectId::new();
        let filter = MongoProductRepository::id_filter(&ProductId::from(oid.to_hex()));

        let candidates = filter
            .get_document("_id")
            .unwrap()
            .get_array("$in")
            .unwrap();
        assert_eq!(
            candidates,
            &vec![Bson::String(oid.to_hex()), Bson::ObjectId(oid)]
        );
    }

    #[test]
    fn test_replacement_leaves_out_id() {
        let product = Product::new(NewProduct::try_from(object(json!({ "sku": "X1" }))).unwrap());
        let document = MongoProductRepository::replacement(&product).unwrap();

        assert!(!document.contains_key("_id"));
        assert_eq!(document.get_str("sku").unwrap(), "X1");
        assert!(document.contains_key("created_at"));
    }

    #[test]
    fn test_string_values_drops_non_strings() {
        let values = vec![
            Bson::String("tools".into()),
            Bson::Null,
            Bson::Int32(3),
            Bson::String("garden".into()),
        ];
        assert_eq!(string_values(values), vec!["tools", "garden"]);
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Needs a server at `MONGODB_URL` (default `mongodb://localhost:27017`).
    #[tokio::test]
    #[ignore]
    async fn test_crud_against_live_server() {
        let url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = mongodb::Client::with_uri_str(&url).await.unwrap();
        let db = client.database("catalog_test");
        let collection = format!("products_{}", ProductId::generate());
        let repo = MongoProductRepository::with_collection(&db, &collection);
        repo.init_indexes().await.unwrap();
        repo.health_check().await.unwrap();

        let input = NewProduct::try_from(object(json!({
            "sku": "X1",
            "category": "tools",
            "dimensions": { "width": 1 }
        })))
        .unwrap();
        let created = repo.create(input).await.unwrap();

        let found = repo.find_by_sku("X1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(repo.distinct_categories().await.unwrap(), vec!["tools"]);

        let patch = ProductPatch::from(object(json!({ "dimensions": { "height": 2 } })));
        let saved = repo.save(found.merge(&patch).unwrap()).await.unwrap();
        let reread = repo.find_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(reread.attributes["dimensions"], json!({ "width": 1, "height": 2 }));

        let duplicate = NewProduct::try_from(object(json!({ "sku": "X1" }))).unwrap();
        assert!(matches!(
            repo.create(duplicate).await,
            Err(ProductError::Database(_))
        ));

        repo.remove(reread).await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());

        // Documents written by earlier tooling carry an ObjectId and no timestamps
        let oid = ObjectId::new();
        repo.collection()
            .clone_with_type::<Document>()
            .insert_one(doc! { "_id": oid, "sku": "L1", "category": "tools" })
            .await
            .unwrap();
        assert_eq!(repo.find_all().await.unwrap().len(), 1);

        let legacy = repo
            .find_by_id(&ProductId::from(oid.to_hex()))
            .await
            .unwrap()
            .unwrap();
        let patch = ProductPatch::from(object(json!({ "price": 4 })));
        repo.save(legacy.merge(&patch).unwrap()).await.unwrap();
        let stored = repo
            .collection()
            .clone_with_type::<Document>()
            .find_one(doc! { "_id": oid })
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            stored.get("price"),
            Some(Bson::Int32(4) | Bson::Int64(4))
        ));

        let legacy = repo.find_by_sku("L1").await.unwrap().unwrap();
        repo.remove(legacy).await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());

        repo.collection().drop().await.unwrap();
    }
}
