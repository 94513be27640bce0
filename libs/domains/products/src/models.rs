use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};

/// Fields a client can never set. They are dropped from create and update
/// bodies before anything else looks at them.
pub const SERVER_MANAGED_FIELDS: [&str; 4] = ["_id", "id", "created_at", "updated_at"];

/// Stable product identifier, stored as the Mongo `_id`.
///
/// New products get a UUIDv7 string, so ids sort by creation time. Any
/// string is accepted when reading from the store or a path, and an
/// `ObjectId` read from older documents becomes its hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "0192f0c1-7a3e-7c2b-9d1e-3f6a5b4c2d10")]
pub struct ProductId(String);

impl ProductId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StoredId {
            Text(String),
            Object(ObjectId),
        }

        Ok(match StoredId::deserialize(deserializer)? {
            StoredId::Text(value) => Self(value),
            StoredId::Object(oid) => Self(oid.to_hex()),
        })
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Product entity as stored in MongoDB.
///
/// Only `sku` and `category` are known to the service; every other catalog
/// field is kept verbatim in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "_id": "0192f0c1-7a3e-7c2b-9d1e-3f6a5b4c2d10",
    "sku": "X1",
    "category": "tools",
    "name": "Claw hammer",
    "price": 1299,
    "created_at": "2026-01-05T10:00:00Z",
    "updated_at": "2026-01-05T10:00:00Z"
}))]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    /// Catalog code, unique when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Any other catalog fields
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
    /// Unix epoch when the stored document has none
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Body of a create request, with server-managed fields removed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[schema(example = json!({ "sku": "X1", "category": "tools", "name": "Claw hammer" }))]
pub struct NewProduct {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for NewProduct {
    type Error = ProductError;

    fn try_from(mut body: Map<String, Value>) -> ProductResult<Self> {
        strip_server_managed(&mut body);
        serde_json::from_value(Value::Object(body))
            .map_err(|e| ProductError::InvalidPayload(e.to_string()))
    }
}

/// Partial document deep-merged onto an existing product.
#[derive(Debug, Clone, Default, PartialEq, ToSchema)]
#[schema(value_type = Object, example = json!({ "price": 10, "dimensions": { "width": 4 } }))]
pub struct ProductPatch(Map<String, Value>);

impl ProductPatch {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ProductPatch {
    fn from(mut body: Map<String, Value>) -> Self {
        strip_server_managed(&mut body);
        Self(body)
    }
}

impl Product {
    pub fn new(input: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            sku: input.sku,
            category: input.category,
            attributes: input.attributes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overlay `patch` onto this product and bump `updated_at`.
    ///
    /// Identity and `created_at` are untouched. Fails with
    /// [`ProductError::InvalidPayload`] when the result is no longer a product,
    /// e.g. `sku` became a number.
    pub fn merge(self, patch: &ProductPatch) -> ProductResult<Product> {
        let id = self.id.clone();
        let created_at = self.created_at;

        let mut document = serde_json::to_value(&self)
            .map_err(|e| ProductError::Internal(format!("Failed to serialize product: {e}")))?;
        deep_merge(&mut document, patch.fields());

        let mut merged: Product = serde_json::from_value(document)
            .map_err(|e| ProductError::InvalidPayload(e.to_string()))?;
        merged.id = id;
        merged.created_at = created_at;
        merged.updated_at = Utc::now();
        Ok(merged)
    }
}

/// Remove every [`SERVER_MANAGED_FIELDS`] key from a request body.
pub fn strip_server_managed(body: &mut Map<String, Value>) {
    for field in SERVER_MANAGED_FIELDS {
        body.remove(field);
    }
}

/// Recursive overlay of `patch` onto `target`.
///
/// Objects on both sides merge key by key; anything else in the patch
/// (arrays, scalars, `null`) replaces the target value.
pub fn deep_merge(target: &mut Value, patch: &Map<String, Value>) {
    let Value::Object(target) = target else {
        *target = Value::Object(patch.clone());
        return;
    };

    for (key, incoming) in patch {
        match (target.get_mut(key), incoming) {
            (Some(existing @ Value::Object(_)), Value::Object(nested)) => {
                deep_merge(existing, nested);
            }
            _ => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}
