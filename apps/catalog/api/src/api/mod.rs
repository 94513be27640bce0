use axum::{Router, routing::get};
use axum_helpers::server::{create_router, health_router};
use core_config::AppInfo;
use domain_products::{ProductRepository, ProductService};
use std::io;

pub mod health;

/// API routes without the `/api` prefix; `create_router` adds it.
pub fn routes<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    Router::new().nest("/products", domain_products::handlers::router(service))
}

/// `/ready` probing the product store.
pub fn ready_router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler::<R>))
        .with_state(service)
}

/// Full application: API under `/api`, docs, fallback, `/health` and `/ready`.
pub fn app<R: ProductRepository + 'static>(
    service: ProductService<R>,
    app_info: AppInfo,
    cors_allowed_origin: Option<&str>,
) -> io::Result<Router> {
    let cors = axum_helpers::cors_from_origins(cors_allowed_origin)?;
    let router = create_router::<crate::openapi::ApiDoc>(routes(service.clone()), cors);

    Ok(router
        .merge(health_router(app_info))
        .merge(ready_router(service)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use domain_products::{
        InMemoryProductRepository, NewProduct, Product, ProductError, ProductId, ProductResult,
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const APP_INFO: AppInfo = AppInfo {
        name: "catalog_api",
        version: "0.1.0",
    };

    /// Every call fails the way an unreachable server does.
    struct UnreachableStore;

    fn unreachable<T>() -> ProductResult<T> {
        Err(ProductError::Database(
            "Server selection timeout: No available servers".into(),
        ))
    }

    #[async_trait]
    impl ProductRepository for UnreachableStore {
        async fn find_all(&self) -> ProductResult<Vec<Product>> {
            unreachable()
        }
        async fn find_by_sku(&self, _sku: &str) -> ProductResult<Option<Product>> {
            unreachable()
        }
        async fn find_by_category(&self, _category: &str) -> ProductResult<Vec<Product>> {
            unreachable()
        }
        async fn find_by_id(&self, _id: &ProductId) -> ProductResult<Option<Product>> {
            unreachable()
        }
        async fn distinct_categories(&self) -> ProductResult<Vec<String>> {
            unreachable()
        }
        async fn create(&self, _input: NewProduct) -> ProductResult<Product> {
            unreachable()
        }
        async fn save(&self, _product: Product) -> ProductResult<Product> {
            unreachable()
        }
        async fn remove(&self, _product: Product) -> ProductResult<()> {
            unreachable()
        }
        async fn health_check(&self) -> ProductResult<()> {
            unreachable()
        }
    }

    fn memory_app() -> Router {
        app(
            ProductService::new(InMemoryProductRepository::new()),
            APP_INFO,
            None,
        )
        .unwrap()
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_products_are_served_under_api_prefix() {
        let app = memory_app();

        let created = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/products",
                Some(json!({ "sku": "X1", "category": "tools" })),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let shown = app
            .clone()
            .oneshot(request("GET", "/api/products/X1", None))
            .await
            .unwrap();
        assert_eq!(shown.status(), StatusCode::OK);
        assert_eq!(json_body(shown).await["category"], "tools");

        let categories = app
            .oneshot(request("GET", "/api/products/categories", None))
            .await
            .unwrap();
        assert_eq!(json_body(categories).await, json!(["tools"]));
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let response = memory_app()
            .oneshot(request("GET", "/api/orders", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_health_reports_app_info() {
        let response = memory_app()
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["name"], "catalog_api");
    }

    #[tokio::test]
    async fn test_ready_with_reachable_store() {
        let response = memory_app()
            .oneshot(request("GET", "/ready", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["database"], "connected");
    }

    #[tokio::test]
    async fn test_unreachable_store() {
        let app = app(ProductService::new(UnreachableStore), APP_INFO, None).unwrap();

        let ready = app
            .clone()
            .oneshot(request("GET", "/ready", None))
            .await
            .unwrap();
        assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(ready).await["database"], "disconnected");

        let listing = app
            .oneshot(request("GET", "/api/products", None))
            .await
            .unwrap();
        assert_eq!(listing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(listing).await["message"],
            "Server selection timeout: No available servers"
        );
    }

    #[tokio::test]
    async fn test_openapi_nests_product_paths() {
        let response = memory_app()
            .oneshot(request("GET", "/api-docs/openapi.json", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"].get("/products/categories").is_some());
        let slot = &doc["paths"]["/products/{key}"];
        assert!(slot.get("get").is_some());
        assert!(slot.get("put").is_some());
        assert!(slot.get("delete").is_some());
    }

    #[test]
    fn test_invalid_cors_origin_fails_startup() {
        let service = ProductService::new(InMemoryProductRepository::new());
        assert!(app(service, APP_INFO, Some(" , ")).is_err());
    }
}
