//! HTTP handlers for the Products API
//!
//! Every handler runs the same pipeline: fetch, not-found check, transform,
//! respond. The terminal state is an [`Outcome`]; a [`ProductError`] from any
//! step becomes the error response.
//!
//! [`ProductError`]: crate::error::ProductError

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use axum_helpers::{
    JsonBody, Outcome,
    errors::responses::{BadRequestResponse, EmptyNotFoundResponse, InternalServerErrorResponse},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{NewProduct, Product, ProductId, ProductPatch};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for the Products API
#[derive(OpenApi)]
#[openapi(
    paths(index, categories, category, show, create, update, destroy),
    components(
        schemas(Product, ProductId, NewProduct, ProductPatch),
        responses(BadRequestResponse, EmptyNotFoundResponse, InternalServerErrorResponse)
    ),
    tags(
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Products router, mounted by the app under `/products`.
///
/// `show`, `update` and `destroy` share the `/{key}` slot: `GET` reads the
/// key as a SKU, `PUT`/`DELETE` read it as an id. The literal `categories`
/// segment takes precedence over the capture.
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(index).post(create))
        .route("/categories", get(categories))
        .route("/category/{name}", get(category))
        .route("/{key}", get(show).put(update).delete(destroy))
        .with_state(shared_service)
}

/// List every product
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn index<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<Outcome<Vec<Product>>> {
    Ok(Outcome::Ok(service.list_products().await?))
}

/// Distinct category values
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Products",
    responses(
        (status = 200, description = "Each category once", body = Vec<String>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn categories<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> ProductResult<Outcome<Vec<String>>> {
    Ok(Outcome::Ok(service.list_categories().await?))
}

/// Products in one category
#[utoipa::path(
    get,
    path = "/category/{name}",
    tag = "Products",
    params(
        ("name" = String, Path, description = "Category name")
    ),
    responses(
        (status = 200, description = "Products in the category", body = Vec<Product>),
        (status = 404, response = EmptyNotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn category<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(name): Path<String>,
) -> ProductResult<Outcome<Vec<Product>>> {
    Ok(Outcome::found_any(service.list_by_category(&name).await?))
}

/// Get a product by SKU
#[utoipa::path(
    get,
    path = "/{key}",
    tag = "Products",
    params(
        ("key" = String, Path, description = "Product SKU")
    ),
    responses(
        (status = 200, description = "Product found", body = Product),
        (status = 404, response = EmptyNotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn show<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(sku): Path<String>,
) -> ProductResult<Outcome<Product>> {
    Ok(Outcome::found(service.get_by_sku(&sku).await?))
}

/// Create a product
///
/// `_id`, `id`, `created_at` and `updated_at` in the body are ignored.
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ProductResult<Outcome<Product>> {
    let input = NewProduct::try_from(body)?;
    Ok(Outcome::Created(service.create_product(input).await?))
}

/// Deep-merge the body onto a product
///
/// Nested objects merge key by key; arrays and scalars replace.
/// Server-managed fields in the body are ignored.
#[utoipa::path(
    put,
    path = "/{key}",
    tag = "Products",
    params(
        ("key" = String, Path, description = "Product ID")
    ),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Updated product", body = Product),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = EmptyNotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ProductResult<Outcome<Product>> {
    let patch = ProductPatch::from(body);
    let updated = service.update_product(&ProductId::from(id), patch).await?;
    Ok(Outcome::found(updated))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/{key}",
    tag = "Products",
    params(
        ("key" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, response = EmptyNotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn destroy<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
) -> ProductResult<Outcome<()>> {
    let existed = service.delete_product(&ProductId::from(id)).await?;
    Ok(Outcome::removed(existed))
}
