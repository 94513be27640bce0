//! Readiness backed by the product store.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use domain_products::{ProductRepository, ProductService};

/// 200 when the product store answers, 503 otherwise.
pub async fn ready_handler<R: ProductRepository>(
    State(service): State<ProductService<R>>,
) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![(
        "database",
        Box::pin(async {
            service
                .health_check()
                .await
                .map_err(|e| format!("Store ping failed: {}", e))
        }),
    )];

    run_health_checks(checks).await.into_response()
}
