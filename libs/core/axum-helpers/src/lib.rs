//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! - **[`outcome`]**: the terminal states of a resource handler
//! - **[`errors`]**: structured error responses with error codes
//! - **[`extractors`]**: JSON body extractor with structured rejections
//! - **[`http`]**: CORS and security header middleware
//! - **[`server`]**: router assembly, health checks, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::{create_permissive_cors_layer, create_production_app, create_router};
//! use core_config::server::ServerConfig;
//! use std::time::Duration;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes, create_permissive_cors_layer());
//!     create_production_app(router, &ServerConfig::default(), Duration::from_secs(30), async {})
//!         .await
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod outcome;
pub mod server;

pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::JsonBody;
pub use http::{
    cors_from_origins, create_cors_layer, create_permissive_cors_layer, parse_origins,
    security_headers,
};
pub use outcome::Outcome;
pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};
