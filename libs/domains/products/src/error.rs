use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

/// Failures of a product operation.
///
/// A missing product is not an error here; lookups return `Option` and
/// handlers turn absence into an empty 404.
#[derive(Debug, Error)]
pub enum ProductError {
    /// The store rejected the operation. The message is passed to the
    /// client as-is.
    #[error("{0}")]
    Database(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Database(msg) => AppError::Database(msg),
            ProductError::InvalidPayload(msg) => AppError::InvalidPayload(msg),
            ProductError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for ProductError {
    fn from(err: mongodb::error::Error) -> Self {
        ProductError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_database_error_keeps_raw_message() {
        let err = ProductError::Database("E11000 duplicate key error".into());
        assert_eq!(err.to_string(), "E11000 duplicate key error");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ProductError::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ProductError::InvalidPayload("x".into()), StatusCode::BAD_REQUEST),
            (ProductError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
