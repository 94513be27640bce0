//! Terminal state of a resource handler.
//!
//! A handler computes one [`Outcome`] and returns it; the status line and body
//! are written in a single place by its [`IntoResponse`] impl. Failures travel
//! separately as the handler's error type.
//!
//! ```ignore
//! async fn show(Path(sku): Path<String>) -> ProductResult<Outcome<Product>> {
//!     Ok(Outcome::found(service.get_by_sku(&sku).await?))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// 200 with JSON body
    Ok(T),
    /// 201 with JSON body
    Created(T),
    /// 204, empty body
    NoContent,
    /// 404, empty body
    NotFound,
}

impl<T> Outcome<T> {
    /// `Ok` for a present value, `NotFound` for absence.
    pub fn found(value: Option<T>) -> Self {
        value.map_or(Outcome::NotFound, Outcome::Ok)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Ok(_) => StatusCode::OK,
            Outcome::Created(_) => StatusCode::CREATED,
            Outcome::NoContent => StatusCode::NO_CONTENT,
            Outcome::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl<T> Outcome<Vec<T>> {
    /// `Ok` for a non-empty set, `NotFound` for an empty one.
    pub fn found_any(values: Vec<T>) -> Self {
        if values.is_empty() {
            Outcome::NotFound
        } else {
            Outcome::Ok(values)
        }
    }
}

impl Outcome<()> {
    /// `NoContent` when the target existed, `NotFound` otherwise.
    pub fn removed(existed: bool) -> Self {
        if existed {
            Outcome::NoContent
        } else {
            Outcome::NotFound
        }
    }
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Outcome::Ok(value) | Outcome::Created(value) => (status, Json(value)).into_response(),
            Outcome::NoContent | Outcome::NotFound => status.into_response(),
        }
    }
}
