//! Extractors whose rejections become [`AppError`] responses.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use service_core::error::AppError;

/// `axum::Json` with a 400 `AppError` rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` with a 400 `AppError` rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Student id for lookups by id.
///
/// A segment that is not a valid id can never match a stored record, so it
/// is rejected as 404 rather than 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentId(pub u64);

#[async_trait]
impl<S> FromRequestParts<S> for StudentId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AppPath(raw) = AppPath::<String>::from_request_parts(parts, state).await?;

        raw.parse().map(StudentId).map_err(|_| {
            AppError::NotFound(anyhow::anyhow!("Student {} not found", raw))
        })
    }
}

