//! Request extractors

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body whose rejections surface as [`AppError::BadRequest`]
///
/// Missing bodies, a missing `Content-Type` and absent fields all land here
/// instead of axum's plain-text 415/422 responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
