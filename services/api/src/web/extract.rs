//! services/api/src/web/extract.rs
//!
//! Request extractors whose rejections render as `ApiError` JSON bodies
//! instead of axum's plain-text defaults.

use crate::error::ApiError;
use axum::extract::{FromRequest, FromRequestParts};

/// `axum::Json`, rejecting malformed or incomplete bodies with 400 `{error}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path`, rejecting unparseable ids with 400 `{error}`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParams<T>(pub T);
