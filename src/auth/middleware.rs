//! Authentication middleware for Axum

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::TokenAuthFilter;
use crate::api::ApiError;
use crate::error::CoreError;

/// Resolves the request's principal and stores the resulting
/// [`RequestContext`](super::RequestContext) in the request extensions.
///
/// Install with `axum::middleware::from_fn_with_state(filter, auth_middleware)`.
/// Requests that fail authentication never reach the inner service.
pub async fn auth_middleware(
    State(filter): State<Arc<TokenAuthFilter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = match request.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(value) => Some(value.to_owned()),
            Err(_) => {
                return ApiError::from(CoreError::bad_request(
                    "Authorization header contains invalid characters",
                ))
                .into_response()
            }
        },
    };

    match filter.authenticate(header.as_deref()).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
