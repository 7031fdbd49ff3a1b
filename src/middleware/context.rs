use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::AppError;

/// HTTP header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// HTTP header carrying the authenticated viewer, set by the upstream gateway
pub const VIEWER_ID_HEADER: &str = "x-viewer-id";

/// Per-request identity stored in the request extensions
#[derive(Clone, Copy, Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// `None` for anonymous requests
    pub viewer_id: Option<Uuid>,
}

impl RequestContext {
    fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let request_id = header_str(headers, REQUEST_ID_HEADER)
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        let viewer_id = match header_str(headers, VIEWER_ID_HEADER) {
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
                AppError::InvalidInput(format!("Invalid {} header", VIEWER_ID_HEADER))
            })?),
            None => None,
        };

        Ok(Self {
            request_id,
            viewer_id,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Resolves the request ID and viewer, and echoes the request ID back
///
/// An incoming `x-request-id` UUID is reused, otherwise one is generated.
/// A malformed `x-viewer-id` is rejected with 400.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    let context = match RequestContext::from_headers(request.headers()) {
        Ok(context) => context,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&context.request_id.to_string()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Tracing span carrying the request ID and viewer
pub fn make_span_with_request_context(request: &Request<Body>) -> tracing::Span {
    let context = request.extensions().get::<RequestContext>();
    let request_id = context
        .map(|c| c.request_id.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let viewer_id = context
        .and_then(|c| c.viewer_id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
        viewer_id = %viewer_id,
    )
}

/// Optional viewer for handlers that personalize when they can
#[derive(Clone, Copy, Debug)]
pub struct Viewer(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<RequestContext>() {
            Some(context) => Ok(Viewer(context.viewer_id)),
            // Router built without the middleware
            None => RequestContext::from_headers(&parts.headers).map(|c| Viewer(c.viewer_id)),
        }
    }
}

/// Viewer for handlers that act on behalf of a user
#[derive(Clone, Copy, Debug)]
pub struct RequiredViewer(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for RequiredViewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Viewer(viewer_id) = Viewer::from_request_parts(parts, state).await?;
        viewer_id.map(RequiredViewer).ok_or_else(|| {
            AppError::Unauthorized(format!("Missing {} header", VIEWER_ID_HEADER))
        })
    }
}
