//! Conversion of errors into responses.
//!
//! Every failure that happens before a response is committed ends up in one
//! [`ErrorHandler`]. It is the only place an error becomes a wire response.

use hermes_core::{HermesError, RequestContext};
use http::StatusCode;
use tracing::{error, warn};

use crate::response::{full, json_response, HttpResponse};

/// Turns errors into HTTP responses.
///
/// # Example
///
/// ```
/// use hermes_core::{HermesError, RequestContext};
/// use hermes_server::{full, ErrorHandler, HttpResponse};
/// use http::{Response, StatusCode};
///
/// struct PlainText;
///
/// impl ErrorHandler for PlainText {
///     fn handle(&self, _ctx: &RequestContext, error: HermesError) -> HttpResponse {
///         let mut response = Response::new(full(error.to_envelope().message));
///         *response.status_mut() = error.status_code();
///         response
///     }
/// }
/// ```
pub trait ErrorHandler: Send + Sync + 'static {
    /// Builds the response for `error`.
    fn handle(&self, ctx: &RequestContext, error: HermesError) -> HttpResponse;
}

/// Renders errors as a JSON [`ErrorEnvelope`](hermes_core::ErrorEnvelope).
///
/// Server-side errors are logged with their full chain and rendered with a
/// generic message. Client errors are logged at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, ctx: &RequestContext, error: HermesError) -> HttpResponse {
        let status = error.status_code();
        if error.is_server_error() {
            error!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = ctx.path(),
                error = ?error,
                "request failed"
            );
        } else {
            warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = ctx.path(),
                status = status.as_u16(),
                error = %error,
                "request rejected"
            );
        }

        json_response(status, &error.to_envelope()).unwrap_or_else(|_| {
            let mut response = http::Response::new(full(
                r#"{"code":"INTERNAL_ERROR","message":"An internal error occurred"}"#,
            ));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{ApiError, ExtractionError, FieldErrors, SourceKind, ValidationError};
    use http_body_util::BodyExt;

    async fn render(error: HermesError) -> (StatusCode, serde_json::Value) {
        let response = DefaultErrorHandler.handle(&RequestContext::mock(), error);
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_business_error() {
        let error = ApiError::new(StatusCode::NOT_FOUND, "Post not found")
            .with_code("POST_NOT_FOUND")
            .with_detail("id", "42");

        let (status, body) = render(error.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            serde_json::json!({
                "code": "POST_NOT_FOUND",
                "message": "Post not found",
                "details": {"id": "42"}
            })
        );
    }

    #[tokio::test]
    async fn test_validation_error() {
        let mut fields = FieldErrors::new();
        fields.add("title", "failed required validation");

        let (status, body) = render(ValidationError::new(fields).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["validation_errors"]["title"][0],
            "failed required validation"
        );
    }

    #[tokio::test]
    async fn test_extraction_error() {
        let error = ExtractionError::missing(SourceKind::Path, "id");
        let (status, body) = render(error.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_PARAMETER");
        assert_eq!(body["details"]["field"], "id");
    }

    #[tokio::test]
    async fn test_dependency_not_found() {
        let (status, body) = render(HermesError::dependency_not_found("auth")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DEPENDENCY_NOT_FOUND");
        assert!(!body.to_string().contains("auth"));
    }

    #[tokio::test]
    async fn test_internal_error_is_generic() {
        let (status, body) = render(HermesError::internal("db password wrong")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
    }
}
