//! Response body types and builders.

use bytes::Bytes;
use hermes_core::{HermesError, HermesResult};
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use serde::Serialize;
use std::convert::Infallible;

/// Type alias for HTTP response body.
pub type ResponseBody = BoxBody<Bytes, Infallible>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// Wraps bytes in a response body.
pub fn full(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into()).boxed()
}

/// Serializes `value` as a JSON response.
///
/// # Errors
///
/// Returns an internal error if `value` cannot be serialized.
pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
) -> HermesResult<HttpResponse> {
    let body = serde_json::to_vec(value)
        .map_err(|e| HermesError::internal_with_source("failed to serialize response", e))?;

    let mut response = Response::new(full(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_response() {
        let response = json_response(StatusCode::CREATED, &serde_json::json!({"id": 1})).unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, r#"{"id":1}"#);
    }

    #[test]
    fn test_unserializable_value_is_internal() {
        use std::collections::HashMap;

        // Non-string map keys cannot be written as JSON.
        let mut map = HashMap::new();
        map.insert((1, 2), "x");
        let err = json_response(StatusCode::OK, &map).unwrap_err();
        assert!(err.is_server_error());
    }
}
