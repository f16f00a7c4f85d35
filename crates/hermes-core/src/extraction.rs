//! Extraction error types.
//!
//! An [`ExtractionError`] records which source a field was being read from,
//! which field it was, and what went wrong. It maps to a client error status.

use crate::schema::SourceKind;
use http::StatusCode;
use std::fmt;

/// Error that occurs while extracting a field from the request.
///
/// # Example
///
/// ```rust
/// use hermes_core::{ExtractionError, SourceKind};
/// use http::StatusCode;
///
/// let err = ExtractionError::missing(SourceKind::Path, "id");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.extraction_source(), SourceKind::Path);
/// assert!(err.to_string().contains("id"));
/// ```
#[derive(Debug)]
pub struct ExtractionError {
    extraction_source: SourceKind,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    /// Required value is missing
    Missing,
    /// Value has invalid type or format
    InvalidType,
    /// Body could not be decoded
    DeserializationFailed,
    /// Body is too large
    PayloadTooLarge,
}

impl ExtractionError {
    /// Creates an error for a missing value.
    #[must_use]
    pub fn missing(source: SourceKind, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            message: format!("missing {source} parameter: {field}"),
            field: Some(field),
        }
    }

    /// Creates an error for a value that does not convert to the field type.
    #[must_use]
    pub fn invalid_type(
        source: SourceKind,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::InvalidType,
            message: format!("invalid {source} parameter '{field}': {details}"),
            field: Some(field),
        }
    }

    /// Creates an error for a body that could not be decoded.
    #[must_use]
    pub fn deserialization_failed(field: impl Into<String>, error: impl Into<String>) -> Self {
        let field = field.into();
        let error = error.into();
        Self {
            extraction_source: SourceKind::Json,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to decode json field '{field}': {error}"),
            field: Some(field),
        }
    }

    /// Creates an error for a body over the configured limit.
    #[must_use]
    pub fn payload_too_large(max_size: usize) -> Self {
        Self {
            extraction_source: SourceKind::Json,
            kind: ExtractionErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {max_size} bytes"),
            field: None,
        }
    }

    /// Returns the extraction source.
    #[must_use]
    pub fn extraction_source(&self) -> SourceKind {
        self.extraction_source
    }

    /// Returns the field name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ExtractionErrorKind::Missing
            | ExtractionErrorKind::InvalidType
            | ExtractionErrorKind::DeserializationFailed => StatusCode::BAD_REQUEST,
            ExtractionErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::Missing => "MISSING_PARAMETER",
            ExtractionErrorKind::InvalidType => "INVALID_PARAMETER",
            ExtractionErrorKind::DeserializationFailed => "INVALID_BODY",
            ExtractionErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}
