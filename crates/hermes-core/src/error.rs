//! Error types for Hermes.
//!
//! [`HermesError`] is the single error type that flows from extractors,
//! dependencies and handlers to the error handler. It distinguishes six kinds:
//!
//! | Kind | Status | Code |
//! |---|---|---|
//! | `Registration` | 500 | `INTERNAL_ERROR` |
//! | `Extraction` | 400 (mostly) | extraction code, e.g. `MISSING_PARAMETER` |
//! | `DependencyNotFound` | 500 | `DEPENDENCY_NOT_FOUND` |
//! | `Validation` | 400 | `VALIDATION_ERROR` |
//! | `Api` | caller supplied | caller supplied |
//! | `Internal` | 500 | `INTERNAL_ERROR` |
//!
//! Validation and API errors are never wrapped: whatever a dependency or a
//! handler returns reaches the error handler unchanged.

use crate::extraction::ExtractionError;
use crate::schema::SourceKind;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`HermesError`].
pub type HermesResult<T> = Result<T, HermesError>;

/// Generic message used for server-side failures exposed to clients.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Structural error found while registering a handler or dependency.
    Registration,
    /// A field could not be extracted from the request.
    Extraction,
    /// A referenced dependency is not registered.
    DependencyNotFound,
    /// The populated request failed validation.
    Validation,
    /// Error returned by business code.
    Api,
    /// Anything else.
    Internal,
}

/// Standard error type for Hermes.
///
/// # Example
///
/// ```
/// use hermes_core::{ApiError, ErrorCategory, HermesError};
/// use http::StatusCode;
///
/// fn find_post(id: i64) -> Result<(), HermesError> {
///     Err(ApiError::new(StatusCode::NOT_FOUND, "Post not found")
///         .with_code("POST_NOT_FOUND")
///         .with_detail("id", id.to_string())
///         .into())
/// }
///
/// let err = find_post(7).unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::Api);
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
pub enum HermesError {
    /// Structural error in a request schema or registration.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// Field extraction failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// A dependency name is not registered.
    #[error("dependency not found: {name}")]
    DependencyNotFound {
        /// The unknown dependency name.
        name: String,
    },

    /// Request validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Business error with caller-chosen status, code and message.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Internal server error.
    #[error("internal error: {message}")]
    Internal {
        /// Human-readable error message (logged, not exposed to clients).
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl HermesError {
    /// Creates a dependency-not-found error.
    #[must_use]
    pub fn dependency_not_found(name: impl Into<String>) -> Self {
        Self::DependencyNotFound { name: name.into() }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Registration(_) => ErrorCategory::Registration,
            Self::Extraction(_) => ErrorCategory::Extraction,
            Self::DependencyNotFound { .. } => ErrorCategory::DependencyNotFound,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Api(_) => ErrorCategory::Api,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Extraction(e) => e.status_code(),
            Self::Validation(e) => e.status,
            Self::Api(e) => e.status,
            Self::Registration(_) | Self::DependencyNotFound { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` if the error originates from a server-side problem and
    /// its details must not reach the client.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Registration(_) | Self::DependencyNotFound { .. } | Self::Internal { .. }
        )
    }

    /// Converts this error to a serializable envelope.
    ///
    /// Server-side errors are rendered with a generic message so internal
    /// details never leak.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Extraction(e) => ErrorEnvelope {
                code: Some(e.error_code().to_string()),
                message: e.to_string(),
                details: e
                    .field()
                    .map(|field| BTreeMap::from([("field".to_string(), field.to_string())]))
                    .unwrap_or_default(),
                validation_errors: FieldErrors::new(),
            },
            Self::DependencyNotFound { .. } => ErrorEnvelope {
                code: Some("DEPENDENCY_NOT_FOUND".to_string()),
                message: INTERNAL_ERROR_MESSAGE.to_string(),
                details: BTreeMap::new(),
                validation_errors: FieldErrors::new(),
            },
            Self::Validation(e) => ErrorEnvelope {
                code: Some(e.code.clone()),
                message: e.message.clone(),
                details: BTreeMap::new(),
                validation_errors: e.fields.clone(),
            },
            Self::Api(e) => ErrorEnvelope {
                code: e.code.clone(),
                message: e.message.clone(),
                details: e.details.clone(),
                validation_errors: FieldErrors::new(),
            },
            Self::Registration(_) | Self::Internal { .. } => ErrorEnvelope::internal(),
        }
    }
}

impl From<anyhow::Error> for HermesError {
    fn from(source: anyhow::Error) -> Self {
        Self::Internal {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Business error carrying an HTTP status, an optional machine code, a
/// message and optional string details.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status to respond with.
    pub status: StatusCode,
    /// Machine-readable error code.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Additional details.
    pub details: BTreeMap<String, String>,
}

impl ApiError {
    /// Creates an error with a status and message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Sets the machine-readable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Adds one detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Replaces all details.
    #[must_use]
    pub fn with_details(mut self, details: BTreeMap<String, String>) -> Self {
        self.details = details;
        self
    }
}

/// Field-specific validation errors.
///
/// Keys are field names, values the violations reported for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the violations recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Iterates fields and their violations in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// The populated request failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}: {fields:?}")]
pub struct ValidationError {
    /// HTTP status, always 400.
    pub status: StatusCode,
    /// Machine code, `VALIDATION_ERROR`.
    pub code: String,
    /// Message, `Validation failed`.
    pub message: String,
    /// Violations by field.
    pub fields: FieldErrors,
}

impl ValidationError {
    /// Creates the standard validation error from field violations.
    #[must_use]
    pub fn new(fields: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR".to_string(),
            message: "Validation failed".to_string(),
            fields,
        }
    }
}

/// Structural error detected at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A field declares more than one source.
    #[error("{type_name}.{field}: conflicting sources {first} and {second}")]
    ConflictingSources {
        /// Request type.
        type_name: String,
        /// Offending field.
        field: String,
        /// First declared source.
        first: SourceKind,
        /// Second declared source.
        second: SourceKind,
    },

    /// A source annotation has an empty name.
    #[error("{type_name}.{field}: empty {source_kind} name")]
    EmptySourceName {
        /// Request type.
        type_name: String,
        /// Offending field.
        field: String,
        /// Source kind with the empty name.
        source_kind: SourceKind,
    },

    /// A dependency reference contains an empty segment.
    #[error("{type_name}.{field}: invalid dependency reference '{reference}'")]
    InvalidDependencyPath {
        /// Request type.
        type_name: String,
        /// Offending field.
        field: String,
        /// The reference as written.
        reference: String,
    },

    /// A string-sourced field has a type that cannot be coerced from a string.
    #[error("{type_name}.{field}: type {ty} cannot be read from {source_kind}")]
    UnsupportedFieldType {
        /// Request type.
        type_name: String,
        /// Offending field.
        field: String,
        /// Declared type, rendered.
        ty: String,
        /// Source kind.
        source_kind: SourceKind,
    },

    /// Two fields share a name.
    #[error("{type_name}: duplicate field {field}")]
    DuplicateField {
        /// Request type.
        type_name: String,
        /// Duplicated field name.
        field: String,
    },

    /// The validator does not recognise a rule.
    #[error("{type_name}.{field}: {reason}")]
    UnknownRule {
        /// Request type.
        type_name: String,
        /// Offending field.
        field: String,
        /// Validator diagnostic.
        reason: String,
    },

    /// A route is registered twice.
    #[error("duplicate route {method} {path}")]
    DuplicateRoute {
        /// HTTP method.
        method: String,
        /// Path pattern.
        path: String,
    },

    /// A dependency name is empty or contains a `.`.
    #[error("invalid dependency name '{name}'")]
    InvalidDependencyName {
        /// The rejected name.
        name: String,
    },

    /// A dependency name is registered twice.
    #[error("duplicate dependency {name}")]
    DuplicateDependency {
        /// Dependency name.
        name: String,
    },

    /// A route pattern is malformed.
    #[error("invalid route pattern '{path}': {reason}")]
    InvalidRoute {
        /// Path pattern.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// A value could not be assigned into a request field.
#[derive(Debug, Error)]
#[error("cannot assign field '{field}': {reason}")]
pub struct AssignError {
    field: String,
    reason: String,
}

impl AssignError {
    /// Creates an error for a conversion failure.
    pub fn new(field: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an error for a field the type does not have.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::new(field, "no such field")
    }

    /// The field that rejected the value.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Why the value was rejected.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Machine-readable error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Additional details.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    /// Validation violations by field.
    #[serde(default, skip_serializing_if = "FieldErrors::is_empty")]
    pub validation_errors: FieldErrors,
}

impl ErrorEnvelope {
    /// The generic envelope for server-side failures.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            code: Some("INTERNAL_ERROR".to_string()),
            message: INTERNAL_ERROR_MESSAGE.to_string(),
            details: BTreeMap::new(),
            validation_errors: FieldErrors::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_envelope() {
        let err: HermesError = ApiError::new(StatusCode::NOT_FOUND, "Post not found")
            .with_code("POST_NOT_FOUND")
            .with_detail("id", "7")
            .into();

        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let json = serde_json::to_value(err.to_envelope()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "code": "POST_NOT_FOUND",
                "message": "Post not found",
                "details": {"id": "7"}
            })
        );
    }

    #[test]
    fn test_api_error_without_code_omits_it() {
        let err: HermesError = ApiError::new(StatusCode::CONFLICT, "taken").into();
        let json = serde_json::to_value(err.to_envelope()).unwrap();
        assert_eq!(json, serde_json::json!({"message": "taken"}));
    }

    #[test]
    fn test_validation_error_envelope() {
        let mut fields = FieldErrors::new();
        fields.add("title", "failed required validation");
        fields.add("title", "failed min validation");
        let err: HermesError = ValidationError::new(fields).into();

        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let json = serde_json::to_value(err.to_envelope()).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(
            json["validation_errors"]["title"],
            serde_json::json!(["failed required validation", "failed min validation"])
        );
    }

    #[test]
    fn test_internal_error_is_generic() {
        let err = HermesError::internal_with_source(
            "database exploded",
            anyhow::anyhow!("connection reset"),
        );
        assert!(err.is_server_error());

        let envelope = err.to_envelope();
        assert_eq!(envelope.code.as_deref(), Some("INTERNAL_ERROR"));
        assert_eq!(envelope.message, INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_dependency_not_found() {
        let err = HermesError::dependency_not_found("auth");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_envelope().code.as_deref(), Some("DEPENDENCY_NOT_FOUND"));
        assert!(err.to_string().contains("auth"));
    }

    #[test]
    fn test_anyhow_converts_to_internal() {
        let err: HermesError = anyhow::anyhow!("boom").into();
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_registration_error_display() {
        let err = RegistrationError::ConflictingSources {
            type_name: "GetUser".into(),
            field: "id".into(),
            first: SourceKind::Path,
            second: SourceKind::Query,
        };
        assert_eq!(err.to_string(), "GetUser.id: conflicting sources path and query");
    }
}
