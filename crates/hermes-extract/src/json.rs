//! JSON body extractor.

use crate::extractor::zero;
use crate::{Extract, ExtractionContext};
use hermes_core::{ExtractionError, FieldType, Value};

/// Reads one key of the JSON request body.
///
/// - empty body: zero value,
/// - body is an object: the value under the key, or the zero value when the
///   key is missing,
/// - body is valid JSON but not an object: the whole body,
/// - body is not JSON: error.
///
/// The value is converted into the field type on assignment, so a shape
/// mismatch surfaces there.
///
/// # Example
///
/// ```rust
/// use hermes_core::{FieldType, Value};
/// use hermes_extract::{Extract, ExtractionContext, JsonExtractor};
///
/// let ctx = ExtractionContext::builder()
///     .body(r#"{"title": "Hello", "tags": ["a"]}"#)
///     .build();
/// let title = JsonExtractor::new("title", FieldType::String);
/// assert_eq!(title.extract(&ctx).unwrap(), Some(Value::from("Hello")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonExtractor {
    key: String,
    ty: FieldType,
}

impl JsonExtractor {
    /// Creates an extractor for the given body key.
    pub fn new(key: impl Into<String>, ty: FieldType) -> Self {
        Self { key: key.into(), ty }
    }

    /// The body key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Extract for JsonExtractor {
    fn extract(&self, ctx: &ExtractionContext) -> Result<Option<Value>, ExtractionError> {
        let Some(parsed) = ctx.json() else {
            return Ok(zero(&self.ty));
        };
        let body =
            parsed.map_err(|e| ExtractionError::deserialization_failed(&self.key, e))?;

        match body {
            serde_json::Value::Object(map) => Ok(match map.get(&self.key) {
                Some(value) => Some(Value::from_json(value.clone())),
                None => zero(&self.ty),
            }),
            whole => Ok(Some(Value::from_json(whole.clone()))),
        }
    }
}
