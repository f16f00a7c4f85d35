//! Header extractor.

use crate::extractor::zero;
use crate::{coerce, Extract, ExtractionContext};
use hermes_core::{ExtractionError, FieldType, SourceKind, Value};

/// Reads a request header.
///
/// A missing or empty header yields the field's zero value.
///
/// # Example
///
/// ```rust
/// use hermes_core::{FieldType, Value};
/// use hermes_extract::{Extract, ExtractionContext, HeaderExtractor};
///
/// let ctx = ExtractionContext::builder()
///     .header("authorization", "Bearer abc")
///     .build();
/// let token = HeaderExtractor::new("Authorization", FieldType::String);
/// assert_eq!(token.extract(&ctx).unwrap(), Some(Value::from("Bearer abc")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderExtractor {
    name: String,
    ty: FieldType,
}

impl HeaderExtractor {
    /// Creates an extractor for the named header.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// The header name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Extract for HeaderExtractor {
    fn extract(&self, ctx: &ExtractionContext) -> Result<Option<Value>, ExtractionError> {
        match ctx.header(&self.name) {
            None | Some("") => Ok(zero(&self.ty)),
            Some(raw) => coerce(raw, &self.ty).map(Some).map_err(|reason| {
                ExtractionError::invalid_type(SourceKind::Header, &self.name, reason)
            }),
        }
    }
}
