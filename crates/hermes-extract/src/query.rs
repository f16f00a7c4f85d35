//! Query parameter extractor.

use crate::extractor::zero;
use crate::{coerce, Extract, ExtractionContext};
use hermes_core::{ExtractionError, FieldType, SourceKind, Value};

/// Reads a query parameter.
///
/// A missing or empty parameter yields the field's zero value. Boolean fields
/// treat an empty parameter as `false` without parsing it.
///
/// # Example
///
/// ```rust
/// use hermes_core::{FieldType, Value};
/// use hermes_extract::{Extract, ExtractionContext, QueryExtractor};
/// use http::Uri;
///
/// let ctx = ExtractionContext::builder()
///     .uri(Uri::from_static("/posts?fields=a,%20b,c"))
///     .build();
/// let fields = QueryExtractor::new("fields", FieldType::seq(FieldType::String));
/// assert_eq!(
///     fields.extract(&ctx).unwrap(),
///     Some(Value::from(vec!["a", "b", "c"]))
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExtractor {
    name: String,
    ty: FieldType,
}

impl QueryExtractor {
    /// Creates an extractor for the named parameter.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// The parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Extract for QueryExtractor {
    fn extract(&self, ctx: &ExtractionContext) -> Result<Option<Value>, ExtractionError> {
        match ctx.query(&self.name) {
            None | Some("") => Ok(zero(&self.ty)),
            Some(raw) => coerce(raw, &self.ty).map(Some).map_err(|reason| {
                ExtractionError::invalid_type(SourceKind::Query, &self.name, reason)
            }),
        }
    }
}
