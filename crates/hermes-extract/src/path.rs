//! Path variable extractor.

use crate::{coerce, Extract, ExtractionContext};
use hermes_core::{ExtractionError, FieldType, SourceKind, Value};

/// Reads a path variable.
///
/// The variable must exist: a route pattern that does not capture it is a
/// binding failure, never a zero value.
///
/// # Example
///
/// ```rust
/// use hermes_core::{FieldType, Value};
/// use hermes_extract::{Extract, ExtractionContext, PathExtractor};
///
/// let ctx = ExtractionContext::builder().path_param("id", "42").build();
/// let id = PathExtractor::new("id", FieldType::Int { bits: 64 });
/// assert_eq!(id.extract(&ctx).unwrap(), Some(Value::Int(42)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExtractor {
    name: String,
    ty: FieldType,
}

impl PathExtractor {
    /// Creates an extractor for the named variable.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// The variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Extract for PathExtractor {
    fn extract(&self, ctx: &ExtractionContext) -> Result<Option<Value>, ExtractionError> {
        let raw = ctx
            .path_param(&self.name)
            .ok_or_else(|| ExtractionError::missing(SourceKind::Path, &self.name))?;
        coerce(raw, &self.ty)
            .map(Some)
            .map_err(|reason| ExtractionError::invalid_type(SourceKind::Path, &self.name, reason))
    }
}
