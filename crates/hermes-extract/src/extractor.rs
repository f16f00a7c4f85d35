//! Field extractor trait and dispatch.
//!
//! Every request field with a source annotation gets one extractor at
//! registration time. At request time the binder asks it for a value:
//!
//! - `Ok(Some(value))` - assign the value,
//! - `Ok(None)` - nothing to assign, the field keeps its default,
//! - `Err(_)` - abort binding.

use crate::{ExtractionContext, HeaderExtractor, JsonExtractor, PathExtractor, QueryExtractor};
use hermes_core::{DependencyRef, ExtractionError, FieldType, Source, SourceKind, Value};

/// Trait for strategies that read one field from a request.
pub trait Extract {
    /// Reads this extractor's field from the request.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] if the value is required but missing or
    /// does not convert to the field type.
    fn extract(&self, ctx: &ExtractionContext) -> Result<Option<Value>, ExtractionError>;
}

/// Extractor for a dependency-sourced field.
///
/// It never reads the request itself: the binder resolves the referenced
/// dependency and selects the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyExtractor {
    reference: DependencyRef,
}

impl DependencyExtractor {
    /// Creates a marker for the given reference.
    #[must_use]
    pub fn new(reference: DependencyRef) -> Self {
        Self { reference }
    }

    /// The dependency reference.
    #[must_use]
    pub fn reference(&self) -> &DependencyRef {
        &self.reference
    }
}

impl Extract for DependencyExtractor {
    fn extract(&self, _ctx: &ExtractionContext) -> Result<Option<Value>, ExtractionError> {
        Ok(None)
    }
}

/// One of the five extraction strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldExtractor {
    /// Path variable.
    Path(PathExtractor),
    /// Query parameter.
    Query(QueryExtractor),
    /// Header.
    Header(HeaderExtractor),
    /// JSON body key.
    Json(JsonExtractor),
    /// Dependency reference.
    Dependency(DependencyExtractor),
}

impl FieldExtractor {
    /// Builds the extractor for a field source.
    #[must_use]
    pub fn for_source(source: &Source, ty: &FieldType) -> Self {
        match source {
            Source::Path(name) => Self::Path(PathExtractor::new(name.clone(), ty.clone())),
            Source::Query(name) => Self::Query(QueryExtractor::new(name.clone(), ty.clone())),
            Source::Header(name) => Self::Header(HeaderExtractor::new(name.clone(), ty.clone())),
            Source::Json(key) => Self::Json(JsonExtractor::new(key.clone(), ty.clone())),
            Source::Dependency(reference) => {
                Self::Dependency(DependencyExtractor::new(reference.clone()))
            }
        }
    }

    /// The source kind this extractor reads from.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Path(_) => SourceKind::Path,
            Self::Query(_) => SourceKind::Query,
            Self::Header(_) => SourceKind::Header,
            Self::Json(_) => SourceKind::Json,
            Self::Dependency(_) => SourceKind::Dependency,
        }
    }

    /// The dependency reference, for dependency-sourced fields.
    #[must_use]
    pub fn dependency(&self) -> Option<&DependencyRef> {
        match self {
            Self::Dependency(dep) => Some(dep.reference()),
            _ => None,
        }
    }

    /// The external name the extractor reads (parameter, header or key).
    #[must_use]
    pub fn source_name(&self) -> String {
        match self {
            Self::Path(e) => e.name().to_string(),
            Self::Query(e) => e.name().to_string(),
            Self::Header(e) => e.name().to_string(),
            Self::Json(e) => e.key().to_string(),
            Self::Dependency(e) => e.reference().to_string(),
        }
    }
}

impl Extract for FieldExtractor {
    fn extract(&self, ctx: &ExtractionContext) -> Result<Option<Value>, ExtractionError> {
        match self {
            Self::Path(e) => e.extract(ctx),
            Self::Query(e) => e.extract(ctx),
            Self::Header(e) => e.extract(ctx),
            Self::Json(e) => e.extract(ctx),
            Self::Dependency(e) => e.extract(ctx),
        }
    }
}

/// Turns a zero value into "nothing to assign" when it is `Null`.
pub(crate) fn zero(ty: &FieldType) -> Option<Value> {
    Some(ty.zero()).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_source_picks_strategy() {
        let ty = FieldType::String;
        assert_eq!(
            FieldExtractor::for_source(&Source::path("id"), &ty).kind(),
            SourceKind::Path
        );
        assert_eq!(
            FieldExtractor::for_source(&Source::header("X-Token"), &ty).source_name(),
            "X-Token"
        );

        let dep = FieldExtractor::for_source(&Source::dependency("auth.UserID"), &ty);
        assert_eq!(dep.kind(), SourceKind::Dependency);
        assert_eq!(dep.dependency().map(DependencyRef::name), Some("auth"));
    }

    #[test]
    fn test_dependency_extractor_is_marker() {
        let ctx = ExtractionContext::builder().build();
        let dep = FieldExtractor::for_source(&Source::dependency("auth"), &FieldType::Struct);
        assert_eq!(dep.extract(&ctx).unwrap(), None);
    }
}
