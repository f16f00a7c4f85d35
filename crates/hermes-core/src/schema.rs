//! Request schema descriptions.
//!
//! A [`Schema`] is the explicit description of a request type: its fields,
//! their semantic types, where each field's value comes from and which
//! validation rules apply. Request types expose their schema through the
//! [`Bindable`] trait, usually via `#[derive(Bindable)]`.
//!
//! # Example
//!
//! ```
//! use hermes_core::{FieldSpec, FieldType, Schema, Source};
//!
//! let schema = Schema::new("GetUserRequest")
//!     .field(FieldSpec::new("id", FieldType::Int { bits: 64 }).source(Source::path("id")))
//!     .field(
//!         FieldSpec::new("fields", FieldType::seq(FieldType::String))
//!             .source(Source::query("fields"))
//!             .validate("max=5"),
//!     );
//!
//! assert_eq!(schema.fields().len(), 2);
//! ```

use crate::{AssignError, Value, ValueError};
use serde::Serialize;
use std::fmt;

use crate::value::FieldType;

/// The kind of source a field reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// URL path variable.
    Path,
    /// Query string parameter.
    Query,
    /// Request header.
    Header,
    /// Key of the JSON request body.
    Json,
    /// Named dependency result.
    Dependency,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Json => write!(f, "json"),
            Self::Dependency => write!(f, "dep"),
        }
    }
}

/// Reference to a dependency, optionally selecting a nested field of its
/// result (`"auth"` or `"auth.UserID"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRef {
    name: String,
    path: Vec<String>,
}

impl DependencyRef {
    /// Parses a dotted reference. The first segment is the dependency name.
    ///
    /// Segments are kept verbatim, including empty ones, so the introspector
    /// can reject malformed references such as `"auth."`.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        let mut segments = reference.split('.').map(str::to_string);
        let name = segments.next().unwrap_or_default();
        Self {
            name,
            path: segments.collect(),
        }
    }

    /// The referenced dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field path into the dependency result (empty for the whole result).
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Selects the referenced part of a resolved dependency result.
    ///
    /// Returns `None` if a path segment is missing or not navigable.
    #[must_use]
    pub fn select(&self, resolved: &Value) -> Option<Value> {
        resolved.select(&self.path).cloned()
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for segment in &self.path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

/// Where a field's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Path variable with the given name.
    Path(String),
    /// Query parameter with the given name.
    Query(String),
    /// Header with the given name.
    Header(String),
    /// JSON body key.
    Json(String),
    /// Dependency result.
    Dependency(DependencyRef),
}

impl Source {
    /// A path variable source.
    pub fn path(name: impl Into<String>) -> Self {
        Self::Path(name.into())
    }

    /// A query parameter source.
    pub fn query(name: impl Into<String>) -> Self {
        Self::Query(name.into())
    }

    /// A header source.
    pub fn header(name: impl Into<String>) -> Self {
        Self::Header(name.into())
    }

    /// A JSON body key source.
    pub fn json(key: impl Into<String>) -> Self {
        Self::Json(key.into())
    }

    /// A dependency source, parsed from a dotted reference.
    pub fn dependency(reference: &str) -> Self {
        Self::Dependency(DependencyRef::parse(reference))
    }

    /// The kind of this source.
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
}

/// Description of one request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    ty: FieldType,
    sources: Vec<Source>,
    validate: Option<String>,
}

impl FieldSpec {
    /// Creates an inert field (no source, no rules).
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            sources: Vec::new(),
            validate: None,
        }
    }

    /// Adds a source annotation.
    ///
    /// More than one source is representable so that the introspector can
    /// reject it with a precise error.
    #[must_use]
    pub fn source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    /// Sets the opaque validation rule string.
    #[must_use]
    pub fn validate(mut self, rule: impl Into<String>) -> Self {
        self.validate = Some(rule.into());
        self
    }

    /// Field name, as used for assignment and validation reports.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type.
    #[must_use]
    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// Declared sources.
    #[must_use]
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Validation rule, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        self.validate.as_deref()
    }
}

/// Description of a request type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    type_name: String,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Creates an empty schema for the named type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field. Declaration order is binding order.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// The described type's name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// A request type the binder can populate.
///
/// The binder starts from `Default::default()`, calls [`Bindable::assign`] for
/// every field whose source produced a value, then hands
/// [`Bindable::field_values`] to the validator. Implement it with `#[derive(Bindable)]` from
/// `hermes-macros`, or by hand:
///
/// ```
/// use hermes_core::{AssignError, Bindable, FieldSpec, FieldType, Schema, Source, Value};
/// use serde::Serialize;
///
/// #[derive(Default, Serialize)]
/// struct Ping {
///     name: String,
/// }
///
/// impl Bindable for Ping {
///     fn schema() -> Schema {
///         Schema::new("Ping")
///             .field(FieldSpec::new("name", FieldType::String).source(Source::query("name")))
///     }
///
///     fn assign(&mut self, field: &str, value: Value) -> Result<(), AssignError> {
///         match field {
///             "name" => self.name = value.decode().map_err(|e| AssignError::new(field, e))?,
///             _ => return Err(AssignError::unknown_field(field)),
///         }
///         Ok(())
///     }
/// }
///
/// let mut ping = Ping::default();
/// ping.assign("name", Value::from("pong")).unwrap();
/// assert_eq!(ping.name, "pong");
/// ```
pub trait Bindable: Default + Serialize + Send + 'static {
    /// Describes the fields of this type.
    fn schema() -> Schema;

    /// Assigns a value into the named field.
    ///
    /// # Errors
    ///
    /// Returns [`AssignError`] if the field does not exist or the value does
    /// not convert into the field's type.
    fn assign(&mut self, field: &str, value: Value) -> Result<(), AssignError>;

    /// The values validation rules apply to, keyed by the names used in
    /// [`Bindable::schema`].
    ///
    /// The default serializes `self`, which only lines up with the schema
    /// when serde keeps the field names. The derive emits one entry per field
    /// carrying rules, independent of serde renames.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a field cannot be captured.
    fn field_values(&self) -> Result<Value, ValueError> {
        Value::from_serialize(self)
    }
}

/// Request type for handlers without inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty;

impl Bindable for Empty {
    fn schema() -> Schema {
        Schema::new("Empty")
    }

    fn assign(&mut self, field: &str, _value: Value) -> Result<(), AssignError> {
        Err(AssignError::unknown_field(field))
    }
}
