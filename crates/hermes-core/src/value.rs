//! Dynamic values flowing between extractors, dependencies and request types.
//!
//! Every raw input (a path segment, a query parameter, a JSON sub-document, a
//! dependency result) is converted into a [`Value`] before it is assigned into a
//! request field. [`FieldType`] describes the semantic type a field expects so
//! string sources can be coerced before assignment.

use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// Failure converting between Rust values and [`Value`].
pub type ValueError = serde_json::Error;

/// Semantic type of a request field.
///
/// This is the subset of shapes the binder knows how to produce. Anything that
/// is not a primitive, a sequence or an optional is treated as a nested struct
/// and can only be filled from a JSON body or a dependency result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// UTF-8 string.
    String,
    /// Signed integer of the given bit width (8, 16, 32 or 64).
    Int {
        /// Bit width of the target integer.
        bits: u8,
    },
    /// Unsigned integer of the given bit width (8, 16, 32 or 64).
    Uint {
        /// Bit width of the target integer.
        bits: u8,
    },
    /// Floating point number of the given bit width (32 or 64).
    Float {
        /// Bit width of the target float.
        bits: u8,
    },
    /// Boolean.
    Bool,
    /// Homogeneous sequence.
    Seq(Box<FieldType>),
    /// Optional value (`Option<T>`).
    Optional(Box<FieldType>),
    /// Nested struct or any other deserializable shape.
    Struct,
}

impl FieldType {
    /// Shorthand for a sequence of `inner`.
    #[must_use]
    pub fn seq(inner: FieldType) -> Self {
        Self::Seq(Box::new(inner))
    }

    /// Shorthand for an optional `inner`.
    #[must_use]
    pub fn optional(inner: FieldType) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Returns `true` if a value of this type can be coerced from a single
    /// string (path, query and header sources).
    #[must_use]
    pub fn is_string_coercible(&self) -> bool {
        match self {
            Self::String | Self::Int { .. } | Self::Uint { .. } | Self::Float { .. } | Self::Bool => {
                true
            }
            Self::Seq(inner) => inner.is_scalar(),
            Self::Optional(inner) => inner.is_string_coercible(),
            Self::Struct => false,
        }
    }

    /// Returns `true` for primitive (non-container) types.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        match self {
            Self::String | Self::Int { .. } | Self::Uint { .. } | Self::Float { .. } | Self::Bool => {
                true
            }
            Self::Optional(inner) => inner.is_scalar(),
            Self::Seq(_) | Self::Struct => false,
        }
    }

    /// Returns `true` if this is a boolean, looking through `Optional`.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        match self {
            Self::Bool => true,
            Self::Optional(inner) => inner.is_bool(),
            _ => false,
        }
    }

    /// The zero value for this type.
    ///
    /// Structs and optionals have no meaningful zero value at this level and
    /// map to [`Value::Null`], which the binder never assigns.
    #[must_use]
    pub fn zero(&self) -> Value {
        match self {
            Self::String => Value::String(String::new()),
            Self::Int { .. } => Value::Int(0),
            Self::Uint { .. } => Value::Uint(0),
            Self::Float { .. } => Value::Float(0.0),
            Self::Bool => Value::Bool(false),
            Self::Seq(_) => Value::Seq(Vec::new()),
            Self::Optional(_) | Self::Struct => Value::Null,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int { bits } => write!(f, "i{bits}"),
            Self::Uint { bits } => write!(f, "u{bits}"),
            Self::Float { bits } => write!(f, "f{bits}"),
            Self::Bool => write!(f, "bool"),
            Self::Seq(inner) => write!(f, "[{inner}]"),
            Self::Optional(inner) => write!(f, "{inner}?"),
            Self::Struct => write!(f, "struct"),
        }
    }
}

/// A dynamically typed value.
///
/// # Example
///
/// ```
/// use hermes_core::Value;
///
/// let auth = Value::from_json(serde_json::json!({"UserID": "u1", "Username": "john"}));
/// assert_eq!(auth.field("userid"), Some(&Value::String("u1".into())));
/// assert_eq!(auth.field("Missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer that does not fit in `i64`.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// String.
    String(String),
    /// Sequence.
    Seq(Vec<Value>),
    /// Struct or map, keeping field order.
    Struct(IndexMap<String, Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Struct(_) => "struct",
        }
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON document into a value.
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Uint(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::Seq(items.into_iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => Self::Struct(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts this value into a JSON document.
    ///
    /// Non-finite floats become `null`, as JSON cannot represent them.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(b),
            Self::Int(i) => serde_json::Value::from(i),
            Self::Uint(u) => serde_json::Value::from(u),
            Self::Float(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s),
            Self::Seq(items) => serde_json::Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Struct(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into_json())).collect(),
            ),
        }
    }

    /// Captures any serializable value.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if `value` cannot be represented as JSON
    /// (e.g. a map with non-string keys).
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ValueError> {
        serde_json::to_value(value).map(Self::from_json)
    }

    /// Builds a struct value from named fields, keeping their order.
    ///
    /// ```
    /// use hermes_core::Value;
    ///
    /// let user = Value::from_fields([("page_size", Value::Int(10))]);
    /// assert_eq!(user.field("page_size"), Some(&Value::Int(10)));
    /// ```
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        )
    }

    /// Decodes this value into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error if the shape does not fit `T`
    /// (wrong variant, out-of-range integer, missing struct field...).
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ValueError> {
        serde_json::from_value(self.into_json())
    }

    /// Looks up a struct field by name.
    ///
    /// An exact match wins; otherwise the first ASCII case-insensitive match is
    /// returned. Non-struct values have no fields.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        let Self::Struct(map) = self else {
            return None;
        };
        map.get(name).or_else(|| {
            map.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    /// Navigates a dotted field path.
    ///
    /// Returns `None` as soon as a segment is missing or the current value is
    /// not a struct. An empty path returns `self`.
    #[must_use]
    pub fn select<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, segment| current.field(segment.as_ref()))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Seq(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Auth {
        #[serde(rename = "UserID")]
        user_id: String,
        #[serde(rename = "Username")]
        username: String,
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from_json(json!(-3)), Value::Int(-3));
        assert_eq!(Value::from_json(json!(u64::MAX)), Value::Uint(u64::MAX));
        assert_eq!(Value::from_json(json!(1.5)), Value::Float(1.5));
    }

    #[test]
    fn test_struct_keeps_order() {
        let value = Value::from_json(json!({"b": 1, "a": 2}));
        let Value::Struct(map) = value else {
            panic!("expected struct");
        };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_field_case_sensitive_first() {
        let value = Value::from_json(json!({"id": 1, "ID": 2}));
        assert_eq!(value.field("ID"), Some(&Value::Int(2)));
        assert_eq!(value.field("id"), Some(&Value::Int(1)));
        assert_eq!(value.field("Id"), Some(&Value::Int(1)));
        assert_eq!(value.field("iD"), Some(&Value::Int(1)));
        assert_eq!(value.field("idx"), None);
    }

    #[test]
    fn test_from_fields_keeps_order() {
        let value = Value::from_fields([("page_size", Value::Int(10)), ("cursor", Value::Null)]);
        let Value::Struct(map) = &value else {
            panic!("expected struct");
        };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["page_size", "cursor"]);
        assert_eq!(value.field("PAGE_SIZE"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_select_nested() {
        let value = Value::from_json(json!({"user": {"profile": {"name": "ada"}}}));
        assert_eq!(
            value.select(&["user", "profile", "name"]),
            Some(&Value::from("ada"))
        );
        assert_eq!(value.select(&["user", "missing"]), None);
        assert_eq!(value.select(&["user", "profile", "name", "deeper"]), None);
        assert_eq!(value.select::<&str>(&[]), Some(&value));
    }

    #[test]
    fn test_round_trip_through_serde() {
        let auth = Auth {
            user_id: "u1".into(),
            username: "john".into(),
        };
        let value = Value::from_serialize(&auth).unwrap();
        assert_eq!(value.field("UserID"), Some(&Value::from("u1")));

        let back: Auth = value.decode().unwrap();
        assert_eq!(back, auth);
    }

    #[test]
    fn test_decode_out_of_range_fails() {
        let result: Result<u8, _> = Value::Int(300).decode();
        assert!(result.is_err());
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(Value::Float(f64::NAN).into_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_field_type_coercibility() {
        assert!(FieldType::String.is_string_coercible());
        assert!(FieldType::seq(FieldType::Int { bits: 32 }).is_string_coercible());
        assert!(FieldType::optional(FieldType::Bool).is_string_coercible());
        assert!(!FieldType::Struct.is_string_coercible());
        assert!(!FieldType::seq(FieldType::seq(FieldType::String)).is_string_coercible());
    }

    #[test]
    fn test_zero_values() {
        assert_eq!(FieldType::String.zero(), Value::String(String::new()));
        assert_eq!(FieldType::Bool.zero(), Value::Bool(false));
        assert_eq!(FieldType::optional(FieldType::Bool).zero(), Value::Null);
        assert_eq!(FieldType::Struct.zero(), Value::Null);
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::seq(FieldType::Int { bits: 16 }).to_string(), "[i16]");
        assert_eq!(FieldType::optional(FieldType::String).to_string(), "string?");
    }
}
