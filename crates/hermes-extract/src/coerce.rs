//! String to typed value coercion.
//!
//! Path variables, query parameters and headers arrive as strings. They are
//! converted to a [`Value`] according to the target [`FieldType`]:
//!
//! - integers and floats are parsed for the target bit width,
//! - booleans accept `1 t T TRUE true True` and `0 f F FALSE false False`,
//! - sequences split on `,`, trim each part and coerce it as the element
//!   type; one bad element fails the whole field.

use hermes_core::{FieldType, Value};

/// Coerces a raw string into a value of type `ty`.
///
/// # Errors
///
/// Returns a human-readable reason when the string does not parse as `ty`.
///
/// # Example
///
/// ```
/// use hermes_core::{FieldType, Value};
/// use hermes_extract::coerce;
///
/// let tags = coerce("a, b,c", &FieldType::seq(FieldType::String)).unwrap();
/// assert_eq!(tags, Value::from(vec!["a", "b", "c"]));
///
/// assert!(coerce("300", &FieldType::Uint { bits: 8 }).is_err());
/// ```
pub fn coerce(raw: &str, ty: &FieldType) -> Result<Value, String> {
    match ty {
        FieldType::String => Ok(Value::String(raw.to_string())),
        FieldType::Int { bits } => parse_int(raw, *bits).map(Value::Int),
        FieldType::Uint { bits } => parse_uint(raw, *bits).map(Value::Uint),
        FieldType::Float { bits } => parse_float(raw, *bits).map(Value::Float),
        FieldType::Bool => parse_bool(raw).map(Value::Bool),
        FieldType::Optional(inner) => coerce(raw, inner),
        FieldType::Seq(inner) => raw
            .split(',')
            .map(|part| coerce(part.trim(), inner))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Seq),
        FieldType::Struct => Err(format!("cannot read {ty} from a string")),
    }
}

fn parse_int(raw: &str, bits: u8) -> Result<i64, String> {
    let parsed = match bits {
        8 => raw.parse::<i8>().map(i64::from),
        16 => raw.parse::<i16>().map(i64::from),
        32 => raw.parse::<i32>().map(i64::from),
        _ => raw.parse::<i64>(),
    };
    parsed.map_err(|e| format!("'{raw}' is not a valid i{bits}: {e}"))
}

fn parse_uint(raw: &str, bits: u8) -> Result<u64, String> {
    let parsed = match bits {
        8 => raw.parse::<u8>().map(u64::from),
        16 => raw.parse::<u16>().map(u64::from),
        32 => raw.parse::<u32>().map(u64::from),
        _ => raw.parse::<u64>(),
    };
    parsed.map_err(|e| format!("'{raw}' is not a valid u{bits}: {e}"))
}

fn parse_float(raw: &str, bits: u8) -> Result<f64, String> {
    let parsed = if bits == 32 {
        raw.parse::<f32>().map(f64::from)
    } else {
        raw.parse::<f64>()
    }
    .map_err(|e| format!("'{raw}' is not a valid f{bits}: {e}"))?;

    // Overflow parses to infinity; only an explicit "inf" may produce one.
    if parsed.is_infinite() && !raw.to_ascii_lowercase().contains("inf") {
        return Err(format!("'{raw}' is out of range for f{bits}"));
    }
    Ok(parsed)
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("'{raw}' is not a valid bool")),
    }
}
