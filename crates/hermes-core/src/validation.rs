//! Request validation.
//!
//! The binder hands every populated request to a [`Validator`] together with
//! a [`RuleTable`] mapping field names to the opaque rule strings declared on
//! the request type. Two implementations ship with Hermes:
//!
//! - [`RuleValidator`] interprets comma-separated rules such as
//!   `"required,min=3,max=100"`.
//! - [`NoopValidator`] accepts everything.
//!
//! # Rule syntax
//!
//! | Rule | Strings | Numbers | Sequences |
//! |---|---|---|---|
//! | `required` | non-empty | non-zero | non-empty |
//! | `omitempty` | skip remaining rules when the value is zero | | |
//! | `min=n`, `max=n`, `len=n` | char count | value | length |
//! | `gt`, `gte`, `lt`, `lte`, `eq`, `ne` | char count (`eq`/`ne`: value) | value | length |
//! | `oneof=a b c` | value in list | value in list | |
//! | `email`, `url`, `uuid`, `alpha`, `alphanum`, `numeric` | format | | |
//! | `dive` | | | apply the remaining rules to each element |
//!
//! Absent optional values (`None`) only fail `required`.

use crate::error::FieldErrors;
use crate::Value;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Field name to rule string, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: IndexMap<String, String>,
}

impl RuleTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the rule for a field.
    pub fn insert(&mut self, field: impl Into<String>, rule: impl Into<String>) {
        self.rules.insert(field.into(), rule.into());
    }

    /// Returns the rule for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.rules.get(field).map(String::as_str)
    }

    /// Iterates `(field, rule)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if no field carries a rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of fields with rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RuleTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            rules: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Validation port.
///
/// Implementations must be shareable across request tasks.
pub trait Validator: Send + Sync {
    /// Validates a populated request.
    ///
    /// `value` is the whole request as a [`Value::Struct`]. Returns `None`
    /// when every rule passes.
    fn validate(&self, value: &Value, rules: &RuleTable) -> Option<FieldErrors>;

    /// Checks at registration time that a rule string is understood.
    ///
    /// The default accepts everything.
    fn check_rule(&self, rule: &str) -> Result<(), String> {
        let _ = rule;
        Ok(())
    }
}

/// Validator that accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate(&self, _value: &Value, _rules: &RuleTable) -> Option<FieldErrors> {
        None
    }
}

/// Custom rule: receives the field value and the rule parameter (the part
/// after `=`), returns `true` if the value passes.
pub type RuleFn = Arc<dyn Fn(&Value, Option<&str>) -> bool + Send + Sync>;

const BUILTIN_RULES: &[&str] = &[
    "required", "omitempty", "min", "max", "len", "eq", "ne", "gt", "gte", "lt", "lte", "oneof",
    "email", "url", "uuid", "alpha", "alphanum", "numeric", "dive",
];

/// Validator interpreting comma-separated rule strings.
///
/// # Example
///
/// ```
/// use hermes_core::{RuleTable, RuleValidator, Validator, Value};
///
/// let validator = RuleValidator::new();
/// let rules: RuleTable = [("title", "required,min=3")].into_iter().collect();
///
/// let post = Value::from_json(serde_json::json!({"title": "Hi"}));
/// let errors = validator.validate(&post, &rules).unwrap();
/// assert_eq!(errors.get("title").unwrap(), ["failed min validation"]);
/// ```
#[derive(Clone, Default)]
pub struct RuleValidator {
    custom: HashMap<String, RuleFn>,
}

impl fmt::Debug for RuleValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleValidator")
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleValidator {
    /// Creates a validator with the built-in rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a custom rule under `tag`.
    ///
    /// Custom rules take precedence over built-in rules of the same name.
    #[must_use]
    pub fn register_rule<F>(mut self, tag: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&Value, Option<&str>) -> bool + Send + Sync + 'static,
    {
        self.custom.insert(tag.into(), Arc::new(rule));
        self
    }

    fn knows(&self, tag: &str) -> bool {
        self.custom.contains_key(tag) || BUILTIN_RULES.contains(&tag)
    }

    /// Applies a rule chain to one value, appending violations to `out`.
    fn apply(&self, field: &str, value: &Value, rules: &[Rule<'_>], out: &mut FieldErrors) {
        for (index, rule) in rules.iter().enumerate() {
            match rule.tag {
                "omitempty" => {
                    if is_zero(value) {
                        return;
                    }
                }
                "dive" => {
                    if let Value::Seq(items) = value {
                        for item in items {
                            self.apply(field, item, &rules[index + 1..], out);
                        }
                    }
                    return;
                }
                tag => {
                    if value.is_null() && tag != "required" {
                        continue;
                    }
                    if !self.check(rule, value) {
                        out.add(field, format!("failed {tag} validation"));
                        // First failing rule wins per value.
                        return;
                    }
                }
            }
        }
    }

    fn check(&self, rule: &Rule<'_>, value: &Value) -> bool {
        if let Some(custom) = self.custom.get(rule.tag) {
            return custom(value, rule.param);
        }
        let param = rule.param.unwrap_or_default();
        match rule.tag {
            "required" => !is_zero(value),
            "min" => compare(value, param, |a, b| a >= b),
            "max" => compare(value, param, |a, b| a <= b),
            "len" => compare(value, param, |a, b| (a - b).abs() < f64::EPSILON),
            "gt" => compare(value, param, |a, b| a > b),
            "gte" => compare(value, param, |a, b| a >= b),
            "lt" => compare(value, param, |a, b| a < b),
            "lte" => compare(value, param, |a, b| a <= b),
            "eq" => equals(value, param),
            "ne" => !equals(value, param),
            "oneof" => param.split_whitespace().any(|option| equals(value, option)),
            "email" => matches_str(value, email_regex()),
            "url" => matches_str(value, url_regex()),
            "uuid" => matches_str(value, uuid_regex()),
            "alpha" => value
                .as_str()
                .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic())),
            "alphanum" => value
                .as_str()
                .is_some_and(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())),
            "numeric" => match value {
                Value::Int(_) | Value::Uint(_) | Value::Float(_) => true,
                other => matches_str(other, numeric_regex()),
            },
            _ => false,
        }
    }
}

impl Validator for RuleValidator {
    fn validate(&self, value: &Value, rules: &RuleTable) -> Option<FieldErrors> {
        let mut errors = FieldErrors::new();
        for (field, rule) in rules.iter() {
            let parsed = parse_rules(rule);
            let field_value = value.field(field).unwrap_or(&Value::Null);
            self.apply(field, field_value, &parsed, &mut errors);
        }
        if errors.is_empty() {
            None
        } else {
            Some(errors)
        }
    }

    fn check_rule(&self, rule: &str) -> Result<(), String> {
        for parsed in parse_rules(rule) {
            if parsed.tag.is_empty() {
                return Err(format!("empty validation rule in '{rule}'"));
            }
            if !self.knows(parsed.tag) {
                return Err(format!("unknown validation rule '{}'", parsed.tag));
            }
            let needs_number = matches!(
                parsed.tag,
                "min" | "max" | "len" | "gt" | "gte" | "lt" | "lte"
            ) && !self.custom.contains_key(parsed.tag);
            if needs_number && parsed.param.and_then(|p| p.parse::<f64>().ok()).is_none() {
                return Err(format!("rule '{}' needs a numeric parameter", parsed.tag));
            }
        }
        Ok(())
    }
}

struct Rule<'a> {
    tag: &'a str,
    param: Option<&'a str>,
}

fn parse_rules(rule: &str) -> Vec<Rule<'_>> {
    rule.split(',')
        .map(str::trim)
        .map(|part| match part.split_once('=') {
            Some((tag, param)) => Rule {
                tag: tag.trim(),
                param: Some(param.trim()),
            },
            None => Rule {
                tag: part,
                param: None,
            },
        })
        .collect()
}

fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Int(i) => *i == 0,
        Value::Uint(u) => *u == 0,
        Value::Float(f) => *f == 0.0,
        Value::String(s) => s.is_empty(),
        Value::Seq(items) => items.is_empty(),
        Value::Struct(_) => false,
    }
}

/// Size of a value for ordering rules: char count, numeric value or length.
fn magnitude(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Uint(u) => Some(*u as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Seq(items) => Some(items.len() as f64),
        Value::Null | Value::Bool(_) | Value::Struct(_) => None,
    }
}

fn compare(value: &Value, param: &str, op: impl Fn(f64, f64) -> bool) -> bool {
    match (magnitude(value), param.parse::<f64>()) {
        (Some(actual), Ok(limit)) => op(actual, limit),
        _ => false,
    }
}

fn equals(value: &Value, param: &str) -> bool {
    match value {
        Value::String(s) => s == param,
        Value::Bool(b) => param.parse::<bool>().is_ok_and(|p| p == *b),
        Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::Seq(_) => {
            compare(value, param, |a, b| (a - b).abs() < f64::EPSILON)
        }
        Value::Null | Value::Struct(_) => false,
    }
}

fn matches_str(value: &Value, regex: &Regex) -> bool {
    value.as_str().is_some_and(|s| regex.is_match(s))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("valid regex")
    })
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("valid regex"))
}

/// Optional sign, digits, optional decimal part. No exponents or `NaN`.
fn numeric_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("valid regex"))
}

fn uuid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("valid regex")
    })
}
