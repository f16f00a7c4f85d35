//! Type introspection.
//!
//! Compiles a request type's [`Schema`] into a [`BindingPlan`], rejecting
//! structural mistakes at registration time so they never surface while
//! serving traffic.

use crate::plan::{BindingPlan, FieldSlot};
use hermes_core::{
    Bindable, FieldSpec, RegistrationError, RuleTable, Schema, Source, SourceKind, Validator,
};
use hermes_extract::FieldExtractor;
use std::collections::HashSet;

/// Compiles the binding plan for request type `Req` answering with `Res`.
///
/// Checks, per field:
///
/// - at most one source annotation,
/// - non-empty source names and dependency path segments,
/// - path, query and header fields have a type readable from a string,
/// - the validator recognises the rule string,
///
/// and that no two fields share a name. Fields without a source are inert
/// but their rules still take part in validation.
///
/// # Errors
///
/// Returns the first [`RegistrationError`] found.
///
/// # Example
///
/// ```
/// use hermes_bind::compile;
/// use hermes_core::{Empty, NoopValidator};
///
/// let plan = compile::<Empty, String>(&NoopValidator).unwrap();
/// assert!(plan.slots().is_empty());
/// assert!(!plan.reads_body());
/// ```
pub fn compile<Req: Bindable, Res>(
    validator: &dyn Validator,
) -> Result<BindingPlan, RegistrationError> {
    compile_schema(&Req::schema(), std::any::type_name::<Res>(), validator)
}

/// Compiles an explicit schema. See [`compile`].
///
/// # Errors
///
/// Returns the first [`RegistrationError`] found.
pub fn compile_schema(
    schema: &Schema,
    response_type: &'static str,
    validator: &dyn Validator,
) -> Result<BindingPlan, RegistrationError> {
    let type_name = schema.type_name();
    let mut seen = HashSet::new();
    let mut slots = Vec::new();
    let mut rules = RuleTable::new();

    for (index, field) in schema.fields().iter().enumerate() {
        if !seen.insert(field.name()) {
            return Err(RegistrationError::DuplicateField {
                type_name: type_name.to_string(),
                field: field.name().to_string(),
            });
        }

        if let Some(rule) = field.rule() {
            validator
                .check_rule(rule)
                .map_err(|reason| RegistrationError::UnknownRule {
                    type_name: type_name.to_string(),
                    field: field.name().to_string(),
                    reason,
                })?;
            rules.insert(field.name(), rule);
        }

        let Some(source) = single_source(type_name, field)? else {
            continue;
        };
        check_source(type_name, field, source)?;

        slots.push(FieldSlot {
            index,
            name: field.name().to_string(),
            ty: field.ty().clone(),
            extractor: FieldExtractor::for_source(source, field.ty()),
            rule: field.rule().map(str::to_string),
        });
    }

    let needs_body = slots.iter().any(|slot| slot.kind() == SourceKind::Json);

    Ok(BindingPlan {
        type_name: type_name.to_string(),
        response_type,
        slots,
        rules,
        needs_body,
    })
}

fn single_source<'a>(
    type_name: &str,
    field: &'a FieldSpec,
) -> Result<Option<&'a Source>, RegistrationError> {
    match field.sources() {
        [] => Ok(None),
        [source] => Ok(Some(source)),
        [first, second, ..] => Err(RegistrationError::ConflictingSources {
            type_name: type_name.to_string(),
            field: field.name().to_string(),
            first: first.kind(),
            second: second.kind(),
        }),
    }
}

fn check_source(
    type_name: &str,
    field: &FieldSpec,
    source: &Source,
) -> Result<(), RegistrationError> {
    let name = match source {
        Source::Path(name) | Source::Query(name) | Source::Header(name) | Source::Json(name) => {
            name.as_str()
        }
        Source::Dependency(reference) => reference.name(),
    };
    if name.trim().is_empty() {
        return Err(RegistrationError::EmptySourceName {
            type_name: type_name.to_string(),
            field: field.name().to_string(),
            source_kind: source.kind(),
        });
    }

    match source {
        Source::Dependency(reference) if reference.path().iter().any(String::is_empty) => {
            Err(RegistrationError::InvalidDependencyPath {
                type_name: type_name.to_string(),
                field: field.name().to_string(),
                reference: reference.to_string(),
            })
        }
        Source::Path(_) | Source::Query(_) | Source::Header(_)
            if !field.ty().is_string_coercible() =>
        {
            Err(RegistrationError::UnsupportedFieldType {
                type_name: type_name.to_string(),
                field: field.name().to_string(),
                ty: field.ty().to_string(),
                source_kind: source.kind(),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::{FieldType, NoopValidator, RuleValidator};

    fn compile(schema: Schema) -> Result<BindingPlan, RegistrationError> {
        compile_schema(&schema, "Response", &RuleValidator::new())
    }

    #[test]
    fn test_compiles_slots_in_order() {
        let plan = compile(
            Schema::new("UpdatePost")
                .field(FieldSpec::new("id", FieldType::Int { bits: 64 }).source(Source::path("id")))
                .field(FieldSpec::new("note", FieldType::String))
                .field(
                    FieldSpec::new("title", FieldType::String)
                        .source(Source::json("title"))
                        .validate("required,min=3"),
                )
                .field(FieldSpec::new("user", FieldType::String).source(Source::dependency("auth.UserID"))),
        )
        .unwrap();

        let names: Vec<_> = plan.slots().iter().map(FieldSlot::name).collect();
        assert_eq!(names, ["id", "title", "user"]);
        assert_eq!(plan.slots()[1].index(), 2);
        assert!(plan.reads_body());
        assert_eq!(plan.rules().get("title"), Some("required,min=3"));
        assert_eq!(plan.dependencies(), ["auth"]);
        assert_eq!(plan.response_type(), "Response");
    }

    #[test]
    fn test_inert_field_rules_are_kept() {
        let plan = compile(
            Schema::new("Req").field(FieldSpec::new("note", FieldType::String).validate("max=10")),
        )
        .unwrap();
        assert!(plan.slots().is_empty());
        assert_eq!(plan.rules().get("note"), Some("max=10"));
        assert!(!plan.reads_body());
    }

    #[test]
    fn test_rejects_conflicting_sources() {
        let err = compile(
            Schema::new("Req").field(
                FieldSpec::new("id", FieldType::String)
                    .source(Source::path("id"))
                    .source(Source::query("id")),
            ),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::ConflictingSources {
                first: SourceKind::Path,
                second: SourceKind::Query,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_empty_names() {
        let err = compile(
            Schema::new("Req").field(FieldSpec::new("q", FieldType::String).source(Source::query(""))),
        )
        .unwrap_err();
        assert!(matches!(err, RegistrationError::EmptySourceName { .. }));

        let err = compile(
            Schema::new("Req")
                .field(FieldSpec::new("u", FieldType::String).source(Source::dependency(".id"))),
        )
        .unwrap_err();
        assert!(matches!(err, RegistrationError::EmptySourceName { .. }));
    }

    #[test]
    fn test_rejects_empty_dependency_segment() {
        let err = compile(
            Schema::new("Req")
                .field(FieldSpec::new("u", FieldType::String).source(Source::dependency("auth."))),
        )
        .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidDependencyPath { .. }));
    }

    #[test]
    fn test_rejects_struct_from_query() {
        let err = compile(
            Schema::new("Req").field(FieldSpec::new("filter", FieldType::Struct).source(Source::query("filter"))),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::UnsupportedFieldType {
                source_kind: SourceKind::Query,
                ..
            }
        ));

        // Structs are fine from the body.
        assert!(compile(
            Schema::new("Req").field(FieldSpec::new("filter", FieldType::Struct).source(Source::json("filter"))),
        )
        .is_ok());
    }

    #[test]
    fn test_rejects_duplicate_field() {
        let err = compile(
            Schema::new("Req")
                .field(FieldSpec::new("id", FieldType::String))
                .field(FieldSpec::new("id", FieldType::String)),
        )
        .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateField { .. }));
    }

    #[test]
    fn test_rejects_unknown_rule() {
        let err = compile(
            Schema::new("Req").field(FieldSpec::new("id", FieldType::String).validate("required,shiny")),
        )
        .unwrap_err();
        assert!(matches!(err, RegistrationError::UnknownRule { .. }));
        assert!(err.to_string().contains("shiny"));
    }

    #[test]
    fn test_noop_validator_accepts_any_rule() {
        let schema =
            Schema::new("Req").field(FieldSpec::new("id", FieldType::String).validate("shiny"));
        assert!(compile_schema(&schema, "Response", &NoopValidator).is_ok());
    }
}
