//! Request binding.
//!
//! The [`Binder`] walks a [`BindingPlan`] in declaration order, asks each
//! slot's extractor (or the resolver, for dependency slots) for a value,
//! assigns it into a fresh request value and finally validates the result.

use crate::plan::{BindingPlan, FieldSlot};
use crate::resolver::{DependencyResolver, ResolvedDependencies};
use hermes_core::{
    AssignError, Bindable, ExtractionError, HermesError, HermesResult, RequestContext, SourceKind,
    ValidationError,
};
use hermes_extract::{Extract, ExtractionContext, FieldExtractor};

/// Populates and validates request values.
///
/// Cloning is cheap; the registry and validator are shared.
#[derive(Debug, Clone)]
pub struct Binder {
    resolver: DependencyResolver,
}

impl Binder {
    /// Creates a binder resolving dependencies with `resolver`.
    #[must_use]
    pub fn new(resolver: DependencyResolver) -> Self {
        Self { resolver }
    }

    /// The dependency resolver.
    #[must_use]
    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    /// Binds one request value.
    ///
    /// # Errors
    ///
    /// The first extraction, resolution or assignment failure aborts binding.
    /// If the populated value breaks a rule, a [`ValidationError`] is
    /// returned and nothing is invoked.
    pub async fn bind<T: Bindable>(
        &self,
        plan: &BindingPlan,
        request: &RequestContext,
        source: &ExtractionContext,
        scope: &mut ResolvedDependencies,
    ) -> HermesResult<T> {
        bind_fields(&self.resolver, plan, request, source, scope).await
    }
}

pub(crate) async fn bind_fields<T: Bindable>(
    resolver: &DependencyResolver,
    plan: &BindingPlan,
    request: &RequestContext,
    source: &ExtractionContext,
    scope: &mut ResolvedDependencies,
) -> HermesResult<T> {
    let mut value = T::default();

    for slot in plan.slots() {
        let produced = match slot.extractor() {
            FieldExtractor::Dependency(dep) => {
                let reference = dep.reference();
                let resolved = resolver
                    .resolve(reference.name(), request, source, &mut *scope)
                    .await?;
                reference.select(&resolved)
            }
            extractor => extractor.extract(source)?,
        };

        // Absent values leave the field at its default.
        let Some(produced) = produced.filter(|v| !v.is_null()) else {
            continue;
        };
        value
            .assign(slot.name(), produced)
            .map_err(|e| assign_error(plan, slot, e))?;
    }

    validate(resolver, plan, &value)?;
    Ok(value)
}

fn assign_error(plan: &BindingPlan, slot: &FieldSlot, error: AssignError) -> HermesError {
    match slot.kind() {
        SourceKind::Dependency => HermesError::internal_with_source(
            format!(
                "{}.{}: dependency {} does not fit the field",
                plan.type_name(),
                slot.name(),
                slot.extractor().source_name()
            ),
            error,
        ),
        kind => ExtractionError::invalid_type(
            kind,
            slot.extractor().source_name(),
            error.reason().to_string(),
        )
        .into(),
    }
}

fn validate<T: Bindable>(
    resolver: &DependencyResolver,
    plan: &BindingPlan,
    value: &T,
) -> HermesResult<()> {
    if plan.rules().is_empty() {
        return Ok(());
    }
    let snapshot = value.field_values().map_err(|e| {
        HermesError::internal_with_source(
            format!("{} cannot be validated", plan.type_name()),
            e,
        )
    })?;
    match resolver.validator().validate(&snapshot, plan.rules()) {
        Some(errors) => Err(ValidationError::new(errors).into()),
        None => Ok(()),
    }
}
