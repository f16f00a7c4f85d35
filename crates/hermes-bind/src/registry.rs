//! Dependency registry.
//!
//! Dependencies are named, compiled once against their own request type and
//! stored here. After startup the registry is shared read-only between all
//! request tasks.

use crate::binder::bind_fields;
use crate::introspect::compile;
use crate::plan::BindingPlan;
use crate::resolver::{DependencyResolver, ResolvedDependencies};
use futures_util::future::BoxFuture;
use hermes_core::{
    Bindable, HermesError, HermesResult, RegistrationError, RequestContext, Validator, Value,
};
use hermes_extract::ExtractionContext;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A named, injectable computation.
///
/// A dependency declares its own request type, bound from the same inbound
/// request as the handler (and possibly from other dependencies), and
/// produces an output that handler fields can reference as `dep = "name"` or
/// `dep = "name.Field"`.
///
/// # Example
///
/// ```
/// use hermes_core::{Bindable, Empty, HermesResult, RequestContext};
/// use hermes_bind::Dependency;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Clock {
///     now: u64,
/// }
///
/// struct ClockDependency;
///
/// impl Dependency for ClockDependency {
///     type Request = Empty;
///     type Output = Clock;
///
///     async fn resolve(&self, _ctx: RequestContext, _req: Empty) -> HermesResult<Clock> {
///         Ok(Clock { now: 1_700_000_000 })
///     }
/// }
/// ```
pub trait Dependency: Send + Sync + 'static {
    /// The dependency's own request type.
    type Request: Bindable;
    /// The computed result.
    type Output: Serialize + Send + 'static;

    /// Computes the result.
    ///
    /// Errors are returned to the caller unchanged.
    fn resolve(
        &self,
        ctx: RequestContext,
        request: Self::Request,
    ) -> impl Future<Output = HermesResult<Self::Output>> + Send;
}

/// Object-safe view of a [`Dependency`].
trait ErasedDependency: Send + Sync {
    fn call<'a>(
        &'a self,
        plan: &'a BindingPlan,
        resolver: &'a DependencyResolver,
        request: &'a RequestContext,
        source: &'a ExtractionContext,
        scope: &'a mut ResolvedDependencies,
    ) -> BoxFuture<'a, HermesResult<Value>>;
}

struct DependencyAdapter<D>(D);

impl<D: Dependency> ErasedDependency for DependencyAdapter<D> {
    fn call<'a>(
        &'a self,
        plan: &'a BindingPlan,
        resolver: &'a DependencyResolver,
        request: &'a RequestContext,
        source: &'a ExtractionContext,
        scope: &'a mut ResolvedDependencies,
    ) -> BoxFuture<'a, HermesResult<Value>> {
        Box::pin(async move {
            let input: D::Request = bind_fields(resolver, plan, request, source, scope).await?;
            let output = self.0.resolve(request.clone(), input).await?;
            Value::from_serialize(&output).map_err(|e| {
                HermesError::internal_with_source(
                    format!("result of {} is not serializable", plan.response_type()),
                    e,
                )
            })
        })
    }
}

/// A dependency compiled at registration: its binding plan plus the owning
/// instance.
pub struct CompiledDependency {
    name: String,
    plan: BindingPlan,
    instance: Box<dyn ErasedDependency>,
}

impl CompiledDependency {
    /// Compiles `dependency` under `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] if the dependency's request type is
    /// malformed.
    pub fn new<D: Dependency>(
        name: impl Into<String>,
        dependency: D,
        validator: &dyn Validator,
    ) -> Result<Self, RegistrationError> {
        Ok(Self {
            name: name.into(),
            plan: compile::<D::Request, D::Output>(validator)?,
            instance: Box::new(DependencyAdapter(dependency)),
        })
    }

    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binding plan of the dependency's request type.
    #[must_use]
    pub fn plan(&self) -> &BindingPlan {
        &self.plan
    }

    /// Binds the dependency's request, validates it and invokes it.
    pub(crate) fn invoke<'a>(
        &'a self,
        resolver: &'a DependencyResolver,
        request: &'a RequestContext,
        source: &'a ExtractionContext,
        scope: &'a mut ResolvedDependencies,
    ) -> BoxFuture<'a, HermesResult<Value>> {
        self.instance
            .call(&self.plan, resolver, request, source, scope)
    }
}

impl fmt::Debug for CompiledDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledDependency")
            .field("name", &self.name)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

/// Name-keyed table of compiled dependencies.
///
/// # Example
///
/// ```
/// use hermes_bind::{Dependency, DependencyRegistry};
/// use hermes_core::{Empty, HermesResult, RequestContext, RuleValidator};
///
/// struct Version;
///
/// impl Dependency for Version {
///     type Request = Empty;
///     type Output = &'static str;
///
///     async fn resolve(&self, _ctx: RequestContext, _req: Empty) -> HermesResult<&'static str> {
///         Ok("1.0")
///     }
/// }
///
/// let mut registry = DependencyRegistry::new();
/// registry.register("version", Version, &RuleValidator::new()).unwrap();
///
/// assert!(registry.get("version").is_some());
/// assert!(registry.register("version", Version, &RuleValidator::new()).is_err());
/// ```
#[derive(Debug, Default)]
pub struct DependencyRegistry {
    dependencies: HashMap<String, Arc<CompiledDependency>>,
}

impl DependencyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and registers a dependency.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] if the name is empty or taken, or the
    /// dependency's request type is malformed.
    pub fn register<D: Dependency>(
        &mut self,
        name: impl Into<String>,
        dependency: D,
        validator: &dyn Validator,
    ) -> Result<(), RegistrationError> {
        let name = name.into();
        if name.is_empty() || name.contains('.') {
            return Err(RegistrationError::InvalidDependencyName { name });
        }
        if self.dependencies.contains_key(&name) {
            return Err(RegistrationError::DuplicateDependency { name });
        }
        let compiled = CompiledDependency::new(name.clone(), dependency, validator)?;
        self.dependencies.insert(name, Arc::new(compiled));
        Ok(())
    }

    /// Looks up a dependency by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<CompiledDependency>> {
        self.dependencies.get(name)
    }

    /// Returns `true` if a dependency with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Number of registered dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Returns `true` if binding `plan` reads the JSON body, either directly
    /// or through any transitively referenced dependency.
    #[must_use]
    pub fn needs_body(&self, plan: &BindingPlan) -> bool {
        let mut visited = HashSet::new();
        self.needs_body_inner(plan, &mut visited)
    }

    fn needs_body_inner<'a>(&'a self, plan: &'a BindingPlan, visited: &mut HashSet<&'a str>) -> bool {
        if plan.reads_body() {
            return true;
        }
        plan.dependencies().into_iter().any(|name| {
            visited.insert(name)
                && self
                    .get(name)
                    .is_some_and(|dep| self.needs_body_inner(dep.plan(), visited))
        })
    }

    /// Dependency names referenced by `plan` (transitively) that are not
    /// registered.
    #[must_use]
    pub fn missing(&self, plan: &BindingPlan) -> Vec<String> {
        let mut missing = Vec::new();
        let mut visited = HashSet::new();
        let mut pending: Vec<&str> = plan.dependencies();
        while let Some(name) = pending.pop() {
            if !visited.insert(name) {
                continue;
            }
            match self.get(name) {
                Some(dep) => pending.extend(dep.plan().dependencies()),
                None => missing.push(name.to_string()),
            }
        }
        missing
    }
}
