//! Dependency resolution.
//!
//! [`DependencyResolver::resolve`] turns a dependency name into its result
//! for one inbound request. Results are memoized in the request's
//! [`ResolvedDependencies`], so each dependency runs at most once per
//! request however many fields reference it.

use crate::registry::DependencyRegistry;
use futures_util::future::BoxFuture;
use hermes_core::{HermesError, HermesResult, RequestContext, Validator, Value};
use hermes_extract::ExtractionContext;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Per-request dependency results.
///
/// Created empty for every inbound call and dropped with it.
#[derive(Debug, Default)]
pub struct ResolvedDependencies {
    values: HashMap<String, Value>,
    resolving: Vec<String>,
}

impl ResolvedDependencies {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result of a dependency.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns `true` if the dependency has already been resolved.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of resolved dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn enter(&mut self, name: &str) -> HermesResult<()> {
        if let Some(start) = self.resolving.iter().position(|n| n == name) {
            let mut cycle: Vec<&str> = self.resolving[start..].iter().map(String::as_str).collect();
            cycle.push(name);
            return Err(HermesError::internal(format!(
                "dependency cycle: {}",
                cycle.join(" -> ")
            )));
        }
        self.resolving.push(name.to_string());
        Ok(())
    }

    fn exit(&mut self) {
        self.resolving.pop();
    }
}

/// Resolves named dependencies against the registry.
#[derive(Clone)]
pub struct DependencyResolver {
    registry: Arc<DependencyRegistry>,
    validator: Arc<dyn Validator>,
}

impl DependencyResolver {
    /// Creates a resolver over a frozen registry.
    #[must_use]
    pub fn new(registry: Arc<DependencyRegistry>, validator: Arc<dyn Validator>) -> Self {
        Self {
            registry,
            validator,
        }
    }

    /// The registry resolved against.
    #[must_use]
    pub fn registry(&self) -> &DependencyRegistry {
        &self.registry
    }

    /// The validator applied to dependency requests.
    #[must_use]
    pub fn validator(&self) -> &dyn Validator {
        self.validator.as_ref()
    }

    /// Resolves `name` for the current request.
    ///
    /// Returns the cached result if the dependency already ran in `scope`.
    /// Otherwise binds the dependency's own request (resolving nested
    /// dependencies first), validates it, invokes the dependency and caches
    /// the result.
    ///
    /// # Errors
    ///
    /// - [`HermesError::DependencyNotFound`] for an unregistered name,
    /// - an internal error if resolution re-enters a dependency already in
    ///   progress,
    /// - any extraction, validation or business error, unchanged.
    pub fn resolve<'a>(
        &'a self,
        name: &'a str,
        request: &'a RequestContext,
        source: &'a ExtractionContext,
        scope: &'a mut ResolvedDependencies,
    ) -> BoxFuture<'a, HermesResult<Value>> {
        Box::pin(async move {
            if let Some(cached) = scope.get(name) {
                return Ok(cached.clone());
            }
            let dependency = self
                .registry
                .get(name)
                .ok_or_else(|| HermesError::dependency_not_found(name))?;

            scope.enter(name)?;
            let result = dependency.invoke(self, request, source, scope).await;
            scope.exit();
            let value = result?;

            debug!(
                request_id = %request.request_id(),
                dependency = name,
                "dependency resolved"
            );
            scope.values.insert(name.to_string(), value.clone());
            Ok(value)
        })
    }
}

impl std::fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_detection_names_the_path() {
        let mut scope = ResolvedDependencies::new();
        scope.enter("a").unwrap();
        scope.enter("b").unwrap();

        let err = scope.enter("a").unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"), "{err}");

        scope.exit();
        scope.exit();
        assert!(scope.enter("a").is_ok());
    }

    #[test]
    fn test_self_cycle() {
        let mut scope = ResolvedDependencies::new();
        scope.enter("a").unwrap();
        let err = scope.enter("a").unwrap_err();
        assert!(err.to_string().contains("a -> a"));
    }
}
