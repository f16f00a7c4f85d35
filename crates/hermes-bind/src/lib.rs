//! # Hermes Bind
//!
//! The handler binding engine: compiles request types into binding plans at
//! registration time and populates them at request time.
//!
//! - [`compile`] - the introspector, producing a [`BindingPlan`]
//! - [`Dependency`] / [`DependencyRegistry`] - named, compiled dependencies
//! - [`DependencyResolver`] / [`ResolvedDependencies`] - per-request,
//!   memoized dependency resolution
//! - [`Binder`] - fills and validates a request value from a plan
//!
//! ## Example
//!
//! ```
//! use hermes_bind::{compile, Binder, DependencyRegistry, DependencyResolver, ResolvedDependencies};
//! use hermes_core::{AssignError, Bindable, FieldSpec, FieldType, RequestContext, RuleValidator, Schema, Source, Value};
//! use hermes_extract::ExtractionContext;
//! use serde::Serialize;
//! use std::sync::Arc;
//!
//! #[derive(Default, Serialize)]
//! struct GetPost {
//!     id: i64,
//! }
//!
//! impl Bindable for GetPost {
//!     fn schema() -> Schema {
//!         Schema::new("GetPost")
//!             .field(FieldSpec::new("id", FieldType::Int { bits: 64 }).source(Source::path("id")).validate("gt=0"))
//!     }
//!
//!     fn assign(&mut self, field: &str, value: Value) -> Result<(), AssignError> {
//!         match field {
//!             "id" => self.id = value.decode().map_err(|e| AssignError::new(field, e))?,
//!             _ => return Err(AssignError::unknown_field(field)),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let validator = Arc::new(RuleValidator::new());
//! let plan = compile::<GetPost, ()>(validator.as_ref()).unwrap();
//! let binder = Binder::new(DependencyResolver::new(Arc::new(DependencyRegistry::new()), validator));
//!
//! let source = ExtractionContext::builder().path_param("id", "7").build();
//! let mut scope = ResolvedDependencies::new();
//! let post: GetPost = tokio_test::block_on(
//!     binder.bind(&plan, &RequestContext::mock(), &source, &mut scope),
//! ).unwrap();
//! assert_eq!(post.id, 7);
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-bind/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod introspect;
mod plan;
mod registry;
mod resolver;

pub use binder::Binder;
pub use introspect::{compile, compile_schema};
pub use plan::{BindingPlan, FieldSlot};
pub use registry::{CompiledDependency, Dependency, DependencyRegistry};
pub use resolver::{DependencyResolver, ResolvedDependencies};
