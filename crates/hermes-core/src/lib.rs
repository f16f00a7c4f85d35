//! # Hermes Core
//!
//! Core types and traits for the Hermes handler binding engine.
//!
//! - [`Value`] / [`FieldType`] - dynamic values and the field types they bind into
//! - [`Schema`] / [`Bindable`] - explicit description of a request type
//! - [`RequestContext`] - per-request identity and cancellation
//! - [`HermesError`] - the error kinds surfaced to the error handler
//! - [`Validator`] - validation port, with [`RuleValidator`] and [`NoopValidator`]
//! - [`Handler`] - the business function behind a route

#![doc(html_root_url = "https://docs.rs/hermes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod extraction;
mod handler;
mod schema;
pub mod validation;
mod value;

pub use context::{RequestContext, RequestId};
pub use error::{
    ApiError, AssignError, ErrorCategory, ErrorEnvelope, FieldErrors, HermesError, HermesResult,
    RegistrationError, ValidationError, INTERNAL_ERROR_MESSAGE,
};
pub use extraction::ExtractionError;
pub use handler::Handler;
pub use schema::{Bindable, DependencyRef, Empty, FieldSpec, Schema, Source, SourceKind};
pub use validation::{NoopValidator, RuleTable, RuleValidator, Validator};
pub use value::{FieldType, Value, ValueError};
