//! Registration-time failures.

use hermes_bind::Dependency;
use hermes_core::{Empty, HermesResult, RegistrationError, RequestContext};
use hermes_macros::Bindable;
use hermes_server::App;
use serde::Serialize;

async fn noop(_ctx: RequestContext, _req: Empty) -> HermesResult<()> {
    Ok(())
}

#[derive(Default, Serialize, Bindable)]
struct BadQuery {
    #[bind(query = "filter")]
    filter: Option<serde_json::Value>,
}

async fn bad_query(_ctx: RequestContext, _req: BadQuery) -> HermesResult<()> {
    Ok(())
}

#[derive(Default, Serialize, Bindable)]
struct UnknownRule {
    #[bind(query = "q", validate = "shiny")]
    q: String,
}

async fn unknown_rule(_ctx: RequestContext, _req: UnknownRule) -> HermesResult<()> {
    Ok(())
}

#[derive(Default, Serialize, Bindable)]
struct EmptyDependencySegment {
    #[bind(dep = "auth..id")]
    id: String,
}

async fn empty_segment(_ctx: RequestContext, _req: EmptyDependencySegment) -> HermesResult<()> {
    Ok(())
}

struct Clock;

impl Dependency for Clock {
    type Request = Empty;
    type Output = u64;

    async fn resolve(&self, _ctx: RequestContext, _req: Empty) -> HermesResult<u64> {
        Ok(0)
    }
}

struct BadClock;

impl Dependency for BadClock {
    type Request = BadQuery;
    type Output = u64;

    async fn resolve(&self, _ctx: RequestContext, _req: BadQuery) -> HermesResult<u64> {
        Ok(0)
    }
}

#[test]
fn test_duplicate_route() {
    let mut app = App::new();
    app.get("/a/{x}", noop).unwrap();
    let err = app.get("/a/{y}", noop).unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateRoute { .. }));

    // Same path, different method.
    app.post("/a/{x}", noop).unwrap();
}

#[test]
fn test_invalid_route() {
    let mut app = App::new();
    let err = app.get("no-slash", noop).unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidRoute { .. }));
}

#[test]
fn test_unsupported_field_type() {
    let mut app = App::new();
    let err = app.get("/q", bad_query).unwrap_err();
    assert!(matches!(err, RegistrationError::UnsupportedFieldType { .. }));
}

#[test]
fn test_unknown_rule() {
    let mut app = App::new();
    let err = app.get("/q", unknown_rule).unwrap_err();
    assert!(matches!(err, RegistrationError::UnknownRule { .. }));
}

#[test]
fn test_invalid_dependency_reference() {
    let mut app = App::new();
    let err = app.get("/q", empty_segment).unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidDependencyPath { .. }));
}

#[test]
fn test_dependency_registration() {
    let mut app = App::new();
    app.register_dependency("clock", Clock).unwrap();

    let err = app.register_dependency("clock", Clock).unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateDependency { .. }));

    let err = app.register_dependency("a.b", Clock).unwrap_err();
    assert!(matches!(err, RegistrationError::InvalidDependencyName { .. }));

    let err = app.register_dependency("bad_clock", BadClock).unwrap_err();
    assert!(matches!(err, RegistrationError::UnsupportedFieldType { .. }));
}
