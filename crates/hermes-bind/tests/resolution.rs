//! Binding and dependency resolution across whole request graphs.

use hermes_bind::{
    compile, Binder, Dependency, DependencyRegistry, DependencyResolver, ResolvedDependencies,
};
use hermes_core::{
    ApiError, Empty, ErrorCategory, HermesError, HermesResult, RequestContext, RuleValidator,
    SourceKind, Validator,
};
use hermes_extract::ExtractionContext;
use hermes_macros::Bindable;
use http::{StatusCode, Uri};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
struct AuthInfo {
    #[serde(rename = "UserID")]
    user_id: String,
    #[serde(rename = "Username")]
    username: String,
}

#[derive(Default, Serialize, Bindable)]
struct AuthRequest {
    #[bind(header = "Authorization")]
    token: String,
}

struct AuthDependency {
    calls: Arc<AtomicUsize>,
}

impl Dependency for AuthDependency {
    type Request = AuthRequest;
    type Output = AuthInfo;

    async fn resolve(&self, _ctx: RequestContext, req: AuthRequest) -> HermesResult<AuthInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if req.token.is_empty() {
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, "missing token")
                .with_code("UNAUTHORIZED")
                .into());
        }
        Ok(AuthInfo {
            user_id: "u1".into(),
            username: "john".into(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct Profile {
    owner: String,
    limit: i64,
}

#[derive(Default, Serialize, Bindable)]
struct ProfileRequest {
    #[bind(dep = "auth.UserID")]
    owner: String,
    #[bind(query = "limit", validate = "lte=50")]
    limit: i64,
}

struct ProfileDependency;

impl Dependency for ProfileDependency {
    type Request = ProfileRequest;
    type Output = Profile;

    async fn resolve(&self, _ctx: RequestContext, req: ProfileRequest) -> HermesResult<Profile> {
        Ok(Profile {
            owner: req.owner,
            limit: req.limit,
        })
    }
}

#[derive(Default, Serialize, Bindable)]
struct ListPosts {
    #[bind(dep = "auth.UserID")]
    user_id: String,
    #[bind(dep = "auth.Missing")]
    missing: String,
    #[bind(dep = "profile")]
    profile: Option<serde_json::Value>,
    #[bind(dep = "profile.limit")]
    limit: i64,
}

struct Fixture {
    binder: Binder,
    calls: Arc<AtomicUsize>,
}

fn fixture() -> Fixture {
    let validator: Arc<dyn Validator> = Arc::new(RuleValidator::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = DependencyRegistry::new();
    registry
        .register(
            "auth",
            AuthDependency {
                calls: Arc::clone(&calls),
            },
            validator.as_ref(),
        )
        .unwrap();
    registry
        .register("profile", ProfileDependency, validator.as_ref())
        .unwrap();

    Fixture {
        binder: Binder::new(DependencyResolver::new(Arc::new(registry), validator)),
        calls,
    }
}

fn source(uri: &'static str, token: &str) -> ExtractionContext {
    ExtractionContext::builder()
        .uri(Uri::from_static(uri))
        .header("authorization", token)
        .build()
}

async fn bind_list_posts(fixture: &Fixture, source: &ExtractionContext) -> HermesResult<ListPosts> {
    let plan = compile::<ListPosts, ()>(fixture.binder.resolver().validator()).unwrap();
    let mut scope = ResolvedDependencies::new();
    fixture
        .binder
        .bind(&plan, &RequestContext::mock(), source, &mut scope)
        .await
}

#[tokio::test]
async fn test_shared_dependency_runs_once() {
    let fixture = fixture();
    let posts = bind_list_posts(&fixture, &source("/posts?limit=20", "Bearer t"))
        .await
        .unwrap();

    // `auth` is referenced twice directly and once through `profile`.
    assert_eq!(fixture.calls.load(Ordering::SeqCst), 1);
    assert_eq!(posts.user_id, "u1");
    assert_eq!(posts.limit, 20);
    assert_eq!(
        posts.profile,
        Some(serde_json::json!({"owner": "u1", "limit": 20}))
    );
}

#[tokio::test]
async fn test_missing_nested_field_is_absent() {
    let fixture = fixture();
    let posts = bind_list_posts(&fixture, &source("/posts", "Bearer t"))
        .await
        .unwrap();
    assert_eq!(posts.missing, "");
}

#[tokio::test]
async fn test_each_request_gets_fresh_results() {
    let fixture = fixture();
    bind_list_posts(&fixture, &source("/posts", "Bearer t")).await.unwrap();
    bind_list_posts(&fixture, &source("/posts", "Bearer t")).await.unwrap();
    assert_eq!(fixture.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_business_error_passes_through_unchanged() {
    let fixture = fixture();
    let err = bind_list_posts(&fixture, &source("/posts", "")).await.err().unwrap();

    let HermesError::Api(api) = err else {
        panic!("expected business error, got {err:?}");
    };
    assert_eq!(api.status, StatusCode::UNAUTHORIZED);
    assert_eq!(api.code.as_deref(), Some("UNAUTHORIZED"));
}

#[tokio::test]
async fn test_nested_validation_error_keeps_fields() {
    let fixture = fixture();
    let err = bind_list_posts(&fixture, &source("/posts?limit=99", "Bearer t"))
        .await
        .err()
        .unwrap();

    let HermesError::Validation(validation) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(validation.code, "VALIDATION_ERROR");
    assert_eq!(
        validation.fields.get("limit").unwrap(),
        ["failed lte validation"]
    );
}

#[tokio::test]
async fn test_extraction_error_in_dependency() {
    let fixture = fixture();
    let err = bind_list_posts(&fixture, &source("/posts?limit=many", "Bearer t"))
        .await
        .err()
        .unwrap();

    let HermesError::Extraction(extraction) = err else {
        panic!("expected extraction error, got {err:?}");
    };
    assert_eq!(extraction.extraction_source(), SourceKind::Query);
    assert_eq!(extraction.field(), Some("limit"));
}

#[derive(Default, Serialize, Bindable)]
struct NeedsUnknown {
    #[bind(dep = "session")]
    session: String,
}

#[tokio::test]
async fn test_unknown_dependency() {
    let fixture = fixture();
    let plan = compile::<NeedsUnknown, ()>(fixture.binder.resolver().validator()).unwrap();
    let mut scope = ResolvedDependencies::new();
    let err = fixture
        .binder
        .bind::<NeedsUnknown>(&plan, &RequestContext::mock(), &source("/", "t"), &mut scope)
        .await
        .err()
        .unwrap();

    assert_eq!(err.category(), ErrorCategory::DependencyNotFound);
    assert!(fixture.binder.resolver().registry().missing(&plan) == ["session"]);
}

#[derive(Default, Serialize, Bindable)]
struct WrongShape {
    #[bind(dep = "auth")]
    auth: i64,
}

#[tokio::test]
async fn test_dependency_type_mismatch_is_internal() {
    let fixture = fixture();
    let plan = compile::<WrongShape, ()>(fixture.binder.resolver().validator()).unwrap();
    let mut scope = ResolvedDependencies::new();
    let err = fixture
        .binder
        .bind::<WrongShape>(&plan, &RequestContext::mock(), &source("/", "t"), &mut scope)
        .await
        .err()
        .unwrap();

    assert_eq!(err.category(), ErrorCategory::Internal);
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[derive(Default, Serialize, Bindable)]
struct PingRequest {
    #[bind(dep = "pong")]
    pong: String,
}

#[derive(Default, Serialize, Bindable)]
struct PongRequest {
    #[bind(dep = "ping")]
    ping: String,
}

struct Ping;

impl Dependency for Ping {
    type Request = PingRequest;
    type Output = String;

    async fn resolve(&self, _ctx: RequestContext, req: PingRequest) -> HermesResult<String> {
        Ok(req.pong)
    }
}

struct Pong;

impl Dependency for Pong {
    type Request = PongRequest;
    type Output = String;

    async fn resolve(&self, _ctx: RequestContext, req: PongRequest) -> HermesResult<String> {
        Ok(req.ping)
    }
}

#[tokio::test]
async fn test_cycle_is_reported() {
    let validator: Arc<dyn Validator> = Arc::new(RuleValidator::new());
    let mut registry = DependencyRegistry::new();
    registry.register("ping", Ping, validator.as_ref()).unwrap();
    registry.register("pong", Pong, validator.as_ref()).unwrap();
    let binder = Binder::new(DependencyResolver::new(Arc::new(registry), validator));

    let plan = compile::<PingRequest, ()>(binder.resolver().validator()).unwrap();
    let mut scope = ResolvedDependencies::new();
    let err = binder
        .bind::<PingRequest>(&plan, &RequestContext::mock(), &source("/", "t"), &mut scope)
        .await
        .err()
        .unwrap();

    assert_eq!(err.category(), ErrorCategory::Internal);
    assert!(err.to_string().contains("pong -> ping -> pong"), "{err}");
}

#[test]
fn test_needs_body_is_transitive() {
    #[derive(Default, Serialize, Bindable)]
    struct BodyRequest {
        #[bind(json = "token")]
        token: String,
    }

    struct FromBody;

    impl Dependency for FromBody {
        type Request = BodyRequest;
        type Output = String;

        async fn resolve(&self, _ctx: RequestContext, req: BodyRequest) -> HermesResult<String> {
            Ok(req.token)
        }
    }

    #[derive(Default, Serialize, Bindable)]
    struct Outer {
        #[bind(dep = "body_token")]
        token: String,
    }

    let validator = RuleValidator::new();
    let mut registry = DependencyRegistry::new();
    registry.register("body_token", FromBody, &validator).unwrap();

    let outer = compile::<Outer, ()>(&validator).unwrap();
    assert!(!outer.reads_body());
    assert!(registry.needs_body(&outer));

    let empty = compile::<Empty, ()>(&validator).unwrap();
    assert!(!registry.needs_body(&empty));
}

#[derive(Default, Serialize, Bindable)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    #[bind(query = "page_size", validate = "required,gte=1")]
    page_size: i64,
    #[bind(header = "Authorization", validate = "required")]
    auth_token: String,
}

struct Quota;

impl Dependency for Quota {
    type Request = SearchRequest;
    type Output = i64;

    async fn resolve(&self, _ctx: RequestContext, req: SearchRequest) -> HermesResult<i64> {
        Ok(req.page_size * 2)
    }
}

#[derive(Default, Serialize, Bindable)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct QuotaRequest {
    #[bind(dep = "quota", validate = "required,lte=100")]
    quota_limit: i64,
}

#[tokio::test]
async fn test_validation_uses_field_names_despite_serde_renames() {
    let fixture = fixture();
    let plan = compile::<SearchRequest, ()>(fixture.binder.resolver().validator()).unwrap();

    let mut scope = ResolvedDependencies::new();
    let search = fixture
        .binder
        .bind::<SearchRequest>(
            &plan,
            &RequestContext::mock(),
            &source("/s?page_size=10", "Bearer t"),
            &mut scope,
        )
        .await
        .unwrap();
    assert_eq!(search.page_size, 10);
    assert_eq!(search.auth_token, "Bearer t");

    let mut scope = ResolvedDependencies::new();
    let err = fixture
        .binder
        .bind::<SearchRequest>(
            &plan,
            &RequestContext::mock(),
            &source("/s?page_size=-3", "Bearer t"),
            &mut scope,
        )
        .await
        .err()
        .unwrap();
    let HermesError::Validation(validation) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(validation.fields.get("page_size"), Some(&["failed gte validation".to_string()][..]));
    assert_eq!(validation.fields.len(), 1);
}

#[tokio::test]
async fn test_renamed_dependency_request_validates() {
    let validator: Arc<dyn Validator> = Arc::new(RuleValidator::new());
    let mut registry = DependencyRegistry::new();
    registry.register("quota", Quota, validator.as_ref()).unwrap();
    let binder = Binder::new(DependencyResolver::new(Arc::new(registry), validator));
    let plan = compile::<QuotaRequest, ()>(binder.resolver().validator()).unwrap();

    let mut scope = ResolvedDependencies::new();
    let request = binder
        .bind::<QuotaRequest>(
            &plan,
            &RequestContext::mock(),
            &source("/q?page_size=25", "Bearer t"),
            &mut scope,
        )
        .await
        .unwrap();
    assert_eq!(request.quota_limit, 50);

    let mut scope = ResolvedDependencies::new();
    let err = binder
        .bind::<QuotaRequest>(
            &plan,
            &RequestContext::mock(),
            &source("/q?page_size=60", "Bearer t"),
            &mut scope,
        )
        .await
        .err()
        .unwrap();
    let HermesError::Validation(validation) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(validation.fields.get("quota_limit"), Some(&["failed lte validation".to_string()][..]));
}
