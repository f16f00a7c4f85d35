//! A small blog API with an auth dependency chained into a rate limiter.
//!
//! ```text
//! cargo run -p hermes --example blog_api
//! curl -X POST localhost:8080/api/posts \
//!      -H 'Authorization: Bearer valid-token' \
//!      -d '{"title": "Hello", "content": "First post", "tags": ["intro"]}'
//! ```

use hermes::prelude::*;
use http::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize)]
struct AuthUser {
    #[serde(rename = "UserID")]
    user_id: String,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Role")]
    role: String,
}

#[derive(Default, Serialize, Bindable)]
struct AuthRequest {
    #[bind(header = "Authorization")]
    token: String,
}

struct Auth {
    tokens: HashMap<&'static str, AuthUser>,
}

impl Auth {
    fn new() -> Self {
        let user = |id: &str, name: &str, role: &str| AuthUser {
            user_id: id.into(),
            username: name.into(),
            role: role.into(),
        };
        Self {
            tokens: HashMap::from([
                ("Bearer valid-token", user("user-123", "john_doe", "admin")),
                ("Bearer author-token", user("user-456", "jane_smith", "author")),
            ]),
        }
    }
}

impl Dependency for Auth {
    type Request = AuthRequest;
    type Output = AuthUser;

    async fn resolve(&self, _ctx: RequestContext, req: AuthRequest) -> HermesResult<AuthUser> {
        if req.token.is_empty() {
            return Err(
                ApiError::new(StatusCode::UNAUTHORIZED, "Authorization header is required").into(),
            );
        }
        self.tokens.get(req.token.as_str()).cloned().ok_or_else(|| {
            ApiError::new(StatusCode::UNAUTHORIZED, "Invalid authentication token").into()
        })
    }
}

#[derive(Serialize)]
struct Quota {
    remaining: u32,
}

#[derive(Default, Serialize, Bindable)]
struct RateLimitRequest {
    #[bind(dep = "auth.UserID")]
    user_id: String,
}

struct RateLimit {
    limit: u32,
    used: Mutex<HashMap<String, u32>>,
}

impl Dependency for RateLimit {
    type Request = RateLimitRequest;
    type Output = Quota;

    async fn resolve(&self, _ctx: RequestContext, req: RateLimitRequest) -> HermesResult<Quota> {
        let mut used = self
            .used
            .lock()
            .map_err(|_| HermesError::internal("rate limit state poisoned"))?;
        let count = used.entry(req.user_id).or_insert(0);
        *count += 1;
        self.limit
            .checked_sub(*count)
            .map(|remaining| Quota { remaining })
            .ok_or_else(|| ApiError::new(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into())
    }
}

#[derive(Serialize)]
struct Post {
    id: u64,
    title: String,
    content: String,
    author: String,
    tags: Vec<String>,
    draft: bool,
}

#[derive(Default, Serialize, Bindable)]
struct CreatePost {
    #[bind(dep = "auth.Username")]
    author: String,
    #[bind(dep = "rate_limit.remaining")]
    remaining: u32,
    #[bind(json = "title", validate = "required,min=3,max=200")]
    title: String,
    #[bind(json = "content", validate = "required")]
    content: String,
    #[bind(json = "tags")]
    tags: Vec<String>,
    #[bind(json = "draft")]
    draft: bool,
}

#[derive(Default, Serialize, Bindable)]
struct ListPosts {
    #[bind(query = "page", validate = "min=1")]
    page: Option<u32>,
    #[bind(query = "tags")]
    tags: Vec<String>,
}

async fn list_posts(_ctx: RequestContext, req: ListPosts) -> HermesResult<serde_json::Value> {
    Ok(serde_json::json!({
        "page": req.page.unwrap_or(1),
        "tags": req.tags,
        "posts": [],
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::default().with_env_overrides()?;
    init_logging(config.log())?;

    let next_id = Arc::new(AtomicU64::new(1));
    let create_post = move |_ctx: RequestContext, req: CreatePost| {
        let id = next_id.fetch_add(1, Ordering::Relaxed);
        async move {
            Ok::<_, HermesError>(Post {
                id,
                title: req.title,
                content: req.content,
                author: req.author,
                tags: req.tags,
                draft: req.draft,
            })
        }
    };

    let mut app = App::new().with_config(config);
    app.register_dependency("auth", Auth::new())?;
    app.register_dependency(
        "rate_limit",
        RateLimit {
            limit: 10,
            used: Mutex::new(HashMap::new()),
        },
    )?;

    let mut api = app.group("/api");
    api.get("/posts", list_posts)?;
    api.post("/posts", create_post)?;

    Server::new(app.build()).run().await?;
    Ok(())
}
