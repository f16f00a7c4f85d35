//! Streams synthetic system alerts as server-sent events.
//!
//! ```text
//! cargo run -p hermes --example alerts
//! curl -N -X POST localhost:8080/alerts/stream -d '{"min_level": "warning"}'
//! ```

use futures_util::{stream, StreamExt};
use hermes::prelude::*;
use std::time::Duration;

#[derive(Serialize)]
struct Alert {
    level: &'static str,
    service: String,
    message: &'static str,
}

#[derive(Default, Serialize, Bindable)]
struct AlertStream {
    #[bind(json = "services")]
    services: Vec<String>,
    #[bind(json = "min_level")]
    min_level: Option<String>,
}

const LEVELS: [&str; 3] = ["info", "warning", "error"];

fn rank(level: &str) -> usize {
    LEVELS.iter().position(|l| *l == level).unwrap_or(0)
}

async fn stream_alerts(_ctx: RequestContext, req: AlertStream) -> HermesResult<EventStream<Alert>> {
    let services = if req.services.is_empty() {
        vec!["api-gateway".to_string(), "database".to_string(), "cache".to_string()]
    } else {
        req.services
    };
    let min = rank(req.min_level.as_deref().unwrap_or("info"));

    let alerts = stream::unfold(0usize, move |n| async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Some((n, n + 1))
    })
    .filter_map(move |n| {
        let level = LEVELS[n % LEVELS.len()];
        let alert = (rank(level) >= min).then(|| {
            Event::new(Alert {
                level,
                service: services[n % services.len()].clone(),
                message: "synthetic alert",
            })
            .event(format!("alert-{level}"))
            .id(format!("alert-{n}"))
            .retry(Duration::from_secs(5))
        });
        async move { alert }
    });

    Ok(alerts.boxed())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::default().with_env_overrides()?;
    init_logging(config.log())?;

    let mut app = App::new().with_config(config);
    app.sse_post("/alerts/stream", stream_alerts)?;

    Server::new(app.build()).run().await?;
    Ok(())
}
