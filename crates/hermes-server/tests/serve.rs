//! End-to-end over a real socket.

use futures_util::{stream, StreamExt};
use hermes_core::{HermesResult, RequestContext};
use hermes_macros::Bindable;
use hermes_server::{App, Server};
use hermes_sse::{Event, EventStream};
use serde::Serialize;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

#[derive(Default, Serialize, Bindable)]
struct Greet {
    #[bind(path = "name")]
    name: String,
}

async fn greet(_ctx: RequestContext, req: Greet) -> HermesResult<String> {
    Ok(format!("hello {}", req.name))
}

async fn countdown(_ctx: RequestContext, _req: Greet) -> HermesResult<EventStream<u32>> {
    Ok(stream::iter([3u32, 2, 1]).map(Event::new).boxed())
}

async fn exchange(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn start() -> (std::net::SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<()>) {
    let mut app = App::new();
    app.get("/greet/{name}", greet).unwrap();
    app.sse_get("/countdown/{name}", countdown).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = Server::new(app.build());
    let handle = tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = stop_rx.await;
            })
            .await
            .unwrap();
    });
    (addr, stop_tx, handle)
}

#[tokio::test]
async fn test_serves_json() {
    let (addr, stop, handle) = start().await;

    let response = exchange(
        addr,
        "GET /greet/ada HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains("content-type: application/json"));
    assert!(response.ends_with("\"hello ada\""));

    stop.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_serves_event_stream() {
    let (addr, stop, _handle) = start().await;

    let response = exchange(
        addr,
        "GET /countdown/x HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains("content-type: text/event-stream"));
    assert!(response.contains("access-control-allow-origin: *"));
    for n in ["3", "2", "1"] {
        assert!(response.contains(&format!("data: {n}\n\n")), "{response}");
    }

    stop.send(()).unwrap();
}

#[tokio::test]
async fn test_not_found_over_the_wire() {
    let (addr, stop, _handle) = start().await;

    let response = exchange(
        addr,
        "GET /nowhere HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 404 Not Found"), "{response}");
    assert!(response.contains("NOT_FOUND"));

    stop.send(()).unwrap();
}
