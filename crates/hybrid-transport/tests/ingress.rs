//! Ingress server and forwarder talking over loopback.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use hybrid_core::Event;
use hybrid_transport::{
    EventForwarder, EventHandler, EventRejection, EventServer, ForwarderConfig,
};

#[derive(Default)]
struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle_event(&self, event: Event) -> Result<String, EventRejection> {
        match event.str_field("conversationId") {
            None => Err(EventRejection::bad_request("missing conversationId")),
            Some("unknown") => Err(EventRejection::not_found("conversation not found")),
            Some("explode") => Err(EventRejection::internal("handler crashed")),
            Some(_) => {
                let kind = event.event_type.clone();
                self.events.lock().unwrap().push(event);
                Ok(format!("accepted {kind}"))
            }
        }
    }
}

struct Running {
    base_url: String,
    handler: Arc<RecordingHandler>,
    shutdown: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

async fn start() -> Running {
    let handler = Arc::new(RecordingHandler::default());
    let server = EventServer::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", server.local_addr());
    let shutdown = CancellationToken::new();

    let task = tokio::spawn({
        let handler = handler.clone();
        let shutdown = shutdown.clone();
        async move {
            server.serve(handler, shutdown).await.unwrap();
        }
    });

    Running {
        base_url,
        handler,
        shutdown,
        task,
    }
}

async fn post(url: &str, body: &'static str) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(url)
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let running = start().await;

    let body: Value = reqwest::get(format!("{}/health", running.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));

    running.shutdown.cancel();
    running.task.await.unwrap();
}

#[tokio::test]
async fn test_ingress_status_mapping() {
    let running = start().await;
    let url = format!("{}/blockchain-event", running.base_url);

    let (status, body) = post(&url, "{ not json").await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let unknown = r#"{"type":"transfer","data":{"conversationId":"unknown"}}"#;
    let (status, body) = post(&url, unknown).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "conversation not found");

    let explode = r#"{"type":"transfer","data":{"conversationId":"explode"}}"#;
    let (status, _) = post(&url, explode).await;
    assert_eq!(status, 500);

    let (status, body) = post(&url, r#"{"type":"transfer","data":{"conversationId":"c1"}}"#).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "accepted transfer");

    running.shutdown.cancel();
    running.task.await.unwrap();
}

#[tokio::test]
async fn test_forwarder_delivers_to_server() {
    let running = start().await;
    let forwarder = EventForwarder::new(
        ForwarderConfig::new(format!("{}/", running.base_url)).with_api_key("k"),
    )
    .unwrap();

    let delivered = forwarder
        .forward_event(&Event::new("mint").with("conversationId", "c9"))
        .await;
    assert!(delivered);

    let rejected = forwarder
        .forward_event(&Event::new("mint").with("conversationId", "unknown"))
        .await;
    assert!(!rejected);

    let events = running.handler.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "mint");
    drop(events);

    running.shutdown.cancel();
    running.task.await.unwrap();
}
