//! Integration tests for the webhook surface.
//!
//! Each test spins up an Axum server on a random port and drives the
//! real HTTP contract with reqwest, using in-memory fakes for the store,
//! the message sender, and the lead sink.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use leadflow::error::{ChannelError, SinkError};
use leadflow::flow::{ConvState, FlowRunner};
use leadflow::outbound::{MessageSender, SendReceipt};
use leadflow::sink::{Lead, LeadSink};
use leadflow::store::{ConversationStore, MemoryStore};
use leadflow::webhook::webhook_routes;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const VERIFY_TOKEN: &str = "secret-token";

/// Records every outbound (recipient, text) pair.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, recipient_id: &str, text: &str) -> Result<SendReceipt, ChannelError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient_id.to_string(), text.to_string()));
        Ok(SendReceipt {
            status: 200,
            body: String::new(),
        })
    }
}

/// Records appended leads; optionally fails every append.
#[derive(Default)]
struct RecordingSink {
    rows: Mutex<Vec<Lead>>,
    fail: bool,
}

#[async_trait]
impl LeadSink for RecordingSink {
    async fn append(&self, lead: &Lead) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::RequestFailed("sheet unreachable".to_string()));
        }
        self.rows.lock().unwrap().push(lead.clone());
        Ok(())
    }
}

struct TestServer {
    base_url: String,
    store: Arc<MemoryStore>,
    sender: Arc<RecordingSender>,
    sink: Arc<RecordingSink>,
}

/// Start the webhook server on a random port with fake collaborators.
async fn start_server(sink: RecordingSink) -> TestServer {
    let store = Arc::new(MemoryStore::new());
    let sender = Arc::new(RecordingSender::default());
    let sink = Arc::new(sink);

    let flow = Arc::new(FlowRunner::new(
        Arc::clone(&store) as Arc<dyn ConversationStore>,
        Arc::clone(&sender) as Arc<dyn MessageSender>,
        Arc::clone(&sink) as Arc<dyn LeadSink>,
    ));
    let app = webhook_routes(flow, SecretString::from(VERIFY_TOKEN.to_string()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        base_url: format!("http://127.0.0.1:{port}"),
        store,
        sender,
        sink,
    }
}

/// Messenger-style envelope with one text message.
fn messaging_envelope(sender: &str, text: &str) -> Value {
    json!({
        "entry": [{
            "messaging": [{
                "sender": {"id": sender},
                "message": {"text": text}
            }]
        }]
    })
}

async fn post_webhook(server: &TestServer, body: &Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/webhook", server.base_url))
        .json(body)
        .send()
        .await
        .expect("POST /webhook failed")
}

// ── Subscription handshake ──────────────────────────────────────────────

#[tokio::test]
async fn verification_echoes_challenge() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(RecordingSink::default()).await;

        let resp = reqwest::get(format!(
            "{}/webhook?hub.mode=subscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=1158201444",
            server.base_url
        ))
        .await
        .unwrap();

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "1158201444");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn verification_rejects_wrong_token() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(RecordingSink::default()).await;

        let resp = reqwest::get(format!(
            "{}/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=123",
            server.base_url
        ))
        .await
        .unwrap();

        assert_eq!(resp.status(), 403);
        assert_eq!(resp.text().await.unwrap(), "Forbidden");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn verification_rejects_wrong_mode() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(RecordingSink::default()).await;

        let resp = reqwest::get(format!(
            "{}/webhook?hub.mode=unsubscribe&hub.verify_token={VERIFY_TOKEN}&hub.challenge=123",
            server.base_url
        ))
        .await
        .unwrap();

        assert_eq!(resp.status(), 403);
    })
    .await
    .expect("test timed out");
}

// ── Event delivery ──────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_body_still_acks_200() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(RecordingSink::default()).await;

        // Missing `entry` entirely.
        let resp = post_webhook(&server, &json!({"object": "page"})).await;
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");

        // Not JSON at all.
        let resp = reqwest::Client::new()
            .post(format!("{}/webhook", server.base_url))
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        // No messages handled, nothing sent.
        assert!(server.sender.sent.lock().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn full_capture_flow_over_http() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(RecordingSink::default()).await;

        for text in ["hello", "Jane Doe", "12345", "555-123-4567", "lose fat", "no"] {
            let resp = post_webhook(&server, &messaging_envelope("u1", text)).await;
            assert_eq!(resp.status(), 200);
        }

        // Record retired at completion.
        assert!(server.store.get("u1").await.unwrap().is_none());

        // Lead captured exactly once, with the raw phone text.
        let rows = server.sink.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sender_id, "u1");
        assert_eq!(rows[0].name, "Jane Doe");
        assert_eq!(rows[0].phone, "555-123-4567");
        assert_eq!(rows[0].goal, "lose fat");
        assert_eq!(rows[0].notes, "");

        // One reply per inbound message (including the short-phone re-prompt).
        assert_eq!(server.sender.sent.lock().unwrap().len(), 6);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn sink_failure_still_retires_conversation() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(RecordingSink {
            rows: Mutex::new(Vec::new()),
            fail: true,
        })
        .await;

        for text in ["hello", "Jane Doe", "5551234567", "build muscle", "no"] {
            post_webhook(&server, &messaging_envelope("u1", text)).await;
        }

        assert!(server.store.get("u1").await.unwrap().is_none());
        assert!(server.sink.rows.lock().unwrap().is_empty());

        let sent = server.sender.sent.lock().unwrap();
        let last = &sent.last().unwrap().1;
        assert!(last.contains("failed to save"), "unexpected reply: {last}");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn changes_shape_feeds_the_same_flow() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(RecordingSink::default()).await;

        let body = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "messages": [{"from": "u9", "text": {"body": "hello"}}]
                    }
                }]
            }]
        });
        let resp = post_webhook(&server, &body).await;
        assert_eq!(resp.status(), 200);

        let conv = server.store.get("u9").await.unwrap().unwrap();
        assert_eq!(conv.state, ConvState::AskName);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn batched_messages_apply_in_order() {
    timeout(TEST_TIMEOUT, async {
        let server = start_server(RecordingSink::default()).await;

        // First contact + name answer in a single delivery.
        let body = json!({
            "entry": [{
                "messaging": [
                    {"sender": {"id": "u1"}, "message": {"text": "hi"}},
                    {"sender": {"id": "u1"}, "message": {"text": "Jane Doe"}}
                ]
            }]
        });
        post_webhook(&server, &body).await;

        let conv = server.store.get("u1").await.unwrap().unwrap();
        assert_eq!(conv.state, ConvState::AskPhone);
        assert_eq!(conv.name.as_deref(), Some("Jane Doe"));
    })
    .await
    .expect("test timed out");
}
