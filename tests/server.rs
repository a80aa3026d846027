//! Server accept-loop scenarios
//!
//! Runs the real server (listener, accept loop, one task per session)
//! against WebSocket clients, with the model swapped for scripted stand-ins
//! so nothing leaves the process.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;

use scribe_agent::{
    Config, Error, ModelEvent, ModelSessionOptions, ModelStream, RealtimeModel, Result, Server,
    WsListener,
};

fn test_config() -> Config {
    Config::from_lookup(|key| (key == "DATABASE_URL").then(|| ":memory:".to_string()))
        .expect("test config")
}

async fn bound_server(model: Arc<dyn RealtimeModel>) -> (String, tokio::task::JoinHandle<()>) {
    let listener = WsListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let url = format!("ws://{}/session", listener.local_addr());

    let server = Server::new(test_config()).with_model(model);
    let serve = tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    (url, serve)
}

/// Model whose stream plays one audio burst and then hangs up
struct OneBurstModel;

#[async_trait]
impl RealtimeModel for OneBurstModel {
    async fn open(&self, _options: ModelSessionOptions) -> Result<Box<dyn ModelStream>> {
        Ok(Box::new(OneBurstStream {
            events: [ModelEvent::AudioDelta(vec![7; 4]), ModelEvent::TurnComplete].into(),
        }))
    }
}

struct OneBurstStream {
    events: VecDeque<ModelEvent>,
}

#[async_trait]
impl ModelStream for OneBurstStream {
    async fn next_event(&mut self) -> Result<Option<ModelEvent>> {
        Ok(self.events.pop_front())
    }

    async fn send_audio(&mut self, _frame: Vec<u8>) -> Result<()> {
        Ok(())
    }

    async fn send_tool_result(&mut self, _call_id: &str, _output: &str) -> Result<()> {
        Ok(())
    }

    async fn generate_reply(&mut self, _instructions: &str) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Model that refuses to open any stream
struct OpenFailsModel;

#[async_trait]
impl RealtimeModel for OpenFailsModel {
    async fn open(&self, _options: ModelSessionOptions) -> Result<Box<dyn ModelStream>> {
        Err(Error::Model("no API key".to_string()))
    }
}

#[tokio::test]
async fn server_runs_a_session_end_to_end() {
    let (url, serve) = bound_server(Arc::new(OneBurstModel)).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

    let hello = ws.next().await.unwrap().unwrap();
    let Message::Text(text) = hello else {
        panic!("expected text hello, got {hello:?}");
    };
    let hello: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(hello["type"], "session.ready");

    // The model's audio burst reaches the caller through the session task
    let frame = ws.next().await.unwrap().unwrap();
    assert_eq!(frame, Message::Binary(vec![7; 4].into()));

    serve.abort();
}

#[tokio::test]
async fn failed_session_does_not_unwind_the_accept_loop() {
    let (url, serve) = bound_server(Arc::new(OpenFailsModel)).await;

    // Two callers in a row; each session dies at model open. The second
    // caller still being served proves the accept loop survived the first.
    for _ in 0..2 {
        let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

        let hello = ws.next().await.unwrap().unwrap();
        let Message::Text(text) = hello else {
            panic!("expected text hello, got {hello:?}");
        };
        let hello: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(hello["type"], "session.ready");

        // The dying session closes the socket; drain until it does
        while let Some(message) = ws.next().await {
            if matches!(message, Ok(Message::Close(_)) | Err(_)) {
                break;
            }
        }
    }

    serve.abort();
}
