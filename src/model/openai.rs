//! OpenAI Realtime API client
//!
//! Speaks the realtime WebSocket protocol: one `session.update` at open
//! carrying instructions, voice, tools, and audio options; caller audio as
//! base64 PCM16 `input_audio_buffer.append` events; tool results as
//! `function_call_output` items followed by `response.create`. Server
//! events are mapped to [`ModelEvent`]s; everything this module does not
//! understand is skipped so protocol additions stay non-breaking.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::{ModelEvent, ModelSessionOptions, ModelStream, RealtimeModel};
use crate::{Error, Result};

/// Realtime model reached over the OpenAI WebSocket protocol
#[derive(Debug, Clone)]
pub struct OpenAiRealtime {
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiRealtime {
    /// Create a client for the given endpoint
    ///
    /// A missing API key is not an error here; the server is allowed to
    /// boot without one. Opening a stream is what fails.
    #[must_use]
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RealtimeModel for OpenAiRealtime {
    async fn open(&self, options: ModelSessionOptions) -> Result<Box<dyn ModelStream>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::Model(
                "realtime model API key is not configured (OPENAI_API_KEY)".to_string(),
            ));
        };

        let url = format!("{}?model={}", self.base_url, options.model);
        let mut request = url
            .into_client_request()
            .map_err(|e| Error::Model(format!("invalid realtime endpoint: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| Error::Model(format!("invalid API key header: {e}")))?;
        request.headers_mut().insert("Authorization", bearer);

        let (ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| Error::Model(format!("realtime connect failed: {e}")))?;

        tracing::info!(model = %options.model, voice = %options.voice, "realtime model stream opened");

        let mut stream = OpenAiStream { ws };
        stream.send_event(&session_update(&options)).await?;

        Ok(Box::new(stream))
    }
}

struct OpenAiStream {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl OpenAiStream {
    async fn send_event(&mut self, event: &serde_json::Value) -> Result<()> {
        self.ws
            .send(Message::Text(event.to_string()))
            .await
            .map_err(|e| Error::Model(format!("realtime send failed: {e}")))
    }
}

#[async_trait]
impl ModelStream for OpenAiStream {
    async fn next_event(&mut self) -> Result<Option<ModelEvent>> {
        while let Some(message) = self.ws.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Some(event) = parse_event(&text) {
                        return Ok(Some(event));
                    }
                }
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => {}
                Err(e) => return Err(Error::Model(format!("realtime stream error: {e}"))),
            }
        }
        Ok(None)
    }

    async fn send_audio(&mut self, frame: Vec<u8>) -> Result<()> {
        let event = serde_json::json!({
            "type": "input_audio_buffer.append",
            "audio": BASE64.encode(&frame),
        });
        self.send_event(&event).await
    }

    async fn send_tool_result(&mut self, call_id: &str, output: &str) -> Result<()> {
        let item = serde_json::json!({
            "type": "conversation.item.create",
            "item": {
                "type": "function_call_output",
                "call_id": call_id,
                "output": output,
            },
        });
        self.send_event(&item).await?;

        // Resume generation with the result in context
        self.send_event(&serde_json::json!({ "type": "response.create" }))
            .await
    }

    async fn generate_reply(&mut self, instructions: &str) -> Result<()> {
        let event = serde_json::json!({
            "type": "response.create",
            "response": { "instructions": instructions },
        });
        self.send_event(&event).await
    }

    async fn close(&mut self) -> Result<()> {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match self.ws.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(Error::Model(format!("realtime close failed: {e}"))),
        }
    }
}

/// Build the `session.update` event sent once at stream open
fn session_update(options: &ModelSessionOptions) -> serde_json::Value {
    let tools: Vec<serde_json::Value> = options
        .tools
        .iter()
        .map(|t| {
            serde_json::json!({
                "type": "function",
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters,
            })
        })
        .collect();

    let mut session = serde_json::json!({
        "modalities": ["audio", "text"],
        "instructions": options.instructions,
        "voice": options.voice,
        "input_audio_format": "pcm16",
        "output_audio_format": "pcm16",
        "turn_detection": { "type": "server_vad" },
        "tools": tools,
        "tool_choice": "auto",
    });

    if options.noise_suppression {
        session["input_audio_noise_reduction"] = serde_json::json!({ "type": "near_field" });
    }

    serde_json::json!({ "type": "session.update", "session": session })
}

/// Map one server event to a [`ModelEvent`], or `None` for event types the
/// session loop does not act on
fn parse_event(text: &str) -> Option<ModelEvent> {
    let event: serde_json::Value = serde_json::from_str(text).ok()?;
    let event_type = event.get("type")?.as_str()?;

    match event_type {
        // Both the beta and GA spellings of the audio delta event
        "response.audio.delta" | "response.output_audio.delta" => {
            let delta = event.get("delta")?.as_str()?;
            match BASE64.decode(delta) {
                Ok(bytes) => Some(ModelEvent::AudioDelta(bytes)),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping undecodable audio delta");
                    None
                }
            }
        }
        "response.output_item.done" => {
            let item = event.get("item")?;
            if item.get("type")?.as_str()? != "function_call" {
                return None;
            }
            Some(ModelEvent::ToolCall {
                call_id: item.get("call_id")?.as_str()?.to_string(),
                name: item.get("name")?.as_str()?.to_string(),
                arguments: item.get("arguments")?.as_str()?.to_string(),
            })
        }
        "conversation.item.input_audio_transcription.completed" => Some(
            ModelEvent::UserTranscript(event.get("transcript")?.as_str()?.to_string()),
        ),
        "response.audio_transcript.done" | "response.output_audio_transcript.done" => Some(
            ModelEvent::AgentTranscript(event.get("transcript")?.as_str()?.to_string()),
        ),
        "response.done" => Some(ModelEvent::TurnComplete),
        "error" => {
            tracing::warn!(event = %text, "realtime model reported an error event");
            None
        }
        _ => None,
    }
}
