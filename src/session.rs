//! Session controller: one conversation, start to finish
//!
//! A controller owns exactly one transport room and one model stream and
//! relays between them: caller audio up, synthesized audio down, tool calls
//! dispatched inline as the model issues them. Its lifecycle is
//! `Connecting → Active → Closing → Closed`, observable through a watch
//! channel; `Closed` is terminal. Transport and model stream failures end
//! the session (a fresh connection is the recovery path); tool failures
//! never do, they come back to the model as spoken error text.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{ModelEvent, ModelSessionOptions, ModelStream, RealtimeModel};
use crate::persona::Persona;
use crate::tools::ToolRegistry;
use crate::transport::{MediaRoom, SessionRequest};
use crate::Result;

/// Lifecycle of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Awaiting transport and model attachment
    Connecting,
    /// Relaying audio and serving tool calls
    Active,
    /// Tearing down transport and model
    Closing,
    /// Done; terminal
    Closed,
}

/// Drives one conversation between a caller and the model
pub struct SessionController {
    model: Arc<dyn RealtimeModel>,
    registry: Arc<ToolRegistry>,
    persona: Persona,
    model_id: String,
    noise_suppression: bool,
    state: watch::Sender<SessionState>,
}

impl SessionController {
    /// Create a controller for one not-yet-connected session
    #[must_use]
    pub fn new(
        model: Arc<dyn RealtimeModel>,
        registry: Arc<ToolRegistry>,
        persona: Persona,
        model_id: impl Into<String>,
        noise_suppression: bool,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Connecting);
        Self {
            model,
            registry,
            persona,
            model_id: model_id.into(),
            noise_suppression,
            state,
        }
    }

    /// Observe the session lifecycle
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    fn set_state(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Run the session to completion
    ///
    /// Returns `Ok(())` on a clean remote hangup or model-side close. The
    /// state is `Closed` when this returns, on every path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` or `Error::Model` on a session-fatal
    /// stream failure. Nothing outside this session is affected.
    pub async fn run(self, request: Box<dyn SessionRequest>) -> Result<()> {
        let session_id = request.session_id().to_string();

        let mut room = match request.connect().await {
            Ok(room) => room,
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "transport handshake failed");
                self.set_state(SessionState::Closing);
                self.set_state(SessionState::Closed);
                return Err(e);
            }
        };

        let options = ModelSessionOptions {
            model: self.model_id.clone(),
            voice: self.persona.voice.clone(),
            instructions: self.persona.instructions.clone(),
            noise_suppression: self.noise_suppression,
            tools: self.registry.definitions(),
        };

        let mut stream = match self.model.open(options).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "model stream open failed");
                self.set_state(SessionState::Closing);
                let _ = room.close().await;
                self.set_state(SessionState::Closed);
                return Err(e);
            }
        };

        self.set_state(SessionState::Active);
        tracing::info!(session = %session_id, persona = %self.persona.name(), "session active");

        // Greeting first: the agent speaks before any caller audio is relayed
        let result = match stream.generate_reply(self.persona.greeting()).await {
            Ok(()) => {
                self.relay(&session_id, room.as_mut(), stream.as_mut())
                    .await
            }
            Err(e) => Err(e),
        };

        self.set_state(SessionState::Closing);
        let _ = stream.close().await;
        let _ = room.close().await;
        self.set_state(SessionState::Closed);

        match &result {
            Ok(()) => tracing::info!(session = %session_id, "session closed"),
            Err(e) => tracing::warn!(session = %session_id, error = %e, "session failed"),
        }
        result
    }

    /// The `Active` loop: relay audio both ways and serve tool calls
    ///
    /// Tool calls are awaited inline, so one session's calls are serial in
    /// the order the model issues them. The dispatch itself is bounded by
    /// the registry's per-call timeout, so a stuck store cannot hold the
    /// audio path indefinitely.
    async fn relay(
        &self,
        session_id: &str,
        room: &mut dyn MediaRoom,
        stream: &mut dyn ModelStream,
    ) -> Result<()> {
        loop {
            tokio::select! {
                frame = room.recv_frame() => match frame? {
                    Some(frame) => stream.send_audio(frame).await?,
                    None => {
                        tracing::info!(session = %session_id, "remote hung up");
                        return Ok(());
                    }
                },
                event = stream.next_event() => match event? {
                    Some(ModelEvent::AudioDelta(frame)) => room.send_frame(frame).await?,
                    Some(ModelEvent::ToolCall { call_id, name, arguments }) => {
                        let outcome = self.registry.dispatch(&name, &arguments).await;
                        stream.send_tool_result(&call_id, outcome.text()).await?;
                    }
                    Some(ModelEvent::UserTranscript(text)) => {
                        tracing::info!(session = %session_id, %text, "caller");
                    }
                    Some(ModelEvent::AgentTranscript(text)) => {
                        tracing::info!(session = %session_id, %text, "agent");
                    }
                    Some(ModelEvent::TurnComplete) => {
                        tracing::debug!(session = %session_id, "turn complete");
                    }
                    None => {
                        tracing::info!(session = %session_id, "model closed the stream");
                        return Ok(());
                    }
                },
            }
        }
    }
}
