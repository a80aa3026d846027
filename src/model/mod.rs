//! Realtime speech model boundary
//!
//! The engine behind the voice (VAD, transcription, synthesis) is an
//! external system. Sessions talk to it through [`RealtimeModel`] and the
//! [`ModelStream`] it opens; the stream surfaces a small event vocabulary
//! and accepts raw PCM16 audio, tool results, and one-shot reply
//! instructions. Everything a session configures (model id, voice,
//! instructions, tools, noise suppression) is fixed at open time.

pub mod openai;

use async_trait::async_trait;

use crate::Result;
use crate::tools::ToolSpec;

pub use openai::OpenAiRealtime;

/// Options handed to the model when a session opens
#[derive(Debug, Clone)]
pub struct ModelSessionOptions {
    /// Model identifier
    pub model: String,

    /// Synthesis voice identifier
    pub voice: String,

    /// Persona system instructions
    pub instructions: String,

    /// Request noise suppression on caller audio
    pub noise_suppression: bool,

    /// Tools the model may call during the session
    pub tools: Vec<ToolSpec>,
}

/// Event surfaced by an open model stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// Synthesized speech (PCM16) to relay to the caller
    AudioDelta(Vec<u8>),

    /// Completed tool invocation request
    ToolCall {
        /// Correlation id for the eventual result
        call_id: String,
        /// Registered tool name
        name: String,
        /// Raw arguments JSON
        arguments: String,
    },

    /// What the caller said, transcribed
    UserTranscript(String),

    /// What the agent said, transcribed
    AgentTranscript(String),

    /// The model finished a response turn
    TurnComplete,
}

/// Factory for realtime model streams, one per session
#[async_trait]
pub trait RealtimeModel: Send + Sync {
    /// Open a model stream configured with the given options
    ///
    /// # Errors
    ///
    /// Returns `Error::Model` if the stream cannot be established.
    async fn open(&self, options: ModelSessionOptions) -> Result<Box<dyn ModelStream>>;
}

/// One live conversation with the speech model
#[async_trait]
pub trait ModelStream: Send {
    /// Next event from the model; `None` once the model side has closed
    ///
    /// # Errors
    ///
    /// Returns `Error::Model` on a broken stream. This is fatal to the
    /// session that owns the stream and to nothing else.
    async fn next_event(&mut self) -> Result<Option<ModelEvent>>;

    /// Forward caller audio (PCM16) to the model
    ///
    /// # Errors
    ///
    /// Returns `Error::Model` on a broken stream.
    async fn send_audio(&mut self, frame: Vec<u8>) -> Result<()>;

    /// Hand a tool outcome back and let the model continue the turn
    ///
    /// # Errors
    ///
    /// Returns `Error::Model` on a broken stream.
    async fn send_tool_result(&mut self, call_id: &str, output: &str) -> Result<()>;

    /// Ask the model to produce one scripted reply (the greeting turn)
    ///
    /// # Errors
    ///
    /// Returns `Error::Model` on a broken stream.
    async fn generate_reply(&mut self, instructions: &str) -> Result<()>;

    /// Close the stream; safe to call on an already-closed stream
    ///
    /// # Errors
    ///
    /// Returns `Error::Model` if the close handshake fails outright.
    async fn close(&mut self) -> Result<()>;
}
