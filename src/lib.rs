//! Scribe - voice note-taking agent
//!
//! Scribe answers realtime voice sessions, greets the caller with a fixed
//! persona, and serves a conversation in which the speech model can save
//! notes and read them back through registered tools.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 Caller (audio)                   │
//! └───────────────────────┬──────────────────────────┘
//!                         │ PCM16 frames
//! ┌───────────────────────▼──────────────────────────┐
//! │    Transport  ⇄  Session Controller  ⇄  Model    │
//! │                        │                         │
//! │                  Tool Registry                   │
//! │                        │                         │
//! │                   Note Store                     │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! One session per connection; sessions share nothing but the tool
//! registry and the note store's connection pool.

pub mod config;
pub mod error;
pub mod model;
pub mod persona;
pub mod server;
pub mod session;
pub mod store;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{ModelEvent, ModelSessionOptions, ModelStream, OpenAiRealtime, RealtimeModel};
pub use persona::Persona;
pub use server::Server;
pub use session::{SessionController, SessionState};
pub use store::{DbPool, Note, NoteStore};
pub use tools::{NoteTools, ToolOutcome, ToolRegistry, ToolSpec};
pub use transport::{MediaRoom, SessionRequest, WsListener};
