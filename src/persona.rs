//! Persona configuration for the voice agent
//!
//! A persona bundles the identity data a session hands to the realtime
//! model when it opens: system instructions, the greeting instruction for
//! the agent-initiated first turn, and the synthesis voice identifier.
//! All of it is data, overridable from the environment (see
//! [`crate::config::Config`]); none of it is renegotiated mid-session.

use serde::{Deserialize, Serialize};

/// Default synthesis voice identifier.
pub const DEFAULT_VOICE: &str = "alloy";

/// Identity and behavior data for the agent
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Display name
    pub name: String,

    /// System instructions sent when the model session opens
    pub instructions: String,

    /// Instruction for the greeting turn, issued before any user audio
    pub greeting: String,

    /// Synthesis voice identifier
    pub voice: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Scribe".to_string(),
            instructions: "You are Scribe, a friendly voice assistant. Keep replies \
                short and conversational, suited to being spoken aloud. When the user \
                asks you to remember, note down, or save something, call the save_note \
                tool with the exact text they gave you. When they ask what you have \
                saved, call the get_notes tool and read the notes back naturally."
                .to_string(),
            greeting: "Greet the user warmly, introduce yourself by name, and mention \
                that you can save notes for them and read them back later."
                .to_string(),
            voice: DEFAULT_VOICE.to_string(),
        }
    }
}

impl Persona {
    /// Get the display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the greeting instruction for the first turn
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }
}
