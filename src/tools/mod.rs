//! Tool registry for model-invoked functions
//!
//! The registry is explicit data: a stable tool name mapped to a parameter
//! schema, a description, and a handler. It is built once when the server
//! assembles the persona and shared read-only across sessions.
//!
//! Dispatch never returns `Err`. Every invocation resolves to a
//! [`ToolOutcome`] whose text is safe to hand back to the speech model:
//! unknown names, malformed arguments, storage failures, and timeouts all
//! become short spoken-friendly sentences, and the details go to the log.

pub mod notes;

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use notes::NoteTools;

/// Bound on a single tool invocation before a fallback reply is returned
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Declared shape of a tool, sent to the model at session open
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolSpec {
    /// Stable tool name the model calls
    pub name: String,

    /// What the tool does, phrased for the model
    pub description: String,

    /// JSON Schema for the arguments object
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    /// Declare a tool
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Result of one tool invocation, always speakable text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The tool did its job; text confirms or answers
    Success(String),

    /// The tool could not do its job; text explains without jargon
    Error(String),
}

impl ToolOutcome {
    /// Successful outcome with the given reply text
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success(text.into())
    }

    /// Failed outcome with the given spoken-friendly reply text
    pub fn error(text: impl Into<String>) -> Self {
        Self::Error(text.into())
    }

    /// The reply text, regardless of outcome kind
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Error(text) => text,
        }
    }

    /// Whether this outcome reports a failure
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Handler invoked with the raw arguments JSON of a tool call
pub type ToolHandler = Arc<dyn Fn(String) -> BoxFuture<'static, ToolOutcome> + Send + Sync>;

struct RegisteredTool {
    spec: ToolSpec,
    handler: ToolHandler,
}

/// Explicit name-to-handler tool registry
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its declared name
    pub fn register<F, Fut>(&mut self, spec: ToolSpec, handler: F)
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolOutcome> + Send + 'static,
    {
        self.tools.push(RegisteredTool {
            spec,
            handler: Arc::new(move |arguments| Box::pin(handler(arguments))),
        });
    }

    /// Declared tools in registration order, for model session configuration
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec.clone()).collect()
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry has no tools
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name with raw arguments JSON
    ///
    /// Resolves every invocation to an outcome. The call is bounded by a
    /// fixed timeout so a stuck handler cannot stall the conversation.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> ToolOutcome {
        self.dispatch_with_timeout(name, arguments, DISPATCH_TIMEOUT)
            .await
    }

    async fn dispatch_with_timeout(
        &self,
        name: &str,
        arguments: &str,
        timeout: Duration,
    ) -> ToolOutcome {
        let Some(tool) = self.tools.iter().find(|t| t.spec.name == name) else {
            tracing::warn!(tool = %name, "model called an unregistered tool");
            return ToolOutcome::error(format!("I don't have a tool called {name}."));
        };

        tracing::debug!(tool = %name, "dispatching tool call");

        match tokio::time::timeout(timeout, (tool.handler)(arguments.to_string())).await {
            Ok(outcome) => {
                if outcome.is_error() {
                    tracing::warn!(tool = %name, reply = %outcome.text(), "tool reported an error");
                }
                outcome
            }
            Err(_) => {
                tracing::warn!(tool = %name, timeout = ?timeout, "tool call timed out");
                ToolOutcome::error("That took too long to finish. Please try again.")
            }
        }
    }
}
