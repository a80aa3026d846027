//! Server entrypoint: accept session requests, run sessions
//!
//! The server owns process-wide wiring only: the listener, the shared tool
//! registry, the model client, and orderly shutdown on ctrl-c. Each accepted
//! request gets its own [`SessionController`] on its own task; a failed
//! session is logged and contained, never unwinding the accept loop.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::model::{OpenAiRealtime, RealtimeModel};
use crate::session::SessionController;
use crate::tools::{NoteTools, ToolRegistry};
use crate::transport::WsListener;
use crate::Result;

/// The scribe server process
pub struct Server {
    config: Config,
    model: Arc<dyn RealtimeModel>,
    registry: Arc<ToolRegistry>,
}

impl Server {
    /// Assemble the server from configuration
    #[must_use]
    pub fn new(config: Config) -> Self {
        let model: Arc<dyn RealtimeModel> = Arc::new(OpenAiRealtime::new(
            config.api_key.clone(),
            config.realtime_url.clone(),
        ));

        // The registry is built once and shared read-only across sessions.
        // The note store pool behind it is created on the first tool call.
        let registry = Arc::new(NoteTools::lazy(config.database_url.clone()).registry());

        Self {
            config,
            model,
            registry,
        }
    }

    /// Replace the model client (used by tests to avoid the network)
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn RealtimeModel>) -> Self {
        self.model = model;
        self
    }

    /// Serve sessions until the process is told to stop
    ///
    /// Blocks until ctrl-c or until the listener stops. Session failures
    /// are logged and do not propagate here.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the listener cannot bind.
    pub async fn run(self) -> Result<()> {
        let listener = WsListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve sessions from an already-bound listener
    ///
    /// Split from [`Server::run`] so tests can bind an ephemeral port and
    /// learn its address before the accept loop starts.
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible to match [`Server::run`].
    pub async fn serve(self, mut listener: WsListener) -> Result<()> {
        if self.config.api_key.is_none() {
            tracing::warn!(
                "OPENAI_API_KEY is not set; sessions will fail until it is provided"
            );
        }

        tracing::info!(
            addr = %listener.local_addr(),
            model = %self.config.model,
            voice = %self.config.persona.voice,
            "scribe is up"
        );

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        loop {
            tokio::select! {
                request = listener.accept() => {
                    let Some(request) = request else {
                        tracing::warn!("session listener stopped");
                        return Ok(());
                    };
                    let controller = SessionController::new(
                        Arc::clone(&self.model),
                        Arc::clone(&self.registry),
                        self.config.persona.clone(),
                        self.config.model.clone(),
                        self.config.noise_suppression,
                    );
                    tokio::spawn(async move {
                        // Session-fatal errors are already logged with their
                        // session id by the controller
                        let _ = controller.run(request).await;
                    });
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    return Ok(());
                }
            }
        }
    }
}
