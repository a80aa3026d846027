//! WebSocket listener for inbound session requests
//!
//! One upgraded socket is one session request. Binary frames carry PCM16
//! audio both ways; the only text frame this module emits is a small JSON
//! hello (`session.ready` plus the session id) sent when `connect()`
//! completes, so clients know the agent is listening.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::{MediaRoom, SessionRequest};
use crate::{Error, Result};

/// Buffered session requests awaiting accept
const ACCEPT_BACKLOG: usize = 16;

/// Listener producing one [`SessionRequest`] per upgraded WebSocket
pub struct WsListener {
    local_addr: SocketAddr,
    requests: mpsc::Receiver<WsSessionRequest>,
    serve_task: JoinHandle<()>,
}

impl WsListener {
    /// Bind the listener and start serving upgrades in the background
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the address cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Transport(format!("failed to bind {addr}: {e}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| Error::Transport(format!("listener address unavailable: {e}")))?;

        let (tx, requests) = mpsc::channel(ACCEPT_BACKLOG);
        let router = Router::new()
            .route("/session", get(ws_upgrade))
            .with_state(Arc::new(tx))
            .layer(TraceLayer::new_for_http());

        let serve_task = tokio::spawn(async move {
            let app = router.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "session listener stopped");
            }
        });

        tracing::info!(addr = %local_addr, "listening for session requests");

        Ok(Self {
            local_addr,
            requests,
            serve_task,
        })
    }

    /// Address the listener is actually bound to
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Next inbound session request; `None` once the listener has stopped
    pub async fn accept(&mut self) -> Option<Box<dyn SessionRequest>> {
        self.requests
            .recv()
            .await
            .map(|request| Box::new(request) as Box<dyn SessionRequest>)
    }
}

impl Drop for WsListener {
    fn drop(&mut self) {
        self.serve_task.abort();
    }
}

async fn ws_upgrade(
    State(tx): State<Arc<mpsc::Sender<WsSessionRequest>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let session_id = Uuid::new_v4().to_string();
        tracing::info!(session = %session_id, peer = %peer, "session request");

        let request = WsSessionRequest { session_id, socket };
        if tx.send(request).await.is_err() {
            tracing::warn!("accept loop gone, dropping session request");
        }
    })
}

struct WsSessionRequest {
    session_id: String,
    socket: WebSocket,
}

#[async_trait]
impl SessionRequest for WsSessionRequest {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn connect(mut self: Box<Self>) -> Result<Box<dyn MediaRoom>> {
        let hello = serde_json::json!({
            "type": "session.ready",
            "session_id": self.session_id,
        });
        self.socket
            .send(Message::Text(hello.to_string().into()))
            .await
            .map_err(|e| Error::Transport(format!("session hello failed: {e}")))?;

        Ok(Box::new(WsRoom {
            session_id: self.session_id,
            socket: self.socket,
        }))
    }
}

struct WsRoom {
    session_id: String,
    socket: WebSocket,
}

#[async_trait]
impl MediaRoom for WsRoom {
    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>> {
        while let Some(message) = self.socket.recv().await {
            match message {
                Ok(Message::Binary(frame)) => return Ok(Some(frame.to_vec())),
                Ok(Message::Close(_)) => return Ok(None),
                // Pings are answered by axum; text frames are not audio
                Ok(_) => {}
                Err(e) => {
                    return Err(Error::Transport(format!(
                        "session {} receive failed: {e}",
                        self.session_id
                    )));
                }
            }
        }
        Ok(None)
    }

    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<()> {
        self.socket
            .send(Message::Binary(frame.into()))
            .await
            .map_err(|e| Error::Transport(format!("session {} send failed: {e}", self.session_id)))
    }

    async fn close(&mut self) -> Result<()> {
        // A close after remote hangup reports an error we don't care about
        let _ = self.socket.send(Message::Close(None)).await;
        Ok(())
    }
}
