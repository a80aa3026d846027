//! Media transport boundary
//!
//! Inbound session requests arrive from an external realtime transport.
//! Each request exposes `connect()`, which must be awaited before any audio
//! operation, and yields a room handle carrying opaque PCM16 frames in both
//! directions. Codec, jitter, and negotiation live on the other side of
//! this seam.

pub mod ws;

use async_trait::async_trait;

use crate::Result;

pub use ws::WsListener;

/// One inbound session request, not yet connected
#[async_trait]
pub trait SessionRequest: Send {
    /// Stable identifier for the requested session, for logging
    fn session_id(&self) -> &str;

    /// Complete the media handshake and hand over the room
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the handshake fails. The request is
    /// consumed either way.
    async fn connect(self: Box<Self>) -> Result<Box<dyn MediaRoom>>;
}

/// Bidirectional audio for one connected session
#[async_trait]
pub trait MediaRoom: Send {
    /// Next audio frame from the caller; `None` once the remote hangs up
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` on a broken connection, fatal to the
    /// owning session.
    async fn recv_frame(&mut self) -> Result<Option<Vec<u8>>>;

    /// Play an audio frame to the caller
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` on a broken connection.
    async fn send_frame(&mut self, frame: Vec<u8>) -> Result<()>;

    /// Release the room; safe to call after the remote has hung up
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the close handshake fails outright.
    async fn close(&mut self) -> Result<()>;
}
