//! WebSocket transport round trip
//!
//! Binds the real listener on an ephemeral port and drives it with a
//! WebSocket client: upgrade, hello, then audio frames both ways.

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use scribe_agent::WsListener;

#[tokio::test]
async fn session_request_handshake_and_audio_round_trip() {
    let mut listener = WsListener::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let url = format!("ws://{}/session", listener.local_addr());

    let client = tokio::spawn(async move {
        let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

        // Hello arrives once the server side completes connect()
        let hello = ws.next().await.unwrap().unwrap();
        let Message::Text(text) = hello else {
            panic!("expected text hello, got {hello:?}");
        };
        let hello: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(hello["type"], "session.ready");
        assert!(hello["session_id"].as_str().is_some_and(|id| !id.is_empty()));

        // Caller audio up
        ws.send(Message::Binary(vec![1, 2, 3].into()))
            .await
            .unwrap();

        // Agent audio down
        let frame = ws.next().await.unwrap().unwrap();
        assert_eq!(frame, Message::Binary(vec![9, 8, 7].into()));

        ws.close(None).await.unwrap();
    });

    let request = listener.accept().await.expect("one session request");
    assert!(!request.session_id().is_empty());

    let mut room = request.connect().await.unwrap();
    assert_eq!(room.recv_frame().await.unwrap(), Some(vec![1, 2, 3]));
    room.send_frame(vec![9, 8, 7]).await.unwrap();

    // Remote close surfaces as end of frames, not as an error
    assert_eq!(room.recv_frame().await.unwrap(), None);
    room.close().await.unwrap();

    client.await.unwrap();
}
