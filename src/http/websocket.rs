//! WebSocket frame relaying.
//!
//! # Data Flow
//! ```text
//! Client ←──── WebSocket frames ────→ Gateway ←──── WebSocket frames ────→ Relay
//! ```
//!
//! # Design Decisions
//! - Frame-level forwarding (no message buffering)
//! - Close frames propagated in both directions
//! - Ping/pong forwarded like any other frame

use axum::extract::ws::{self, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::{
    self,
    protocol::{frame::coding::CloseCode, CloseFrame},
};
use tokio_tungstenite::WebSocketStream;

/// Convert a client frame into the upstream representation.
pub fn to_upstream(message: ws::Message) -> tungstenite::Message {
    match message {
        ws::Message::Text(text) => tungstenite::Message::Text(text.as_str().to_owned().into()),
        ws::Message::Binary(data) => tungstenite::Message::Binary(data),
        ws::Message::Ping(data) => tungstenite::Message::Ping(data),
        ws::Message::Pong(data) => tungstenite::Message::Pong(data),
        ws::Message::Close(frame) => tungstenite::Message::Close(frame.map(|f| CloseFrame {
            code: CloseCode::from(f.code),
            reason: f.reason.as_str().to_owned().into(),
        })),
    }
}

/// Convert an upstream frame into the client representation.
///
/// Raw frames never surface from a reading stream; they map to `None`.
pub fn to_client(message: tungstenite::Message) -> Option<ws::Message> {
    let message = match message {
        tungstenite::Message::Text(text) => ws::Message::Text(text.as_str().to_owned().into()),
        tungstenite::Message::Binary(data) => ws::Message::Binary(data),
        tungstenite::Message::Ping(data) => ws::Message::Ping(data),
        tungstenite::Message::Pong(data) => ws::Message::Pong(data),
        tungstenite::Message::Close(frame) => ws::Message::Close(frame.map(|f| ws::CloseFrame {
            code: u16::from(f.code),
            reason: f.reason.as_str().to_owned().into(),
        })),
        tungstenite::Message::Frame(_) => return None,
    };
    Some(message)
}

/// Pump frames between the client and the upstream until either side closes.
pub async fn relay_frames<S>(client: WebSocket, upstream: WebSocketStream<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    let client_to_upstream = async {
        while let Some(Ok(message)) = client_rx.next().await {
            let closing = matches!(message, ws::Message::Close(_));
            if upstream_tx.send(to_upstream(message)).await.is_err() || closing {
                break;
            }
        }
        let _ = upstream_tx.close().await;
    };

    let upstream_to_client = async {
        while let Some(Ok(message)) = upstream_rx.next().await {
            let Some(message) = to_client(message) else {
                continue;
            };
            let closing = matches!(message, ws::Message::Close(_));
            if client_tx.send(message).await.is_err() || closing {
                break;
            }
        }
        let _ = client_tx.close().await;
    };

    tokio::select! {
        _ = client_to_upstream => tracing::debug!("Client closed WebSocket tunnel"),
        _ = upstream_to_client => tracing::debug!("Relay closed WebSocket tunnel"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_close_survive_both_directions() {
        let upstream = to_upstream(ws::Message::Text("hello".into()));
        assert_eq!(upstream, tungstenite::Message::Text("hello".into()));

        let close = to_upstream(ws::Message::Close(Some(ws::CloseFrame {
            code: 1000,
            reason: "bye".into(),
        })));
        match to_client(close) {
            Some(ws::Message::Close(Some(frame))) => {
                assert_eq!(frame.code, 1000);
                assert_eq!(frame.reason.as_str(), "bye");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn binary_payload_is_untouched() {
        let payload = bytes_of(&[0, 1, 2, 255]);
        match to_client(to_upstream(ws::Message::Binary(payload.clone()))) {
            Some(ws::Message::Binary(data)) => assert_eq!(data, payload),
            other => panic!("unexpected {:?}", other),
        }
    }

    fn bytes_of(data: &[u8]) -> axum::body::Bytes {
        axum::body::Bytes::copy_from_slice(data)
    }
}
