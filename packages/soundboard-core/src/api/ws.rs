//! WebSocket handler for control sessions.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::future::{BoxFuture, FutureExt, OptionFuture};
use futures::sink::SinkExt;
use futures::stream::StreamExt;

use crate::api::AppState;
use crate::protocol::ControlMessage;
use crate::session::ControlSession;

/// Serializes a control message to a WebSocket text message.
fn to_message(msg: &ControlMessage) -> Option<Message> {
    msg.to_json().ok().map(|s| Message::Text(s.into()))
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Runs one control session until the client leaves, sends something
/// unparseable, or the hub cancels it.
///
/// One request is handled at a time, in arrival order. While a request is
/// in progress (a Play can take a while to decode) the socket stops reading
/// but keeps writing out the client's queue.
async fn handle_ws(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Registration queues the initial catalog and volume.
    let (session, mut outbound) = ControlSession::open(
        &state.hub,
        Arc::clone(&state.catalog),
        Arc::clone(&state.playback),
    );
    let session = Arc::new(session);
    let cancel_token = session.cancel_token().clone();
    let mut in_flight: Option<BoxFuture<'static, ()>> = None;

    log::info!("[WS] Control session opened: {}", session.id());

    loop {
        let idle = in_flight.is_none();
        tokio::select! {
            // Force-close, or the hub dropped this client
            _ = cancel_token.cancelled() => {
                log::info!("[WS] Control session cancelled: {}", session.id());
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            // Queued replies and broadcasts
            Some(msg) = outbound.recv() => {
                if let Some(frame) = to_message(&msg) {
                    if sender.send(frame).await.is_err() {
                        break;
                    }
                }
            }
            // Current request finished
            Some(()) = OptionFuture::from(in_flight.as_mut()), if !idle => {
                in_flight = None;
            }
            // Requests from the client
            frame = receiver.next(), if idle => {
                match frame {
                    Some(Ok(Message::Text(text))) => match ControlMessage::parse(text.as_str()) {
                        Ok(msg) => {
                            let session = Arc::clone(&session);
                            in_flight = Some(async move { session.handle(msg).await }.boxed());
                        }
                        Err(e) => {
                            log::warn!("[WS] Malformed message from {}: {}", session.id(), e);
                            break;
                        }
                    },
                    Some(Ok(Message::Binary(_))) => {
                        log::warn!("[WS] Unexpected binary frame from {}", session.id());
                        break;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        log::debug!("[WS] Read error on {}: {}", session.id(), e);
                        break;
                    }
                    // Ping/pong are answered by axum
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    session.leave();
    // A Play already decoding still swaps in once it is ready.
    if let Some(request) = in_flight.take() {
        tokio::spawn(request);
    }

    log::info!("[WS] Control session closed: {}", session.id());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_message_produces_text_frame() {
        let frame = to_message(&ControlMessage::volume(-2.0)).unwrap();
        match frame {
            Message::Text(text) => {
                assert_eq!(text.as_str(), r#"{"type":"volume","volume":-2.0}"#)
            }
            other => panic!("expected text frame, got {:?}", other),
        }
    }
}
