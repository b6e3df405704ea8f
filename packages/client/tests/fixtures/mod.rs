//! Test fixtures shared by the integration tests.
//!
//! `TestServer` is a minimal chat server on an ephemeral port:
//! - greets every connection with a `users` envelope listing the caller
//! - echoes each CHAT frame back as a `message` envelope
//! - content `/close` makes it close cleanly (code 1000) and wait for the
//!   client's close reply
//! - content `/drop` makes it drop the socket without a close frame

#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicI64, AtomicUsize, Ordering},
    },
};

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

#[derive(Default)]
struct ServerState {
    connections: AtomicUsize,
    close_replies: AtomicUsize,
    next_message_id: AtomicI64,
}

pub struct TestServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .route("/ws", get(websocket_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Server URL with an `http` scheme; the client normalizes it to `ws`.
    pub fn http_url(&self) -> String {
        format!("http://{}/ws", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Number of WebSocket connections accepted so far.
    pub fn connection_count(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Number of close frames received in reply to a server-initiated close.
    pub fn close_reply_count(&self) -> usize {
        self.state.close_replies.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let user_id: i64 = query
        .get("userId")
        .and_then(|id| id.parse().ok())
        .unwrap_or_default();
    state.connections.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(socket: WebSocket, state: Arc<ServerState>, user_id: i64) {
    let (mut sender, mut receiver) = socket.split();

    let greeting = json!({
        "type": "users",
        "users": [{ "id": user_id, "username": format!("user{user_id}"), "status": 1 }],
    });
    if sender
        .send(Message::Text(greeting.to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };

        match frame["content"].as_str() {
            Some("/close") => {
                let _ = sender
                    .send(Message::Close(Some(CloseFrame {
                        code: 1000,
                        reason: "bye".into(),
                    })))
                    .await;
                while let Some(Ok(reply)) = receiver.next().await {
                    if let Message::Close(_) = reply {
                        state.close_replies.fetch_add(1, Ordering::SeqCst);
                        break;
                    }
                }
                return;
            }
            Some("/drop") => return,
            _ => {}
        }

        let id = state.next_message_id.fetch_add(1, Ordering::SeqCst) + 1;
        let echo = json!({
            "type": "message",
            "message": {
                "id": id,
                "type": frame["messageType"],
                "content": frame["content"],
                "senderId": frame["senderId"],
                "senderName": frame["senderName"],
                "receiverId": frame["receiverId"],
                "groupId": frame["groupId"],
                "timestamp": [2024, 1, 2, 3, 4, 5, 6],
            },
        });
        if sender
            .send(Message::Text(echo.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }
}
