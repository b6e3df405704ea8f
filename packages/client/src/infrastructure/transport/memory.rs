//! In-memory transport.
//!
//! Each accepted connection is a pair of unbounded channels: the client side
//! is returned to the supervisor, the server side ([`MemoryPeer`]) is handed
//! to whoever drives the test. Dropping a peer looks like an abrupt
//! connection loss to the client.
//!
//! Compiled for this crate's unit tests, and for downstream tests through the
//! `test-util` feature.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use tokio::{
    sync::{Mutex as AsyncMutex, mpsc},
    time::Instant,
};

use super::{Connector, Frame, FrameReader, FrameWriter, TransportPair};
use crate::infrastructure::error::TransportError;

/// A recorded `connect` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectAttempt {
    pub url: String,
    pub at: Instant,
}

/// Connector that accepts every connection unless told to refuse the next ones.
#[derive(Debug)]
pub struct MemoryConnector {
    attempts: Mutex<Vec<ConnectAttempt>>,
    refusals: Mutex<VecDeque<String>>,
    peer_tx: mpsc::UnboundedSender<MemoryPeer>,
    peer_rx: AsyncMutex<mpsc::UnboundedReceiver<MemoryPeer>>,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    pub fn new() -> Self {
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        Self {
            attempts: Mutex::new(Vec::new()),
            refusals: Mutex::new(VecDeque::new()),
            peer_tx,
            peer_rx: AsyncMutex::new(peer_rx),
        }
    }

    /// Refuse the next connection attempt with `reason`.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        self.refusals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reason.into());
    }

    /// All connection attempts so far, accepted or refused.
    pub fn attempts(&self) -> Vec<ConnectAttempt> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait for the server side of the next accepted connection.
    pub async fn next_peer(&self) -> Option<MemoryPeer> {
        self.peer_rx.lock().await.recv().await
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<TransportPair, TransportError> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ConnectAttempt {
                url: url.to_string(),
                at: Instant::now(),
            });

        let refusal = self
            .refusals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(reason) = refusal {
            return Err(TransportError::Refused(reason));
        }

        let (client_tx, server_rx) = mpsc::unbounded_channel();
        let (server_tx, client_rx) = mpsc::unbounded_channel();
        let peer = MemoryPeer {
            url: url.to_string(),
            inbound: server_rx,
            outbound: server_tx,
        };
        if self.peer_tx.send(peer).is_err() {
            return Err(TransportError::Refused("memory server is gone".to_string()));
        }

        Ok(TransportPair {
            writer: Box::new(MemoryWriter { tx: client_tx }),
            reader: Box::new(MemoryReader { rx: client_rx }),
        })
    }
}

/// Server side of an in-memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
    url: String,
    inbound: mpsc::UnboundedReceiver<Frame>,
    outbound: mpsc::UnboundedSender<Result<Frame, TransportError>>,
}

impl MemoryPeer {
    /// URL the client connected to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver a text frame to the client.
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.outbound.send(Ok(Frame::Text(text.into())));
    }

    /// Send a close frame to the client (clean, peer-initiated close).
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let _ = self.outbound.send(Ok(Frame::Close {
            code,
            reason: reason.into(),
        }));
    }

    /// Make the client's next read fail.
    pub fn fail(&self, reason: impl Into<String>) {
        let _ = self
            .outbound
            .send(Err(TransportError::Closed(reason.into())));
    }

    /// Next frame written by the client, or `None` once it hung up.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }

    /// Next text frame written by the client, skipping close frames.
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.inbound.recv().await? {
                Frame::Text(text) => return Some(text),
                Frame::Close { .. } => {}
            }
        }
    }
}

struct MemoryWriter {
    tx: mpsc::UnboundedSender<Frame>,
}

#[async_trait]
impl FrameWriter for MemoryWriter {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.tx
            .send(Frame::Text(text))
            .map_err(|_| TransportError::Closed("memory peer dropped".to_string()))
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        self.tx
            .send(Frame::Close {
                code,
                reason: reason.to_string(),
            })
            .map_err(|_| TransportError::Closed("memory peer dropped".to_string()))
    }
}

struct MemoryReader {
    rx: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
}

#[async_trait]
impl FrameReader for MemoryReader {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.rx.recv().await
    }
}
