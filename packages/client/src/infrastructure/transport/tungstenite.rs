//! `tokio-tungstenite` implementation of the transport seam.

use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};

use super::{Connector, Frame, FrameReader, FrameWriter, TransportPair};
use crate::infrastructure::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connector backed by `tokio_tungstenite::connect_async`.
#[derive(Debug, Default, Clone)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<TransportPair, TransportError> {
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(TransportError::Handshake)?;
        tracing::debug!("WebSocket handshake completed: {}", response.status());

        let (sink, stream) = stream.split();
        Ok(TransportPair {
            writer: Box::new(TungsteniteWriter { sink }),
            reader: Box::new(TungsteniteReader { stream }),
        })
    }
}

struct TungsteniteWriter {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameWriter for TungsteniteWriter {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(TransportError::Write)
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_owned().into(),
        };
        self.sink
            .send(Message::Close(Some(frame)))
            .await
            .map_err(TransportError::Write)
    }
}

struct TungsteniteReader {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameReader for TungsteniteReader {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Close(close_frame)) => {
                    // 1005: no status code present
                    let (code, reason) = close_frame
                        .map(|cf| (u16::from(cf.code), cf.reason.as_str().to_owned()))
                        .unwrap_or((1005, String::new()));
                    return Some(Ok(Frame::Close { code, reason }));
                }
                Ok(Message::Binary(data)) => {
                    tracing::debug!("Ignoring binary frame ({} bytes)", data.len());
                }
                // Pings are answered by tungstenite on the next read/write
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(TransportError::Read(e))),
            }
        }
    }
}
