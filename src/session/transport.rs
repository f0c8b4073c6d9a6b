use async_trait::async_trait;
use chat_api::ChatApiError;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid realtime endpoint: {0}")]
    Endpoint(#[from] ChatApiError),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("connection refused: {0}")]
    Refused(String),
    #[error("transport closed")]
    Closed,
}

/// Outbound half of an established transport.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    async fn close(&mut self);
}

/// Inbound half of an established transport.
#[async_trait]
pub trait FrameStream: Send {
    /// Next text frame. `None` once the peer has closed the connection.
    ///
    /// Must be cancel safe: the session task polls it inside `select!`.
    async fn next_text(&mut self) -> Option<Result<String, TransportError>>;
}

pub struct TransportParts {
    pub sink: Box<dyn FrameSink>,
    pub stream: Box<dyn FrameStream>,
}

/// Opens realtime transports for an identity.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, identity: &str) -> Result<TransportParts, TransportError>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket connector for `ws(s)://<host>/ws/<identity>`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: String,
}

impl WsConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, identity: &str) -> Result<TransportParts, TransportError> {
        let url = chat_api::websocket_url(&self.base_url, identity)?;
        debug!(%url, "opening websocket");
        let (socket, _response) = connect_async(url.as_str()).await?;
        let (sink, stream) = socket.split();

        Ok(TransportParts {
            sink: Box::new(WsFrameSink { sink }),
            stream: Box::new(WsFrameStream { stream }),
        })
    }
}

struct WsFrameSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for WsFrameSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn close(&mut self) {
        let _ = self.sink.close().await;
    }
}

struct WsFrameStream {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl FrameStream for WsFrameStream {
    async fn next_text(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("ignoring non-utf8 binary frame"),
                },
                Ok(Message::Close(_)) => return None,
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(tungstenite::Error::ConnectionClosed) => return None,
                Err(error) => return Some(Err(error.into())),
            }
        }
    }
}
