//! Frame transports and the WebSocket connector.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use rogs_common::RealtimeError;
use tokio_tungstenite::tungstenite::Message as WsMessage;

pub type FrameSink = Pin<Box<dyn Sink<String, Error = RealtimeError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, RealtimeError>> + Send>>;

/// An open text-frame duplex. The stream ends (or yields
/// [`RealtimeError::ConnectionClosed`]) when the peer goes away.
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens transports for the connection loop.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Transport, RealtimeError>;
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Transport, RealtimeError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| RealtimeError::Transport(e.to_string()))?;
        let (ws_write, ws_read) = ws_stream.split();

        let sink = ws_write
            .sink_map_err(|e| RealtimeError::Transport(e.to_string()))
            .with(|frame: String| {
                future::ready(Ok::<_, RealtimeError>(WsMessage::Text(frame.into())))
            });

        let stream = ws_read.filter_map(|msg| {
            future::ready(match msg {
                Ok(WsMessage::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(WsMessage::Close(_)) => Some(Err(RealtimeError::ConnectionClosed)),
                Ok(_) => None,
                Err(e) => Some(Err(RealtimeError::Transport(e.to_string()))),
            })
        });

        Ok(Transport {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
