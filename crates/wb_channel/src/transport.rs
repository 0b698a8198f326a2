use std::future::Future;
use std::sync::Once;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::ChannelError;
use crate::url::normalize_channel_url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Outbound half of a channel connection.
pub trait FrameSink: Send + 'static {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), ChannelError>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Inbound half of a channel connection.
///
/// `None` means the peer closed the connection.
pub trait FrameSource: Send + 'static {
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String, ChannelError>>> + Send;
}

/// Opens channel connections; one call per simulated session.
pub trait Connector: Send + Sync + 'static {
    type Sink: FrameSink;
    type Source: FrameSource;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<(Self::Sink, Self::Source), ChannelError>> + Send;
}

/// WebSocket connector for a normalized channel endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    endpoint: String,
}

impl WsConnector {
    pub fn new(base_url: &str) -> Result<Self, ChannelError> {
        install_crypto_provider();
        Ok(Self {
            endpoint: normalize_channel_url(base_url)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Connector for WsConnector {
    type Sink = WsSink;
    type Source = WsSource;

    async fn connect(&self) -> Result<(WsSink, WsSource), ChannelError> {
        let (stream, _response) =
            connect_async(self.endpoint.as_str())
                .await
                .map_err(|error| ChannelError::Connect {
                    endpoint: self.endpoint.clone(),
                    message: error.to_string(),
                })?;
        let (sink, source) = stream.split();
        Ok((WsSink { inner: sink }, WsSource { inner: source }))
    }
}

pub struct WsSink {
    inner: SplitSink<WsStream, Message>,
}

impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.inner
            .send(Message::text(text))
            .await
            .map_err(ChannelError::from)
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.inner.close().await.map_err(ChannelError::from)
    }
}

pub struct WsSource {
    inner: SplitStream<WsStream>,
}

impl FrameSource for WsSource {
    async fn next_text(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.as_str().to_owned())),
                Some(Ok(Message::Close(_))) | None => return None,
                // Pings are answered by tungstenite; binary frames are not part of the protocol.
                Some(Ok(_)) => continue,
                Some(Err(error)) => {
                    return match ChannelError::from(error) {
                        ChannelError::Closed => None,
                        other => Some(Err(other)),
                    };
                }
            }
        }
    }
}

fn install_crypto_provider() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        // Another component may already have installed a provider.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
