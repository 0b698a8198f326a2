//! In-process channel transport.
//!
//! [`memory_channel`] returns the client halves plus a [`MemoryPeer`] that
//! plays the backend. Used by scripted peers in tests and dry runs.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::error::ChannelError;
use crate::messages::{Envelope, ServerMessage};
use crate::transport::{FrameSink, FrameSource};

/// What the client side pushed toward the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerFrame {
    Text(String),
    Close,
}

pub struct MemorySink {
    outbound: UnboundedSender<PeerFrame>,
    closed: bool,
}

impl FrameSink for MemorySink {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.outbound
            .send(PeerFrame::Text(text))
            .map_err(|_| ChannelError::Closed)
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.outbound
            .send(PeerFrame::Close)
            .map_err(|_| ChannelError::Closed)
    }
}

pub struct MemorySource {
    inbound: UnboundedReceiver<String>,
}

impl FrameSource for MemorySource {
    async fn next_text(&mut self) -> Option<Result<String, ChannelError>> {
        self.inbound.recv().await.map(Ok)
    }
}

/// Backend end of an in-process channel.
pub struct MemoryPeer {
    inbound: UnboundedReceiver<PeerFrame>,
    outbound: Option<UnboundedSender<String>>,
}

impl MemoryPeer {
    /// Next frame from the client; `None` once the client side is dropped.
    pub async fn recv(&mut self) -> Option<PeerFrame> {
        self.inbound.recv().await
    }

    /// Next client frame decoded as an envelope; `None` on close or disconnect.
    pub async fn recv_envelope(&mut self) -> Option<Result<Envelope, ChannelError>> {
        match self.recv().await? {
            PeerFrame::Text(text) => Some(Envelope::decode(&text)),
            PeerFrame::Close => None,
        }
    }

    /// Push a raw text frame to the client. Returns `false` after hang-up.
    pub fn send_raw(&self, frame: impl Into<String>) -> bool {
        self.outbound
            .as_ref()
            .is_some_and(|outbound| outbound.send(frame.into()).is_ok())
    }

    pub fn send(&self, message: &ServerMessage) -> bool {
        match message.to_envelope().encode() {
            Ok(frame) => self.send_raw(frame),
            Err(_) => false,
        }
    }

    /// Drop the server-to-client direction; the client observes a closed stream.
    pub fn hang_up(&mut self) {
        self.outbound = None;
    }
}

pub fn memory_channel() -> (MemorySink, MemorySource, MemoryPeer) {
    let (client_tx, peer_rx) = unbounded_channel();
    let (peer_tx, client_rx) = unbounded_channel();
    (
        MemorySink {
            outbound: client_tx,
            closed: false,
        },
        MemorySource { inbound: client_rx },
        MemoryPeer {
            inbound: peer_rx,
            outbound: Some(peer_tx),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn peer_sees_close_after_client_closes() {
        let (mut sink, _source, mut peer) = memory_channel();
        sink.send_text("hello".to_owned()).await.expect("send");
        sink.close().await.expect("close");

        assert_eq!(peer.recv().await, Some(PeerFrame::Text("hello".to_owned())));
        assert_eq!(peer.recv().await, Some(PeerFrame::Close));
        assert!(sink.send_text("late".to_owned()).await.is_err());
    }

    #[tokio::test]
    async fn client_stream_ends_when_peer_hangs_up() {
        let (_sink, mut source, mut peer) = memory_channel();
        assert!(peer.send_raw("{\"messageName\":\"ServerHeartbeat\"}"));
        peer.hang_up();

        assert!(matches!(source.next_text().await, Some(Ok(_))));
        assert!(source.next_text().await.is_none());
        assert!(!peer.send_raw("ignored"));
    }
}
