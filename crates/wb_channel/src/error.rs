use std::fmt;

use serde_json::Error as JsonError;
use tokio_tungstenite::tungstenite;

#[derive(Debug)]
pub enum ChannelError {
    InvalidEndpoint(String),
    Connect {
        endpoint: String,
        message: String,
    },
    Websocket(Box<tungstenite::Error>),
    Closed,
    Encode(JsonError),
    Decode(JsonError),
    MissingMessageName,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => write!(f, "invalid channel endpoint: {value}"),
            Self::Connect { endpoint, message } => {
                write!(f, "failed to connect to {endpoint}: {message}")
            }
            Self::Websocket(error) => write!(f, "websocket error: {error}"),
            Self::Closed => write!(f, "channel is closed"),
            Self::Encode(error) => write!(f, "failed to encode message: {error}"),
            Self::Decode(error) => write!(f, "failed to decode frame: {error}"),
            Self::MissingMessageName => write!(f, "frame has no messageName"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Websocket(error) => Some(error.as_ref()),
            Self::Encode(error) | Self::Decode(error) => Some(error),
            _ => None,
        }
    }
}

impl From<tungstenite::Error> for ChannelError {
    fn from(error: tungstenite::Error) -> Self {
        match error {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::Closed
            }
            other => Self::Websocket(Box::new(other)),
        }
    }
}

impl ChannelError {
    /// Whether the error ends the connection rather than a single frame.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Websocket(_) | Self::Closed
        )
    }
}
