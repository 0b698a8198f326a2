//! Transport-only WBChannel client primitives.
//!
//! This crate owns framing, message encoding/decoding and socket plumbing for
//! the WBChannel completion protocol. It intentionally contains no session
//! lifecycle logic: handshake ordering, completion cadence and heartbeats live
//! in the `wbsim` runtime.
//!
//! Every application message is a JSON envelope
//! `{messageName, context, payload}` carried on one text frame between
//! `<WBChannel>` and `</WBChannel>` markers. Inbound frames are accepted with
//! or without the markers.

pub mod config;
pub mod error;
pub mod frame;
pub mod memory;
pub mod messages;
pub mod transport;
pub mod url;

pub use config::{detect_platform, ClientProfile, Credentials};
pub use error::ChannelError;
pub use frame::{unwrap_frame, wrap_frame, FRAME_END, FRAME_START};
pub use messages::{ClientMessage, CodeFragment, Envelope, MessageFactory, ServerMessage};
pub use transport::{Connector, FrameSink, FrameSource, WsConnector};
pub use url::{normalize_channel_url, CHANNEL_PATH};
