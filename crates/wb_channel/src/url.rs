use url::Url;

use crate::error::ChannelError;

/// Path of the channel gateway on the backend host.
pub const CHANNEL_PATH: &str = "/websocket/peerAppgw";

/// Normalize a configured base URL to the channel WebSocket endpoint.
///
/// Normalization rules:
/// 1) `https://` becomes `wss://`, `http://` becomes `ws://`, no scheme means `wss://`
/// 2) keep an existing `/websocket/peerAppgw` path unchanged
/// 3) append `/websocket/peerAppgw` otherwise
pub fn normalize_channel_url(input: &str) -> Result<String, ChannelError> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ChannelError::InvalidEndpoint(
            "endpoint must not be empty".to_owned(),
        ));
    }

    let with_scheme = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if trimmed.starts_with("wss://") || trimmed.starts_with("ws://") {
        trimmed.to_owned()
    } else if trimmed.contains("://") {
        return Err(ChannelError::InvalidEndpoint(format!(
            "unsupported scheme in {trimmed}"
        )));
    } else {
        format!("wss://{trimmed}")
    };

    let endpoint = if with_scheme.ends_with(CHANNEL_PATH) {
        with_scheme
    } else {
        format!("{with_scheme}{CHANNEL_PATH}")
    };

    let parsed = Url::parse(&endpoint)
        .map_err(|error| ChannelError::InvalidEndpoint(format!("{endpoint}: {error}")))?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => {
            return Err(ChannelError::InvalidEndpoint(format!(
                "{endpoint}: missing host"
            )));
        }
    }

    Ok(endpoint)
}
