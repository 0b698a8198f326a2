use std::fmt;

/// Protocol version announced in every request context.
pub const PROTOCOL_VERSION: &str = "2.0.0";
/// Application group the channel registers under.
pub const APP_GROUP_ID: &str = "aicode";
/// Channel group subscribed to after authorization.
pub const CHANNEL_GROUP_ID: &str = "aicode/comment/undefined";

const REDACTED_PREFIX_LEN: usize = 8;

/// Identity/session token pair obtained outside the simulator.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Identity token, sent as `invokerId`.
    pub invoker_id: String,
    /// Session token, sent as `sessionId`.
    pub session_id: String,
}

impl Credentials {
    pub fn new(invoker_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            invoker_id: invoker_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Session token shortened for logs.
    pub fn redacted_session_id(&self) -> String {
        let mut prefix: String = self.session_id.chars().take(REDACTED_PREFIX_LEN).collect();
        if prefix.len() < self.session_id.len() {
            prefix.push_str("...");
        }
        prefix
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("invoker_id", &self.invoker_id)
            .field("session_id", &self.redacted_session_id())
            .finish()
    }
}

/// Fixed strings an editor plugin reports about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientProfile {
    pub protocol_version: String,
    pub app_group_id: String,
    pub channel_group_id: String,
    pub client_type: String,
    pub client_version: String,
    pub plugin_version: String,
    pub platform: String,
    pub language: String,
    pub filename: String,
    pub project_name: String,
    pub max_new_tokens: u32,
    pub stop_words: Vec<String>,
}

impl Default for ClientProfile {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            app_group_id: APP_GROUP_ID.to_owned(),
            channel_group_id: CHANNEL_GROUP_ID.to_owned(),
            client_type: "vscode".to_owned(),
            client_version: "1.106.0-insider".to_owned(),
            plugin_version: "2.0.0".to_owned(),
            platform: detect_platform(),
            language: "javascript".to_owned(),
            filename: "simulator.js".to_owned(),
            project_name: "code-free".to_owned(),
            max_new_tokens: 256,
            stop_words: vec!["\n".to_owned()],
        }
    }
}

impl ClientProfile {
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_client_version(mut self, client_version: impl Into<String>) -> Self {
        self.client_version = client_version.into();
        self
    }

    pub fn with_plugin_version(mut self, plugin_version: impl Into<String>) -> Self {
        self.plugin_version = plugin_version.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

/// Platform string in the `<os>-<arch>` shape plugins report.
pub fn detect_platform() -> String {
    platform_label(std::env::consts::OS, std::env::consts::ARCH)
}

pub(crate) fn platform_label(os: &str, arch: &str) -> String {
    let arm = arch.contains("arm") || arch.contains("aarch64");
    match os {
        "macos" if arm => "macos-arm64".to_owned(),
        "macos" => "macos-x64".to_owned(),
        "windows" => "windows-x64".to_owned(),
        "linux" => "linux-x64".to_owned(),
        other => format!("{other}-{arch}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_label_maps_known_targets() {
        assert_eq!(platform_label("macos", "aarch64"), "macos-arm64");
        assert_eq!(platform_label("macos", "x86_64"), "macos-x64");
        assert_eq!(platform_label("windows", "x86_64"), "windows-x64");
        assert_eq!(platform_label("linux", "aarch64"), "linux-x64");
        assert_eq!(platform_label("freebsd", "x86_64"), "freebsd-x86_64");
    }

    #[test]
    fn debug_output_redacts_session_token() {
        let credentials = Credentials::new("186812", "488eb840-c068-4c75-9df3");
        let rendered = format!("{credentials:?}");

        assert!(rendered.contains("186812"));
        assert!(rendered.contains("488eb840..."));
        assert!(!rendered.contains("c068-4c75"));
    }

    #[test]
    fn short_session_tokens_are_not_padded() {
        let credentials = Credentials::new("1", "abcd");
        assert_eq!(credentials.redacted_session_id(), "abcd");
    }
}
