use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::{ClientProfile, Credentials};
use crate::error::ChannelError;
use crate::frame::{unwrap_frame, wrap_frame};

pub const REGISTER_CHANNEL: &str = "RegisterChannel";
pub const REGISTER_CHANNEL_RESP: &str = "RegisterChannel_resp";
pub const GET_USER_API_KEY: &str = "GetUserApiKey";
pub const GET_USER_API_KEY_RESP: &str = "GetUserApiKey_resp";
pub const SUBSCRIBE_CHANNEL_GROUP: &str = "SubscribeChannelGroup";
pub const SUBSCRIBE_CHANNEL_GROUP_RESP: &str = "SubscribeChannelGroup_resp";
pub const CODE_GEN_REQUEST: &str = "CodeGenRequest";
pub const CODE_GEN_REQUEST_RESP: &str = "CodeGenRequest_resp";
pub const USER_ACTIVITY_NOTIFY: &str = "UserActivityNotify";
pub const CLIENT_HEARTBEAT: &str = "ClientHeartbeat";
pub const CLIENT_HEARTBEAT_RESPONSE: &str = "ClientHeartbeatResponse";
pub const SERVER_HEARTBEAT: &str = "ServerHeartbeat";
pub const SERVER_HEARTBEAT_RESPONSE: &str = "ServerHeartbeatResponse";

/// Wire envelope shared by every message in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub message_name: String,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl Envelope {
    pub fn new(message_name: impl Into<String>) -> Self {
        Self {
            message_name: message_name.into(),
            context: None,
            payload: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Serialize and wrap for transmission.
    pub fn encode(&self) -> Result<String, ChannelError> {
        let json = serde_json::to_string(self).map_err(ChannelError::Encode)?;
        Ok(wrap_frame(&json))
    }

    /// Parse a wrapped or bare inbound frame.
    pub fn decode(frame: &str) -> Result<Self, ChannelError> {
        let envelope: Self =
            serde_json::from_str(unwrap_frame(frame)).map_err(ChannelError::Decode)?;
        if envelope.message_name.trim().is_empty() {
            return Err(ChannelError::MissingMessageName);
        }
        Ok(envelope)
    }

    fn context_str(&self, key: &str) -> Option<String> {
        string_field(self.context.as_ref(), key)
    }

    fn payload_str(&self, key: &str) -> Option<String> {
        string_field(self.payload.as_ref(), key)
    }
}

fn string_field(section: Option<&Value>, key: &str) -> Option<String> {
    section
        .and_then(|value| value.get(key))
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterChannelContext {
    pub message_name: String,
    #[serde(rename = "appGId")]
    pub app_group_id: String,
    pub invoker_id: String,
    pub session_id: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyContext {
    pub message_name: String,
    pub req_id: String,
    pub invoker_id: String,
    pub session_id: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeContext {
    pub message_name: String,
    pub invoker_id: String,
    pub group_id: String,
    pub req_id: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeGenContext {
    pub message_name: String,
    pub req_id: String,
    pub invoker_id: String,
    pub session_id: String,
    pub version: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityContext {
    pub message_name: String,
    pub req_id: String,
    pub invoker_id: String,
    pub version: String,
    pub api_key: String,
}

/// Client metadata attached to key and completion requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_type: String,
    pub client_version: String,
    pub client_platform: String,
    pub git_urls: Vec<String>,
    pub plugin_version: String,
}

/// Editor buffer around the cursor for one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFragment {
    pub prefix: String,
    pub suffix: String,
}

/// Generation parameters; field names are snake_case on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeGenMessages {
    pub language: String,
    pub filename: String,
    pub prefix: String,
    pub suffix: String,
    pub max_new_tokens: u32,
    pub stop_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeGenPayload {
    #[serde(flatten)]
    pub client: ClientInfo,
    pub messages: CodeGenMessages,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityClient {
    pub platform: String,
    #[serde(rename = "type")]
    pub client_type: String,
    pub version: String,
    pub plugin_version: String,
    pub git_url: String,
    pub git_urls: Vec<String>,
    pub project_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    pub client: ActivityClient,
    pub activity_type: String,
    pub service: String,
    pub lines: f64,
    pub count: u32,
}

/// Messages the simulated client sends.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    RegisterChannel(RegisterChannelContext),
    GetUserApiKey {
        context: ApiKeyContext,
        payload: ClientInfo,
    },
    SubscribeChannelGroup(SubscribeContext),
    CodeGenRequest {
        context: CodeGenContext,
        payload: CodeGenPayload,
    },
    UserActivityNotify {
        context: ActivityContext,
        payload: ActivityPayload,
    },
    ClientHeartbeat,
    ServerHeartbeatResponse,
}

impl ClientMessage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterChannel(_) => REGISTER_CHANNEL,
            Self::GetUserApiKey { .. } => GET_USER_API_KEY,
            Self::SubscribeChannelGroup(_) => SUBSCRIBE_CHANNEL_GROUP,
            Self::CodeGenRequest { .. } => CODE_GEN_REQUEST,
            Self::UserActivityNotify { .. } => USER_ACTIVITY_NOTIFY,
            Self::ClientHeartbeat => CLIENT_HEARTBEAT,
            Self::ServerHeartbeatResponse => SERVER_HEARTBEAT_RESPONSE,
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope, ChannelError> {
        let envelope = Envelope::new(self.name());
        let envelope = match self {
            Self::RegisterChannel(context) => envelope.with_context(to_value(context)?),
            Self::GetUserApiKey { context, payload } => envelope
                .with_context(to_value(context)?)
                .with_payload(to_value(payload)?),
            Self::SubscribeChannelGroup(context) => envelope.with_context(to_value(context)?),
            Self::CodeGenRequest { context, payload } => envelope
                .with_context(to_value(context)?)
                .with_payload(to_value(payload)?),
            Self::UserActivityNotify { context, payload } => envelope
                .with_context(to_value(context)?)
                .with_payload(to_value(payload)?),
            Self::ClientHeartbeat | Self::ServerHeartbeatResponse => envelope,
        };
        Ok(envelope)
    }

    pub fn encode(&self) -> Result<String, ChannelError> {
        self.to_envelope()?.encode()
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ChannelError> {
    serde_json::to_value(value).map_err(ChannelError::Encode)
}

/// Messages the backend sends, reduced to the fields the client acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    RegisterChannelResp { channel_id: Option<String> },
    GetUserApiKeyResp { api_key: Option<String> },
    SubscribeChannelGroupResp,
    CodeGenRequestResp { answer: Option<String> },
    ServerHeartbeat,
    ClientHeartbeatResponse,
    Unknown { name: String },
}

impl ServerMessage {
    pub fn decode(frame: &str) -> Result<Self, ChannelError> {
        Envelope::decode(frame).map(Self::from_envelope)
    }

    pub fn from_envelope(envelope: Envelope) -> Self {
        match envelope.message_name.as_str() {
            REGISTER_CHANNEL_RESP => Self::RegisterChannelResp {
                channel_id: envelope.context_str("channelId"),
            },
            GET_USER_API_KEY_RESP => Self::GetUserApiKeyResp {
                api_key: envelope.payload_str("apiKey"),
            },
            SUBSCRIBE_CHANNEL_GROUP_RESP => Self::SubscribeChannelGroupResp,
            CODE_GEN_REQUEST_RESP => Self::CodeGenRequestResp {
                answer: envelope.payload_str("answer"),
            },
            SERVER_HEARTBEAT => Self::ServerHeartbeat,
            CLIENT_HEARTBEAT_RESPONSE => Self::ClientHeartbeatResponse,
            _ => Self::Unknown {
                name: envelope.message_name,
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::RegisterChannelResp { .. } => REGISTER_CHANNEL_RESP,
            Self::GetUserApiKeyResp { .. } => GET_USER_API_KEY_RESP,
            Self::SubscribeChannelGroupResp => SUBSCRIBE_CHANNEL_GROUP_RESP,
            Self::CodeGenRequestResp { .. } => CODE_GEN_REQUEST_RESP,
            Self::ServerHeartbeat => SERVER_HEARTBEAT,
            Self::ClientHeartbeatResponse => CLIENT_HEARTBEAT_RESPONSE,
            Self::Unknown { name } => name,
        }
    }

    /// Envelope in the shape the backend emits; used by scripted peers.
    pub fn to_envelope(&self) -> Envelope {
        let envelope = Envelope::new(self.name());
        match self {
            Self::RegisterChannelResp { channel_id } => {
                envelope.with_context(serde_json::json!({ "channelId": channel_id }))
            }
            Self::GetUserApiKeyResp { api_key } => {
                envelope.with_payload(serde_json::json!({ "apiKey": api_key }))
            }
            Self::CodeGenRequestResp { answer } => {
                envelope.with_payload(serde_json::json!({ "answer": answer }))
            }
            _ => envelope,
        }
    }
}

/// Builds outbound messages for one set of credentials.
#[derive(Debug, Clone)]
pub struct MessageFactory {
    credentials: Credentials,
    profile: ClientProfile,
}

impl MessageFactory {
    pub fn new(credentials: Credentials, profile: ClientProfile) -> Self {
        Self {
            credentials,
            profile,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn profile(&self) -> &ClientProfile {
        &self.profile
    }

    pub fn register_channel(&self) -> ClientMessage {
        ClientMessage::RegisterChannel(RegisterChannelContext {
            message_name: REGISTER_CHANNEL.to_owned(),
            app_group_id: self.profile.app_group_id.clone(),
            invoker_id: self.credentials.invoker_id.clone(),
            session_id: self.credentials.session_id.clone(),
            version: self.profile.protocol_version.clone(),
        })
    }

    pub fn get_user_api_key(&self) -> ClientMessage {
        ClientMessage::GetUserApiKey {
            context: ApiKeyContext {
                message_name: GET_USER_API_KEY.to_owned(),
                req_id: new_req_id(),
                invoker_id: self.credentials.invoker_id.clone(),
                session_id: self.credentials.session_id.clone(),
                version: self.profile.protocol_version.clone(),
            },
            payload: self.client_info(),
        }
    }

    pub fn subscribe_channel_group(&self) -> ClientMessage {
        ClientMessage::SubscribeChannelGroup(SubscribeContext {
            message_name: SUBSCRIBE_CHANNEL_GROUP.to_owned(),
            invoker_id: self.credentials.invoker_id.clone(),
            group_id: self.profile.channel_group_id.clone(),
            req_id: new_req_id(),
            version: self.profile.protocol_version.clone(),
        })
    }

    pub fn code_gen_request(&self, api_key: &str, fragment: CodeFragment) -> ClientMessage {
        ClientMessage::CodeGenRequest {
            context: CodeGenContext {
                message_name: CODE_GEN_REQUEST.to_owned(),
                req_id: new_req_id(),
                invoker_id: self.credentials.invoker_id.clone(),
                session_id: self.credentials.session_id.clone(),
                version: self.profile.protocol_version.clone(),
                api_key: api_key.to_owned(),
            },
            payload: CodeGenPayload {
                client: self.client_info(),
                messages: CodeGenMessages {
                    language: self.profile.language.clone(),
                    filename: self.profile.filename.clone(),
                    prefix: fragment.prefix,
                    suffix: fragment.suffix,
                    max_new_tokens: self.profile.max_new_tokens,
                    stop_words: self.profile.stop_words.clone(),
                },
            },
        }
    }

    pub fn user_activity(&self, api_key: &str, lines: f64) -> ClientMessage {
        ClientMessage::UserActivityNotify {
            context: ActivityContext {
                message_name: USER_ACTIVITY_NOTIFY.to_owned(),
                req_id: new_req_id(),
                invoker_id: self.credentials.invoker_id.clone(),
                version: self.profile.protocol_version.clone(),
                api_key: api_key.to_owned(),
            },
            payload: ActivityPayload {
                client: ActivityClient {
                    platform: self.profile.platform.clone(),
                    client_type: self.profile.client_type.clone(),
                    version: self.profile.client_version.clone(),
                    plugin_version: self.profile.plugin_version.clone(),
                    git_url: String::new(),
                    git_urls: Vec::new(),
                    project_name: self.profile.project_name.clone(),
                },
                activity_type: "code_display".to_owned(),
                service: "codegen".to_owned(),
                lines,
                count: 1,
            },
        }
    }

    fn client_info(&self) -> ClientInfo {
        ClientInfo {
            client_type: self.profile.client_type.clone(),
            client_version: self.profile.client_version.clone(),
            client_platform: self.profile.platform.clone(),
            git_urls: Vec::new(),
            plugin_version: self.profile.plugin_version.clone(),
        }
    }
}

fn new_req_id() -> String {
    Uuid::new_v4().to_string()
}
