#![allow(dead_code)]

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use wb_channel::memory::{memory_channel, MemoryPeer, PeerFrame};
use wb_channel::{unwrap_frame, Credentials, Envelope, ServerMessage};
use wbsim::{InterruptSignal, Session, SessionReport, SimulatorConfig};

pub const INVOKER_ID: &str = "186812";
pub const SESSION_ID: &str = "abcd-1234";
pub const API_KEY: &str = "key-0001";

/// How the scripted backend answers the client.
#[derive(Debug, Clone)]
pub struct BackendBehavior {
    pub channel_id: Option<String>,
    pub api_key: Option<String>,
    pub answer: String,
    /// Push a `ServerHeartbeat` before answering `RegisterChannel`.
    pub server_heartbeat: bool,
    /// Push undecodable frames before answering `RegisterChannel`.
    pub garbage_frames: bool,
    pub duplicate_register: bool,
    pub duplicate_completion: bool,
    /// Send envelopes without the `<WBChannel>` markers.
    pub bare_frames: bool,
    pub hang_up_after_completions: Option<u32>,
    pub answer_completions: bool,
}

impl Default for BackendBehavior {
    fn default() -> Self {
        Self {
            channel_id: Some("chan-42".to_owned()),
            api_key: Some(API_KEY.to_owned()),
            answer: "console.log('hello from the completion backend, with more than fifty characters');"
                .to_owned(),
            server_heartbeat: false,
            garbage_frames: false,
            duplicate_register: false,
            duplicate_completion: false,
            bare_frames: false,
            hang_up_after_completions: None,
            answer_completions: true,
        }
    }
}

/// What the backend saw from the client.
#[derive(Debug, Default)]
pub struct BackendLog {
    pub envelopes: Vec<Envelope>,
    pub closed: bool,
}

impl BackendLog {
    pub fn names(&self) -> Vec<&str> {
        self.envelopes
            .iter()
            .map(|envelope| envelope.message_name.as_str())
            .collect()
    }

    /// Message names with the periodic `ClientHeartbeat` traffic removed.
    pub fn names_without_heartbeats(&self) -> Vec<&str> {
        self.names()
            .into_iter()
            .filter(|name| *name != "ClientHeartbeat")
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|seen| **seen == name).count()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names().iter().position(|seen| *seen == name)
    }
}

fn push(peer: &MemoryPeer, behavior: &BackendBehavior, message: ServerMessage) {
    let frame = message
        .to_envelope()
        .encode()
        .expect("server envelope should encode");
    if behavior.bare_frames {
        peer.send_raw(unwrap_frame(&frame).to_owned());
    } else {
        peer.send_raw(frame);
    }
}

pub async fn run_backend(mut peer: MemoryPeer, behavior: BackendBehavior) -> BackendLog {
    let mut log = BackendLog::default();
    let mut completions = 0u32;

    while let Some(frame) = peer.recv().await {
        let text = match frame {
            PeerFrame::Text(text) => text,
            PeerFrame::Close => {
                log.closed = true;
                break;
            }
        };
        let envelope = Envelope::decode(&text).expect("client frames should decode");
        let name = envelope.message_name.clone();
        log.envelopes.push(envelope);

        match name.as_str() {
            "RegisterChannel" => {
                if behavior.server_heartbeat {
                    push(&peer, &behavior, ServerMessage::ServerHeartbeat);
                }
                if behavior.garbage_frames {
                    peer.send_raw("not json at all");
                    peer.send_raw("<WBChannel>{\"context\":{}}</WBChannel>");
                    peer.send_raw("<WBChannel>{\"messageName\":</WBChannel>");
                    push(
                        &peer,
                        &behavior,
                        ServerMessage::Unknown {
                            name: "SomethingNew".to_owned(),
                        },
                    );
                }
                let response = ServerMessage::RegisterChannelResp {
                    channel_id: behavior.channel_id.clone(),
                };
                push(&peer, &behavior, response.clone());
                if behavior.duplicate_register {
                    push(&peer, &behavior, response);
                }
            }
            "GetUserApiKey" => push(
                &peer,
                &behavior,
                ServerMessage::GetUserApiKeyResp {
                    api_key: behavior.api_key.clone(),
                },
            ),
            "SubscribeChannelGroup" => {
                push(&peer, &behavior, ServerMessage::SubscribeChannelGroupResp)
            }
            "CodeGenRequest" if behavior.answer_completions => {
                completions += 1;
                let response = ServerMessage::CodeGenRequestResp {
                    answer: Some(behavior.answer.clone()),
                };
                push(&peer, &behavior, response.clone());
                if behavior.duplicate_completion {
                    push(&peer, &behavior, response);
                }
                if behavior.hang_up_after_completions == Some(completions) {
                    peer.hang_up();
                }
            }
            "ClientHeartbeat" => push(&peer, &behavior, ServerMessage::ClientHeartbeatResponse),
            _ => {}
        }
    }

    log
}

pub fn fast_config(max_completions: u32) -> SimulatorConfig {
    SimulatorConfig::default().with_max_completions(max_completions)
}

/// Run one seeded session against the scripted backend.
pub async fn run_scenario(
    config: SimulatorConfig,
    behavior: BackendBehavior,
    interrupt: InterruptSignal,
) -> (SessionReport, BackendLog) {
    let (sink, source, peer) = memory_channel();
    let backend = tokio::spawn(run_backend(peer, behavior));

    let report = Session::with_rng(
        Credentials::new(INVOKER_ID, SESSION_ID),
        Arc::new(config),
        interrupt,
        StdRng::seed_from_u64(7),
    )
    .run(sink, source)
    .await;

    let log = backend.await.expect("backend task should finish");
    (report, log)
}
