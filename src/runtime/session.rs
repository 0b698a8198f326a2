//! One simulated editor-plugin client.
//!
//! A session owns its phase, counter, and keys. It runs the fixed handshake
//! (`RegisterChannel`, `GetUserApiKey`, `SubscribeChannelGroup`), then issues
//! completion requests at a randomized cadence until it hits the quota, loses
//! its credentials or connection, or sees the interrupt flag.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use wb_channel::{
    ChannelError, ClientMessage, Credentials, FrameSink, FrameSource, MessageFactory,
    ServerMessage,
};

use crate::config::SimulatorConfig;
use crate::fragments::{activity_lines, random_fragment, request_delay};
use crate::platform::{is_interrupted, InterruptSignal};
use crate::runtime::heartbeat::HeartbeatTask;
use crate::runtime::report::{SessionOutcome, SessionReport};

const INTERRUPT_POLL_INTERVAL: Duration = Duration::from_millis(25);
const ANSWER_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Socket open, `RegisterChannel` sent.
    Connected,
    /// Channel id received, `GetUserApiKey` sent.
    Registered,
    /// Api key received, `SubscribeChannelGroup` sent.
    Authorized,
    /// Subscribed; heartbeats running and completions scheduled.
    Active,
    Closing,
}

pub struct Session {
    factory: MessageFactory,
    config: Arc<SimulatorConfig>,
    interrupt: InterruptSignal,
    rng: StdRng,
    invoker_id: String,
    phase: SessionPhase,
    channel_id: Option<String>,
    api_key: Option<String>,
    completions: u32,
    awaiting_completion: bool,
    next_request_at: Option<Instant>,
    heartbeat: Option<HeartbeatTask>,
}

impl Session {
    pub fn new(
        credentials: Credentials,
        config: Arc<SimulatorConfig>,
        interrupt: InterruptSignal,
    ) -> Self {
        Self::with_rng(
            credentials,
            config,
            interrupt,
            StdRng::from_rng(&mut rand::rng()),
        )
    }

    /// Same as [`Session::new`] with a caller-supplied RNG for fragments and delays.
    pub fn with_rng(
        credentials: Credentials,
        config: Arc<SimulatorConfig>,
        interrupt: InterruptSignal,
        rng: StdRng,
    ) -> Self {
        let invoker_id = credentials.invoker_id.clone();
        Self {
            factory: MessageFactory::new(credentials, config.profile.clone()),
            config,
            interrupt,
            rng,
            invoker_id,
            phase: SessionPhase::Connected,
            channel_id: None,
            api_key: None,
            completions: 0,
            awaiting_completion: false,
            next_request_at: None,
            heartbeat: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Drive the session over an open connection until it terminates.
    ///
    /// The connection is always closed before this returns.
    pub async fn run<K: FrameSink, S: FrameSource>(
        mut self,
        sink: K,
        mut source: S,
    ) -> SessionReport {
        let started_at = OffsetDateTime::now_utc();
        let started = Instant::now();
        let sink = Arc::new(Mutex::new(sink));
        tracing::info!(
            invoker_id = %self.invoker_id,
            session_id = %self.factory.credentials().redacted_session_id(),
            "session started"
        );

        let outcome = self.drive(&sink, &mut source).await;

        self.phase = SessionPhase::Closing;
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.stop().await;
        }
        if let Err(error) = sink.lock().await.close().await {
            tracing::debug!(invoker_id = %self.invoker_id, %error, "close failed");
        }

        let elapsed = started.elapsed();
        tracing::info!(
            invoker_id = %self.invoker_id,
            completions = self.completions,
            elapsed_secs = elapsed.as_secs_f64(),
            %outcome,
            "session finished"
        );

        SessionReport {
            invoker_id: self.invoker_id,
            channel_id: self.channel_id,
            completions: self.completions,
            elapsed,
            started_at,
            outcome,
        }
    }

    async fn drive<K: FrameSink, S: FrameSource>(
        &mut self,
        sink: &Arc<Mutex<K>>,
        source: &mut S,
    ) -> SessionOutcome {
        let register = self.factory.register_channel();
        if let Err(error) = self.send(sink, &register).await {
            return self.lost(&error);
        }

        let mut interrupt_poll = interval(INTERRUPT_POLL_INTERVAL);
        interrupt_poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let due = self.next_request_at;
            tokio::select! {
                biased;

                _ = interrupt_poll.tick() => {
                    if is_interrupted(&self.interrupt) {
                        tracing::info!(invoker_id = %self.invoker_id, "interrupt observed");
                        return SessionOutcome::Interrupted;
                    }
                }
                frame = source.next_text() => match frame {
                    None => return SessionOutcome::ConnectionClosed,
                    Some(Err(error)) => return self.lost(&error),
                    Some(Ok(text)) => match self.handle_frame(sink, &text).await {
                        Ok(None) => {}
                        Ok(Some(outcome)) => return outcome,
                        Err(error) => return self.lost(&error),
                    },
                },
                _ = wait_until(due) => {
                    self.next_request_at = None;
                    if let Err(error) = self.send_completion_request(sink).await {
                        return self.lost(&error);
                    }
                }
            }
        }
    }

    async fn handle_frame<K: FrameSink>(
        &mut self,
        sink: &Arc<Mutex<K>>,
        text: &str,
    ) -> Result<Option<SessionOutcome>, ChannelError> {
        let message = match ServerMessage::decode(text) {
            Ok(message) => message,
            Err(error) => {
                tracing::warn!(invoker_id = %self.invoker_id, %error, "dropping malformed frame");
                return Ok(None);
            }
        };
        tracing::debug!(invoker_id = %self.invoker_id, message = message.name(), "received");

        match message {
            ServerMessage::ServerHeartbeat => {
                self.send(sink, &ClientMessage::ServerHeartbeatResponse)
                    .await?;
            }
            ServerMessage::ClientHeartbeatResponse => {}
            ServerMessage::RegisterChannelResp { channel_id }
                if self.phase == SessionPhase::Connected =>
            {
                tracing::info!(
                    invoker_id = %self.invoker_id,
                    channel_id = channel_id.as_deref().unwrap_or(""),
                    "channel registered"
                );
                self.channel_id = channel_id;
                self.phase = SessionPhase::Registered;
                let request = self.factory.get_user_api_key();
                self.send(sink, &request).await?;
            }
            ServerMessage::GetUserApiKeyResp { api_key } if self.phase == SessionPhase::Registered => {
                let Some(api_key) = api_key else {
                    tracing::warn!(invoker_id = %self.invoker_id, "no api key returned, credentials rejected");
                    return Ok(Some(SessionOutcome::CredentialsRejected));
                };
                tracing::info!(invoker_id = %self.invoker_id, "api key received");
                self.api_key = Some(api_key);
                self.phase = SessionPhase::Authorized;
                let request = self.factory.subscribe_channel_group();
                self.send(sink, &request).await?;
            }
            ServerMessage::SubscribeChannelGroupResp if self.phase == SessionPhase::Authorized => {
                tracing::info!(invoker_id = %self.invoker_id, "subscribed to channel group");
                self.phase = SessionPhase::Active;
                self.heartbeat = Some(HeartbeatTask::spawn(
                    Arc::clone(sink),
                    self.config.heartbeat_period,
                    self.invoker_id.clone(),
                ));
                self.next_request_at = Some(Instant::now() + self.config.warmup_delay);
            }
            ServerMessage::CodeGenRequestResp { answer }
                if self.phase == SessionPhase::Active && self.awaiting_completion =>
            {
                return self.complete_request(sink, answer.as_deref()).await;
            }
            ServerMessage::Unknown { name } => {
                tracing::debug!(invoker_id = %self.invoker_id, %name, "ignoring unknown message");
            }
            other => {
                tracing::debug!(
                    invoker_id = %self.invoker_id,
                    message = other.name(),
                    phase = ?self.phase,
                    "ignoring out-of-phase response"
                );
            }
        }

        Ok(None)
    }

    async fn complete_request<K: FrameSink>(
        &mut self,
        sink: &Arc<Mutex<K>>,
        answer: Option<&str>,
    ) -> Result<Option<SessionOutcome>, ChannelError> {
        self.awaiting_completion = false;
        self.completions += 1;
        let preview: String = answer
            .unwrap_or("")
            .chars()
            .take(ANSWER_PREVIEW_CHARS)
            .collect();
        tracing::info!(
            invoker_id = %self.invoker_id,
            completion = self.completions,
            max = self.config.max_completions,
            answer = %preview,
            "completion received"
        );

        if let Some(api_key) = self.api_key.as_deref() {
            let lines = activity_lines(&mut self.rng);
            let notify = self.factory.user_activity(api_key, lines);
            self.send(sink, &notify).await?;
        }

        if self.completions >= self.config.max_completions {
            return Ok(Some(SessionOutcome::QuotaReached));
        }

        let delay = request_delay(
            &mut self.rng,
            self.config.min_request_delay,
            self.config.max_request_delay,
        );
        self.next_request_at = Some(Instant::now() + delay);
        Ok(None)
    }

    async fn send_completion_request<K: FrameSink>(
        &mut self,
        sink: &Arc<Mutex<K>>,
    ) -> Result<(), ChannelError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(());
        };
        let fragment = random_fragment(&mut self.rng);
        let request = self.factory.code_gen_request(api_key, fragment);
        self.send(sink, &request).await?;
        self.awaiting_completion = true;
        Ok(())
    }

    async fn send<K: FrameSink>(
        &self,
        sink: &Mutex<K>,
        message: &ClientMessage,
    ) -> Result<(), ChannelError> {
        let frame = message.encode()?;
        sink.lock().await.send_text(frame).await?;
        tracing::debug!(invoker_id = %self.invoker_id, message = message.name(), "sent");
        Ok(())
    }

    fn lost(&self, error: &ChannelError) -> SessionOutcome {
        let outcome = SessionOutcome::lost(error);
        if matches!(outcome, SessionOutcome::ConnectionLost(_)) {
            tracing::error!(invoker_id = %self.invoker_id, %error, "connection lost");
        }
        outcome
    }
}

async fn wait_until(due: Option<Instant>) {
    match due {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use wb_channel::memory::memory_channel;

    use super::*;
    use crate::platform::interrupt_signal;

    #[tokio::test(start_paused = true)]
    async fn starts_in_connected_phase_and_registers_first() {
        let (sink, source, mut peer) = memory_channel();
        let session = Session::new(
            Credentials::new("186812", "abcd-1234"),
            Arc::new(SimulatorConfig::default()),
            interrupt_signal(),
        );
        assert_eq!(session.phase(), SessionPhase::Connected);

        let run = tokio::spawn(session.run(sink, source));
        let first = peer
            .recv_envelope()
            .await
            .expect("frame")
            .expect("valid envelope");
        assert_eq!(first.message_name, "RegisterChannel");

        peer.hang_up();
        let report = run.await.expect("session task");
        assert_eq!(report.outcome, SessionOutcome::ConnectionClosed);
        assert_eq!(report.completions, 0);
    }

    #[test]
    fn closed_and_lost_are_distinguished() {
        let session = Session::new(
            Credentials::new("1", "2"),
            Arc::new(SimulatorConfig::default()),
            interrupt_signal(),
        );
        assert_eq!(
            session.lost(&ChannelError::Closed),
            SessionOutcome::ConnectionClosed
        );
        assert!(matches!(
            session.lost(&ChannelError::Connect {
                endpoint: "wss://h/websocket/peerAppgw".into(),
                message: "refused".into(),
            }),
            SessionOutcome::ConnectionLost(_)
        ));
    }
}
