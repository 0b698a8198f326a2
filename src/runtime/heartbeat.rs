//! Periodic `ClientHeartbeat` sender.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use wb_channel::{ClientMessage, FrameSink};

/// Heartbeat loop sharing the session's outbound sink.
///
/// Sends immediately, then once per period, and stops on its own after the
/// first send failure.
pub struct HeartbeatTask {
    handle: JoinHandle<()>,
}

impl HeartbeatTask {
    pub fn spawn<K: FrameSink>(sink: Arc<Mutex<K>>, period: Duration, invoker_id: String) -> Self {
        let handle = tokio::spawn(async move {
            let frame = match ClientMessage::ClientHeartbeat.encode() {
                Ok(frame) => frame,
                Err(error) => {
                    tracing::warn!(%invoker_id, %error, "failed to encode heartbeat");
                    return;
                }
            };

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let sent = sink.lock().await.send_text(frame.clone()).await;
                match sent {
                    Ok(()) => tracing::debug!(%invoker_id, "sent ClientHeartbeat"),
                    Err(error) => {
                        tracing::warn!(%invoker_id, %error, "heartbeat send failed, stopping");
                        return;
                    }
                }
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Abort the loop and wait until the task has fully exited.
    pub async fn stop(self) {
        self.handle.abort();
        match self.handle.await {
            Ok(()) => {}
            Err(error) if error.is_cancelled() => {}
            Err(error) => tracing::warn!(%error, "heartbeat task ended abnormally"),
        }
    }
}
