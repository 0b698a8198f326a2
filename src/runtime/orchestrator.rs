//! Launching independent sessions, one per account.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::task::JoinSet;
use wb_channel::{ChannelError, Connector, Credentials};

use crate::config::SimulatorConfig;
use crate::platform::InterruptSignal;
use crate::runtime::report::{BatchEntry, BatchReport, SessionReport};
use crate::runtime::session::Session;

/// A session that never produced a report.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {invoker_id} could not connect: {source}")]
    Connect {
        invoker_id: String,
        #[source]
        source: ChannelError,
    },

    #[error("session {invoker_id} panicked")]
    Panicked { invoker_id: String },
}

impl SessionError {
    pub fn invoker_id(&self) -> &str {
        match self {
            Self::Connect { invoker_id, .. } | Self::Panicked { invoker_id } => invoker_id,
        }
    }
}

/// Connect and run one session to completion.
pub async fn run_single<C: Connector>(
    credentials: Credentials,
    config: Arc<SimulatorConfig>,
    connector: &C,
    interrupt: InterruptSignal,
) -> Result<SessionReport, SessionError> {
    let invoker_id = credentials.invoker_id.clone();
    let (sink, source) = match connector.connect().await {
        Ok(halves) => halves,
        Err(source) => {
            tracing::error!(%invoker_id, error = %source, "failed to connect");
            return Err(SessionError::Connect { invoker_id, source });
        }
    };
    tracing::info!(%invoker_id, "connected");

    Ok(Session::new(credentials, config, interrupt)
        .run(sink, source)
        .await)
}

/// Run every account concurrently and collect results in account order.
///
/// A failing or panicking session is recorded against its own account only.
pub async fn run_batch<C: Connector>(
    accounts: Vec<Credentials>,
    config: Arc<SimulatorConfig>,
    connector: Arc<C>,
    interrupt: InterruptSignal,
) -> BatchReport {
    let invoker_ids: Vec<String> = accounts
        .iter()
        .map(|credentials| credentials.invoker_id.clone())
        .collect();
    let mut slots: Vec<Option<Result<SessionReport, SessionError>>> =
        invoker_ids.iter().map(|_| None).collect();

    tracing::info!(sessions = accounts.len(), "launching sessions");
    let mut tasks = JoinSet::new();
    for (index, credentials) in accounts.into_iter().enumerate() {
        let invoker_id = credentials.invoker_id.clone();
        let config = Arc::clone(&config);
        let connector = Arc::clone(&connector);
        let interrupt = Arc::clone(&interrupt);
        tasks.spawn(async move {
            let run = run_single(credentials, config, &*connector, interrupt);
            let result = match AssertUnwindSafe(run).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(%invoker_id, "session panicked");
                    Err(SessionError::Panicked { invoker_id })
                }
            };
            (index, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(error) => tracing::warn!(%error, "session task did not complete"),
        }
    }

    let entries = invoker_ids
        .into_iter()
        .zip(slots)
        .map(|(invoker_id, slot)| BatchEntry {
            result: slot.unwrap_or_else(|| {
                Err(SessionError::Panicked {
                    invoker_id: invoker_id.clone(),
                })
            }),
            invoker_id,
        })
        .collect();

    BatchReport { entries }
}
