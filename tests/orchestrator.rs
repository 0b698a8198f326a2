mod backend;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use wb_channel::memory::{memory_channel, MemorySink, MemorySource};
use wb_channel::{ChannelError, Connector, Credentials};
use wbsim::{interrupt_signal, run_batch, run_single, SessionError, SessionOutcome};

use backend::{fast_config, run_backend, BackendBehavior};

enum Script {
    Serve(BackendBehavior),
    Refuse,
    Panic,
}

/// Hands out one scripted backend per connect call, in call order.
struct ScriptedConnector {
    scripts: Mutex<VecDeque<Script>>,
}

impl ScriptedConnector {
    fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
        }
    }
}

impl Connector for ScriptedConnector {
    type Sink = MemorySink;
    type Source = MemorySource;

    async fn connect(&self) -> Result<(MemorySink, MemorySource), ChannelError> {
        let script = self
            .scripts
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or(Script::Refuse);
        match script {
            Script::Serve(behavior) => {
                let (sink, source, peer) = memory_channel();
                tokio::spawn(run_backend(peer, behavior));
                Ok((sink, source))
            }
            Script::Refuse => Err(ChannelError::Connect {
                endpoint: "wss://backend.test/websocket/peerAppgw".to_owned(),
                message: "connection refused".to_owned(),
            }),
            Script::Panic => panic!("scripted connector panic"),
        }
    }
}

fn accounts(ids: &[&str]) -> Vec<Credentials> {
    ids.iter()
        .map(|id| Credentials::new(*id, format!("session-{id}")))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn rejected_account_does_not_affect_the_others() {
    let connector = Arc::new(ScriptedConnector::new(vec![
        Script::Serve(BackendBehavior::default()),
        Script::Serve(BackendBehavior {
            api_key: None,
            ..BackendBehavior::default()
        }),
        Script::Serve(BackendBehavior::default()),
    ]));

    let report = run_batch(
        accounts(&["a", "b", "c"]),
        Arc::new(fast_config(2)),
        connector,
        interrupt_signal(),
    )
    .await;

    let outcomes: Vec<SessionOutcome> = report
        .entries
        .iter()
        .map(|entry| entry.result.as_ref().expect("session ran").outcome.clone())
        .collect();
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| **outcome == SessionOutcome::CredentialsRejected)
            .count(),
        1
    );
    assert_eq!(
        outcomes
            .iter()
            .filter(|outcome| **outcome == SessionOutcome::QuotaReached)
            .count(),
        2
    );
    assert_eq!(report.total_completions(), 4);
    assert_eq!(report.failed_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn results_keep_account_order() {
    let connector = Arc::new(ScriptedConnector::new(vec![
        Script::Serve(BackendBehavior::default()),
        Script::Refuse,
        Script::Serve(BackendBehavior::default()),
        Script::Serve(BackendBehavior::default()),
    ]));

    let report = run_batch(
        accounts(&["first", "second", "third", "fourth"]),
        Arc::new(fast_config(1)),
        connector,
        interrupt_signal(),
    )
    .await;

    let ids: Vec<&str> = report
        .entries
        .iter()
        .map(|entry| entry.invoker_id.as_str())
        .collect();
    assert_eq!(ids, vec!["first", "second", "third", "fourth"]);
    for entry in report.entries.iter().filter_map(|entry| entry.result.as_ref().ok()) {
        assert_eq!(entry.completions, 1);
    }
    assert_eq!(report.failed_sessions(), 1);
    assert!(!report.all_failed());
}

#[tokio::test(start_paused = true)]
async fn refused_connections_fail_every_entry() {
    let connector = Arc::new(ScriptedConnector::new(Vec::new()));

    let report = run_batch(
        accounts(&["a", "b"]),
        Arc::new(fast_config(1)),
        connector,
        interrupt_signal(),
    )
    .await;

    assert!(report.all_failed());
    for entry in &report.entries {
        assert_matches!(
            &entry.result,
            Err(SessionError::Connect { invoker_id, .. }) if *invoker_id == entry.invoker_id
        );
    }
}

#[tokio::test(start_paused = true)]
async fn panicking_session_is_reported_not_propagated() {
    let connector = Arc::new(ScriptedConnector::new(vec![
        Script::Panic,
        Script::Serve(BackendBehavior::default()),
    ]));

    let report = run_batch(
        accounts(&["boom", "fine"]),
        Arc::new(fast_config(1)),
        connector,
        interrupt_signal(),
    )
    .await;

    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.failed_sessions(), 1);
    assert_eq!(report.completed_sessions(), 1);
    let failed = report
        .entries
        .iter()
        .find_map(|entry| entry.result.as_ref().err())
        .expect("one failure");
    assert_matches!(failed, SessionError::Panicked { .. });
}

#[tokio::test(start_paused = true)]
async fn single_session_reports_connect_failure() {
    let connector = ScriptedConnector::new(vec![Script::Refuse]);

    let result = run_single(
        Credentials::new("solo", "token"),
        Arc::new(fast_config(1)),
        &connector,
        interrupt_signal(),
    )
    .await;

    let error = result.expect_err("connect should fail");
    assert_eq!(error.invoker_id(), "solo");
    assert_matches!(error, SessionError::Connect { .. });
}
