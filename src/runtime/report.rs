//! Session and batch outcomes.

use std::fmt;
use std::time::Duration;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use wb_channel::ChannelError;

use crate::runtime::orchestrator::SessionError;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    QuotaReached,
    /// `GetUserApiKey_resp` carried no key.
    CredentialsRejected,
    /// The peer closed the connection or the stream ended.
    ConnectionClosed,
    ConnectionLost(String),
    Interrupted,
}

impl SessionOutcome {
    pub(crate) fn lost(error: &ChannelError) -> Self {
        match error {
            ChannelError::Closed => Self::ConnectionClosed,
            other => Self::ConnectionLost(other.to_string()),
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaReached => write!(f, "quota reached"),
            Self::CredentialsRejected => write!(f, "credentials rejected"),
            Self::ConnectionClosed => write!(f, "connection closed by peer"),
            Self::ConnectionLost(reason) => write!(f, "connection lost: {reason}"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub invoker_id: String,
    pub channel_id: Option<String>,
    pub completions: u32,
    pub elapsed: Duration,
    pub started_at: OffsetDateTime,
    pub outcome: SessionOutcome,
}

impl SessionReport {
    pub fn started_at_rfc3339(&self) -> String {
        self.started_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.started_at.unix_timestamp().to_string())
    }
}

/// One account's result within a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub invoker_id: String,
    pub result: Result<SessionReport, SessionError>,
}

/// Per-account results in account-file order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn completed_sessions(&self) -> usize {
        self.entries.iter().filter(|entry| entry.result.is_ok()).count()
    }

    pub fn failed_sessions(&self) -> usize {
        self.entries.len() - self.completed_sessions()
    }

    pub fn total_completions(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|entry| entry.result.as_ref().ok())
            .map(|report| u64::from(report.completions))
            .sum()
    }

    /// True when there was at least one account and none of them ran.
    pub fn all_failed(&self) -> bool {
        !self.entries.is_empty() && self.completed_sessions() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(invoker_id: &str, completions: u32) -> SessionReport {
        SessionReport {
            invoker_id: invoker_id.to_owned(),
            channel_id: None,
            completions,
            elapsed: Duration::from_secs(1),
            started_at: OffsetDateTime::UNIX_EPOCH,
            outcome: SessionOutcome::QuotaReached,
        }
    }

    #[test]
    fn totals_skip_failed_entries() {
        let batch = BatchReport {
            entries: vec![
                BatchEntry {
                    invoker_id: "a".to_owned(),
                    result: Ok(report("a", 3)),
                },
                BatchEntry {
                    invoker_id: "b".to_owned(),
                    result: Err(SessionError::Panicked {
                        invoker_id: "b".to_owned(),
                    }),
                },
                BatchEntry {
                    invoker_id: "c".to_owned(),
                    result: Ok(report("c", 4)),
                },
            ],
        };

        assert_eq!(batch.completed_sessions(), 2);
        assert_eq!(batch.failed_sessions(), 1);
        assert_eq!(batch.total_completions(), 7);
        assert!(!batch.all_failed());
    }

    #[test]
    fn empty_batch_is_not_all_failed() {
        assert!(!BatchReport::default().all_failed());
    }

    #[test]
    fn closed_errors_map_to_connection_closed() {
        assert_eq!(
            SessionOutcome::lost(&ChannelError::Closed),
            SessionOutcome::ConnectionClosed
        );
        assert!(matches!(
            SessionOutcome::lost(&ChannelError::MissingMessageName),
            SessionOutcome::ConnectionLost(_)
        ));
    }

    #[test]
    fn started_at_formats_as_rfc3339() {
        assert_eq!(report("a", 0).started_at_rfc3339(), "1970-01-01T00:00:00Z");
    }
}
