use std::fmt;
use std::fs;
use std::path::Path;

use tracing::warn;
use wb_channel::Credentials;

use crate::error::AccountStoreError;

/// Why a line was left out of the account list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingSeparator,
    EmptyField,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSeparator => write!(f, "expected `invoker_id,session_id`"),
            Self::EmptyField => write!(f, "invoker_id and session_id must be non-empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedAccounts {
    pub accounts: Vec<Credentials>,
    pub skipped: Vec<SkippedLine>,
}

impl LoadedAccounts {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

pub fn load_accounts(path: &Path) -> Result<LoadedAccounts, AccountStoreError> {
    let text = fs::read_to_string(path)
        .map_err(|source| AccountStoreError::io("reading account file", path, source))?;
    let loaded = parse_accounts(&text);
    for skipped in &loaded.skipped {
        warn!(
            path = %path.display(),
            line = skipped.line,
            reason = %skipped.reason,
            "skipping malformed account line"
        );
    }
    Ok(loaded)
}

pub fn parse_accounts(text: &str) -> LoadedAccounts {
    let mut loaded = LoadedAccounts::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Ok(credentials) => loaded.accounts.push(credentials),
            Err(reason) => loaded.skipped.push(SkippedLine {
                line: index + 1,
                reason,
            }),
        }
    }

    loaded
}

fn parse_line(line: &str) -> Result<Credentials, SkipReason> {
    let mut fields = line.split(',').map(str::trim);
    let (Some(invoker_id), Some(session_id)) = (fields.next(), fields.next()) else {
        return Err(SkipReason::MissingSeparator);
    };
    if invoker_id.is_empty() || session_id.is_empty() {
        return Err(SkipReason::EmptyField);
    }
    Ok(Credentials::new(invoker_id, session_id))
}
