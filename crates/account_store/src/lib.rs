//! Account file loading for batch simulation runs.
//!
//! One account per line as `invoker_id,session_id`. Blank lines and `#`
//! comments are ignored; malformed lines are reported and skipped, never fatal.

mod error;
mod store;
mod template;

pub use error::AccountStoreError;
pub use store::{load_accounts, parse_accounts, LoadedAccounts, SkipReason, SkippedLine};
pub use template::{write_template, ACCOUNTS_TEMPLATE, DEFAULT_ACCOUNTS_FILE};
