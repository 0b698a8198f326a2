//! Session runtime: per-account state machine, heartbeats, and the batch orchestrator.

pub mod heartbeat;
pub mod orchestrator;
pub mod report;
pub mod session;

pub use heartbeat::HeartbeatTask;
pub use orchestrator::{run_batch, run_single, SessionError};
pub use report::{BatchEntry, BatchReport, SessionOutcome, SessionReport};
pub use session::{Session, SessionPhase};
