//! Simulated editor-plugin clients for WBChannel completion backends.
//!
//! Invariant: within one session, `RegisterChannel` strictly precedes
//! `GetUserApiKey`, which strictly precedes any `CodeGenRequest`.
//!
//! # Public API Overview
//! - Run one simulated client over any transport with [`Session::run`].
//! - Launch many independent sessions with [`run_batch`]; each account gets its
//!   own connection and its own outcome in the returned [`BatchReport`].
//! - Configure cadence and client identity through [`SimulatorConfig`],
//!   optionally layered from a JSON [`FileConfig`].
//! - Observe SIGINT/SIGTERM through a shared [`InterruptSignal`].
//!
//! Wire framing and message shapes live in the `wb_channel` crate.

pub mod config;
pub mod fragments;
pub mod logging;
pub mod platform;
pub mod runtime;

pub use crate::config::{ConfigError, FileConfig, SimulatorConfig};
pub use crate::logging::{init_logging, LogFormat, LoggingError};
pub use crate::platform::{interrupt_signal, is_interrupted, InterruptSignal};
pub use crate::runtime::{
    run_batch, run_single, BatchEntry, BatchReport, HeartbeatTask, Session, SessionError,
    SessionOutcome, SessionPhase, SessionReport,
};
