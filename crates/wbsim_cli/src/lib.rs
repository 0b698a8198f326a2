//! `wbsim` command-line front end.
//!
//! ## Endpoint
//!
//! There is no built-in backend host. Pass `--endpoint`, set `WBSIM_ENDPOINT`,
//! or put `"endpoint"` in the JSON config file. A bare base URL such as
//! `https://host` is mapped to `wss://host/websocket/peerAppgw`.
//!
//! ## Config file
//!
//! `--config <file.json>` (or `WBSIM_CONFIG`) points at an optional file:
//!
//! ```json
//! {
//!   "endpoint": "wss://backend.example",
//!   "max_completions": 50,
//!   "heartbeat_period_ms": 10000,
//!   "min_request_delay_ms": 500,
//!   "max_request_delay_ms": 2500
//! }
//! ```
//!
//! Unknown fields are rejected. Command-line flags win over environment
//! variables, which win over the file, which wins over built-in defaults.
//!
//! ## Exit status
//!
//! `0` when sessions ran, whatever their outcome. `1` on configuration or
//! input errors, or when every session failed to connect.

pub mod cli;
pub mod commands;
