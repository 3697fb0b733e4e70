//! Connection handling, request state machine and statistics for the
//! uqfacedetect service.
//!
//! The crate owns everything between the listening socket and the
//! computer-vision backend: admission control, the per-connection request
//! loop with its byte-exact error responses, the shared counters, and the
//! SIGHUP reporter. Vision work is reached through the [`FaceEngine`]
//! trait, so the whole wire contract is testable with a stub engine.

pub mod config;
pub mod engine;
pub mod reporter;
pub mod server;
pub mod session;
pub mod stats;

pub use config::{PortSpec, ServerConfig, UsageError};
pub use engine::{EngineError, FaceEngine};
pub use reporter::spawn_reporter;
pub use server::{FaceServer, ServerOptions};
pub use stats::{Stats, StatsSnapshot};
