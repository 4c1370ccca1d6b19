//! haltkit Core Library
//!
//! Escalating termination of threads and process trees.
//! Provides functionality to:
//! - Run work on a dedicated thread that can be cancelled cooperatively and
//!   then force-aborted after a grace period
//! - Reap the descendants of a process, waiting for a natural exit first and
//!   killing survivors children-first
//! - Raise the windows of a process tree to the foreground (Windows)
//! - Manage escalation timings in a JSON settings file
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Escalation countdown and pure data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: Operating system implementations
//! - `application`: Use case services
//! - `worker`: Terminable threads
//!
//! # Platform Support
//! - Linux: Walks `/proc`, signals with `kill(2)`
//! - macOS: Uses the `ps` command, signals with `kill(2)`
//! - Windows: Toolhelp32 snapshots, `TerminateProcess`, window messages

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;
pub mod worker;

// Re-export domain types (primary API)
pub use domain::{
    Escalation, EscalationPolicy, Pid, RunOutcome, ShutdownReport, TerminalAction, WindowHandle,
};

// Re-export other commonly used types
pub use adapters::{broadcast_activation, PlatformProcessActions, PlatformProcessTable};
pub use application::ProcessTreeController;
pub use config::{ConfigStore, Settings};
pub use error::{Error, Result, WorkerError};
pub use worker::{CancelSignal, TerminableWorker, WorkerBuilder};
