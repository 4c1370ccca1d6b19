//! Domain layer - Pure data models and the escalation countdown.
//!
//! These types have no OS dependencies and can be tested in isolation.

mod outcome;
mod policy;
mod process;

// Re-export all domain types
pub use outcome::{RunOutcome, ShutdownReport};
pub use policy::{Escalation, EscalationPolicy};
pub use process::{Pid, TerminalAction, WindowHandle};
