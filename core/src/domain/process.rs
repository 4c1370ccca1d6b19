//! Process domain types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system process identifier.
///
/// Identifiers are recycled by the OS, so a `Pid` is only meaningful at the
/// moment it was read. Nothing in this crate caches pid mappings across polls.
pub type Pid = u32;

/// Opaque handle of a process's main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub isize);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// What the tree controller does to survivors on the final round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalAction {
    /// Terminate the process.
    Kill,
    /// Bring the process's main window to the foreground.
    Foreground,
}

impl fmt::Display for TerminalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalAction::Kill => write!(f, "kill"),
            TerminalAction::Foreground => write!(f, "foreground"),
        }
    }
}
