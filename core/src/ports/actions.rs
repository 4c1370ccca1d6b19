//! Process actions port (interface).

use crate::domain::{Pid, WindowHandle};
use crate::error::Result;

/// Port for acting on individual processes.
///
/// This trait defines the terminal actions of the tree controller.
/// Implementations handle platform-specific signal and window handling.
pub trait ProcessActions: Send + Sync {
    /// Terminate a process immediately (SIGKILL / TerminateProcess).
    ///
    /// Returns `Error::ProcessNotFound` if the pid no longer resolves.
    fn terminate(&self, pid: Pid) -> Result<()>;

    /// Check if a process is still running.
    fn is_running(&self, pid: Pid) -> bool;

    /// Whether this platform has top-level windows to act on.
    fn supports_windows(&self) -> bool {
        false
    }

    /// Find the main window of a process, if it has one.
    fn main_window(&self, pid: Pid) -> Result<Option<WindowHandle>>;

    /// Ask the window manager to make `window` the foreground window.
    fn set_foreground(&self, window: WindowHandle) -> Result<()>;
}
