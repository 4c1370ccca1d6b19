//! Process action adapters.
//!
//! Platform-specific implementations of terminate / liveness / window
//! actions.

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

use crate::domain::{Pid, WindowHandle};
use crate::error::Result;
use crate::ports::ProcessActions;

#[cfg(not(any(unix, windows)))]
use crate::error::Error;

/// Process actions of the current platform.
pub struct PlatformProcessActions {
    #[cfg(unix)]
    inner: unix::UnixActions,

    #[cfg(windows)]
    inner: windows::WindowsActions,
}

impl PlatformProcessActions {
    /// Create the action adapter for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            inner: unix::UnixActions::new(),

            #[cfg(windows)]
            inner: windows::WindowsActions::new(),
        }
    }
}

impl Default for PlatformProcessActions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(unix, windows))]
impl ProcessActions for PlatformProcessActions {
    fn terminate(&self, pid: Pid) -> Result<()> {
        self.inner.terminate(pid)
    }

    fn is_running(&self, pid: Pid) -> bool {
        self.inner.is_running(pid)
    }

    fn supports_windows(&self) -> bool {
        self.inner.supports_windows()
    }

    fn main_window(&self, pid: Pid) -> Result<Option<WindowHandle>> {
        self.inner.main_window(pid)
    }

    fn set_foreground(&self, window: WindowHandle) -> Result<()> {
        self.inner.set_foreground(window)
    }
}

#[cfg(not(any(unix, windows)))]
impl ProcessActions for PlatformProcessActions {
    fn terminate(&self, pid: Pid) -> Result<()> {
        Err(Error::UnsupportedPlatform(format!(
            "cannot terminate process {} on this platform",
            pid
        )))
    }

    fn is_running(&self, _pid: Pid) -> bool {
        false
    }

    fn main_window(&self, _pid: Pid) -> Result<Option<WindowHandle>> {
        Err(Error::UnsupportedPlatform("no window system".to_string()))
    }

    fn set_foreground(&self, _window: WindowHandle) -> Result<()> {
        Err(Error::UnsupportedPlatform("no window system".to_string()))
    }
}

/// Internal trait for platform-specific implementations.
#[cfg_attr(not(any(unix, windows)), allow(dead_code))]
trait PlatformActions: Send + Sync {
    fn terminate(&self, pid: Pid) -> Result<()>;
    fn is_running(&self, pid: Pid) -> bool;
    fn supports_windows(&self) -> bool {
        false
    }
    fn main_window(&self, pid: Pid) -> Result<Option<WindowHandle>>;
    fn set_foreground(&self, window: WindowHandle) -> Result<()>;
}
