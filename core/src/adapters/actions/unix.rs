//! Unix process actions using signals.
//!
//! - SIGKILL (9) for termination
//! - signal 0 (`kill(pid, None)`) as the liveness probe
//!
//! Unix has no notion of a process's main window, so the window actions
//! report `Error::UnsupportedPlatform`.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid as NixPid;
use tracing::{debug, warn};

use crate::domain::{Pid, WindowHandle};
use crate::error::{Error, Result};

use super::PlatformActions;

/// Unix process actions implementation.
#[derive(Debug, Default)]
pub struct UnixActions;

impl UnixActions {
    pub fn new() -> Self {
        Self
    }

    fn to_nix(pid: Pid) -> Result<NixPid> {
        // pid 0 and negative values address process groups; never send those.
        match i32::try_from(pid) {
            Ok(raw) if raw > 0 => Ok(NixPid::from_raw(raw)),
            _ => Err(Error::InvalidArgument(format!("{} is not a process id", pid))),
        }
    }
}

impl PlatformActions for UnixActions {
    fn terminate(&self, pid: Pid) -> Result<()> {
        debug!(pid = pid, "Sending SIGKILL");

        match kill(Self::to_nix(pid)?, Signal::SIGKILL) {
            Ok(()) => {
                debug!(pid = pid, "SIGKILL sent successfully");
                Ok(())
            }
            Err(Errno::ESRCH) => {
                debug!(pid = pid, "Process not found");
                Err(Error::ProcessNotFound(pid))
            }
            Err(Errno::EPERM) => {
                warn!(pid = pid, "Permission denied to kill process");
                Err(Error::PermissionDenied(pid))
            }
            Err(e) => Err(Error::KillFailed {
                pid,
                reason: e.to_string(),
            }),
        }
    }

    fn is_running(&self, pid: Pid) -> bool {
        let Ok(nix_pid) = Self::to_nix(pid) else {
            return false;
        };
        // EPERM still proves the process exists.
        let running = matches!(kill(nix_pid, None), Ok(()) | Err(Errno::EPERM));
        debug!(pid = pid, running = running, "Process running check");
        running
    }

    fn main_window(&self, _pid: Pid) -> Result<Option<WindowHandle>> {
        Err(Error::UnsupportedPlatform(
            "main window lookup is only available on Windows".to_string(),
        ))
    }

    fn set_foreground(&self, _window: WindowHandle) -> Result<()> {
        Err(Error::UnsupportedPlatform(
            "foreground windows are only available on Windows".to_string(),
        ))
    }
}
