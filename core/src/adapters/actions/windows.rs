//! Windows process actions using Win32.
//!
//! - `OpenProcess` + `TerminateProcess` for termination
//! - `GetExitCodeProcess` as the liveness probe
//! - `EnumWindows` to find a visible top-level window of a process
//! - `SetForegroundWindow` to raise it

use windows::core::Error as WinError;
use windows::Win32::Foundation::{
    CloseHandle, BOOL, ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER, HANDLE, HWND, LPARAM,
};
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, TerminateProcess, PROCESS_ACCESS_RIGHTS,
    PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindowThreadProcessId, IsWindowVisible, SetForegroundWindow,
};
use tracing::{debug, warn};

use crate::domain::{Pid, WindowHandle};
use crate::error::{Error, Result};

use super::PlatformActions;

/// Exit code reported by `GetExitCodeProcess` while the process runs.
const STILL_ACTIVE: u32 = 259;

/// Windows process actions implementation.
#[derive(Debug, Default)]
pub struct WindowsActions;

struct WindowSearch {
    pid: u32,
    found: Option<HWND>,
}

impl WindowsActions {
    pub fn new() -> Self {
        Self
    }

    fn map_error(pid: Pid, e: WinError) -> Error {
        if e.code() == ERROR_INVALID_PARAMETER.to_hresult() {
            Error::ProcessNotFound(pid)
        } else if e.code() == ERROR_ACCESS_DENIED.to_hresult() {
            Error::PermissionDenied(pid)
        } else {
            Error::KillFailed {
                pid,
                reason: e.message().to_string(),
            }
        }
    }

    fn open(pid: Pid, access: PROCESS_ACCESS_RIGHTS) -> Result<HANDLE> {
        // SAFETY: plain Win32 call; the handle is closed by the caller.
        unsafe { OpenProcess(access, false, pid) }.map_err(|e| Self::map_error(pid, e))
    }
}

unsafe extern "system" fn match_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let search = &mut *(lparam.0 as *mut WindowSearch);
    let mut owner = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut owner));
    if owner == search.pid && IsWindowVisible(hwnd).as_bool() {
        search.found = Some(hwnd);
        return BOOL(0);
    }
    BOOL(1)
}

impl PlatformActions for WindowsActions {
    fn terminate(&self, pid: Pid) -> Result<()> {
        debug!(pid = pid, "Calling TerminateProcess");

        let handle = Self::open(pid, PROCESS_TERMINATE)?;
        // SAFETY: handle was just opened with PROCESS_TERMINATE.
        let result = unsafe { TerminateProcess(handle, 1) };
        unsafe {
            let _ = CloseHandle(handle);
        }

        match result {
            Ok(()) => {
                debug!(pid = pid, "TerminateProcess succeeded");
                Ok(())
            }
            Err(e) => {
                let err = Self::map_error(pid, e);
                if matches!(err, Error::PermissionDenied(_)) {
                    warn!(pid = pid, "Access denied to kill process");
                }
                Err(err)
            }
        }
    }

    fn is_running(&self, pid: Pid) -> bool {
        let Ok(handle) = Self::open(pid, PROCESS_QUERY_LIMITED_INFORMATION) else {
            return false;
        };
        let mut code = 0u32;
        // SAFETY: handle was opened with query rights and is closed below.
        let running = unsafe { GetExitCodeProcess(handle, &mut code) }.is_ok()
            && code == STILL_ACTIVE;
        unsafe {
            let _ = CloseHandle(handle);
        }
        debug!(pid = pid, running = running, "Process running check");
        running
    }

    fn supports_windows(&self) -> bool {
        true
    }

    fn main_window(&self, pid: Pid) -> Result<Option<WindowHandle>> {
        if !self.is_running(pid) {
            return Err(Error::ProcessNotFound(pid));
        }

        let mut search = WindowSearch { pid, found: None };
        // SAFETY: `search` outlives the enumeration; the callback only
        // touches it through the pointer passed in `lparam`.
        unsafe {
            // Stopping early makes EnumWindows report an error; ignore it.
            let _ = EnumWindows(
                Some(match_window),
                LPARAM(&mut search as *mut WindowSearch as isize),
            );
        }

        Ok(search.found.map(|hwnd| WindowHandle(hwnd.0 as isize)))
    }

    fn set_foreground(&self, window: WindowHandle) -> Result<()> {
        let hwnd = HWND(window.0 as *mut _);
        // SAFETY: a stale handle makes the call fail, nothing more.
        let raised = unsafe { SetForegroundWindow(hwnd) };
        if raised.as_bool() {
            Ok(())
        } else {
            Err(Error::CommandFailed(format!(
                "SetForegroundWindow refused window {}",
                window
            )))
        }
    }
}
