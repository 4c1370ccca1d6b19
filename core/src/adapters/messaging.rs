//! Window message broadcast.
//!
//! Registers a named window message and posts it to every top-level window.
//! A second instance of an application uses this to ask the first one to
//! show itself. The receiving side is whatever window procedure registered
//! the same name.

use tracing::debug;

use crate::error::{Error, Result};

/// Default message name for "an instance is already running, show yourself".
pub const DEFAULT_ACTIVATION_MESSAGE: &str = "WM_SHOWME";

/// Register `name` as a window message and broadcast it.
///
/// Returns the registered message id.
#[cfg(windows)]
pub fn broadcast_activation(name: &str) -> Result<u32> {
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        PostMessageW, RegisterWindowMessageW, HWND_BROADCAST,
    };

    if name.is_empty() {
        return Err(Error::InvalidArgument("message name is empty".to_string()));
    }

    let wide = HSTRING::from(name);
    // SAFETY: `wide` is a valid NUL-terminated UTF-16 string for the call.
    let message = unsafe { RegisterWindowMessageW(PCWSTR(wide.as_ptr())) };
    if message == 0 {
        return Err(Error::CommandFailed(format!(
            "RegisterWindowMessage failed for {}",
            name
        )));
    }

    // SAFETY: posting to HWND_BROADCAST carries no pointers.
    unsafe { PostMessageW(HWND_BROADCAST, message, WPARAM(0), LPARAM(0)) }
        .map_err(|e| Error::CommandFailed(format!("PostMessage failed: {}", e)))?;

    debug!(name = name, message = message, "Broadcast activation message");
    Ok(message)
}

/// Register `name` as a window message and broadcast it.
///
/// There are no top-level window messages outside Windows.
#[cfg(not(windows))]
pub fn broadcast_activation(name: &str) -> Result<u32> {
    debug!(name = name, "Activation broadcast requested on a platform without window messages");
    Err(Error::UnsupportedPlatform(
        "window message broadcast is only available on Windows".to_string(),
    ))
}
