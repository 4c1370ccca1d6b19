//! Process table adapters.
//!
//! Platform-specific implementations of the "children of pid" query.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
pub use linux::ProcFsTable;

use crate::domain::Pid;
use crate::error::Result;
use crate::ports::ProcessTable;

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
use crate::error::Error;

/// The process table of the current platform.
///
/// On targets without a supported introspection mechanism every query fails
/// with `Error::UnsupportedPlatform` instead of pretending the tree is empty.
pub struct PlatformProcessTable {
    #[cfg(target_os = "macos")]
    inner: macos::PsTable,

    #[cfg(target_os = "linux")]
    inner: linux::ProcFsTable,

    #[cfg(target_os = "windows")]
    inner: windows::ToolhelpTable,
}

impl PlatformProcessTable {
    /// Create a process table for the current platform.
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "macos")]
            inner: macos::PsTable::new(),

            #[cfg(target_os = "linux")]
            inner: linux::ProcFsTable::new(),

            #[cfg(target_os = "windows")]
            inner: windows::ToolhelpTable::new(),
        }
    }
}

impl Default for PlatformProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for PlatformProcessTable {
    #[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
    fn children_of(&self, parent: Pid) -> Result<Vec<Pid>> {
        TableSnapshot::children_of(&self.inner, parent)
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    fn children_of(&self, _parent: Pid) -> Result<Vec<Pid>> {
        Err(Error::UnsupportedPlatform(
            "process tree enumeration is not available on this platform".to_string(),
        ))
    }
}

/// Internal trait for platform-specific implementations.
#[cfg_attr(
    not(any(target_os = "macos", target_os = "linux", target_os = "windows")),
    allow(dead_code)
)]
trait TableSnapshot: Send + Sync {
    fn children_of(&self, parent: Pid) -> Result<Vec<Pid>>;
}

#[cfg(target_os = "linux")]
impl ProcessTable for ProcFsTable {
    fn children_of(&self, parent: Pid) -> Result<Vec<Pid>> {
        TableSnapshot::children_of(self, parent)
    }
}
