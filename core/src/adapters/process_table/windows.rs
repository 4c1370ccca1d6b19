//! Windows process table implementation using a Toolhelp32 snapshot.

use windows::Win32::Foundation::CloseHandle;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};

use tracing::trace;

use crate::domain::Pid;
use crate::error::{Error, Result};

use super::TableSnapshot;

/// Windows-specific process table.
pub struct ToolhelpTable;

impl ToolhelpTable {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ToolhelpTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSnapshot for ToolhelpTable {
    fn children_of(&self, parent: Pid) -> Result<Vec<Pid>> {
        let mut children = Vec::new();

        // SAFETY: the snapshot handle is closed before returning and the
        // entry struct carries its own size as the API requires.
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
                .map_err(|e| Error::CommandFailed(format!("Process snapshot failed: {}", e)))?;

            let mut entry = PROCESSENTRY32W {
                dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
                ..Default::default()
            };

            if Process32FirstW(snapshot, &mut entry).is_ok() {
                loop {
                    if entry.th32ParentProcessID == parent && entry.th32ProcessID != parent {
                        children.push(entry.th32ProcessID);
                    }
                    if Process32NextW(snapshot, &mut entry).is_err() {
                        break;
                    }
                }
            }

            let _ = CloseHandle(snapshot);
        }

        children.sort_unstable();
        trace!(parent = parent, children = ?children, "Read children from Toolhelp32 snapshot");
        Ok(children)
    }
}
