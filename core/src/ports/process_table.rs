//! Process table port (interface).

use crate::domain::Pid;
use crate::error::Result;

/// Port for querying the OS process table.
///
/// Implementations return a point-in-time snapshot on every call and must
/// not cache results: identifiers are recycled between polls.
pub trait ProcessTable: Send + Sync {
    /// List the pids whose parent is `parent`.
    ///
    /// A parent that no longer exists simply has no children.
    fn children_of(&self, parent: Pid) -> Result<Vec<Pid>>;
}
