//! macOS process table implementation using `ps`.
//!
//! Uses `/bin/ps -axo pid=,ppid=,stat=` to take one snapshot of every
//! process, its parent and its state per query.

use std::process::{Command, Stdio};

use tracing::{debug, trace};

use crate::domain::Pid;
use crate::error::{Error, Result};

use super::TableSnapshot;

/// macOS-specific process table.
pub struct PsTable;

impl PsTable {
    pub fn new() -> Self {
        Self
    }

    /// Parse `pid ppid stat` rows into live `(pid, ppid)` pairs.
    ///
    /// Malformed rows and zombies (`Z` state, exited but not yet collected
    /// by their parent) are skipped.
    fn parse_ps_output(output: &str) -> Vec<(Pid, Pid)> {
        output
            .lines()
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let pid = parts.next()?.parse().ok()?;
                let ppid = parts.next()?.parse().ok()?;
                let stat = parts.next()?;
                (!stat.starts_with('Z')).then_some((pid, ppid))
            })
            .collect()
    }
}

impl Default for PsTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSnapshot for PsTable {
    fn children_of(&self, parent: Pid) -> Result<Vec<Pid>> {
        let output = Command::new("/bin/ps")
            .args(["-axo", "pid=,ppid=,stat="])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| Error::CommandFailed(format!("Failed to run ps: {}", e)))?;

        if !output.status.success() {
            debug!(status = ?output.status, "ps exited unsuccessfully");
            return Err(Error::CommandFailed(format!(
                "ps exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in ps output: {}", e)))?;

        let mut children: Vec<Pid> = Self::parse_ps_output(&stdout)
            .into_iter()
            .filter(|&(_, ppid)| ppid == parent)
            .map(|(pid, _)| pid)
            .collect();
        children.sort_unstable();

        trace!(parent = parent, children = ?children, "Read children from ps");
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ps_output() {
        let output = "    1     0 Ss\n  312     1 S\n  313   312 R+\n  315   312 Z\nbogus line\n  314\n  316   312\n";
        assert_eq!(
            PsTable::parse_ps_output(output),
            vec![(1, 0), (312, 1), (313, 312)]
        );
    }

    #[test]
    fn test_finds_spawned_child() {
        let mut child = Command::new("/bin/sleep").arg("5").spawn().unwrap();
        let table = PsTable::new();

        let children = table.children_of(std::process::id()).unwrap();
        assert!(children.contains(&child.id()));

        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn test_uncollected_child_is_not_listed() {
        // `sleep` never waits, so the backgrounded job stays a zombie.
        let mut parent = Command::new("/bin/sh")
            .args(["-c", "/usr/bin/true & exec /bin/sleep 5"])
            .spawn()
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(300));

        let children = PsTable::new().children_of(parent.id()).unwrap();

        parent.kill().unwrap();
        parent.wait().unwrap();
        assert!(children.is_empty(), "zombie listed: {:?}", children);
    }
}
