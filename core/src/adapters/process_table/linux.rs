//! Linux process table implementation reading `/proc`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::domain::Pid;
use crate::error::Result;

use super::TableSnapshot;

/// Linux-specific process table walking `/proc/<pid>/stat`.
pub struct ProcFsTable {
    root: PathBuf,
}

impl ProcFsTable {
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Read from a different procfs mount (used by tests).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse `(pid, ppid, state)` out of a `/proc/<pid>/stat` line.
    ///
    /// Format: `pid (comm) state ppid ...`. The command name may itself
    /// contain spaces and parentheses, so split on the last `)`.
    fn parse_stat(content: &str) -> Option<(Pid, Pid, char)> {
        let open = content.find('(')?;
        let pid: Pid = content[..open].trim().parse().ok()?;

        let after_comm = content.rfind(')')? + 1;
        let mut fields = content.get(after_comm..)?.split_whitespace();
        let state = fields.next()?.chars().next()?;
        let ppid: Pid = fields.next()?.parse().ok()?;

        Some((pid, ppid, state))
    }

    /// Zombie (`Z`) and dead (`X`) entries have already exited; only
    /// their parent has not collected them yet.
    fn has_exited(state: char) -> bool {
        matches!(state, 'Z' | 'X' | 'x')
    }

    fn read_entry(&self, dir: &Path) -> Option<(Pid, Pid, char)> {
        // Processes exit between readdir and read; that is not an error.
        let content = fs::read_to_string(dir.join("stat")).ok()?;
        Self::parse_stat(&content)
    }
}

impl Default for ProcFsTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TableSnapshot for ProcFsTable {
    fn children_of(&self, parent: Pid) -> Result<Vec<Pid>> {
        let mut children = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let Ok(entry) = entry else {
                continue;
            };

            let is_pid_dir = entry
                .file_name()
                .to_str()
                .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()));
            if !is_pid_dir {
                continue;
            }

            match self.read_entry(&entry.path()) {
                Some((pid, ppid, state)) if ppid == parent => {
                    if Self::has_exited(state) {
                        trace!(pid = pid, state = %state, "Skipping exited child");
                    } else {
                        children.push(pid);
                    }
                }
                _ => {}
            }
        }

        children.sort_unstable();
        trace!(parent = parent, children = ?children, "Read children from procfs");
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::tempdir;

    fn write_stat(root: &Path, pid: Pid, comm: &str, state: char, ppid: Pid) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("stat"),
            format!("{} ({}) {} {} {} 0 0 -1 4194560 ...\n", pid, comm, state, ppid, pid),
        )
        .unwrap();
    }

    #[test]
    fn test_parse_stat_with_parens_in_comm() {
        let line = "4242 (weird) name (x)) R 17 4242 4242 0 -1";
        assert_eq!(ProcFsTable::parse_stat(line), Some((4242, 17, 'R')));
    }

    #[test]
    fn test_parse_stat_garbage() {
        assert_eq!(ProcFsTable::parse_stat("not a stat line"), None);
        assert_eq!(ProcFsTable::parse_stat("12 (x)"), None);
    }

    #[test]
    fn test_children_from_fake_procfs() {
        let dir = tempdir().unwrap();
        write_stat(dir.path(), 100, "root", 'S', 1);
        write_stat(dir.path(), 101, "child one", 'S', 100);
        write_stat(dir.path(), 102, "child-two", 'R', 100);
        write_stat(dir.path(), 103, "grandchild", 'S', 101);
        // Non-pid entries are ignored.
        fs::create_dir_all(dir.path().join("sys")).unwrap();
        fs::write(dir.path().join("uptime"), "1.0 2.0").unwrap();
        // A pid directory whose stat vanished.
        fs::create_dir_all(dir.path().join("104")).unwrap();

        let table = ProcFsTable::with_root(dir.path());
        assert_eq!(table.children_of(100).unwrap(), vec![101, 102]);
        assert_eq!(table.children_of(101).unwrap(), vec![103]);
        assert!(table.children_of(103).unwrap().is_empty());
    }

    #[test]
    fn test_exited_children_are_not_listed() {
        let dir = tempdir().unwrap();
        write_stat(dir.path(), 200, "parent", 'S', 1);
        write_stat(dir.path(), 201, "worker", 'S', 200);
        write_stat(dir.path(), 202, "done", 'Z', 200);
        write_stat(dir.path(), 203, "gone", 'X', 200);

        let table = ProcFsTable::with_root(dir.path());
        assert_eq!(table.children_of(200).unwrap(), vec![201]);
    }

    #[test]
    fn test_uncollected_child_is_not_listed() {
        // `sleep` never waits, so the backgrounded job stays a zombie.
        let mut parent = Command::new("sh")
            .args(["-c", "true & exec sleep 5"])
            .spawn()
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(300));

        let table = ProcFsTable::new();
        let children = table.children_of(parent.id()).unwrap();

        parent.kill().unwrap();
        parent.wait().unwrap();
        assert!(children.is_empty(), "zombie listed: {:?}", children);
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let table = ProcFsTable::with_root("/definitely/not/a/procfs");
        assert!(table.children_of(1).is_err());
    }

    #[test]
    fn test_finds_spawned_child() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let table = ProcFsTable::new();

        let children = table.children_of(std::process::id()).unwrap();
        assert!(children.contains(&child.id()));

        child.kill().unwrap();
        child.wait().unwrap();
    }
}
