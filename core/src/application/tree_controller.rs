//! Process-tree escalation service.
//!
//! Walks the descendants of a root process fresh on every poll and, following
//! an [`EscalationPolicy`], either waits for them to exit or applies a
//! terminal action to the survivors. Subtrees are always finished before
//! their parent is acted on, so killing an intermediate process never leaves
//! a live grandchild behind.

use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::adapters::{PlatformProcessActions, PlatformProcessTable};
use crate::config::Settings;
use crate::domain::{Escalation, EscalationPolicy, Pid, TerminalAction};
use crate::error::{Error, Result};
use crate::ports::{ProcessActions, ProcessTable};

const CONTROL_THREAD_NAME: &str = "haltkit-control";

/// Application service for reaping or foregrounding a process tree.
///
/// Uses the `ProcessTable` and `ProcessActions` ports, so tests and other
/// platforms can inject their own implementations.
pub struct ProcessTreeController<T: ProcessTable + 'static, A: ProcessActions + 'static> {
    table: Arc<T>,
    actions: Arc<A>,
    settings: Settings,
    self_pid: Pid,
}

impl ProcessTreeController<PlatformProcessTable, PlatformProcessActions> {
    /// Controller backed by the adapters of the current platform.
    pub fn for_current_platform(settings: Settings) -> Result<Self> {
        Self::with_ports(PlatformProcessTable::new(), PlatformProcessActions::new(), settings)
    }
}

impl<T: ProcessTable + 'static, A: ProcessActions + 'static> ProcessTreeController<T, A> {
    /// Create a controller over the given ports.
    ///
    /// Fails with `Error::Config` if the settings cannot drive an escalation.
    pub fn with_ports(table: T, actions: A, settings: Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            table: Arc::new(table),
            actions: Arc::new(actions),
            settings,
            self_pid: std::process::id(),
        })
    }

    /// Settings the controller was created with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reap the descendants of `root` with the configured number of rounds.
    pub fn reap_descendants(&self, root: Pid) -> Result<Escalation> {
        let policy = self.settings.escalation_policy()?;
        self.reap(root, policy)
    }

    /// Reap the descendants of `root`.
    ///
    /// Blocks until the tree is empty at some round or, on the final round,
    /// every remaining descendant has been killed.
    pub fn reap_descendants_with_rounds(&self, root: Pid, rounds: u32) -> Result<Escalation> {
        let policy = EscalationPolicy::new(rounds, self.settings.round_wait())?;
        self.reap(root, policy)
    }

    fn reap(&self, root: Pid, policy: EscalationPolicy) -> Result<Escalation> {
        info!(root = root, rounds = policy.rounds(), "Reaping process tree");
        self.run_on_control_thread(root, policy, TerminalAction::Kill)
    }

    /// Bring the main window of every descendant of `root` to the foreground.
    ///
    /// Always a single sweep without waiting. Fails with
    /// `Error::UnsupportedPlatform` where there are no windows to act on.
    pub fn raise_to_foreground(&self, root: Pid) -> Result<Escalation> {
        if !self.actions.supports_windows() {
            return Err(Error::UnsupportedPlatform(
                "raising windows to the foreground requires Windows".to_string(),
            ));
        }
        debug!(root = root, "Raising process tree to the foreground");
        self.run_on_control_thread(root, EscalationPolicy::single_sweep(), TerminalAction::Foreground)
    }

    fn run_on_control_thread(
        &self,
        root: Pid,
        policy: EscalationPolicy,
        action: TerminalAction,
    ) -> Result<Escalation> {
        let walker = TreeWalker {
            table: Arc::clone(&self.table),
            actions: Arc::clone(&self.actions),
            self_pid: self.self_pid,
        };

        let handle = thread::Builder::new()
            .name(CONTROL_THREAD_NAME.to_string())
            .spawn(move || walker.sweep(root, &policy, action))?;

        let poll = self.settings.control_poll();
        while !handle.is_finished() {
            thread::sleep(poll);
        }

        handle.join().map_err(|_| Error::ControlThreadPanicked)?
    }
}

impl<T: ProcessTable + 'static, A: ProcessActions + 'static> Clone for ProcessTreeController<T, A> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            actions: Arc::clone(&self.actions),
            settings: self.settings.clone(),
            self_pid: self.self_pid,
        }
    }
}

/// State moved onto the control thread.
struct TreeWalker<T, A> {
    table: Arc<T>,
    actions: Arc<A>,
    self_pid: Pid,
}

impl<T: ProcessTable, A: ProcessActions> TreeWalker<T, A> {
    fn sweep(&self, pid: Pid, policy: &EscalationPolicy, action: TerminalAction) -> Result<Escalation> {
        policy.run(
            |round| {
                let children = self.children_of(pid)?;
                debug!(pid = pid, round = round, children = children.len(), "Polled children");
                Ok(children)
            },
            |survivors| {
                // Finish every subtree before touching this level.
                for &child in &survivors {
                    self.sweep(child, &EscalationPolicy::single_sweep(), action)?;
                }
                for child in survivors {
                    self.apply(child, action);
                }
                Ok(())
            },
        )
    }

    fn children_of(&self, pid: Pid) -> Result<Vec<Pid>> {
        let mut children = self.table.children_of(pid)?;
        children.retain(|&child| child != self.self_pid);
        Ok(children)
    }

    fn apply(&self, pid: Pid, action: TerminalAction) {
        if pid == self.self_pid {
            return;
        }

        match action {
            TerminalAction::Kill => match self.actions.terminate(pid) {
                Ok(()) => info!(pid = pid, "Terminated descendant"),
                Err(Error::ProcessNotFound(_)) => {
                    debug!(pid = pid, "Descendant already exited")
                }
                Err(e) => warn!(pid = pid, error = %e, "Failed to terminate descendant"),
            },
            TerminalAction::Foreground => match self.actions.main_window(pid) {
                Ok(Some(window)) => {
                    if let Err(e) = self.actions.set_foreground(window) {
                        warn!(pid = pid, window = %window, error = %e, "Failed to raise window");
                    }
                }
                Ok(None) => debug!(pid = pid, "Descendant has no main window"),
                Err(e) => debug!(pid = pid, error = %e, "Skipping unresolved descendant"),
            },
        }
    }
}
