//! Execution shell around worker code.
//!
//! Every run executes inside [`execute`], which turns returned errors and
//! panics into a recorded `WorkerError` and marks the run finished. Nothing
//! escapes to the thread that started the worker.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::domain::RunOutcome;
use crate::error::WorkerError;

use super::signal::CancelSignal;

/// Completion state of one run (one signal generation).
pub(crate) struct RunState {
    id: Uuid,
    finished: Mutex<bool>,
    done: Condvar,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            finished: Mutex::new(false),
            done: Condvar::new(),
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn is_finished(&self) -> bool {
        *self.finished.lock()
    }

    fn mark_finished(&self) {
        let mut finished = self.finished.lock();
        *finished = true;
        self.done.notify_all();
    }

    /// Wait up to `timeout` for the run to finish. Returns whether it has.
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_forever();
            return true;
        };

        let mut finished = self.finished.lock();
        while !*finished {
            if self.done.wait_until(&mut finished, deadline).timed_out() {
                break;
            }
        }
        *finished
    }

    pub(crate) fn wait_forever(&self) {
        let mut finished = self.finished.lock();
        while !*finished {
            self.done.wait(&mut finished);
        }
    }
}

/// What the worker remembers across runs.
#[derive(Default)]
pub(crate) struct RunRecord {
    pub(crate) last_error: Mutex<Option<WorkerError>>,
    pub(crate) last_outcome: Mutex<Option<RunOutcome>>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run `body` under `signal`, then record how it ended.
pub(crate) fn execute<F>(body: F, signal: CancelSignal, run: &RunState, record: &RunRecord)
where
    F: FnOnce(&CancelSignal) -> Result<(), WorkerError>,
{
    debug!(run_id = %run.id(), "Worker run started");

    let result = match panic::catch_unwind(AssertUnwindSafe(|| body(&signal))) {
        Ok(result) => result,
        Err(payload) => Err(WorkerError::Panicked(panic_message(payload.as_ref()))),
    };

    let outcome = RunOutcome::from_result(&result);
    if let Err(e) = result {
        debug!(run_id = %run.id(), error = %e, "Worker run captured an error");
        *record.last_error.lock() = Some(e);
    }
    *record.last_outcome.lock() = Some(outcome);

    debug!(run_id = %run.id(), outcome = ?outcome, "Worker run finished");
    run.mark_finished();
}
