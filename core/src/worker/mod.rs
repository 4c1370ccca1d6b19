//! Terminable worker threads.
//!
//! A [`TerminableWorker`] runs a closure on its own native thread under a
//! [`CancelSignal`] it owns. Stopping it escalates:
//!
//! 1. [`request_cancel`](TerminableWorker::request_cancel) raises the signal
//!    cooperatively; the closure is expected to notice and return.
//! 2. [`wait_until_finished`](TerminableWorker::wait_until_finished) gives it
//!    a bounded time to do so.
//! 3. [`force_abort`](TerminableWorker::force_abort) raises the signal to the
//!    abort level and waits a short grace period.
//!
//! Rust has no way to preempt a thread from the outside, so step 3 is
//! best-effort: code that never polls the signal, or is blocked in an
//! uninterruptible system call, keeps running. Re-check
//! [`is_alive`](TerminableWorker::is_alive) afterwards and decide what to do.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use haltkit_core::worker::TerminableWorker;
//!
//! let mut worker = TerminableWorker::new(|signal| loop {
//!     signal.check()?;
//!     signal.sleep(Duration::from_millis(100))?;
//! });
//! worker.start()?;
//!
//! worker.request_cancel();
//! if !worker.wait_until_finished(Duration::from_secs(4)) {
//!     worker.force_abort();
//! }
//! println!("stopped: {}, error: {:?}", !worker.is_alive(), worker.last_error());
//! # Ok::<(), haltkit_core::Error>(())
//! ```

mod native;
mod shell;
mod signal;

use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Settings;
use crate::domain::{EscalationPolicy, RunOutcome, ShutdownReport};
use crate::error::{Error, Result, WorkerError};

pub use native::NativeThread;
pub use signal::CancelSignal;

use shell::{RunRecord, RunState};

type PlainWork = Arc<dyn Fn(&CancelSignal) -> std::result::Result<(), WorkerError> + Send + Sync>;
type ArgWork<A> =
    Arc<dyn Fn(A, &CancelSignal) -> std::result::Result<(), WorkerError> + Send + Sync>;

/// The unit of work; exactly one shape is stored.
enum Work<A> {
    Plain(PlainWork),
    WithArg(ArgWork<A>),
}

/// Builder for [`TerminableWorker`].
pub struct WorkerBuilder<A = ()> {
    work: Option<Work<A>>,
    name: Option<String>,
    stack_size: Option<usize>,
    abort_grace: Duration,
}

impl WorkerBuilder<()> {
    /// Start a builder with default settings and no work.
    pub fn new() -> Self {
        Self {
            work: None,
            name: None,
            stack_size: None,
            abort_grace: Settings::default().abort_grace(),
        }
    }
}

impl Default for WorkerBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Send + 'static> WorkerBuilder<A> {
    /// Set niladic work, replacing any work set before.
    pub fn work<F>(mut self, f: F) -> Self
    where
        F: Fn(&CancelSignal) -> std::result::Result<(), WorkerError> + Send + Sync + 'static,
    {
        self.work = Some(Work::Plain(Arc::new(f)));
        self
    }

    /// Set work taking one argument per start, replacing any work set before.
    pub fn work_with_arg<B, F>(self, f: F) -> WorkerBuilder<B>
    where
        B: Send + 'static,
        F: Fn(B, &CancelSignal) -> std::result::Result<(), WorkerError> + Send + Sync + 'static,
    {
        WorkerBuilder {
            work: Some(Work::WithArg(Arc::new(f))),
            name: self.name,
            stack_size: self.stack_size,
            abort_grace: self.abort_grace,
        }
    }

    /// Name given to every native thread this worker spawns.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Stack size hint in bytes for the native thread.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// How long `force_abort` waits for the run to unwind.
    pub fn abort_grace(mut self, grace: Duration) -> Self {
        self.abort_grace = grace;
        self
    }

    /// Take timings from settings.
    pub fn settings(self, settings: &Settings) -> Self {
        self.abort_grace(settings.abort_grace())
    }

    /// Build the worker. Fails if no work was set.
    pub fn build(self) -> Result<TerminableWorker<A>> {
        let work = self.work.ok_or_else(|| {
            Error::InvalidArgument("worker has no unit of work".to_string())
        })?;

        Ok(TerminableWorker {
            work,
            name: self.name,
            stack_size: self.stack_size,
            abort_grace: self.abort_grace,
            signal: None,
            run: None,
            thread: None,
            record: Arc::new(RunRecord::default()),
        })
    }
}

/// A thread that can be asked to stop, and then told to.
pub struct TerminableWorker<A = ()> {
    work: Work<A>,
    name: Option<String>,
    stack_size: Option<usize>,
    abort_grace: Duration,

    /// Signal of the current generation; dropped by `force_abort` and `start`.
    signal: Option<CancelSignal>,
    run: Option<Arc<RunState>>,
    thread: Option<NativeThread>,
    record: Arc<RunRecord>,
}

impl TerminableWorker<()> {
    /// Builder for a worker.
    pub fn builder() -> WorkerBuilder<()> {
        WorkerBuilder::new()
    }

    /// Worker running niladic work with default settings.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CancelSignal) -> std::result::Result<(), WorkerError> + Send + Sync + 'static,
    {
        Self::from_work(Work::Plain(Arc::new(f)))
    }
}

impl<A: Send + 'static> TerminableWorker<A> {
    /// Worker running work that receives an argument at every start.
    pub fn with_arg<F>(f: F) -> Self
    where
        F: Fn(A, &CancelSignal) -> std::result::Result<(), WorkerError> + Send + Sync + 'static,
    {
        Self::from_work(Work::WithArg(Arc::new(f)))
    }

    fn from_work(work: Work<A>) -> Self {
        Self {
            work,
            name: None,
            stack_size: None,
            abort_grace: Settings::default().abort_grace(),
            signal: None,
            run: None,
            thread: None,
            record: Arc::new(RunRecord::default()),
        }
    }

    /// Start niladic work on a new thread.
    ///
    /// Fails with `Error::InvalidState` if a run is still alive or if the
    /// work expects an argument.
    pub fn start(&mut self) -> Result<()> {
        let f = match &self.work {
            Work::Plain(f) => Arc::clone(f),
            Work::WithArg(_) => {
                return Err(Error::InvalidState(
                    "worker expects an argument; use start_with".to_string(),
                ))
            }
        };
        self.launch(move |signal| f(signal))
    }

    /// Start argument-taking work on a new thread.
    ///
    /// Fails with `Error::InvalidState` if a run is still alive or if the
    /// work takes no argument.
    pub fn start_with(&mut self, arg: A) -> Result<()> {
        let f = match &self.work {
            Work::WithArg(f) => Arc::clone(f),
            Work::Plain(_) => {
                return Err(Error::InvalidState(
                    "worker takes no argument; use start".to_string(),
                ))
            }
        };
        self.launch(move |signal| f(arg, signal))
    }

    fn launch<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&CancelSignal) -> std::result::Result<(), WorkerError> + Send + 'static,
    {
        if self.is_alive() {
            return Err(Error::InvalidState("worker is already running".to_string()));
        }

        // The previous run has finished; reap its thread and retire its signal.
        if let Some(previous) = self.thread.take() {
            previous.join();
        }
        self.signal = None;

        let signal = CancelSignal::new();
        let run = Arc::new(RunState::new());

        let thread = {
            let signal = signal.clone();
            let run = Arc::clone(&run);
            let record = Arc::clone(&self.record);
            NativeThread::spawn(self.name.as_deref(), self.stack_size, move || {
                shell::execute(body, signal, &run, &record)
            })?
        };

        debug!(run_id = %run.id(), name = ?self.name, "Worker started");
        self.signal = Some(signal);
        self.run = Some(run);
        self.thread = Some(thread);
        Ok(())
    }

    /// Ask the running work to stop.
    ///
    /// Advisory only: work that never polls its signal keeps running.
    pub fn request_cancel(&self) {
        match (&self.signal, &self.run) {
            (Some(signal), Some(run)) => {
                debug!(run_id = %run.id(), "Cooperative cancel requested");
                signal.cancel();
            }
            _ => debug!("Cancel requested with no active signal"),
        }
    }

    /// Escalate to a forced abort and wait the abort grace period.
    ///
    /// The signal is retired afterwards. This does not guarantee the thread
    /// stopped; check [`is_alive`](Self::is_alive).
    pub fn force_abort(&mut self) {
        let Some(signal) = self.signal.take() else {
            debug!("Abort requested with no active signal");
            return;
        };

        signal.abort();
        if let Some(run) = &self.run {
            info!(run_id = %run.id(), grace = ?self.abort_grace, "Forced abort requested");
            if !run.wait(self.abort_grace) {
                debug!(run_id = %run.id(), "Worker still alive after abort grace");
            }
        }
    }

    /// Cancel, wait round by round, and force-abort on the final round.
    pub fn shutdown(&mut self, policy: &EscalationPolicy) -> Result<ShutdownReport> {
        self.request_cancel();

        let run = self.run.clone();
        let escalation = policy.run_with_wait(
            |_| {
                Ok(match &run {
                    Some(run) if !run.is_finished() => vec![run.id()],
                    _ => Vec::new(),
                })
            },
            |wait| {
                if let Some(run) = &run {
                    run.wait(wait);
                }
            },
            |_| {
                self.force_abort();
                Ok(())
            },
        )?;

        Ok(ShutdownReport {
            escalated: escalation.escalated(),
            still_alive: self.is_alive(),
        })
    }

    /// True between `start` and the end of the run.
    pub fn is_alive(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.is_finished())
    }

    /// Wait up to `timeout` for the current run to finish.
    ///
    /// Returns whether no run is alive afterwards.
    pub fn wait_until_finished(&self, timeout: Duration) -> bool {
        match &self.run {
            Some(run) => run.wait(timeout),
            None => true,
        }
    }

    /// Bounded join. Fails if the worker was never started.
    pub fn join_timeout(&mut self, timeout: Duration) -> Result<bool> {
        let run = self
            .run
            .clone()
            .ok_or_else(|| Error::InvalidState("worker was never started".to_string()))?;

        let finished = run.wait(timeout);
        if finished {
            if let Some(thread) = self.thread.take() {
                thread.join();
            }
        }
        Ok(finished)
    }

    /// Unbounded join. Fails if the worker was never started.
    pub fn join(&mut self) -> Result<()> {
        let run = self
            .run
            .clone()
            .ok_or_else(|| Error::InvalidState("worker was never started".to_string()))?;

        run.wait_forever();
        if let Some(thread) = self.thread.take() {
            thread.join();
        }
        Ok(())
    }

    /// Error captured from a run, if any.
    ///
    /// Survives restarts until a later run records a new one.
    pub fn last_error(&self) -> Option<WorkerError> {
        self.record.last_error.lock().clone()
    }

    /// How the most recent finished run ended.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        *self.record.last_outcome.lock()
    }

    /// Identifier of the current (or last) run.
    pub fn run_id(&self) -> Option<Uuid> {
        self.run.as_ref().map(|run| run.id())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    /// Native id of the current (or last unjoined) thread.
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.thread.as_ref().map(NativeThread::id)
    }

    /// Wake the worker thread if it is parked.
    pub fn unpark(&self) {
        if let Some(thread) = &self.thread {
            thread.unpark();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    const LONG: Duration = Duration::from_secs(10);

    #[derive(Clone)]
    struct Params {
        label: String,
        ticks: Arc<AtomicUsize>,
    }

    #[test]
    fn test_build_without_work_fails() {
        let result = TerminableWorker::builder().name("empty").build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_alive_only_after_start() {
        let (tx, rx) = mpsc::channel::<()>();
        let mut worker = TerminableWorker::new(move |signal| {
            tx.send(()).ok();
            signal.sleep(LONG)
        });

        assert!(!worker.is_alive());
        assert!(worker.run_id().is_none());

        worker.start().unwrap();
        assert!(worker.is_alive());
        rx.recv_timeout(LONG).unwrap();

        worker.request_cancel();
        assert!(worker.wait_until_finished(LONG));
        assert!(!worker.is_alive());
    }

    #[test]
    fn test_cooperative_cancel_with_argument() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut worker = TerminableWorker::with_arg(|params: Params, signal| loop {
            signal.check()?;
            assert_eq!(params.label, "Harry");
            params.ticks.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2));
        });

        worker
            .start_with(Params {
                label: "Harry".to_string(),
                ticks: Arc::clone(&ticks),
            })
            .unwrap();

        while ticks.load(Ordering::SeqCst) == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        worker.request_cancel();

        assert!(worker.wait_until_finished(LONG));
        assert!(!worker.is_alive());
        assert!(worker.last_error().unwrap().is_cancellation());
        assert_eq!(worker.last_outcome(), Some(RunOutcome::Cancelled));
    }

    #[test]
    fn test_non_cooperative_work_survives_cancel() {
        const GRACE: Duration = Duration::from_millis(20);
        let release = Arc::new(AtomicBool::new(false));
        let held = Arc::clone(&release);
        let mut worker = TerminableWorker::builder()
            .work(move |_signal| {
                while !held.load(Ordering::SeqCst) {
                    thread::sleep(Duration::from_millis(2));
                }
                Ok(())
            })
            .abort_grace(GRACE)
            .build()
            .unwrap();

        worker.start().unwrap();
        worker.request_cancel();
        assert!(!worker.wait_until_finished(Duration::from_millis(50)));
        assert!(worker.is_alive());

        let started = Instant::now();
        worker.force_abort();
        let elapsed = started.elapsed();
        assert!(elapsed >= GRACE, "returned after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(1), "returned after {:?}", elapsed);
        assert!(worker.is_alive());

        release.store(true, Ordering::SeqCst);
        worker.join().unwrap();
        assert_eq!(worker.last_outcome(), Some(RunOutcome::Completed));
        assert!(worker.last_error().is_none());
    }

    #[test]
    fn test_force_abort_observed_by_abort_aware_work() {
        let mut worker = TerminableWorker::new(|signal| loop {
            // Ignores cooperative cancel, honours abort.
            if signal.is_aborted() {
                return signal.check();
            }
            thread::sleep(Duration::from_millis(2));
        });

        worker.start().unwrap();
        worker.request_cancel();
        assert!(!worker.wait_until_finished(Duration::from_millis(30)));

        worker.force_abort();
        assert!(worker.wait_until_finished(LONG));
        assert_eq!(worker.last_error(), Some(WorkerError::Aborted));
        assert_eq!(worker.last_outcome(), Some(RunOutcome::Aborted));

        // The signal is retired after the abort.
        worker.request_cancel();
        worker.force_abort();
    }

    #[test]
    fn test_restart_is_independent_and_keeps_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut worker = TerminableWorker::new(move |_signal| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(WorkerError::failed("first run"))
            } else {
                Ok(())
            }
        });

        worker.start().unwrap();
        worker.join().unwrap();
        let first_run = worker.run_id().unwrap();
        assert_eq!(worker.last_error(), Some(WorkerError::Failed("first run".into())));

        worker.start().unwrap();
        assert!(worker.join_timeout(LONG).unwrap());
        assert_ne!(worker.run_id().unwrap(), first_run);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(worker.last_outcome(), Some(RunOutcome::Completed));
        assert_eq!(worker.last_error(), Some(WorkerError::Failed("first run".into())));
    }

    #[test]
    fn test_start_while_running_is_invalid() {
        let mut worker = TerminableWorker::new(|signal| signal.sleep(LONG));
        worker.start().unwrap();

        assert!(matches!(worker.start(), Err(Error::InvalidState(_))));

        worker.request_cancel();
        assert!(worker.wait_until_finished(LONG));
    }

    #[test]
    fn test_argument_shape_must_match() {
        let mut plain = TerminableWorker::new(|_| Ok(()));
        assert!(matches!(plain.start_with(()), Err(Error::InvalidState(_))));

        let mut with_arg = TerminableWorker::with_arg(|_n: u32, _| Ok(()));
        assert!(matches!(with_arg.start(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_join_before_start_is_invalid() {
        let mut worker = TerminableWorker::new(|_| Ok(()));
        assert!(matches!(
            worker.join_timeout(Duration::from_millis(1)),
            Err(Error::InvalidState(_))
        ));
        assert!(worker.wait_until_finished(Duration::from_millis(1)));
    }

    #[test]
    fn test_panic_is_captured() {
        let mut worker = TerminableWorker::new(|_| panic!("boom"));
        worker.start().unwrap();
        worker.join().unwrap();

        assert_eq!(worker.last_error(), Some(WorkerError::Panicked("boom".into())));
        assert_eq!(worker.last_outcome(), Some(RunOutcome::Failed));
    }

    #[test]
    fn test_shutdown_without_escalation() {
        let mut worker = TerminableWorker::new(|signal| signal.sleep(LONG));
        worker.start().unwrap();

        let policy = EscalationPolicy::new(3, Duration::from_millis(500)).unwrap();
        let report = worker.shutdown(&policy).unwrap();

        assert!(!report.escalated);
        assert!(!report.still_alive);
        assert_eq!(worker.last_error(), Some(WorkerError::Cancelled));
    }

    #[test]
    fn test_shutdown_escalates_to_abort() {
        let mut worker = TerminableWorker::builder()
            .work(|signal| loop {
                if signal.is_aborted() {
                    return signal.check();
                }
                thread::sleep(Duration::from_millis(2));
            })
            .abort_grace(Duration::from_secs(5))
            .build()
            .unwrap();
        worker.start().unwrap();

        let policy = EscalationPolicy::new(2, Duration::from_millis(20)).unwrap();
        let report = worker.shutdown(&policy).unwrap();

        assert!(report.escalated);
        assert!(!report.still_alive);
        assert_eq!(worker.last_outcome(), Some(RunOutcome::Aborted));
    }

    #[test]
    fn test_native_properties_forwarded() {
        let (tx, rx) = mpsc::channel();
        let mut worker = TerminableWorker::builder()
            .work(move |_| {
                tx.send(thread::current().name().map(str::to_string)).ok();
                Ok(())
            })
            .name("demo-worker")
            .stack_size(256 * 1024)
            .build()
            .unwrap();

        assert_eq!(worker.name(), Some("demo-worker"));
        assert_eq!(worker.stack_size(), Some(256 * 1024));
        assert!(worker.thread_id().is_none());

        worker.start().unwrap();
        assert!(worker.thread_id().is_some());
        worker.unpark();

        assert_eq!(rx.recv_timeout(LONG).unwrap().as_deref(), Some("demo-worker"));
        worker.join().unwrap();
    }
}
