//! Worker run outcomes.

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// How a single worker run ended.
///
/// Exactly one of these is recorded per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    /// The work returned normally.
    Completed,
    /// The work stopped after observing a cooperative cancel.
    Cancelled,
    /// The work stopped after observing a forced abort.
    Aborted,
    /// The work returned an error or panicked.
    Failed,
}

impl RunOutcome {
    /// Classify the result of the work function.
    pub fn from_result(result: &Result<(), WorkerError>) -> Self {
        match result {
            Ok(()) => RunOutcome::Completed,
            Err(WorkerError::Cancelled) => RunOutcome::Cancelled,
            Err(WorkerError::Aborted) => RunOutcome::Aborted,
            Err(WorkerError::Failed(_) | WorkerError::Panicked(_)) => RunOutcome::Failed,
        }
    }
}

/// Summary of `TerminableWorker::shutdown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShutdownReport {
    /// Whether cooperative cancel was not enough and a forced abort was issued.
    pub escalated: bool,
    /// Whether the thread was still alive after the last step.
    pub still_alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert_eq!(RunOutcome::from_result(&Ok(())), RunOutcome::Completed);
        assert_eq!(
            RunOutcome::from_result(&Err(WorkerError::Cancelled)),
            RunOutcome::Cancelled
        );
        assert_eq!(
            RunOutcome::from_result(&Err(WorkerError::Aborted)),
            RunOutcome::Aborted
        );
        assert_eq!(
            RunOutcome::from_result(&Err(WorkerError::Panicked("x".into()))),
            RunOutcome::Failed
        );
    }
}
