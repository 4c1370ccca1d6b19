//! Escalation policy domain model.
//!
//! Both the worker shutdown and the process-tree sweep follow the same
//! countdown: survey what is left, wait and survey again while rounds remain,
//! and on the last round apply the terminal action to whatever survived.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// How an escalation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Escalation {
    /// Nothing was left at `round`; the terminal action did not run.
    Drained { round: u32 },
    /// The terminal action ran against `remaining` items.
    Escalated { remaining: usize },
}

impl Escalation {
    /// True when the terminal action was applied.
    pub fn escalated(&self) -> bool {
        matches!(self, Escalation::Escalated { .. })
    }
}

/// A countdown of polling rounds with a fixed wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    rounds: u32,
    round_wait: Duration,
}

impl EscalationPolicy {
    /// Create a policy. `rounds` must be positive.
    pub fn new(rounds: u32, round_wait: Duration) -> Result<Self> {
        if rounds == 0 {
            return Err(Error::InvalidArgument(
                "escalation needs at least one round".to_string(),
            ));
        }
        Ok(Self { rounds, round_wait })
    }

    /// One round, no waiting: survey once and act on everything found.
    pub fn single_sweep() -> Self {
        Self {
            rounds: 1,
            round_wait: Duration::ZERO,
        }
    }

    /// Number of rounds, counting the terminal one.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Wait between two non-terminal rounds.
    pub fn round_wait(&self) -> Duration {
        self.round_wait
    }

    /// Run the countdown, sleeping the calling thread between rounds.
    ///
    /// `survey` receives the current round number (counting down to 1) and
    /// returns what is still left. `terminal` runs at most once, on round 1,
    /// with the last survey result.
    pub fn run<T, S, A>(&self, survey: S, terminal: A) -> Result<Escalation>
    where
        S: FnMut(u32) -> Result<Vec<T>>,
        A: FnOnce(Vec<T>) -> Result<()>,
    {
        self.run_with_wait(survey, thread::sleep, terminal)
    }

    /// Run the countdown with a custom wait between rounds.
    ///
    /// Lets callers that can be woken early (a worker finishing, for example)
    /// block on their own primitive instead of a plain sleep.
    pub fn run_with_wait<T, S, W, A>(
        &self,
        mut survey: S,
        mut wait: W,
        terminal: A,
    ) -> Result<Escalation>
    where
        S: FnMut(u32) -> Result<Vec<T>>,
        W: FnMut(Duration),
        A: FnOnce(Vec<T>) -> Result<()>,
    {
        let mut round = self.rounds;
        loop {
            let remaining = survey(round)?;
            if remaining.is_empty() {
                debug!(round = round, "Nothing left, escalation drained");
                return Ok(Escalation::Drained { round });
            }

            if round > 1 {
                debug!(round = round, remaining = remaining.len(), "Waiting before next round");
                wait(self.round_wait);
                round -= 1;
                continue;
            }

            let count = remaining.len();
            debug!(remaining = count, "Final round, applying terminal action");
            terminal(remaining)?;
            return Ok(Escalation::Escalated { remaining: count });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_zero_rounds_rejected() {
        let result = EscalationPolicy::new(0, Duration::ZERO);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_drains_without_terminal_action() {
        let policy = EscalationPolicy::new(3, Duration::from_millis(1)).unwrap();
        let mut surveys = vec![vec![1, 2], vec![1], vec![]].into_iter();
        let mut terminal_ran = false;

        let outcome = policy
            .run(
                |_| Ok(surveys.next().unwrap_or_default()),
                |_| {
                    terminal_ran = true;
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(outcome, Escalation::Drained { round: 1 });
        assert!(!terminal_ran);
    }

    #[test]
    fn test_terminal_action_on_last_round() {
        let policy = EscalationPolicy::new(3, Duration::from_millis(7)).unwrap();
        let rounds_seen = RefCell::new(Vec::new());
        let waits = RefCell::new(Vec::new());
        let mut acted_on = Vec::new();

        let outcome = policy
            .run_with_wait(
                |round| {
                    rounds_seen.borrow_mut().push(round);
                    Ok(vec![10, 20])
                },
                |d| waits.borrow_mut().push(d),
                |left| {
                    acted_on = left;
                    Ok(())
                },
            )
            .unwrap();

        assert_eq!(outcome, Escalation::Escalated { remaining: 2 });
        assert!(outcome.escalated());
        assert_eq!(*rounds_seen.borrow(), vec![3, 2, 1]);
        assert_eq!(*waits.borrow(), vec![Duration::from_millis(7); 2]);
        assert_eq!(acted_on, vec![10, 20]);
    }

    #[test]
    fn test_single_sweep_never_waits() {
        let policy = EscalationPolicy::single_sweep();
        let mut waited = false;

        let outcome = policy
            .run_with_wait(|_| Ok(vec![()]), |_| waited = true, |_| Ok(()))
            .unwrap();

        assert_eq!(outcome, Escalation::Escalated { remaining: 1 });
        assert!(!waited);
        assert_eq!(policy.round_wait(), Duration::ZERO);
    }

    #[test]
    fn test_survey_error_propagates() {
        let policy = EscalationPolicy::new(2, Duration::ZERO).unwrap();
        let result: Result<Escalation> = policy.run(
            |_| Err::<Vec<u32>, _>(Error::UnsupportedPlatform("test".into())),
            |_| Ok(()),
        );
        assert!(matches!(result, Err(Error::UnsupportedPlatform(_))));
    }
}
