//! Per-file wall-clock budget.

use std::time::{Duration, Instant};

use super::AnalysisError;

/// Wall-clock budget for one file's pipeline.
///
/// Stages call [`Deadline::check`] between steps; the extractor also checks
/// periodically while walking the tree.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget: Some(budget),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            start: Instant::now(),
            budget: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time left, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.budget.map(|b| b.saturating_sub(self.elapsed()))
    }

    pub fn expired(&self) -> bool {
        matches!(self.remaining(), Some(r) if r.is_zero())
    }

    pub fn budget_ms(&self) -> u64 {
        self.budget.map(|b| b.as_millis() as u64).unwrap_or(0)
    }

    pub fn check(&self) -> Result<(), AnalysisError> {
        if self.expired() {
            return Err(AnalysisError::Timeout {
                budget_ms: self.budget_ms(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_expires() {
        let deadline = Deadline::new(Duration::ZERO);
        assert!(deadline.expired());
        assert!(matches!(
            deadline.check(),
            Err(AnalysisError::Timeout { budget_ms: 0 })
        ));
    }

    #[test]
    fn test_unbounded_never_expires() {
        let deadline = Deadline::unbounded();
        assert!(!deadline.expired());
        assert!(deadline.remaining().is_none());
        assert!(deadline.check().is_ok());
    }
}
