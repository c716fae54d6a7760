//! Per-call time budget
//!
//! Every phase of a batched job must finish within a bounded slice,
//! independent of any host-level request timeout. Work loops check the
//! budget between rows and stop early at a row boundary; keyset cursor
//! semantics make a short batch safe to resume.

use std::time::{Duration, Instant};

/// Elapsed-time guard for one request
#[derive(Debug, Clone)]
pub struct CallBudget {
    started: Instant,
    limit: Duration,
}

impl CallBudget {
    /// Start a budget clock for this call.
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// Whether the budget is spent.
    pub fn exhausted(&self) -> bool {
        self.started.elapsed() >= self.limit
    }

    /// Time spent so far.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
