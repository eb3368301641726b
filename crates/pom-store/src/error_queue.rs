//! Bounded queue of user-facing, non-fatal error messages.

use std::collections::VecDeque;

/// Most messages kept; older ones are dropped first.
pub const MAX_QUEUED_ERRORS: usize = 50;

/// Messages collected while the ledger and outputs keep working.
///
/// The UI or CLI drains the queue with [`ErrorQueue::retrieve`] and decides
/// how to show them.
#[derive(Debug, Default)]
pub struct ErrorQueue {
    errors: VecDeque<String>,
}

impl ErrorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "queued error");
        if self.errors.len() == MAX_QUEUED_ERRORS {
            self.errors.pop_front();
        }
        self.errors.push_back(message);
    }

    /// Returns every queued message and leaves the queue empty.
    pub fn retrieve(&mut self) -> Vec<String> {
        self.errors.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
