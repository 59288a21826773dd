//! Serializes evaluation passes and coalesces change batches.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use super::pass::Changed;

/// How pending change batches are turned into passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoalescePolicy {
    /// Union every pending batch into a single pass.
    #[default]
    Merge,
    /// One pass per batch, in arrival order.
    Defer,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Changed>,
    in_flight: bool,
}

/// Queue of change batches waiting for a pass.
///
/// Shared between the session and background tasks. Batches enqueued while a
/// pass runs are picked up by the next pass, never by the running one.
#[derive(Debug, Default)]
pub struct PassQueue {
    state: Mutex<QueueState>,
    policy: CoalescePolicy,
}

impl PassQueue {
    pub fn new(policy: CoalescePolicy) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            policy,
        }
    }

    pub fn policy(&self) -> CoalescePolicy {
        self.policy
    }

    pub fn enqueue(&self, changed: Changed) {
        if changed.is_empty() {
            return;
        }
        self.state.lock().pending.push_back(changed);
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    /// Remove the next batch according to the policy.
    pub fn take_batch(&self) -> Option<Changed> {
        let mut state = self.state.lock();
        match self.policy {
            CoalescePolicy::Defer => state.pending.pop_front(),
            CoalescePolicy::Merge => {
                let first = state.pending.pop_front()?;
                Some(state.pending.drain(..).fold(first, Changed::merge))
            }
        }
    }

    /// Run `pass` for batches until the queue is empty.
    ///
    /// Returns the number of passes run. A nested call while a drain is in
    /// progress returns 0 and leaves its batches to the outer drain.
    pub fn drain<F>(&self, mut pass: F) -> usize
    where
        F: FnMut(Changed),
    {
        {
            let mut state = self.state.lock();
            if state.in_flight {
                return 0;
            }
            state.in_flight = true;
        }
        let _reset = scopeguard::guard((), |_| {
            self.state.lock().in_flight = false;
        });

        let mut passes = 0;
        while let Some(batch) = self.take_batch() {
            passes += 1;
            debug!(pass = passes, policy = ?self.policy, "Running queued pass");
            pass(batch);
        }
        passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EntityPath;

    fn batch(s: &str) -> Changed {
        Changed::path(s.parse::<EntityPath>().unwrap())
    }

    #[test]
    fn merge_runs_one_pass_for_many_batches() {
        let queue = PassQueue::new(CoalescePolicy::Merge);
        queue.enqueue(batch("A.x"));
        queue.enqueue(batch("B.y"));
        let mut seen = Vec::new();
        assert_eq!(queue.drain(|c| seen.push(c)), 1);
        assert_eq!(seen, vec![batch("A.x").merge(batch("B.y"))]);
    }

    #[test]
    fn defer_runs_batches_in_order() {
        let queue = PassQueue::new(CoalescePolicy::Defer);
        queue.enqueue(batch("A.x"));
        queue.enqueue(batch("B.y"));
        let mut seen = Vec::new();
        assert_eq!(queue.drain(|c| seen.push(c)), 2);
        assert_eq!(seen, vec![batch("A.x"), batch("B.y")]);
    }

    #[test]
    fn batches_enqueued_during_a_pass_run_next() {
        let queue = PassQueue::new(CoalescePolicy::Merge);
        queue.enqueue(batch("A.x"));
        let mut seen = Vec::new();
        let passes = queue.drain(|c| {
            if seen.is_empty() {
                queue.enqueue(batch("B.y"));
            }
            seen.push(c);
        });
        assert_eq!(passes, 2);
        assert_eq!(seen, vec![batch("A.x"), batch("B.y")]);
        assert!(!queue.is_in_flight());
    }

    #[test]
    fn empty_batches_are_ignored() {
        let queue = PassQueue::new(CoalescePolicy::Merge);
        queue.enqueue(Changed::paths([]));
        assert_eq!(queue.pending_len(), 0);
    }
}
