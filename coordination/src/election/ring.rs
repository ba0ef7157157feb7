//! Ring election: a token circulates once to find the best candidate, then
//! an announcement circulates once to publish it
//!
//! ```text
//!   initiator ──► c1 ──► c2 ──► ... ──► cN-1 ─┐
//!       ▲                                      │
//!       └──────────── token returns ◄──────────┘
//! ```
//!
//! Each node only talks to its successor. The candidate list order is the
//! ring order and the first candidate initiates. Without a priority function
//! candidates rank by id, so `"n9"` beats `"n10"`.

use std::cmp::Ordering;

use async_trait::async_trait;
use tracing::debug;

use super::{ElectionProgress, ElectionProtocol, ElectionResult, ElectionState, PriorityFn};
use crate::events::SharedEventBus;
use crate::types::AgentId;

const PROTOCOL: &str = "ring";

/// Token-passing leader election over a logical ring
pub struct RingElection {
    priority_fn: Option<PriorityFn>,
    progress: ElectionProgress,
}

impl RingElection {
    pub fn new() -> Self {
        Self {
            priority_fn: None,
            progress: ElectionProgress::new(),
        }
    }

    /// Rank candidates with `priority_fn` instead of by id
    pub fn with_priority_fn(mut self, priority_fn: PriorityFn) -> Self {
        self.priority_fn = Some(priority_fn);
        self
    }

    /// Announce elected leaders on `bus`
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.progress.set_event_bus(bus);
        self
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.priority_fn {
            Some(priority_fn) => priority_fn(a).cmp(&priority_fn(b)),
            None => a.cmp(b),
        }
    }
}

impl Default for RingElection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ElectionProtocol for RingElection {
    fn name(&self) -> &'static str {
        PROTOCOL
    }

    fn state(&self) -> ElectionState {
        self.progress.state()
    }

    fn current_leader(&self) -> Option<AgentId> {
        self.progress.leader()
    }

    async fn elect(&self, candidates: &[AgentId]) -> ElectionResult {
        let Some(initiator) = candidates.first() else {
            return self.progress.finish_empty(PROTOCOL);
        };

        self.progress.start();
        self.progress.set_leader(initiator);

        let mut best = initiator;
        let mut rounds = 0;

        // Election pass: the token visits every successor and returns home
        for hop in 1..=candidates.len() {
            tokio::task::yield_now().await;
            rounds += 1;

            let holder = &candidates[hop % candidates.len()];
            if self.compare(holder, best) == Ordering::Greater {
                debug!(holder = %holder, previous = %best, hop, "Token best replaced");
                best = holder;
                self.progress.set_leader(best);
            }
        }

        // Announcement pass
        for _ in 0..candidates.len() {
            tokio::task::yield_now().await;
            rounds += 1;
        }

        self.progress.finish(PROTOCOL, best, candidates.len(), rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn candidates(ids: &[&str]) -> Vec<AgentId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_default_ranks_by_id() {
        let ring = RingElection::new();
        let result = ring.elect(&candidates(&["b", "d", "a", "c"])).await;
        assert!(result.success);
        assert_eq!(result.leader_id.as_deref(), Some("d"));
        assert_eq!(result.protocol, "ring");
        assert_eq!(result.rounds, 8);
    }

    #[tokio::test]
    async fn test_priority_fn_matches_bully_outcome() {
        let ring = RingElection::default()
            .with_priority_fn(Arc::new(|id: &str| id.len() as i64));
        let result = ring.elect(&candidates(&["aa", "b", "cccc", "ddd"])).await;
        assert_eq!(result.leader_id.as_deref(), Some("cccc"));
        assert_eq!(ring.current_leader().as_deref(), Some("cccc"));
        assert_eq!(ring.state(), ElectionState::Completed);
    }

    #[tokio::test]
    async fn test_ties_resolve_to_earliest_position() {
        let ring = RingElection::new().with_priority_fn(Arc::new(|_: &str| 1_i64));
        let result = ring.elect(&candidates(&["x", "y", "z"])).await;
        assert_eq!(result.leader_id.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_single_candidate() {
        let ring = RingElection::new();
        let result = ring.elect(&candidates(&["solo"])).await;
        assert_eq!(result.leader_id.as_deref(), Some("solo"));
        assert_eq!(result.rounds, 2);
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let ring = RingElection::new();
        let result = ring.elect(&[]).await;
        assert!(!result.success);
        assert!(result.leader_id.is_none());
        assert_eq!(ring.state(), ElectionState::Completed);
    }
}
