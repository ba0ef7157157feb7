//! Bully election: the highest-priority candidate always wins
//!
//! The first candidate starts as coordinator. Each remaining candidate, in
//! input order, challenges the incumbent and takes over only if it strictly
//! outranks it, so equal priorities resolve to the earliest candidate.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{ElectionProgress, ElectionProtocol, ElectionResult, ElectionState, PriorityFn};
use crate::events::SharedEventBus;
use crate::types::AgentId;

const PROTOCOL: &str = "bully";

/// Priority-driven leader election
pub struct BullyElection {
    priority_fn: PriorityFn,
    progress: ElectionProgress,
}

impl BullyElection {
    /// Create an election ranking candidates with `priority_fn`
    pub fn new<F>(priority_fn: F) -> Self
    where
        F: Fn(&str) -> i64 + Send + Sync + 'static,
    {
        Self::from_fn(Arc::new(priority_fn))
    }

    /// Create from an already shared priority function
    pub fn from_fn(priority_fn: PriorityFn) -> Self {
        Self {
            priority_fn,
            progress: ElectionProgress::new(),
        }
    }

    /// Announce elected leaders on `bus`
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.progress.set_event_bus(bus);
        self
    }

    /// Priority of a single candidate
    pub fn priority_of(&self, candidate: &str) -> i64 {
        (self.priority_fn)(candidate)
    }
}

#[async_trait]
impl ElectionProtocol for BullyElection {
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
        let Some((first, challengers)) = candidates.split_first() else {
            return self.progress.finish_empty(PROTOCOL);
        };

        self.progress.start();
        self.progress.set_leader(first);

        let mut leader = first;
        let mut leader_priority = self.priority_of(first);
        let mut rounds = 0;

        for challenger in challengers {
            // One challenge/answer exchange with the incumbent
            tokio::task::yield_now().await;
            rounds += 1;

            let priority = self.priority_of(challenger);
            if priority > leader_priority {
                debug!(
                    incumbent = %leader,
                    challenger = %challenger,
                    priority,
                    "Challenger takes over"
                );
                leader = challenger;
                leader_priority = priority;
                self.progress.set_leader(leader);
            }
        }

        self.progress.finish(PROTOCOL, leader, candidates.len(), rounds)
    }
}
