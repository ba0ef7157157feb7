//! Coordinator selection among peer agents
//!
//! Three interchangeable protocols implement [`ElectionProtocol`]:
//!
//! - **BullyElection**: the highest-priority candidate always wins
//! - **RingElection**: a token travels the candidate ring collecting the
//!   best candidate, then an announcement travels it again
//! - **RandomElection**: uniform pick, uncorrelated across runs
//!
//! [`RotatingLeadership`] is the election-free alternative: strict
//! round-robin terms.
//!
//! Elections operate only on the candidate list they are given. Every
//! simulated message hop yields to the runtime, so a large election shares
//! the executor with task submission and voting instead of monopolising it.
//! There is no built-in timeout; wrap `elect` in `tokio::time::timeout` when
//! one is needed.
//!
//! # Usage
//!
//! ```ignore
//! use agent_coordination::election::{BullyElection, ElectionProtocol};
//!
//! let bully = BullyElection::new(|agent: &str| agent.len() as i64);
//! let candidates = vec!["a".to_string(), "bbb".to_string()];
//! let result = tokio::time::timeout(Duration::from_secs(1), bully.elect(&candidates)).await?;
//! assert_eq!(result.leader_id.as_deref(), Some("bbb"));
//! ```

pub mod bully;
pub mod random;
pub mod ring;
pub mod rotating;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::events::{bus::emit, CoordinationEvent, SharedEventBus};
use crate::types::AgentId;

pub use bully::BullyElection;
pub use random::RandomElection;
pub use ring::RingElection;
pub use rotating::{RotatingLeadership, SharedRotatingLeadership};

/// Ranks a candidate; higher wins
pub type PriorityFn = Arc<dyn Fn(&str) -> i64 + Send + Sync>;

/// Lifecycle of one election run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionState {
    Idle,
    InProgress,
    Completed,
}

/// Outcome of an election
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionResult {
    /// False only when there were no candidates
    pub success: bool,
    /// Always a member of the candidate list when `success`
    pub leader_id: Option<AgentId>,
    /// Protocol that produced the result
    pub protocol: String,
    /// Simulated message hops
    pub rounds: usize,
    pub elected_at: DateTime<Utc>,
}

impl ElectionResult {
    fn elected(protocol: &str, leader_id: AgentId, rounds: usize) -> Self {
        Self {
            success: true,
            leader_id: Some(leader_id),
            protocol: protocol.to_string(),
            rounds,
            elected_at: Utc::now(),
        }
    }

    fn no_candidates(protocol: &str) -> Self {
        Self {
            success: false,
            leader_id: None,
            protocol: protocol.to_string(),
            rounds: 0,
            elected_at: Utc::now(),
        }
    }
}

/// A leader-selection strategy
#[async_trait]
pub trait ElectionProtocol: Send + Sync {
    /// Short protocol name, used in results and events
    fn name(&self) -> &'static str;

    /// State of the most recent run
    fn state(&self) -> ElectionState;

    /// Leader so far; updated while a run is in flight
    fn current_leader(&self) -> Option<AgentId>;

    /// Elect one leader from `candidates`
    ///
    /// An empty list yields `success = false`; it is not an error.
    async fn elect(&self, candidates: &[AgentId]) -> ElectionResult;
}

/// Configuration-friendly selector for the three protocols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionStrategy {
    Bully,
    Ring,
    Random,
}

impl ElectionStrategy {
    /// Build the protocol; `priority_fn` ranks candidates for Bully and Ring
    pub fn build(self, priority_fn: PriorityFn) -> Box<dyn ElectionProtocol> {
        match self {
            Self::Bully => Box::new(BullyElection::from_fn(priority_fn)),
            Self::Ring => Box::new(RingElection::new().with_priority_fn(priority_fn)),
            Self::Random => Box::new(RandomElection::new()),
        }
    }
}

impl std::fmt::Display for ElectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bully => write!(f, "bully"),
            Self::Ring => write!(f, "ring"),
            Self::Random => write!(f, "random"),
        }
    }
}

#[derive(Debug)]
struct Progress {
    state: ElectionState,
    leader: Option<AgentId>,
}

/// Observable state shared by every protocol implementation
pub(crate) struct ElectionProgress {
    inner: Mutex<Progress>,
    event_bus: Option<SharedEventBus>,
}

impl ElectionProgress {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Progress {
                state: ElectionState::Idle,
                leader: None,
            }),
            event_bus: None,
        }
    }

    pub(crate) fn set_event_bus(&mut self, bus: SharedEventBus) {
        self.event_bus = Some(bus);
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> ElectionState {
        self.lock().state
    }

    pub(crate) fn leader(&self) -> Option<AgentId> {
        self.lock().leader.clone()
    }

    pub(crate) fn start(&self) {
        let mut progress = self.lock();
        progress.state = ElectionState::InProgress;
        progress.leader = None;
    }

    pub(crate) fn set_leader(&self, leader: &str) {
        self.lock().leader = Some(leader.to_string());
    }

    /// Mark the run finished with no candidates
    pub(crate) fn finish_empty(&self, protocol: &str) -> ElectionResult {
        let mut progress = self.lock();
        progress.state = ElectionState::Completed;
        progress.leader = None;
        ElectionResult::no_candidates(protocol)
    }

    /// Mark the run finished with `leader` and announce it
    pub(crate) fn finish(
        &self,
        protocol: &str,
        leader: &str,
        candidates: usize,
        rounds: usize,
    ) -> ElectionResult {
        {
            let mut progress = self.lock();
            progress.state = ElectionState::Completed;
            progress.leader = Some(leader.to_string());
        }

        info!(protocol, leader_id = leader, candidates, rounds, "Leader elected");
        emit(
            &self.event_bus,
            CoordinationEvent::LeaderElected {
                protocol: protocol.to_string(),
                leader_id: leader.to_string(),
                candidates,
                timestamp: Utc::now(),
            },
        );
        ElectionResult::elected(protocol, leader.to_string(), rounds)
    }
}
