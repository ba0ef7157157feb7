//! Round-robin leadership
//!
//! No election, no merit: the agent at the cursor leads until `rotate`
//! hands the term to the next agent in sequence.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info};

use crate::events::{bus::emit, CoordinationEvent, SharedEventBus};
use crate::types::AgentId;

/// Shared reference to RotatingLeadership
pub type SharedRotatingLeadership = Arc<RotatingLeadership>;

#[derive(Debug, Default)]
struct RotationState {
    agents: Vec<AgentId>,
    cursor: usize,
    term: u64,
}

/// Fairness-first leader rotation
#[derive(Default)]
pub struct RotatingLeadership {
    state: Mutex<RotationState>,
    event_bus: Option<SharedEventBus>,
}

impl RotatingLeadership {
    /// Create with an initial order; the first agent leads, duplicates are dropped
    pub fn new<I, A>(agents: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AgentId>,
    {
        let mut ordered: Vec<AgentId> = Vec::new();
        for agent in agents {
            let agent = agent.into();
            if !ordered.contains(&agent) {
                ordered.push(agent);
            }
        }

        Self {
            state: Mutex::new(RotationState {
                agents: ordered,
                cursor: 0,
                term: 0,
            }),
            event_bus: None,
        }
    }

    /// Publish rotations to `bus`
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Create a shared reference to this rotation
    pub fn shared(self) -> SharedRotatingLeadership {
        Arc::new(self)
    }

    fn state(&self) -> MutexGuard<'_, RotationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an agent to the end of the sequence
    ///
    /// Returns false if the agent is already present.
    pub fn add_agent(&self, agent_id: impl Into<AgentId>) -> bool {
        let agent_id = agent_id.into();
        let mut state = self.state();
        if state.agents.contains(&agent_id) {
            return false;
        }
        debug!(agent_id = %agent_id, position = state.agents.len(), "Agent joined rotation");
        state.agents.push(agent_id);
        true
    }

    /// Remove an agent; if it was leading, the next agent in sequence takes over
    pub fn remove_agent(&self, agent_id: &str) -> bool {
        let mut state = self.state();
        let Some(position) = state.agents.iter().position(|a| a == agent_id) else {
            return false;
        };

        state.agents.remove(position);
        if position < state.cursor {
            state.cursor -= 1;
        } else if state.cursor >= state.agents.len() {
            // Removed the last agent while it led; wrap to the front
            state.cursor = 0;
        }

        debug!(
            agent_id,
            leader = ?state.agents.get(state.cursor),
            "Agent left rotation"
        );
        true
    }

    pub fn get_current_leader(&self) -> Option<AgentId> {
        let state = self.state();
        state.agents.get(state.cursor).cloned()
    }

    /// Hand leadership to the next agent, returning the new leader
    ///
    /// No-op returning None when there are no agents.
    pub fn rotate(&self) -> Option<AgentId> {
        let (leader, term) = {
            let mut state = self.state();
            if state.agents.is_empty() {
                return None;
            }
            state.cursor = (state.cursor + 1) % state.agents.len();
            state.term += 1;
            (state.agents[state.cursor].clone(), state.term)
        };

        info!(leader_id = %leader, term, "Leadership rotated");
        emit(
            &self.event_bus,
            CoordinationEvent::LeadershipRotated {
                leader_id: leader.clone(),
                term,
                timestamp: Utc::now(),
            },
        );
        Some(leader)
    }

    /// Cumulative successful `rotate` calls
    pub fn get_term_count(&self) -> u64 {
        self.state().term
    }

    /// Agents in rotation order
    pub fn agents(&self) -> Vec<AgentId> {
        self.state().agents.clone()
    }

    pub fn len(&self) -> usize {
        self.state().agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().agents.is_empty()
    }
}
