//! Event types for agent coordination
//!
//! Every mutating operation on a coordination component can publish one of
//! these so dashboards and orchestrators can follow along without polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AgentId, ProposalId, TaskId};
use crate::voting::VoteChoice;

/// All coordination events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinationEvent {
    /// A task entered the scheduler
    TaskSubmitted {
        task_id: TaskId,
        name: String,
        priority: i64,
        ready: bool,
        timestamp: DateTime<Utc>,
    },

    /// A ready task was handed to an agent
    TaskDispatched {
        task_id: TaskId,
        agent_id: AgentId,
        timestamp: DateTime<Utc>,
    },

    /// A running task finished successfully
    TaskCompleted {
        task_id: TaskId,
        agent_id: AgentId,
        released: Vec<TaskId>,
        timestamp: DateTime<Utc>,
    },

    /// A running task reported failure
    TaskFailed {
        task_id: TaskId,
        agent_id: AgentId,
        timestamp: DateTime<Utc>,
    },

    /// A queued task was cancelled
    TaskCancelled {
        task_id: TaskId,
        timestamp: DateTime<Utc>,
    },

    /// A new proposal was opened for voting
    ProposalCreated {
        proposal_id: ProposalId,
        title: String,
        proposer_id: AgentId,
        timestamp: DateTime<Utc>,
    },

    /// A vote was recorded (or replaced) on a proposal
    VoteCast {
        proposal_id: ProposalId,
        voter_id: AgentId,
        vote: VoteChoice,
        replaced: bool,
        timestamp: DateTime<Utc>,
    },

    /// An agent proposed a value for a consensus key
    ValueProposed {
        key: String,
        agent_id: AgentId,
        timestamp: DateTime<Utc>,
    },

    /// An election finished with a leader
    LeaderElected {
        protocol: String,
        leader_id: AgentId,
        candidates: usize,
        timestamp: DateTime<Utc>,
    },

    /// Round-robin leadership moved to the next agent
    LeadershipRotated {
        leader_id: AgentId,
        term: u64,
        timestamp: DateTime<Utc>,
    },
}

impl CoordinationEvent {
    /// Get the timestamp of this event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            CoordinationEvent::TaskSubmitted { timestamp, .. } => *timestamp,
            CoordinationEvent::TaskDispatched { timestamp, .. } => *timestamp,
            CoordinationEvent::TaskCompleted { timestamp, .. } => *timestamp,
            CoordinationEvent::TaskFailed { timestamp, .. } => *timestamp,
            CoordinationEvent::TaskCancelled { timestamp, .. } => *timestamp,
            CoordinationEvent::ProposalCreated { timestamp, .. } => *timestamp,
            CoordinationEvent::VoteCast { timestamp, .. } => *timestamp,
            CoordinationEvent::ValueProposed { timestamp, .. } => *timestamp,
            CoordinationEvent::LeaderElected { timestamp, .. } => *timestamp,
            CoordinationEvent::LeadershipRotated { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            CoordinationEvent::TaskSubmitted { .. } => "task_submitted",
            CoordinationEvent::TaskDispatched { .. } => "task_dispatched",
            CoordinationEvent::TaskCompleted { .. } => "task_completed",
            CoordinationEvent::TaskFailed { .. } => "task_failed",
            CoordinationEvent::TaskCancelled { .. } => "task_cancelled",
            CoordinationEvent::ProposalCreated { .. } => "proposal_created",
            CoordinationEvent::VoteCast { .. } => "vote_cast",
            CoordinationEvent::ValueProposed { .. } => "value_proposed",
            CoordinationEvent::LeaderElected { .. } => "leader_elected",
            CoordinationEvent::LeadershipRotated { .. } => "leadership_rotated",
        }
    }

    /// Get the task ID if this event is task-scoped
    pub fn task_id(&self) -> Option<&str> {
        match self {
            CoordinationEvent::TaskSubmitted { task_id, .. } => Some(task_id),
            CoordinationEvent::TaskDispatched { task_id, .. } => Some(task_id),
            CoordinationEvent::TaskCompleted { task_id, .. } => Some(task_id),
            CoordinationEvent::TaskFailed { task_id, .. } => Some(task_id),
            CoordinationEvent::TaskCancelled { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    /// Get the agent ID if an agent acted in this event
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            CoordinationEvent::TaskDispatched { agent_id, .. } => Some(agent_id),
            CoordinationEvent::TaskCompleted { agent_id, .. } => Some(agent_id),
            CoordinationEvent::TaskFailed { agent_id, .. } => Some(agent_id),
            CoordinationEvent::ProposalCreated { proposer_id, .. } => Some(proposer_id),
            CoordinationEvent::VoteCast { voter_id, .. } => Some(voter_id),
            CoordinationEvent::ValueProposed { agent_id, .. } => Some(agent_id),
            CoordinationEvent::LeaderElected { leader_id, .. } => Some(leader_id),
            CoordinationEvent::LeadershipRotated { leader_id, .. } => Some(leader_id),
            _ => None,
        }
    }
}
