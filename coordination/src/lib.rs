//! Agent Coordination Library
//!
//! In-process coordination core for a pool of worker agents:
//! - Dependency-aware priority task scheduling with atomic dispatch
//! - Proposal voting with quorum/threshold tallies, and value consensus
//! - Leader selection via Bully, Ring or Random election, or strict rotation
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────┐
//!  submit ──────► │       TaskManager        │ ──► get_next_task / complete_task
//!                 │  DependencyGraph + Queue │
//!                 └────────────┬─────────────┘
//!                              │
//!  VotingMechanism ────────────┼──────────── ConsensusBuilder
//!                              │
//!  Bully / Ring / Random ──────┼──────────── RotatingLeadership
//!                              ▼
//!                         EventBus (broadcast)
//! ```
//!
//! Every component is usable standalone; the event bus is optional.
//! Agents are logical participants in one process; cross-host transport
//! belongs to a separate messaging layer.

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod election;
pub mod events;
pub mod scheduler;
pub mod types;
pub mod voting;

// Re-export shared identifiers
pub use types::{new_id, AgentId, ProposalId, TaskId};

// Re-export configuration types
pub use config::{
    ConfigError, ConfigResult, ConsensusConfig, CoordinationConfig, EventsConfig,
    SchedulerConfig, VotingConfig,
};

// Re-export key scheduler types
pub use scheduler::{
    DependencyGraph, SchedulerError, SchedulerResult, SchedulerStats, SharedTaskManager, Task,
    TaskManager, TaskQueue, TaskResult, TaskStatus,
};

// Re-export key voting types
pub use voting::{
    ConsensusBuilder, Proposal, SharedConsensusBuilder, SharedVotingMechanism, Vote, VoteChoice,
    VoteResult, VotingError, VotingMechanism, VotingResult,
};

// Re-export election types
pub use election::{
    BullyElection, ElectionProtocol, ElectionResult, ElectionState, ElectionStrategy, PriorityFn,
    RandomElection, RingElection, RotatingLeadership, SharedRotatingLeadership,
};

// Re-export key event types
pub use events::{CoordinationEvent, EventBus, EventFilter, SharedEventBus};
