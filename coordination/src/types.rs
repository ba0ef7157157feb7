//! Shared identifier types
//!
//! Ids are opaque strings. Callers may supply their own; anything created
//! without one gets a UUID v4.

/// Unique identifier for a unit of work
pub type TaskId = String;

/// Identity of a worker agent, supplied by the surrounding framework
pub type AgentId = String;

/// Unique identifier for a voting proposal
pub type ProposalId = String;

/// Generate a fresh opaque id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
