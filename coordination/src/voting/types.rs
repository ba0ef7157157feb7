//! Proposal and vote records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{new_id, AgentId, ProposalId};

/// A ballot choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
            Self::Abstain => write!(f, "abstain"),
        }
    }
}

/// Something put to the group for a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique proposal identifier
    pub proposal_id: ProposalId,
    pub title: String,
    pub description: String,
    /// Agent that raised the proposal
    pub proposer_id: AgentId,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    /// Create a proposal with a fresh id
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        proposer_id: impl Into<AgentId>,
    ) -> Self {
        Self {
            proposal_id: new_id(),
            title: title.into(),
            description: description.into(),
            proposer_id: proposer_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// One voter's ballot on one proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter_id: AgentId,
    pub vote: VoteChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub cast_at: DateTime<Utc>,
}

/// Tally of a proposal, derived from the votes present at call time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteResult {
    /// Quorum met and YES share of total voters reached the threshold
    pub passed: bool,
    pub votes_for: usize,
    pub votes_against: usize,
    pub votes_abstain: usize,
    /// Votes cast (including abstentions) over total voters reached quorum
    pub quorum_met: bool,
    /// Eligible voters the tally was computed against
    pub total_voters: usize,
}

impl VoteResult {
    /// Every counted ballot, abstentions included
    pub fn votes_cast(&self) -> usize {
        self.votes_for + self.votes_against + self.votes_abstain
    }

    /// Votes cast as a fraction of eligible voters
    pub fn participation(&self) -> f64 {
        if self.total_voters == 0 {
            0.0
        } else {
            self.votes_cast() as f64 / self.total_voters as f64
        }
    }
}
