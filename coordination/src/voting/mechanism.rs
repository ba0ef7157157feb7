//! Proposal → vote → quorum/threshold tally
//!
//! Tallying is a pure read over the votes present when it is called; it
//! never closes a proposal. Callers that want a final answer decide when to
//! stop reading.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::types::{Proposal, Vote, VoteChoice, VoteResult};
use crate::config::{check_fraction, ConfigError, VotingConfig};
use crate::events::{bus::emit, CoordinationEvent, SharedEventBus};
use crate::types::{AgentId, ProposalId};

/// Error type for voting construction
#[derive(Debug, thiserror::Error)]
pub enum VotingError {
    #[error("Invalid voting parameter: {0}")]
    InvalidParameter(#[from] ConfigError),
}

/// Result type for voting operations
pub type VotingResult<T> = Result<T, VotingError>;

/// Shared reference to VotingMechanism
pub type SharedVotingMechanism = Arc<VotingMechanism>;

#[derive(Debug, Default)]
struct VotingState {
    proposals: HashMap<ProposalId, Proposal>,
    /// Latest ballot per voter, per proposal
    votes: HashMap<ProposalId, BTreeMap<AgentId, Vote>>,
}

/// Structured voting over proposals
pub struct VotingMechanism {
    quorum: f64,
    threshold: f64,
    state: Mutex<VotingState>,
    event_bus: Option<SharedEventBus>,
}

impl VotingMechanism {
    /// Create a voting mechanism; both fractions must lie in `[0.0, 1.0]`
    pub fn new(quorum: f64, threshold: f64) -> VotingResult<Self> {
        check_fraction("quorum", quorum)?;
        check_fraction("threshold", threshold)?;
        Ok(Self {
            quorum,
            threshold,
            state: Mutex::new(VotingState::default()),
            event_bus: None,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &VotingConfig) -> VotingResult<Self> {
        Self::new(config.quorum, config.threshold)
    }

    /// Publish proposal and vote events to `bus`
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Create a shared reference to this mechanism
    pub fn shared(self) -> SharedVotingMechanism {
        Arc::new(self)
    }

    pub fn quorum(&self) -> f64 {
        self.quorum
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn state(&self) -> MutexGuard<'_, VotingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new proposal with a fresh id
    pub fn create_proposal(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        proposer_id: impl Into<AgentId>,
    ) -> Proposal {
        let proposal = Proposal::new(title, description, proposer_id);
        {
            let mut state = self.state();
            state
                .proposals
                .insert(proposal.proposal_id.clone(), proposal.clone());
            state
                .votes
                .insert(proposal.proposal_id.clone(), BTreeMap::new());
        }

        info!(
            proposal_id = %proposal.proposal_id,
            proposer_id = %proposal.proposer_id,
            "Proposal created"
        );
        emit(
            &self.event_bus,
            CoordinationEvent::ProposalCreated {
                proposal_id: proposal.proposal_id.clone(),
                title: proposal.title.clone(),
                proposer_id: proposal.proposer_id.clone(),
                timestamp: proposal.created_at,
            },
        );
        proposal
    }

    /// Record a ballot; a voter's later ballot replaces their earlier one
    ///
    /// Returns None if the proposal does not exist.
    pub fn cast_vote(
        &self,
        proposal_id: &str,
        voter_id: impl Into<AgentId>,
        vote: VoteChoice,
        reason: Option<String>,
    ) -> Option<Vote> {
        let ballot = Vote {
            proposal_id: proposal_id.to_string(),
            voter_id: voter_id.into(),
            vote,
            reason,
            cast_at: Utc::now(),
        };

        let replaced = {
            let mut state = self.state();
            let Some(votes) = state.votes.get_mut(proposal_id) else {
                debug!(proposal_id, "Vote ignored: unknown proposal");
                return None;
            };
            votes
                .insert(ballot.voter_id.clone(), ballot.clone())
                .is_some()
        };

        debug!(
            proposal_id,
            voter_id = %ballot.voter_id,
            vote = %vote,
            replaced,
            "Vote cast"
        );
        emit(
            &self.event_bus,
            CoordinationEvent::VoteCast {
                proposal_id: proposal_id.to_string(),
                voter_id: ballot.voter_id.clone(),
                vote,
                replaced,
                timestamp: ballot.cast_at,
            },
        );
        Some(ballot)
    }

    /// Tally the current ballots against `total_voters` eligible voters
    ///
    /// Returns None for an unknown proposal or `total_voters == 0`.
    pub fn tally_votes(&self, proposal_id: &str, total_voters: usize) -> Option<VoteResult> {
        if total_voters == 0 {
            debug!(proposal_id, "Tally rejected: no eligible voters");
            return None;
        }

        let (votes_for, votes_against, votes_abstain) = {
            let state = self.state();
            let votes = state.votes.get(proposal_id)?;
            votes
                .values()
                .fold((0, 0, 0), |(yes, no, abstain), ballot| match ballot.vote {
                    VoteChoice::Yes => (yes + 1, no, abstain),
                    VoteChoice::No => (yes, no + 1, abstain),
                    VoteChoice::Abstain => (yes, no, abstain + 1),
                })
        };

        let votes_cast = votes_for + votes_against + votes_abstain;
        if votes_cast > total_voters {
            warn!(
                proposal_id,
                votes_cast, total_voters, "More ballots than eligible voters"
            );
        }

        let total = total_voters as f64;
        let quorum_met = votes_cast as f64 / total >= self.quorum;
        let passed = quorum_met && votes_for as f64 / total >= self.threshold;

        Some(VoteResult {
            passed,
            votes_for,
            votes_against,
            votes_abstain,
            quorum_met,
            total_voters,
        })
    }

    pub fn get_proposal(&self, proposal_id: &str) -> Option<Proposal> {
        self.state().proposals.get(proposal_id).cloned()
    }

    /// Current ballots on a proposal, ordered by voter id
    pub fn get_votes(&self, proposal_id: &str) -> Vec<Vote> {
        self.state()
            .votes
            .get(proposal_id)
            .map(|votes| votes.values().cloned().collect())
            .unwrap_or_default()
    }

    /// All proposals, oldest first
    pub fn list_proposals(&self) -> Vec<Proposal> {
        let mut proposals: Vec<Proposal> = self.state().proposals.values().cloned().collect();
        proposals.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.proposal_id.cmp(&b.proposal_id))
        });
        proposals
    }

    pub fn proposal_count(&self) -> usize {
        self.state().proposals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    fn mechanism() -> VotingMechanism {
        VotingMechanism::new(0.5, 0.5).unwrap()
    }

    #[test]
    fn test_rejects_out_of_range_parameters() {
        assert!(VotingMechanism::new(1.5, 0.5).is_err());
        assert!(VotingMechanism::new(0.5, -0.1).is_err());
        assert!(VotingMechanism::new(f64::NAN, 0.5).is_err());
        assert!(VotingMechanism::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn test_two_yes_one_no_of_four() {
        let voting = mechanism();
        let proposal = voting.create_proposal("Adopt plan", "Use plan B", "agent-0");
        let id = &proposal.proposal_id;

        voting.cast_vote(id, "a", VoteChoice::Yes, None).unwrap();
        voting.cast_vote(id, "b", VoteChoice::Yes, None).unwrap();
        voting
            .cast_vote(id, "c", VoteChoice::No, Some("too risky".into()))
            .unwrap();

        let result = voting.tally_votes(id, 4).unwrap();
        assert!(result.quorum_met);
        assert!(result.passed);
        assert_eq!(result.votes_for, 2);
        assert_eq!(result.votes_against, 1);
        assert_eq!(result.votes_abstain, 0);
    }

    #[test]
    fn test_quorum_not_met() {
        let voting = mechanism();
        let id = voting.create_proposal("t", "d", "p").proposal_id;
        voting.cast_vote(&id, "a", VoteChoice::Yes, None);

        let result = voting.tally_votes(&id, 4).unwrap();
        assert!(!result.quorum_met);
        assert!(!result.passed);
    }

    #[test]
    fn test_abstain_counts_toward_quorum_only() {
        let voting = mechanism();
        let id = voting.create_proposal("t", "d", "p").proposal_id;
        voting.cast_vote(&id, "a", VoteChoice::Yes, None);
        voting.cast_vote(&id, "b", VoteChoice::Abstain, None);
        voting.cast_vote(&id, "c", VoteChoice::Abstain, None);

        let result = voting.tally_votes(&id, 4).unwrap();
        assert!(result.quorum_met);
        assert!(!result.passed, "1/4 YES is below threshold");
    }

    #[test]
    fn test_revote_last_write_wins() {
        let voting = mechanism();
        let id = voting.create_proposal("t", "d", "p").proposal_id;
        voting.cast_vote(&id, "a", VoteChoice::No, None);
        voting.cast_vote(&id, "a", VoteChoice::Yes, None);

        let result = voting.tally_votes(&id, 2).unwrap();
        assert_eq!(result.votes_for, 1);
        assert_eq!(result.votes_against, 0);
        assert_eq!(voting.get_votes(&id).len(), 1);
    }

    #[test]
    fn test_tally_is_idempotent() {
        let voting = mechanism();
        let id = voting.create_proposal("t", "d", "p").proposal_id;
        voting.cast_vote(&id, "a", VoteChoice::Yes, None);

        let first = voting.tally_votes(&id, 3).unwrap();
        let second = voting.tally_votes(&id, 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_tally_inputs() {
        let voting = mechanism();
        let id = voting.create_proposal("t", "d", "p").proposal_id;
        assert!(voting.tally_votes(&id, 0).is_none());
        assert!(voting.tally_votes("missing", 3).is_none());
        assert!(voting
            .cast_vote("missing", "a", VoteChoice::Yes, None)
            .is_none());
    }

    #[test]
    fn test_proposal_queries() {
        let voting = mechanism();
        let first = voting.create_proposal("first", "d", "p");
        let second = voting.create_proposal("second", "d", "p");

        assert_eq!(voting.proposal_count(), 2);
        assert_eq!(voting.get_proposal(&first.proposal_id), Some(first.clone()));
        let titles: Vec<String> = voting.list_proposals().into_iter().map(|p| p.title).collect();
        assert!(titles.contains(&"first".to_string()));
        assert!(titles.contains(&second.title));
        assert!(voting.get_votes(&first.proposal_id).is_empty());
    }

    #[tokio::test]
    async fn test_vote_events() {
        let bus = EventBus::new().shared();
        let mut rx = bus.subscribe();
        let voting = mechanism().with_event_bus(bus.clone());

        let id = voting.create_proposal("t", "d", "p").proposal_id;
        voting.cast_vote(&id, "a", VoteChoice::Yes, None);
        voting.cast_vote(&id, "a", VoteChoice::No, None);

        assert_eq!(rx.recv().await.unwrap().event_type(), "proposal_created");
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoordinationEvent::VoteCast { replaced: false, .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            CoordinationEvent::VoteCast {
                replaced: true,
                vote: VoteChoice::No,
                ..
            }
        ));
    }
}
