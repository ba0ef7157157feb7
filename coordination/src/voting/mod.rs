//! Group decision primitives
//!
//! - **VotingMechanism**: formal proposals, YES/NO/ABSTAIN ballots, and a
//!   quorum/threshold tally computed against the number of eligible voters.
//! - **ConsensusBuilder**: lighter value convergence keyed by an opaque
//!   string, with no proposal objects.
//!
//! Neither primitive blocks. Tallies and consensus checks compute over
//! whatever has arrived so far, so repeated calls can be used to drive a
//! live view while ballots trickle in.
//!
//! # Usage
//!
//! ```ignore
//! use agent_coordination::voting::{VoteChoice, VotingMechanism};
//!
//! let voting = VotingMechanism::new(0.5, 0.5)?;
//! let proposal = voting.create_proposal("Adopt schema v2", "Migrate on Monday", "agent-1");
//! voting.cast_vote(&proposal.proposal_id, "agent-2", VoteChoice::Yes, None);
//!
//! if let Some(result) = voting.tally_votes(&proposal.proposal_id, 4) {
//!     println!("passed={} quorum={}", result.passed, result.quorum_met);
//! }
//! ```

pub mod consensus;
pub mod mechanism;
pub mod types;

pub use consensus::{ConsensusBuilder, SharedConsensusBuilder};
pub use mechanism::{SharedVotingMechanism, VotingError, VotingMechanism, VotingResult};
pub use types::{Proposal, Vote, VoteChoice, VoteResult};
