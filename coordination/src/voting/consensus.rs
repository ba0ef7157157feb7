//! Value convergence without formal proposals
//!
//! Agents post a value under a shared key; the builder reports the value
//! once enough of the group holds it. A tie for the largest group is never
//! broken arbitrarily: it simply means no consensus yet.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use super::mechanism::VotingResult;
use crate::config::{check_fraction, ConsensusConfig};
use crate::events::{bus::emit, CoordinationEvent, SharedEventBus};
use crate::types::AgentId;

/// Shared reference to ConsensusBuilder
pub type SharedConsensusBuilder<V = String> = Arc<ConsensusBuilder<V>>;

/// Per-key value consensus across agents
pub struct ConsensusBuilder<V = String> {
    convergence_threshold: f64,
    proposals: Mutex<HashMap<String, HashMap<AgentId, V>>>,
    event_bus: Option<SharedEventBus>,
}

impl<V> ConsensusBuilder<V>
where
    V: Clone + Eq + Hash,
{
    /// Create a builder; the threshold must lie in `[0.0, 1.0]`
    pub fn new(convergence_threshold: f64) -> VotingResult<Self> {
        check_fraction("convergence_threshold", convergence_threshold)?;
        Ok(Self {
            convergence_threshold,
            proposals: Mutex::new(HashMap::new()),
            event_bus: None,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &ConsensusConfig) -> VotingResult<Self> {
        Self::new(config.convergence_threshold)
    }

    /// Publish value proposals to `bus`
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Create a shared reference to this builder
    pub fn shared(self) -> SharedConsensusBuilder<V> {
        Arc::new(self)
    }

    pub fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    fn proposals(&self) -> MutexGuard<'_, HashMap<String, HashMap<AgentId, V>>> {
        self.proposals.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Post `value` for `agent_id` under `key`, returning the agent's previous value
    pub fn propose_value(
        &self,
        key: impl Into<String>,
        agent_id: impl Into<AgentId>,
        value: V,
    ) -> Option<V> {
        let key = key.into();
        let agent_id = agent_id.into();
        let previous = self
            .proposals()
            .entry(key.clone())
            .or_default()
            .insert(agent_id.clone(), value);

        debug!(key = %key, agent_id = %agent_id, replaced = previous.is_some(), "Value proposed");
        emit(
            &self.event_bus,
            CoordinationEvent::ValueProposed {
                key,
                agent_id,
                timestamp: Utc::now(),
            },
        );
        previous
    }

    /// Current value per agent for `key`
    pub fn get_proposals(&self, key: &str) -> HashMap<AgentId, V> {
        self.proposals().get(key).cloned().unwrap_or_default()
    }

    /// Number of agents holding each value, largest group first
    pub fn supporter_counts(&self, key: &str) -> Vec<(V, usize)> {
        let proposals = self.proposals();
        let Some(by_agent) = proposals.get(key) else {
            return Vec::new();
        };
        let mut counts: Vec<(V, usize)> = count_supporters(by_agent)
            .into_iter()
            .map(|(value, count)| (value.clone(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// The value held by a unique largest group of at least
    /// `convergence_threshold * total_agents` agents
    ///
    /// None when nobody proposed, `total_agents` is zero, the largest group
    /// is tied, or it falls short of the threshold.
    pub fn check_consensus(&self, key: &str, total_agents: usize) -> Option<V> {
        if total_agents == 0 {
            return None;
        }

        let proposals = self.proposals();
        let counts = count_supporters(proposals.get(key)?);

        let max = counts.values().copied().max()?;
        let mut leaders = counts.iter().filter(|(_, count)| **count == max);
        let (value, _) = leaders.next()?;
        if leaders.next().is_some() {
            debug!(key, supporters = max, "No consensus: tied leading values");
            return None;
        }

        let fraction = max as f64 / total_agents as f64;
        if fraction >= self.convergence_threshold {
            Some((*value).clone())
        } else {
            None
        }
    }

    /// Discard every proposal under `key`; false if there were none
    pub fn clear(&self, key: &str) -> bool {
        self.proposals().remove(key).is_some()
    }

    /// Keys with at least one proposal
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.proposals().keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn count_supporters<V: Eq + Hash>(by_agent: &HashMap<AgentId, V>) -> HashMap<&V, usize> {
    let mut counts = HashMap::new();
    for value in by_agent.values() {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(threshold: f64) -> ConsensusBuilder {
        ConsensusBuilder::new(threshold).unwrap()
    }

    #[test]
    fn test_three_of_four_converge() {
        let consensus = builder(0.6);
        for agent in ["a", "b", "c"] {
            consensus.propose_value("plan", agent, "value".to_string());
        }
        consensus.propose_value("plan", "d", "other".to_string());

        assert_eq!(consensus.check_consensus("plan", 4).as_deref(), Some("value"));
    }

    #[test]
    fn test_below_threshold() {
        let consensus = builder(0.75);
        consensus.propose_value("k", "a", "x".to_string());
        consensus.propose_value("k", "b", "x".to_string());
        consensus.propose_value("k", "c", "y".to_string());

        assert!(consensus.check_consensus("k", 4).is_none());
    }

    #[test]
    fn test_tie_is_no_consensus() {
        let consensus = builder(0.4);
        consensus.propose_value("k", "a", "x".to_string());
        consensus.propose_value("k", "b", "x".to_string());
        consensus.propose_value("k", "c", "y".to_string());
        consensus.propose_value("k", "d", "y".to_string());

        assert!(consensus.check_consensus("k", 4).is_none());
    }

    #[test]
    fn test_last_write_wins_per_agent() {
        let consensus = builder(0.5);
        assert!(consensus.propose_value("k", "a", "x".to_string()).is_none());
        assert_eq!(
            consensus.propose_value("k", "a", "y".to_string()).as_deref(),
            Some("x")
        );

        let proposals = consensus.get_proposals("k");
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals["a"], "y");
    }

    #[test]
    fn test_clear_and_keys() {
        let consensus = builder(0.5);
        consensus.propose_value("k1", "a", "x".to_string());
        consensus.propose_value("k2", "a", "x".to_string());
        assert_eq!(consensus.keys(), vec!["k1", "k2"]);

        assert!(consensus.clear("k1"));
        assert!(!consensus.clear("k1"));
        assert!(consensus.get_proposals("k1").is_empty());
        assert!(consensus.check_consensus("k1", 1).is_none());
        assert_eq!(consensus.keys(), vec!["k2"]);
    }

    #[test]
    fn test_zero_agents_and_unknown_key() {
        let consensus = builder(0.5);
        consensus.propose_value("k", "a", "x".to_string());
        assert!(consensus.check_consensus("k", 0).is_none());
        assert!(consensus.check_consensus("missing", 3).is_none());
    }

    #[test]
    fn test_supporter_counts() {
        let consensus = builder(0.5);
        consensus.propose_value("k", "a", "x".to_string());
        consensus.propose_value("k", "b", "y".to_string());
        consensus.propose_value("k", "c", "y".to_string());

        let counts = consensus.supporter_counts("k");
        assert_eq!(counts[0], ("y".to_string(), 2));
        assert_eq!(counts[1], ("x".to_string(), 1));
    }

    #[test]
    fn test_generic_values() {
        let consensus: ConsensusBuilder<u32> = ConsensusBuilder::new(0.5).unwrap();
        consensus.propose_value("port", "a", 8080);
        consensus.propose_value("port", "b", 8080);
        assert_eq!(consensus.check_consensus("port", 3), Some(8080));
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(ConsensusBuilder::<String>::new(1.01).is_err());
    }
}
