//! Random election: a uniform pick among the candidates

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{ElectionProgress, ElectionProtocol, ElectionResult, ElectionState};
use crate::events::SharedEventBus;
use crate::types::AgentId;

const PROTOCOL: &str = "random";

/// Uniform leader selection
///
/// Unseeded instances draw from the thread-local generator, so repeated
/// elections are uncorrelated. A seeded instance is reproducible.
pub struct RandomElection {
    seeded: Option<Mutex<StdRng>>,
    progress: ElectionProgress,
}

impl RandomElection {
    pub fn new() -> Self {
        Self {
            seeded: None,
            progress: ElectionProgress::new(),
        }
    }

    /// Reproducible picks from a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
            progress: ElectionProgress::new(),
        }
    }

    /// Announce elected leaders on `bus`
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.progress.set_event_bus(bus);
        self
    }

    fn pick<'a>(&self, candidates: &'a [AgentId]) -> Option<&'a AgentId> {
        match &self.seeded {
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
                candidates.choose(&mut *rng)
            }
            None => candidates.choose(&mut rand::thread_rng()),
        }
    }
}

impl Default for RandomElection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ElectionProtocol for RandomElection {
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
        if candidates.is_empty() {
            return self.progress.finish_empty(PROTOCOL);
        }

        self.progress.start();
        tokio::task::yield_now().await;

        match self.pick(candidates) {
            Some(leader) => self.progress.finish(PROTOCOL, leader, candidates.len(), 1),
            None => self.progress.finish_empty(PROTOCOL),
        }
    }
}
