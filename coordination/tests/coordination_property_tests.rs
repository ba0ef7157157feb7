//! Coordination property tests: randomized validation of scheduling,
//! voting and leadership invariants.
//!
//! Tests verify:
//! - Ready tasks pop in non-increasing priority order
//! - A task is ready exactly when its dependencies are all satisfied
//! - Rotation lands on position k mod m after k rotations
//! - Bully and Ring always elect a maximum-priority candidate
//! - Tallies never count more ballots than distinct voters
//! - Consensus is reported only for a unique, sufficiently large group

use std::collections::{HashMap, HashSet};

use agent_coordination::election::{BullyElection, ElectionProtocol, RingElection};
use agent_coordination::{
    ConsensusBuilder, DependencyGraph, RotatingLeadership, Task, TaskManager, TaskQueue,
    VoteChoice, VotingMechanism,
};
use proptest::prelude::*;

// ═══════════════════════════════════════════════════════════════════════════
// TEST DATA GENERATORS
// ═══════════════════════════════════════════════════════════════════════════

fn agent_pool(max: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::hash_set("[a-z]{1,6}", 1..=max).prop_map(|set| set.into_iter().collect())
}

fn vote_choice() -> impl Strategy<Value = VoteChoice> {
    prop_oneof![
        Just(VoteChoice::Yes),
        Just(VoteChoice::No),
        Just(VoteChoice::Abstain),
    ]
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .map(|rt| rt.block_on(future))
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// SCHEDULING
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prop_queue_pops_in_priority_order(priorities in proptest::collection::vec(-50i64..50, 0..60)) {
        let mut queue = TaskQueue::new();
        for (i, priority) in priorities.iter().enumerate() {
            queue.push(Task::new("t").with_id(format!("t{i}")).with_priority(*priority));
        }

        let mut last = i64::MAX;
        let mut popped = 0;
        while let Some(task) = queue.pop() {
            prop_assert!(task.priority <= last);
            last = task.priority;
            popped += 1;
        }
        prop_assert_eq!(popped, priorities.len());
    }

    #[test]
    fn prop_equal_priority_is_fifo(count in 1usize..40) {
        let mut queue = TaskQueue::new();
        for i in 0..count {
            queue.push(Task::new("t").with_id(format!("t{i:03}")));
        }
        for i in 0..count {
            let next = queue.pop().map(|t| t.id);
            prop_assert_eq!(next, Some(format!("t{i:03}")));
        }
    }

    #[test]
    fn prop_ready_iff_dependencies_satisfied(
        deps in proptest::collection::vec(proptest::collection::btree_set(0usize..8, 0..5), 8),
        done in proptest::collection::hash_set(0usize..8, 0..8),
    ) {
        let mut graph = DependencyGraph::new();
        for (i, task_deps) in deps.iter().enumerate() {
            let task = Task::new("t")
                .with_id(format!("t{i}"))
                .with_dependencies(task_deps.iter().map(|d| format!("t{d}")));
            graph.add_task(&task);
        }
        let completed: HashSet<String> = done.iter().map(|d| format!("t{d}")).collect();

        let ready: HashSet<String> = graph.get_ready_tasks(&completed).into_iter().collect();
        for (i, task_deps) in deps.iter().enumerate() {
            let id = format!("t{i}");
            let expected = task_deps.iter().all(|d| done.contains(d));
            prop_assert_eq!(graph.is_ready(&id, &completed), expected);
            prop_assert_eq!(ready.contains(&id), expected);
        }
    }

    #[test]
    fn prop_manager_counts_partition(ops in proptest::collection::vec(0u8..4, 1..80)) {
        let manager = TaskManager::new();
        let mut next_id = 0;
        let mut running: Vec<String> = Vec::new();

        for op in ops {
            match op {
                0 => {
                    manager.submit(Task::new("t").with_id(format!("t{next_id}"))).unwrap();
                    next_id += 1;
                }
                1 => {
                    if let Some(task) = manager.get_next_task("agent") {
                        running.push(task.id);
                    }
                }
                2 => {
                    if let Some(id) = running.pop() {
                        prop_assert!(manager.complete_task(
                            agent_coordination::TaskResult::success(id, "agent", serde_json::json!(null))
                        ));
                    }
                }
                _ => {
                    if next_id > 0 {
                        manager.cancel(&format!("t{}", next_id - 1));
                    }
                }
            }

            let stats = manager.stats();
            prop_assert_eq!(
                stats.pending + stats.running + stats.completed + stats.cancelled,
                stats.total
            );
            prop_assert_eq!(stats.running, running.len());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// VOTING AND CONSENSUS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prop_tally_counts_distinct_voters(
        ballots in proptest::collection::vec((0usize..6, vote_choice()), 0..30),
        quorum in 0.0f64..=1.0,
        threshold in 0.0f64..=1.0,
    ) {
        let voting = VotingMechanism::new(quorum, threshold).unwrap();
        let id = voting.create_proposal("p", "d", "proposer").proposal_id;

        let mut latest: HashMap<usize, VoteChoice> = HashMap::new();
        for (voter, choice) in &ballots {
            voting.cast_vote(&id, format!("v{voter}"), *choice, None);
            latest.insert(*voter, *choice);
        }

        let result = voting.tally_votes(&id, 6).unwrap();
        prop_assert_eq!(result.votes_cast(), latest.len());
        let yes = latest.values().filter(|c| **c == VoteChoice::Yes).count();
        prop_assert_eq!(result.votes_for, yes);
        prop_assert_eq!(result.quorum_met, latest.len() as f64 / 6.0 >= quorum);
        prop_assert!(!result.passed || result.quorum_met);
    }

    #[test]
    fn prop_consensus_requires_unique_majority(
        values in proptest::collection::vec(0u8..3, 1..12),
        threshold in 0.0f64..=1.0,
    ) {
        let consensus: ConsensusBuilder<u8> = ConsensusBuilder::new(threshold).unwrap();
        for (agent, value) in values.iter().enumerate() {
            consensus.propose_value("key", format!("a{agent}"), *value);
        }

        let mut counts: HashMap<u8, usize> = HashMap::new();
        for value in &values {
            *counts.entry(*value).or_insert(0) += 1;
        }
        let max = counts.values().copied().max().unwrap_or(0);
        let leaders: Vec<u8> = counts.iter().filter(|(_, c)| **c == max).map(|(v, _)| *v).collect();

        let total = values.len();
        let expected = if leaders.len() == 1 && max as f64 / total as f64 >= threshold {
            Some(leaders[0])
        } else {
            None
        };
        prop_assert_eq!(consensus.check_consensus("key", total), expected);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LEADERSHIP
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn prop_rotation_position(agents in agent_pool(8), k in 0usize..40) {
        let rotation = RotatingLeadership::new(agents.clone());
        for _ in 0..k {
            rotation.rotate();
        }
        prop_assert_eq!(rotation.get_term_count(), k as u64);
        prop_assert_eq!(rotation.get_current_leader(), Some(agents[k % agents.len()].clone()));
    }

    #[test]
    fn prop_bully_and_ring_elect_a_maximum(
        priorities in proptest::collection::vec(-20i64..20, 1..30),
    ) {
        let candidates: Vec<String> = (0..priorities.len()).map(|i| format!("n{i}")).collect();
        let table: HashMap<String, i64> = candidates.iter().cloned().zip(priorities.iter().copied()).collect();
        let max = priorities.iter().copied().max().unwrap();

        let bully_table = table.clone();
        let bully = BullyElection::new(move |id: &str| bully_table[id]);
        let ring_table = table.clone();
        let ring = RingElection::new()
            .with_priority_fn(std::sync::Arc::new(move |id: &str| ring_table[id]));

        let (bully_result, ring_result) =
            block_on(async { (bully.elect(&candidates).await, ring.elect(&candidates).await) });

        let bully_leader = bully_result.leader_id.unwrap();
        let ring_leader = ring_result.leader_id.unwrap();
        prop_assert_eq!(table[&bully_leader], max);
        prop_assert_eq!(table[&ring_leader], max);
        // Both resolve ties to the earliest candidate
        prop_assert_eq!(bully_leader, ring_leader);
    }
}
