//! "Must finish before" edges between tasks
//!
//! Edges run from a dependency to the task that waits on it. Ids that are
//! referenced but never registered become placeholder nodes: they can be
//! waited on, are never reported as ready themselves, and are upgraded in
//! place if the task is registered later.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::types::Task;
use crate::types::TaskId;

#[derive(Debug, Clone)]
struct Node {
    id: TaskId,
    registered: bool,
}

/// Dependency tracking for live (not yet finished) tasks
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<Node, ()>,
    index: HashMap<TaskId, NodeIndex>,
    /// Declared prerequisites of each registered task. Kept separately from
    /// the edges so removing a prerequisite does not relax its dependents.
    declared: HashMap<TaskId, BTreeSet<TaskId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(Node {
            id: id.to_string(),
            registered: false,
        });
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Register a task and its dependency edges
    ///
    /// Registering the same id again replaces its dependency set.
    pub fn add_task(&mut self, task: &Task) {
        self.add_task_where(task, |_| false);
    }

    /// Register a task, skipping edges to prerequisites that `finished` reports
    /// as already done
    ///
    /// The skipped ids still count toward readiness; they just never get a
    /// node, since nothing will complete them again.
    pub fn add_task_where<F>(&mut self, task: &Task, finished: F)
    where
        F: Fn(&str) -> bool,
    {
        let idx = self.ensure_node(&task.id);
        self.graph[idx].registered = true;

        let stale: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (e.id(), e.source()))
            .collect();
        for (edge, _) in &stale {
            self.graph.remove_edge(*edge);
        }

        for dep in task.dependencies.iter().filter(|d| !finished(d.as_str())) {
            let dep_idx = self.ensure_node(dep);
            self.graph.update_edge(dep_idx, idx, ());
        }
        self.declared.insert(task.id.clone(), task.dependencies.clone());

        for (_, source) in stale {
            self.prune_placeholder(source);
        }
    }

    /// Direct prerequisites of `id`; empty for unknown ids
    pub fn get_dependencies(&self, id: &str) -> Vec<TaskId> {
        self.declared
            .get(id)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Live tasks that directly wait on `id`
    pub fn get_dependents(&self, id: &str) -> Vec<TaskId> {
        let Some(idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut dependents: Vec<TaskId> = self
            .graph
            .neighbors_directed(*idx, Direction::Outgoing)
            .map(|n| self.graph[n].id.clone())
            .collect();
        dependents.sort();
        dependents
    }

    /// Whether a registered task has every prerequisite in `completed`
    pub fn is_ready(&self, id: &str, completed: &HashSet<TaskId>) -> bool {
        self.declared
            .get(id)
            .is_some_and(|deps| deps.iter().all(|d| completed.contains(d)))
    }

    /// All registered tasks whose dependency set is a subset of `completed`
    pub fn get_ready_tasks(&self, completed: &HashSet<TaskId>) -> Vec<TaskId> {
        let mut ready: Vec<TaskId> = self
            .declared
            .iter()
            .filter(|(_, deps)| deps.iter().all(|d| completed.contains(d)))
            .map(|(id, _)| id.clone())
            .collect();
        ready.sort();
        ready
    }

    /// Delete a node and its incident edges; false if it was not present
    ///
    /// Placeholders left with no dependents are dropped along with it.
    pub fn remove_task(&mut self, id: &str) -> bool {
        let Some(idx) = self.index.remove(id) else {
            return false;
        };
        let prerequisites: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .collect();
        self.graph.remove_node(idx);
        self.declared.remove(id);

        for prerequisite in prerequisites {
            self.prune_placeholder(prerequisite);
        }
        true
    }

    fn prune_placeholder(&mut self, idx: NodeIndex) {
        let Some(node) = self.graph.node_weight(idx) else {
            return;
        };
        if node.registered
            || self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_some()
        {
            return;
        }
        let id = node.id.clone();
        self.graph.remove_node(idx);
        self.index.remove(&id);
    }

    /// Whether `id` is a registered (not placeholder) task
    pub fn contains(&self, id: &str) -> bool {
        self.declared.contains_key(id)
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Nodes held, placeholders included
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Members of some dependency cycle, if one exists
    ///
    /// Tasks on a cycle can never become ready.
    pub fn detect_cycle(&self) -> Option<Vec<TaskId>> {
        for component in petgraph::algo::tarjan_scc(&self.graph) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|n| self.graph.contains_edge(*n, *n));
            if cyclic {
                let mut ids: Vec<TaskId> = component
                    .into_iter()
                    .map(|n| self.graph[n].id.clone())
                    .collect();
                ids.sort();
                return Some(ids);
            }
        }
        None
    }

    /// Placeholder ids: referenced as prerequisites but never registered
    pub fn unregistered_dependencies(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .graph
            .node_weights()
            .filter(|n| !n.registered)
            .map(|n| n.id.clone())
            .collect();
        ids.sort();
        ids
    }
}
