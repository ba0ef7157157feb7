//! Task manager - the scheduling facade
//!
//! Composes the dependency graph and the priority queue behind a single
//! mutex. The queue only ever holds tasks that are QUEUED and ready; a task
//! whose prerequisites are outstanding waits in the graph and is promoted
//! when its last prerequisite completes.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::graph::DependencyGraph;
use super::queue::TaskQueue;
use super::types::{Task, TaskResult, TaskStatus};
use crate::config::SchedulerConfig;
use crate::events::{bus::emit, CoordinationEvent, SharedEventBus};
use crate::types::{AgentId, TaskId};

/// Error type for scheduler operations
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Task already submitted: {0}")]
    DuplicateTask(TaskId),
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Shared reference to TaskManager
pub type SharedTaskManager = Arc<TaskManager>;

/// Point-in-time counters for dashboards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// QUEUED tasks, ready or not
    pub pending: usize,
    /// QUEUED tasks whose prerequisites are all satisfied
    pub ready: usize,
    pub running: usize,
    /// COMPLETED plus FAILED
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Every task ever submitted
    pub total: usize,
}

#[derive(Debug, Default)]
struct SchedulerState {
    graph: DependencyGraph,
    queue: TaskQueue,
    tasks: HashMap<TaskId, Task>,
    statuses: HashMap<TaskId, TaskStatus>,
    results: HashMap<TaskId, TaskResult>,
    assignments: HashMap<TaskId, AgentId>,
    running_by_agent: HashMap<AgentId, BTreeSet<TaskId>>,
    /// Finished ids that release their dependents
    satisfied: HashSet<TaskId>,
    pending: usize,
    running: usize,
    completed: usize,
    failed: usize,
    cancelled: usize,
}

impl SchedulerState {
    fn submit(&mut self, task: Task) -> SchedulerResult<CoordinationEvent> {
        if self.tasks.contains_key(&task.id) {
            return Err(SchedulerError::DuplicateTask(task.id));
        }

        // Finished prerequisites were dropped from the graph; don't resurrect them
        let statuses = &self.statuses;
        self.graph.add_task_where(&task, |dep| {
            statuses.get(dep).is_some_and(TaskStatus::is_terminal)
        });
        let ready = self.graph.is_ready(&task.id, &self.satisfied);
        if ready {
            self.queue.push(task.clone());
        }

        self.statuses.insert(task.id.clone(), TaskStatus::Queued);
        self.pending += 1;

        let event = CoordinationEvent::TaskSubmitted {
            task_id: task.id.clone(),
            name: task.name.clone(),
            priority: task.priority,
            ready,
            timestamp: Utc::now(),
        };
        self.tasks.insert(task.id.clone(), task);
        Ok(event)
    }

    /// Queue every dependent of `id` that has just become ready
    fn release_dependents(&mut self, dependents: Vec<TaskId>) -> Vec<TaskId> {
        let mut released = Vec::new();
        for dependent in dependents {
            if self.statuses.get(&dependent) != Some(&TaskStatus::Queued)
                || self.queue.contains(&dependent)
                || !self.graph.is_ready(&dependent, &self.satisfied)
            {
                continue;
            }
            if let Some(task) = self.tasks.get(&dependent) {
                self.queue.push(task.clone());
                released.push(dependent);
            }
        }
        released
    }
}

/// Scheduling facade for a pool of agents
pub struct TaskManager {
    state: Mutex<SchedulerState>,
    config: SchedulerConfig,
    event_bus: Option<SharedEventBus>,
}

impl TaskManager {
    /// Create a manager with default configuration
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a manager with explicit configuration
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            state: Mutex::new(SchedulerState::default()),
            config,
            event_bus: None,
        }
    }

    /// Publish lifecycle events to `bus`
    pub fn with_event_bus(mut self, bus: SharedEventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Create a shared reference to this manager
    pub fn shared(self) -> SharedTaskManager {
        Arc::new(self)
    }

    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Submit a task; it is queued for dispatch as soon as it is ready
    pub fn submit(&self, task: Task) -> SchedulerResult<TaskId> {
        let task_id = task.id.clone();
        let event = self.state().submit(task).inspect_err(|e| {
            debug!(task_id = %task_id, error = %e, "Rejected task submission");
        })?;

        info!(task_id = %task_id, "Task submitted");
        emit(&self.event_bus, event);
        Ok(task_id)
    }

    /// Submit several tasks under one lock, preserving input order
    ///
    /// Stops at the first duplicate id; tasks before it stay submitted.
    pub fn submit_batch<I>(&self, tasks: I) -> SchedulerResult<Vec<TaskId>>
    where
        I: IntoIterator<Item = Task>,
    {
        let mut ids = Vec::new();
        let mut events = Vec::new();
        let outcome: SchedulerResult<()> = {
            let mut state = self.state();
            tasks.into_iter().try_for_each(|task| {
                let id = task.id.clone();
                events.push(state.submit(task)?);
                ids.push(id);
                Ok(())
            })
        };

        info!(submitted = ids.len(), "Task batch submitted");
        for event in events {
            emit(&self.event_bus, event);
        }
        outcome.map(|()| ids)
    }

    /// Cancel a QUEUED task; false for running, finished or unknown tasks
    pub fn cancel(&self, task_id: &str) -> bool {
        {
            let mut state = self.state();
            if state.statuses.get(task_id) != Some(&TaskStatus::Queued) {
                debug!(task_id, "Cancel ignored: task not queued");
                return false;
            }
            state
                .statuses
                .insert(task_id.to_string(), TaskStatus::Cancelled);
            state.queue.remove(task_id);
            state.graph.remove_task(task_id);
            state.pending -= 1;
            state.cancelled += 1;
        }

        info!(task_id, "Task cancelled");
        emit(
            &self.event_bus,
            CoordinationEvent::TaskCancelled {
                task_id: task_id.to_string(),
                timestamp: Utc::now(),
            },
        );
        true
    }

    /// Hand the highest-priority ready task to `agent_id`
    ///
    /// Popping and marking RUNNING happen under one lock, so concurrent
    /// callers never receive the same task.
    pub fn get_next_task(&self, agent_id: &str) -> Option<Task> {
        let task = {
            let mut state = self.state();
            let task = state.queue.pop()?;
            state.statuses.insert(task.id.clone(), TaskStatus::Running);
            state
                .assignments
                .insert(task.id.clone(), agent_id.to_string());
            state
                .running_by_agent
                .entry(agent_id.to_string())
                .or_default()
                .insert(task.id.clone());
            state.pending -= 1;
            state.running += 1;
            task
        };

        info!(task_id = %task.id, agent_id, priority = task.priority, "Task dispatched");
        emit(
            &self.event_bus,
            CoordinationEvent::TaskDispatched {
                task_id: task.id.clone(),
                agent_id: agent_id.to_string(),
                timestamp: Utc::now(),
            },
        );
        Some(task)
    }

    /// Record the result of a RUNNING task
    ///
    /// Returns false, changing nothing, if the task is unknown or not running.
    pub fn complete_task(&self, result: TaskResult) -> bool {
        let task_id = result.task_id.clone();
        let agent_id = result.agent_id.clone();
        let success = result.success;

        let released = {
            let mut state = self.state();
            if state.statuses.get(&task_id) != Some(&TaskStatus::Running) {
                debug!(task_id = %task_id, "Completion ignored: task not running");
                return false;
            }

            let assignee = state.assignments.get(&task_id).cloned();
            if let Some(assignee) = assignee {
                if assignee != agent_id {
                    warn!(
                        task_id = %task_id,
                        assignee = %assignee,
                        reporter = %agent_id,
                        "Result reported by an agent other than the assignee"
                    );
                }
                if let Some(running) = state.running_by_agent.get_mut(&assignee) {
                    running.remove(&task_id);
                    if running.is_empty() {
                        state.running_by_agent.remove(&assignee);
                    }
                }
            }

            let status = if success {
                TaskStatus::Completed
            } else {
                TaskStatus::Failed
            };
            state.statuses.insert(task_id.clone(), status);
            state.running -= 1;
            state.completed += 1;
            if !success {
                state.failed += 1;
            }
            if success || self.config.failed_dependencies_satisfy {
                state.satisfied.insert(task_id.clone());
            }
            state.results.insert(task_id.clone(), result);

            let dependents = state.graph.get_dependents(&task_id);
            state.graph.remove_task(&task_id);
            state.release_dependents(dependents)
        };

        let timestamp = Utc::now();
        let event = if success {
            info!(task_id = %task_id, agent_id = %agent_id, released = released.len(), "Task completed");
            CoordinationEvent::TaskCompleted {
                task_id,
                agent_id,
                released,
                timestamp,
            }
        } else {
            warn!(task_id = %task_id, agent_id = %agent_id, "Task failed");
            CoordinationEvent::TaskFailed {
                task_id,
                agent_id,
                timestamp,
            }
        };
        emit(&self.event_bus, event);
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current status, or None for an id that was never submitted
    pub fn get_task_status(&self, task_id: &str) -> Option<TaskStatus> {
        self.state().statuses.get(task_id).copied()
    }

    /// The task as submitted
    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.state().tasks.get(task_id).cloned()
    }

    /// The recorded result of a finished task
    pub fn get_result(&self, task_id: &str) -> Option<TaskResult> {
        self.state().results.get(task_id).cloned()
    }

    /// Agent the task was dispatched to
    pub fn get_assigned_agent(&self, task_id: &str) -> Option<AgentId> {
        self.state().assignments.get(task_id).cloned()
    }

    /// Tasks currently RUNNING on `agent_id`
    pub fn get_agent_tasks(&self, agent_id: &str) -> Vec<TaskId> {
        self.state()
            .running_by_agent
            .get(agent_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Direct prerequisites of a task still waiting or queued
    pub fn get_dependencies(&self, task_id: &str) -> Vec<TaskId> {
        self.state().graph.get_dependencies(task_id)
    }

    /// Ids that live tasks wait on but that were never submitted
    pub fn unregistered_dependencies(&self) -> Vec<TaskId> {
        self.state().graph.unregistered_dependencies()
    }

    /// Members of a dependency cycle among live tasks, if any
    pub fn detect_cycle(&self) -> Option<Vec<TaskId>> {
        self.state().graph.detect_cycle()
    }

    pub fn get_pending_count(&self) -> usize {
        self.state().pending
    }

    pub fn get_running_count(&self) -> usize {
        self.state().running
    }

    /// COMPLETED and FAILED tasks together
    pub fn get_completed_count(&self) -> usize {
        self.state().completed
    }

    pub fn get_failed_count(&self) -> usize {
        self.state().failed
    }

    pub fn get_cancelled_count(&self) -> usize {
        self.state().cancelled
    }

    pub fn get_total_count(&self) -> usize {
        self.state().tasks.len()
    }

    /// Consistent snapshot of every counter
    pub fn stats(&self) -> SchedulerStats {
        let state = self.state();
        SchedulerStats {
            pending: state.pending,
            ready: state.queue.len(),
            running: state.running,
            completed: state.completed,
            failed: state.failed,
            cancelled: state.cancelled,
            total: state.tasks.len(),
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
