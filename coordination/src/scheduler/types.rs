//! Task records and their lifecycle status

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{new_id, AgentId, TaskId};

/// Lifecycle status of a submitted task
///
/// `Queued → Running → Completed | Failed`, or `Queued → Cancelled`.
/// Nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Submitted, waiting on dependencies or on an agent
    Queued,
    /// Handed to an agent
    Running,
    /// Finished successfully
    Completed,
    /// Finished with a failure result
    Failed,
    /// Withdrawn before dispatch
    Cancelled,
}

impl TaskStatus {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A unit of work
///
/// Immutable once submitted; the manager tracks status separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: TaskId,

    /// Human-readable name
    pub name: String,

    /// Higher runs sooner
    pub priority: i64,

    /// Tasks that must complete before this one is ready
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub dependencies: BTreeSet<TaskId>,

    /// Opaque work description for the executing agent
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a task with a generated id and priority 0
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            priority: 0,
            dependencies: BTreeSet::new(),
            payload: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Use a caller-supplied id
    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set priority
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Add a single prerequisite
    pub fn with_dependency(mut self, id: impl Into<TaskId>) -> Self {
        self.dependencies.insert(id.into());
        self
    }

    /// Add several prerequisites
    pub fn with_dependencies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.dependencies.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Outcome reported by the agent that executed a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task this result is for
    pub task_id: TaskId,

    /// Whether execution succeeded
    pub success: bool,

    /// Agent output (or error detail on failure)
    #[serde(default)]
    pub output: serde_json::Value,

    /// Agent that executed the task
    pub agent_id: AgentId,

    /// When the result was produced
    pub completed_at: DateTime<Utc>,
}

impl TaskResult {
    /// Successful result
    pub fn success(
        task_id: impl Into<TaskId>,
        agent_id: impl Into<AgentId>,
        output: serde_json::Value,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            success: true,
            output,
            agent_id: agent_id.into(),
            completed_at: Utc::now(),
        }
    }

    /// Failed result
    pub fn failure(
        task_id: impl Into<TaskId>,
        agent_id: impl Into<AgentId>,
        output: serde_json::Value,
    ) -> Self {
        Self {
            success: false,
            ..Self::success(task_id, agent_id, output)
        }
    }
}
