//! Task scheduling for a pool of worker agents
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       TaskManager                          │
//! │  • submit / cancel / get_next_task / complete_task         │
//! │  • per-task status, per-agent bookkeeping, O(1) counters   │
//! └──────────────┬─────────────────────────────┬──────────────┘
//!                │                             │
//!                ▼                             ▼
//!     ┌────────────────────┐        ┌────────────────────┐
//!     │  DependencyGraph   │        │     TaskQueue      │
//!     │  readiness, cycles │        │  stable max-heap   │
//!     └────────────────────┘        └────────────────────┘
//! ```
//!
//! A task is ready once every declared dependency has completed. Ids that
//! were never submitted never complete, so a mistyped dependency keeps its
//! dependent waiting instead of releasing it.
//!
//! # Usage
//!
//! ```ignore
//! use agent_coordination::scheduler::{Task, TaskManager, TaskResult};
//!
//! let manager = TaskManager::new().shared();
//! let build = manager.submit(Task::new("build").with_priority(10))?;
//! manager.submit(Task::new("test").with_dependency(build.clone()))?;
//!
//! if let Some(task) = manager.get_next_task("agent-1") {
//!     manager.complete_task(TaskResult::success(task.id, "agent-1", serde_json::json!("ok")));
//! }
//! ```

pub mod graph;
pub mod manager;
pub mod queue;
pub mod types;

pub use graph::DependencyGraph;
pub use manager::{SchedulerError, SchedulerResult, SchedulerStats, SharedTaskManager, TaskManager};
pub use queue::TaskQueue;
pub use types::{Task, TaskResult, TaskStatus};
