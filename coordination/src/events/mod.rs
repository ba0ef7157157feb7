//! Event-driven observation of the coordination core
//!
//! Components publish a [`CoordinationEvent`] after each state change so
//! higher-level orchestration and dashboards can react without polling.
//!
//! # Ordering
//!
//! Events are published after the component's lock is released. Events
//! caused by one caller arrive in the order that caller made its calls.
//! There is no ordering across threads or across components: under
//! contention a subscriber may see `task_dispatched` for a task before its
//! `task_submitted`. Query the component for authoritative state.
//!
//! # Event Flow
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Component   │────▶│  Event Bus   │────▶│  Subscribers │
//! │  (publish)   │     │  (broadcast) │     │   (recv)     │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use agent_coordination::events::{EventBus, EventBusExt, EventFilter};
//! use agent_coordination::scheduler::{Task, TaskManager};
//!
//! let bus = EventBus::new().shared();
//! let mut dispatches = bus.subscribe_filtered(EventFilter::new().types(vec!["task_dispatched"]));
//!
//! let manager = TaskManager::new().with_event_bus(bus.clone());
//! manager.submit(Task::new("index repository"))?;
//! manager.get_next_task("agent-1");
//!
//! let event = dispatches.recv().await?;
//! ```

pub mod bus;
pub mod types;

// Re-export core types
pub use bus::{
    EventBus, EventBusExt, EventFilter, FilteredReceiver, SharedEventBus, DEFAULT_CHANNEL_CAPACITY,
};
pub use types::CoordinationEvent;
