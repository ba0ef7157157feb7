//! Event bus for agent coordination
//!
//! Provides pub/sub messaging using Tokio broadcast channels. Publishing
//! never blocks and never fails for lack of subscribers, so components can
//! emit from synchronous code paths.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use super::types::CoordinationEvent;
use crate::config::EventsConfig;

/// Default channel capacity for broadcast
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Event bus with broadcast channels
pub struct EventBus {
    /// Broadcast sender for publishing events
    sender: broadcast::Sender<CoordinationEvent>,
}

impl EventBus {
    /// Create a new event bus with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create an event bus holding up to `capacity` undelivered events per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Create an event bus sized from configuration
    pub fn from_config(config: &EventsConfig) -> Self {
        Self::with_capacity(config.channel_capacity)
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers, returning how many received it
    pub fn publish(&self, event: CoordinationEvent) -> usize {
        let event_type = event.event_type();

        // Broadcast to subscribers (ignore if no receivers)
        match self.sender.send(event) {
            Ok(count) => {
                debug!(event_type, receivers = count, "Event published");
                count
            }
            Err(_) => {
                debug!(event_type, "Event published (no receivers)");
                0
            }
        }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinationEvent> {
        self.sender.subscribe()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if the bus has any subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Publish to an optional bus, the shape every component holds it in
pub(crate) fn emit(bus: &Option<SharedEventBus>, event: CoordinationEvent) {
    if let Some(bus) = bus {
        bus.publish(event);
    }
}

/// Event filter for selective subscription
pub struct EventFilter {
    /// Filter by task ID
    pub task_id: Option<String>,
    /// Filter by acting agent
    pub agent_id: Option<String>,
    /// Filter by event types
    pub event_types: Option<Vec<String>>,
}

impl EventFilter {
    /// Create a new empty filter (matches all events)
    pub fn new() -> Self {
        Self {
            task_id: None,
            agent_id: None,
            event_types: None,
        }
    }

    /// Filter by task ID
    pub fn task(mut self, task_id: &str) -> Self {
        self.task_id = Some(task_id.to_string());
        self
    }

    /// Filter by acting agent
    pub fn agent(mut self, agent_id: &str) -> Self {
        self.agent_id = Some(agent_id.to_string());
        self
    }

    /// Filter by event types
    pub fn types(mut self, event_types: Vec<&str>) -> Self {
        self.event_types = Some(event_types.into_iter().map(String::from).collect());
        self
    }

    /// Check if an event matches this filter
    ///
    /// Events that carry no task (or agent) are not excluded by a task
    /// (or agent) filter.
    pub fn matches(&self, event: &CoordinationEvent) -> bool {
        if let Some(ref tid) = self.task_id {
            if let Some(event_tid) = event.task_id() {
                if event_tid != tid {
                    return false;
                }
            }
        }

        if let Some(ref aid) = self.agent_id {
            if let Some(event_aid) = event.agent_id() {
                if event_aid != aid {
                    return false;
                }
            }
        }

        if let Some(ref types) = self.event_types {
            if !types.iter().any(|t| t == event.event_type()) {
                return false;
            }
        }

        true
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Filtered event receiver that only yields matching events
pub struct FilteredReceiver {
    receiver: broadcast::Receiver<CoordinationEvent>,
    filter: EventFilter,
}

impl FilteredReceiver {
    /// Create a new filtered receiver
    pub fn new(receiver: broadcast::Receiver<CoordinationEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Receive the next matching event
    pub async fn recv(&mut self) -> Result<CoordinationEvent, broadcast::error::RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.filter.matches(&event) {
                return Ok(event);
            }
        }
    }
}

/// Extension trait for subscribing with filters
pub trait EventBusExt {
    /// Subscribe with a filter
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver;
}

impl EventBusExt for EventBus {
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver {
        FilteredReceiver::new(self.subscribe(), filter)
    }
}

impl EventBusExt for SharedEventBus {
    fn subscribe_filtered(&self, filter: EventFilter) -> FilteredReceiver {
        FilteredReceiver::new(self.subscribe(), filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dispatched(task_id: &str, agent_id: &str) -> CoordinationEvent {
        CoordinationEvent::TaskDispatched {
            task_id: task_id.to_string(),
            agent_id: agent_id.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        assert_eq!(bus.publish(dispatched("task-1", "agent-a")), 1);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event_type(), "task_dispatched");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert!(!bus.has_subscribers());
        assert_eq!(bus.publish(dispatched("task-1", "agent-a")), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new().shared();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(CoordinationEvent::LeadershipRotated {
            leader_id: "agent-b".to_string(),
            term: 1,
            timestamp: Utc::now(),
        });

        let e1 = rx1.recv().await.unwrap();
        let e2 = rx2.recv().await.unwrap();

        assert_eq!(e1.event_type(), e2.event_type());
    }

    #[test]
    fn test_event_filter() {
        let filter = EventFilter::new()
            .agent("agent-a")
            .types(vec!["task_dispatched", "task_completed"]);

        let non_matching_type = CoordinationEvent::TaskCancelled {
            task_id: "task-1".to_string(),
            timestamp: Utc::now(),
        };

        assert!(filter.matches(&dispatched("task-1", "agent-a")));
        assert!(!filter.matches(&dispatched("task-1", "agent-b")));
        assert!(!filter.matches(&non_matching_type));
    }

    #[tokio::test]
    async fn test_filtered_receiver() {
        let bus = EventBus::new().shared();
        let filter = EventFilter::new().task("target-task");
        let mut filtered = bus.subscribe_filtered(filter);

        let publisher = bus.clone();
        tokio::spawn(async move {
            publisher.publish(dispatched("other-task", "agent-a"));
            publisher.publish(dispatched("target-task", "agent-a"));
        });

        // Should receive only the matching event
        let event = filtered.recv().await.unwrap();
        assert_eq!(event.task_id(), Some("target-task"));
    }
}
