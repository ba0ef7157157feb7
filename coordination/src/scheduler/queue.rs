//! Priority-ordered holding area for tasks
//!
//! A max-heap keyed on `(priority, insertion order)`: higher priority pops
//! first and equal priorities pop in the order they were pushed. Removal by
//! id is lazy; the heap entry stays behind as a tombstone and is skipped when
//! it reaches the top.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use super::types::Task;
use crate::types::TaskId;

/// Heap ordering wrapper (max heap by priority, then by sequence)
#[derive(Debug)]
struct HeapEntry {
    priority: i64,
    sequence: u64,
    id: TaskId,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then lower sequence (earlier push)
        match self.priority.cmp(&other.priority) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            other => other,
        }
    }
}

/// Stable priority queue of tasks
#[derive(Debug, Default)]
pub struct TaskQueue {
    heap: BinaryHeap<HeapEntry>,
    /// Live tasks by id, with the sequence of their current heap entry
    live: HashMap<TaskId, (u64, Task)>,
    next_sequence: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task; pushing an id that is already queued replaces it
    pub fn push(&mut self, task: Task) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.heap.push(HeapEntry {
            priority: task.priority,
            sequence,
            id: task.id.clone(),
        });
        self.live.insert(task.id.clone(), (sequence, task));
    }

    /// Remove and return the highest-priority task
    pub fn pop(&mut self) -> Option<Task> {
        while let Some(entry) = self.heap.pop() {
            if self.is_current(&entry) {
                return self.live.remove(&entry.id).map(|(_, task)| task);
            }
        }
        None
    }

    /// The task `pop` would return, without removing it
    pub fn peek(&mut self) -> Option<&Task> {
        self.discard_stale();
        let entry = self.heap.peek()?;
        self.live.get(&entry.id).map(|(_, task)| task)
    }

    /// Remove a task by id; false if it is not queued
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.live.remove(id).is_some();
        if removed {
            self.discard_stale();
        }
        removed
    }

    /// Look up a queued task
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.live.get(id).map(|(_, task)| task)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn is_current(&self, entry: &HeapEntry) -> bool {
        self.live
            .get(&entry.id)
            .is_some_and(|(sequence, _)| *sequence == entry.sequence)
    }

    /// Drop tombstones sitting at the top of the heap
    fn discard_stale(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.is_current(top) {
                break;
            }
            self.heap.pop();
        }
        if self.live.is_empty() {
            self.heap.clear();
        }
    }
}
