//! Priority-ordered transform stack for a single phase.
//!
//! # Design Decisions
//! - Three FIFO segments (head, normal, tail) joined in that order, so
//!   registration order is preserved within each priority class
//! - Joining clones `Arc` transforms; the caller gets a snapshot it can
//!   fold without holding the pool lock

use super::handler::Transform;

/// Insertion position for a transform within a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Runs before every normal and tail entry.
    Head,
    /// Default position.
    Normal,
    /// Runs after every head and normal entry, closest to the terminal.
    Tail,
}

/// Ordered transforms registered for one phase.
#[derive(Default)]
pub(crate) struct Stack {
    head: Vec<Transform>,
    normal: Vec<Transform>,
    tail: Vec<Transform>,
}

impl Stack {
    pub(crate) fn push(&mut self, priority: Priority, transform: Transform) {
        match priority {
            Priority::Head => self.head.push(transform),
            Priority::Normal => self.normal.push(transform),
            Priority::Tail => self.tail.push(transform),
        }
    }

    /// Snapshot the stack in execution order: head, normal, tail.
    pub(crate) fn join(&self) -> Vec<Transform> {
        self.head
            .iter()
            .chain(self.normal.iter())
            .chain(self.tail.iter())
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.head.len() + self.normal.len() + self.tail.len()
    }
}
