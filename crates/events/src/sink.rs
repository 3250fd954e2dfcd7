//! Event sinks that receive graph mutations.
//!
//! A dependency graph holds at most one sink. Sinks never fail the mutation
//! that produced the event: a sink that cannot deliver simply drops it.

use crate::event::{AuditRecord, GraphEvent};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Receiver of graph mutation events.
pub trait EventSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: GraphEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn record(&self, event: GraphEvent) {
        (**self).record(event);
    }
}

/// Sink that logs every event through `tracing` under the `taskweave::graph` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: GraphEvent) {
        match event {
            GraphEvent::TaskAdded { id, cost, parent } => {
                crate::emit_task_added!(id, cost, parent);
            }
            GraphEvent::TaskRemoved { id } => crate::emit_task_removed!(id),
            GraphEvent::DependencyAdded { from, to, weight } => {
                crate::emit_dependency_added!(from, to, weight);
            }
            GraphEvent::DependencyRemoved { from, to } => {
                crate::emit_dependency_removed!(from, to);
            }
            GraphEvent::TaskDecomposed { parent, subtasks } => {
                crate::emit_task_decomposed!(parent, subtasks);
            }
        }
    }
}

/// In-memory audit log.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records are pushed whole, so a poisoned log is still consistent.
    fn log(&self) -> MutexGuard<'_, Vec<AuditRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of every record, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.log().clone()
    }

    /// Snapshot of the events without their metadata, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<GraphEvent> {
        self.log().iter().map(|r| r.event.clone()).collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every recorded event.
    pub fn clear(&self) {
        self.log().clear();
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: GraphEvent) {
        self.log().push(AuditRecord::new(event));
    }
}

/// Sink that forwards records into an unbounded tokio channel.
///
/// Sending never blocks, so it is safe to use from synchronous graph code.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<AuditRecord>,
}

impl ChannelSink {
    /// Create a sink and the receiver that observes it.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AuditRecord>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Wrap an existing sender.
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<AuditRecord>) -> Self {
        Self { sender }
    }

    /// Check if the receiving side has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl EventSink for ChannelSink {
    fn record(&self, event: GraphEvent) {
        // The audit trail is optional: a dropped receiver loses the event.
        if self.sender.send(AuditRecord::new(event)).is_err() {
            tracing::trace!("audit channel closed, event dropped");
        }
    }
}
