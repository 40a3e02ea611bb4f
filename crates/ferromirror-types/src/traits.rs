//! Core traits for ferromirror operations

use crate::SyncEvent;

/// Collaborator that consumes the events of a synchronization pass
///
/// The synchronizer never writes log output itself; it hands each event to a
/// sink as it happens and also records it in the returned report.
pub trait EventSink: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &SyncEvent);
}
