//! Event sinks
//!
//! A sink receives every [`SyncEvent`] the moment it happens. [`TracingSink`]
//! turns events into log lines, [`ChannelSink`] forwards them to another task
//! and [`NoopSink`] drops them.

use ferromirror_types::{EventSink, SyncEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Logs mutations at info level and failures at warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&self, event: &SyncEvent) {
        if event.is_failure() {
            warn!("{}", event);
        } else {
            info!("{}", event);
        }
    }
}

/// Forwards events over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<SyncEvent>,
}

impl ChannelSink {
    /// Create a sink together with the receiving end
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn on_event(&self, event: &SyncEvent) {
        // A dropped receiver only means nobody is listening any more
        let _ = self.sender.send(event.clone());
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn on_event(&self, _event: &SyncEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn removed(path: &str) -> SyncEvent {
        SyncEvent::FileRemoved {
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (sink, mut receiver) = ChannelSink::new();
        sink.on_event(&removed("/replica/a"));
        sink.on_event(&removed("/replica/b"));

        assert_eq!(receiver.try_recv().unwrap(), removed("/replica/a"));
        assert_eq!(receiver.try_recv().unwrap(), removed("/replica/b"));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (sink, receiver) = ChannelSink::new();
        drop(receiver);
        sink.on_event(&removed("/replica/a"));
    }

    #[test]
    fn test_tracing_and_noop_sinks_accept_events() {
        let failure = SyncEvent::EntryFailed {
            operation: ferromirror_types::Operation::CopyFile,
            path: PathBuf::from("/source/a"),
            message: "denied".to_string(),
        };
        TracingSink.on_event(&failure);
        TracingSink.on_event(&removed("/replica/a"));
        NoopSink.on_event(&failure);
    }
}
