//! Progress and log notification sink
//!
//! The engine reports human-readable progress through an injected sink
//! rather than owning any output channel. Callers that do not care pass
//! [`TracingSink`], which echoes through the `tracing` macros.

/// Receiver for crawl progress notifications
///
/// Both methods have no-op semantics by default, so implementors override
/// only what they consume.
pub trait ProgressSink: Send + Sync {
    /// Called with each human-readable status message
    fn on_log(&self, _message: &str) {}

    /// Called whenever the collected-record count changes
    fn on_progress(&self, _collected: usize) {}
}

/// Default sink that forwards messages to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_log(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn on_progress(&self, collected: usize) {
        tracing::debug!("collected {} records", collected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
        counts: Mutex<Vec<usize>>,
    }

    impl ProgressSink for RecordingSink {
        fn on_log(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }

        fn on_progress(&self, collected: usize) {
            self.counts.lock().unwrap().push(collected);
        }
    }

    #[test]
    fn test_sink_receives_notifications() {
        let sink = RecordingSink::default();
        sink.on_log("starting");
        sink.on_progress(3);
        sink.on_progress(7);

        assert_eq!(sink.messages.lock().unwrap().as_slice(), ["starting"]);
        assert_eq!(sink.counts.lock().unwrap().as_slice(), [3, 7]);
    }

    #[test]
    fn test_default_methods_are_noops() {
        struct Silent;
        impl ProgressSink for Silent {}

        let sink = Silent;
        sink.on_log("ignored");
        sink.on_progress(1);
    }
}
