//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a project is analyzed and interpreted
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Analysis started
    Started { repo: String },

    /// Pipeline phase started
    PhaseStarted { phase: String },

    /// Pipeline phase completed
    PhaseComplete { phase: String, duration: Duration },

    /// A scanner produced an element
    ElementDetected { technology: String },

    /// An interpreter's patch was folded into the interpretation
    InterpreterApplied { interpreter: String, material: bool },

    /// Analysis completed successfully
    Completed { elements: usize, total_time: Duration },

    /// Analysis failed
    Failed { error: String },
}

/// Trait for handling progress events during analysis
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::Started {
            repo: "acme/widget".to_string(),
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            repo: "acme/widget".to_string(),
        });
        handler.on_progress(&ProgressEvent::ElementDetected {
            technology: "node".to_string(),
        });
        handler.on_progress(&ProgressEvent::Completed {
            elements: 1,
            total_time: Duration::from_millis(20),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::InterpreterApplied {
            interpreter: "node".to_string(),
            material: true,
        };
        let debug_str = format!("{:?}", event);
        assert!(debug_str.contains("InterpreterApplied"));
        assert!(debug_str.contains("material: true"));
    }
}
