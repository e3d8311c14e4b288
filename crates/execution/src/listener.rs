//! Hooks invoked before output locations are mutated

use crate::fingerprint::OutputLocation;
use std::sync::Arc;

/// Observer notified synchronously before the engine mutates a unit's
/// outputs, by execution or by restoring them from the cache.
pub trait OutputChangeListener: Send + Sync {
    fn before_output_change(&self, work: &str, outputs: &[OutputLocation]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl OutputChangeListener for NoopListener {
    fn before_output_change(&self, _work: &str, _outputs: &[OutputLocation]) {}
}

/// Fans a notification out to several listeners in registration order
#[derive(Default, Clone)]
pub struct CompositeListener {
    listeners: Vec<Arc<dyn OutputChangeListener>>,
}

impl CompositeListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, listener: Arc<dyn OutputChangeListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn push(&mut self, listener: Arc<dyn OutputChangeListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl OutputChangeListener for CompositeListener {
    fn before_output_change(&self, work: &str, outputs: &[OutputLocation]) {
        for listener in &self.listeners {
            listener.before_output_change(work, outputs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl OutputChangeListener for Recording {
        fn before_output_change(&self, work: &str, outputs: &[OutputLocation]) {
            self.seen.lock().push((work.to_string(), outputs.len()));
        }
    }

    #[test]
    fn test_composite_notifies_every_listener() {
        let first = Arc::new(Recording::default());
        let second = Arc::new(Recording::default());
        let composite = CompositeListener::new()
            .with(first.clone())
            .with(Arc::new(NoopListener))
            .with(second.clone());
        assert_eq!(composite.len(), 3);

        let outputs = [OutputLocation::new("obj", "/tmp/out.o")];
        composite.before_output_change("compile", &outputs);

        assert_eq!(*first.seen.lock(), vec![("compile".to_string(), 1)]);
        assert_eq!(*second.seen.lock(), vec![("compile".to_string(), 1)]);
    }
}
