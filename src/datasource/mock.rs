//! In-memory event source for tests.

use super::{DataSourceError, EventSource};
use crate::domain::{sort_events_canonical, EventPosition, LogEvent};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock source that serves predefined events in canonical order.
#[derive(Debug, Default)]
pub struct MockEventSource {
    events: Vec<LogEvent>,
    fetches: AtomicUsize,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, event: LogEvent) -> Self {
        self.events.push(event);
        sort_events_canonical(&mut self.events);
        self
    }

    pub fn with_events(mut self, events: Vec<LogEvent>) -> Self {
        self.events.extend(events);
        sort_events_canonical(&mut self.events);
        self
    }

    /// Number of `fetch_after` calls served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_after(
        &self,
        after: Option<EventPosition>,
        limit: usize,
    ) -> Result<Vec<LogEvent>, DataSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .events
            .iter()
            .filter(|e| after.map_or(true, |pos| e.position() > pos))
            .take(limit)
            .cloned()
            .collect())
    }
}
