//! RecordingBackend - keeps every call in memory
//!
//! Used by tests and the `replay` dry-run to observe exactly what a backend
//! received and in which order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use contracts::{Backend, Event, UserIdentity, UserProperties};

/// One call as seen by a [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Event(Event),
    ScreenView(Event),
    Identify(UserIdentity),
    UserProperties(UserProperties),
    DeleteProfile,
}

/// Shared view of a recording backend's calls
#[derive(Debug, Clone, Default)]
pub struct Recording {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    flushes: Arc<AtomicU64>,
}

impl Recording {
    fn lock(&self) -> MutexGuard<'_, Vec<RecordedCall>> {
        // A poisoned lock still holds valid data
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, call: RecordedCall) {
        self.lock().push(call);
    }

    /// Snapshot of all calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Names of the events received (screen views included)
    pub fn event_names(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Event(e) | RecordedCall::ScreenView(e) => Some(e.name().to_string()),
                _ => None,
            })
            .collect()
    }

    /// Number of times the backend was flushed
    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }
}

/// Backend that records calls instead of emitting them
pub struct RecordingBackend {
    name: String,
    recording: Recording,
    delay: Option<Duration>,
    queue_capacity: Option<usize>,
}

impl RecordingBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recording: Recording::default(),
            delay: None,
            queue_capacity: None,
        }
    }

    /// Sleep this long before recording each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Ask the dispatcher for a specific queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Handle to the calls recorded by this backend
    pub fn recording(&self) -> Recording {
        self.recording.clone()
    }

    async fn record(&mut self, call: RecordedCall) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.recording.push(call);
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn report_event(&mut self, event: &Event) {
        self.record(RecordedCall::Event(event.clone())).await;
    }

    async fn report_screen_view(&mut self, event: &Event) {
        self.record(RecordedCall::ScreenView(event.clone())).await;
    }

    async fn identify_user(&mut self, user: &UserIdentity) {
        self.record(RecordedCall::Identify(user.clone())).await;
    }

    async fn set_user_properties(&mut self, properties: &UserProperties) {
        self.record(RecordedCall::UserProperties(properties.clone()))
            .await;
    }

    async fn delete_user_profile(&mut self) {
        self.record(RecordedCall::DeleteProfile).await;
    }

    async fn flush(&mut self) {
        self.recording.flushes.fetch_add(1, Ordering::Relaxed);
    }

    fn queue_capacity(&self) -> Option<usize> {
        self.queue_capacity
    }
}
