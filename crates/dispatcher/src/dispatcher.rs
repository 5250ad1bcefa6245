//! Dispatcher - fan-out of reporting calls to registered backends

use std::sync::Arc;

use contracts::{
    Backend, BackendType, Event, LoggingBlueprint, Parameters, Severity, UserIdentity,
    UserProperties,
};
use tokio::runtime::Handle;
use tracing::{debug, info, instrument};

use crate::backends::create_backend;
use crate::error::DispatcherError;
use crate::handle::{BackendCall, BackendHandle};
use crate::metrics::MetricsSnapshot;

/// Builder for creating a Dispatcher
#[derive(Default)]
pub struct DispatcherBuilder {
    backends: Vec<(Box<dyn Backend>, Option<usize>)>,
    runtime: Option<Handle>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend; calls reach backends in registration order
    pub fn backend(self, backend: impl Backend) -> Self {
        self.boxed_backend(Box::new(backend))
    }

    pub fn boxed_backend(self, backend: Box<dyn Backend>) -> Self {
        self.register(backend, None)
    }

    /// Register a backend, optionally bounding its queue
    ///
    /// An explicit capacity wins over [`Backend::queue_capacity`]; with
    /// neither the queue is unbounded.
    pub fn register(mut self, backend: Box<dyn Backend>, queue_capacity: Option<usize>) -> Self {
        self.backends.push((backend, queue_capacity));
        self
    }

    pub fn backends(mut self, backends: impl IntoIterator<Item = Box<dyn Backend>>) -> Self {
        self.backends
            .extend(backends.into_iter().map(|backend| (backend, None)));
        self
    }

    /// Runtime the backend workers are spawned on
    ///
    /// Defaults to the ambient runtime at `build` time.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Spawn one worker per backend and return the dispatcher
    #[instrument(
        name = "dispatcher_builder_build",
        skip(self),
        fields(backend_count = self.backends.len())
    )]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        if self.backends.is_empty() {
            return Ok(Dispatcher::empty());
        }

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| DispatcherError::NoRuntime)?,
        };

        let handles = self
            .backends
            .into_iter()
            .map(|(backend, capacity)| {
                let capacity = capacity.or_else(|| backend.queue_capacity());
                debug!(backend = backend.name(), ?capacity, "Spawning backend worker");
                BackendHandle::spawn(backend, capacity, &runtime)
            })
            .collect();

        Ok(Dispatcher { handles })
    }
}

/// The main Dispatcher that fans out reporting calls to backends
///
/// Every public operation returns once the call is queued for each backend;
/// no backend work happens on the caller's thread.
#[derive(Default)]
pub struct Dispatcher {
    handles: Vec<BackendHandle>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Dispatcher with no backends; every operation is a no-op
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a dispatcher with custom backend handles (for testing)
    pub fn with_handles(handles: Vec<BackendHandle>) -> Self {
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Backend names in registration order
    pub fn backend_names(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.name()).collect()
    }

    /// Get metrics for all backends
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Report an event built from its parts
    pub fn report_event_with(
        &self,
        name: impl Into<String>,
        parameters: Option<Parameters>,
        severity: Severity,
    ) {
        self.report_event(Event::from_parts(name, parameters, severity));
    }

    /// Report an event; a bare name gets the default `Analytic` severity
    pub fn report_event(&self, event: impl Into<Event>) {
        self.broadcast(|| BackendCall::ReportEvent(Arc::new(event.into())));
    }

    pub fn report_screen_view(&self, event: impl Into<Event>) {
        self.broadcast(|| BackendCall::ReportScreenView(Arc::new(event.into())));
    }

    pub fn identify_user(
        &self,
        user_id: impl Into<String>,
        name: Option<String>,
        email: Option<String>,
    ) {
        self.broadcast(|| {
            BackendCall::IdentifyUser(Arc::new(UserIdentity {
                user_id: user_id.into(),
                name,
                email,
            }))
        });
    }

    pub fn set_user_properties(&self, properties: impl Into<UserProperties>) {
        self.broadcast(|| BackendCall::SetUserProperties(Arc::new(properties.into())));
    }

    pub fn delete_user_profile(&self) {
        self.broadcast(|| BackendCall::DeleteUserProfile);
    }

    /// Queue the call on every backend, in registration order
    ///
    /// The payload is only built when there is someone to receive it.
    fn broadcast(&self, make_call: impl FnOnce() -> BackendCall) {
        if self.handles.is_empty() {
            return;
        }
        let call = make_call();
        for handle in &self.handles {
            handle.try_send(call.clone());
        }
    }

    /// Deliver everything already queued, flush every backend and stop
    ///
    /// Returns the final metrics of each backend, in registration order.
    #[instrument(name = "dispatcher_shutdown", skip(self), fields(backend_count = self.handles.len()))]
    pub async fn shutdown(self) -> Vec<(String, MetricsSnapshot)> {
        info!(backends = self.handles.len(), "Dispatcher shutting down");
        let mut report = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            let metrics = Arc::clone(handle.metrics());
            handle.shutdown().await;
            report.push((name, metrics.snapshot()));
        }
        info!("Dispatcher shutdown complete");
        report
    }
}

/// Convenience function to create a dispatcher from a blueprint
///
/// Must be called from within a tokio runtime when the blueprint lists any
/// backend.
#[instrument(
    name = "dispatcher_create",
    skip(blueprint),
    fields(backend_count = blueprint.backends.len())
)]
pub fn create_dispatcher(blueprint: &LoggingBlueprint) -> Result<Dispatcher, DispatcherError> {
    if blueprint.backends.is_empty() {
        return Ok(Dispatcher::empty());
    }

    let runtime = Handle::try_current().map_err(|_| DispatcherError::NoRuntime)?;
    let mut builder = Dispatcher::builder().runtime(runtime);

    for config in &blueprint.backends {
        debug!(
            backend = %config.name,
            backend_type = ?config.backend_type,
            "Creating backend"
        );
        let backend = create_backend(config)?;
        builder = builder.register(backend, config.queue_capacity);
    }

    let dispatcher = builder.build()?;
    info!(backends = ?dispatcher.backend_names(), "Dispatcher ready");
    Ok(dispatcher)
}

/// Backend types known to [`create_dispatcher`]
pub fn supported_backend_types() -> &'static [BackendType] {
    &[BackendType::Console]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{ConsoleBackend, ConsoleConfig, RecordedCall, RecordingBackend};
    use crate::sinks::{LogSink, LogWriter, MemoryWriter};
    use contracts::{params, BackendConfig, Value};
    use std::io;
    use std::time::{Duration, Instant};

    /// Writer that blocks its thread for 50ms per line
    struct SluggishWriter(MemoryWriter);

    impl LogWriter for SluggishWriter {
        fn kind(&self) -> &'static str {
            "sluggish"
        }

        fn write_line(&mut self, severity: Severity, message: &str) -> io::Result<()> {
            std::thread::sleep(Duration::from_millis(50));
            self.0.write_line(severity, message)
        }
    }

    fn recorders(n: usize) -> (DispatcherBuilder, Vec<crate::backends::Recording>) {
        let mut builder = Dispatcher::builder();
        let mut recordings = Vec::new();
        for i in 0..n {
            let backend = RecordingBackend::new(format!("rec{i}"));
            recordings.push(backend.recording());
            builder = builder.backend(backend);
        }
        (builder, recordings)
    }

    #[tokio::test]
    async fn test_fanout_to_every_backend() {
        for n in 0..=3 {
            let (builder, recordings) = recorders(n);
            let dispatcher = builder.build().unwrap();
            assert_eq!(dispatcher.len(), n);

            dispatcher.report_event("Test");
            dispatcher.shutdown().await;

            for recording in &recordings {
                assert_eq!(recording.event_names(), vec!["Test"]);
                assert_eq!(recording.flush_count(), 1);
            }
        }
    }

    #[tokio::test]
    async fn test_calls_arrive_in_order() {
        let (builder, recordings) = recorders(2);
        let dispatcher = builder.build().unwrap();

        dispatcher.report_event("A");
        dispatcher.report_screen_view("Home");
        dispatcher.identify_user("u1", Some("Ann".into()), None);
        dispatcher.set_user_properties(params! { "plan" => "pro" });
        dispatcher.delete_user_profile();
        dispatcher.report_event("B");
        dispatcher.shutdown().await;

        for recording in &recordings {
            let calls = recording.calls();
            assert_eq!(calls.len(), 6);
            assert!(matches!(&calls[0], RecordedCall::Event(e) if e.name() == "A"));
            assert!(matches!(&calls[1], RecordedCall::ScreenView(e) if e.name() == "Home"));
            assert_eq!(
                calls[2],
                RecordedCall::Identify(UserIdentity::new("u1").with_name("Ann"))
            );
            assert_eq!(
                calls[3],
                RecordedCall::UserProperties(UserProperties::new(params! { "plan" => "pro" }))
            );
            assert_eq!(calls[4], RecordedCall::DeleteProfile);
            assert!(matches!(&calls[5], RecordedCall::Event(e) if e.name() == "B"));
        }
    }

    #[tokio::test]
    async fn test_default_severity_is_analytic() {
        let (builder, recordings) = recorders(1);
        let dispatcher = builder.build().unwrap();

        dispatcher.report_event("Plain");
        dispatcher.report_event_with("Err", None, Severity::Severe);
        dispatcher.shutdown().await;

        let calls = recordings[0].calls();
        let severities: Vec<_> = calls
            .iter()
            .map(|c| match c {
                RecordedCall::Event(e) => e.severity(),
                other => panic!("unexpected call {other:?}"),
            })
            .collect();
        assert_eq!(severities, vec![Severity::Analytic, Severity::Severe]);
    }

    #[tokio::test]
    async fn test_parameters_passed_through() {
        let (builder, recordings) = recorders(1);
        let dispatcher = builder.build().unwrap();

        dispatcher.report_event_with(
            "Purchase",
            Some(params! { "price" => 9.99, "sku" => "A1" }),
            Severity::Analytic,
        );
        dispatcher.shutdown().await;

        match &recordings[0].calls()[0] {
            RecordedCall::Event(e) => {
                let p = e.parameters().unwrap();
                assert_eq!(p["price"], Value::Float(9.99));
                assert_eq!(p["sku"], Value::from("A1"));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_backend_does_not_block_caller() {
        let slow = RecordingBackend::new("slow").with_delay(Duration::from_millis(50));
        let fast = RecordingBackend::new("fast");
        let slow_rec = slow.recording();
        let fast_rec = fast.recording();

        let dispatcher = Dispatcher::builder()
            .backend(slow)
            .backend(fast)
            .build()
            .unwrap();

        let started = Instant::now();
        for i in 0..10 {
            dispatcher.report_event(format!("e{i}"));
        }
        // 10 calls take ~500ms on the slow backend
        assert!(started.elapsed() < Duration::from_millis(100));

        dispatcher.shutdown().await;
        assert_eq!(slow_rec.len(), 10);
        assert_eq!(fast_rec.len(), 10);
    }

    #[tokio::test]
    async fn test_queue_full_drops_only_for_that_backend() {
        let slow = RecordingBackend::new("slow")
            .with_delay(Duration::from_millis(20))
            .with_queue_capacity(1);
        let roomy = RecordingBackend::new("roomy");
        let roomy_rec = roomy.recording();

        let dispatcher = Dispatcher::builder()
            .backend(slow)
            .backend(roomy)
            .build()
            .unwrap();

        for i in 0..20 {
            dispatcher.report_event(format!("e{i}"));
        }

        let metrics = dispatcher.metrics();
        assert_eq!(metrics[0].0, "slow");
        assert!(metrics[0].1.dropped_count > 0);
        assert_eq!(metrics[1].1.dropped_count, 0);

        dispatcher.shutdown().await;
        assert_eq!(roomy_rec.len(), 20);
    }

    #[tokio::test]
    async fn test_burst_larger_than_queue_is_delivered() {
        let (builder, recordings) = recorders(2);
        let dispatcher = builder.build().unwrap();

        // Far past any fixed capacity, with no yield in between
        for i in 0..5000 {
            dispatcher.report_event(format!("e{i}"));
        }
        let report = dispatcher.shutdown().await;

        for (_, snapshot) in &report {
            assert_eq!(snapshot.delivered_count, 5000);
            assert_eq!(snapshot.dropped_count, 0);
        }
        for recording in &recordings {
            let names = recording.event_names();
            assert_eq!(names.len(), 5000);
            assert_eq!(names[0], "e0");
            assert_eq!(names[4999], "e4999");
        }
    }

    #[tokio::test]
    async fn test_blocking_writer_does_not_stall_runtime() {
        let slow_memory = MemoryWriter::new();
        let fast_memory = MemoryWriter::new();
        let slow = ConsoleBackend::with_sink(
            "slow",
            ConsoleConfig::default(),
            LogSink::spawn(SluggishWriter(slow_memory.clone())),
        );
        let fast = ConsoleBackend::with_sink(
            "fast",
            ConsoleConfig::default(),
            LogSink::spawn(fast_memory.clone()),
        );

        let dispatcher = Dispatcher::builder()
            .backend(slow)
            .backend(fast)
            .build()
            .unwrap();
        for i in 0..10 {
            dispatcher.report_event(format!("e{i}"));
        }

        // current_thread runtime: the slow sink's ~500ms backlog must not
        // hold up this timer or the fast backend
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(started.elapsed() < Duration::from_millis(200));

        dispatcher.shutdown().await;
        assert_eq!(slow_memory.messages().len(), 10);
        assert_eq!(fast_memory.messages().len(), 10);
    }

    #[test]
    fn test_empty_dispatcher_is_noop() {
        let dispatcher = Dispatcher::empty();
        assert!(dispatcher.is_empty());
        dispatcher.report_event("Nothing");
        dispatcher.identify_user("u", None, None);
        dispatcher.delete_user_profile();
        assert!(dispatcher.metrics().is_empty());
    }

    #[test]
    fn test_build_without_runtime() {
        let result = Dispatcher::builder()
            .backend(RecordingBackend::new("r"))
            .build();
        assert!(matches!(result, Err(DispatcherError::NoRuntime)));

        // Nothing to spawn, so no runtime is needed
        assert!(Dispatcher::builder().build().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_blueprint() {
        let mut blueprint = LoggingBlueprint::default();
        blueprint.backends.push(BackendConfig {
            name: "console".into(),
            backend_type: BackendType::Console,
            queue_capacity: Some(8),
            params: params! { "print_parameters" => false, "sink" => "system_log" },
        });

        let dispatcher = create_dispatcher(&blueprint).unwrap();
        assert_eq!(dispatcher.backend_names(), vec!["console"]);

        dispatcher.report_event("Launched");
        let report = dispatcher.shutdown().await;
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].1.delivered_count, 1);
        assert_eq!(report[0].1.queue_len, 0);
    }

    #[tokio::test]
    async fn test_create_dispatcher_rejects_bad_params() {
        let mut blueprint = LoggingBlueprint::default();
        blueprint.backends.push(BackendConfig {
            name: "console".into(),
            backend_type: BackendType::Console,
            queue_capacity: None,
            params: params! { "sink" => "carrier_pigeon" },
        });

        let err = create_dispatcher(&blueprint).err().unwrap();
        assert!(matches!(err, DispatcherError::BackendCreation { .. }));
    }

    #[test]
    fn test_supported_backend_types() {
        assert_eq!(supported_backend_types(), &[BackendType::Console]);
    }
}
