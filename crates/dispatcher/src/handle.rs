//! BackendHandle - owns one backend behind an isolated queue and worker task
//!
//! ```text
//!   Dispatcher::report_event(..)
//!        │                       (Arc-clone per backend)
//!        ├──► [queue B1] ─► worker B1 ─► backend1.report_event()
//!        ├──► [queue B2] ─► worker B2 ─► backend2.report_event()
//!        └──► [queue BN] ─► worker BN ─► backendN.report_event()
//! ```
//!
//! Enqueueing never blocks. Queues are unbounded unless the backend opted into
//! a capacity; only then can a full queue drop a call, for that backend only.
//! A panicking backend loses the call it panicked on and keeps serving.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use contracts::{Backend, Event, UserIdentity, UserProperties, MAX_QUEUE_CAPACITY};
use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::BackendMetrics;

/// One reporting call, as queued for a backend worker.
///
/// Payloads are `Arc`-shared so fanning out to N backends costs N pointer
/// clones, not N deep copies.
#[derive(Debug, Clone)]
pub enum BackendCall {
    ReportEvent(Arc<Event>),
    ReportScreenView(Arc<Event>),
    IdentifyUser(Arc<UserIdentity>),
    SetUserProperties(Arc<UserProperties>),
    DeleteUserProfile,
}

impl BackendCall {
    /// Operation name (for logs/metrics)
    pub fn op(&self) -> &'static str {
        match self {
            BackendCall::ReportEvent(_) => "report_event",
            BackendCall::ReportScreenView(_) => "report_screen_view",
            BackendCall::IdentifyUser(_) => "identify_user",
            BackendCall::SetUserProperties(_) => "set_user_properties",
            BackendCall::DeleteUserProfile => "delete_user_profile",
        }
    }

    async fn deliver(&self, backend: &mut dyn Backend) {
        match self {
            BackendCall::ReportEvent(event) => backend.report_event(event).await,
            BackendCall::ReportScreenView(event) => backend.report_screen_view(event).await,
            BackendCall::IdentifyUser(user) => backend.identify_user(user).await,
            BackendCall::SetUserProperties(props) => backend.set_user_properties(props).await,
            BackendCall::DeleteUserProfile => backend.delete_user_profile().await,
        }
    }
}

enum CallSender {
    Bounded(mpsc::Sender<BackendCall>),
    Unbounded(mpsc::UnboundedSender<BackendCall>),
}

enum CallReceiver {
    Bounded(mpsc::Receiver<BackendCall>),
    Unbounded(mpsc::UnboundedReceiver<BackendCall>),
}

impl CallReceiver {
    async fn recv(&mut self) -> Option<BackendCall> {
        match self {
            CallReceiver::Bounded(rx) => rx.recv().await,
            CallReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    fn len(&self) -> usize {
        match self {
            CallReceiver::Bounded(rx) => rx.len(),
            CallReceiver::Unbounded(rx) => rx.len(),
        }
    }
}

/// Why a call did not reach the queue
enum Rejected {
    Full,
    Closed,
}

/// Handle to a running backend worker
pub struct BackendHandle {
    /// Backend name
    name: String,
    /// Channel to send calls to worker
    tx: CallSender,
    /// Shared metrics
    metrics: Arc<BackendMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl BackendHandle {
    /// Spawn the worker on `runtime` and return its handle.
    ///
    /// `None` gives an unbounded queue. A bounded capacity is kept within
    /// `1..=MAX_QUEUE_CAPACITY`.
    pub fn spawn(
        backend: Box<dyn Backend>,
        queue_capacity: Option<usize>,
        runtime: &Handle,
    ) -> Self {
        let name = backend.name().to_string();
        let (tx, rx) = match queue_capacity {
            Some(capacity) => {
                let (tx, rx) = mpsc::channel(capacity.clamp(1, MAX_QUEUE_CAPACITY));
                (CallSender::Bounded(tx), CallReceiver::Bounded(rx))
            }
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                (CallSender::Unbounded(tx), CallReceiver::Unbounded(rx))
            }
        };
        let metrics = Arc::new(BackendMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = runtime.spawn(async move {
            backend_worker(backend, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get backend name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<BackendMetrics> {
        &self.metrics
    }

    /// Queue capacity, `None` when unbounded
    pub fn queue_capacity(&self) -> Option<usize> {
        match &self.tx {
            CallSender::Bounded(tx) => Some(tx.max_capacity()),
            CallSender::Unbounded(_) => None,
        }
    }

    /// Queue a call for the backend (non-blocking)
    ///
    /// Returns true if queued, false if the call was dropped.
    pub fn try_send(&self, call: BackendCall) -> bool {
        let op = call.op();
        self.metrics.inc_queue_len();
        let sent = match &self.tx {
            CallSender::Bounded(tx) => tx.try_send(call).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => Rejected::Full,
                mpsc::error::TrySendError::Closed(_) => Rejected::Closed,
            }),
            CallSender::Unbounded(tx) => tx.send(call).map_err(|_| Rejected::Closed),
        };

        match sent {
            Ok(()) => {
                observability::record_call_dispatched(&self.name, op);
                true
            }
            Err(rejected) => {
                self.metrics.dec_queue_len();
                self.metrics.inc_dropped_count();
                match rejected {
                    Rejected::Full => {
                        observability::record_call_dropped(&self.name, op, "queue_full");
                        warn!(backend = %self.name, op, "Queue full, call dropped");
                    }
                    Rejected::Closed => {
                        observability::record_call_dropped(&self.name, op, "worker_closed");
                        error!(backend = %self.name, op, "Backend worker closed unexpectedly");
                    }
                }
                false
            }
        }
    }

    /// Shutdown the backend worker gracefully
    ///
    /// Queued calls are still delivered, then the backend is flushed.
    #[instrument(name = "backend_handle_shutdown", skip(self), fields(backend = %self.name))]
    pub async fn shutdown(self) {
        // Drop sender to signal worker to stop
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(backend = %self.name, error = ?e, "Worker task failed");
        }
        debug!(backend = %self.name, "BackendHandle shutdown complete");
    }
}

/// Worker task that drains the queue in FIFO order
#[instrument(name = "backend_worker_loop", skip(backend, rx, metrics), fields(backend = %name))]
async fn backend_worker(
    mut backend: Box<dyn Backend>,
    mut rx: CallReceiver,
    metrics: Arc<BackendMetrics>,
    name: String,
) {
    debug!(backend = %name, "Backend worker started");

    while let Some(call) = rx.recv().await {
        metrics.dec_queue_len();
        observability::record_queue_depth(&name, rx.len());

        let op = call.op();
        let started = Instant::now();
        let outcome = AssertUnwindSafe(call.deliver(backend.as_mut()))
            .catch_unwind()
            .await;
        let elapsed = started.elapsed();
        metrics.record_latency(elapsed);

        match outcome {
            Ok(()) => {
                metrics.inc_delivered_count();
                observability::record_call_handled(&name, op, elapsed.as_secs_f64() * 1000.0, false);
            }
            Err(panic) => {
                metrics.inc_panic_count();
                observability::record_call_handled(&name, op, elapsed.as_secs_f64() * 1000.0, true);
                error!(
                    backend = %name,
                    op,
                    panic = %panic_message(panic.as_ref()),
                    "Backend panicked, call discarded"
                );
                // Keep serving: one bad call must not silence the backend
            }
        }
    }

    if let Err(panic) = AssertUnwindSafe(backend.flush()).catch_unwind().await {
        error!(
            backend = %name,
            panic = %panic_message(panic.as_ref()),
            "Backend panicked while flushing"
        );
    }

    debug!(backend = %name, "Backend worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
