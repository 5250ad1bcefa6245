//! LogSink - actor-style serialized writer
//!
//! Exactly one writer thread per sink owns the [`LogWriter`]. `log` only
//! enqueues, so it is safe to call from latency-sensitive threads; the thread
//! drains the queue strictly in enqueue order. The queue is unbounded: a line
//! that was accepted is never dropped for lack of space.
//!
//! Writers do blocking I/O, so they never run on an async executor. A slow
//! terminal or log daemon stalls its own thread and nothing else.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use contracts::Severity;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, instrument, warn};

use super::LogWriter;

enum SinkCommand {
    Line { severity: Severity, message: String },
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct SinkStats {
    written: AtomicU64,
    failures: AtomicU64,
}

/// Serialized, non-blocking log sink
pub struct LogSink {
    kind: &'static str,
    tx: mpsc::UnboundedSender<SinkCommand>,
    stats: Arc<SinkStats>,
    /// Fires when the writer thread has drained the queue and exited
    stopped: oneshot::Receiver<()>,
}

impl LogSink {
    /// Start a sink with its own writer thread.
    ///
    /// Needs no tokio runtime; `flush` and `shutdown` can be awaited from any
    /// executor.
    pub fn spawn<W: LogWriter>(writer: W) -> Self {
        let kind = writer.kind();
        let (tx, rx) = mpsc::unbounded_channel();
        let (stopped_tx, stopped) = oneshot::channel();
        let stats = Arc::new(SinkStats::default());

        let worker_stats = Arc::clone(&stats);
        let spawned = thread::Builder::new()
            .name(format!("fanlog-sink-{kind}"))
            .spawn(move || {
                sink_worker(writer, rx, worker_stats);
                let _ = stopped_tx.send(());
            });
        if let Err(e) = spawned {
            // rx was moved into the closure and dropped, so every `log` will
            // count as a failure instead of queueing forever
            error!(writer = kind, error = %e, "Failed to start sink thread");
        }

        Self {
            kind,
            tx,
            stats,
            stopped,
        }
    }

    /// Writer strategy name
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Enqueue a message (non-blocking, never fails)
    pub fn log(&self, severity: Severity, message: impl Into<String>) {
        let command = SinkCommand::Line {
            severity,
            message: message.into(),
        };
        if self.tx.send(command).is_err() {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            debug!(writer = self.kind, "Sink worker gone, line discarded");
        }
    }

    /// Wait until every line enqueued before this call has been written
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SinkCommand::Flush(ack_tx)).is_ok() {
            // Err only if the worker died; nothing left to wait for then
            let _ = ack_rx.await;
        }
    }

    /// Lines successfully written so far
    pub fn lines_written(&self) -> u64 {
        self.stats.written.load(Ordering::Relaxed)
    }

    /// Lines lost to writer errors so far
    pub fn write_failures(&self) -> u64 {
        self.stats.failures.load(Ordering::Relaxed)
    }

    /// Drain the queue and stop the writer thread
    #[instrument(name = "log_sink_shutdown", skip(self), fields(writer = self.kind))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if self.stopped.await.is_err() {
            error!(writer = self.kind, "Sink thread exited abnormally");
        }
    }
}

/// Writer thread body: blocks on the queue until every sender is gone
fn sink_worker<W: LogWriter>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<SinkCommand>,
    stats: Arc<SinkStats>,
) {
    let kind = writer.kind();
    debug!(writer = kind, "Sink worker started");

    while let Some(command) = rx.blocking_recv() {
        match command {
            SinkCommand::Line { severity, message } => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    writer.write_line(severity, &message)
                }));
                match result {
                    Ok(Ok(())) => {
                        stats.written.fetch_add(1, Ordering::Relaxed);
                        observability::record_sink_write(kind, true);
                    }
                    Ok(Err(e)) => {
                        stats.failures.fetch_add(1, Ordering::Relaxed);
                        observability::record_sink_write(kind, false);
                        warn!(target: "fanlog::sink", writer = kind, error = %e, "Log write failed, line discarded");
                    }
                    Err(_) => {
                        stats.failures.fetch_add(1, Ordering::Relaxed);
                        observability::record_sink_write(kind, false);
                        error!(target: "fanlog::sink", writer = kind, "Log writer panicked, line discarded");
                    }
                }
            }
            SinkCommand::Flush(ack) => {
                if let Err(e) = writer.flush() {
                    warn!(target: "fanlog::sink", writer = kind, error = %e, "Log flush failed");
                }
                let _ = ack.send(());
            }
        }
    }

    if let Err(e) = writer.flush() {
        warn!(target: "fanlog::sink", writer = kind, error = %e, "Log flush failed on shutdown");
    }
    debug!(writer = kind, "Sink worker stopped");
}
