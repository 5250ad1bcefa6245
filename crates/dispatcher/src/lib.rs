//! # Dispatcher
//!
//! 埋点分发模块。
//!
//! 负责：
//! - 接收事件、用户身份与用户属性调用
//! - Fan-out 到所有已注册的 backend（按注册顺序）
//! - 每个 backend 独立队列，隔离慢 backend 与 panic，不阻塞调用方
//! - 串行化、非阻塞的日志输出（`LogSink`）

pub mod backends;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use backends::{
    create_backend, ConsoleBackend, ConsoleConfig, RecordedCall, Recording, RecordingBackend,
};
pub use contracts::{Backend, Event, Parameters, Severity, UserIdentity, UserProperties, Value};
pub use dispatcher::{create_dispatcher, supported_backend_types, Dispatcher, DispatcherBuilder};
pub use error::DispatcherError;
pub use handle::{BackendCall, BackendHandle};
pub use metrics::{BackendMetrics, MetricsSnapshot};
pub use sinks::{
    spawn_sink, LogSink, LogWriter, MemoryWriter, SinkKind, StdoutWriter, SystemLogWriter,
};
