//! # Dispatcher
//!
//! 数据分发模块。
//!
//! 负责：
//! - 消费 `SensorRecord`
//! - Fan-out 到多个 sinks
//! - 每个 sink 独立队列与工作任务；队列满时等待 (背压)，不丢弃记录

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, SensorRecord};
pub use dispatcher::{
    create_dispatcher, create_sink_handle, Dispatcher, DispatcherBuilder, DispatcherConfig,
};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileFormat, FileSink, FileSinkConfig, LogSink};
