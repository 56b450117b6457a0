//! # Capture
//!
//! 采集会话：把一个传输通道、帧同步引擎和输出分发器串成一次录制。
//!
//! - `CaptureSession::new` 在接触传输通道之前校验配置
//! - `CaptureSession::start` 启动后台任务，返回 `SessionHandle`
//! - 会话在时长到达、传输断开或收到停止信号时结束，
//!   结束前排空所有 sink 队列
//!
//! ```ignore
//! let session = CaptureSession::new(SessionConfig::from_blueprint(&blueprint))?;
//! let handle = session.start(transport, dispatcher);
//! // ...
//! handle.stop();
//! let report = handle.wait().await?;
//! println!("{}", report.stats.frames_accepted);
//! ```

mod error;
mod session;
mod stats;

pub use error::{CaptureError, Result};
pub use session::{
    CaptureSession, SessionConfig, SessionControl, SessionHandle, SessionReport, StopReason,
};
