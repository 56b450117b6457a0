//! # Sync Engine
//!
//! 字节流帧同步引擎。
//!
//! 负责：
//! - 有界接收缓冲 (强制重同步)
//! - 逐字节滑动的帧边界搜索
//! - 校验通过的帧解码为 `SensorRecord`，按发射时刻打时间戳
//! - 丢失统计 (接受 / 拒绝 / 丢弃字节)
//!
//! ## 使用示例
//!
//! ```ignore
//! use contracts::{FrameLayout, Side};
//! use sync_engine::{AssemblerConfig, FrameAssembler};
//!
//! let mut assembler =
//!     FrameAssembler::new(AssemblerConfig::new(FrameLayout::default(), Side::Left))?;
//!
//! // Feed chunks as they arrive
//! assembler.feed(&chunk);
//! for record in assembler.poll() {
//!     // Handle decoded record
//! }
//! ```

mod assembler;
mod buffer;
mod clock;
mod error;
mod synchronizer;

pub use assembler::{
    AssemblerConfig, AssemblerStats, FrameAssembler, Records, DEFAULT_MAX_BUFFERED_FRAMES,
};
pub use buffer::ReceiveBuffer;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AssemblerError;
pub use synchronizer::{SyncOutcome, SyncState, Synchronizer};

// Re-export contracts types
pub use contracts::{FrameLayout, SensorRecord, Side};
