//! CaptureBlueprint - Config Loader output
//!
//! 描述完整的采集配置：设备、帧格式、会话参数、传输通道、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{FrameLayout, Side};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的采集配置蓝图
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 设备设置
    #[serde(default)]
    pub device: DeviceConfig,

    /// 帧格式 (固件约定)
    #[serde(default)]
    pub frame: FrameLayout,

    /// 会话参数
    #[serde(default)]
    pub capture: CaptureConfig,

    /// 传输通道参数
    #[serde(default)]
    pub transport: TransportConfig,

    /// 输出路由配置
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// 设备配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// 广播名称 (e.g., "FootSole-C3")
    #[serde(default = "default_device_name")]
    pub name: String,

    /// 左/右脚
    #[serde(default)]
    pub side: Side,
}

fn default_device_name() -> String {
    "FootSole-C3".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            side: Side::default(),
        }
    }
}

/// 会话参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 录制时长 (秒)，0 表示直到断开或停止
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// 接收缓冲上限 (以帧为单位)
    #[serde(default = "default_max_buffered_frames")]
    pub max_buffered_frames: usize,
}

fn default_duration_secs() -> u64 {
    60
}

fn default_max_buffered_frames() -> usize {
    8
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            max_buffered_frames: default_max_buffered_frames(),
        }
    }
}

/// 传输通道参数 (通知回调 -> 接收任务)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// 通道容量 (以通知为单位)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// 通道满时的丢弃策略
    #[serde(default)]
    pub drop_policy: DropPolicy,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            drop_policy: DropPolicy::default(),
        }
    }
}

/// 丢包策略 (背压满时)
///
/// 只作用于原始字节通知；解码后的记录从不丢弃。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// 丢弃最旧的通知
    DropOldest,
    /// 丢弃最新的通知
    #[default]
    DropNewest,
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    256
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 通过 tracing 输出摘要
    Log,
    /// 写入 CSV / JSON Lines 文件
    File,
}
