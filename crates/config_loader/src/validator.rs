//! 配置校验模块
//!
//! 校验规则：
//! - 帧格式自洽 (frame_size = header + 通道 + 校验)
//! - 接收缓冲至少容纳两帧
//! - 通知通道容量 > 0
//! - sink 名称非空且唯一, 队列容量 > 0

use std::collections::HashSet;

use contracts::{CaptureBlueprint, ContractError};

/// 校验 CaptureBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    blueprint.frame.check()?;
    validate_capture(blueprint)?;
    validate_transport(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 校验会话参数
fn validate_capture(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let frames = blueprint.capture.max_buffered_frames;
    if frames < 2 {
        return Err(ContractError::config_validation(
            "capture.max_buffered_frames",
            format!("max_buffered_frames must be >= 2, got {frames}"),
        ));
    }
    Ok(())
}

/// 校验传输通道
fn validate_transport(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    if blueprint.transport.channel_capacity == 0 {
        return Err(ContractError::config_validation(
            "transport.channel_capacity",
            "channel_capacity must be > 0",
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &CaptureBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}
