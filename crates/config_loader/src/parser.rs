//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{CaptureBlueprint, ContractError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<CaptureBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<CaptureBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<CaptureBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ChecksumKind, DropPolicy, Side, SinkType};

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[device]
name = "FootSole-C3"
side = "right"

[frame]
channel_width = 1
checksum = "sum16_le"
markers = [[0xA5, 0x5A], [0x5A, 0x01]]

[capture]
duration_secs = 30
max_buffered_frames = 4

[transport]
channel_capacity = 64
drop_policy = "drop_oldest"

[[sinks]]
name = "csv"
sink_type = "file"
queue_capacity = 512
[sinks.params]
base_path = "./output"
format = "csv"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.device.side, Side::Right);
        assert_eq!(bp.frame.frame_size, 216);
        assert_eq!(bp.frame.checksum, ChecksumKind::Sum16Le);
        assert_eq!(bp.frame.markers[1], vec![0x5A, 0x01]);
        assert_eq!(bp.capture.duration_secs, 30);
        assert_eq!(bp.transport.drop_policy, DropPolicy::DropOldest);
        assert_eq!(bp.sinks[0].sink_type, SinkType::File);
        assert_eq!(bp.sinks[0].params["format"], "csv");
    }

    #[test]
    fn test_parse_empty_toml_uses_defaults() {
        let bp = parse_toml("").unwrap();
        assert_eq!(bp.device.side, Side::Right);
        assert_eq!(bp.frame.channel_count, 208);
        assert_eq!(bp.capture.duration_secs, 60);
        assert!(bp.sinks.is_empty());
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "device": { "side": "left" },
            "capture": { "duration_secs": 0 },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.capture.duration_secs, 0);
        assert_eq!(bp.sinks[0].queue_capacity, 256);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
