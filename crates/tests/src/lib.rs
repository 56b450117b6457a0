//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需硬件）
//! - 损坏 / 噪声 / 背压场景下的丢失统计

#[cfg(test)]
mod contract_tests {
    use contracts::{FrameLayout, DEFAULT_CHANNEL_COUNT, DEFAULT_FRAME_SIZE};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_firmware_layout_snapshot() {
        let layout = FrameLayout::default();
        assert!(layout.check().is_ok());
        assert_eq!(layout.frame_size, DEFAULT_FRAME_SIZE);
        assert_eq!(layout.channel_count, DEFAULT_CHANNEL_COUNT);
        assert_eq!(layout.payload_offset(), 6);
        assert_eq!(layout.checksum_offset(), 214);
        assert_eq!(layout.markers, vec![vec![0xA5, 0x5A], vec![0x5A, 0x01]]);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Duration;

    use capture::{CaptureSession, SessionConfig, StopReason};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{FrameLayout, SensorRecord, Side, SinkConfig, SinkType};
    use dispatcher::create_dispatcher;
    use frame_codec::FrameEncoder;
    use ingestion::{
        notification_channel, BackpressureConfig, DropPolicy, MockTransport, RawChunk,
        ReplayTransport, SimulatedInsole, SimulatedInsoleConfig,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn encoded_frames(n: u64) -> Vec<Vec<u8>> {
        let layout = FrameLayout::default();
        let encoder = FrameEncoder::new(layout.clone());
        (0..n)
            .map(|i| {
                encoder
                    .encode(&SimulatedInsole::samples(&layout, i))
                    .unwrap()
                    .to_vec()
            })
            .collect()
    }

    fn file_sink(dir: &Path, stem: &str, format: &str) -> SinkConfig {
        SinkConfig {
            name: format!("{stem}_{format}"),
            sink_type: SinkType::File,
            queue_capacity: 32,
            params: HashMap::from([
                ("base_path".to_string(), dir.to_string_lossy().to_string()),
                ("format".to_string(), format.to_string()),
                ("file_name".to_string(), stem.to_string()),
            ]),
        }
    }

    fn read_jsonl(path: &Path) -> Vec<SensorRecord> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// End-to-end test: SimulatedInsole -> notification channel -> session -> sinks
    ///
    /// 验证完整的数据流：
    /// 1. SimulatedInsole 按 MTU 切分帧并推入通知通道
    /// 2. CaptureSession 重新组帧、校验、解码
    /// 3. Dispatcher 将 SensorRecord 写入 CSV 与日志 sink
    #[tokio::test]
    async fn test_e2e_simulated_recording() {
        let dir = tempfile::tempdir().unwrap();

        let (sender, transport) =
            notification_channel("FootSole-C3", BackpressureConfig::default());
        let insole = SimulatedInsole::new(SimulatedInsoleConfig {
            frequency_hz: 500.0,
            mtu: 20,
            max_frames: Some(25),
            ..Default::default()
        });
        let generator = insole.start(sender);

        let session = CaptureSession::new(
            SessionConfig::default().with_duration(None),
            Side::Left,
        )
        .unwrap();
        let dispatcher = create_dispatcher(
            vec![
                file_sink(dir.path(), "left", "csv"),
                SinkConfig {
                    name: "log".to_string(),
                    sink_type: SinkType::Log,
                    queue_capacity: 8,
                    params: HashMap::from([("every".to_string(), "10".to_string())]),
                },
            ],
            Side::Left,
        )
        .unwrap();

        let report = tokio::time::timeout(
            Duration::from_secs(10),
            session.start(transport, dispatcher).wait(),
        )
        .await
        .expect("session timed out")
        .unwrap();

        assert_eq!(generator.await.unwrap().unwrap(), 25);
        assert_eq!(report.reason, StopReason::Disconnected);
        assert_eq!(report.stats.frames_accepted, 25);
        assert_eq!(report.stats.frames_rejected, 0);
        assert_eq!(report.stats.bytes_discarded, 0);
        assert_eq!(report.stats.bytes_received, 25 * 216);
        assert!(report.sinks.iter().all(|(_, m)| m.write_count == 25));

        let csv = std::fs::read_to_string(dir.path().join("left.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 26);
        assert!(lines[0].starts_with("sequence,timestamp_ns,ch1,ch2"));
        assert!(lines[0].ends_with(",ch208"));
        assert!(lines[25].starts_with("24,"));
    }

    /// 5 帧, 第 3 帧损坏: 4 帧接受, 1 帧拒绝, 丢弃 216 字节
    #[tokio::test]
    async fn test_e2e_replay_with_corrupted_frame() {
        let dir = tempfile::tempdir().unwrap();
        let frames = encoded_frames(5);
        let mut stream: Vec<u8> = frames.concat();
        stream[2 * 216 + 50] ^= 0xFF;

        let capture_path = dir.path().join("capture.bin");
        std::fs::write(&capture_path, &stream).unwrap();

        let transport = ReplayTransport::open(&capture_path)
            .await
            .unwrap()
            .with_chunk_size(37);
        let session = CaptureSession::new(
            SessionConfig::default().with_duration(None),
            Side::Right,
        )
        .unwrap();
        let dispatcher =
            create_dispatcher(vec![file_sink(dir.path(), "right", "jsonl")], Side::Right).unwrap();

        let report = session.start(transport, dispatcher).wait().await.unwrap();

        assert_eq!(report.reason, StopReason::Disconnected);
        assert_eq!(report.stats.frames_accepted, 4);
        assert_eq!(report.stats.frames_rejected, 1);
        assert_eq!(report.stats.bytes_discarded, 216);
        assert_eq!(report.stats.forced_resyncs, 0);

        let records = read_jsonl(&dir.path().join("right.jsonl"));
        let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);

        // Frames 0, 1, 3, 4 survive, in order
        let layout = FrameLayout::default();
        for (record, n) in records.iter().zip([0u64, 1, 3, 4]) {
            let expected: Vec<u16> = SimulatedInsole::samples(&layout, n);
            assert_eq!(record.channels, expected);
            assert_eq!(record.side, Side::Right);
        }
        assert!(records.windows(2).all(|w| w[0].timestamp_ns <= w[1].timestamp_ns));
    }

    /// 帧间插入随机噪声、随机切块: 所有帧恢复, 噪声全部计入丢弃
    #[tokio::test]
    async fn test_e2e_noisy_stream_recovers_every_frame() {
        let mut rng = StdRng::seed_from_u64(0xF007);
        let frames = encoded_frames(40);

        let mut stream = Vec::new();
        let mut noise_total = 0u64;
        for frame in &frames {
            let gap = rng.random_range(0..48);
            noise_total += gap as u64;
            stream.extend((0..gap).map(|_| rng.random_range(0x60u8..0x90)));
            stream.extend_from_slice(frame);
        }

        let mut chunks = Vec::new();
        let mut rest = stream.as_slice();
        while !rest.is_empty() {
            let n = rng.random_range(1..=300).min(rest.len());
            chunks.push(RawChunk::from(rest[..n].to_vec()));
            rest = &rest[n..];
        }

        let session = CaptureSession::new(
            SessionConfig::default().with_duration(None),
            Side::Left,
        )
        .unwrap();
        let dispatcher = create_dispatcher(Vec::new(), Side::Left).unwrap();
        let report = session
            .start(MockTransport::new(chunks), dispatcher)
            .wait()
            .await
            .unwrap();

        assert_eq!(report.stats.frames_accepted, 40);
        assert_eq!(report.stats.frames_rejected, 0);
        assert_eq!(report.stats.bytes_discarded, noise_total);
        assert_eq!(report.metrics.total_records, 40);
        assert_eq!(report.metrics.sequence_gaps, 0);
    }

    /// 一次送达远超缓冲上限的数据块: 会话分片喂入, 不丢帧
    #[tokio::test]
    async fn test_e2e_oversized_burst_is_lossless() {
        let stream = encoded_frames(64).concat();

        let mut config = SessionConfig::default().with_duration(None);
        config.max_buffered_frames = 2;
        let session = CaptureSession::new(config, Side::Left).unwrap();
        let dispatcher = create_dispatcher(Vec::new(), Side::Left).unwrap();

        let report = session
            .start(MockTransport::new([RawChunk::from(stream)]), dispatcher)
            .wait()
            .await
            .unwrap();

        assert_eq!(report.stats.chunks_received, 1);
        assert_eq!(report.stats.frames_accepted, 64);
        assert_eq!(report.stats.forced_resyncs, 0);
    }

    /// 通知通道溢出 (drop_oldest): 丢失只影响原始字节, 会话重同步
    #[tokio::test]
    async fn test_e2e_notification_overflow_resyncs() {
        let frames = encoded_frames(30);
        let (sender, transport) =
            notification_channel("ble", BackpressureConfig::new(8, DropPolicy::DropOldest));

        // Queue everything before the session starts reading
        for frame in &frames {
            for piece in frame.chunks(108) {
                sender.notify(piece.to_vec());
            }
        }
        let dropped = sender.metrics().snapshot().chunks_dropped;
        sender.disconnect();
        assert!(dropped > 0);

        let session = CaptureSession::new(
            SessionConfig::default().with_duration(None),
            Side::Left,
        )
        .unwrap();
        let dispatcher = create_dispatcher(Vec::new(), Side::Left).unwrap();
        let report = session.start(transport, dispatcher).wait().await.unwrap();

        // 8 surviving notifications = the last 4 frames, whole
        assert_eq!(report.stats.chunks_received, 8);
        assert_eq!(report.stats.frames_accepted, 4);
        assert_eq!(report.stats.bytes_discarded, 0);
    }

    /// TOML 配置 -> 会话 -> sink
    #[tokio::test]
    async fn test_e2e_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let content = format!(
            r#"
[device]
name = "FootSole-C3"
side = "left"

[capture]
duration_secs = 0
max_buffered_frames = 4

[[sinks]]
name = "records"
sink_type = "file"
[sinks.params]
base_path = "{}"
format = "jsonl"
file_name = "from_config"
"#,
            dir.path().display().to_string().replace('\\', "/")
        );
        let blueprint = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap();

        let session = CaptureSession::new(
            SessionConfig::from_blueprint(&blueprint),
            blueprint.device.side,
        )
        .unwrap();
        let dispatcher =
            create_dispatcher(blueprint.sinks.clone(), blueprint.device.side).unwrap();
        let transport = MockTransport::from_stream(&encoded_frames(6).concat(), 244);

        let report = session.start(transport, dispatcher).wait().await.unwrap();
        assert_eq!(report.stats.frames_accepted, 6);

        let records = read_jsonl(&dir.path().join("from_config.jsonl"));
        assert_eq!(records.len(), 6);
        assert!(records.iter().all(|r| r.side == Side::Left));
        assert!(records.iter().all(|r| r.channels.len() == 208));
    }
}
