//! 采集管道指标模块
//!
//! 帧同步与输出阶段的计数器、仪表和直方图，以及会话内的内存聚合统计。

use std::collections::HashMap;

use contracts::{SessionStats, Side};
use metrics::{counter, gauge, histogram};

/// 记录一帧校验通过并发出
pub fn record_frame_accepted(side: Side) {
    counter!("footsole_frames_accepted_total", "side" => side.as_str()).increment(1);
}

/// 记录校验失败的帧 (帧头匹配但校验和错误)
pub fn record_frames_rejected(side: Side, count: u64) {
    counter!("footsole_frames_rejected_total", "side" => side.as_str()).increment(count);
}

/// 记录重同步过程中丢弃的字节
pub fn record_bytes_discarded(side: Side, bytes: usize) {
    counter!("footsole_bytes_discarded_total", "side" => side.as_str()).increment(bytes as u64);
}

/// 记录缓冲区越界导致的强制重同步
///
/// 丢弃的字节同时计入 `footsole_bytes_discarded_total`。
pub fn record_forced_resync(side: Side, bytes: usize) {
    counter!("footsole_forced_resyncs_total", "side" => side.as_str()).increment(1);
    record_bytes_discarded(side, bytes);
}

/// 记录接收缓冲区深度 (字节)
pub fn record_buffer_depth(side: Side, depth: usize) {
    gauge!("footsole_receive_buffer_bytes", "side" => side.as_str()).set(depth as f64);
}

/// 记录传输层送达的数据块
pub fn record_chunk_received(transport: &str, bytes: usize) {
    counter!(
        "footsole_chunks_received_total",
        "transport" => transport.to_string()
    )
    .increment(1);
    counter!(
        "footsole_bytes_received_total",
        "transport" => transport.to_string()
    )
    .increment(bytes as u64);
}

/// 记录通知通道满时丢弃的通知 (仅原始字节)
pub fn record_notification_dropped(transport: &str) {
    counter!(
        "footsole_notifications_dropped_total",
        "transport" => transport.to_string()
    )
    .increment(1);
}

/// 记录相邻记录的到达间隔
pub fn record_frame_interval_ms(side: Side, interval_ms: f64) {
    histogram!("footsole_frame_interval_ms", "side" => side.as_str()).record(interval_ms);
}

/// 记录记录分发结果
pub fn record_record_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "footsole_records_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录 sink 写入延迟
pub fn record_sink_write_latency_ms(sink_name: &str, latency_ms: f64) {
    histogram!(
        "footsole_sink_write_latency_ms",
        "sink" => sink_name.to_string()
    )
    .record(latency_ms);
}

/// 记录会话结束时的最终统计
pub fn record_session_summary(side: Side, stats: &SessionStats) {
    gauge!("footsole_session_frames_accepted", "side" => side.as_str())
        .set(stats.frames_accepted as f64);
    gauge!("footsole_session_rejection_rate", "side" => side.as_str())
        .set(stats.rejection_rate());
    gauge!("footsole_session_discard_rate", "side" => side.as_str()).set(stats.discard_rate());
}

/// 采集指标聚合器
///
/// 在内存中跟踪记录到达间隔和通道负载，会话结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct CaptureMetricsAggregator {
    /// 已观察的记录数
    pub total_records: u64,

    /// 到达间隔统计 (毫秒)
    pub interval_stats: RunningStats,

    /// 单帧总负载统计
    pub load_stats: RunningStats,

    /// 序号跳变次数 (会话内序号应连续)
    pub sequence_gaps: u64,

    /// 各 sink 写入失败次数
    pub sink_failures: HashMap<String, u64>,

    last_timestamp_ns: Option<u64>,
    last_sequence: Option<u64>,
}

impl CaptureMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 观察一条记录
    pub fn observe(&mut self, sequence: u64, timestamp_ns: u64, total_load: u64) {
        self.total_records += 1;
        self.load_stats.push(total_load as f64);

        if let Some(prev) = self.last_timestamp_ns {
            let interval_ms = timestamp_ns.saturating_sub(prev) as f64 / 1_000_000.0;
            self.interval_stats.push(interval_ms);
        }
        if let Some(prev) = self.last_sequence {
            if sequence != prev + 1 {
                self.sequence_gaps += 1;
            }
        }

        self.last_timestamp_ns = Some(timestamp_ns);
        self.last_sequence = Some(sequence);
    }

    /// 记录一次 sink 写入失败
    pub fn observe_sink_failure(&mut self, sink_name: &str) {
        *self.sink_failures.entry(sink_name.to_string()).or_insert(0) += 1;
    }

    /// 最近一次到达间隔 (毫秒)
    pub fn last_interval_ms(&self, timestamp_ns: u64) -> Option<f64> {
        self.last_timestamp_ns
            .map(|prev| timestamp_ns.saturating_sub(prev) as f64 / 1_000_000.0)
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let mean_interval = self.interval_stats.mean();
        MetricsSummary {
            total_records: self.total_records,
            sequence_gaps: self.sequence_gaps,
            effective_rate_hz: if mean_interval > 0.0 {
                1000.0 / mean_interval
            } else {
                0.0
            },
            interval_ms: StatsSummary::from(&self.interval_stats),
            total_load: StatsSummary::from(&self.load_stats),
            sink_failures: self.sink_failures.clone(),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_records: u64,
    pub sequence_gaps: u64,
    pub effective_rate_hz: f64,
    pub interval_ms: StatsSummary,
    pub total_load: StatsSummary,
    pub sink_failures: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Capture Metrics Summary ===")?;
        writeln!(f, "Total records: {}", self.total_records)?;
        writeln!(f, "Effective rate: {:.1} Hz", self.effective_rate_hz)?;
        writeln!(f, "Frame interval (ms): {}", self.interval_ms)?;
        writeln!(f, "Total load: {}", self.total_load)?;
        if self.sequence_gaps > 0 {
            writeln!(f, "Sequence gaps: {}", self.sequence_gaps)?;
        }

        if !self.sink_failures.is_empty() {
            writeln!(f, "Sink write failures:")?;
            for (sink, count) in &self.sink_failures {
                writeln!(f, "  {}: {}", sink, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_intervals() {
        let mut aggregator = CaptureMetricsAggregator::new();

        // 100 Hz stream: 10 ms apart
        for i in 0..5u64 {
            aggregator.observe(i, 1_000_000_000 + i * 10_000_000, 100);
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_records, 5);
        assert_eq!(summary.interval_ms.count, 4);
        assert!((summary.interval_ms.mean - 10.0).abs() < 1e-9);
        assert!((summary.effective_rate_hz - 100.0).abs() < 1e-6);
        assert_eq!(summary.sequence_gaps, 0);
    }

    #[test]
    fn test_aggregator_sequence_gap_and_failures() {
        let mut aggregator = CaptureMetricsAggregator::new();
        aggregator.observe(0, 0, 0);
        aggregator.observe(2, 5_000_000, 0);
        aggregator.observe_sink_failure("csv");
        aggregator.observe_sink_failure("csv");

        let summary = aggregator.summary();
        assert_eq!(summary.sequence_gaps, 1);
        assert_eq!(summary.sink_failures.get("csv"), Some(&2));

        let text = summary.to_string();
        assert!(text.contains("Sequence gaps: 1"));
        assert!(text.contains("csv: 2"));
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = CaptureMetricsAggregator::new().summary();
        assert_eq!(summary.interval_ms.to_string(), "N/A");
        assert_eq!(summary.effective_rate_hz, 0.0);
    }
}
