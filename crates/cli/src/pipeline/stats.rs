//! Session report printing.

use capture::SessionReport;

/// Print detailed summary
pub fn print_report(report: &SessionReport) {
    let stats = &report.stats;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Recording Statistics                      ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📊 Overview");
    println!("   ├─ Side: {}", report.side);
    match &report.transport_error {
        Some(error) => println!("   ├─ Ended: {} ({})", report.reason, error),
        None => println!("   ├─ Ended: {}", report.reason),
    }
    println!("   ├─ Duration: {:.2}s", report.duration.as_secs_f64());
    println!("   ├─ Frames accepted: {}", stats.frames_accepted);
    println!("   ├─ Frame rate: {:.2} Hz", report.frame_rate());
    println!(
        "   └─ Bytes received: {} in {} chunks",
        stats.bytes_received, stats.chunks_received
    );

    println!("\n🧩 Framing");
    println!(
        "   ├─ Frames rejected: {} ({:.2}%)",
        stats.frames_rejected,
        stats.rejection_rate()
    );
    println!(
        "   ├─ Bytes discarded: {} ({:.2}%)",
        stats.bytes_discarded,
        stats.discard_rate()
    );
    println!("   └─ Forced resyncs: {}", stats.forced_resyncs);

    let metrics = &report.metrics;
    if metrics.total_records > 1 {
        println!("\n📈 Arrival");
        println!(
            "   ├─ Interval: mean {:.2} ms, min {:.2} ms, max {:.2} ms",
            metrics.interval_ms.mean, metrics.interval_ms.min, metrics.interval_ms.max
        );
        println!("   └─ Effective rate: {:.2} Hz", metrics.effective_rate_hz);
    }

    if !report.sinks.is_empty() {
        println!("\n📤 Sinks ({})", report.sinks.len());
        for (i, (name, snapshot)) in report.sinks.iter().enumerate() {
            let prefix = if i == report.sinks.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            println!(
                "   {} {}: {} written, {} failed, {} waits on full queue",
                prefix, name, snapshot.write_count, snapshot.failure_count, snapshot.blocked_count
            );
        }
    }

    println!();
}
