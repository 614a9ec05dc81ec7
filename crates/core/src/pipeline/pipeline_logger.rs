use std::collections::BTreeMap;
use std::time::Instant;

/// Cross-cutting observer for pipeline events.
///
/// Decouples the recognition loop from output mechanisms so headless
/// runs, tests, and the CLI can each watch the pipeline differently.
pub trait PipelineLogger: Send {
    /// One capture-loop cycle completed.
    fn frame(&mut self, index: usize);

    /// How long a named stage took for one cycle.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A point-in-time gauge (queue depth, active tracks, drop count).
    fn metric(&mut self, name: &str, value: f64);

    /// Human-readable status message.
    fn info(&mut self, message: &str);

    /// End-of-stream report. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards all events; for tests and embedding callers with
/// their own reporting.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame(&mut self, _index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// `log`-backed logger that accumulates stage timings and metric
/// averages and reports throughput when the stream ends.
///
/// Per-frame output is throttled to every `throttle_frames` cycles so a
/// long stream does not flood the log.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    started: Instant,
    frames: usize,
    timing_sums: BTreeMap<String, (f64, usize)>,
    metric_sums: BTreeMap<String, (f64, usize)>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            started: Instant::now(),
            frames: 0,
            timing_sums: BTreeMap::new(),
            metric_sums: BTreeMap::new(),
        }
    }

    /// Formatted end-of-run report, or `None` before any frame.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Recognition run: {} frames in {elapsed:.1}s ({:.1} fps)",
            self.frames,
            self.frames as f64 / elapsed.max(1e-9)
        )];
        for (stage, (sum, count)) in &self.timing_sums {
            lines.push(format!(
                "  {stage}: avg {:.1}ms over {count} samples",
                sum / *count as f64
            ));
        }
        for (name, (sum, count)) in &self.metric_sums {
            lines.push(format!("  {name}: avg {:.1}", sum / *count as f64));
        }
        Some(lines.join("\n"))
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn frame(&mut self, index: usize) {
        self.frames += 1;
        if index % self.throttle_frames == 0 {
            log::info!("processed frame {index}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        let entry = self.timing_sums.entry(stage.to_string()).or_insert((0.0, 0));
        entry.0 += duration_ms;
        entry.1 += 1;
    }

    fn metric(&mut self, name: &str, value: f64) {
        let entry = self.metric_sums.entry(name.to_string()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_is_noop() {
        let mut logger = NullPipelineLogger;
        logger.frame(0);
        logger.timing("detect", 4.0);
        logger.metric("queue_depth", 2.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_summary_none_before_frames() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_summary_reports_stage_averages() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.frame(0);
        logger.timing("detect", 10.0);
        logger.timing("detect", 30.0);
        logger.metric("queue_depth", 3.0);
        logger.metric("queue_depth", 5.0);

        let text = logger.summary_string().unwrap();
        assert!(text.contains("detect: avg 20.0ms"));
        assert!(text.contains("queue_depth: avg 4.0"));
        assert!(text.contains("1 frames"));
    }

    #[test]
    fn test_frame_counts_accumulate() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 0..25 {
            logger.frame(i);
        }
        assert!(logger.summary_string().unwrap().contains("25 frames"));
    }

    #[test]
    fn test_throttle_of_zero_is_clamped() {
        let mut logger = StdoutPipelineLogger::new(0);
        logger.frame(0); // would divide by zero if unclamped
    }
}
