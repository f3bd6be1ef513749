use std::time::{Duration, Instant};

/// Trait for monotonic timers shared by the display and input collaborators
pub trait Timer: Clone + Send + Sync {
    /// Nanoseconds since the timer was created
    fn now(&self) -> u64;
    fn elapsed(&self, ts: u64) -> Duration;
    fn record_frame(&mut self, d: Duration);
    fn frame_count(&self) -> usize;
    fn calibration_stats(&self) -> CalibrationStats;

    fn now_secs(&self) -> f64 {
        self.now() as f64 / 1e9
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl CalibrationStats {
    /// True when the frame-interval standard deviation is at most `max_jitter`.
    pub fn is_steady(&self, max_jitter: Duration) -> bool {
        self.average_frame_time_ns > 0.0 && self.jitter_ns <= max_jitter.as_nanos() as f64
    }

    fn from_frames(frames: &[Duration]) -> Self {
        let times: Vec<f64> = frames.iter().map(|d| d.as_nanos() as f64).collect();
        if times.is_empty() {
            return CalibrationStats {
                average_frame_time_ns: 0.0,
                jitter_ns: 0.0,
                min_frame_time_ns: 0.0,
                max_frame_time_ns: 0.0,
                effective_fps: 0.0,
            };
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        CalibrationStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub frame_times: Vec<Duration>,
    pub max_samples: usize,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.remove(0);
        }
        self.frame_times.push(d);
    }
    fn frame_count(&self) -> usize {
        self.frame_times.len()
    }
    fn calibration_stats(&self) -> CalibrationStats {
        CalibrationStats::from_frames(&self.frame_times)
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        Self {
            start: Instant::now(),
            frame_times: Vec::with_capacity(max_samples),
            max_samples: max_samples.max(1),
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_frames_report_rate_and_stability() {
        let mut timer = HighPrecisionTimer::new();
        for _ in 0..60 {
            timer.record_frame(Duration::from_micros(16_667));
        }
        let stats = timer.calibration_stats();
        assert!((stats.effective_fps - 60.0).abs() < 0.01);
        assert_eq!(stats.jitter_ns, 0.0);
        assert!(stats.is_steady(Duration::ZERO));
    }

    #[test]
    fn jittery_frames_are_not_stable() {
        let mut timer = HighPrecisionTimer::new();
        for i in 0..30 {
            let us = if i % 2 == 0 { 10_000 } else { 25_000 };
            timer.record_frame(Duration::from_micros(us));
        }
        let stats = timer.calibration_stats();
        assert!((stats.jitter_ns - 7.5e6).abs() < 1.0);
        assert!(!stats.is_steady(Duration::from_millis(1)));
        assert!(stats.is_steady(Duration::from_millis(8)));
    }

    #[test]
    fn ring_keeps_only_latest_samples() {
        let mut timer = HighPrecisionTimer::with_capacity(3);
        for ms in 1..=5 {
            timer.record_frame(Duration::from_millis(ms));
        }
        assert_eq!(timer.frame_count(), 3);
        assert_eq!(timer.frame_times[0], Duration::from_millis(3));
        let stats = timer.calibration_stats();
        assert_eq!(stats.min_frame_time_ns, 3e6);
        assert_eq!(stats.max_frame_time_ns, 5e6);
    }

    #[test]
    fn empty_timer_has_zeroed_stats() {
        let stats = HighPrecisionTimer::new().calibration_stats();
        assert_eq!(stats.effective_fps, 0.0);
        assert!(!stats.is_steady(Duration::from_secs(1)));
    }
}
