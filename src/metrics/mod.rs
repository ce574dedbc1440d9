//! Render statistics
//!
//! This module tracks how much of a rendered track is speech versus
//! silence, how many utterances failed to synthesize, and how long the
//! render took, so slow or broken synthesis backends show up in logs.

use std::time::{Duration, Instant};

/// Speech synthesis slower than this per segment is worth a warning
pub const TARGET_SYNTHESIS_TIME_MS: u64 = 500;

/// Segment accounting for one render
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMetrics {
    speech_segments: usize,
    failed_segments: usize,
    speech_seconds: f64,
    silence_seconds: f64,
    wall_time: Duration,
}

impl RenderMetrics {
    /// Create empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a synthesized utterance of `seconds`
    pub fn record_speech(&mut self, seconds: f64) {
        self.speech_segments += 1;
        self.speech_seconds += seconds;
    }

    /// Record a failed utterance replaced by `seconds` of silence
    pub fn record_failed(&mut self, seconds: f64) {
        self.failed_segments += 1;
        self.silence_seconds += seconds;
    }

    /// Record gap-filling silence
    pub fn record_silence(&mut self, seconds: f64) {
        self.silence_seconds += seconds;
    }

    /// Record how long the render took
    pub fn record_wall_time(&mut self, elapsed: Duration) {
        self.wall_time = elapsed;
    }

    /// Successfully synthesized utterances
    pub fn speech_segments(&self) -> usize {
        self.speech_segments
    }

    /// Utterances replaced by placeholder silence
    pub fn failed_segments(&self) -> usize {
        self.failed_segments
    }

    /// Seconds of speech in the track
    pub fn speech_seconds(&self) -> f64 {
        self.speech_seconds
    }

    /// Seconds of silence in the track, placeholders included
    pub fn silence_seconds(&self) -> f64 {
        self.silence_seconds
    }

    /// Wall-clock render time
    pub fn wall_time(&self) -> Duration {
        self.wall_time
    }

    /// Average wall time per attempted utterance
    pub fn avg_synthesis_time(&self) -> Duration {
        let attempts = self.speech_segments + self.failed_segments;
        if attempts == 0 {
            Duration::ZERO
        } else {
            self.wall_time / attempts as u32
        }
    }

    /// Whether synthesis averaged more than [`TARGET_SYNTHESIS_TIME_MS`]
    pub fn is_slow(&self) -> bool {
        self.avg_synthesis_time().as_millis() > TARGET_SYNTHESIS_TIME_MS as u128
    }

    /// Fraction of attempted utterances that failed, as a percentage
    pub fn failure_percent(&self) -> f64 {
        let attempts = self.speech_segments + self.failed_segments;
        if attempts == 0 {
            0.0
        } else {
            (self.failed_segments as f64 / attempts as f64) * 100.0
        }
    }

    /// Log a summary of the render
    pub fn log_summary(&self) {
        tracing::debug!(
            speech_segments = %self.speech_segments,
            failed_segments = %self.failed_segments,
            speech_seconds = %self.speech_seconds,
            silence_seconds = %self.silence_seconds,
            wall_ms = %self.wall_time.as_secs_f64() * 1000.0,
            "Render metrics summary"
        );
        if self.is_slow() {
            tracing::warn!(
                avg_ms = %self.avg_synthesis_time().as_millis(),
                "Speech synthesis is slow"
            );
        }
    }
}

/// A simple timer for measuring operation duration
#[derive(Debug)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time since timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop timer and return elapsed duration
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_metrics_accounting() {
        let mut metrics = RenderMetrics::new();

        metrics.record_silence(4.0);
        metrics.record_speech(0.75);
        metrics.record_failed(0.5);

        assert_eq!(metrics.speech_segments(), 1);
        assert_eq!(metrics.failed_segments(), 1);
        assert_eq!(metrics.speech_seconds(), 0.75);
        assert_eq!(metrics.silence_seconds(), 4.5);
        assert_eq!(metrics.failure_percent(), 50.0);
    }

    #[test]
    fn test_synthesis_time_budget() {
        let mut metrics = RenderMetrics::new();
        assert_eq!(metrics.avg_synthesis_time(), Duration::ZERO);

        metrics.record_speech(1.0);
        metrics.record_speech(1.0);
        metrics.record_wall_time(Duration::from_millis(400));
        assert_eq!(metrics.avg_synthesis_time(), Duration::from_millis(200));
        assert!(!metrics.is_slow());

        metrics.record_wall_time(Duration::from_millis(2000));
        assert!(metrics.is_slow());
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.stop();
        assert!(elapsed >= Duration::from_millis(10));
    }
}
