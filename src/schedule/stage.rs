//! Tiered announcement stages
//!
//! Each stage covers a band of remaining time with its own announcement
//! interval and verbosity. The tier with threshold 0 is the catch-all for
//! everything earlier than the other bands.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{Announcement, Schedule, ScheduleStrategy};
use crate::error::ConfigError;
use crate::time::format_time_announcement;

/// How much is spoken per announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Bare number, e.g. `"7"`
    Low,
    /// Full phrase, e.g. `"1 minute 15 seconds remaining"`
    High,
}

/// A tier of announcement density
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Identifier, unique within a configuration
    pub name: String,
    /// Stage applies while remaining time is at or below this (0 = fallback)
    pub duration_threshold: u64,
    /// Seconds between announcements within the stage
    pub announcement_interval: u64,
    /// Phrase style
    pub verbosity: Verbosity,
}

impl Stage {
    /// Create a new stage
    pub fn new(
        name: &str,
        duration_threshold: u64,
        announcement_interval: u64,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            name: name.to_string(),
            duration_threshold,
            announcement_interval,
            verbosity,
        }
    }

    /// Whether this is the catch-all tier
    pub fn is_fallback(&self) -> bool {
        self.duration_threshold == 0
    }

    /// Render the text spoken at `remaining_seconds`
    pub fn format_announcement(&self, remaining_seconds: u64) -> String {
        match self.verbosity {
            Verbosity::Low => remaining_seconds.to_string(),
            Verbosity::High => format_time_announcement(remaining_seconds),
        }
    }
}

/// Stages sorted by threshold descending, fallback tier last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageConfig {
    stages: Vec<Stage>,
}

impl StageConfig {
    /// Build a configuration, sorting stages by threshold descending
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStages`] unless names are unique, every
    /// interval is positive and exactly one stage has threshold 0.
    pub fn new(mut stages: Vec<Stage>) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();
        for stage in &stages {
            if !names.insert(stage.name.as_str()) {
                return Err(ConfigError::InvalidStages(format!(
                    "duplicate stage name '{}'",
                    stage.name
                )));
            }
            if stage.announcement_interval == 0 {
                return Err(ConfigError::InvalidStages(format!(
                    "stage '{}' has a zero announcement interval",
                    stage.name
                )));
            }
        }

        let fallbacks = stages.iter().filter(|s| s.is_fallback()).count();
        if fallbacks != 1 {
            return Err(ConfigError::InvalidStages(format!(
                "expected exactly one stage with threshold 0, found {fallbacks}"
            )));
        }

        stages.sort_by(|a, b| b.duration_threshold.cmp(&a.duration_threshold));
        Ok(Self { stages })
    }

    /// Stages in processing order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The stage that governs `remaining_seconds`
    ///
    /// Note that stages are checked largest threshold first, so with the
    /// default tiers any time up to 60s resolves to the one-minute stage.
    pub fn stage_for_time(&self, remaining_seconds: u64) -> &Stage {
        self.stages
            .iter()
            .find(|s| remaining_seconds <= s.duration_threshold)
            .unwrap_or_else(|| self.fallback())
    }

    fn fallback(&self) -> &Stage {
        // `new` guarantees the fallback exists and sorts last
        &self.stages[self.stages.len() - 1]
    }

    /// Threshold of the stage processed after `index`, or 0
    fn next_threshold(&self, index: usize) -> u64 {
        self.stages
            .get(index + 1)
            .map_or(0, |s| s.duration_threshold)
    }

    /// Compute the announcements for a countdown of `total_seconds`
    ///
    /// Stages are walked in order; each snaps candidate times to its
    /// interval grid inside its window `(end, start]`. The first stage to
    /// claim a time keeps it.
    pub fn generate_announcements(&self, total_seconds: u64) -> Schedule {
        let mut announcements = Vec::new();
        let mut claimed = HashSet::new();

        for (index, stage) in self.stages.iter().enumerate() {
            let end = self.next_threshold(index);
            let start = if stage.is_fallback() {
                total_seconds
            } else {
                stage.duration_threshold.min(total_seconds)
            };

            let interval = stage.announcement_interval;
            let mut current = start;
            while current > end {
                let announcement_time = (current / interval) * interval;

                if announcement_time > end
                    && announcement_time <= total_seconds
                    && announcement_time > 0
                    && claimed.insert(announcement_time)
                {
                    trace!(
                        stage = %stage.name,
                        remaining = announcement_time,
                        "Scheduled announcement"
                    );
                    announcements.push(Announcement::new(
                        announcement_time,
                        stage.format_announcement(announcement_time),
                    ));
                }

                current -= interval.min(current);
            }
        }

        debug!(
            total_seconds,
            count = announcements.len(),
            "Generated staged announcements"
        );
        Schedule::from_unsorted(announcements)
    }

    /// Serialize to a list of stage records
    pub fn to_records(&self) -> Vec<Stage> {
        self.stages.clone()
    }

    /// Build from a list of stage records
    pub fn from_records(records: Vec<Stage>) -> Result<Self, ConfigError> {
        Self::new(records)
    }
}

impl Default for StageConfig {
    /// Countdown (last 10s, every second, numbers only), one minute
    /// (every 10s, phrases) and everything else (every minute, phrases)
    fn default() -> Self {
        Self {
            stages: vec![
                Stage::new("one_minute", 60, 10, Verbosity::High),
                Stage::new("countdown", 10, 1, Verbosity::Low),
                Stage::new("everything", 0, 60, Verbosity::High),
            ],
        }
    }
}

impl ScheduleStrategy for StageConfig {
    fn name(&self) -> &'static str {
        "staged"
    }

    fn announcements(&self, total_seconds: u64) -> Schedule {
        self.generate_announcements(total_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_sorted_descending() {
        let config = StageConfig::default();
        let thresholds: Vec<u64> = config
            .stages()
            .iter()
            .map(|s| s.duration_threshold)
            .collect();
        assert_eq!(thresholds, vec![60, 10, 0]);
        assert_eq!(
            StageConfig::new(config.to_records()).unwrap(),
            config
        );
    }

    #[test]
    fn test_new_sorts_stages() {
        let config = StageConfig::new(vec![
            Stage::new("everything", 0, 60, Verbosity::High),
            Stage::new("countdown", 10, 1, Verbosity::Low),
            Stage::new("one_minute", 60, 10, Verbosity::High),
        ])
        .unwrap();
        assert_eq!(config.stages()[0].name, "one_minute");
        assert_eq!(config.stages()[2].name, "everything");
    }

    #[test]
    fn test_new_rejects_invalid_stages() {
        let no_fallback = StageConfig::new(vec![Stage::new("a", 10, 1, Verbosity::Low)]);
        assert!(matches!(no_fallback, Err(ConfigError::InvalidStages(_))));

        let two_fallbacks = StageConfig::new(vec![
            Stage::new("a", 0, 1, Verbosity::Low),
            Stage::new("b", 0, 5, Verbosity::Low),
        ]);
        assert!(two_fallbacks.is_err());

        let zero_interval = StageConfig::new(vec![
            Stage::new("a", 10, 0, Verbosity::Low),
            Stage::new("b", 0, 60, Verbosity::High),
        ]);
        assert!(zero_interval.is_err());

        let duplicate = StageConfig::new(vec![
            Stage::new("a", 10, 1, Verbosity::Low),
            Stage::new("a", 0, 60, Verbosity::High),
        ]);
        assert!(duplicate.is_err());
    }

    #[test]
    fn test_format_announcement_verbosity() {
        let high = Stage::new("phrases", 60, 10, Verbosity::High);
        assert_eq!(high.format_announcement(75), "1 minute 15 seconds remaining");
        assert_eq!(high.format_announcement(60), "1 minute remaining");
        assert_eq!(high.format_announcement(1), "1 second remaining");

        let low = Stage::new("numbers", 10, 1, Verbosity::Low);
        assert_eq!(low.format_announcement(7), "7");
        assert_eq!(low.format_announcement(75), "75");
    }

    #[test]
    fn test_generate_default_130() {
        let schedule = StageConfig::default().generate_announcements(130);

        assert_eq!(
            schedule.times(),
            vec![120, 60, 50, 40, 30, 20, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1]
        );
        assert_eq!(schedule.get(120).unwrap().text, "2 minutes remaining");
        assert_eq!(schedule.get(60).unwrap().text, "1 minute remaining");
        assert_eq!(schedule.get(20).unwrap().text, "20 seconds remaining");
        assert_eq!(schedule.get(10).unwrap().text, "10");
        assert_eq!(schedule.get(1).unwrap().text, "1");
    }

    #[test]
    fn test_generate_zero_is_empty() {
        assert!(StageConfig::default().generate_announcements(0).is_empty());
    }

    #[test]
    fn test_generate_short_timer() {
        let schedule = StageConfig::default().generate_announcements(5);
        assert_eq!(schedule.times(), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_generate_snaps_to_grid() {
        // 45s: one-minute stage starts at 45 and snaps to 40
        let schedule = StageConfig::default().generate_announcements(45);
        assert_eq!(schedule.times()[..3].to_vec(), vec![40, 30, 20]);
        assert!(schedule.get(45).is_none());
    }

    #[test]
    fn test_generate_excludes_window_boundary() {
        let config = StageConfig::new(vec![
            Stage::new("tens", 30, 10, Verbosity::High),
            Stage::new("fives", 10, 5, Verbosity::Low),
            Stage::new("rest", 0, 100, Verbosity::High),
        ])
        .unwrap();
        let schedule = config.generate_announcements(30);
        // 10 belongs to the "fives" window, not "tens"
        assert_eq!(schedule.get(10).unwrap().text, "10");
        assert_eq!(schedule.times(), vec![30, 20, 10, 5]);
    }

    #[test]
    fn test_generate_is_deterministic() {
        let config = StageConfig::default();
        assert_eq!(
            config.generate_announcements(415),
            config.generate_announcements(415)
        );
    }

    #[test]
    fn test_stage_for_time() {
        let config = StageConfig::default();
        assert_eq!(config.stage_for_time(500).name, "everything");
        assert_eq!(config.stage_for_time(60).name, "one_minute");
        assert_eq!(config.stage_for_time(5).name, "one_minute");
    }

    #[test]
    fn test_records_toml_round_trip() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            stages: Vec<Stage>,
        }

        let config = StageConfig::default();
        let text = toml::to_string(&Wrapper {
            stages: config.to_records(),
        })
        .unwrap();
        assert!(text.contains("verbosity = \"low\""));

        let parsed: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(StageConfig::from_records(parsed.stages).unwrap(), config);
    }
}
