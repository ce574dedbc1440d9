//! Announcement schedules
//!
//! A schedule is the ordered list of `(remaining_seconds, text)` pairs spoken
//! during one countdown. Two strategies produce schedules: the tiered
//! [`StageConfig`] and the legacy [`ExponentialSchedule`]. Both are pure and
//! deterministic for a given duration.

mod exponential;
mod overrides;
mod stage;
mod tracker;

pub use exponential::{generate_exponential_intervals, ExponentialSchedule};
pub use overrides::{load_override_announcements, parse_override_announcements};
pub use stage::{Stage, StageConfig, Verbosity};
pub use tracker::AnnouncementTracker;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::TimeParseError;
use crate::time::TimeSpec;

/// A single spoken checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Announcement {
    /// Seconds left on the countdown when this is spoken
    pub remaining_seconds: u64,
    /// Text handed to the synthesizer
    pub text: String,
}

impl Announcement {
    /// Create a new announcement
    pub fn new(remaining_seconds: u64, text: impl Into<String>) -> Self {
        Self {
            remaining_seconds,
            text: text.into(),
        }
    }
}

/// Announcements ordered by remaining time descending (earliest first),
/// without duplicate `remaining_seconds`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    announcements: Vec<Announcement>,
}

impl Schedule {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schedule from announcements in any order
    ///
    /// When two entries share a remaining time the one that appears first
    /// in `announcements` is kept.
    pub fn from_unsorted(announcements: Vec<Announcement>) -> Self {
        let mut seen = HashSet::new();
        let mut kept: Vec<Announcement> = announcements
            .into_iter()
            .filter(|a| seen.insert(a.remaining_seconds))
            .collect();
        kept.sort_by(|a, b| b.remaining_seconds.cmp(&a.remaining_seconds));
        Self { announcements: kept }
    }

    /// Number of announcements
    pub fn len(&self) -> usize {
        self.announcements.len()
    }

    /// Whether the schedule has no announcements
    pub fn is_empty(&self) -> bool {
        self.announcements.is_empty()
    }

    /// Iterate in playback order
    pub fn iter(&self) -> std::slice::Iter<'_, Announcement> {
        self.announcements.iter()
    }

    /// Announcements in playback order
    pub fn as_slice(&self) -> &[Announcement] {
        &self.announcements
    }

    /// Remaining-second values in playback order
    pub fn times(&self) -> Vec<u64> {
        self.announcements
            .iter()
            .map(|a| a.remaining_seconds)
            .collect()
    }

    /// Look up the announcement spoken at `remaining_seconds`
    pub fn get(&self, remaining_seconds: u64) -> Option<&Announcement> {
        self.announcements
            .iter()
            .find(|a| a.remaining_seconds == remaining_seconds)
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Announcement;
    type IntoIter = std::slice::Iter<'a, Announcement>;

    fn into_iter(self) -> Self::IntoIter {
        self.announcements.iter()
    }
}

impl From<Schedule> for Vec<Announcement> {
    fn from(schedule: Schedule) -> Self {
        schedule.announcements
    }
}

/// Capability shared by every schedule-generation algorithm
pub trait ScheduleStrategy {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Produce the announcements for a countdown of `total_seconds`
    fn announcements(&self, total_seconds: u64) -> Schedule;
}

/// Strategy selection as stored in settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StrategySettings {
    /// Use the configured stages
    #[default]
    Staged,
    /// Use the legacy exponential intervals
    Exponential {
        /// Smallest interval, e.g. `"15s"`
        #[serde(default = "default_shortest_interval")]
        shortest_interval: TimeSpec,
        /// Growth factor between consecutive intervals
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
}

fn default_shortest_interval() -> TimeSpec {
    TimeSpec::from("15s")
}

fn default_multiplier() -> f64 {
    2.0
}

impl StrategySettings {
    /// Instantiate the selected strategy; `stages` is used by the staged one
    pub fn build(
        &self,
        stages: StageConfig,
    ) -> Result<Box<dyn ScheduleStrategy + Send + Sync>, TimeParseError> {
        match self {
            StrategySettings::Staged => Ok(Box::new(stages)),
            StrategySettings::Exponential {
                shortest_interval,
                multiplier,
            } => Ok(Box::new(ExponentialSchedule::new(
                shortest_interval.seconds()?,
                *multiplier,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_unsorted_orders_descending() {
        let schedule = Schedule::from_unsorted(vec![
            Announcement::new(5, "5"),
            Announcement::new(60, "1 minute remaining"),
            Announcement::new(30, "30 seconds remaining"),
        ]);
        assert_eq!(schedule.times(), vec![60, 30, 5]);
    }

    #[test]
    fn test_from_unsorted_first_duplicate_wins() {
        let schedule = Schedule::from_unsorted(vec![
            Announcement::new(10, "first"),
            Announcement::new(10, "second"),
        ]);
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.get(10).unwrap().text, "first");
    }

    #[test]
    fn test_strategy_settings_toml() {
        let parsed: StrategySettings =
            toml::from_str("kind = \"exponential\"\nshortest_interval = \"30s\"").unwrap();
        assert_eq!(
            parsed,
            StrategySettings::Exponential {
                shortest_interval: TimeSpec::from("30s"),
                multiplier: 2.0,
            }
        );

        let staged: StrategySettings = toml::from_str("kind = \"staged\"").unwrap();
        assert_eq!(staged, StrategySettings::Staged);
        assert_eq!(StrategySettings::default(), StrategySettings::Staged);
    }

    #[test]
    fn test_build_selects_strategy() {
        let staged = StrategySettings::Staged
            .build(StageConfig::default())
            .unwrap();
        assert_eq!(staged.name(), "staged");

        let exponential = StrategySettings::Exponential {
            shortest_interval: TimeSpec::from("15s"),
            multiplier: 2.0,
        }
        .build(StageConfig::default())
        .unwrap();
        assert_eq!(exponential.name(), "exponential");
        assert_eq!(exponential.announcements(100).times(), vec![60, 30, 15]);

        let invalid = StrategySettings::Exponential {
            shortest_interval: TimeSpec::from("later"),
            multiplier: 2.0,
        }
        .build(StageConfig::default());
        assert!(invalid.is_err());
    }
}
