//! Legacy exponential announcement intervals
//!
//! Announces at the shortest interval and at each successive multiple of
//! the growth factor, e.g. 15s, 30s, 60s, 120s... remaining. Kept for
//! configurations that predate stages; it does not produce the same
//! cadence as [`StageConfig`](super::StageConfig).

use tracing::debug;

use super::{Announcement, Schedule, ScheduleStrategy};
use crate::error::TimeParseError;
use crate::time::{format_time_announcement, TimeSpec};

/// Generate exponentially spaced announcement times, largest first
///
/// Returns an empty list when the countdown is shorter than the shortest
/// interval. Growth stops early if multiplying no longer increases the
/// interval (multipliers of 1 or less).
///
/// # Examples
///
/// ```
/// use spoken_countdown::schedule::generate_exponential_intervals;
///
/// let intervals = generate_exponential_intervals(100, "15s", 2.0).unwrap();
/// assert_eq!(intervals, vec![60, 30, 15]);
/// ```
pub fn generate_exponential_intervals(
    total_seconds: u64,
    shortest_interval: impl Into<TimeSpec>,
    multiplier: f64,
) -> Result<Vec<u64>, TimeParseError> {
    let shortest = shortest_interval.into().seconds()?;
    Ok(exponential_intervals(total_seconds, shortest, multiplier))
}

fn exponential_intervals(total_seconds: u64, shortest: u64, multiplier: f64) -> Vec<u64> {
    if total_seconds < shortest {
        return Vec::new();
    }

    let mut intervals = Vec::new();
    let mut current = shortest;

    while current < total_seconds {
        intervals.push(current);
        let next = (current as f64 * multiplier) as u64;
        if next <= current {
            break;
        }
        current = next;
    }

    intervals.sort_unstable_by(|a, b| b.cmp(a));
    intervals
}

/// Exponential strategy with a fixed shortest interval and growth factor
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialSchedule {
    shortest_interval: u64,
    multiplier: f64,
}

impl ExponentialSchedule {
    /// Create a new exponential strategy
    pub fn new(shortest_interval: u64, multiplier: f64) -> Self {
        Self {
            shortest_interval,
            multiplier,
        }
    }

    /// Announcement times for a countdown, largest first
    pub fn intervals(&self, total_seconds: u64) -> Vec<u64> {
        exponential_intervals(total_seconds, self.shortest_interval, self.multiplier)
    }
}

impl ScheduleStrategy for ExponentialSchedule {
    fn name(&self) -> &'static str {
        "exponential"
    }

    fn announcements(&self, total_seconds: u64) -> Schedule {
        let intervals = self.intervals(total_seconds);
        debug!(
            total_seconds,
            shortest = self.shortest_interval,
            multiplier = self.multiplier,
            count = intervals.len(),
            "Generated exponential announcements"
        );
        Schedule::from_unsorted(
            intervals
                .into_iter()
                .filter(|&t| t > 0)
                .map(|t| Announcement::new(t, format_time_announcement(t)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_example() {
        assert_eq!(
            generate_exponential_intervals(100, "15s", 2.0).unwrap(),
            vec![60, 30, 15]
        );
    }

    #[test]
    fn test_shorter_than_shortest_is_empty() {
        assert!(generate_exponential_intervals(10, "15s", 2.0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_equal_to_shortest_is_empty() {
        assert!(generate_exponential_intervals(15, 15u64, 2.0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_fractional_multiplier_truncates() {
        // 10, 15, 22, 33, 49, 73
        assert_eq!(
            generate_exponential_intervals(100, "10s", 1.5).unwrap(),
            vec![73, 49, 33, 22, 15, 10]
        );
    }

    #[test]
    fn test_non_growing_multiplier_terminates() {
        assert_eq!(
            generate_exponential_intervals(100, "15s", 1.0).unwrap(),
            vec![15]
        );
        assert_eq!(
            generate_exponential_intervals(100, 0u64, 2.0).unwrap(),
            vec![0]
        );
    }

    #[test]
    fn test_invalid_shortest_interval() {
        assert!(generate_exponential_intervals(100, "often", 2.0).is_err());
    }

    #[test]
    fn test_differs_from_staged() {
        let exponential = ExponentialSchedule::new(15, 2.0).announcements(130);
        let staged = super::super::StageConfig::default().announcements(130);
        assert_ne!(exponential, staged);
        assert_eq!(exponential.times(), vec![120, 60, 30, 15]);
        assert_eq!(exponential.get(120).unwrap().text, "2 minutes remaining");
    }
}
