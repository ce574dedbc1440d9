//! Tracking which announcements have been heard

use std::collections::BTreeSet;

use super::{Announcement, Schedule};

/// Announcements not yet reached during a run
///
/// Keys are consumed monotonically as remaining time falls; once fired an
/// announcement is never reported again.
#[derive(Debug, Clone)]
pub struct AnnouncementTracker {
    schedule: Schedule,
    pending: BTreeSet<u64>,
}

impl AnnouncementTracker {
    /// Start tracking a schedule with nothing fired
    pub fn new(schedule: Schedule) -> Self {
        let pending = schedule.iter().map(|a| a.remaining_seconds).collect();
        Self { schedule, pending }
    }

    /// Consume every announcement whose time has been reached
    ///
    /// An announcement at `N` seconds is due once remaining time is `<= N`.
    pub fn fire_due(&mut self, remaining_seconds: f64) -> Vec<Announcement> {
        let due: Vec<u64> = self
            .pending
            .iter()
            .rev()
            .take_while(|&&t| remaining_seconds <= t as f64)
            .copied()
            .collect();

        due.into_iter()
            .filter_map(|t| {
                self.pending.remove(&t);
                self.schedule.get(t).cloned()
            })
            .collect()
    }

    /// Number of announcements not yet fired
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The next announcement to fire, if any
    pub fn next(&self) -> Option<&Announcement> {
        self.pending
            .iter()
            .next_back()
            .and_then(|&t| self.schedule.get(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::StageConfig;

    #[test]
    fn test_fire_due_is_monotonic() {
        let schedule = StageConfig::default().generate_announcements(130);
        let mut tracker = AnnouncementTracker::new(schedule);
        assert_eq!(tracker.pending(), 16);

        assert!(tracker.fire_due(125.0).is_empty());

        let fired = tracker.fire_due(120.0);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].text, "2 minutes remaining");

        // Already fired, nothing repeats
        assert!(tracker.fire_due(119.5).is_empty());
        assert_eq!(tracker.next().unwrap().remaining_seconds, 60);
    }

    #[test]
    fn test_fire_due_catches_up() {
        let schedule = StageConfig::default().generate_announcements(30);
        let mut tracker = AnnouncementTracker::new(schedule);

        let fired = tracker.fire_due(8.5);
        let times: Vec<u64> = fired.iter().map(|a| a.remaining_seconds).collect();
        assert_eq!(times, vec![30, 20, 10, 9]);

        assert_eq!(tracker.fire_due(0.0).len(), 8);
        assert_eq!(tracker.pending(), 0);
        assert!(tracker.next().is_none());
    }
}
