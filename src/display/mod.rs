//! Visual countdown clock kept in step with audio playback
//!
//! The clock never looks at the audio itself. It derives the phase and the
//! remaining time from a monotonic start instant, delayed by the configured
//! audio offset, and reports which scheduled announcements have just been
//! reached so they can be captioned.

use std::fmt::Write as _;
use std::time::Instant;

use crate::schedule::{Announcement, AnnouncementTracker, Schedule};
use crate::time::format_time;

/// Text shown once both phases have run out
pub const FINISHED_LABEL: &str = "FINISHED";

/// Which part of the session the clock is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The preparation countdown
    Prep,
    /// The main countdown
    Main,
    /// Both countdowns are over
    Finished,
}

/// One rendered state of the clock
#[derive(Debug, Clone, PartialEq)]
pub struct ClockFrame {
    /// Current phase
    pub phase: Phase,
    /// Seconds left in the current phase
    pub remaining: f64,
    /// `MM:SS`, or [`FINISHED_LABEL`]
    pub text: String,
    /// Announcements reached since the previous frame
    pub announcements: Vec<Announcement>,
}

/// Two-phase countdown driven by wall-clock time
#[derive(Debug, Clone)]
pub struct CountdownClock {
    prep_seconds: f64,
    main_seconds: f64,
    audio_offset: f64,
    started: Option<Instant>,
    prep: AnnouncementTracker,
    main: AnnouncementTracker,
}

impl CountdownClock {
    /// Create a clock; the visual countdown lags audio start by `audio_offset`
    pub fn new(prep_seconds: u64, main_seconds: u64, audio_offset: f64) -> Self {
        Self {
            prep_seconds: prep_seconds as f64,
            main_seconds: main_seconds as f64,
            audio_offset: audio_offset.max(0.0),
            started: None,
            prep: AnnouncementTracker::new(Schedule::new()),
            main: AnnouncementTracker::new(Schedule::new()),
        }
    }

    /// Caption announcements from these schedules as they are reached
    pub fn with_schedules(mut self, prep: Schedule, main: Schedule) -> Self {
        self.prep = AnnouncementTracker::new(prep);
        self.main = AnnouncementTracker::new(main);
        self
    }

    /// Mark the instant audio playback started
    pub fn start(&mut self, now: Instant) {
        self.started = Some(now);
    }

    /// Seconds of visual countdown elapsed at `now`
    pub fn elapsed(&self, now: Instant) -> f64 {
        match self.started {
            Some(start) => {
                (now.saturating_duration_since(start).as_secs_f64() - self.audio_offset).max(0.0)
            }
            None => 0.0,
        }
    }

    /// Whether the main countdown has run out at `now`
    pub fn is_finished(&self, now: Instant) -> bool {
        self.started.is_some() && self.elapsed(now) >= self.prep_seconds + self.main_seconds
    }

    /// Compute the frame to show at `now`
    pub fn frame(&mut self, now: Instant) -> ClockFrame {
        let elapsed = self.elapsed(now);
        let mut announcements = Vec::new();

        let main_end = self.prep_seconds + self.main_seconds;
        let (phase, remaining) = if elapsed < self.prep_seconds {
            (Phase::Prep, self.prep_seconds - elapsed)
        } else if elapsed < main_end {
            (Phase::Main, main_end - elapsed)
        } else {
            (Phase::Finished, 0.0)
        };

        // Nothing is heard before playback starts
        if self.started.is_some() {
            match phase {
                Phase::Prep => announcements.extend(self.prep.fire_due(remaining)),
                Phase::Main => {
                    announcements.extend(self.prep.fire_due(0.0));
                    announcements.extend(self.main.fire_due(remaining));
                }
                Phase::Finished => {
                    announcements.extend(self.prep.fire_due(0.0));
                    announcements.extend(self.main.fire_due(0.0));
                }
            }
        }

        let text = match phase {
            Phase::Finished => FINISHED_LABEL.to_string(),
            _ => format_time(remaining),
        };

        ClockFrame {
            phase,
            remaining,
            text,
            announcements,
        }
    }
}

/// Human-readable listing of when each announcement will be heard
///
/// Trigger times are remaining seconds shifted by `audio_offset`.
pub fn describe_schedule(total_seconds: u64, schedule: &Schedule, audio_offset: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Duration: {} ({} seconds)",
        format_time(total_seconds as f64),
        total_seconds
    );
    let _ = writeln!(out, "Offset: {audio_offset}s");

    if schedule.is_empty() {
        out.push_str("No announcements scheduled");
        return out;
    }

    out.push_str("Announcements scheduled:");
    for announcement in schedule {
        let trigger = announcement.remaining_seconds as f64 + audio_offset;
        let _ = write!(out, "\n  {} - \"{}\"", format_time(trigger), announcement.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::StageConfig;
    use std::time::Duration;

    fn at(start: Instant, secs: f64) -> Instant {
        start + Duration::from_secs_f64(secs)
    }

    #[test]
    fn test_clock_before_start_shows_full_prep() {
        let mut clock = CountdownClock::new(20, 415, 0.0);
        let frame = clock.frame(Instant::now());
        assert_eq!(frame.phase, Phase::Prep);
        assert_eq!(frame.text, "00:20");
        assert!(!clock.is_finished(Instant::now()));
    }

    #[test]
    fn test_clock_phases() {
        let start = Instant::now();
        let mut clock = CountdownClock::new(20, 415, 0.0);
        clock.start(start);

        let frame = clock.frame(at(start, 5.5));
        assert_eq!(frame.phase, Phase::Prep);
        assert_eq!(frame.text, "00:14");

        let frame = clock.frame(at(start, 20.0));
        assert_eq!(frame.phase, Phase::Main);
        assert_eq!(frame.text, "06:55");

        let frame = clock.frame(at(start, 435.0));
        assert_eq!(frame.phase, Phase::Finished);
        assert_eq!(frame.text, FINISHED_LABEL);
        assert!(clock.is_finished(at(start, 435.0)));
    }

    #[test]
    fn test_clock_honours_offset() {
        let start = Instant::now();
        let mut clock = CountdownClock::new(10, 10, 1.5);
        clock.start(start);

        assert_eq!(clock.frame(at(start, 1.0)).text, "00:10");
        assert!((clock.elapsed(at(start, 2.0)) - 0.5).abs() < 1e-6);
        assert!(!clock.is_finished(at(start, 20.0)));
        assert!(clock.is_finished(at(start, 21.5)));
    }

    #[test]
    fn test_unstarted_clock_captions_nothing() {
        let main = Schedule::from_unsorted(vec![
            Announcement::new(30, "30 seconds remaining"),
            Announcement::new(10, "10"),
        ]);
        let mut clock = CountdownClock::new(0, 30, 0.0).with_schedules(Schedule::new(), main);

        let frame = clock.frame(Instant::now());
        assert_eq!(frame.phase, Phase::Main);
        assert!(frame.announcements.is_empty());

        let zero = Schedule::from_unsorted(vec![Announcement::new(0, "0")]);
        let mut empty = CountdownClock::new(0, 0, 0.0).with_schedules(Schedule::new(), zero);
        assert!(empty.frame(Instant::now()).announcements.is_empty());

        let start = Instant::now();
        clock.start(start);
        let frame = clock.frame(start);
        assert_eq!(frame.announcements.len(), 1);
        assert_eq!(frame.announcements[0].remaining_seconds, 30);
    }

    #[test]
    fn test_clock_zero_prep_starts_in_main() {
        let start = Instant::now();
        let mut clock = CountdownClock::new(0, 30, 0.0);
        clock.start(start);
        assert_eq!(clock.frame(start).phase, Phase::Main);
    }

    #[test]
    fn test_clock_captions_announcements_once() {
        let stages = StageConfig::default();
        let start = Instant::now();
        let mut clock = CountdownClock::new(5, 12, 0.0)
            .with_schedules(stages.generate_announcements(5), stages.generate_announcements(12));
        clock.start(start);

        let first = clock.frame(start);
        assert_eq!(first.announcements.len(), 1);
        assert_eq!(first.announcements[0].text, "5");
        assert!(clock.frame(start).announcements.is_empty());

        // Jumping into main drains the rest of prep then fires main's 10
        let frame = clock.frame(at(start, 7.0));
        let texts: Vec<&str> = frame.announcements.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(texts, vec!["4", "3", "2", "1", "10"]);
    }

    #[test]
    fn test_describe_schedule() {
        let schedule = StageConfig::default().generate_announcements(70);
        let summary = describe_schedule(70, &schedule, 0.5);

        assert!(summary.starts_with("Duration: 01:10 (70 seconds)\nOffset: 0.5s\n"));
        assert!(summary.contains("\n  01:00 - \"1 minute remaining\""));
        assert!(summary.contains("\n  00:01 - \"1\""));
    }

    #[test]
    fn test_describe_empty_schedule() {
        let summary = describe_schedule(0, &Schedule::new(), 0.0);
        assert!(summary.ends_with("No announcements scheduled"));
    }
}
