//! Spoken Countdown Library
//!
//! This library turns a countdown length into a schedule of spoken
//! time-remaining announcements, pre-renders them into one time-aligned
//! audio track, and drives a visual clock in step with playback.

#![warn(missing_docs)]

pub mod audio;
pub mod calibrate;
pub mod config;
pub mod display;
pub mod error;
pub mod metrics;
pub mod schedule;
pub mod time;
pub mod tts;

// Re-export commonly used types
pub use audio::{
    AudioError, AudioPlayer, AudioRenderer, CancelFlag, PcmTrack, PlaybackFinished, RenderedTrack,
    SessionTrack, SpeechRates, TempFiles, SAMPLE_RATE,
};
pub use calibrate::{calibrate_countdown_rate, CalibrationReport, RateResult};
pub use config::{Settings, SettingsStore};
pub use display::{describe_schedule, ClockFrame, CountdownClock, Phase};
pub use error::{ConfigError, RenderError, SynthesisError, TimeParseError, TimerError};
pub use metrics::{RenderMetrics, Timer};
pub use schedule::{
    load_override_announcements, AnnouncementTracker, Announcement, ExponentialSchedule, Schedule,
    ScheduleStrategy, Stage, StageConfig, StrategySettings, Verbosity,
};
pub use time::{format_time, format_time_announcement, parse_time_string, TimeSpec};
pub use tts::{CommandSynthesizer, Speech, SpeechSynthesizer, SynthesizerChain, SynthesizerSettings};
