//! Pre-rendering schedules into a single time-aligned track
//!
//! Each announcement is placed at `total - remaining` seconds into the
//! track, with silence filling the gaps and trailing silence up to the full
//! duration. Synthesis failures degrade to a short silence so a render
//! always completes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PcmTrack, TempFiles, SAMPLE_RATE};
use crate::error::{RenderError, RenderResult};
use crate::metrics::{RenderMetrics, Timer};
use crate::schedule::{Announcement, Schedule};
use crate::tts::SpeechSynthesizer;

/// Text spoken when the main countdown ends
pub const FINISHED_TEXT: &str = "Finished";

/// Silence substituted for an utterance that could not be synthesized
pub const FAILED_SPEECH_PLACEHOLDER_SECS: f64 = 0.5;

/// Speech rates in words per minute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechRates {
    /// Rate for phrases
    pub normal: u32,
    /// Faster rate for bare countdown numbers
    pub countdown: u32,
}

impl Default for SpeechRates {
    fn default() -> Self {
        Self {
            normal: 180,
            countdown: 250,
        }
    }
}

impl SpeechRates {
    /// Pick the rate for an announcement's text
    pub fn for_text(&self, text: &str) -> u32 {
        if is_countdown_text(text) {
            self.countdown
        } else {
            self.normal
        }
    }
}

/// Whether text is a bare countdown number, e.g. `"7"` or `"10"`
pub fn is_countdown_text(text: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    all_digits(text) || (text.chars().count() <= 2 && all_digits(&text.replace(' ', "")))
}

/// Shared flag that aborts a render between synthesis calls
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One rendered countdown
#[derive(Debug, Clone)]
pub struct RenderedTrack {
    /// The PCM samples
    pub track: PcmTrack,
    /// Rendered length in seconds
    pub duration: f64,
    /// Segment statistics
    pub metrics: RenderMetrics,
}

/// Prep and main countdowns joined into one track
#[derive(Debug, Clone)]
pub struct SessionTrack {
    /// Prep render followed by main render
    pub track: PcmTrack,
    /// Length of the prep portion in seconds
    pub prep_duration: f64,
    /// Length of the main portion in seconds
    pub main_duration: f64,
}

/// Converts schedules to PCM using a speech synthesizer
pub struct AudioRenderer {
    synthesizer: Box<dyn SpeechSynthesizer>,
    rates: SpeechRates,
    sample_rate: u32,
    temp_files: TempFiles,
    cancel: CancelFlag,
}

impl AudioRenderer {
    /// Create a renderer at [`SAMPLE_RATE`]
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>, rates: SpeechRates) -> Self {
        Self {
            synthesizer,
            rates,
            sample_rate: SAMPLE_RATE,
            temp_files: TempFiles::new(),
            cancel: CancelFlag::new(),
        }
    }

    /// Share a temp-file ledger with the synthesizers
    pub fn with_temp_files(mut self, temp_files: TempFiles) -> Self {
        self.temp_files = temp_files;
        self
    }

    /// Abort renders when `cancel` is set
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Render at a rate other than [`SAMPLE_RATE`]
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The ledger of files this renderer is responsible for
    pub fn temp_files(&self) -> &TempFiles {
        &self.temp_files
    }

    /// Render one countdown of `total_seconds`
    ///
    /// # Errors
    ///
    /// Only [`RenderError::Cancelled`]; synthesis failures are replaced by
    /// [`FAILED_SPEECH_PLACEHOLDER_SECS`] of silence.
    pub fn render(
        &self,
        total_seconds: u64,
        schedule: &Schedule,
        include_finished: bool,
    ) -> RenderResult<RenderedTrack> {
        let timer = Timer::start();
        let baseline = self.temp_files.snapshot();
        let mut metrics = RenderMetrics::new();
        let mut track = PcmTrack::new(self.sample_rate);
        let rate = f64::from(self.sample_rate);

        let mut ordered: Vec<&Announcement> = schedule.iter().collect();
        ordered.sort_by(|a, b| b.remaining_seconds.cmp(&a.remaining_seconds));

        for announcement in ordered {
            self.check_cancelled(&baseline)?;

            let target_time = total_seconds.saturating_sub(announcement.remaining_seconds);
            let target_samples = (target_time as f64 * rate).round() as usize;
            if target_samples > track.len() {
                let gap = target_samples - track.len();
                metrics.record_silence(gap as f64 / rate);
                track.push_silence_samples(gap);
            } else if target_samples < track.len() {
                debug!(
                    remaining = announcement.remaining_seconds,
                    late_by = (track.len() - target_samples) as f64 / rate,
                    "Announcement starts late, previous speech overran"
                );
            }

            let speech_rate = self.rates.for_text(&announcement.text);
            self.speak(&mut track, &mut metrics, &announcement.text, speech_rate);
        }

        let end_samples = (total_seconds as f64 * rate).round() as usize;
        if end_samples > track.len() {
            let gap = end_samples - track.len();
            metrics.record_silence(gap as f64 / rate);
            track.push_silence_samples(gap);
        }

        if include_finished {
            self.check_cancelled(&baseline)?;
            self.speak(&mut track, &mut metrics, FINISHED_TEXT, self.rates.normal);
        }

        metrics.record_wall_time(timer.stop());
        metrics.log_summary();
        let duration = track.duration();
        debug!(
            total_seconds,
            duration,
            speech_segments = metrics.speech_segments(),
            failed_segments = metrics.failed_segments(),
            "Rendered countdown track"
        );

        Ok(RenderedTrack {
            track,
            duration,
            metrics,
        })
    }

    /// Fail with [`RenderError::Cancelled`] once cancel is set, releasing
    /// only the files recorded after `baseline`
    fn check_cancelled(&self, baseline: &[PathBuf]) -> RenderResult<()> {
        if self.cancel.is_cancelled() {
            let removed = self.temp_files.release_since(baseline);
            warn!(removed, "Render cancelled");
            return Err(RenderError::Cancelled);
        }
        Ok(())
    }

    fn speak(&self, track: &mut PcmTrack, metrics: &mut RenderMetrics, text: &str, rate: u32) {
        match self.synthesizer.synthesize(text, rate) {
            Ok(speech) => {
                let before = track.len();
                track.push_resampled(&speech.samples, speech.sample_rate);
                let seconds = (track.len() - before) as f64 / f64::from(self.sample_rate);
                metrics.record_speech(seconds);
            }
            Err(e) => {
                warn!(
                    text = %text,
                    error = %e,
                    "Speech synthesis failed, inserting placeholder silence"
                );
                let before = track.len();
                track.push_silence(FAILED_SPEECH_PLACEHOLDER_SECS);
                let seconds = (track.len() - before) as f64 / f64::from(self.sample_rate);
                metrics.record_failed(seconds);
            }
        }
    }

    /// Render a prep countdown (no "Finished") followed by the main countdown
    pub fn render_session(
        &self,
        prep_seconds: u64,
        prep_schedule: &Schedule,
        main_seconds: u64,
        main_schedule: &Schedule,
    ) -> RenderResult<SessionTrack> {
        let prep = self.render(prep_seconds, prep_schedule, false)?;
        let main = self.render(main_seconds, main_schedule, true)?;

        info!(
            prep_seconds,
            main_seconds,
            prep_duration = prep.duration,
            main_duration = main.duration,
            failed_segments = prep.metrics.failed_segments() + main.metrics.failed_segments(),
            "Rendered session audio"
        );

        let mut track = prep.track;
        track.append(&main.track);
        Ok(SessionTrack {
            track,
            prep_duration: prep.duration,
            main_duration: main.duration,
        })
    }

    /// Render a session and write it as WAV
    ///
    /// With no `output` the file goes to a temp path owned by this renderer
    /// and is removed by [`cleanup`](Self::cleanup). A cancel seen before the
    /// method returns removes the temp file again.
    pub fn render_session_to_file(
        &self,
        prep_seconds: u64,
        prep_schedule: &Schedule,
        main_seconds: u64,
        main_schedule: &Schedule,
        output: Option<&Path>,
    ) -> RenderResult<PathBuf> {
        let baseline = self.temp_files.snapshot();
        let session = self.render_session(prep_seconds, prep_schedule, main_seconds, main_schedule)?;
        self.check_cancelled(&baseline)?;

        let path = match output {
            Some(path) => path.to_path_buf(),
            None => self.temp_files.create("session-", ".wav")?,
        };

        if let Err(source) = session.track.write_wav(&path) {
            if output.is_none() {
                self.temp_files.release(&path);
            }
            return Err(RenderError::WriteFailed { path, source });
        }
        self.check_cancelled(&baseline)?;

        info!(path = %path.display(), duration = session.track.duration(), "Wrote session audio");
        Ok(path)
    }

    /// Remove every temporary file this renderer owns; safe to repeat
    pub fn cleanup(&self) {
        self.temp_files.cleanup();
    }
}
