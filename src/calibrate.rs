//! Countdown speech-rate calibration
//!
//! Bare countdown numbers are spoken once per second, so each must finish
//! in under a second. Calibration synthesizes "10" down to "1" at a range of
//! rates and recommends the slowest rate that satisfies that bound.

use tracing::{debug, info, warn};

use crate::tts::SpeechSynthesizer;

/// Candidate rates, slowest first
pub const DEFAULT_RATES: [u32; 8] = [200, 220, 240, 260, 280, 300, 320, 350];

/// Words spoken in the final countdown
pub const COUNTDOWN_WORDS: [&str; 10] = ["10", "9", "8", "7", "6", "5", "4", "3", "2", "1"];

/// Phrases timed at the normal rate for reference
pub const SAMPLE_PHRASES: [&str; 8] = [
    "50 seconds remaining",
    "40 seconds remaining",
    "30 seconds remaining",
    "20 seconds remaining",
    "1 minute remaining",
    "2 minutes remaining",
    "5 minutes remaining",
    "Finished",
];

/// Every countdown word must be strictly shorter than this
pub const WORD_LIMIT_SECS: f64 = 1.0;

/// Measurements for one candidate rate
#[derive(Debug, Clone, PartialEq)]
pub struct RateResult {
    /// Words per minute
    pub rate: u32,
    /// Spoken duration per word, in input order
    pub durations: Vec<(String, f64)>,
    /// Longest word
    pub max: f64,
    /// Mean over all words
    pub avg: f64,
    /// Whether every word is under [`WORD_LIMIT_SECS`]
    pub all_under_limit: bool,
}

/// Outcome of a calibration run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationReport {
    /// One entry per rate that could be measured
    pub results: Vec<RateResult>,
    /// Rates where synthesis failed
    pub failed_rates: Vec<u32>,
    /// Slowest rate meeting the limit, if any
    pub recommended: Option<u32>,
}

impl CalibrationReport {
    /// The recommendation, or the fastest measured rate when none qualifies
    pub fn recommended_or_fastest(&self) -> Option<u32> {
        self.recommended
            .or_else(|| self.results.iter().map(|r| r.rate).max())
    }
}

/// Time each word at one rate
///
/// Returns `None` if any word fails to synthesize.
pub fn measure_rate(
    synthesizer: &dyn SpeechSynthesizer,
    rate: u32,
    words: &[&str],
) -> Option<RateResult> {
    let mut durations = Vec::with_capacity(words.len());
    for &word in words {
        match synthesizer.synthesize(word, rate) {
            Ok(speech) => {
                let seconds = speech.duration();
                debug!(rate, word = %word, seconds, "Measured countdown word");
                durations.push((word.to_string(), seconds));
            }
            Err(e) => {
                warn!(rate, word = %word, error = %e, "Calibration synthesis failed");
                return None;
            }
        }
    }

    let max = durations.iter().map(|(_, d)| *d).fold(0.0, f64::max);
    let avg = if durations.is_empty() {
        0.0
    } else {
        durations.iter().map(|(_, d)| d).sum::<f64>() / durations.len() as f64
    };
    let all_under_limit = durations.iter().all(|(_, d)| *d < WORD_LIMIT_SECS);

    Some(RateResult {
        rate,
        durations,
        max,
        avg,
        all_under_limit,
    })
}

/// Measure every rate and pick the slowest one that keeps words under a second
pub fn calibrate_countdown_rate(
    synthesizer: &dyn SpeechSynthesizer,
    rates: &[u32],
    words: &[&str],
) -> CalibrationReport {
    let mut report = CalibrationReport::default();

    for &rate in rates {
        match measure_rate(synthesizer, rate, words) {
            Some(result) => report.results.push(result),
            None => report.failed_rates.push(rate),
        }
    }

    report.recommended = report
        .results
        .iter()
        .filter(|r| r.all_under_limit)
        .map(|r| r.rate)
        .min();

    match report.recommended {
        Some(rate) => info!(rate, "Calibrated countdown rate"),
        None => warn!("No rate keeps every countdown word under one second"),
    }
    report
}

/// Time each phrase at `rate`; phrases that fail are omitted
pub fn measure_phrases(
    synthesizer: &dyn SpeechSynthesizer,
    rate: u32,
    phrases: &[&str],
) -> Vec<(String, f64)> {
    phrases
        .iter()
        .filter_map(|&phrase| match synthesizer.synthesize(phrase, rate) {
            Ok(speech) => Some((phrase.to_string(), speech.duration())),
            Err(e) => {
                warn!(phrase = %phrase, error = %e, "Phrase synthesis failed");
                None
            }
        })
        .collect()
}
