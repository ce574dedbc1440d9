//! PCM audio model, rendering and playback
//!
//! Tracks are mono, 16-bit and sampled at [`SAMPLE_RATE`]. The renderer
//! bakes every announcement into one track so playback needs no runtime
//! speech synthesis.

mod renderer;
mod temp;

#[cfg(feature = "audio")]
mod player;

#[cfg(feature = "audio")]
pub use player::{AudioError, AudioPlayer, PlaybackFinished};

#[cfg(not(feature = "audio"))]
mod stub;

#[cfg(not(feature = "audio"))]
pub use stub::{AudioError, AudioPlayer, PlaybackFinished};

pub use renderer::{
    is_countdown_text, AudioRenderer, CancelFlag, RenderedTrack, SessionTrack, SpeechRates,
    FAILED_SPEECH_PLACEHOLDER_SECS, FINISHED_TEXT,
};
pub use temp::TempFiles;

use std::io::Cursor;
use std::path::Path;

/// Target sample rate of rendered tracks
pub const SAMPLE_RATE: u32 = 22050;

/// A mono 16-bit PCM buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcmTrack {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl PcmTrack {
    /// Create an empty track
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    /// Wrap existing samples
    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Samples per second
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Raw samples
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Take the raw samples
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the track holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Append `seconds` of silence (truncated to whole samples)
    pub fn push_silence(&mut self, seconds: f64) {
        if seconds > 0.0 {
            let count = (seconds * f64::from(self.sample_rate)) as usize;
            self.push_silence_samples(count);
        }
    }

    /// Append `count` zero samples
    pub fn push_silence_samples(&mut self, count: usize) {
        self.samples.resize(self.samples.len() + count, 0);
    }

    /// Append samples recorded at `source_rate`, resampling when needed
    pub fn push_resampled(&mut self, samples: &[i16], source_rate: u32) {
        if source_rate == self.sample_rate || source_rate == 0 {
            self.samples.extend_from_slice(samples);
        } else {
            self.samples
                .extend(resample_linear(samples, source_rate, self.sample_rate));
        }
    }

    /// Append another track of the same rate
    pub fn append(&mut self, other: &PcmTrack) {
        self.push_resampled(&other.samples, other.sample_rate);
    }

    fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        }
    }

    /// Write the track as a WAV file
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let mut writer = hound::WavWriter::create(path, self.wav_spec())?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }

    /// Encode the track as in-memory WAV bytes
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, hound::Error> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, self.wav_spec())?;
            for &sample in &self.samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}

/// Resample by linear interpolation between neighbouring samples
///
/// Output index `i` maps to source position `i / ratio`, blending the
/// floor and ceiling neighbours by the fractional part.
pub fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let new_len = (samples.len() as f64 * ratio) as usize;
    let last = samples.len() - 1;

    (0..new_len)
        .map(|i| {
            let src = i as f64 / ratio;
            let low = (src as usize).min(last);
            let high = (low + 1).min(last);
            let frac = src - low as f64;
            let value = f64::from(samples[low]) * (1.0 - frac) + f64::from(samples[high]) * frac;
            value as i16
        })
        .collect()
}
