//! External command-line synthesizers (espeak-ng, espeak, macOS `say`)
//!
//! The command writes a WAV file into a temp path owned by the shared
//! [`TempFiles`] ledger; the file is decoded and released straight away.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{Speech, SpeechSynthesizer};
use crate::audio::TempFiles;
use crate::error::{SynthesisError, SynthesisResult};

/// One ranked synthesizer entry in settings
///
/// `args` may contain the placeholders `{text}`, `{rate}` and `{output}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizerSettings {
    /// Executable name or path
    pub program: String,
    /// Argument template
    #[serde(default)]
    pub args: Vec<String>,
}

impl SynthesizerSettings {
    /// `espeak-ng -s <rate> -w <output> <text>`
    pub fn espeak_ng() -> Self {
        Self::espeak_compatible("espeak-ng")
    }

    /// `espeak -s <rate> -w <output> <text>`
    pub fn espeak() -> Self {
        Self::espeak_compatible("espeak")
    }

    fn espeak_compatible(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: ["-s", "{rate}", "-w", "{output}", "{text}"]
                .map(String::from)
                .to_vec(),
        }
    }

    /// macOS `say` writing 16-bit little-endian WAV at 22050 Hz
    pub fn say() -> Self {
        Self {
            program: "say".to_string(),
            args: [
                "-r",
                "{rate}",
                "--file-format=WAVE",
                "--data-format=LEI16@22050",
                "-o",
                "{output}",
                "{text}",
            ]
            .map(String::from)
            .to_vec(),
        }
    }

    /// Default ranking: espeak-ng, espeak, say
    pub fn defaults() -> Vec<Self> {
        vec![Self::espeak_ng(), Self::espeak(), Self::say()]
    }

    fn expand_args(&self, text: &str, rate: u32, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{rate}", &rate.to_string())
                    .replace("{output}", &output)
                    .replace("{text}", text)
            })
            .collect()
    }
}

/// Synthesizer that shells out to a TTS program
pub struct CommandSynthesizer {
    settings: SynthesizerSettings,
    temp_files: TempFiles,
}

impl CommandSynthesizer {
    /// Create a synthesizer whose intermediate files go to `temp_files`
    pub fn new(settings: SynthesizerSettings, temp_files: TempFiles) -> Self {
        Self {
            settings,
            temp_files,
        }
    }

    fn run(&self, text: &str, rate: u32, output: &Path) -> SynthesisResult<Speech> {
        let args = self.settings.expand_args(text, rate, output);
        trace!(program = %self.settings.program, ?args, "Running synthesizer");

        let result = Command::new(&self.settings.program).args(&args).output();
        let output_status = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SynthesisError::Unavailable(self.settings.program.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        if !output_status.status.success() {
            return Err(SynthesisError::CommandFailed {
                program: self.settings.program.clone(),
                status: output_status.status.to_string(),
                stderr: String::from_utf8_lossy(&output_status.stderr)
                    .trim()
                    .to_string(),
            });
        }

        let speech = read_wav_mono(output)?;
        if speech.samples.is_empty() {
            return Err(SynthesisError::EmptyOutput(text.to_string()));
        }
        Ok(speech)
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        &self.settings.program
    }

    fn synthesize(&self, text: &str, rate: u32) -> SynthesisResult<Speech> {
        let output = self.temp_files.create("speech-", ".wav")?;
        let result = self.run(text, rate, &output);
        self.temp_files.release(&output);

        if let Ok(speech) = &result {
            debug!(
                program = %self.settings.program,
                text = %text,
                rate,
                duration = speech.duration(),
                "Synthesized speech"
            );
        }
        result
    }
}

/// Decode a WAV file into mono 16-bit samples at its native rate
pub(crate) fn read_wav_mono(path: &Path) -> SynthesisResult<Speech> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => reader.samples::<i16>().collect::<Result<_, _>>()?,
        (hound::SampleFormat::Int, bits) => {
            let shift = i32::from(bits) - 16;
            reader
                .samples::<i32>()
                .map(|s| {
                    s.map(|v| {
                        let scaled = if shift >= 0 { v >> shift } else { v << -shift };
                        scaled.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
                    })
                })
                .collect::<Result<_, _>>()?
        }
        (hound::SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v * 32767.0).clamp(-32768.0, 32767.0) as i16))
            .collect::<Result<_, _>>()?,
    };

    let channels = usize::from(spec.channels.max(1));
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / frame.len() as i32) as i16
            })
            .collect()
    };

    Ok(Speech::new(samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, rate: u32, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_expand_args() {
        let args = SynthesizerSettings::espeak_ng().expand_args(
            "1 minute remaining",
            180,
            Path::new("/tmp/out.wav"),
        );
        assert_eq!(
            args,
            vec!["-s", "180", "-w", "/tmp/out.wav", "1 minute remaining"]
        );
    }

    #[test]
    fn test_defaults_ranking() {
        let programs: Vec<String> = SynthesizerSettings::defaults()
            .into_iter()
            .map(|s| s.program)
            .collect();
        assert_eq!(programs, vec!["espeak-ng", "espeak", "say"]);
    }

    #[test]
    fn test_read_wav_downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 16000, &[100, 300, -200, -400]);

        let speech = read_wav_mono(&path).unwrap();
        assert_eq!(speech.sample_rate, 16000);
        assert_eq!(speech.samples, vec![200, -300]);
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let temp_files = TempFiles::new();
        let synth = CommandSynthesizer::new(
            SynthesizerSettings {
                program: "definitely-not-a-real-tts-binary".to_string(),
                args: vec!["{text}".to_string()],
            },
            temp_files.clone(),
        );

        let result = synth.synthesize("10", 250);
        assert!(matches!(result, Err(SynthesisError::Unavailable(_))));
        assert!(temp_files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_reports_status() {
        let temp_files = TempFiles::new();
        let synth = CommandSynthesizer::new(
            SynthesizerSettings {
                program: "false".to_string(),
                args: Vec::new(),
            },
            temp_files.clone(),
        );

        let result = synth.synthesize("Finished", 180);
        assert!(matches!(result, Err(SynthesisError::CommandFailed { .. })));
        assert!(temp_files.is_empty());
    }
}
