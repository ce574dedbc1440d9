//! Speech synthesis capability
//!
//! The renderer only needs "render this text at this rate to mono PCM".
//! Backends implement [`SpeechSynthesizer`]; [`SynthesizerChain`] tries a
//! ranked list of them in order and reports which ones failed.

mod command;

pub use command::{CommandSynthesizer, SynthesizerSettings};

use tracing::{debug, warn};

use crate::audio::TempFiles;
use crate::error::{SynthesisError, SynthesisResult};

/// Synthesized mono 16-bit speech at the backend's native rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speech {
    /// PCM samples
    pub samples: Vec<i16>,
    /// Samples per second
    pub sample_rate: u32,
}

impl Speech {
    /// Wrap samples produced at `sample_rate`
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Spoken duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// A text-to-speech backend
pub trait SpeechSynthesizer: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Render `text` spoken at `rate` (words per minute)
    fn synthesize(&self, text: &str, rate: u32) -> SynthesisResult<Speech>;
}

/// Ranked list of synthesizers tried in order
pub struct SynthesizerChain {
    providers: Vec<Box<dyn SpeechSynthesizer>>,
}

impl SynthesizerChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Build command-line synthesizers from settings, sharing one temp-file ledger
    pub fn from_settings(settings: &[SynthesizerSettings], temp_files: TempFiles) -> Self {
        let mut chain = Self::new();
        for entry in settings {
            chain.push(CommandSynthesizer::new(entry.clone(), temp_files.clone()));
        }
        debug!(
            providers = ?chain.provider_names(),
            "Synthesizer chain initialized"
        );
        chain
    }

    /// Append a lower-ranked provider
    pub fn push<S: SpeechSynthesizer + 'static>(&mut self, provider: S) {
        self.providers.push(Box::new(provider));
    }

    /// Builder form of [`push`](Self::push)
    pub fn with<S: SpeechSynthesizer + 'static>(mut self, provider: S) -> Self {
        self.push(provider);
        self
    }

    /// Names of the providers in rank order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl Default for SynthesizerChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSynthesizer for SynthesizerChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn synthesize(&self, text: &str, rate: u32) -> SynthesisResult<Speech> {
        let mut failures = Vec::new();

        for provider in &self.providers {
            match provider.synthesize(text, rate) {
                Ok(speech) => return Ok(speech),
                Err(e) => {
                    warn!(
                        provider = %provider.name(),
                        text = %text,
                        error = %e,
                        "Synthesizer failed, trying next"
                    );
                    failures.push(format!("{}: {e}", provider.name()));
                }
            }
        }

        Err(SynthesisError::Exhausted(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<usize>);

    impl SpeechSynthesizer for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn synthesize(&self, text: &str, _rate: u32) -> SynthesisResult<Speech> {
            match self.1 {
                Some(len) => Ok(Speech::new(vec![1; len], 16000)),
                None => Err(SynthesisError::EmptyOutput(text.to_string())),
            }
        }
    }

    #[test]
    fn test_speech_duration() {
        assert_eq!(Speech::new(vec![0; 8000], 16000).duration(), 0.5);
        assert_eq!(Speech::new(vec![0; 10], 0).duration(), 0.0);
    }

    #[test]
    fn test_chain_uses_first_success() {
        let chain = SynthesizerChain::new()
            .with(Fixed("broken", None))
            .with(Fixed("short", Some(4)))
            .with(Fixed("long", Some(400)));

        let speech = chain.synthesize("Finished", 180).unwrap();
        assert_eq!(speech.samples.len(), 4);
        assert_eq!(chain.provider_names(), vec!["broken", "short", "long"]);
    }

    #[test]
    fn test_chain_exhausted() {
        let chain = SynthesizerChain::new()
            .with(Fixed("a", None))
            .with(Fixed("b", None));

        match chain.synthesize("10", 250) {
            Err(SynthesisError::Exhausted(failures)) => assert_eq!(failures.len(), 2),
            other => panic!("expected exhaustion, got {other:?}"),
        }

        assert!(matches!(
            SynthesizerChain::new().synthesize("10", 250),
            Err(SynthesisError::Exhausted(_))
        ));
    }
}
