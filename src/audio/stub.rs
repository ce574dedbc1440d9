//! Stub implementation when audio feature is disabled

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use thiserror::Error;
use tracing::debug;

use super::PcmTrack;

/// Errors that can occur during audio playback
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio feature not enabled")]
    NotEnabled,

    #[error("Sound file not found: {0}")]
    FileNotFound(PathBuf),
}

/// Sent once when a started track has played out or been stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackFinished;

/// Stub audio player (completes immediately when audio feature is disabled)
#[derive(Debug, Default)]
pub struct AudioPlayer;

impl AudioPlayer {
    /// Create a new audio player stub
    pub fn new() -> Result<Self, AudioError> {
        debug!("Audio feature not enabled, using stub player");
        Ok(Self)
    }

    /// Set volume (no-op)
    pub fn set_volume(&mut self, _volume: f32) {}

    /// Skip playback of a file that must still exist
    pub fn play_file(&mut self, path: &Path) -> Result<Receiver<PlaybackFinished>, AudioError> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.to_path_buf()));
        }
        debug!(path = %path.display(), "Audio playback skipped (feature not enabled)");
        Ok(finished())
    }

    /// Skip playback of an in-memory track
    pub fn play_track(&mut self, _track: &PcmTrack) -> Result<Receiver<PlaybackFinished>, AudioError> {
        debug!("Audio playback skipped (feature not enabled)");
        Ok(finished())
    }

    /// Stop playback (no-op)
    pub fn stop(&mut self) {}

    /// Always false
    pub fn is_playing(&self) -> bool {
        false
    }
}

fn finished() -> Receiver<PlaybackFinished> {
    let (tx, rx) = mpsc::channel();
    let _ = tx.send(PlaybackFinished);
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SAMPLE_RATE;

    #[test]
    fn test_stub_completes_immediately() {
        let mut player = AudioPlayer::new().unwrap();
        let done = player
            .play_track(&PcmTrack::from_samples(vec![0; 100], SAMPLE_RATE))
            .unwrap();
        assert_eq!(done.try_recv(), Ok(PlaybackFinished));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_stub_rejects_missing_file() {
        let mut player = AudioPlayer::new().unwrap();
        let result = player.play_file(Path::new("/nonexistent/session.wav"));
        assert!(matches!(result, Err(AudioError::FileNotFound(_))));
    }
}
