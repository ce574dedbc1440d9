//! Playback of rendered tracks using rodio

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::PcmTrack;

/// Errors that can occur during audio playback
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to create output stream: {0}")]
    StreamError(String),

    #[error("Failed to decode audio: {0}")]
    DecodeError(String),

    #[error("Sound file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Audio system not available")]
    NotAvailable,
}

/// Sent once when a started track has played out or been stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackFinished;

/// Plays one track at a time on the default output device
pub struct AudioPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Arc<Sink>>,
    volume: f32,
}

impl AudioPlayer {
    /// Open the default output device
    pub fn new() -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::StreamError(e.to_string()))?;

        info!("Audio player initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            volume: 1.0,
        })
    }

    /// Set the master volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    /// Start playing a WAV file, replacing anything already playing
    pub fn play_file(&mut self, path: &Path) -> Result<Receiver<PlaybackFinished>, AudioError> {
        debug!(path = %path.display(), "Playing audio file");

        if !path.exists() {
            return Err(AudioError::FileNotFound(path.to_path_buf()));
        }

        let file = std::fs::File::open(path).map_err(|e| AudioError::DecodeError(e.to_string()))?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| AudioError::DecodeError(e.to_string()))?;

        let sink = self.fresh_sink()?;
        sink.append(source);
        Ok(self.watch(sink))
    }

    /// Start playing an in-memory track, replacing anything already playing
    pub fn play_track(&mut self, track: &PcmTrack) -> Result<Receiver<PlaybackFinished>, AudioError> {
        debug!(duration = track.duration(), "Playing rendered track");

        let source = SamplesBuffer::new(1, track.sample_rate(), track.samples().to_vec());
        let sink = self.fresh_sink()?;
        sink.append(source);
        Ok(self.watch(sink))
    }

    fn fresh_sink(&mut self) -> Result<Arc<Sink>, AudioError> {
        self.stop();
        let sink =
            Sink::try_new(&self.stream_handle).map_err(|e| AudioError::StreamError(e.to_string()))?;
        sink.set_volume(self.volume);
        let sink = Arc::new(sink);
        self.sink = Some(Arc::clone(&sink));
        Ok(sink)
    }

    fn watch(&self, sink: Arc<Sink>) -> Receiver<PlaybackFinished> {
        let (tx, rx) = mpsc::channel();
        let spawned = std::thread::Builder::new()
            .name("playback-watch".to_string())
            .spawn(move || {
                sink.sleep_until_end();
                let _ = tx.send(PlaybackFinished);
            });
        if let Err(e) = spawned {
            warn!(error = %e, "Failed to spawn playback watcher");
        }
        rx
    }

    /// Stop playback; the pending completion fires
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            debug!("Playback stopped");
        }
    }

    /// Whether a track is still playing
    pub fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
