// Error types for the spoken countdown
//
// This module defines error types using thiserror for the parser, the
// configuration store, speech synthesis and audio rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for timer operations
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Time format error: {0}")]
    TimeFormat(#[from] TimeParseError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Render error: {0}")]
    RenderError(#[from] RenderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors raised while parsing user time strings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeParseError {
    #[error("Invalid time format: '{0}'")]
    InvalidFormat(String),

    #[error("Time value must not be negative: {0}")]
    Negative(f64),

    #[error("Time value too large: '{0}'")]
    Overflow(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse legacy settings: {0}")]
    LegacyParseError(#[from] serde_json::Error),

    #[error("Config directory not found")]
    NoConfigDir,

    #[error("Invalid stage configuration: {0}")]
    InvalidStages(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(#[from] TimeParseError),
}

/// Failures of a single speech synthesis request
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Synthesizer '{0}' is not installed")]
    Unavailable(String),

    #[error("Synthesizer '{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Synthesizer produced no audio for '{0}'")]
    EmptyOutput(String),

    #[error("Failed to decode synthesized audio: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error during synthesis: {0}")]
    Io(#[from] std::io::Error),

    #[error("All synthesizers failed: {}", .0.join("; "))]
    Exhausted(Vec<String>),
}

/// Errors that abort a render
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render cancelled")]
    Cancelled,

    #[error("Failed to write audio file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience type aliases for common Result types
pub type TimerResult<T> = std::result::Result<T, TimerError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type SynthesisResult<T> = std::result::Result<T, SynthesisError>;
pub type RenderResult<T> = std::result::Result<T, RenderError>;
