//! Audio error types

use thiserror::Error;

/// Errors that can occur while producing or playing the disruptor. All of
/// them are recoverable at the session level: the task degrades to silent
/// trials rather than stopping.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio output devices available
    #[error("no audio output devices found")]
    NoDevices,

    /// Requested device index is not among the enumerated outputs
    #[error("audio output device not found: {0}")]
    DeviceNotFound(String),

    /// Failed to get device configuration
    #[error("failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build the output stream
    #[error("failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start playback
    #[error("failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// Device only offers a sample format the sink does not speak
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Noise buffer generation or cache load failed
    #[error("noise buffer unavailable: {0}")]
    NoiseUnavailable(String),
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
