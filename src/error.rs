//! Centralized error type for the sightread umbrella crate.
//!
//! Wraps core errors so `?` propagates naturally across crate boundaries.
//! MIDI failures never reach this type: they are reported through `MidiStatus`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] sightread_core::Error),

    #[error("Invalid audio device: {0}")]
    InvalidDevice(String),

    #[cfg(feature = "audio-out")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "audio-out")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "audio-out")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
