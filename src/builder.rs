//! Builder for configuring and constructing a `Trainer`.

use crate::audio::{AudioFeedback, SilentSink, ToneSink};
use crate::session::PracticeSession;
use crate::{Result, Trainer};
use sightread_core::{
    JsonFileStore, KeyValueStore, MemoryStore, NoteSampler, PracticeQueue, ProgressStore,
    TrainerConfig, WeightCurve,
};
use sightread_midi_io::{MidiInputManager, MidiNormalizer};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

/// Progress is kept in memory unless a store or progress file is given.
/// Hardware MIDI requires explicit opt-in via `.midi()`; without it, input
/// arrives through `Trainer::press` and `Trainer::inject`.
///
/// # Example
///
/// ```ignore
/// use sightread::prelude::*;
///
/// let trainer = Trainer::builder()
///     .pitch_range(36, 84)
///     .queue_len(6)
///     .weight_curve(WeightCurve::Linear)
///     .progress_file(dirs.data_dir().join("progress.json"))
///     .build()?;
/// ```
#[derive(Default)]
pub struct TrainerBuilder {
    config: TrainerConfig,
    store: Option<Box<dyn KeyValueStore>>,
    progress_file: Option<PathBuf>,
    sink: Option<Box<dyn ToneSink>>,
    seed: Option<u64>,
    enable_midi: bool,
    audio_disabled: bool,
}

impl TrainerBuilder {
    /// Replace every setting at once.
    pub fn config(mut self, config: TrainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 36..=84
    pub fn pitch_range(mut self, min_midi: u8, max_midi: u8) -> Self {
        self.config.min_midi = min_midi;
        self.config.max_midi = max_midi;
        self
    }

    /// Default: 6
    pub fn queue_len(mut self, len: usize) -> Self {
        self.config.queue_len = len;
        self
    }

    pub fn weight_curve(mut self, curve: WeightCurve) -> Self {
        self.config.weight_curve = curve;
        self
    }

    /// Default: 300 ms
    pub fn tone_duration(mut self, duration: Duration) -> Self {
        self.config.tone_duration_ms = duration.as_millis() as u64;
        self
    }

    /// Persist progress in a custom store. Takes precedence over
    /// [`progress_file`](Self::progress_file).
    pub fn store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Persist progress in a JSON file, created on first write.
    pub fn progress_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.progress_file = Some(path.into());
        self
    }

    /// Where feedback tones go. Default: the audio device with the
    /// `audio-out` feature, otherwise nowhere.
    pub fn sink(mut self, sink: impl ToneSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Make note selection reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Connect to every MIDI input device when building.
    pub fn midi(mut self) -> Self {
        self.enable_midi = true;
        self
    }

    /// Start with feedback sound switched off.
    pub fn muted(mut self) -> Self {
        self.audio_disabled = true;
        self
    }

    pub fn build(self) -> Result<Trainer> {
        self.config.validate()?;

        let store: Box<dyn KeyValueStore> = match (self.store, self.progress_file) {
            (Some(store), _) => store,
            (None, Some(path)) => Box::new(JsonFileStore::open(path)?),
            (None, None) => Box::new(MemoryStore::new()),
        };
        let progress = ProgressStore::load(store, self.config.weight_curve);

        let range = self.config.pitch_range();
        let sampler = match self.seed {
            Some(seed) => NoteSampler::seeded(range, seed),
            None => NoteSampler::new(range),
        };
        let queue = PracticeQueue::new(self.config.queue_len, sampler);

        let sink = self.sink.unwrap_or_else(default_sink);
        let mut feedback = AudioFeedback::new(sink);
        feedback.set_enabled(!self.audio_disabled);

        let session = Rc::new(RefCell::new(PracticeSession::new(
            progress,
            queue,
            feedback,
            self.config.tone_duration(),
        )));

        let mut normalizer = MidiNormalizer::new();
        PracticeSession::attach(&session, &mut normalizer);

        // MIDI failures never block practice; they show up in the status.
        let midi = MidiInputManager::new();
        if self.enable_midi {
            let status = midi.connect();
            match status.error {
                Some(ref error) => tracing::warn!("MIDI unavailable: {}", error),
                None => tracing::debug!("MIDI inputs: {:?}", status.devices),
            }
        }

        Ok(Trainer::from_parts(self.config, session, normalizer, midi))
    }
}

#[cfg(feature = "audio-out")]
fn default_sink() -> Box<dyn ToneSink> {
    match crate::audio::CpalToneSink::new() {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            tracing::warn!("Audio output unavailable, feedback muted: {}", e);
            Box::new(SilentSink)
        }
    }
}

#[cfg(not(feature = "audio-out"))]
fn default_sink() -> Box<dyn ToneSink> {
    Box::new(SilentSink)
}
