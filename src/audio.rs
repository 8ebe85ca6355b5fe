//! Audio feedback for correct answers.
//!
//! The practice engine only asks a [`ToneSink`] to play a pitch for a
//! duration; whether anything is audible is up to the sink. [`ToneSpec`]
//! renders the feedback tone: a sine at the note's frequency whose gain
//! decays exponentially from 0.3 to 0.01.

use sightread_core::note_to_hz;
use std::cell::RefCell;
use std::f32::consts::TAU;
use std::rc::Rc;
use std::time::Duration;

#[cfg(feature = "audio-out")]
pub use output::CpalToneSink;

/// Gain at the start of a feedback tone.
pub const START_GAIN: f32 = 0.3;
/// Gain the tone has decayed to when it ends.
pub const END_GAIN: f32 = 0.01;

/// Plays a short tone. Fire-and-forget: implementations log their own
/// failures.
pub trait ToneSink {
    fn play(&mut self, pitch: u8, duration: Duration);
}

impl<S: ToneSink + ?Sized> ToneSink for Box<S> {
    fn play(&mut self, pitch: u8, duration: Duration) {
        (**self).play(pitch, duration)
    }
}

/// A sink plus the user's on/off switch for sound.
#[derive(Debug)]
pub struct AudioFeedback<S> {
    sink: S,
    enabled: bool,
}

impl<S: ToneSink> AudioFeedback<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            enabled: true,
        }
    }

    /// Play through the sink unless sound is switched off.
    pub fn play(&mut self, pitch: u8, duration: Duration) {
        if self.enabled {
            self.sink.play(pitch, duration);
        } else {
            tracing::trace!("Audio disabled, skipping tone for {}", pitch);
        }
    }

    /// Flip the switch. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

/// Shape of one feedback tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub pitch: u8,
    pub duration: Duration,
}

impl ToneSpec {
    pub fn new(pitch: u8, duration: Duration) -> Self {
        Self { pitch, duration }
    }

    pub fn frequency(&self) -> f32 {
        note_to_hz(self.pitch as f32)
    }

    /// Gain at `t` seconds into the tone.
    pub fn gain_at(&self, t: f32) -> f32 {
        let length = self.duration.as_secs_f32();
        if length <= 0.0 {
            return END_GAIN;
        }
        let progress = (t / length).clamp(0.0, 1.0);
        START_GAIN * (END_GAIN / START_GAIN).powf(progress)
    }

    /// Mono samples at `sample_rate`.
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let rate = sample_rate as f32;
        let frames = (self.duration.as_secs_f32() * rate).round() as usize;
        let frequency = self.frequency();

        (0..frames)
            .map(|i| {
                let t = i as f32 / rate;
                self.gain_at(t) * (TAU * frequency * t).sin()
            })
            .collect()
    }
}

/// Most tones mixed at once.
pub const MAX_VOICES: usize = 16;

/// Sums overlapping tones sample by sample.
///
/// Voice storage is reserved up front and never grows, so the mixer can run
/// inside an audio callback.
#[derive(Debug)]
pub struct ToneMixer {
    // (samples, read position)
    voices: Vec<(Vec<f32>, usize)>,
}

impl ToneMixer {
    pub fn new() -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
        }
    }

    /// Start mixing `samples`. Returns `false` and drops them when every
    /// voice is busy.
    pub fn admit(&mut self, samples: Vec<f32>) -> bool {
        if self.is_full() {
            return false;
        }
        self.voices.push((samples, 0));
        true
    }

    pub fn is_full(&self) -> bool {
        self.voices.len() >= MAX_VOICES
    }

    pub fn active(&self) -> usize {
        self.voices.len()
    }

    /// Next mixed sample, clamped to `[-1, 1]`. Silence when idle.
    pub fn next_sample(&mut self) -> f32 {
        let mut value = 0.0f32;
        for (samples, position) in self.voices.iter_mut() {
            if let Some(sample) = samples.get(*position) {
                value += sample;
                *position += 1;
            }
        }
        value.clamp(-1.0, 1.0)
    }

    /// Free the voices whose tones have finished.
    pub fn retire(&mut self) {
        self.voices
            .retain(|(samples, position)| *position < samples.len());
    }
}

impl Default for ToneMixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Discards every tone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl ToneSink for SilentSink {
    fn play(&mut self, pitch: u8, duration: Duration) {
        tracing::trace!("Tone {} for {:?} (silent)", pitch, duration);
    }
}

/// Remembers what it was asked to play. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    played: Rc<RefCell<Vec<(u8, Duration)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<(u8, Duration)> {
        self.played.borrow().clone()
    }

    pub fn pitches(&self) -> Vec<u8> {
        self.played.borrow().iter().map(|&(pitch, _)| pitch).collect()
    }

    pub fn clear(&self) {
        self.played.borrow_mut().clear();
    }
}

impl ToneSink for RecordingSink {
    fn play(&mut self, pitch: u8, duration: Duration) {
        self.played.borrow_mut().push((pitch, duration));
    }
}

#[cfg(feature = "audio-out")]
mod output {
    //! CPAL tone output.

    use super::{ToneMixer, ToneSink, ToneSpec};
    use crate::{Error, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use std::time::Duration;

    /// Plays tones on the default output device.
    ///
    /// Tones are rendered on the calling thread and handed to the audio
    /// callback over a channel, where overlapping tones are mixed.
    pub struct CpalToneSink {
        sample_rate: u32,
        tones: Sender<Vec<f32>>,
        _stream: cpal::Stream,
    }

    impl CpalToneSink {
        pub fn new() -> Result<Self> {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| Error::InvalidDevice("No output device available".to_string()))?;
            let config = device.default_output_config()?;
            let sample_rate = config.sample_rate().0;
            let (tones, pending) = unbounded();

            let stream = match config.sample_format() {
                cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &config.into(), pending)?,
                cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &config.into(), pending)?,
                cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &config.into(), pending)?,
                format => {
                    return Err(Error::InvalidDevice(format!(
                        "Unsupported sample format: {:?}",
                        format
                    )));
                }
            };
            stream.play()?;

            tracing::debug!("Tone output running at {} Hz", sample_rate);
            Ok(Self {
                sample_rate,
                tones,
                _stream: stream,
            })
        }

        pub fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn build_stream<T>(
            device: &cpal::Device,
            config: &cpal::StreamConfig,
            pending: Receiver<Vec<f32>>,
        ) -> Result<cpal::Stream>
        where
            T: cpal::SizedSample + cpal::FromSample<f32>,
        {
            let channels = config.channels as usize;
            let mut mixer = ToneMixer::new();

            let stream = device.build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // Tones beyond the voice limit wait in the channel.
                    while !mixer.is_full() {
                        match pending.try_recv() {
                            Ok(samples) => {
                                mixer.admit(samples);
                            }
                            Err(_) => break,
                        }
                    }

                    for frame in data.chunks_mut(channels) {
                        let value = mixer.next_sample();
                        for sample in frame.iter_mut() {
                            *sample = T::from_sample(value);
                        }
                    }

                    mixer.retire();
                },
                |err| tracing::warn!("Audio stream error: {}", err),
                None,
            )?;

            Ok(stream)
        }
    }

    impl ToneSink for CpalToneSink {
        fn play(&mut self, pitch: u8, duration: Duration) {
            let samples = ToneSpec::new(pitch, duration).render(self.sample_rate);
            if self.tones.send(samples).is_err() {
                tracing::warn!("Tone output stopped, dropping tone {}", pitch);
            }
        }
    }

    impl std::fmt::Debug for CpalToneSink {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("CpalToneSink")
                .field("sample_rate", &self.sample_rate)
                .finish()
        }
    }
}
