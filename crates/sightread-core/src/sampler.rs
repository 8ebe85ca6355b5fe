//! Error-weighted note sampling.
//!
//! Every pitch in the configured range gets the weight reported by a
//! [`WeightSource`]; a pitch is drawn with probability proportional to its
//! weight by walking the cumulative sum (inverse CDF). The range is at most
//! 128 pitches, so a linear scan per draw is fine.

use crate::note::{spellings, Accidental, NoteCard, NoteName};
use crate::progress::WeightSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

/// Index selected by subtracting `weights` from `target` in order until the
/// remainder reaches zero. Returns `None` when the weights run out first.
pub fn pick_weighted(weights: &[f64], target: f64) -> Option<usize> {
    let mut remainder = target;
    for (index, weight) in weights.iter().enumerate() {
        remainder -= weight;
        if remainder <= 0.0 {
            return Some(index);
        }
    }
    None
}

pub struct NoteSampler<R = StdRng> {
    range: RangeInclusive<u8>,
    rng: R,
    /// Scratch buffer reused across draws.
    weights: Vec<f64>,
}

impl NoteSampler<StdRng> {
    pub fn new(range: RangeInclusive<u8>) -> Self {
        Self::with_rng(range, StdRng::from_entropy())
    }

    /// Deterministic sampler, for tests and reproducible drills.
    pub fn seeded(range: RangeInclusive<u8>, seed: u64) -> Self {
        Self::with_rng(range, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> NoteSampler<R> {
    pub fn with_rng(range: RangeInclusive<u8>, rng: R) -> Self {
        let capacity = range.clone().count();
        Self {
            range,
            rng,
            weights: Vec::with_capacity(capacity),
        }
    }

    pub fn range(&self) -> &RangeInclusive<u8> {
        &self.range
    }

    /// Draw one pitch from the range, proportional to its weight.
    ///
    /// Falls back to the lowest pitch if the weights do not sum to a
    /// positive finite total.
    pub fn draw_pitch(&mut self, source: &impl WeightSource) -> u8 {
        let min = *self.range.start();

        self.weights.clear();
        self.weights.extend(self.range.clone().map(|pitch| {
            let weight = source.error_weight(pitch);
            if weight.is_finite() && weight > 0.0 {
                weight
            } else {
                0.0
            }
        }));

        let total: f64 = self.weights.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            tracing::warn!(
                "Non-positive total weight {} over {:?}, using {}",
                total,
                self.range,
                min
            );
            return min;
        }

        let target = self.rng.gen::<f64>() * total;
        let index = match pick_weighted(&self.weights, target) {
            Some(index) => index,
            // Rounding left a sliver past the last weight.
            None => self.weights.len() - 1,
        };
        min + index as u8
    }

    /// Pick a spelling for `pitch`, choosing sharp or flat at random for black keys.
    pub fn spell(&mut self, pitch: u8) -> (NoteName, Accidental) {
        let options = spellings(pitch % 12);
        if options.len() == 1 {
            options[0]
        } else {
            options[self.rng.gen_range(0..options.len())]
        }
    }

    pub fn generate(&mut self, source: &impl WeightSource) -> NoteCard {
        let pitch = self.draw_pitch(source);
        let (name, accidental) = self.spell(pitch);
        NoteCard::new(pitch, name, accidental)
    }
}

impl<R> std::fmt::Debug for NoteSampler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteSampler")
            .field("range", &self.range)
            .finish()
    }
}
