//! Per-note accuracy history and the error weights derived from it.
//!
//! Stats are keyed by MIDI pitch and persisted under [`PROGRESS_KEY`] as a
//! JSON object `{"60": {"correct": 3, "total": 4}, ...}`. Persistence is
//! fire-and-forget: a failed write is logged and the in-memory state stays
//! authoritative.
//!
//! `success_rate` is `0.0` both for a pitch that was never tried and for one
//! that was always missed. Weighting treats untried pitches as neutral, so
//! callers that report progress should check [`ProgressStore::attempted`].

use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key the progress document is stored under.
pub const PROGRESS_KEY: &str = "sightread-progress";

/// Sampling weight for a pitch with no attempts yet.
const UNTRIED_WEIGHT: f64 = 1.0;

/// Anything that can assign a sampling weight to a pitch.
pub trait WeightSource {
    fn error_weight(&self, pitch: u8) -> f64;
}

impl<F: Fn(u8) -> f64> WeightSource for F {
    fn error_weight(&self, pitch: u8) -> f64 {
        self(pitch)
    }
}

/// Correct/total counters for one pitch. `correct <= total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteStat {
    correct: u32,
    total: u32,
}

impl NoteStat {
    #[inline]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    fn record(&mut self, was_correct: bool) {
        self.total = self.total.saturating_add(1);
        if was_correct {
            self.correct = self.correct.saturating_add(1);
        }
    }
}

/// Maps a success rate to a sampling weight. Both curves are non-increasing
/// in the success rate and never return less than their floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightCurve {
    /// `max(0.1, (4 * (1 - rate))^2)`: 16 at 0%, 0.1 at 100%.
    #[default]
    Quadratic,
    /// `max(1, 5 * (1 - rate))`: 5 at 0%, 1 from 80% up.
    Linear,
}

impl WeightCurve {
    pub fn weight(self, success_rate: f64) -> f64 {
        let error_rate = 1.0 - success_rate.clamp(0.0, 1.0);
        match self {
            WeightCurve::Quadratic => (error_rate * 4.0).powi(2).max(0.1),
            WeightCurve::Linear => (error_rate * 5.0).max(1.0),
        }
    }
}

/// Aggregate over every attempted pitch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub attempted_notes: usize,
    pub total_attempts: u32,
    pub correct_attempts: u32,
}

impl ProgressSummary {
    pub fn overall_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            self.correct_attempts as f64 / self.total_attempts as f64
        }
    }
}

/// Durable per-note accuracy counters.
#[derive(Debug)]
pub struct ProgressStore<S: KeyValueStore> {
    stats: BTreeMap<u8, NoteStat>,
    curve: WeightCurve,
    store: S,
}

impl<S: KeyValueStore> ProgressStore<S> {
    /// Read existing progress from `store`. Unreadable data is logged and
    /// treated as no progress.
    pub fn load(store: S, curve: WeightCurve) -> Self {
        let stats = match store.get(PROGRESS_KEY) {
            Ok(Some(document)) => Self::parse(&document),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read progress, starting fresh: {}", e);
                BTreeMap::new()
            }
        };
        tracing::debug!("Loaded progress for {} notes", stats.len());
        Self {
            stats,
            curve,
            store,
        }
    }

    fn parse(document: &str) -> BTreeMap<u8, NoteStat> {
        let raw: BTreeMap<String, NoteStat> = match serde_json::from_str(document) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Discarding corrupt progress data: {}", e);
                return BTreeMap::new();
            }
        };

        raw.into_iter()
            .filter_map(|(key, mut stat)| match key.parse::<u8>() {
                Ok(pitch) if pitch <= 127 => {
                    stat.correct = stat.correct.min(stat.total);
                    Some((pitch, stat))
                }
                _ => {
                    tracing::warn!("Ignoring progress entry with invalid pitch {:?}", key);
                    None
                }
            })
            .collect()
    }

    fn persist(&mut self) {
        let document: BTreeMap<String, NoteStat> = self
            .stats
            .iter()
            .map(|(pitch, stat)| (pitch.to_string(), *stat))
            .collect();

        let result = serde_json::to_string(&document)
            .map_err(crate::Error::from)
            .and_then(|json| self.store.set(PROGRESS_KEY, json));
        if let Err(e) = result {
            tracing::warn!("Failed to persist progress: {}", e);
        }
    }

    pub fn record_attempt(&mut self, pitch: u8, was_correct: bool) {
        self.stats.entry(pitch).or_default().record(was_correct);
        tracing::trace!("Recorded attempt on {}: correct={}", pitch, was_correct);
        self.persist();
    }

    /// `correct / total`, or `0.0` when the pitch has no attempts.
    pub fn success_rate(&self, pitch: u8) -> f64 {
        self.stats
            .get(&pitch)
            .map(NoteStat::success_rate)
            .unwrap_or(0.0)
    }

    /// Sampling weight for `pitch`; always strictly positive.
    pub fn error_weight(&self, pitch: u8) -> f64 {
        match self.stats.get(&pitch) {
            Some(stat) if stat.total > 0 => self.curve.weight(stat.success_rate()),
            _ => UNTRIED_WEIGHT,
        }
    }

    pub fn reset_progress(&mut self) {
        self.stats.clear();
        tracing::debug!("Progress reset");
        self.persist();
    }

    pub fn stat(&self, pitch: u8) -> Option<NoteStat> {
        self.stats.get(&pitch).copied()
    }

    pub fn attempted(&self, pitch: u8) -> bool {
        self.stats.get(&pitch).is_some_and(|s| s.total > 0)
    }

    pub fn stats(&self) -> impl Iterator<Item = (u8, NoteStat)> + '_ {
        self.stats.iter().map(|(pitch, stat)| (*pitch, *stat))
    }

    pub fn summary(&self) -> ProgressSummary {
        self.stats
            .values()
            .filter(|s| s.total > 0)
            .fold(ProgressSummary::default(), |mut acc, s| {
                acc.attempted_notes += 1;
                acc.total_attempts += s.total;
                acc.correct_attempts += s.correct;
                acc
            })
    }

    /// Up to `n` attempted pitches with the lowest success rate, weakest first.
    pub fn weakest(&self, n: usize) -> Vec<(u8, f64)> {
        let mut rates: Vec<(u8, f64)> = self
            .stats
            .iter()
            .filter(|(_, s)| s.total > 0)
            .map(|(pitch, s)| (*pitch, s.success_rate()))
            .collect();
        rates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        rates.truncate(n);
        rates
    }

    pub fn curve(&self) -> WeightCurve {
        self.curve
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: KeyValueStore> WeightSource for ProgressStore<S> {
    fn error_weight(&self, pitch: u8) -> f64 {
        ProgressStore::error_weight(self, pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::{Error, Result};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn fresh(curve: WeightCurve) -> ProgressStore<MemoryStore> {
        ProgressStore::load(MemoryStore::new(), curve)
    }

    fn record_n(progress: &mut ProgressStore<MemoryStore>, pitch: u8, correct: u32, wrong: u32) {
        for _ in 0..correct {
            progress.record_attempt(pitch, true);
        }
        for _ in 0..wrong {
            progress.record_attempt(pitch, false);
        }
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: String) -> Result<()> {
            Err(Error::Storage("read-only".to_string()))
        }
    }

    #[test]
    fn test_record_attempt_creates_stat() {
        let mut progress = fresh(WeightCurve::Quadratic);
        assert!(progress.stat(60).is_none());
        assert!(!progress.attempted(60));

        progress.record_attempt(60, false);
        progress.record_attempt(60, true);

        let stat = progress.stat(60).unwrap();
        assert_eq!(stat.correct(), 1);
        assert_eq!(stat.total(), 2);
        assert!(progress.attempted(60));
        assert_relative_eq!(progress.success_rate(60), 0.5);
    }

    #[test]
    fn test_untried_is_neutral() {
        let progress = fresh(WeightCurve::Quadratic);
        assert_eq!(progress.success_rate(72), 0.0);
        assert_eq!(progress.error_weight(72), 1.0);
    }

    #[test]
    fn test_quadratic_curve_points() {
        let curve = WeightCurve::Quadratic;
        assert_relative_eq!(curve.weight(0.0), 16.0);
        assert_relative_eq!(curve.weight(0.5), 4.0);
        assert_relative_eq!(curve.weight(0.9), 0.16, epsilon = 1e-9);
        assert_relative_eq!(curve.weight(1.0), 0.1);
    }

    #[test]
    fn test_linear_curve_points() {
        let curve = WeightCurve::Linear;
        assert_relative_eq!(curve.weight(0.0), 5.0);
        assert_relative_eq!(curve.weight(0.5), 2.5);
        assert_relative_eq!(curve.weight(0.9), 1.0);
        assert_relative_eq!(curve.weight(1.0), 1.0);
    }

    #[test]
    fn test_weight_non_increasing_at_sample_rates() {
        for curve in [WeightCurve::Quadratic, WeightCurve::Linear] {
            let weights: Vec<f64> = [0.0, 0.3, 0.5, 0.8, 0.9, 1.0]
                .iter()
                .map(|rate| curve.weight(*rate))
                .collect();
            for pair in weights.windows(2) {
                assert!(pair[0] >= pair[1], "{:?}: {:?}", curve, weights);
            }
            assert!(weights.iter().all(|w| *w > 0.0));
        }
    }

    #[test]
    fn test_weak_note_outweighs_strong_note() {
        let mut progress = fresh(WeightCurve::Quadratic);
        progress.reset_progress();
        record_n(&mut progress, 60, 2, 8);
        record_n(&mut progress, 61, 9, 1);

        assert!(progress.error_weight(60) > progress.error_weight(61));
    }

    #[test]
    fn test_always_wrong_gets_max_weight() {
        let mut progress = fresh(WeightCurve::Quadratic);
        record_n(&mut progress, 50, 0, 3);
        assert_eq!(progress.success_rate(50), 0.0);
        assert_relative_eq!(progress.error_weight(50), 16.0);
    }

    #[test]
    fn test_reset_progress_clears_everything() {
        let mut progress = fresh(WeightCurve::Quadratic);
        record_n(&mut progress, 40, 1, 1);
        record_n(&mut progress, 41, 2, 0);

        progress.reset_progress();
        assert_eq!(progress.stats().count(), 0);
        assert_eq!(progress.error_weight(40), 1.0);

        let reloaded = ProgressStore::load(progress.into_store(), WeightCurve::Quadratic);
        assert_eq!(reloaded.stats().count(), 0);
    }

    #[test]
    fn test_persisted_document_format() {
        let mut progress = fresh(WeightCurve::Quadratic);
        record_n(&mut progress, 60, 1, 2);

        let json = progress.store().get(PROGRESS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["60"]["correct"], 1);
        assert_eq!(value["60"]["total"], 3);
    }

    #[test]
    fn test_reload_restores_stats() {
        let mut progress = fresh(WeightCurve::Linear);
        record_n(&mut progress, 55, 3, 1);

        let reloaded = ProgressStore::load(progress.into_store(), WeightCurve::Linear);
        let stat = reloaded.stat(55).unwrap();
        assert_eq!((stat.correct(), stat.total()), (3, 4));
    }

    #[test]
    fn test_load_tolerates_bad_data() {
        let mut store = MemoryStore::new();
        store
            .set(
                PROGRESS_KEY,
                r#"{"60": {"correct": 9, "total": 4}, "oops": {"correct": 1, "total": 1}, "300": {"correct": 0, "total": 1}}"#
                    .to_string(),
            )
            .unwrap();

        let progress = ProgressStore::load(store, WeightCurve::Quadratic);
        assert_eq!(progress.stats().count(), 1);
        let stat = progress.stat(60).unwrap();
        assert!(stat.correct() <= stat.total());

        let mut corrupt = MemoryStore::new();
        corrupt.set(PROGRESS_KEY, "[1,2".to_string()).unwrap();
        let progress = ProgressStore::load(corrupt, WeightCurve::Quadratic);
        assert_eq!(progress.stats().count(), 0);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut progress = ProgressStore::load(ReadOnlyStore, WeightCurve::Quadratic);
        progress.record_attempt(64, true);
        assert_eq!(progress.stat(64).unwrap().total(), 1);
    }

    #[test]
    fn test_summary_and_weakest() {
        let mut progress = fresh(WeightCurve::Quadratic);
        record_n(&mut progress, 60, 1, 3);
        record_n(&mut progress, 62, 4, 0);
        record_n(&mut progress, 64, 1, 1);

        let summary = progress.summary();
        assert_eq!(summary.attempted_notes, 3);
        assert_eq!(summary.total_attempts, 10);
        assert_eq!(summary.correct_attempts, 6);
        assert_relative_eq!(summary.overall_rate(), 0.6);

        let weakest = progress.weakest(2);
        assert_eq!(weakest.iter().map(|(p, _)| *p).collect::<Vec<_>>(), vec![60, 64]);
    }

    proptest! {
        #[test]
        fn prop_weight_positive_and_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            for curve in [WeightCurve::Quadratic, WeightCurve::Linear] {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(curve.weight(lo) >= curve.weight(hi));
                prop_assert!(curve.weight(hi) > 0.0);
            }
        }

        #[test]
        fn prop_correct_never_exceeds_total(outcomes in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut progress = fresh(WeightCurve::Quadratic);
            for outcome in &outcomes {
                progress.record_attempt(70, *outcome);
            }
            let stat = progress.stat(70).unwrap_or_default();
            prop_assert!(stat.correct() <= stat.total());
            prop_assert_eq!(stat.total() as usize, outcomes.len());
            prop_assert!(progress.error_weight(70) > 0.0);
        }
    }
}
