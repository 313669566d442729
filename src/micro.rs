//! Per-sample micro classification
//!
//! Each sample is labeled on its own, with no history. The activity score
//! computed here is the same one the threshold calibrator ranks.

use crate::config::ActivityWeights;
use crate::types::{IntervalSample, MicroState, MicroStateKind};

/// Window switches above which a sample is fragmented
const FRAGMENTED_SWITCHES: u32 = 2;

/// Activity score above which a sample is high focus
const HIGH_FOCUS_SCORE: f64 = 5.0;

/// Activity score mapped to full display intensity
const FULL_INTENSITY_SCORE: f64 = 50.0;

/// Weighted activity score of one sample.
///
/// Formula: `keystrokes * w_k + clicks * w_c + scrolls * w_s`; mouse distance is excluded.
pub fn activity_score(sample: &IntervalSample, weights: &ActivityWeights) -> f64 {
    sample.keystrokes as f64 * weights.keystrokes
        + sample.mouse_clicks as f64 * weights.clicks
        + sample.mouse_scrolls as f64 * weights.scrolls
}

/// Micro classifier for interval samples
pub struct MicroClassifier;

impl MicroClassifier {
    /// Classify one sample. First match wins: idle, fragmented, high focus, low focus.
    pub fn classify(sample: &IntervalSample, weights: &ActivityWeights) -> MicroState {
        let score = activity_score(sample, weights);
        let intensity = (score / FULL_INTENSITY_SCORE).clamp(0.0, 1.0);

        let kind = if sample.is_idle {
            MicroStateKind::Idle
        } else if sample.window_switches > FRAGMENTED_SWITCHES {
            MicroStateKind::Fragmented
        } else if score > HIGH_FOCUS_SCORE {
            MicroStateKind::HighFocus
        } else {
            MicroStateKind::LowFocus
        };

        MicroState {
            kind,
            intensity,
            activity_score: score,
        }
    }

    /// Classify every sample, preserving order and cardinality
    pub fn classify_all(samples: &[IntervalSample], weights: &ActivityWeights) -> Vec<MicroState> {
        samples
            .iter()
            .map(|s| Self::classify(s, weights))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(keys: u32, clicks: u32, scrolls: u32, switches: u32, idle: bool) -> IntervalSample {
        IntervalSample {
            keystrokes: keys,
            mouse_clicks: clicks,
            mouse_scrolls: scrolls,
            window_switches: switches,
            is_idle: idle,
            ..IntervalSample::at(0.0)
        }
    }

    #[test]
    fn test_all_zero_samples_are_low_focus() {
        let weights = ActivityWeights::default();
        let samples = vec![IntervalSample::at(0.0), IntervalSample::at(5.0), IntervalSample::at(10.0)];
        for state in MicroClassifier::classify_all(&samples, &weights) {
            assert_eq!(state.kind, MicroStateKind::LowFocus);
            assert_eq!(state.activity_score, 0.0);
            assert_eq!(state.intensity, 0.0);
        }
    }

    #[test]
    fn test_clicks_weighted_double() {
        let weights = ActivityWeights::default();
        let state = MicroClassifier::classify(&sample(10, 3, 0, 2, false), &weights);
        assert_eq!(state.activity_score, 16.0);
        assert_eq!(state.kind, MicroStateKind::HighFocus);
        assert!((state.intensity - 0.32).abs() < 1e-9);
    }

    #[test]
    fn test_mouse_distance_ignored() {
        let weights = ActivityWeights::default();
        let mut s = sample(1, 0, 0, 0, false);
        s.mouse_distance = 10_000.0;
        assert_eq!(activity_score(&s, &weights), 1.0);
    }

    #[test]
    fn test_idle_wins_over_everything() {
        let weights = ActivityWeights::default();
        let state = MicroClassifier::classify(&sample(40, 10, 5, 9, true), &weights);
        assert_eq!(state.kind, MicroStateKind::Idle);
    }

    #[test]
    fn test_fragmented_before_high_focus() {
        let weights = ActivityWeights::default();
        let state = MicroClassifier::classify(&sample(40, 0, 0, 3, false), &weights);
        assert_eq!(state.kind, MicroStateKind::Fragmented);
    }

    #[test]
    fn test_score_of_exactly_five_is_low_focus() {
        let weights = ActivityWeights::default();
        let state = MicroClassifier::classify(&sample(5, 0, 0, 0, false), &weights);
        assert_eq!(state.kind, MicroStateKind::LowFocus);
    }

    #[test]
    fn test_intensity_saturates() {
        let weights = ActivityWeights::default();
        let state = MicroClassifier::classify(&sample(200, 0, 0, 0, false), &weights);
        assert_eq!(state.intensity, 1.0);
    }
}
