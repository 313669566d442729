//! Activity threshold calibration
//!
//! The focus threshold is read off a descending ranking of non-idle activity
//! scores from a reference set. The reference set may be larger than the
//! displayed samples so that thresholds stay stable across display windows.

use crate::config::FocusConfig;
use crate::micro::activity_score;
use crate::types::{FocusThreshold, IntervalSample};
use tracing::{debug, warn};

/// Threshold calibrator
pub struct ThresholdCalibrator;

impl ThresholdCalibrator {
    /// Compute the focus threshold for one classification pass.
    ///
    /// `percentile` is an externally calibrated value; it is clamped into
    /// `config.percentile_range`. Without it `config.default_percentile` is used.
    /// Empty or all-zero references resolve to `config.threshold_floor`.
    pub fn calibrate(
        reference: &[IntervalSample],
        percentile: Option<f64>,
        config: &FocusConfig,
    ) -> FocusThreshold {
        let ranked = ranked_scores(reference, config);

        let percentile = match percentile {
            Some(p) => {
                let clamped = config.percentile_range.clamp(p);
                if clamped != p {
                    warn!(requested = p, clamped, "calibrated percentile outside allowed range");
                }
                clamped
            }
            None => config.default_percentile,
        };

        let value = match score_at_percentile(&ranked, percentile) {
            Some(v) if v > 0.0 => v,
            Some(_) => {
                warn!(percentile, "reference scores degenerate at percentile, using floor");
                config.threshold_floor
            }
            None => config.threshold_floor,
        };

        let threshold = FocusThreshold::new(value, config.threshold_floor);
        debug!(
            reference_samples = ranked.len(),
            percentile,
            threshold = threshold.value(),
            "calibrated focus threshold"
        );
        threshold
    }
}

/// Activity scores of non-idle samples, sorted descending
fn ranked_scores(reference: &[IntervalSample], config: &FocusConfig) -> Vec<f64> {
    let mut scores: Vec<f64> = reference
        .iter()
        .filter(|s| !s.is_idle)
        .map(|s| activity_score(s, &config.weights))
        .collect();
    scores.sort_by(|a, b| b.total_cmp(a));
    scores
}

/// Value at `floor(len * percentile / 100)`, clamped to the last index
fn score_at_percentile(ranked: &[f64], percentile: f64) -> Option<f64> {
    if ranked.is_empty() {
        return None;
    }
    let raw = (ranked.len() as f64 * percentile / 100.0).floor();
    let index = if raw.is_sign_negative() { 0 } else { raw as usize };
    ranked.get(index.min(ranked.len() - 1)).copied()
}
