//! Learned focus profile
//!
//! The profile stores per-user baselines learned from history plus the
//! externally calibrated focus percentile. It is plain data: callers load
//! and save it and pass its percentile into threshold calibration.

use crate::config::FocusConfig;
use crate::error::ComputeError;
use crate::tally::OrderedTally;
use crate::types::IntervalSample;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Share of the most active samples treated as peak performance
const TOP_SHARE: f64 = 0.25;

/// Per-minute actions regarded as a standard high-focus pace
const STANDARD_ACTIONS_PER_MIN: f64 = 50.0;

/// Number of focus habitats kept
const MAX_HABITATS: usize = 5;

/// Input rates observed during the user's most active intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileBaselines {
    pub focus_keystrokes_per_min: f64,
    pub focus_clicks_per_min: f64,
    pub focus_scrolls_per_min: f64,
    pub avg_switch_frequency: f64,
}

impl Default for ProfileBaselines {
    fn default() -> Self {
        Self {
            focus_keystrokes_per_min: 40.0,
            focus_clicks_per_min: 10.0,
            focus_scrolls_per_min: 5.0,
            avg_switch_frequency: 0.5,
        }
    }
}

/// Threshold tuning carried by the profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileThresholds {
    pub activity_multiplier: f64,
    pub reading_scroll_threshold: f64,
    /// Percentile from the external calibration service, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_percentile: Option<f64>,
}

impl Default for ProfileThresholds {
    fn default() -> Self {
        Self {
            activity_multiplier: 1.0,
            reading_scroll_threshold: 2.0,
            focus_percentile: None,
        }
    }
}

/// Per-user focus profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusProfile {
    pub baselines: ProfileBaselines,
    pub thresholds: ProfileThresholds,
    /// Apps most often active during peak intervals
    pub focus_habitats: Vec<String>,
    pub nemesis_apps: Vec<String>,
}

impl FocusProfile {
    /// Load a profile from JSON; missing sections take defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| ComputeError::InvalidProfile(e.to_string()))?;
        if !value.is_object() {
            return Err(ComputeError::InvalidProfile(
                "profile must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| ComputeError::InvalidProfile(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Percentile to feed the threshold calibrator
    pub fn focus_percentile(&self) -> Option<f64> {
        self.thresholds.focus_percentile
    }

    /// Store an externally calibrated percentile, clamped to the allowed range
    pub fn apply_calibration(&mut self, percentile: f64, config: &FocusConfig) -> f64 {
        let clamped = config.percentile_range.clamp(percentile);
        self.thresholds.focus_percentile = Some(clamped);
        clamped
    }
}

/// Learns profile baselines from sample history
pub struct ProfileLearner;

impl ProfileLearner {
    /// Update `profile` from `history`.
    ///
    /// Returns false, leaving the profile untouched, when history has no
    /// samples with any input.
    pub fn learn(profile: &mut FocusProfile, history: &[IntervalSample], config: &FocusConfig) -> bool {
        let mut active: Vec<&IntervalSample> = history.iter().filter(|s| raw_total(s) > 0).collect();
        if active.is_empty() {
            return false;
        }
        active.sort_by_key(|s| std::cmp::Reverse(raw_total(s)));

        let top_n = ((active.len() as f64 * TOP_SHARE).floor() as usize).max(1);
        let top = &active[..top_n];
        let per_minute = 60.0 / config.sample_interval_sec;
        let mean = |f: fn(&IntervalSample) -> u32| {
            top.iter().map(|s| f(s) as f64).sum::<f64>() / top.len() as f64 * per_minute
        };

        let keys = mean(|s| s.keystrokes);
        let clicks = mean(|s| s.mouse_clicks);
        let scrolls = mean(|s| s.mouse_scrolls);
        profile.baselines.focus_keystrokes_per_min = round_to(keys, 1);
        profile.baselines.focus_clicks_per_min = round_to(clicks, 1);
        profile.baselines.focus_scrolls_per_min = round_to(scrolls, 1);

        let user_activity = keys + clicks + scrolls;
        if user_activity > 0.0 {
            profile.thresholds.activity_multiplier =
                round_to(STANDARD_ACTIONS_PER_MIN / user_activity, 2);
        }

        let apps: OrderedTally<&str> = top.iter().map(|s| s.active_window.as_str()).collect();
        let mut ranked: Vec<(&str, usize)> = apps.iter().map(|(app, n)| (*app, n)).collect();
        ranked.sort_by_key(|(_, n)| std::cmp::Reverse(*n));
        profile.focus_habitats = ranked
            .into_iter()
            .take(MAX_HABITATS)
            .map(|(app, _)| app.to_string())
            .collect();

        debug!(
            active_samples = active.len(),
            top_samples = top_n,
            keys_per_min = keys,
            "learned focus profile baselines"
        );
        true
    }
}

/// Unweighted input count of a sample
fn raw_total(sample: &IntervalSample) -> u64 {
    u64::from(sample.keystrokes) + u64::from(sample.mouse_clicks) + u64::from(sample.mouse_scrolls)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
