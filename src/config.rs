//! Pipeline configuration
//!
//! Every tunable used by the classification stages lives in [`FocusConfig`],
//! which is passed by reference into each stage. Configs deserialize from
//! partial JSON; missing keys take the defaults below.

use crate::error::ComputeError;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

/// Default symmetric smoothing window, in samples (5 minutes at 5s cadence)
pub const DEFAULT_SMOOTHING_WINDOW: usize = 60;

/// Default recovery lookback, in samples (15 minutes at 5s cadence)
pub const DEFAULT_RECOVERY_LOOKBACK: usize = 180;

/// Default share of the lookback that must be active for a recovery point
pub const DEFAULT_RECOVERY_ACTIVE_FRACTION: f64 = 0.7;

/// Default idle share above which a window is classified Idle
pub const DEFAULT_IDLE_FRACTION: f64 = 0.8;

/// Default time skip (seconds) that produces a gap marker
pub const DEFAULT_GAP_THRESHOLD_SEC: f64 = 300.0;

/// Default idle-run span (seconds) above which the run is compressed
pub const DEFAULT_IDLE_COMPRESSION_SEC: f64 = 1800.0;

/// Default maximum number of display buckets
pub const DEFAULT_MAX_BUCKETS: usize = 120;

/// Default percentile used when no calibrated percentile is supplied
pub const DEFAULT_PERCENTILE: f64 = 45.0;

/// Default threshold used for empty or degenerate reference sets
pub const DEFAULT_THRESHOLD_FLOOR: f64 = 5.0;

/// Default tracker cadence in seconds
pub const DEFAULT_SAMPLE_INTERVAL_SEC: f64 = 5.0;

const MAX_UTC_OFFSET_SEC: i32 = 24 * 3600;

/// Weights applied to raw input counts when computing an activity score.
///
/// Mouse distance is intentionally absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityWeights {
    pub keystrokes: f64,
    pub clicks: f64,
    pub scrolls: f64,
}

impl Default for ActivityWeights {
    fn default() -> Self {
        Self {
            keystrokes: 1.0,
            clicks: 2.0,
            scrolls: 1.0,
        }
    }
}

/// Inclusive range an externally calibrated percentile is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PercentileRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PercentileRange {
    fn default() -> Self {
        Self {
            min: 30.0,
            max: 80.0,
        }
    }
}

impl PercentileRange {
    pub fn clamp(&self, percentile: f64) -> f64 {
        percentile.clamp(self.min, self.max)
    }
}

/// Configuration for the focus classification pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Symmetric smoothing window size in samples
    pub smoothing_window: usize,
    /// Number of finalized points inspected for recovery detection
    pub recovery_lookback: usize,
    /// Active share of the lookback required for a recovery point
    pub recovery_active_fraction: f64,
    /// Idle share above which a window is Idle
    pub idle_fraction_threshold: f64,
    /// Timestamp delta (seconds) above which a gap marker is inserted
    pub gap_threshold_sec: f64,
    /// Idle-run span (seconds) above which the run is compressed
    pub idle_compression_sec: f64,
    /// Maximum number of downsampled display buckets
    pub max_buckets: usize,
    /// Activity score weights
    pub weights: ActivityWeights,
    /// Percentile used when none is supplied externally
    pub default_percentile: f64,
    /// Threshold used when the reference set is empty or degenerate
    pub threshold_floor: f64,
    /// Allowed range for an externally supplied percentile
    pub percentile_range: PercentileRange,
    /// Fixed tracker cadence, used for time aggregates
    pub sample_interval_sec: f64,
    /// Offset from UTC for hour-of-day aggregates
    pub utc_offset_sec: i32,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            recovery_lookback: DEFAULT_RECOVERY_LOOKBACK,
            recovery_active_fraction: DEFAULT_RECOVERY_ACTIVE_FRACTION,
            idle_fraction_threshold: DEFAULT_IDLE_FRACTION,
            gap_threshold_sec: DEFAULT_GAP_THRESHOLD_SEC,
            idle_compression_sec: DEFAULT_IDLE_COMPRESSION_SEC,
            max_buckets: DEFAULT_MAX_BUCKETS,
            weights: ActivityWeights::default(),
            default_percentile: DEFAULT_PERCENTILE,
            threshold_floor: DEFAULT_THRESHOLD_FLOOR,
            percentile_range: PercentileRange::default(),
            sample_interval_sec: DEFAULT_SAMPLE_INTERVAL_SEC,
            utc_offset_sec: 0,
        }
    }
}

impl FocusConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ComputeError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        if !value.is_object() {
            return Err(ComputeError::InvalidConfig(
                "config must be a JSON object".to_string(),
            ));
        }
        let config: FocusConfig = serde_json::from_value(value)
            .map_err(|e| ComputeError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that every parameter is usable by the pipeline
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.smoothing_window == 0 {
            return invalid("smoothing_window must be at least 1");
        }
        if self.recovery_lookback == 0 {
            return invalid("recovery_lookback must be at least 1");
        }
        if self.max_buckets == 0 {
            return invalid("max_buckets must be at least 1");
        }
        if !is_fraction(self.recovery_active_fraction) {
            return invalid("recovery_active_fraction must be in (0, 1]");
        }
        if !is_fraction(self.idle_fraction_threshold) {
            return invalid("idle_fraction_threshold must be in (0, 1]");
        }
        if !is_positive(self.gap_threshold_sec) {
            return invalid("gap_threshold_sec must be positive");
        }
        if !is_positive(self.idle_compression_sec) {
            return invalid("idle_compression_sec must be positive");
        }
        if !is_positive(self.threshold_floor) {
            return invalid("threshold_floor must be positive");
        }
        if !is_positive(self.sample_interval_sec) {
            return invalid("sample_interval_sec must be positive");
        }
        let w = &self.weights;
        if [w.keystrokes, w.clicks, w.scrolls]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return invalid("activity weights must be finite and non-negative");
        }
        if !(0.0..=100.0).contains(&self.default_percentile) {
            return invalid("default_percentile must be in [0, 100]");
        }
        let range = &self.percentile_range;
        if !(0.0..=100.0).contains(&range.min)
            || !(0.0..=100.0).contains(&range.max)
            || range.min > range.max
        {
            return invalid("percentile_range must satisfy 0 <= min <= max <= 100");
        }
        self.local_offset()?;
        Ok(())
    }

    /// Resolve the configured UTC offset
    pub fn local_offset(&self) -> Result<FixedOffset, ComputeError> {
        if self.utc_offset_sec.abs() >= MAX_UTC_OFFSET_SEC {
            return Err(ComputeError::InvalidTimezone(format!(
                "offset {}s is outside +/-24h",
                self.utc_offset_sec
            )));
        }
        FixedOffset::east_opt(self.utc_offset_sec).ok_or_else(|| {
            ComputeError::InvalidTimezone(format!("offset {}s", self.utc_offset_sec))
        })
    }
}

fn invalid(msg: &str) -> Result<(), ComputeError> {
    Err(ComputeError::InvalidConfig(msg.to_string()))
}

fn is_fraction(v: f64) -> bool {
    v > 0.0 && v <= 1.0
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}
