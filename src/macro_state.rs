//! Windowed macro classification
//!
//! Every sample gets a focus state derived from a symmetric, sample-count
//! window of its neighbours, compared against the calibrated threshold.
//! Idle windows that close a sustained active stretch become recovery points.
//!
//! Recovery detection reads the states already assigned to earlier indices,
//! so assignment runs strictly left to right over the accumulated timeline.

use crate::config::FocusConfig;
use crate::tally::OrderedTally;
use crate::types::{
    FocusState, FocusThreshold, IntervalSample, MicroState, MicroStateKind, PointMetrics, SubType,
    TimelinePoint, UNKNOWN_APP,
};

/// Light focus starts at this share of the focus threshold
const LIGHT_FOCUS_RATIO: f64 = 0.5;

/// Average window switches above which low activity is fragmented drift
const FRAGMENTED_AVG_SWITCHES: f64 = 2.0;

/// Aggregates over one smoothing window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats<'a> {
    pub avg_switches: f64,
    pub idle_fraction: f64,
    pub avg_activity: f64,
    /// Modal active window; first seen wins ties
    pub dominant_app: &'a str,
}

/// Prefix sums over the numeric window inputs
struct PrefixSums {
    switches: Vec<f64>,
    idle: Vec<usize>,
    activity: Vec<f64>,
}

impl PrefixSums {
    fn build(samples: &[IntervalSample], micro: &[MicroState]) -> Self {
        let n = samples.len().min(micro.len());
        let mut switches = Vec::with_capacity(n + 1);
        let mut idle = Vec::with_capacity(n + 1);
        let mut activity = Vec::with_capacity(n + 1);
        switches.push(0.0);
        idle.push(0);
        activity.push(0.0);

        for (sample, state) in samples.iter().zip(micro).take(n) {
            let last = switches.len() - 1;
            switches.push(switches[last] + sample.window_switches as f64);
            idle.push(idle[last] + usize::from(state.kind == MicroStateKind::Idle));
            activity.push(activity[last] + state.activity_score);
        }

        Self {
            switches,
            idle,
            activity,
        }
    }
}

/// Macro classifier bound to one configuration and threshold
pub struct MacroClassifier<'c> {
    config: &'c FocusConfig,
    threshold: FocusThreshold,
}

impl<'c> MacroClassifier<'c> {
    pub fn new(config: &'c FocusConfig, threshold: FocusThreshold) -> Self {
        Self { config, threshold }
    }

    /// Classify a micro-state sequence into timeline points.
    ///
    /// Output has exactly one point per input sample, in input order.
    pub fn classify(&self, samples: &[IntervalSample], micro: &[MicroState]) -> Vec<TimelinePoint> {
        debug_assert_eq!(samples.len(), micro.len());
        let n = samples.len().min(micro.len());
        let prefix = PrefixSums::build(samples, micro);
        let half = self.config.smoothing_window / 2;

        let mut timeline: Vec<TimelinePoint> = Vec::with_capacity(n);
        // active_before[i] = active points among timeline[..i]
        let mut active_before: Vec<usize> = Vec::with_capacity(n + 1);
        active_before.push(0);

        for i in 0..n {
            let start = i.saturating_sub(half);
            let end = (i + half).min(n);
            let stats = window_stats(samples, &prefix, start, end);

            let (mut state, mut sub_type) = self.assign(&stats);
            if state == FocusState::Idle && self.is_recovery(i, &active_before) {
                state = FocusState::RecoveryPoint;
                sub_type = SubType::Recharge;
            }

            let sample = &samples[i];
            timeline.push(TimelinePoint {
                timestamp: sample.timestamp,
                state,
                sub_type,
                intensity: micro[i].intensity,
                dominant_app: stats.dominant_app.to_string(),
                metrics: PointMetrics::from(sample),
                gap_duration: None,
                gap_end_time: None,
            });
            active_before.push(active_before[i] + usize::from(state.is_active()));
        }

        timeline
    }

    /// Threshold classification of one window. First match wins.
    pub fn assign(&self, stats: &WindowStats<'_>) -> (FocusState, SubType) {
        let threshold = self.threshold.value();
        if stats.idle_fraction > self.config.idle_fraction_threshold {
            (FocusState::Idle, SubType::Generic)
        } else if stats.avg_activity >= threshold {
            (FocusState::FocusPeak, SubType::DeepWork)
        } else if stats.avg_activity >= threshold * LIGHT_FOCUS_RATIO {
            (FocusState::LightFocus, SubType::ActiveWork)
        } else if stats.avg_switches > FRAGMENTED_AVG_SWITCHES {
            (FocusState::DriftZone, SubType::Fragmented)
        } else {
            (FocusState::DriftZone, SubType::Passive)
        }
    }

    /// Whether idle index `i` closes a sufficiently active lookback.
    ///
    /// Only finalized points `[i - lookback, i)` are inspected; nothing is
    /// detected at or before index `lookback`.
    fn is_recovery(&self, i: usize, active_before: &[usize]) -> bool {
        let lookback = self.config.recovery_lookback;
        if i <= lookback {
            return false;
        }
        let active = active_before[i] - active_before[i - lookback];
        // Ratio form: exactly the active share is not more than it
        active as f64 / lookback as f64 > self.config.recovery_active_fraction
    }
}

/// Aggregates over `samples[start..end]`; empty windows average to zero
fn window_stats<'a>(
    samples: &'a [IntervalSample],
    prefix: &PrefixSums,
    start: usize,
    end: usize,
) -> WindowStats<'a> {
    let len = end.saturating_sub(start).max(1) as f64;
    let end = end.max(start);

    let apps: OrderedTally<&str> = samples[start..end]
        .iter()
        .map(|s| s.active_window.as_str())
        .filter(|app| !app.is_empty())
        .collect();

    WindowStats {
        avg_switches: (prefix.switches[end] - prefix.switches[start]) / len,
        idle_fraction: (prefix.idle[end] - prefix.idle[start]) as f64 / len,
        avg_activity: (prefix.activity[end] - prefix.activity[start]) / len,
        dominant_app: apps.mode().copied().unwrap_or(UNKNOWN_APP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::micro::MicroClassifier;

    fn active(ts: f64, keys: u32, app: &str) -> IntervalSample {
        IntervalSample {
            keystrokes: keys,
            active_window: app.to_string(),
            ..IntervalSample::at(ts)
        }
    }

    fn idle(ts: f64) -> IntervalSample {
        IntervalSample {
            is_idle: true,
            ..IntervalSample::at(ts)
        }
    }

    fn classify(samples: &[IntervalSample], config: &FocusConfig, threshold: f64) -> Vec<TimelinePoint> {
        let micro = MicroClassifier::classify_all(samples, &config.weights);
        MacroClassifier::new(config, FocusThreshold::new(threshold, config.threshold_floor))
            .classify(samples, &micro)
    }

    #[test]
    fn test_cardinality_preserved() {
        let config = FocusConfig::default();
        let samples: Vec<_> = (0..250).map(|i| active(i as f64 * 5.0, (i % 13) as u32, "Code")).collect();
        assert_eq!(classify(&samples, &config, 5.0).len(), 250);
        assert!(classify(&[], &config, 5.0).is_empty());
    }

    #[test]
    fn test_high_activity_is_focus_peak() {
        let config = FocusConfig::default();
        let samples: Vec<_> = (0..10).map(|i| active(i as f64 * 5.0, 20, "Code")).collect();
        let timeline = classify(&samples, &config, 5.0);
        assert!(timeline.iter().all(|p| p.state == FocusState::FocusPeak));
        assert!(timeline.iter().all(|p| p.sub_type == SubType::DeepWork));
        assert_eq!(timeline[0].dominant_app, "Code");
        assert_eq!(timeline[3].metrics.keys, 20);
    }

    #[test]
    fn test_light_focus_band() {
        let config = FocusConfig::default();
        let samples: Vec<_> = (0..10).map(|i| active(i as f64 * 5.0, 3, "Code")).collect();
        let timeline = classify(&samples, &config, 5.0);
        assert!(timeline.iter().all(|p| p.state == FocusState::LightFocus));
    }

    #[test]
    fn test_drift_sub_types() {
        let config = FocusConfig::default();
        let passive: Vec<_> = (0..10).map(|i| active(i as f64 * 5.0, 0, "Chrome")).collect();
        let timeline = classify(&passive, &config, 5.0);
        assert!(timeline.iter().all(|p| p.sub_type == SubType::Passive));

        let fragmented: Vec<_> = (0..10)
            .map(|i| IntervalSample {
                window_switches: 3,
                ..active(i as f64 * 5.0, 0, "Chrome")
            })
            .collect();
        let timeline = classify(&fragmented, &config, 5.0);
        assert!(timeline
            .iter()
            .all(|p| p.state == FocusState::DriftZone && p.sub_type == SubType::Fragmented));
    }

    #[test]
    fn test_idle_requires_more_than_idle_fraction() {
        let config = FocusConfig {
            smoothing_window: 10,
            ..FocusConfig::default()
        };
        // Window at i=5 is [0, 10): 8 idle out of 10 is not > 0.8
        let mut samples: Vec<_> = (0..8).map(|i| idle(i as f64 * 5.0)).collect();
        samples.extend((8..10).map(|i| active(i as f64 * 5.0, 0, "Chrome")));
        let timeline = classify(&samples, &config, 5.0);
        assert_ne!(timeline[5].state, FocusState::Idle);
        assert_eq!(timeline[0].state, FocusState::Idle);
    }

    #[test]
    fn test_window_bounds_clamp() {
        let config = FocusConfig::default();
        let samples = vec![active(0.0, 10, "Code")];
        let timeline = classify(&samples, &config, 5.0);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].state, FocusState::FocusPeak);
    }

    #[test]
    fn test_window_of_one_is_empty_and_degrades() {
        let config = FocusConfig {
            smoothing_window: 1,
            ..FocusConfig::default()
        };
        let samples = vec![active(0.0, 10, "Code"), active(5.0, 10, "Code")];
        let timeline = classify(&samples, &config, 5.0);
        assert!(timeline.iter().all(|p| p.state == FocusState::DriftZone));
        assert!(timeline.iter().all(|p| p.dominant_app == "Unknown"));
    }

    #[test]
    fn test_dominant_app_first_seen_tie_break() {
        let config = FocusConfig {
            smoothing_window: 8,
            ..FocusConfig::default()
        };
        let apps = ["Slack", "Code", "Code", "Slack"];
        let samples: Vec<_> = apps
            .iter()
            .enumerate()
            .map(|(i, app)| active(i as f64 * 5.0, 10, app))
            .collect();
        let timeline = classify(&samples, &config, 5.0);
        // Window for i=0 is [0, 4): Slack and Code tie at 2, Slack seen first
        assert_eq!(timeline[0].dominant_app, "Slack");

        let reordered: Vec<_> = ["Code", "Slack", "Slack", "Code"]
            .iter()
            .enumerate()
            .map(|(i, app)| active(i as f64 * 5.0, 10, app))
            .collect();
        let timeline = classify(&reordered, &config, 5.0);
        assert_eq!(timeline[0].dominant_app, "Code");
    }

    #[test]
    fn test_blank_labels_ignored_for_dominant_app() {
        let config = FocusConfig::default();
        let samples = vec![active(0.0, 10, ""), active(5.0, 10, ""), active(10.0, 10, "Figma")];
        let timeline = classify(&samples, &config, 5.0);
        assert_eq!(timeline[0].dominant_app, "Figma");
    }

    fn focus_then_idle(active_len: usize, idle_len: usize) -> Vec<IntervalSample> {
        let mut samples: Vec<_> = (0..active_len)
            .map(|i| active(i as f64 * 5.0, 20, "Code"))
            .collect();
        samples.extend((active_len..active_len + idle_len).map(|i| idle(i as f64 * 5.0)));
        samples
    }

    /// Two-sample windows where a single idle sample already reads as Idle
    fn recovery_config() -> FocusConfig {
        FocusConfig {
            smoothing_window: 2,
            idle_fraction_threshold: 0.4,
            ..FocusConfig::default()
        }
    }

    #[test]
    fn test_recovery_point_after_sustained_work() {
        let config = recovery_config();
        let samples = focus_then_idle(200, 10);
        let timeline = classify(&samples, &config, 5.0);
        assert_eq!(timeline[199].state, FocusState::FocusPeak);
        assert_eq!(timeline[200].state, FocusState::RecoveryPoint);
        assert_eq!(timeline[200].sub_type, SubType::Recharge);
    }

    #[test]
    fn test_recovery_decays_as_lookback_fills_with_rest() {
        let config = recovery_config();
        let samples = focus_then_idle(200, 120);
        let timeline = classify(&samples, &config, 5.0);
        // At i = 200 + k the lookback holds 180 - k active points; recovery
        // points are not active, so recovery ends once k >= 54
        assert_eq!(timeline[253].state, FocusState::RecoveryPoint);
        assert_eq!(timeline[254].state, FocusState::Idle);
        assert_eq!(timeline[319].state, FocusState::Idle);
    }

    #[test]
    fn test_no_recovery_within_first_lookback() {
        let config = recovery_config();
        let samples = focus_then_idle(180, 5);
        let timeline = classify(&samples, &config, 5.0);
        // Index 180 has a fully active lookback but is not past it
        assert_eq!(timeline[180].state, FocusState::Idle);
        assert!(timeline[..=180]
            .iter()
            .all(|p| p.state != FocusState::RecoveryPoint));
        assert_eq!(timeline[181].state, FocusState::RecoveryPoint);
    }

    fn idle_then_focus_then_idle(idle_len: usize) -> Vec<IntervalSample> {
        let mut samples: Vec<_> = (0..idle_len).map(|i| idle(i as f64 * 5.0)).collect();
        samples.extend((idle_len..180).map(|i| active(i as f64 * 5.0, 20, "Code")));
        samples.push(idle(180.0 * 5.0));
        samples.push(idle(181.0 * 5.0));
        samples
    }

    #[test]
    fn test_recovery_needs_more_than_active_share() {
        let config = recovery_config();
        // Lookback [1, 181) at i = 181 holds exactly 126 active points (70% of 180)
        let timeline = classify(&idle_then_focus_then_idle(53), &config, 5.0);
        assert_eq!(timeline[181].state, FocusState::Idle);

        // One more active point tips it over
        let timeline = classify(&idle_then_focus_then_idle(52), &config, 5.0);
        assert_eq!(timeline[181].state, FocusState::RecoveryPoint);
    }

    #[test]
    fn test_recovery_share_boundary_is_exact_for_default_fraction() {
        let config = recovery_config();
        assert_eq!(config.recovery_lookback, 180);
        assert_eq!(config.recovery_active_fraction, 0.7);

        let samples = idle_then_focus_then_idle(53);
        // The first focus sample still smooths to Idle
        let active = samples[1..181].iter().filter(|s| !s.is_idle).count();
        assert_eq!(active, 127);

        let timeline = classify(&samples, &config, 5.0);
        let finalized_active = timeline[1..181].iter().filter(|p| p.state.is_active()).count();
        assert_eq!(finalized_active, 126);
        assert_eq!(timeline[181].state, FocusState::Idle);
    }
}
