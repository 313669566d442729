//! Structured daily summaries
//!
//! Counts, activity percentiles, state blocks and compressed app sessions
//! handed to the external text generator and the percentile calibration
//! service.

use crate::config::ActivityWeights;
use crate::gaps::GAP_MARKER_APP;
use crate::micro::activity_score;
use crate::tally::OrderedTally;
use crate::types::{
    ActivityDistribution, AppSession, DailySummary, FocusState, IntervalSample, StateBlock, TimelinePoint,
    VisualContext, UNKNOWN_APP,
};
use std::collections::HashMap;

/// Samples needed before the distribution is worth calibrating against
const MIN_CALIBRATION_SAMPLES: u32 = 10;

/// Percentile proposed while history is too short
const FALLBACK_PERCENTILE: f64 = 75.0;

/// Runs must last strictly longer than this to become a block
const MIN_BLOCK_SEC: f64 = 600.0;

/// Lag behind the expected next sample time that splits a session
const SESSION_BREAK_SEC: f64 = 300.0;

/// Apps with fewer unweighted inputs over the day are folded into "System"
const MIN_APP_ACTIONS: u64 = 10;

/// Passive-consumption apps kept by name regardless of input volume
const MEDIA_KEYWORDS: [&str; 6] = ["youtube", "netflix", "vlc", "spotify", "twitch", "player"];

impl DailySummary {
    /// Count states over a classified timeline
    pub fn from_timeline(timeline: &[TimelinePoint]) -> Self {
        let mut summary = DailySummary {
            total_intervals: 0,
            focus_peak_intervals: 0,
            light_focus_intervals: 0,
            drift_intervals: 0,
            recovery_points: 0,
            idle_intervals: 0,
            gap_markers: 0,
            dominant_focus_app: UNKNOWN_APP.to_string(),
        };
        let mut focus_apps: OrderedTally<&str> = OrderedTally::new();

        for point in timeline {
            if point.is_synthetic() {
                summary.gap_markers += 1;
                continue;
            }
            summary.total_intervals += 1;
            match point.state {
                FocusState::FocusPeak => {
                    summary.focus_peak_intervals += 1;
                    focus_apps.add(point.dominant_app.as_str());
                }
                FocusState::LightFocus => summary.light_focus_intervals += 1,
                FocusState::DriftZone => summary.drift_intervals += 1,
                FocusState::RecoveryPoint => summary.recovery_points += 1,
                FocusState::Idle => summary.idle_intervals += 1,
                FocusState::IdleGap => {}
            }
        }

        if let Some(app) = focus_apps.mode() {
            summary.dominant_focus_app = app.to_string();
        }
        summary
    }
}

impl ActivityDistribution {
    /// Score percentiles over all samples, idle ones included
    pub fn from_samples(samples: &[IntervalSample], weights: &ActivityWeights) -> Self {
        let mut scores: Vec<f64> = samples.iter().map(|s| activity_score(s, weights)).collect();
        scores.sort_by(|a, b| b.total_cmp(a));

        let n = scores.len();
        let at = |min_len: usize, fraction: f64| {
            if n > min_len {
                scores[(n as f64 * fraction).floor() as usize]
            } else {
                0.0
            }
        };

        ActivityDistribution {
            total_intervals: n as u32,
            max_activity: scores.first().copied().unwrap_or(0.0),
            p75_activity: at(1, 0.25),
            p50_activity: at(2, 0.5),
            p25_activity: at(4, 0.75),
            proposed_default_percentile: (n < MIN_CALIBRATION_SAMPLES as usize).then_some(FALLBACK_PERCENTILE),
        }
    }

    /// Whether enough samples exist to propose a calibrated percentile
    pub fn has_enough_data(&self) -> bool {
        self.total_intervals >= MIN_CALIBRATION_SAMPLES
    }
}

impl VisualContext {
    /// Collapse a timeline into state runs longer than ten minutes.
    ///
    /// A run closes at the timestamp of the first point in a different
    /// state; the trailing run never closes and is not reported.
    pub fn from_timeline(timeline: &[TimelinePoint]) -> Self {
        let mut blocks = Vec::new();
        if let Some(first) = timeline.first() {
            let mut state = first.state;
            let mut start = first.timestamp;
            for point in &timeline[1..] {
                if point.state == state {
                    continue;
                }
                let elapsed = point.timestamp - start;
                if elapsed > MIN_BLOCK_SEC {
                    blocks.push(StateBlock {
                        state,
                        start_time: start,
                        end_time: point.timestamp,
                        duration_minutes: elapsed / 60.0,
                    });
                }
                state = point.state;
                start = point.timestamp;
            }
        }

        VisualContext {
            blocks,
            recovery_points: timeline
                .iter()
                .filter(|p| p.state == FocusState::RecoveryPoint)
                .count() as u32,
        }
    }
}

fn raw_actions(sample: &IntervalSample) -> u64 {
    sample.keystrokes as u64 + sample.mouse_clicks as u64 + sample.mouse_scrolls as u64
}

fn is_media_app(app: &str) -> bool {
    let lower = app.to_lowercase();
    MEDIA_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Compress samples into sessions of one app and idle flag.
///
/// A session also ends when a sample arrives `SESSION_BREAK_SEC` or more
/// after the time its predecessors account for at `interval_sec` each.
pub fn app_sessions(samples: &[IntervalSample], interval_sec: f64) -> Vec<AppSession> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for sample in samples {
        *totals.entry(sample.active_window.as_str()).or_insert(0) += raw_actions(sample);
    }

    let label = |sample: &IntervalSample| -> String {
        let app = sample.active_window.as_str();
        let quiet = totals.get(app).copied().unwrap_or(0) < MIN_APP_ACTIONS;
        if quiet && !sample.is_idle && !is_media_app(app) {
            GAP_MARKER_APP.to_string()
        } else {
            app.to_string()
        }
    };

    let mut sessions = Vec::new();
    let mut current: Option<(AppSession, u64)> = None;

    for sample in samples {
        let app = label(sample);
        let actions = raw_actions(sample);

        if let Some((session, sum)) = current.as_mut() {
            let expected = session.start_time + session.sample_count as f64 * interval_sec;
            let same = session.app == app && session.is_idle == sample.is_idle;
            if same && sample.timestamp - expected < SESSION_BREAK_SEC {
                session.sample_count += 1;
                *sum += actions;
                continue;
            }
        }

        if let Some((session, sum)) = current.take() {
            sessions.push(close_session(session, sum, interval_sec));
        }
        current = Some((
            AppSession {
                app,
                is_idle: sample.is_idle,
                start_time: sample.timestamp,
                end_time: sample.timestamp,
                sample_count: 1,
                avg_activity: 0.0,
            },
            actions,
        ));
    }

    if let Some((session, sum)) = current {
        sessions.push(close_session(session, sum, interval_sec));
    }
    sessions
}

fn close_session(mut session: AppSession, sum: u64, interval_sec: f64) -> AppSession {
    session.end_time = session.start_time + session.sample_count as f64 * interval_sec;
    session.avg_activity = sum as f64 / session.sample_count as f64;
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PointMetrics, SubType};
    use pretty_assertions::assert_eq;

    fn point(state: FocusState, app: &str) -> TimelinePoint {
        TimelinePoint {
            timestamp: 0.0,
            state,
            sub_type: SubType::Generic,
            intensity: 0.0,
            dominant_app: app.to_string(),
            metrics: PointMetrics::default(),
            gap_duration: None,
            gap_end_time: None,
        }
    }

    #[test]
    fn test_daily_summary_counts() {
        let timeline = vec![
            point(FocusState::FocusPeak, "Slack"),
            point(FocusState::FocusPeak, "Code"),
            point(FocusState::FocusPeak, "Code"),
            point(FocusState::LightFocus, "Code"),
            point(FocusState::DriftZone, "Chrome"),
            point(FocusState::Idle, "Unknown"),
            point(FocusState::RecoveryPoint, "Unknown"),
            point(FocusState::IdleGap, "System"),
        ];
        let summary = DailySummary::from_timeline(&timeline);
        assert_eq!(
            summary,
            DailySummary {
                total_intervals: 7,
                focus_peak_intervals: 3,
                light_focus_intervals: 1,
                drift_intervals: 1,
                recovery_points: 1,
                idle_intervals: 1,
                gap_markers: 1,
                dominant_focus_app: "Code".to_string(),
            }
        );
    }

    #[test]
    fn test_daily_summary_without_focus() {
        let summary = DailySummary::from_timeline(&[point(FocusState::DriftZone, "Chrome")]);
        assert_eq!(summary.dominant_focus_app, "Unknown");
    }

    #[test]
    fn test_activity_distribution_percentiles() {
        let weights = ActivityWeights::default();
        let samples: Vec<IntervalSample> = (1..=8)
            .map(|k| IntervalSample {
                keystrokes: k,
                ..IntervalSample::at(k as f64)
            })
            .collect();
        // Descending scores: 8 7 6 5 4 3 2 1
        let dist = ActivityDistribution::from_samples(&samples, &weights);
        assert_eq!(dist.total_intervals, 8);
        assert_eq!(dist.max_activity, 8.0);
        assert_eq!(dist.p75_activity, 6.0);
        assert_eq!(dist.p50_activity, 4.0);
        assert_eq!(dist.p25_activity, 2.0);
        assert!(!dist.has_enough_data());
    }

    #[test]
    fn test_activity_distribution_small_sets() {
        let weights = ActivityWeights::default();
        let empty = ActivityDistribution::from_samples(&[], &weights);
        assert_eq!(empty.max_activity, 0.0);
        assert_eq!(empty.p75_activity, 0.0);

        let two = vec![
            IntervalSample { keystrokes: 4, ..IntervalSample::at(0.0) },
            IntervalSample { keystrokes: 2, ..IntervalSample::at(1.0) },
        ];
        let dist = ActivityDistribution::from_samples(&two, &weights);
        assert_eq!(dist.p75_activity, 4.0);
        assert_eq!(dist.p50_activity, 0.0);
        assert_eq!(dist.p25_activity, 0.0);
    }

    #[test]
    fn test_short_history_proposes_fallback_percentile() {
        let weights = ActivityWeights::default();
        let samples: Vec<IntervalSample> = (0..10).map(|k| IntervalSample::at(k as f64)).collect();

        assert_eq!(ActivityDistribution::from_samples(&[], &weights).proposed_default_percentile, Some(75.0));
        let nine = ActivityDistribution::from_samples(&samples[..9], &weights);
        assert_eq!(nine.proposed_default_percentile, Some(75.0));
        assert!(!nine.has_enough_data());

        let ten = ActivityDistribution::from_samples(&samples, &weights);
        assert_eq!(ten.proposed_default_percentile, None);
        assert!(ten.has_enough_data());
    }

    fn at(state: FocusState, timestamp: f64) -> TimelinePoint {
        TimelinePoint {
            timestamp,
            ..point(state, "Code")
        }
    }

    #[test]
    fn test_visual_context_keeps_runs_over_ten_minutes() {
        let timeline = vec![
            at(FocusState::FocusPeak, 0.0),
            at(FocusState::FocusPeak, 300.0),
            // Exactly ten minutes: dropped
            at(FocusState::DriftZone, 605.0),
            at(FocusState::RecoveryPoint, 1205.0),
            at(FocusState::Idle, 1210.0),
            // Trailing run never closes
            at(FocusState::FocusPeak, 2000.0),
            at(FocusState::FocusPeak, 9000.0),
        ];
        let context = VisualContext::from_timeline(&timeline);
        assert_eq!(
            context.blocks,
            vec![
                StateBlock {
                    state: FocusState::FocusPeak,
                    start_time: 0.0,
                    end_time: 605.0,
                    duration_minutes: 605.0 / 60.0,
                },
                StateBlock {
                    state: FocusState::Idle,
                    start_time: 1210.0,
                    end_time: 2000.0,
                    duration_minutes: 790.0 / 60.0,
                },
            ]
        );
        assert_eq!(context.recovery_points, 1);
    }

    #[test]
    fn test_visual_context_of_empty_timeline() {
        let context = VisualContext::from_timeline(&[]);
        assert!(context.blocks.is_empty());
        assert_eq!(context.recovery_points, 0);
    }

    fn sample(timestamp: f64, app: &str, keystrokes: u32) -> IntervalSample {
        IntervalSample {
            keystrokes,
            active_window: app.to_string(),
            ..IntervalSample::at(timestamp)
        }
    }

    #[test]
    fn test_app_sessions_group_consecutive_samples() {
        let samples = vec![
            sample(0.0, "Code", 4),
            sample(5.0, "Code", 6),
            sample(10.0, "Chrome", 12),
            sample(15.0, "Code", 2),
        ];
        let sessions = app_sessions(&samples, 5.0);
        let shape: Vec<(&str, f64, f64, u32)> = sessions
            .iter()
            .map(|s| (s.app.as_str(), s.start_time, s.end_time, s.sample_count))
            .collect();
        assert_eq!(
            shape,
            vec![("Code", 0.0, 10.0, 2), ("Chrome", 10.0, 15.0, 1), ("Code", 15.0, 20.0, 1)]
        );
        assert_eq!(sessions[0].avg_activity, 5.0);
        assert_eq!(sessions[1].avg_activity, 12.0);
    }

    #[test]
    fn test_app_sessions_split_on_idle_flag_and_time_gap() {
        let mut idle = sample(10.0, "Code", 0);
        idle.is_idle = true;
        let samples = vec![
            sample(0.0, "Code", 10),
            sample(5.0, "Code", 10),
            idle,
            // Session starting at 15 accounts for 15..20; 319 lags by 299
            sample(15.0, "Code", 10),
            sample(319.0, "Code", 10),
            // Accounts for 15..25; 325 lags by exactly 300
            sample(325.0, "Code", 10),
        ];
        let sessions = app_sessions(&samples, 5.0);
        let shape: Vec<(bool, f64, u32)> = sessions
            .iter()
            .map(|s| (s.is_idle, s.start_time, s.sample_count))
            .collect();
        assert_eq!(shape, vec![(false, 0.0, 2), (true, 10.0, 1), (false, 15.0, 2), (false, 325.0, 1)]);
    }

    #[test]
    fn test_app_sessions_fold_quiet_apps_into_system() {
        let mut idle = sample(15.0, "Finder", 0);
        idle.is_idle = true;
        let samples = vec![
            sample(0.0, "Code", 20),
            sample(5.0, "Finder", 3),
            sample(10.0, "VLC Media Player", 0),
            idle,
            sample(20.0, "Notes", 9),
        ];
        let apps: Vec<String> = app_sessions(&samples, 5.0).into_iter().map(|s| s.app).collect();
        assert_eq!(apps, vec!["Code", "System", "VLC Media Player", "Finder", "System"]);
    }

    #[test]
    fn test_app_sessions_of_no_samples() {
        assert!(app_sessions(&[], 5.0).is_empty());
    }
}
