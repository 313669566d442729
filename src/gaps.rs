//! Time-gap markers and idle-run compression
//!
//! Gap markers are always inserted between real points that are too far
//! apart in time. Idle-run compression only runs on the display path and
//! collapses long idle stretches (overnight, lunch) into one marker.

use crate::config::FocusConfig;
use crate::types::{FocusState, PointMetrics, SubType, TimelinePoint};

/// Dominant app label of a time-gap marker
pub const GAP_MARKER_APP: &str = "System";

/// Dominant app label of a compressed idle run
pub const IDLE_RUN_APP: &str = "System Idle";

/// Display intensity of a compressed idle run
const IDLE_RUN_INTENSITY: f64 = 0.1;

/// Gap inserter
pub struct GapInserter;

impl GapInserter {
    /// Insert an IdleGap marker between consecutive points more than
    /// `gap_threshold_sec` apart. Real points are kept.
    pub fn insert_gap_markers(timeline: Vec<TimelinePoint>, config: &FocusConfig) -> Vec<TimelinePoint> {
        let mut with_gaps = Vec::with_capacity(timeline.len());
        let mut prev_timestamp: Option<f64> = None;

        for point in timeline {
            if let Some(prev) = prev_timestamp {
                let delta = point.timestamp - prev;
                if delta > config.gap_threshold_sec {
                    with_gaps.push(gap_marker(prev, delta));
                }
            }
            prev_timestamp = Some(point.timestamp);
            with_gaps.push(point);
        }

        with_gaps
    }

    /// Replace every maximal run of Idle points spanning more than
    /// `idle_compression_sec` with a single IdleGap marker.
    pub fn compress_idle_runs(timeline: Vec<TimelinePoint>, config: &FocusConfig) -> Vec<TimelinePoint> {
        let mut compressed = Vec::with_capacity(timeline.len());
        let mut run: Vec<TimelinePoint> = Vec::new();

        for point in timeline {
            if point.state == FocusState::Idle {
                run.push(point);
                continue;
            }
            flush_idle_run(&mut run, &mut compressed, config);
            compressed.push(point);
        }
        flush_idle_run(&mut run, &mut compressed, config);

        compressed
    }
}

fn flush_idle_run(run: &mut Vec<TimelinePoint>, out: &mut Vec<TimelinePoint>, config: &FocusConfig) {
    let (Some(first), Some(last)) = (run.first(), run.last()) else {
        return;
    };
    let start = first.timestamp;
    let end = last.timestamp;
    let span = end - start;

    if span > config.idle_compression_sec {
        out.push(TimelinePoint {
            timestamp: start,
            state: FocusState::IdleGap,
            sub_type: SubType::SystemIdle,
            intensity: IDLE_RUN_INTENSITY,
            dominant_app: IDLE_RUN_APP.to_string(),
            metrics: PointMetrics::default(),
            gap_duration: Some(span),
            gap_end_time: Some(end),
        });
        run.clear();
    } else {
        out.append(run);
    }
}

/// Marker at the (floored) midpoint of a time skip
fn gap_marker(prev_timestamp: f64, delta: f64) -> TimelinePoint {
    TimelinePoint {
        timestamp: prev_timestamp + (delta / 2.0).floor(),
        state: FocusState::IdleGap,
        sub_type: SubType::SystemOff,
        intensity: 0.0,
        dominant_app: GAP_MARKER_APP.to_string(),
        metrics: PointMetrics::default(),
        gap_duration: Some(delta),
        gap_end_time: None,
    }
}
