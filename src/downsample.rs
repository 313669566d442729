//! Display downsampling
//!
//! Reduces a processed timeline to a bounded number of bars.

use crate::tally::OrderedTally;
use crate::types::TimelinePoint;

/// Downsampler for display timelines
pub struct Downsampler;

impl Downsampler {
    /// Reduce `timeline` to at most `max_buckets` points.
    ///
    /// Bucket `i` covers `floor(i * len / B) .. floor((i + 1) * len / B)`.
    /// Each bucket keeps the timestamp, dominant app and metrics of its first
    /// member, the mean intensity, and the modal state (first seen wins ties).
    /// Timelines no longer than `max_buckets` are returned unchanged.
    pub fn downsample(timeline: Vec<TimelinePoint>, max_buckets: usize) -> Vec<TimelinePoint> {
        let len = timeline.len();
        if max_buckets == 0 || len <= max_buckets {
            return timeline;
        }

        let mut buckets = Vec::with_capacity(max_buckets);
        for i in 0..max_buckets {
            let start = i * len / max_buckets;
            let end = ((i + 1) * len / max_buckets).min(len);
            if start >= end {
                continue;
            }
            if let Some(point) = reduce_bucket(&timeline[start..end]) {
                buckets.push(point);
            }
        }
        buckets
    }
}

fn reduce_bucket(chunk: &[TimelinePoint]) -> Option<TimelinePoint> {
    let first = chunk.first()?;
    let states: OrderedTally<_> = chunk.iter().map(|p| p.state).collect();
    let state = *states.mode()?;
    let representative = chunk.iter().find(|p| p.state == state).unwrap_or(first);
    let intensity = chunk.iter().map(|p| p.intensity).sum::<f64>() / chunk.len() as f64;

    Some(TimelinePoint {
        timestamp: first.timestamp,
        state,
        sub_type: representative.sub_type,
        intensity,
        dominant_app: first.dominant_app.clone(),
        metrics: first.metrics,
        gap_duration: representative.gap_duration,
        gap_end_time: representative.gap_end_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FocusState, PointMetrics, SubType};
    use pretty_assertions::assert_eq;

    fn point(ts: f64, state: FocusState, intensity: f64) -> TimelinePoint {
        TimelinePoint {
            timestamp: ts,
            state,
            sub_type: match state {
                FocusState::FocusPeak => SubType::DeepWork,
                FocusState::DriftZone => SubType::Passive,
                _ => SubType::Generic,
            },
            intensity,
            dominant_app: format!("app-{}", ts as u32),
            metrics: PointMetrics { keys: ts as u32, clicks: 0, scrolls: 0 },
            gap_duration: None,
            gap_end_time: None,
        }
    }

    #[test]
    fn test_short_timeline_passes_through() {
        let timeline: Vec<_> = (0..120).map(|i| point(i as f64, FocusState::Idle, 0.0)).collect();
        let result = Downsampler::downsample(timeline.clone(), 120);
        assert_eq!(result, timeline);
    }

    #[test]
    fn test_bucket_count_bounded() {
        for len in [121usize, 250, 1000, 17_281] {
            let timeline: Vec<_> = (0..len).map(|i| point(i as f64, FocusState::FocusPeak, 0.5)).collect();
            let result = Downsampler::downsample(timeline, 120);
            assert!(result.len() <= 120);
            assert_eq!(result.len(), 120);
        }
    }

    #[test]
    fn test_bucket_reduction() {
        // 6 points into 3 buckets of 2
        let timeline = vec![
            point(0.0, FocusState::FocusPeak, 0.2),
            point(1.0, FocusState::DriftZone, 0.4),
            point(2.0, FocusState::DriftZone, 1.0),
            point(3.0, FocusState::DriftZone, 0.0),
            point(4.0, FocusState::Idle, 0.0),
            point(5.0, FocusState::FocusPeak, 0.6),
        ];
        let result = Downsampler::downsample(timeline, 3);
        assert_eq!(result.len(), 3);

        // Tie between Focus Peak and Drift Zone goes to the first seen
        assert_eq!(result[0].state, FocusState::FocusPeak);
        assert_eq!(result[0].timestamp, 0.0);
        assert!((result[0].intensity - 0.3).abs() < 1e-9);
        assert_eq!(result[0].dominant_app, "app-0");

        assert_eq!(result[1].state, FocusState::DriftZone);
        assert!((result[1].intensity - 0.5).abs() < 1e-9);

        assert_eq!(result[2].state, FocusState::Idle);
        assert_eq!(result[2].sub_type, SubType::Generic);
        assert_eq!(result[2].metrics.keys, 4);
    }

    #[test]
    fn test_sub_type_follows_modal_state() {
        let timeline = vec![
            point(0.0, FocusState::Idle, 0.0),
            point(1.0, FocusState::DriftZone, 0.0),
            point(2.0, FocusState::DriftZone, 0.0),
            point(3.0, FocusState::Idle, 0.0),
        ];
        let result = Downsampler::downsample(timeline, 1);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].state, FocusState::Idle);

        let timeline = vec![
            point(0.0, FocusState::Idle, 0.0),
            point(1.0, FocusState::DriftZone, 0.0),
            point(2.0, FocusState::DriftZone, 0.0),
        ];
        let result = Downsampler::downsample(timeline, 1);
        assert_eq!(result[0].state, FocusState::DriftZone);
        assert_eq!(result[0].sub_type, SubType::Passive);
        assert_eq!(result[0].timestamp, 0.0);
    }

    #[test]
    fn test_fractional_bucket_widths() {
        let timeline: Vec<_> = (0..7).map(|i| point(i as f64, FocusState::FocusPeak, 0.0)).collect();
        let result = Downsampler::downsample(timeline, 3);
        // Ranges: [0,2), [2,4), [4,7)
        let starts: Vec<f64> = result.iter().map(|p| p.timestamp).collect();
        assert_eq!(starts, vec![0.0, 2.0, 4.0]);
    }
}
