//! Replay segmentation
//!
//! Run-length encodes a timeline into segments for the day-replay animation.
//!
//! Segment intensity folds each new point in as `(avg + value) / 2`, which
//! weights recent points more heavily than a true mean. Consumers rely on
//! this exact behavior.

use crate::types::{FocusState, ReplaySegment, TimelinePoint};

/// Replay segmenter
pub struct ReplaySegmenter;

impl ReplaySegmenter {
    /// Segment `timeline` into maximal runs of equal state and flag the peak moment
    pub fn segment(timeline: &[TimelinePoint]) -> Vec<ReplaySegment> {
        let mut segments: Vec<ReplaySegment> = Vec::new();

        for point in timeline {
            match segments.last_mut() {
                Some(current) if current.state == point.state => {
                    current.end_time = point.timestamp;
                    current.intensity = (current.intensity + point.intensity) / 2.0;
                    current.point_count += 1;
                }
                _ => segments.push(ReplaySegment {
                    state: point.state,
                    start_time: point.timestamp,
                    end_time: point.timestamp,
                    intensity: point.intensity,
                    dominant_app: point.dominant_app.clone(),
                    metrics: point.metrics,
                    point_count: 1,
                    is_peak_moment: false,
                }),
            }
        }

        if let Some(peak) = peak_index(&segments) {
            segments[peak].is_peak_moment = true;
        }
        segments
    }
}

/// First Focus Peak segment with the highest intensity
fn peak_index(segments: &[ReplaySegment]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, segment) in segments.iter().enumerate() {
        if segment.state != FocusState::FocusPeak {
            continue;
        }
        match best {
            Some((_, intensity)) if segment.intensity <= intensity => {}
            _ => best = Some((i, segment.intensity)),
        }
    }
    best.map(|(i, _)| i)
}
