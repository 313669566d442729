//! Payload encoding
//!
//! Wraps pipeline outputs in versioned envelopes carrying producer metadata
//! and the computation time, ready for the external serving layer.

use crate::error::ComputeError;
use crate::types::{
    ClassifiedTimeline, FocusProducer, PassportPayload, PassportReport, ReplayPayload,
    ReplaySegment, SummaryPayload, SummaryReport, TimelinePayload,
};
use crate::{FLUX_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// Current payload schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Encoder for focus payloads
pub struct FocusEncoder {
    instance_id: String,
}

impl Default for FocusEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    fn producer(&self) -> FocusProducer {
        FocusProducer {
            name: PRODUCER_NAME.to_string(),
            version: FLUX_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// Encode a timeline; `max_buckets` echoes the display bound in effect
    pub fn encode_timeline(&self, timeline: ClassifiedTimeline, max_buckets: usize) -> TimelinePayload {
        TimelinePayload {
            schema_version: SCHEMA_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            threshold: timeline.threshold.value(),
            max_buckets,
            source_points: timeline.source_points,
            display_points: timeline.points.len(),
            timeline: timeline.points,
        }
    }

    pub fn encode_replay(&self, segments: Vec<ReplaySegment>) -> ReplayPayload {
        ReplayPayload {
            schema_version: SCHEMA_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            replay_segments: segments,
        }
    }

    pub fn encode_passport(&self, passport: Option<PassportReport>) -> PassportPayload {
        PassportPayload {
            schema_version: SCHEMA_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            passport,
        }
    }

    pub fn encode_summary(&self, report: SummaryReport) -> SummaryPayload {
        SummaryPayload {
            schema_version: SCHEMA_VERSION.to_string(),
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            report,
        }
    }

    /// Encode a timeline to a JSON string
    pub fn encode_timeline_to_json(
        &self,
        timeline: ClassifiedTimeline,
        max_buckets: usize,
    ) -> Result<String, ComputeError> {
        to_json(&self.encode_timeline(timeline, max_buckets))
    }

    pub fn encode_replay_to_json(&self, segments: Vec<ReplaySegment>) -> Result<String, ComputeError> {
        to_json(&self.encode_replay(segments))
    }

    pub fn encode_passport_to_json(&self, passport: Option<PassportReport>) -> Result<String, ComputeError> {
        to_json(&self.encode_passport(passport))
    }

    pub fn encode_summary_to_json(&self, report: SummaryReport) -> Result<String, ComputeError> {
        to_json(&self.encode_summary(report))
    }
}

fn to_json<T: Serialize>(payload: &T) -> Result<String, ComputeError> {
    serde_json::to_string_pretty(payload).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FocusState, FocusThreshold, PointMetrics, SubType, TimelinePoint};

    fn classified() -> ClassifiedTimeline {
        ClassifiedTimeline {
            threshold: FocusThreshold::new(12.0, 5.0),
            source_points: 3,
            points: vec![TimelinePoint {
                timestamp: 100.0,
                state: FocusState::FocusPeak,
                sub_type: SubType::DeepWork,
                intensity: 0.8,
                dominant_app: "Code".to_string(),
                metrics: PointMetrics { keys: 30, clicks: 2, scrolls: 0 },
                gap_duration: None,
                gap_end_time: None,
            }],
        }
    }

    #[test]
    fn test_encode_timeline_payload() {
        let encoder = FocusEncoder::with_instance_id("test-instance".to_string());
        let payload = encoder.encode_timeline(classified(), 200);

        assert_eq!(payload.schema_version, SCHEMA_VERSION);
        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.version, FLUX_VERSION);
        assert_eq!(payload.producer.instance_id, "test-instance");
        assert_eq!(payload.threshold, 12.0);
        assert_eq!(payload.max_buckets, 200);
        assert_eq!(payload.source_points, 3);
        assert_eq!(payload.display_points, 1);
        assert!(chrono::DateTime::parse_from_rfc3339(&payload.computed_at_utc).is_ok());
    }

    #[test]
    fn test_encode_to_json() {
        let encoder = FocusEncoder::new();
        let json = encoder.encode_timeline_to_json(classified(), 200).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["timeline"][0]["state"], "Focus Peak");
        assert_eq!(parsed["timeline"][0]["sub_type"], "Deep Work");
        assert!(parsed.get("producer").is_some());

        let json = encoder.encode_passport_to_json(None).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["passport"].is_null());
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(FocusEncoder::new().instance_id(), FocusEncoder::new().instance_id());
    }
}
