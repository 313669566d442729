//! Sample intake
//!
//! Parses tracker exports (a JSON array or newline-delimited JSON) into
//! interval samples and prepares them for classification.

use crate::error::ComputeError;
use crate::types::{IntervalSample, UNKNOWN_APP};
use tracing::debug;

/// Parse a JSON array of interval samples
pub fn parse_samples(json: &str) -> Result<Vec<IntervalSample>, ComputeError> {
    serde_json::from_str(json)
        .map_err(|e| ComputeError::ParseError(format!("Failed to parse interval samples: {}", e)))
}

/// Parse newline-delimited JSON, one sample per line. Blank lines are skipped.
pub fn parse_samples_ndjson(text: &str) -> Result<Vec<IntervalSample>, ComputeError> {
    let mut samples = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let sample = serde_json::from_str(line).map_err(|e| {
            ComputeError::ParseError(format!("Failed to parse sample on line {}: {}", idx + 1, e))
        })?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Reject samples whose numeric fields cannot be classified
pub fn validate_sample(index: usize, sample: &IntervalSample) -> Result<(), ComputeError> {
    if !sample.timestamp.is_finite() {
        return Err(ComputeError::InvalidSample(format!(
            "sample {} has a non-finite timestamp",
            index
        )));
    }
    if !sample.mouse_distance.is_finite() || sample.mouse_distance < 0.0 {
        return Err(ComputeError::InvalidSample(format!(
            "sample {} has invalid mouse_distance {}",
            index, sample.mouse_distance
        )));
    }
    Ok(())
}

/// Validate, normalize labels and order samples by timestamp.
///
/// The sort is stable so samples sharing a timestamp keep their input order.
pub fn prepare_samples(mut samples: Vec<IntervalSample>) -> Result<Vec<IntervalSample>, ComputeError> {
    for (idx, sample) in samples.iter_mut().enumerate() {
        validate_sample(idx, sample)?;
        if sample.active_window.trim().is_empty() {
            sample.active_window = UNKNOWN_APP.to_string();
        }
    }

    let ordered = samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp);
    if !ordered {
        debug!(samples = samples.len(), "reordering out-of-order samples");
        samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }
    Ok(samples)
}
