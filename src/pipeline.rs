//! Pipeline orchestration
//!
//! This module provides the public API for Focus Flux. It runs samples
//! through the classification stages and hands the results to the encoder.
//!
//! Stages:
//! 1. MicroClassifier - per-sample labels
//! 2. ThresholdCalibrator - activity cutoff from the reference set
//! 3. MacroClassifier - windowed states with recovery refinement
//! 4. GapInserter - gap markers (always) and idle-run compression (display only)
//! 5. Downsampler / ReplaySegmenter / AggregateReporter

use crate::adapter::{parse_samples, prepare_samples};
use crate::config::FocusConfig;
use crate::downsample::Downsampler;
use crate::encoder::FocusEncoder;
use crate::error::ComputeError;
use crate::gaps::GapInserter;
use crate::macro_state::MacroClassifier;
use crate::micro::MicroClassifier;
use crate::passport::AggregateReporter;
use crate::profile::{FocusProfile, ProfileLearner};
use crate::replay::ReplaySegmenter;
use crate::summary::app_sessions;
use crate::threshold::ThresholdCalibrator;
use crate::types::{
    ActivityDistribution, ClassifiedTimeline, DailySummary, IntervalSample, PassportReport,
    ReplaySegment, SummaryReport, VisualContext,
};
use tracing::{debug, info};

/// Classify a samples JSON array into a timeline payload.
///
/// # Arguments
/// * `samples_json` - JSON array of interval samples
/// * `config_json` - Optional partial FocusConfig JSON; `None` uses defaults
///
/// # Example
/// ```ignore
/// let payload = timeline_to_json(samples_json, None)?;
/// ```
pub fn timeline_to_json(samples_json: &str, config_json: Option<&str>) -> Result<String, ComputeError> {
    let processor = processor_for(config_json)?;
    processor.timeline_json(samples_json, false)
}

/// Like [`timeline_to_json`], with idle-run compression and downsampling applied
pub fn dashboard_to_json(samples_json: &str, config_json: Option<&str>) -> Result<String, ComputeError> {
    let processor = processor_for(config_json)?;
    processor.timeline_json(samples_json, true)
}

/// Build a replay payload from a samples JSON array
pub fn replay_to_json(samples_json: &str, config_json: Option<&str>) -> Result<String, ComputeError> {
    let processor = processor_for(config_json)?;
    let samples = prepare_samples(parse_samples(samples_json)?)?;
    processor.encoder.encode_replay_to_json(processor.replay(&samples, None))
}

/// Build a passport payload from a samples JSON array
pub fn passport_to_json(samples_json: &str, config_json: Option<&str>) -> Result<String, ComputeError> {
    let processor = processor_for(config_json)?;
    let samples = prepare_samples(parse_samples(samples_json)?)?;
    let passport = processor.passport(&samples, None)?;
    processor.encoder.encode_passport_to_json(passport)
}

/// Build a summary payload from a samples JSON array
pub fn summary_to_json(samples_json: &str, config_json: Option<&str>) -> Result<String, ComputeError> {
    let processor = processor_for(config_json)?;
    let samples = prepare_samples(parse_samples(samples_json)?)?;
    let report = processor.summary(&samples, None);
    processor.encoder.encode_summary_to_json(report)
}

fn processor_for(config_json: Option<&str>) -> Result<FocusProcessor, ComputeError> {
    match config_json {
        Some(json) => FocusProcessor::with_config(FocusConfig::from_json(json)?),
        None => Ok(FocusProcessor::new()),
    }
}

/// Processor holding configuration and a learned focus profile.
///
/// Classification calls take `&self` and keep no state between them; only
/// the profile methods mutate the processor.
pub struct FocusProcessor {
    config: FocusConfig,
    profile: FocusProfile,
    encoder: FocusEncoder,
}

impl Default for FocusProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusProcessor {
    /// Create a processor with default configuration
    pub fn new() -> Self {
        Self {
            config: FocusConfig::default(),
            profile: FocusProfile::default(),
            encoder: FocusEncoder::new(),
        }
    }

    /// Create a processor with a validated configuration
    pub fn with_config(config: FocusConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            profile: FocusProfile::default(),
            encoder: FocusEncoder::new(),
        })
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    pub fn profile(&self) -> &FocusProfile {
        &self.profile
    }

    pub fn encoder(&self) -> &FocusEncoder {
        &self.encoder
    }

    /// Classify samples and insert gap markers.
    ///
    /// `reference` defaults to `samples`; pass a larger history to keep the
    /// threshold stable across display windows.
    pub fn timeline(
        &self,
        samples: &[IntervalSample],
        reference: Option<&[IntervalSample]>,
    ) -> ClassifiedTimeline {
        self.timeline_with_percentile(samples, reference, self.profile.focus_percentile())
    }

    /// Classify with an explicit external percentile, overriding the profile's
    pub fn timeline_with_percentile(
        &self,
        samples: &[IntervalSample],
        reference: Option<&[IntervalSample]>,
        percentile: Option<f64>,
    ) -> ClassifiedTimeline {
        let reference = reference.unwrap_or(samples);
        let threshold = ThresholdCalibrator::calibrate(reference, percentile, &self.config);

        let micro = MicroClassifier::classify_all(samples, &self.config.weights);
        let classified = MacroClassifier::new(&self.config, threshold).classify(samples, &micro);
        debug!(points = classified.len(), "macro classification complete");

        let source_points = classified.len();
        let points = GapInserter::insert_gap_markers(classified, &self.config);
        debug!(
            points = points.len(),
            gap_markers = points.len() - source_points,
            "gap markers inserted"
        );

        ClassifiedTimeline {
            threshold,
            source_points,
            points,
        }
    }

    /// Compress long idle runs and downsample a timeline for rendering
    pub fn for_display(&self, mut timeline: ClassifiedTimeline) -> ClassifiedTimeline {
        let compressed = GapInserter::compress_idle_runs(timeline.points, &self.config);
        timeline.points = Downsampler::downsample(compressed, self.config.max_buckets);
        debug!(points = timeline.points.len(), "display timeline ready");
        timeline
    }

    /// Classified timeline prepared for the dashboard
    pub fn dashboard(
        &self,
        samples: &[IntervalSample],
        reference: Option<&[IntervalSample]>,
    ) -> ClassifiedTimeline {
        self.for_display(self.timeline(samples, reference))
    }

    /// Replay segments over the gap-marked timeline
    pub fn replay(
        &self,
        samples: &[IntervalSample],
        reference: Option<&[IntervalSample]>,
    ) -> Vec<ReplaySegment> {
        let timeline = self.timeline(samples, reference);
        let segments = ReplaySegmenter::segment(&timeline.points);
        debug!(segments = segments.len(), "replay segmented");
        segments
    }

    /// Passport report over the pre-downsample timeline; `None` for empty input
    pub fn passport(
        &self,
        samples: &[IntervalSample],
        reference: Option<&[IntervalSample]>,
    ) -> Result<Option<PassportReport>, ComputeError> {
        let reporter = AggregateReporter::new(self.config.sample_interval_sec, self.config.local_offset()?);
        let timeline = self.timeline(samples, reference);
        let report = reporter.report(&timeline.points);
        info!(
            points = timeline.points.len(),
            has_report = report.is_some(),
            "passport computed"
        );
        Ok(report)
    }

    /// Daily counts, activity distribution, state blocks and app sessions
    pub fn summary(&self, samples: &[IntervalSample], reference: Option<&[IntervalSample]>) -> SummaryReport {
        let timeline = self.timeline(samples, reference);
        SummaryReport {
            summary: DailySummary::from_timeline(&timeline.points),
            activity: ActivityDistribution::from_samples(samples, &self.config.weights),
            visual_context: VisualContext::from_timeline(&timeline.points),
            app_sessions: app_sessions(samples, self.config.sample_interval_sec),
        }
    }

    /// Parse, classify and encode a timeline payload
    pub fn timeline_json(&self, samples_json: &str, display: bool) -> Result<String, ComputeError> {
        let samples = prepare_samples(parse_samples(samples_json)?)?;
        let mut timeline = self.timeline(&samples, None);
        if display {
            timeline = self.for_display(timeline);
        }
        info!(
            samples = samples.len(),
            points = timeline.points.len(),
            threshold = timeline.threshold.value(),
            "timeline computed"
        );
        self.encoder
            .encode_timeline_to_json(timeline, self.config.max_buckets)
    }

    /// Update the learned profile from sample history
    pub fn learn(&mut self, history: &[IntervalSample]) -> bool {
        ProfileLearner::learn(&mut self.profile, history, &self.config)
    }

    /// Store an externally calibrated percentile; returns the clamped value
    pub fn apply_calibration(&mut self, percentile: f64) -> f64 {
        self.profile.apply_calibration(percentile, &self.config)
    }

    /// Load profile state from JSON
    pub fn load_profile(&mut self, json: &str) -> Result<(), ComputeError> {
        self.profile = FocusProfile::from_json(json)?;
        Ok(())
    }

    /// Save profile state to JSON
    pub fn save_profile(&self) -> Result<String, ComputeError> {
        self.profile
            .to_json()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}
