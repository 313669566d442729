//! Focus timeline data types
//!
//! This module defines the samples, intermediate states, timeline points and
//! reports that flow through the focus classification pipeline.

use serde::{Deserialize, Serialize};

/// Label used when a sample carries no active-window label
pub const UNKNOWN_APP: &str = "Unknown";

/// One fixed-cadence behavioral sample captured by the tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalSample {
    /// Unix timestamp in seconds (may be irregular or gapped)
    pub timestamp: f64,
    /// Key presses during the interval
    #[serde(default)]
    pub keystrokes: u32,
    /// Mouse button presses during the interval
    #[serde(default)]
    pub mouse_clicks: u32,
    /// Scroll wheel events during the interval
    #[serde(default)]
    pub mouse_scrolls: u32,
    /// Pointer travel during the interval (not used for scoring)
    #[serde(default)]
    pub mouse_distance: f64,
    /// Foreground window changes during the interval
    #[serde(default)]
    pub window_switches: u32,
    /// Whether the tracker saw no input for the whole interval
    #[serde(default)]
    pub is_idle: bool,
    /// Foreground window label (already privacy-filtered by the tracker)
    #[serde(default = "default_active_window")]
    pub active_window: String,
}

fn default_active_window() -> String {
    UNKNOWN_APP.to_string()
}

impl IntervalSample {
    /// An all-zero, non-idle sample at `timestamp`
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            keystrokes: 0,
            mouse_clicks: 0,
            mouse_scrolls: 0,
            mouse_distance: 0.0,
            window_switches: 0,
            is_idle: false,
            active_window: default_active_window(),
        }
    }
}

/// Coarse per-sample activity label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MicroStateKind {
    Idle,
    Fragmented,
    HighFocus,
    LowFocus,
}

/// Per-sample classification, computed without history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MicroState {
    pub kind: MicroStateKind,
    /// Display intensity in [0, 1]
    pub intensity: f64,
    /// Weighted activity score of the sample
    pub activity_score: f64,
}

/// Activity-score cutoff separating focus from lighter engagement.
///
/// Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FocusThreshold(f64);

impl FocusThreshold {
    /// Build a threshold, substituting `floor` for non-positive or non-finite values
    pub fn new(value: f64, floor: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Self(value)
        } else {
            Self(floor)
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Windowed (macro) focus state of a timeline point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusState {
    #[serde(rename = "Focus Peak")]
    FocusPeak,
    #[serde(rename = "Light Focus")]
    LightFocus,
    #[serde(rename = "Drift Zone")]
    DriftZone,
    #[serde(rename = "Recovery Point")]
    RecoveryPoint,
    Idle,
    IdleGap,
}

impl FocusState {
    /// States that count as engaged time for recovery detection
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            FocusState::FocusPeak | FocusState::LightFocus | FocusState::DriftZone
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            FocusState::FocusPeak => "Focus Peak",
            FocusState::LightFocus => "Light Focus",
            FocusState::DriftZone => "Drift Zone",
            FocusState::RecoveryPoint => "Recovery Point",
            FocusState::Idle => "Idle",
            FocusState::IdleGap => "IdleGap",
        }
    }
}

/// Refinement of a focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubType {
    #[serde(rename = "Deep Work")]
    DeepWork,
    #[serde(rename = "Active Work")]
    ActiveWork,
    Fragmented,
    Passive,
    Recharge,
    Generic,
    /// Time skip between samples (device off or tracker paused)
    SystemOff,
    /// Long idle run collapsed for display
    SystemIdle,
}

/// Raw input counts carried through to the display layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointMetrics {
    pub keys: u32,
    pub clicks: u32,
    pub scrolls: u32,
}

impl From<&IntervalSample> for PointMetrics {
    fn from(sample: &IntervalSample) -> Self {
        Self {
            keys: sample.keystrokes,
            clicks: sample.mouse_clicks,
            scrolls: sample.mouse_scrolls,
        }
    }
}

/// One point of the classified timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub timestamp: f64,
    pub state: FocusState,
    pub sub_type: SubType,
    /// Display intensity in [0, 1]
    pub intensity: f64,
    /// Modal active window of the smoothing window
    pub dominant_app: String,
    pub metrics: PointMetrics,
    /// Span covered by a synthetic gap point, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_duration: Option<f64>,
    /// Last real timestamp covered by a compressed idle run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_end_time: Option<f64>,
}

impl TimelinePoint {
    /// Whether the point was synthesized rather than derived from a sample
    pub fn is_synthetic(&self) -> bool {
        self.state == FocusState::IdleGap
    }
}

/// Maximal run of equal-state points, used by the replay animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySegment {
    pub state: FocusState,
    pub start_time: f64,
    pub end_time: f64,
    /// Recency-biased running intensity (see `replay`)
    pub intensity: f64,
    /// Dominant app of the first point in the run
    pub dominant_app: String,
    /// Metrics of the first point in the run
    pub metrics: PointMetrics,
    /// Number of timeline points folded into the segment
    pub point_count: usize,
    pub is_peak_moment: bool,
}

/// Fixed application taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Editor,
    Browser,
    Messaging,
    Video,
    Design,
    Game,
    Notes,
    Other,
}

/// Share of focus time spent in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: Category,
    /// Fraction of all Focus Peak points (0-1)
    pub share: f64,
    /// Most frequent concrete app label within the category
    pub dominant_app: String,
}

/// Aggregate report over an arbitrary historical window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassportReport {
    pub total_focus_hours: f64,
    pub total_light_focus_hours: f64,
    pub total_drift_hours: f64,
    pub total_recovery_hours: f64,
    pub total_idle_hours: f64,
    pub total_recovery_points: u32,
    /// Focus / (Focus + Drift), 0 when both are absent
    pub attention_stability_score: f64,
    /// Drift points caused by window fragmentation
    pub micro_leak_events: u32,
    pub days_tracked: u32,
    pub average_daily_focus_minutes: f64,
    /// Longest run of consecutive Focus Peak points
    pub longest_focus_streak_points: u32,
    pub longest_focus_streak_minutes: f64,
    pub best_hour_of_day: u32,
    pub toughest_hour_of_day: u32,
    pub hourly_focus: Vec<u32>,
    pub hourly_drift: Vec<u32>,
    pub hourly_recovery: Vec<u32>,
    /// Focus shares ordered by share, descending
    pub focus_by_category: Vec<CategoryShare>,
    pub nemesis_category: Option<Category>,
    pub nemesis_app: String,
}

/// Counts over one classified timeline, handed to the text generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Real (non-synthetic) points
    pub total_intervals: u32,
    pub focus_peak_intervals: u32,
    pub light_focus_intervals: u32,
    pub drift_intervals: u32,
    pub recovery_points: u32,
    pub idle_intervals: u32,
    pub gap_markers: u32,
    /// Most common dominant app across Focus Peak points
    pub dominant_focus_app: String,
}

/// Activity score distribution used by the external percentile calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDistribution {
    pub total_intervals: u32,
    pub max_activity: f64,
    /// Score at the top-25% boundary
    pub p75_activity: f64,
    pub p50_activity: f64,
    /// Score at the bottom-25% boundary
    pub p25_activity: f64,
    /// Percentile to use while history is too short to calibrate against
    pub proposed_default_percentile: Option<f64>,
}

/// Run of one state lasting long enough to describe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBlock {
    pub state: FocusState,
    pub start_time: f64,
    /// Timestamp of the first point of the next run
    pub end_time: f64,
    pub duration_minutes: f64,
}

/// What the timeline graph shows, in block form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualContext {
    pub blocks: Vec<StateBlock>,
    pub recovery_points: u32,
}

/// Consecutive samples sharing an app label and idle flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSession {
    /// App label; low-activity background apps read "System"
    pub app: String,
    pub is_idle: bool,
    pub start_time: f64,
    /// `start_time` plus one sample interval per member
    pub end_time: f64,
    pub sample_count: u32,
    /// Mean unweighted input count per sample
    pub avg_activity: f64,
}

/// Every structured input handed to the text generator for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: DailySummary,
    pub activity: ActivityDistribution,
    pub visual_context: VisualContext,
    pub app_sessions: Vec<AppSession>,
}

/// A classified timeline together with the threshold it was built with
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTimeline {
    pub threshold: FocusThreshold,
    /// Point count before any display processing
    pub source_points: usize,
    pub points: Vec<TimelinePoint>,
}

// ============================================================================
// Payload envelopes
// ============================================================================

/// Producer metadata stamped on every payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Timeline payload for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePayload {
    pub schema_version: String,
    pub producer: FocusProducer,
    pub computed_at_utc: String,
    /// Activity threshold the timeline was classified with
    pub threshold: f64,
    /// Bucket bound applied by display processing
    pub max_buckets: usize,
    /// Points in the classified timeline before display processing
    pub source_points: usize,
    /// Points after display processing
    pub display_points: usize,
    pub timeline: Vec<TimelinePoint>,
}

/// Replay payload for the animation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayPayload {
    pub schema_version: String,
    pub producer: FocusProducer,
    pub computed_at_utc: String,
    pub replay_segments: Vec<ReplaySegment>,
}

/// Passport payload; `passport` is null for empty history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportPayload {
    pub schema_version: String,
    pub producer: FocusProducer,
    pub computed_at_utc: String,
    pub passport: Option<PassportReport>,
}

/// Summary payload for the text generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub schema_version: String,
    pub producer: FocusProducer,
    pub computed_at_utc: String,
    #[serde(flatten)]
    pub report: SummaryReport,
}
