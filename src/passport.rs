//! Aggregate "passport" reporting
//!
//! Cross-period statistics over a classified (pre-downsample) timeline:
//! time per state, stability, streaks, hour-of-day histograms and
//! per-category focus shares.

use crate::category::CategoryMapper;
use crate::tally::OrderedTally;
use crate::types::{
    Category, CategoryShare, FocusState, PassportReport, SubType, TimelinePoint, UNKNOWN_APP,
};
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use std::collections::HashMap;

const SECONDS_PER_DAY: f64 = 86_400.0;
const HOURS_PER_DAY: usize = 24;

/// Aggregate reporter for one tracker cadence and local offset
pub struct AggregateReporter {
    interval_sec: f64,
    offset: FixedOffset,
}

/// Category counts with the concrete apps seen in each category
#[derive(Default)]
struct CategoryTally {
    categories: OrderedTally<Category>,
    apps: HashMap<Category, OrderedTally<String>>,
}

impl CategoryTally {
    fn add(&mut self, category: Category, app: &str) {
        self.categories.add(category);
        self.apps.entry(category).or_default().add(app.to_string());
    }

    fn dominant_app(&self, category: &Category) -> String {
        self.apps
            .get(category)
            .and_then(|apps| apps.mode().cloned())
            .unwrap_or_else(|| UNKNOWN_APP.to_string())
    }
}

impl AggregateReporter {
    /// `interval_sec` is the fixed sample cadence; `offset` places timestamps in local time
    pub fn new(interval_sec: f64, offset: FixedOffset) -> Self {
        Self {
            interval_sec,
            offset,
        }
    }

    /// Compute the passport report; `None` for an empty timeline
    pub fn report(&self, timeline: &[TimelinePoint]) -> Option<PassportReport> {
        if timeline.is_empty() {
            return None;
        }

        let count_of = |state: FocusState| timeline.iter().filter(|p| p.state == state).count();
        let focus = count_of(FocusState::FocusPeak);
        let light = count_of(FocusState::LightFocus);
        let drift = count_of(FocusState::DriftZone);
        let recovery = count_of(FocusState::RecoveryPoint);
        let idle = count_of(FocusState::Idle);

        let active = focus + drift;
        let stability = if active > 0 {
            focus as f64 / active as f64
        } else {
            0.0
        };

        let micro_leaks = timeline
            .iter()
            .filter(|p| p.state == FocusState::DriftZone && p.sub_type == SubType::Fragmented)
            .count();

        let days_tracked = days_tracked(timeline);
        let total_focus_hours = self.hours(focus);
        let streak = longest_focus_streak(timeline);

        let mut hourly_focus = vec![0u32; HOURS_PER_DAY];
        let mut hourly_drift = vec![0u32; HOURS_PER_DAY];
        let mut hourly_recovery = vec![0u32; HOURS_PER_DAY];
        for point in timeline {
            let hour = self.local_hour(point.timestamp);
            match point.state {
                FocusState::FocusPeak => hourly_focus[hour] += 1,
                FocusState::DriftZone => hourly_drift[hour] += 1,
                FocusState::RecoveryPoint => hourly_recovery[hour] += 1,
                _ => {}
            }
        }

        let mut focus_categories = CategoryTally::default();
        let mut drift_categories = CategoryTally::default();
        for point in timeline {
            let tally = match point.state {
                FocusState::FocusPeak => &mut focus_categories,
                FocusState::DriftZone => &mut drift_categories,
                _ => continue,
            };
            tally.add(CategoryMapper::map(&point.dominant_app), &point.dominant_app);
        }

        let nemesis_category = drift_categories.categories.mode().copied();
        let nemesis_app = nemesis_category
            .map(|c| drift_categories.dominant_app(&c))
            .unwrap_or_else(|| UNKNOWN_APP.to_string());

        Some(PassportReport {
            total_focus_hours,
            total_light_focus_hours: self.hours(light),
            total_drift_hours: self.hours(drift),
            total_recovery_hours: self.hours(recovery),
            total_idle_hours: self.hours(idle),
            total_recovery_points: recovery as u32,
            attention_stability_score: stability,
            micro_leak_events: micro_leaks as u32,
            days_tracked,
            average_daily_focus_minutes: total_focus_hours * 60.0 / days_tracked as f64,
            longest_focus_streak_points: streak as u32,
            longest_focus_streak_minutes: streak as f64 * self.interval_sec / 60.0,
            best_hour_of_day: argmax_hour(&hourly_focus),
            toughest_hour_of_day: argmax_hour(&hourly_drift),
            hourly_focus,
            hourly_drift,
            hourly_recovery,
            focus_by_category: category_shares(&focus_categories),
            nemesis_category,
            nemesis_app,
        })
    }

    fn hours(&self, points: usize) -> f64 {
        points as f64 * self.interval_sec / 3600.0
    }

    /// Local hour-of-day (0-23) of a unix timestamp
    fn local_hour(&self, timestamp: f64) -> usize {
        let secs = timestamp.floor() as i64;
        match DateTime::<Utc>::from_timestamp(secs, 0) {
            Some(utc) => utc.with_timezone(&self.offset).hour() as usize,
            None => {
                let local = secs + i64::from(self.offset.local_minus_utc());
                local.div_euclid(3600).rem_euclid(HOURS_PER_DAY as i64) as usize
            }
        }
    }
}

/// Inclusive day span between the earliest and latest timestamp, at least 1
fn days_tracked(timeline: &[TimelinePoint]) -> u32 {
    let (min, max) = timeline.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.timestamp), hi.max(p.timestamp))
    });
    if !min.is_finite() || !max.is_finite() {
        return 1;
    }
    (((max - min) / SECONDS_PER_DAY).floor() as u32 + 1).max(1)
}

/// Longest run of consecutive Focus Peak points
fn longest_focus_streak(timeline: &[TimelinePoint]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for point in timeline {
        if point.state == FocusState::FocusPeak {
            current += 1;
        } else {
            longest = longest.max(current);
            current = 0;
        }
    }
    longest.max(current)
}

/// Hour with the highest count; ties go to the lowest hour
fn argmax_hour(histogram: &[u32]) -> u32 {
    let mut best_hour = 0;
    let mut best_count = 0;
    for (hour, &count) in histogram.iter().enumerate() {
        if count > best_count {
            best_hour = hour;
            best_count = count;
        }
    }
    best_hour as u32
}

/// Category shares of focus time, descending; equal shares keep first-seen order
fn category_shares(tally: &CategoryTally) -> Vec<CategoryShare> {
    let total = tally.categories.total();
    if total == 0 {
        return Vec::new();
    }
    let mut shares: Vec<CategoryShare> = tally
        .categories
        .iter()
        .map(|(category, count)| CategoryShare {
            category: *category,
            share: count as f64 / total as f64,
            dominant_app: tally.dominant_app(category),
        })
        .collect();
    shares.sort_by(|a, b| b.share.total_cmp(&a.share));
    shares
}
