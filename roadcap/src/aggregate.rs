//! Statistics over a window of normalized readings.

use crate::capacity::{factors_with, CapacityFactors};
use crate::equivalency::{tally, Tally};
use crate::los::{degree_of_saturation, LosGrade};
use crate::method::Method;
use crate::types::{CategoryCounts, NormalizedReading, RoadSegmentProfile};
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Whole days covered by `[start, end]`, rounded up, never less than one.
#[must_use]
pub fn window_days<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> u32 {
    let seconds = end.clone().signed_duration_since(start.clone()).num_seconds();
    if seconds <= 0 {
        return 1;
    }
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX).max(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakHour {
    /// Local hour-of-day bucket, e.g. `"17:00"`.
    pub label: String,
    pub flow: f64,
}

/// Hour-of-day bucket with the highest summed flow. Buckets are summed
/// across days; on a tie the bucket seen first wins.
#[must_use]
pub fn peak_hour(readings: &[NormalizedReading], method: Method) -> Option<PeakHour> {
    let tables = method.tables();
    let mut buckets: Vec<(String, f64)> = Vec::new();

    for reading in readings {
        let label = reading.hour_label();
        let flow = tally(reading.class_counts(), reading.road_type, tables).flow;
        match buckets.iter_mut().find(|(l, _)| *l == label) {
            Some((_, sum)) => *sum += flow,
            None => buckets.push((label, flow)),
        }
    }

    let mut best: Option<(String, f64)> = None;
    for (label, flow) in buckets {
        if best.as_ref().map_or(true, |(_, top)| flow > *top) {
            best = Some((label, flow));
        }
    }
    best.map(|(label, flow)| PeakHour { label, flow })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub method: Method,
    pub days: u32,
    pub readings: usize,
    pub total_vehicles: u64,
    pub counts: CategoryCounts,
    pub standardized_flow: f64,
    /// Vehicles per day.
    pub daily_volume: f64,
    /// Flow per day, in the method's unit.
    pub daily_flow: f64,
    pub peak_hour: Option<PeakHour>,
    pub unmapped_classes: Vec<u32>,
}

/// Totals and daily averages of `readings` over `days`.
#[must_use]
pub fn summarize(readings: &[NormalizedReading], days: u32, method: Method) -> WindowSummary {
    let tables = method.tables();
    let days = days.max(1);

    let mut combined = Tally::default();
    for reading in readings {
        combined.merge(&tally(reading.class_counts(), reading.road_type, tables));
    }
    let total_vehicles: u64 = readings.iter().map(|r| r.total_vehicles).sum();

    WindowSummary {
        method,
        days,
        readings: readings.len(),
        total_vehicles,
        counts: combined.counts,
        standardized_flow: combined.flow,
        daily_volume: total_vehicles as f64 / f64::from(days),
        daily_flow: combined.flow / f64::from(days),
        peak_hour: peak_hour(readings, method),
        unmapped_classes: combined.unmapped.into_iter().collect(),
    }
}

/// Window summary plus the peak hour checked against segment capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAnalysis {
    pub segment_id: String,
    pub summary: WindowSummary,
    pub factors: CapacityFactors,
    pub capacity: f64,
    pub degree_of_saturation: f64,
    pub los: LosGrade,
    pub los_description: String,
}

#[must_use]
pub fn analyze_window(
    readings: &[NormalizedReading],
    profile: &RoadSegmentProfile,
    days: u32,
    method: Method,
) -> WindowAnalysis {
    let tables = method.tables();
    let summary = summarize(readings, days, method);
    let factors = factors_with(profile, tables);
    let capacity = factors.capacity();

    let peak_flow = summary.peak_hour.as_ref().map_or(0.0, |p| p.flow);
    let ds = degree_of_saturation(peak_flow, capacity);
    let bands = tables.los_bands();
    let los = bands.grade(ds);

    WindowAnalysis {
        segment_id: profile.segment_id.clone(),
        summary,
        factors,
        capacity,
        degree_of_saturation: ds,
        los,
        los_description: bands.description(los).to_string(),
    }
}
