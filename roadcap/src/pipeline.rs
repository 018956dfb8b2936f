use crate::capacity::{factors_with, CapacityFactors};
use crate::equivalency::{hourly_flow, tally};
use crate::error::Result;
use crate::los::{degree_of_saturation, LosGrade};
use crate::method::Method;
use crate::normalize::normalize;
use crate::reconcile::{reconcile, ZoneAnomalies};
use crate::telemetry::TelemetryPayload;
use crate::types::{CategoryCounts, NormalizedReading, RoadSegmentProfile, SensorZoneConfig};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Capacity analysis of one reading under one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub method: Method,
    pub counts: CategoryCounts,
    pub total_motorized: u64,
    /// Flow over the reading's interval.
    pub standardized_flow: f64,
    pub interval_minutes: u32,
    pub hourly_flow: f64,
    pub factors: CapacityFactors,
    pub capacity: f64,
    pub degree_of_saturation: f64,
    pub los: LosGrade,
    pub los_description: String,
    pub unmapped_classes: Vec<u32>,
}

/// Run one method over a normalized reading.
#[must_use]
pub fn analyze_reading(
    reading: &NormalizedReading,
    profile: &RoadSegmentProfile,
    method: Method,
) -> AnalysisResult {
    let tables = method.tables();
    let tally = tally(reading.class_counts(), profile.road_type, tables);

    if !tally.unmapped.is_empty() {
        warn!(
            "{method}: classes {:?} have no {} mapping on {} roads, counted as {}",
            tally.unmapped,
            tables.scheme().name,
            profile.road_type,
            tables.category_code(crate::types::Category::Light)
        );
    }

    let hourly = hourly_flow(tally.flow, i64::from(reading.interval_minutes));
    let factors = factors_with(profile, tables);
    let capacity = factors.capacity();
    let ds = degree_of_saturation(hourly, capacity);
    let bands = tables.los_bands();
    let los = bands.grade(ds);

    AnalysisResult {
        method,
        counts: tally.counts,
        total_motorized: tally.counts.motorized(),
        standardized_flow: tally.flow,
        interval_minutes: reading.interval_minutes,
        hourly_flow: hourly,
        factors,
        capacity,
        degree_of_saturation: ds,
        los,
        los_description: bands.description(los).to_string(),
        unmapped_classes: tally.unmapped.into_iter().collect(),
    }
}

/// Everything produced for one telemetry payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub reading: NormalizedReading,
    pub mkji: AnalysisResult,
    pub pkji: AnalysisResult,
    pub anomalies: ZoneAnomalies,
}

impl PipelineOutput {
    #[must_use]
    pub fn result(&self, method: Method) -> &AnalysisResult {
        match method {
            Method::Mkji1997 => &self.mkji,
            Method::Pkji2023 => &self.pkji,
        }
    }
}

/// Reconcile, normalize and analyse one payload with both methods.
///
/// # Errors
/// Only for a profile that fails validation. Degraded payloads (missing or
/// extra zones, unmapped classes) still produce output.
pub fn process_payload(
    payload: &TelemetryPayload,
    zones: &SensorZoneConfig,
    profile: &RoadSegmentProfile,
    received_at: DateTime<Utc>,
) -> Result<PipelineOutput> {
    profile.validate()?;

    let reconciliation = reconcile(zones, &payload.zones);
    let reading = normalize(&reconciliation, payload, profile, received_at);

    let mkji = analyze_reading(&reading, profile, Method::Mkji1997);
    let pkji = analyze_reading(&reading, profile, Method::Pkji2023);

    debug!(
        "Segment {}: {} vehicles, {} {:.1} smp/h LoS {}, {} {:.1} skr/h LoS {}",
        reading.segment_id,
        reading.total_vehicles,
        Method::Mkji1997,
        mkji.hourly_flow,
        mkji.los,
        Method::Pkji2023,
        pkji.hourly_flow,
        pkji.los
    );

    Ok(PipelineOutput {
        reading,
        mkji,
        pkji,
        anomalies: reconciliation.anomalies,
    })
}
