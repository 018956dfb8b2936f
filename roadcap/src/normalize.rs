use crate::constants::{
    DEFAULT_INTERVAL_MINUTES, FALLBACK_INTERVAL_SECONDS, MAX_UTC_OFFSET_HOURS, MIN_UTC_OFFSET_HOURS,
    UTC_PLACEHOLDER,
};
use crate::reconcile::Reconciliation;
use crate::telemetry::TelemetryPayload;
use crate::types::{
    ClassCount, NormalizedReading, NormalizedZone, RoadSegmentProfile, TimestampSource,
};
use chrono::{DateTime, FixedOffset, Utc};
use log::debug;

/// Whole minutes of a declared interval; anything under a minute falls back
/// to five.
#[must_use]
pub fn interval_minutes(declared_seconds: i64) -> u32 {
    let seconds = if declared_seconds <= 0 {
        FALLBACK_INTERVAL_SECONDS
    } else {
        declared_seconds
    };
    match u32::try_from(seconds / 60) {
        Ok(0) | Err(_) => DEFAULT_INTERVAL_MINUTES,
        Ok(minutes) => minutes,
    }
}

/// Parse a payload `Utc` attribute: `7`, `-3`, `UTC+7` or `utc-5`.
#[must_use]
pub fn parse_utc_offset(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() || raw == UTC_PLACEHOLDER {
        return None;
    }
    let digits = raw
        .strip_prefix("UTC")
        .or_else(|| raw.strip_prefix("utc"))
        .unwrap_or(raw);
    let hours: i32 = digits.parse().ok()?;
    (MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS)
        .contains(&hours)
        .then_some(hours)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTimestamp {
    pub at: DateTime<FixedOffset>,
    pub source: TimestampSource,
}

fn offset_from_seconds(seconds: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(seconds)
}

/// Local time of `received_at`. Payload offset first, then the segment's
/// configured offset, then plain UTC.
#[must_use]
pub fn resolve_timestamp(
    payload_utc: Option<&str>,
    profile_offset_hours: Option<f64>,
    received_at: DateTime<Utc>,
) -> ResolvedTimestamp {
    if let Some(offset) = payload_utc
        .and_then(parse_utc_offset)
        .and_then(|hours| offset_from_seconds(hours * 3600))
    {
        return ResolvedTimestamp {
            at: received_at.with_timezone(&offset),
            source: TimestampSource::Payload,
        };
    }

    if let Some(raw) = payload_utc {
        debug!("Ignoring unusable Utc attribute '{raw}'");
    }

    if let Some(offset) = profile_offset_hours
        .filter(|h| h.is_finite())
        .and_then(|hours| offset_from_seconds((hours * 3600.0).round() as i32))
    {
        return ResolvedTimestamp {
            at: received_at.with_timezone(&offset),
            source: TimestampSource::Profile,
        };
    }

    ResolvedTimestamp {
        at: received_at.fixed_offset(),
        source: TimestampSource::ServerUtc,
    }
}

/// Build the normalized record for one reconciled payload.
#[must_use]
pub fn normalize(
    reconciliation: &Reconciliation,
    payload: &TelemetryPayload,
    profile: &RoadSegmentProfile,
    received_at: DateTime<Utc>,
) -> NormalizedReading {
    let timestamp = resolve_timestamp(payload.utc.as_deref(), profile.utc_offset_hours, received_at);

    let zones: Vec<NormalizedZone> = reconciliation
        .zones
        .iter()
        .map(|zone| {
            let classes: Vec<ClassCount> = zone
                .classes
                .iter()
                .map(|class| ClassCount {
                    class_nr: class.class_nr,
                    vehicles: class.vehicles,
                    avg_speed: class.avg_speed,
                })
                .collect();
            let total_vehicles = classes.iter().map(|c| u64::from(c.vehicles)).sum();
            NormalizedZone {
                index: zone.index,
                zone_id: zone.label.zone_id.clone(),
                direction: zone.label.direction.clone(),
                reported: zone.reported,
                classes,
                metrics: zone.metrics,
                total_vehicles,
            }
        })
        .collect();

    let total_vehicles = zones.iter().map(|z| z.total_vehicles).sum();

    NormalizedReading {
        segment_id: profile.segment_id.clone(),
        sensor_id: reconciliation.sensor_id.clone(),
        road_type: profile.road_type,
        timestamp: timestamp.at,
        timestamp_source: timestamp.source,
        interval_minutes: interval_minutes(payload.interval_seconds),
        zones,
        total_vehicles,
    }
}
