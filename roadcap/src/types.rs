use crate::error::{Error, Result};
use crate::constants::{MAX_UTC_OFFSET_HOURS, MIN_UTC_OFFSET_HOURS};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

// # Road segment

/// Road classification of a monitored segment.
///
/// Registry documents may still use the legacy tags (`perkotaan`,
/// `luar_kota`, `bebas_hambatan`, `12_kelas`). Any other tag deserializes to
/// `Unrecognized`, which the capacity calculators treat like `Urban`.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadType {
    #[serde(alias = "perkotaan")]
    Urban,
    #[serde(alias = "luar_kota")]
    Rural,
    #[serde(alias = "bebas_hambatan")]
    Freeway,
    #[serde(alias = "12_kelas")]
    TwelveClass,
    #[serde(other)]
    Unrecognized,
}

impl RoadType {
    pub const KNOWN: [Self; 4] = [Self::Urban, Self::Rural, Self::Freeway, Self::TwelveClass];
}

impl fmt::Display for RoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoadType::Urban => write!(f, "urban"),
            RoadType::Rural => write!(f, "rural"),
            RoadType::Freeway => write!(f, "freeway"),
            RoadType::TwelveClass => write!(f, "twelve_class"),
            RoadType::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Lanes / directions / median, e.g. `4/2D` is four lanes, two directions,
/// divided.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneConfig {
    #[serde(rename = "2/2UD", alias = "22ud")]
    TwoLaneUndivided,
    #[serde(rename = "4/2D", alias = "42d")]
    FourLaneDivided,
    #[serde(rename = "4/2UD", alias = "42ud")]
    FourLaneUndivided,
    #[serde(rename = "6/2D", alias = "62d")]
    SixLaneDivided,
    #[serde(other)]
    Unrecognized,
}

impl LaneConfig {
    #[must_use]
    pub const fn is_divided(self) -> bool {
        matches!(self, Self::FourLaneDivided | Self::SixLaneDivided)
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionalSplit {
    #[serde(rename = "50-50")]
    Split50,
    #[serde(rename = "55-45")]
    Split55,
    #[serde(rename = "60-40")]
    Split60,
    #[serde(rename = "65-35")]
    Split65,
    #[serde(rename = "70-30")]
    Split70,
    #[serde(other)]
    Unrecognized,
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionType {
    #[serde(alias = "bahu_jalan")]
    Shoulder,
    #[serde(alias = "kereb")]
    Kerb,
    #[serde(other)]
    Unrecognized,
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrictionClass {
    #[serde(rename = "VL")]
    VeryLow,
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "H")]
    High,
    #[serde(rename = "VH")]
    VeryHigh,
    #[serde(other)]
    Unrecognized,
}

/// Geometry and environment of a monitored road segment, as supplied by the
/// location registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSegmentProfile {
    pub segment_id: String,
    #[serde(default)]
    pub name: String,
    pub road_type: RoadType,
    pub lane_config: LaneConfig,
    /// Carriageway width in whole metres.
    pub lane_width_m: i32,
    pub directional_split: DirectionalSplit,
    pub friction_type: FrictionType,
    pub friction_class: FrictionClass,
    /// City population in millions.
    pub city_size_millions: f64,
    /// Used for timestamps when the payload carries no usable offset.
    #[serde(default)]
    pub utc_offset_hours: Option<f64>,
}

impl RoadSegmentProfile {
    /// # Errors
    /// Returns `Error::InvalidProfile` for fields no fallback can repair.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidProfile {
            segment: self.segment_id.clone(),
            reason,
        };

        if self.segment_id.trim().is_empty() {
            return Err(invalid("segment_id must not be empty".to_string()));
        }
        if self.lane_width_m <= 0 {
            return Err(invalid(format!("lane width {} m is not positive", self.lane_width_m)));
        }
        if !self.city_size_millions.is_finite() || self.city_size_millions < 0.0 {
            return Err(invalid(format!("city size {} is not a valid population", self.city_size_millions)));
        }
        if let Some(hours) = self.utc_offset_hours {
            let range = f64::from(MIN_UTC_OFFSET_HOURS)..=f64::from(MAX_UTC_OFFSET_HOURS);
            if !hours.is_finite() || !range.contains(&hours) {
                return Err(invalid(format!("utc offset {hours} is outside [-12, 14]")));
            }
        }
        Ok(())
    }
}

// # Sensor configuration

/// One configured detection zone. Its 1-based position in
/// `SensorZoneConfig::zones` is the zone id sensors report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLabel {
    pub zone_id: String,
    pub direction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorZoneConfig {
    pub sensor_id: String,
    pub zones: Vec<ZoneLabel>,
}

impl SensorZoneConfig {
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }
}

// # Raw telemetry

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawClassReading {
    pub class_nr: u32,
    pub vehicles: u32,
    pub avg_speed: f64,
    pub gap_time: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneMetrics {
    pub occupancy: f64,
    pub density: f64,
    pub headway: f64,
    pub confidence: f64,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawZoneReading {
    pub zone_id: u32,
    pub classes: Vec<RawClassReading>,
    pub metrics: ZoneMetrics,
}

// # Normalized readings

#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimestampSource {
    /// Offset declared in the payload's `Utc` attribute.
    Payload,
    /// Fallback offset configured on the road segment.
    Profile,
    /// Neither was usable; the receive instant in UTC.
    ServerUtc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCount {
    pub class_nr: u32,
    pub vehicles: u32,
    pub avg_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedZone {
    /// 1-based position in the sensor's zone configuration.
    pub index: u32,
    pub zone_id: String,
    pub direction: String,
    /// False when the zone was zero-filled because the payload omitted it.
    pub reported: bool,
    pub classes: Vec<ClassCount>,
    pub metrics: ZoneMetrics,
    pub total_vehicles: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReading {
    pub segment_id: String,
    pub sensor_id: String,
    pub road_type: RoadType,
    pub timestamp: DateTime<FixedOffset>,
    pub timestamp_source: TimestampSource,
    pub interval_minutes: u32,
    pub zones: Vec<NormalizedZone>,
    pub total_vehicles: u64,
}

impl NormalizedReading {
    /// Local hour-of-day bucket, e.g. `"07:00"`.
    #[must_use]
    pub fn hour_label(&self) -> String {
        self.timestamp.format("%H:00").to_string()
    }

    pub fn class_counts(&self) -> impl Iterator<Item = &ClassCount> {
        self.zones.iter().flat_map(|zone| zone.classes.iter())
    }
}

// # Categories

/// Vehicle category a class number maps to. Both methods group vehicles into
/// the same four slots; `Methodology::category_code` gives each method's own
/// label (MC/LV/HV/UM for MKJI 1997, SM/KR/KB/KTB for PKJI 2023).
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    TwoWheeler,
    Light,
    Heavy,
    NonMotorized,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::TwoWheeler, Self::Light, Self::Heavy, Self::NonMotorized];

    #[must_use]
    pub const fn is_motorized(self) -> bool {
        !matches!(self, Self::NonMotorized)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub two_wheeler: u64,
    pub light: u64,
    pub heavy: u64,
    pub non_motorized: u64,
}

impl CategoryCounts {
    #[must_use]
    pub const fn get(&self, category: Category) -> u64 {
        match category {
            Category::TwoWheeler => self.two_wheeler,
            Category::Light => self.light,
            Category::Heavy => self.heavy,
            Category::NonMotorized => self.non_motorized,
        }
    }

    pub fn add(&mut self, category: Category, vehicles: u64) {
        let slot = match category {
            Category::TwoWheeler => &mut self.two_wheeler,
            Category::Light => &mut self.light,
            Category::Heavy => &mut self.heavy,
            Category::NonMotorized => &mut self.non_motorized,
        };
        *slot += vehicles;
    }

    pub fn merge(&mut self, other: &Self) {
        for category in Category::ALL {
            self.add(category, other.get(category));
        }
    }

    #[must_use]
    pub const fn motorized(&self) -> u64 {
        self.two_wheeler + self.light + self.heavy
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.motorized() + self.non_motorized
    }
}
