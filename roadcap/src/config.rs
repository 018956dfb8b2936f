//! Location registry: road segments and the sensors mounted on them.
//!
//! ```json
//! {
//!   "segments": [{ "segment_id": "SEG-01", "road_type": "urban", ... }],
//!   "sensors": [{
//!     "api_key": "cam-key-01",
//!     "segment_id": "SEG-01",
//!     "sensor_id": "CAM-01",
//!     "zones": [{ "zone_id": "Z1", "direction": "north" }]
//!   }]
//! }
//! ```

use crate::error::{Error, Result};
use crate::types::{RoadSegmentProfile, SensorZoneConfig};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub api_key: String,
    pub segment_id: String,
    #[serde(flatten)]
    pub zone_config: SensorZoneConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub segments: Vec<RoadSegmentProfile>,
    #[serde(default)]
    pub sensors: Vec<SensorRecord>,
}

impl Registry {
    /// # Errors
    /// Io/Json errors for unreadable files, `InvalidRegistry` for duplicate
    /// ids, `InvalidProfile` for segments that fail validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&contents)?;
        info!(
            "Loaded registry {} with {} segments and {} sensors",
            path.display(),
            registry.segments.len(),
            registry.sensors.len()
        );
        Ok(registry)
    }

    /// # Errors
    /// See [`Registry::load`].
    pub fn from_json(contents: &str) -> Result<Self> {
        let registry: Self = serde_json::from_str(contents)?;
        registry.check()?;
        Ok(registry)
    }

    fn check(&self) -> Result<()> {
        let mut segment_ids = HashSet::new();
        for segment in &self.segments {
            segment.validate()?;
            if !segment_ids.insert(segment.segment_id.as_str()) {
                return Err(Error::InvalidRegistry(format!(
                    "segment '{}' is defined twice",
                    segment.segment_id
                )));
            }
        }

        let mut keys = HashSet::new();
        for sensor in &self.sensors {
            if !keys.insert(sensor.api_key.as_str()) {
                return Err(Error::InvalidRegistry(format!(
                    "api key of sensor '{}' is already in use",
                    sensor.zone_config.sensor_id
                )));
            }
            if !segment_ids.contains(sensor.segment_id.as_str()) {
                return Err(Error::UnknownSegment {
                    sensor: sensor.zone_config.sensor_id.clone(),
                    segment: sensor.segment_id.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn segment(&self, segment_id: &str) -> Option<&RoadSegmentProfile> {
        self.segments.iter().find(|s| s.segment_id == segment_id)
    }

    /// Profile and zone layout for the sensor owning `api_key`.
    ///
    /// # Errors
    /// `UnknownSensor` when no sensor uses the key.
    pub fn resolve(&self, api_key: &str) -> Result<(&RoadSegmentProfile, &SensorZoneConfig)> {
        let sensor = self
            .sensors
            .iter()
            .find(|s| s.api_key == api_key)
            .ok_or_else(|| Error::UnknownSensor(api_key.to_string()))?;
        let profile = self
            .segment(&sensor.segment_id)
            .ok_or_else(|| Error::UnknownSegment {
                sensor: sensor.zone_config.sensor_id.clone(),
                segment: sensor.segment_id.clone(),
            })?;
        Ok((profile, &sensor.zone_config))
    }
}
