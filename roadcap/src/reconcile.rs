use crate::types::{RawClassReading, RawZoneReading, SensorZoneConfig, ZoneLabel, ZoneMetrics};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Zone ids that did not line up with the sensor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAnomalies {
    /// Reported by the payload but not configured; their data was dropped.
    pub extra: Vec<u32>,
    /// Configured but absent from the payload; zero-filled.
    pub missing: Vec<u32>,
    /// Reported more than once; the last occurrence was kept.
    pub duplicate: Vec<u32>,
}

impl ZoneAnomalies {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty() && self.duplicate.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledZone {
    /// 1-based configured position.
    pub index: u32,
    pub label: ZoneLabel,
    pub classes: Vec<RawClassReading>,
    pub metrics: ZoneMetrics,
    pub reported: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub sensor_id: String,
    /// Exactly one entry per configured zone, in configured order.
    pub zones: Vec<ReconciledZone>,
    pub anomalies: ZoneAnomalies,
}

/// Align the zones of one payload with the sensor's configured zones.
///
/// Never fails. Configured zones are keyed by their 1-based position;
/// anything else in `incoming` is reported as extra.
#[must_use]
pub fn reconcile(config: &SensorZoneConfig, incoming: &[RawZoneReading]) -> Reconciliation {
    let mut by_id: BTreeMap<u32, &RawZoneReading> = BTreeMap::new();
    let mut duplicate = BTreeSet::new();
    for zone in incoming {
        if by_id.insert(zone.zone_id, zone).is_some() {
            duplicate.insert(zone.zone_id);
        }
    }

    let mut missing = Vec::new();
    let zones: Vec<ReconciledZone> = config
        .zones
        .iter()
        .zip(1u32..)
        .map(|(label, index)| match by_id.remove(&index) {
            Some(raw) => ReconciledZone {
                index,
                label: label.clone(),
                classes: raw.classes.clone(),
                metrics: raw.metrics,
                reported: true,
            },
            None => {
                missing.push(index);
                ReconciledZone {
                    index,
                    label: label.clone(),
                    classes: Vec::new(),
                    metrics: ZoneMetrics::default(),
                    reported: false,
                }
            }
        })
        .collect();

    // whatever is left was never configured
    let extra: Vec<u32> = by_id.into_keys().collect();

    let anomalies = ZoneAnomalies {
        extra,
        missing,
        duplicate: duplicate.into_iter().collect(),
    };

    if !anomalies.extra.is_empty() {
        warn!(
            "Sensor {}: dropping data for unconfigured zones {:?}",
            config.sensor_id, anomalies.extra
        );
    }
    if !anomalies.missing.is_empty() {
        warn!(
            "Sensor {}: zones {:?} missing from payload, zero-filled",
            config.sensor_id, anomalies.missing
        );
    }
    if !anomalies.duplicate.is_empty() {
        warn!(
            "Sensor {}: zones {:?} reported more than once, keeping last",
            config.sensor_id, anomalies.duplicate
        );
    }

    Reconciliation {
        sensor_id: config.sensor_id.clone(),
        zones,
        anomalies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n: usize) -> SensorZoneConfig {
        SensorZoneConfig {
            sensor_id: "CAM-1".to_string(),
            zones: (1..=n)
                .map(|i| ZoneLabel {
                    zone_id: format!("Z{i}"),
                    direction: if i % 2 == 0 { "south".into() } else { "north".into() },
                })
                .collect(),
        }
    }

    fn zone(zone_id: u32, vehicles: u32) -> RawZoneReading {
        RawZoneReading {
            zone_id,
            classes: vec![RawClassReading {
                class_nr: 2,
                vehicles,
                avg_speed: 40.0,
                gap_time: 2.0,
            }],
            metrics: ZoneMetrics::default(),
        }
    }

    #[test]
    fn missing_zone_is_zero_filled() {
        let result = reconcile(&config(2), &[zone(1, 5)]);
        assert_eq!(result.zones.len(), 2);
        assert!(result.zones[0].reported);
        assert!(!result.zones[1].reported);
        assert!(result.zones[1].classes.is_empty());
        assert_eq!(result.zones[1].label.zone_id, "Z2");
        assert_eq!(result.anomalies.missing, vec![2]);
        assert!(result.anomalies.extra.is_empty());
    }

    #[test]
    fn extra_zones_are_dropped_and_reported() {
        let result = reconcile(&config(1), &[zone(3, 9), zone(1, 5), zone(0, 1)]);
        assert_eq!(result.zones.len(), 1);
        assert_eq!(result.zones[0].classes[0].vehicles, 5);
        assert_eq!(result.anomalies.extra, vec![0, 3]);
    }

    #[test]
    fn duplicate_keeps_last_occurrence() {
        let result = reconcile(&config(1), &[zone(1, 5), zone(1, 8)]);
        assert_eq!(result.zones[0].classes[0].vehicles, 8);
        assert_eq!(result.anomalies.duplicate, vec![1]);
    }

    #[test]
    fn order_follows_configuration() {
        let result = reconcile(&config(3), &[zone(3, 3), zone(2, 2), zone(1, 1)]);
        let order: Vec<u32> = result.zones.iter().map(|z| z.index).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(result.zones[2].classes[0].vehicles, 3);
        assert!(result.anomalies.is_empty());
    }

    #[test]
    fn empty_configuration() {
        let result = reconcile(&config(0), &[zone(1, 5)]);
        assert!(result.zones.is_empty());
        assert_eq!(result.anomalies.extra, vec![1]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn output_has_one_entry_per_configured_zone(
                n in 0usize..12,
                ids in proptest::collection::vec(0u32..20, 0..20),
            ) {
                let incoming: Vec<_> = ids.iter().map(|&id| zone(id, 1)).collect();
                let result = reconcile(&config(n), &incoming);

                prop_assert_eq!(result.zones.len(), n);
                for extra in &result.anomalies.extra {
                    prop_assert!(*extra == 0 || *extra as usize > n);
                }
                for z in &result.zones {
                    prop_assert_eq!(z.reported, ids.contains(&z.index));
                    prop_assert_eq!(z.reported, !result.anomalies.missing.contains(&z.index));
                }
            }
        }
    }
}
