use crate::method::{Method, Methodology};
use crate::types::{DirectionalSplit, FrictionClass, LaneConfig, RoadSegmentProfile, RoadType};
use serde::{Deserialize, Serialize};

/// Which adjustment factors a road type uses. Inactive factors are pinned to
/// 1.0 so capacity stays a five-term product.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub struct FactorActivation {
    pub side_friction: bool,
    pub city_size: bool,
}

impl FactorActivation {
    #[must_use]
    pub const fn for_road_type(road_type: RoadType) -> Self {
        match road_type {
            RoadType::Urban | RoadType::Unrecognized => Self {
                side_friction: true,
                city_size: true,
            },
            RoadType::Rural | RoadType::TwelveClass => Self {
                side_friction: true,
                city_size: false,
            },
            RoadType::Freeway => Self {
                side_friction: false,
                city_size: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityFactors {
    pub base_capacity: f64,
    pub lane_width: f64,
    pub directional_split: f64,
    pub side_friction: f64,
    pub city_size: f64,
}

impl CapacityFactors {
    #[must_use]
    pub fn capacity(&self) -> f64 {
        self.base_capacity * self.lane_width * self.directional_split * self.side_friction * self.city_size
    }
}

/// Base capacity and multipliers for `profile` under `method`.
#[must_use]
pub fn capacity_factors(profile: &RoadSegmentProfile, method: Method) -> CapacityFactors {
    factors_with(profile, method.tables())
}

pub(crate) fn factors_with(profile: &RoadSegmentProfile, tables: &dyn Methodology) -> CapacityFactors {
    let active = FactorActivation::for_road_type(profile.road_type);

    let side_friction = if active.side_friction {
        tables.friction_factor(profile.friction_type, profile.friction_class)
    } else {
        1.0
    };
    let city_size = if active.city_size {
        tables.city_size_factor(profile.city_size_millions)
    } else {
        1.0
    };

    CapacityFactors {
        base_capacity: tables.base_capacity(profile.road_type, profile.lane_config),
        lane_width: tables.lane_width_factor(profile.road_type, profile.lane_config, profile.lane_width_m),
        directional_split: tables.split_factor(profile.lane_config, profile.directional_split),
        side_friction,
        city_size,
    }
}

// Tables both methods share.

pub(crate) fn freeway_base_capacity(lanes: LaneConfig) -> f64 {
    match lanes {
        LaneConfig::SixLaneDivided => 2300.0 * 3.0,
        _ => 2300.0 * 2.0,
    }
}

pub(crate) fn lane_width_factor(lanes: LaneConfig, width_m: i32) -> f64 {
    if lanes == LaneConfig::TwoLaneUndivided {
        return match width_m {
            i32::MIN..=5 => 0.56,
            6 => 0.87,
            7 => 1.00,
            _ => 1.14,
        };
    }
    match width_m {
        i32::MIN..=5 => 0.69,
        6 => 0.91,
        7 => 1.00,
        8 => 1.04,
        _ => 1.08,
    }
}

pub(crate) fn directional_split_factor(lanes: LaneConfig, split: DirectionalSplit) -> f64 {
    if lanes.is_divided() {
        return 1.0;
    }
    match split {
        DirectionalSplit::Split50 => 1.00,
        DirectionalSplit::Split55 => 0.97,
        DirectionalSplit::Split60 => 0.94,
        DirectionalSplit::Split65 => 0.91,
        DirectionalSplit::Split70 => 0.88,
        DirectionalSplit::Unrecognized => 1.00,
    }
}

pub(crate) fn city_size_factor(millions: f64) -> f64 {
    match millions {
        m if m < 0.1 => 0.86,
        m if m < 0.5 => 0.90,
        m if m < 1.0 => 0.94,
        m if m < 3.0 => 1.00,
        _ => 1.04,
    }
}

/// Column of a friction class in the VL..VH rows.
pub(crate) const fn friction_class_index(class: FrictionClass) -> Option<usize> {
    match class {
        FrictionClass::VeryLow => Some(0),
        FrictionClass::Low => Some(1),
        FrictionClass::Medium => Some(2),
        FrictionClass::High => Some(3),
        FrictionClass::VeryHigh => Some(4),
        FrictionClass::Unrecognized => None,
    }
}
