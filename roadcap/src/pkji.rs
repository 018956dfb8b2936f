//! PKJI 2023 tables.

use crate::capacity;
use crate::classification::{ClassificationScheme, PKJI_2023};
use crate::los::{LosBands, PKJI_2023_BANDS};
use crate::method::{Method, Methodology};
use crate::types::{Category, FrictionClass, FrictionType, LaneConfig, RoadType};

const FRICTION_GAP: f64 = 0.93;

/// Weight for motorized categories on road types the skr table lacks.
const WEIGHT_GAP: f64 = 1.0;

pub struct PkjiTables;

impl Methodology for PkjiTables {
    fn method(&self) -> Method {
        Method::Pkji2023
    }

    fn category_code(&self, category: Category) -> &'static str {
        match category {
            Category::TwoWheeler => "SM",
            Category::Light => "KR",
            Category::Heavy => "KB",
            Category::NonMotorized => "KTB",
        }
    }

    fn scheme(&self) -> &'static ClassificationScheme {
        &PKJI_2023
    }

    fn weight(&self, category: Category, road_type: RoadType) -> f64 {
        let row = match road_type {
            RoadType::Urban => [0.25, 1.0, 1.2],
            RoadType::Rural => [0.5, 1.0, 1.2],
            RoadType::Freeway => [0.0, 1.0, 1.2],
            RoadType::TwelveClass | RoadType::Unrecognized => [WEIGHT_GAP; 3],
        };
        match category {
            Category::TwoWheeler => row[0],
            Category::Light => row[1],
            Category::Heavy => row[2],
            Category::NonMotorized => 0.0,
        }
    }

    fn base_capacity(&self, road_type: RoadType, lanes: LaneConfig) -> f64 {
        match road_type {
            RoadType::Freeway => capacity::freeway_base_capacity(lanes),
            RoadType::Rural | RoadType::TwelveClass => match lanes {
                LaneConfig::TwoLaneUndivided => 3100.0,
                LaneConfig::FourLaneDivided => 1700.0 * 2.0,
                LaneConfig::FourLaneUndivided => 1550.0 * 2.0,
                LaneConfig::SixLaneDivided => 1700.0 * 3.0,
                LaneConfig::Unrecognized => 3100.0,
            },
            RoadType::Urban | RoadType::Unrecognized => match lanes {
                LaneConfig::TwoLaneUndivided => 2900.0,
                LaneConfig::FourLaneDivided => 1650.0 * 2.0,
                LaneConfig::FourLaneUndivided => 1500.0 * 2.0,
                LaneConfig::SixLaneDivided => 1650.0 * 3.0,
                LaneConfig::Unrecognized => 2900.0,
            },
        }
    }

    fn lane_width_factor(&self, road_type: RoadType, lanes: LaneConfig, width_m: i32) -> f64 {
        if road_type != RoadType::Freeway {
            return capacity::lane_width_factor(lanes, width_m);
        }
        match width_m {
            i32::MIN..=5 => 0.90,
            6 => 0.95,
            7 => 1.00,
            _ => 1.03,
        }
    }

    fn friction_factor(&self, friction: FrictionType, class: FrictionClass) -> f64 {
        let row = match friction {
            FrictionType::Shoulder => [1.00, 0.97, 0.93, 0.87, 0.81],
            FrictionType::Kerb => [0.98, 0.94, 0.89, 0.82, 0.73],
            FrictionType::Unrecognized => return FRICTION_GAP,
        };
        capacity::friction_class_index(class).map_or(FRICTION_GAP, |i| row[i])
    }

    fn los_bands(&self) -> &'static LosBands {
        &PKJI_2023_BANDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rural_and_twelve_class_share_base_capacity() {
        let t = PkjiTables;
        for road_type in [RoadType::Rural, RoadType::TwelveClass] {
            assert_eq!(t.base_capacity(road_type, LaneConfig::TwoLaneUndivided), 3100.0);
            assert_eq!(t.base_capacity(road_type, LaneConfig::FourLaneDivided), 3400.0);
            assert_eq!(t.base_capacity(road_type, LaneConfig::FourLaneUndivided), 3100.0);
            assert_eq!(t.base_capacity(road_type, LaneConfig::SixLaneDivided), 5100.0);
        }
        assert_eq!(t.base_capacity(RoadType::Unrecognized, LaneConfig::FourLaneDivided), 3300.0);
        assert_eq!(t.base_capacity(RoadType::Freeway, LaneConfig::SixLaneDivided), 6900.0);
    }

    #[test]
    fn freeway_lane_width_has_its_own_table() {
        let t = PkjiTables;
        let lanes = LaneConfig::FourLaneDivided;
        assert_eq!(t.lane_width_factor(RoadType::Freeway, lanes, 4), 0.90);
        assert_eq!(t.lane_width_factor(RoadType::Freeway, lanes, 6), 0.95);
        assert_eq!(t.lane_width_factor(RoadType::Freeway, lanes, 9), 1.03);
        assert_eq!(t.lane_width_factor(RoadType::Urban, lanes, 9), 1.08);
    }

    #[test]
    fn motorcycle_weight_depends_on_road_type() {
        let t = PkjiTables;
        assert_eq!(t.weight(Category::TwoWheeler, RoadType::Urban), 0.25);
        assert_eq!(t.weight(Category::TwoWheeler, RoadType::Rural), 0.5);
        assert_eq!(t.weight(Category::TwoWheeler, RoadType::Freeway), 0.0);
        assert_eq!(t.weight(Category::TwoWheeler, RoadType::TwelveClass), 1.0);
        assert_eq!(t.weight(Category::Heavy, RoadType::Unrecognized), 1.0);
        assert_eq!(t.weight(Category::NonMotorized, RoadType::TwelveClass), 0.0);
    }

    #[test]
    fn friction_gap_is_method_specific() {
        let t = PkjiTables;
        assert_eq!(t.friction_factor(FrictionType::Kerb, FrictionClass::VeryHigh), 0.73);
        assert_eq!(t.friction_factor(FrictionType::Shoulder, FrictionClass::Unrecognized), 0.93);
    }
}
