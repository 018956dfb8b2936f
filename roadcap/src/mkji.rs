//! MKJI 1997 tables.

use crate::capacity;
use crate::classification::{ClassificationScheme, MKJI_1997};
use crate::los::{LosBands, MKJI_1997_BANDS};
use crate::method::{Method, Methodology};
use crate::types::{Category, FrictionClass, FrictionType, LaneConfig, RoadType};

const FRICTION_GAP: f64 = 0.95;

pub struct MkjiTables;

impl Methodology for MkjiTables {
    fn method(&self) -> Method {
        Method::Mkji1997
    }

    fn category_code(&self, category: Category) -> &'static str {
        match category {
            Category::TwoWheeler => "MC",
            Category::Light => "LV",
            Category::Heavy => "HV",
            Category::NonMotorized => "UM",
        }
    }

    fn scheme(&self) -> &'static ClassificationScheme {
        &MKJI_1997
    }

    // smp weights do not vary by road type
    fn weight(&self, category: Category, _road_type: RoadType) -> f64 {
        match category {
            Category::TwoWheeler => 0.4,
            Category::Light => 1.0,
            Category::Heavy => 1.3,
            Category::NonMotorized => 0.0,
        }
    }

    fn base_capacity(&self, road_type: RoadType, lanes: LaneConfig) -> f64 {
        if road_type == RoadType::Freeway {
            return capacity::freeway_base_capacity(lanes);
        }
        match lanes {
            LaneConfig::TwoLaneUndivided => 2900.0,
            LaneConfig::FourLaneDivided => 1650.0 * 2.0,
            LaneConfig::FourLaneUndivided => 1500.0 * 2.0,
            LaneConfig::SixLaneDivided => 1650.0 * 3.0,
            LaneConfig::Unrecognized => 2900.0,
        }
    }

    fn lane_width_factor(&self, _road_type: RoadType, lanes: LaneConfig, width_m: i32) -> f64 {
        capacity::lane_width_factor(lanes, width_m)
    }

    fn friction_factor(&self, friction: FrictionType, class: FrictionClass) -> f64 {
        let row = match friction {
            FrictionType::Shoulder => [1.00, 0.98, 0.95, 0.90, 0.85],
            FrictionType::Kerb => [0.98, 0.95, 0.91, 0.85, 0.78],
            FrictionType::Unrecognized => return FRICTION_GAP,
        };
        capacity::friction_class_index(class).map_or(FRICTION_GAP, |i| row[i])
    }

    fn los_bands(&self) -> &'static LosBands {
        &MKJI_1997_BANDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_capacity_table() {
        let t = MkjiTables;
        assert_eq!(t.base_capacity(RoadType::Freeway, LaneConfig::FourLaneDivided), 4600.0);
        assert_eq!(t.base_capacity(RoadType::Freeway, LaneConfig::SixLaneDivided), 6900.0);
        assert_eq!(t.base_capacity(RoadType::Freeway, LaneConfig::TwoLaneUndivided), 4600.0);
        assert_eq!(t.base_capacity(RoadType::Urban, LaneConfig::FourLaneDivided), 3300.0);
        assert_eq!(t.base_capacity(RoadType::Rural, LaneConfig::FourLaneUndivided), 3000.0);
        assert_eq!(t.base_capacity(RoadType::TwelveClass, LaneConfig::SixLaneDivided), 4950.0);
        assert_eq!(t.base_capacity(RoadType::Unrecognized, LaneConfig::Unrecognized), 2900.0);
    }

    #[test]
    fn friction_table_and_gap() {
        let t = MkjiTables;
        assert_eq!(t.friction_factor(FrictionType::Shoulder, FrictionClass::VeryLow), 1.00);
        assert_eq!(t.friction_factor(FrictionType::Kerb, FrictionClass::VeryHigh), 0.78);
        assert_eq!(t.friction_factor(FrictionType::Kerb, FrictionClass::Unrecognized), 0.95);
        assert_eq!(t.friction_factor(FrictionType::Unrecognized, FrictionClass::Low), 0.95);
    }

    #[test]
    fn weights_ignore_road_type() {
        let t = MkjiTables;
        for road_type in RoadType::KNOWN {
            assert_eq!(t.weight(Category::TwoWheeler, road_type), 0.4);
            assert_eq!(t.weight(Category::Heavy, road_type), 1.3);
            assert_eq!(t.weight(Category::NonMotorized, road_type), 0.0);
        }
    }
}
