use crate::capacity;
use crate::classification::ClassificationScheme;
use crate::los::LosBands;
use crate::mkji::MkjiTables;
use crate::pkji::PkjiTables;
use crate::types::{Category, DirectionalSplit, FrictionClass, FrictionType, LaneConfig, RoadType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacity methodology a result was computed with.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Manual Kapasitas Jalan Indonesia 1997, flow in smp.
    Mkji1997,
    /// Pedoman Kapasitas Jalan Indonesia 2023, flow in skr.
    Pkji2023,
}

impl Method {
    pub const ALL: [Self; 2] = [Self::Mkji1997, Self::Pkji2023];

    #[must_use]
    pub const fn flow_unit(self) -> &'static str {
        match self {
            Self::Mkji1997 => "smp",
            Self::Pkji2023 => "skr",
        }
    }

    #[must_use]
    pub fn tables(self) -> &'static dyn Methodology {
        match self {
            Self::Mkji1997 => &MkjiTables,
            Self::Pkji2023 => &PkjiTables,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Mkji1997 => write!(f, "MKJI 1997"),
            Method::Pkji2023 => write!(f, "PKJI 2023"),
        }
    }
}

/// Lookup tables of one capacity methodology.
///
/// Every lookup is total: combinations a table does not cover return the
/// method's documented default instead of failing.
pub trait Methodology: Sync {
    fn method(&self) -> Method;

    /// Method-specific label of a category, e.g. `"MC"` or `"SM"`.
    fn category_code(&self, category: Category) -> &'static str;

    fn scheme(&self) -> &'static ClassificationScheme;

    /// Equivalency weight of one vehicle of `category`.
    fn weight(&self, category: Category, road_type: RoadType) -> f64;

    fn base_capacity(&self, road_type: RoadType, lanes: LaneConfig) -> f64;

    fn lane_width_factor(&self, road_type: RoadType, lanes: LaneConfig, width_m: i32) -> f64;

    fn split_factor(&self, lanes: LaneConfig, split: DirectionalSplit) -> f64 {
        capacity::directional_split_factor(lanes, split)
    }

    fn friction_factor(&self, friction: FrictionType, class: FrictionClass) -> f64;

    fn city_size_factor(&self, millions: f64) -> f64 {
        capacity::city_size_factor(millions)
    }

    fn los_bands(&self) -> &'static LosBands;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_report_their_own_method() {
        for method in Method::ALL {
            assert_eq!(method.tables().method(), method);
        }
    }

    #[test]
    fn category_codes() {
        let mkji = Method::Mkji1997.tables();
        let pkji = Method::Pkji2023.tables();
        let codes: Vec<_> = Category::ALL.iter().map(|c| mkji.category_code(*c)).collect();
        assert_eq!(codes, ["MC", "LV", "HV", "UM"]);
        let codes: Vec<_> = Category::ALL.iter().map(|c| pkji.category_code(*c)).collect();
        assert_eq!(codes, ["SM", "KR", "KB", "KTB"]);
    }

    #[test]
    fn display_and_units() {
        assert_eq!(Method::Mkji1997.to_string(), "MKJI 1997");
        assert_eq!(Method::Pkji2023.flow_unit(), "skr");
    }
}
