//! Vehicle class number to category tables.
//!
//! Sensors report a numeric class per length band. Which band means which
//! category depends on the road type the sensor was configured for.

use crate::types::{Category, RoadType};
use serde::Serialize;

/// One length band of a road type's classification template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassTemplate {
    pub class_nr: u32,
    /// Lower length bound in metres.
    pub min_length_m: f64,
    /// Upper length bound in metres; `None` for the open-ended last class.
    pub max_length_m: Option<f64>,
}

const fn band(class_nr: u32, min_length_m: f64, max_length_m: f64) -> ClassTemplate {
    ClassTemplate {
        class_nr,
        min_length_m,
        max_length_m: Some(max_length_m),
    }
}

const fn open(class_nr: u32, min_length_m: f64) -> ClassTemplate {
    ClassTemplate {
        class_nr,
        min_length_m,
        max_length_m: None,
    }
}

const URBAN_TEMPLATE: &[ClassTemplate] = &[band(1, 0.0, 2.5), band(2, 2.5, 5.5), open(3, 5.5)];

const RURAL_TEMPLATE: &[ClassTemplate] = &[
    band(1, 0.0, 2.5),
    band(2, 2.5, 5.5),
    band(3, 5.5, 9.0),
    band(4, 9.0, 12.5),
    open(5, 12.5),
];

const FREEWAY_TEMPLATE: &[ClassTemplate] = &[
    band(1, 0.0, 5.5),
    band(2, 5.5, 9.0),
    band(3, 9.0, 12.5),
    open(4, 12.5),
];

const TWELVE_CLASS_TEMPLATE: &[ClassTemplate] = &[
    band(1, 1.0, 2.0),
    band(2, 2.0, 3.0),
    band(3, 3.0, 4.0),
    band(4, 4.0, 5.0),
    band(5, 5.0, 6.0),
    band(6, 6.0, 7.0),
    band(7, 7.0, 8.0),
    band(8, 8.0, 9.0),
    band(9, 9.0, 10.0),
    band(10, 10.0, 11.0),
    band(11, 11.0, 12.0),
    open(12, 12.0),
];

/// Length bands a sensor on this road type is configured with. Empty for
/// unrecognized road types.
#[must_use]
pub fn template(road_type: RoadType) -> &'static [ClassTemplate] {
    match road_type {
        RoadType::Urban => URBAN_TEMPLATE,
        RoadType::Rural => RURAL_TEMPLATE,
        RoadType::Freeway => FREEWAY_TEMPLATE,
        RoadType::TwelveClass => TWELVE_CLASS_TEMPLATE,
        RoadType::Unrecognized => &[],
    }
}

type ClassTable = &'static [(u32, Category)];

use Category::{Heavy as HV, Light as LV, NonMotorized as NM, TwoWheeler as TW};

const URBAN: ClassTable = &[(1, TW), (2, LV), (3, HV)];
const RURAL: ClassTable = &[(1, TW), (2, LV), (3, LV), (4, HV), (5, HV)];
const FREEWAY: ClassTable = &[(1, LV), (2, LV), (3, HV), (4, HV)];
const TWELVE_CLASS: ClassTable = &[
    (1, TW),
    (2, LV),
    (3, LV),
    (4, LV),
    (5, LV),
    (6, HV),
    (7, HV),
    (8, HV),
    (9, HV),
    (10, HV),
    (11, NM),
    (12, LV),
];

/// A method's set of class tables, one per recognized road type.
#[derive(Debug)]
pub struct ClassificationScheme {
    pub name: &'static str,
    tables: [(RoadType, ClassTable); 4],
}

impl ClassificationScheme {
    fn table(&self, road_type: RoadType) -> Option<ClassTable> {
        self.tables
            .iter()
            .find(|(rt, _)| *rt == road_type)
            .map(|(_, table)| *table)
    }

    /// Category for `class_nr`, or `None` when the road type has no table or
    /// the table has no entry. Callers fall back to `Category::Light`.
    #[must_use]
    pub fn lookup(&self, road_type: RoadType, class_nr: u32) -> Option<Category> {
        self.table(road_type)?
            .iter()
            .find(|(nr, _)| *nr == class_nr)
            .map(|(_, category)| *category)
    }

    /// Category with the light-vehicle fallback applied. The flag is false
    /// when the fallback was used.
    #[must_use]
    pub fn classify(&self, road_type: RoadType, class_nr: u32) -> (Category, bool) {
        match self.lookup(road_type, class_nr) {
            Some(category) => (category, true),
            None => (Category::Light, false),
        }
    }
}

pub static MKJI_1997: ClassificationScheme = ClassificationScheme {
    name: "MKJI 1997",
    tables: [
        (RoadType::Urban, URBAN),
        (RoadType::Rural, RURAL),
        (RoadType::Freeway, FREEWAY),
        (RoadType::TwelveClass, TWELVE_CLASS),
    ],
};

pub static PKJI_2023: ClassificationScheme = ClassificationScheme {
    name: "PKJI 2023",
    tables: [
        (RoadType::Urban, URBAN),
        (RoadType::Rural, RURAL),
        (RoadType::Freeway, FREEWAY),
        (RoadType::TwelveClass, TWELVE_CLASS),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_class_is_mapped() {
        for scheme in [&MKJI_1997, &PKJI_2023] {
            for road_type in RoadType::KNOWN {
                for class in template(road_type) {
                    assert!(
                        scheme.lookup(road_type, class.class_nr).is_some(),
                        "{} {road_type} class {} unmapped",
                        scheme.name,
                        class.class_nr
                    );
                }
            }
        }
    }

    #[test]
    fn templates_are_contiguous() {
        for road_type in RoadType::KNOWN {
            let bands = template(road_type);
            for pair in bands.windows(2) {
                assert_eq!(pair[0].max_length_m, Some(pair[1].min_length_m));
                assert_eq!(pair[1].class_nr, pair[0].class_nr + 1);
            }
            assert_eq!(bands.last().and_then(|b| b.max_length_m), None);
        }
    }

    #[test]
    fn freeway_has_no_two_wheelers() {
        assert_eq!(MKJI_1997.lookup(RoadType::Freeway, 1), Some(Category::Light));
        assert_eq!(PKJI_2023.lookup(RoadType::Freeway, 4), Some(Category::Heavy));
    }

    #[test]
    fn twelve_class_groups() {
        let scheme = &PKJI_2023;
        assert_eq!(scheme.lookup(RoadType::TwelveClass, 1), Some(Category::TwoWheeler));
        assert_eq!(scheme.lookup(RoadType::TwelveClass, 5), Some(Category::Light));
        assert_eq!(scheme.lookup(RoadType::TwelveClass, 10), Some(Category::Heavy));
        assert_eq!(scheme.lookup(RoadType::TwelveClass, 11), Some(Category::NonMotorized));
        assert_eq!(scheme.lookup(RoadType::TwelveClass, 12), Some(Category::Light));
    }

    #[test]
    fn unmapped_classes_fall_back_to_light() {
        assert_eq!(MKJI_1997.classify(RoadType::Urban, 9), (Category::Light, false));
        assert_eq!(MKJI_1997.classify(RoadType::Urban, 3), (Category::Heavy, true));
        assert_eq!(PKJI_2023.classify(RoadType::Unrecognized, 1), (Category::Light, false));
        assert!(template(RoadType::Unrecognized).is_empty());
    }
}
