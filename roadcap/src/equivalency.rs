use crate::constants::DEFAULT_INTERVAL_MINUTES;
use crate::method::Methodology;
use crate::types::{CategoryCounts, ClassCount, RoadType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Category counts and weighted flow for a set of class counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub counts: CategoryCounts,
    /// Σ count × weight, in the method's flow unit.
    pub flow: f64,
    /// Class numbers that fell back to the light-vehicle category.
    pub unmapped: BTreeSet<u32>,
}

impl Tally {
    pub fn merge(&mut self, other: &Self) {
        self.counts.merge(&other.counts);
        self.flow += other.flow;
        self.unmapped.extend(other.unmapped.iter().copied());
    }
}

/// Classify and weight `classes` with one method's tables.
pub fn tally<'a, I>(classes: I, road_type: RoadType, tables: &dyn Methodology) -> Tally
where
    I: IntoIterator<Item = &'a ClassCount>,
{
    let scheme = tables.scheme();
    let mut out = Tally::default();

    for class in classes {
        let (category, mapped) = scheme.classify(road_type, class.class_nr);
        if !mapped {
            out.unmapped.insert(class.class_nr);
        }
        let vehicles = u64::from(class.vehicles);
        out.counts.add(category, vehicles);
        out.flow += vehicles as f64 * tables.weight(category, road_type);
    }

    out
}

/// Flow of already-categorized counts.
#[must_use]
pub fn standardized_flow(counts: &CategoryCounts, road_type: RoadType, tables: &dyn Methodology) -> f64 {
    crate::types::Category::ALL
        .iter()
        .map(|&category| counts.get(category) as f64 * tables.weight(category, road_type))
        .sum()
}

/// `60 / minutes`, with non-positive intervals treated as five minutes.
#[must_use]
pub fn hourly_multiplier(interval_minutes: i64) -> f64 {
    let minutes = if interval_minutes <= 0 {
        i64::from(DEFAULT_INTERVAL_MINUTES)
    } else {
        interval_minutes
    };
    60.0 / minutes as f64
}

#[must_use]
pub fn hourly_flow(flow: f64, interval_minutes: i64) -> f64 {
    flow * hourly_multiplier(interval_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::types::Category;

    fn class(class_nr: u32, vehicles: u32) -> ClassCount {
        ClassCount {
            class_nr,
            vehicles,
            avg_speed: 40.0,
        }
    }

    #[test]
    fn urban_mkji_flow() {
        let classes = [class(1, 10), class(2, 20), class(3, 5)];
        let t = tally(&classes, RoadType::Urban, Method::Mkji1997.tables());
        assert_eq!(t.counts.two_wheeler, 10);
        assert_eq!(t.counts.light, 20);
        assert_eq!(t.counts.heavy, 5);
        assert!((t.flow - (10.0 * 0.4 + 20.0 + 5.0 * 1.3)).abs() < 1e-9);
        assert!(t.unmapped.is_empty());
    }

    #[test]
    fn unmapped_class_is_counted_as_light_and_reported() {
        let classes = [class(7, 3)];
        let t = tally(&classes, RoadType::Urban, Method::Pkji2023.tables());
        assert_eq!(t.counts.light, 3);
        assert_eq!(t.flow, 3.0);
        assert_eq!(t.unmapped.iter().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn zero_weight_categories_do_not_contribute() {
        let classes = [class(1, 50), class(2, 4)];
        let freeway = tally(&classes, RoadType::Freeway, Method::Pkji2023.tables());
        // freeway class 1 is light, not a motorcycle
        assert_eq!(freeway.flow, 54.0);

        let classes = [class(11, 40)];
        for method in Method::ALL {
            let t = tally(&classes, RoadType::TwelveClass, method.tables());
            assert_eq!(t.counts.non_motorized, 40);
            assert_eq!(t.flow, 0.0);
        }
    }

    #[test]
    fn flow_of_counts_matches_tally() {
        let classes = [class(1, 8), class(2, 3), class(4, 2), class(5, 1)];
        let tables = Method::Pkji2023.tables();
        let t = tally(&classes, RoadType::Rural, tables);
        assert!((standardized_flow(&t.counts, RoadType::Rural, tables) - t.flow).abs() < 1e-9);
        assert_eq!(t.counts.get(Category::Heavy), 3);
    }

    #[test]
    fn hourly_extrapolation() {
        assert_eq!(hourly_multiplier(5), 12.0);
        assert_eq!(hourly_multiplier(0), 12.0);
        assert_eq!(hourly_multiplier(-2), 12.0);
        assert_eq!(hourly_multiplier(15), 4.0);
        assert_eq!(hourly_flow(10.0, 60), 10.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn zero_weight_counts_never_add_flow(
                base in proptest::collection::vec((1u32..13, 0u32..500), 0..10),
                extra in 0u32..10_000,
            ) {
                let classes: Vec<ClassCount> = base.iter().map(|&(n, v)| class(n, v)).collect();
                for method in Method::ALL {
                    let tables = method.tables();
                    for road_type in RoadType::KNOWN {
                        let mut counts = tally(&classes, road_type, tables).counts;
                        let before = standardized_flow(&counts, road_type, tables);
                        for category in Category::ALL {
                            if tables.weight(category, road_type) == 0.0 {
                                counts.add(category, u64::from(extra));
                            }
                        }
                        let after = standardized_flow(&counts, road_type, tables);
                        prop_assert_eq!(before, after);
                    }
                }
            }
        }
    }
}
