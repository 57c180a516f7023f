#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation pipeline over the enriched record set and price series.
//!
//! Two independent algorithms live here:
//!
//! - [`cumulative::cumulative_by_category`] feeds the timeline with a
//!   running count of completed developments per category per year.
//! - [`ranking::rank_groups`] feeds the trend chart with the trailing
//!   mean price per town or street and the highlighted top/bottom groups.
//!
//! Both are recomputed from scratch whenever their inputs change.

pub mod cumulative;
pub mod period;
pub mod ranking;

use std::collections::BTreeMap;

use resale_map_property_models::{AggregatePricePoint, FlatType};

pub use cumulative::{CategorySeries, CumulativePoint, CumulativeSeries, cumulative_by_category};
pub use ranking::{BOTTOM_COUNT, GroupMean, Highlight, TOP_COUNT, TrendRanking, rank_groups};

/// Points of `series` for one flat type, sorted by group then date.
#[must_use]
pub fn series_for_flat_type(
    series: &[AggregatePricePoint],
    flat_type: FlatType,
) -> Vec<AggregatePricePoint> {
    let mut points: Vec<AggregatePricePoint> = series
        .iter()
        .filter(|p| p.flat_type == flat_type)
        .cloned()
        .collect();
    points.sort_by(|a, b| a.group.cmp(&b.group).then(a.date.cmp(&b.date)));
    points
}

/// Buckets points by group key, preserving each group's point order.
#[must_use]
pub fn group_series(points: &[AggregatePricePoint]) -> BTreeMap<&str, Vec<&AggregatePricePoint>> {
    let mut groups: BTreeMap<&str, Vec<&AggregatePricePoint>> = BTreeMap::new();
    for point in points {
        groups.entry(point.group.as_str()).or_default().push(point);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use resale_map_property_models::Price;

    fn point(group: &str, month: u32, flat_type: FlatType) -> AggregatePricePoint {
        AggregatePricePoint {
            group: group.to_string(),
            date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            flat_type,
            price: Price::Available(1.0),
        }
    }

    #[test]
    fn filters_and_orders_by_flat_type() {
        let series = vec![
            point("B", 2, FlatType::FourRoom),
            point("A", 3, FlatType::FourRoom),
            point("A", 1, FlatType::FourRoom),
            point("A", 1, FlatType::FiveRoom),
        ];
        let points = series_for_flat_type(&series, FlatType::FourRoom);
        let keys: Vec<(&str, u32)> = points
            .iter()
            .map(|p| (p.group.as_str(), chrono::Datelike::month(&p.date)))
            .collect();
        assert_eq!(keys, vec![("A", 1), ("A", 3), ("B", 2)]);

        let groups = group_series(&points);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["A"].len(), 2);
    }
}
