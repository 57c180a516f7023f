//! The shared enriched dataset and the subsets views derive from it.

use std::collections::BTreeSet;

use chrono::{Datelike as _, NaiveDate};
use resale_map_api::InitialData;
use resale_map_enrich::{EnrichmentContext, PriceLookup};
use resale_map_geography::TownBoundaries;
use resale_map_property_models::{
    AggregatePricePoint, ChartType, DateWindow, EnrichedProperty, FlatType,
};

use crate::config::DashboardConfig;
use crate::selection::{OrderedSet, SelectionState};

/// Street-level price history, scoped to a town set.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StreetSeries {
    /// No town filter has been applied yet.
    #[default]
    NotLoaded,
    /// A request for `towns` is in flight.
    Pending {
        /// Town set the request was issued for.
        towns: Vec<String>,
    },
    /// History for `towns`.
    Loaded {
        /// Town set the data belongs to.
        towns: Vec<String>,
        /// Every flat type's points.
        points: Vec<AggregatePricePoint>,
    },
    /// The request for `towns` failed.
    Failed {
        /// Town set the request was issued for.
        towns: Vec<String>,
    },
}

/// Enriched records, price series, and boundaries.
#[derive(Debug)]
pub struct DataStore {
    records: Vec<EnrichedProperty>,
    lookup: PriceLookup,
    town_series: Vec<AggregatePricePoint>,
    street_series: StreetSeries,
    boundaries: TownBoundaries,
    full_range: DateWindow,
    towns: Vec<String>,
}

impl DataStore {
    /// Builds the store from already enriched records.
    ///
    /// `fallback_range` is used as the full date range when there are no
    /// records.
    #[must_use]
    pub fn new(
        records: Vec<EnrichedProperty>,
        lookup: PriceLookup,
        town_series: Vec<AggregatePricePoint>,
        boundaries: TownBoundaries,
        fallback_range: DateWindow,
    ) -> Self {
        let full_range =
            DateWindow::spanning(records.iter().map(|r| r.date)).unwrap_or(fallback_range);
        let towns = records
            .iter()
            .map(|r| r.town.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            records,
            lookup,
            town_series,
            street_series: StreetSeries::NotLoaded,
            boundaries,
            full_range,
            towns,
        }
    }

    /// Enriches the initial payload for `flat_type`.
    #[must_use]
    pub fn from_initial(
        initial: InitialData,
        flat_type: FlatType,
        config: &DashboardConfig,
        today: NaiveDate,
    ) -> Self {
        let lookup = PriceLookup::new(initial.address_prices);
        let ctx = EnrichmentContext {
            current_year: today.year(),
            window_start: config.window_start(),
        };
        let records = resale_map_enrich::enrich(&initial.properties, &lookup, flat_type, &ctx);
        let boundaries = TownBoundaries::from_feature_collection(
            &initial.boundaries,
            &config.geography.name_property,
        );
        if boundaries.is_empty() {
            log::warn!("No town boundaries decoded; viewport fitting falls back to points");
        }

        Self::new(
            records,
            lookup,
            initial.town_prices,
            boundaries,
            DateWindow::new(ctx.window_start, today),
        )
    }

    /// Every enriched record, sorted by date.
    #[must_use]
    pub fn records(&self) -> &[EnrichedProperty] {
        &self.records
    }

    /// Street-level price snapshot.
    #[must_use]
    pub const fn lookup(&self) -> &PriceLookup {
        &self.lookup
    }

    /// Town-level series for every flat type.
    #[must_use]
    pub fn town_series(&self) -> &[AggregatePricePoint] {
        &self.town_series
    }

    /// Street-level series state.
    #[must_use]
    pub const fn street_series(&self) -> &StreetSeries {
        &self.street_series
    }

    /// Town boundaries.
    #[must_use]
    pub const fn boundaries(&self) -> &TownBoundaries {
        &self.boundaries
    }

    /// Date range covered by the records; the brush's extent.
    #[must_use]
    pub const fn full_range(&self) -> DateWindow {
        self.full_range
    }

    /// Distinct towns, sorted.
    #[must_use]
    pub fn towns(&self) -> &[String] {
        &self.towns
    }

    /// Records inside the date window and passing the town filter.
    pub fn visible<'a>(
        &'a self,
        selection: &'a SelectionState,
    ) -> impl Iterator<Item = &'a EnrichedProperty> + 'a {
        self.records
            .iter()
            .filter(|r| selection.in_window(r.date) && selection.town_matches(&r.town))
    }

    /// Number of visible records; the displayed property count.
    #[must_use]
    pub fn visible_count(&self, selection: &SelectionState) -> usize {
        self.visible(selection).count()
    }

    /// Records in `town`.
    pub fn in_town<'a>(&'a self, town: &'a str) -> impl Iterator<Item = &'a EnrichedProperty> + 'a {
        self.records
            .iter()
            .filter(move |r| r.town.eq_ignore_ascii_case(town))
    }

    /// Records on `street`.
    pub fn on_street<'a>(
        &'a self,
        street: &'a str,
    ) -> impl Iterator<Item = &'a EnrichedProperty> + 'a {
        self.records.iter().filter(move |r| r.street == street)
    }

    /// Distinct streets in any of `towns`, sorted.
    #[must_use]
    pub fn streets_in(&self, towns: &OrderedSet) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| towns.iter().any(|t| t.eq_ignore_ascii_case(&r.town)))
            .map(|r| r.street.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The series the trend chart plots for the current grouping and flat
    /// type. Empty while street data is not loaded.
    #[must_use]
    pub fn trend_series(&self, selection: &SelectionState) -> Vec<AggregatePricePoint> {
        let source: &[AggregatePricePoint] = match (selection.chart_type(), &self.street_series) {
            (ChartType::Town, _) => &self.town_series,
            (ChartType::Street, StreetSeries::Loaded { points, .. }) => points,
            (ChartType::Street, _) => &[],
        };
        resale_map_aggregate::series_for_flat_type(source, selection.flat_type())
    }

    pub(crate) fn reprice(&mut self, flat_type: FlatType) {
        resale_map_enrich::reprice(&mut self.records, &self.lookup, flat_type);
    }

    pub(crate) fn set_street_series(&mut self, series: StreetSeries) {
        self.street_series = series;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn visible_intersects_window_and_towns() {
        let data = test_support::data_store();
        let mut selection = test_support::selection(&data);
        assert_eq!(data.visible_count(&selection), data.records().len());

        selection.toggle_town("TAMPINES");
        assert!(data.visible(&selection).all(|r| r.town == "TAMPINES"));

        let d = |y| NaiveDate::from_ymd_opt(y, 1, 1).unwrap();
        selection.set_date_window(DateWindow::new(d(1980), d(1990)));
        let expected = data
            .records()
            .iter()
            .filter(|r| r.town == "TAMPINES" && r.year >= 1980 && r.year <= 1990)
            .count();
        assert_eq!(data.visible_count(&selection), expected);
    }

    #[test]
    fn streets_in_selected_towns() {
        let data = test_support::data_store();
        let towns: OrderedSet = ["BEDOK"].into_iter().collect();
        let streets = data.streets_in(&towns);
        assert!(!streets.is_empty());
        assert!(streets.iter().all(|s| s.starts_with("BEDOK")));
    }

    #[test]
    fn trend_series_by_grouping() {
        let mut data = test_support::data_store();
        let mut selection = test_support::selection(&data);
        assert!(data.trend_series(&selection).iter().all(|p| p.flat_type == FlatType::FourRoom));
        assert!(!data.trend_series(&selection).is_empty());

        selection.toggle_town("BEDOK");
        assert!(data.trend_series(&selection).is_empty());

        data.set_street_series(StreetSeries::Loaded {
            towns: vec!["BEDOK".to_string()],
            points: test_support::street_points(&["BEDOK NTH AVE 1"]),
        });
        assert!(!data.trend_series(&selection).is_empty());
    }
}
