//! Cumulative count of developments per category over completion years.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use resale_map_property_models::{EnrichedProperty, PropertyTag};

/// Running total for one category at one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativePoint {
    /// Completion year.
    pub year: i32,
    /// First day of `year`, for time axes.
    pub date: NaiveDate,
    /// Developments of this category completed in or before `year`.
    pub count: u64,
}

/// The running totals of a single category, one point per year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySeries {
    /// Category.
    pub tag: PropertyTag,
    /// Points in ascending year order.
    pub points: Vec<CumulativePoint>,
}

/// Cumulative series for every category, in [`PropertyTag::all`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CumulativeSeries {
    /// One series per category. Empty when there are no records.
    pub categories: Vec<CategorySeries>,
}

impl CumulativeSeries {
    /// Whether there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.points.is_empty())
    }

    /// First and last year covered.
    #[must_use]
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let points = &self.categories.first()?.points;
        Some((points.first()?.year, points.last()?.year))
    }

    /// Largest running total across categories, for the y domain.
    #[must_use]
    pub fn max_count(&self) -> u64 {
        self.categories
            .iter()
            .filter_map(|c| c.points.last())
            .map(|p| p.count)
            .max()
            .unwrap_or(0)
    }

    /// Sum of all categories' running totals at `year`.
    #[must_use]
    pub fn total_at(&self, year: i32) -> u64 {
        self.categories
            .iter()
            .filter_map(|c| c.points.iter().find(|p| p.year == year))
            .map(|p| p.count)
            .sum()
    }
}

/// Builds the cumulative category series.
///
/// Every category gets a point for every year between the earliest and
/// latest completion year. Years without completions repeat the previous
/// running total.
#[must_use]
pub fn cumulative_by_category(records: &[EnrichedProperty]) -> CumulativeSeries {
    let Some(first_year) = records.iter().map(|r| r.year).min() else {
        return CumulativeSeries::default();
    };
    let last_year = records.iter().map(|r| r.year).max().unwrap_or(first_year);

    let mut per_year: BTreeMap<(PropertyTag, i32), u64> = BTreeMap::new();
    for record in records {
        *per_year.entry((record.tag, record.year)).or_insert(0) += 1;
    }

    let categories = PropertyTag::all()
        .iter()
        .map(|tag| {
            let mut running = 0_u64;
            let points = (first_year..=last_year)
                .filter_map(|year| {
                    running += per_year.get(&(*tag, year)).copied().unwrap_or(0);
                    NaiveDate::from_ymd_opt(year, 1, 1).map(|date| CumulativePoint {
                        year,
                        date,
                        count: running,
                    })
                })
                .collect();
            CategorySeries { tag: *tag, points }
        })
        .collect();

    CumulativeSeries { categories }
}
