//! Trend ranking: trailing-window mean price per group, with the top three
//! and bottom two groups singled out for highlighting.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use resale_map_property_models::AggregatePricePoint;

use crate::period::months_before;

/// Number of highest-mean groups highlighted.
pub const TOP_COUNT: usize = 3;

/// Number of lowest-mean groups highlighted.
pub const BOTTOM_COUNT: usize = 2;

/// Mean price of one group over the trailing window.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    /// Town or street name.
    pub group: String,
    /// Mean of available prices in the window.
    pub mean: f64,
    /// Number of prices averaged.
    pub samples: usize,
}

/// Where a highlighted group sits in the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    /// Position among the highest means, 0 = highest.
    Top(usize),
    /// Position among the lowest means, 0 = lowest.
    Bottom(usize),
}

/// Ranked groups and the highlighted subsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendRanking {
    ranked: Vec<GroupMean>,
    top: Vec<String>,
    bottom: Vec<String>,
    window: Option<(NaiveDate, NaiveDate)>,
}

impl TrendRanking {
    /// Groups with samples, highest mean first.
    #[must_use]
    pub fn ranked(&self) -> &[GroupMean] {
        &self.ranked
    }

    /// Highest-mean groups, highest first.
    #[must_use]
    pub fn top(&self) -> &[String] {
        &self.top
    }

    /// Lowest-mean groups, lowest first.
    #[must_use]
    pub fn bottom(&self) -> &[String] {
        &self.bottom
    }

    /// The `(exclusive start, inclusive end)` of the averaging window.
    #[must_use]
    pub const fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.window
    }

    /// Highlight position of a group, if any.
    #[must_use]
    pub fn highlight(&self, group: &str) -> Option<Highlight> {
        if let Some(i) = self.top.iter().position(|g| g == group) {
            return Some(Highlight::Top(i));
        }
        self.bottom
            .iter()
            .position(|g| g == group)
            .map(Highlight::Bottom)
    }

    /// All highlighted groups: top set then bottom set.
    pub fn highlighted(&self) -> impl Iterator<Item = &str> {
        self.top.iter().chain(self.bottom.iter()).map(String::as_str)
    }
}

/// Ranks groups by mean price over the `window_months` ending at the
/// latest date in `points`.
///
/// The window is `(max_date - window_months, max_date]`. Unavailable prices
/// are excluded from the means, groups with no samples in the window are
/// left out of the ranking, and ties are broken by group name. The bottom
/// set never repeats a group already in the top set.
#[must_use]
pub fn rank_groups(points: &[AggregatePricePoint], window_months: u32) -> TrendRanking {
    let Some(max_date) = points.iter().map(|p| p.date).max() else {
        return TrendRanking::default();
    };
    let window_start = months_before(max_date, window_months);

    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for point in points.iter().filter(|p| p.date > window_start) {
        if let Some(price) = point.price.value() {
            let entry = sums.entry(point.group.as_str()).or_insert((0.0, 0));
            entry.0 += price;
            entry.1 += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let mut ranked: Vec<GroupMean> = sums
        .into_iter()
        .map(|(group, (sum, samples))| GroupMean {
            group: group.to_string(),
            mean: sum / samples as f64,
            samples,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.mean
            .total_cmp(&a.mean)
            .then_with(|| a.group.cmp(&b.group))
    });

    let top: Vec<String> = ranked
        .iter()
        .take(TOP_COUNT)
        .map(|g| g.group.clone())
        .collect();
    let bottom_len = BOTTOM_COUNT.min(ranked.len() - top.len());
    let bottom: Vec<String> = ranked
        .iter()
        .rev()
        .take(bottom_len)
        .map(|g| g.group.clone())
        .collect();

    log::debug!(
        "Ranked {} groups over ({window_start}, {max_date}]: top={top:?} bottom={bottom:?}",
        ranked.len()
    );

    TrendRanking {
        ranked,
        top,
        bottom,
        window: Some((window_start, max_date)),
    }
}
