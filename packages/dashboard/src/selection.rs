//! The selection state shared by every view.
//!
//! [`SelectionState`] is read-only outside this crate. All mutation goes
//! through the transition function, which keeps two invariants after every
//! event:
//!
//! * `chart_type == Street` iff a specific town is selected
//! * no street is selected while `chart_type == Town`

use chrono::NaiveDate;
use resale_map_property_models::{ALL_TOWNS, ChartType, ColorMode, DateWindow, FlatType};
use serde::Serialize;

/// An insertion-ordered set of names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OrderedSet {
    items: Vec<String>,
}

impl OrderedSet {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Whether `value` is present.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|v| v == value)
    }

    /// Appends `value` if absent. Returns whether it was added.
    pub fn insert(&mut self, value: &str) -> bool {
        if self.contains(value) {
            return false;
        }
        self.items.push(value.to_string());
        true
    }

    /// Removes `value`. Returns whether it was present.
    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|v| v != value);
        self.items.len() != before
    }

    /// Adds `value` if absent, removes it otherwise. Returns whether it is
    /// now present.
    pub fn toggle(&mut self, value: &str) -> bool {
        if self.remove(value) {
            false
        } else {
            self.items.push(value.to_string());
            true
        }
    }

    /// Removes everything, returning the removed values in order.
    pub fn clear(&mut self) -> Vec<String> {
        std::mem::take(&mut self.items)
    }

    /// Keeps only values matching `keep`, returning the removed ones.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let (kept, removed) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|v| keep(v));
        self.items = kept;
        removed
    }

    /// The most recently added value.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.items.last().map(String::as_str)
    }

    /// Values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Values in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    /// Number of values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The values sorted, for order-insensitive comparison.
    #[must_use]
    pub fn sorted(&self) -> Vec<String> {
        let mut items = self.items.clone();
        items.sort();
        items
    }
}

impl<S: AsRef<str>> FromIterator<S> for OrderedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value.as_ref());
        }
        set
    }
}

/// Result of toggling a town checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TownToggle {
    /// Town set before the toggle.
    pub previous: OrderedSet,
    /// Streets cleared because the chart fell back to town grouping.
    pub cleared_streets: Vec<String>,
}

/// The single source of truth for what the user has selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    selected_towns: OrderedSet,
    selected_streets: OrderedSet,
    selected_flat_type: FlatType,
    selected_color_mode: ColorMode,
    chart_type: ChartType,
    date_window: DateWindow,
}

impl SelectionState {
    /// Startup state: no town filter, no streets, the full date range.
    #[must_use]
    pub const fn new(flat_type: FlatType, color_mode: ColorMode, full_range: DateWindow) -> Self {
        Self {
            selected_towns: OrderedSet::new(),
            selected_streets: OrderedSet::new(),
            selected_flat_type: flat_type,
            selected_color_mode: color_mode,
            chart_type: ChartType::Town,
            date_window: full_range,
        }
    }

    /// Selected towns. Empty or `["All Towns"]` means no filter.
    #[must_use]
    pub const fn towns(&self) -> &OrderedSet {
        &self.selected_towns
    }

    /// Selected streets. Always empty while grouped by town.
    #[must_use]
    pub const fn streets(&self) -> &OrderedSet {
        &self.selected_streets
    }

    /// Active flat type.
    #[must_use]
    pub const fn flat_type(&self) -> FlatType {
        self.selected_flat_type
    }

    /// Active color mode.
    #[must_use]
    pub const fn color_mode(&self) -> ColorMode {
        self.selected_color_mode
    }

    /// Trend chart grouping, derived from the town selection.
    #[must_use]
    pub const fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    /// Active date window.
    #[must_use]
    pub const fn date_window(&self) -> DateWindow {
        self.date_window
    }

    /// Whether a specific town filter is active.
    #[must_use]
    pub const fn has_town_filter(&self) -> bool {
        matches!(self.chart_type, ChartType::Street)
    }

    /// Whether `town` passes the town filter.
    #[must_use]
    pub fn town_matches(&self, town: &str) -> bool {
        !self.has_town_filter() || self.selected_towns.iter().any(|t| t.eq_ignore_ascii_case(town))
    }

    /// The set the trend chart treats as selected: streets when grouped by
    /// street, nothing when grouped by town.
    #[must_use]
    pub const fn trend_selection(&self) -> &OrderedSet {
        &self.selected_streets
    }

    /// Whether `date` lies in the date window.
    #[must_use]
    pub fn in_window(&self, date: NaiveDate) -> bool {
        self.date_window.contains(date)
    }

    /// Whether both invariants hold.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let specific = self.selected_towns.iter().any(|t| t != ALL_TOWNS);
        let chart_ok = matches!(self.chart_type, ChartType::Street) == specific;
        let streets_ok =
            matches!(self.chart_type, ChartType::Street) || self.selected_streets.is_empty();
        chart_ok && streets_ok
    }

    /// Toggles a town checkbox.
    ///
    /// `"All Towns"` is exclusive: selecting it drops every specific town,
    /// and selecting a specific town drops it. Falling back to town
    /// grouping clears the street selection.
    pub(crate) fn toggle_town(&mut self, town: &str) -> TownToggle {
        let previous = self.selected_towns.clone();

        if town == ALL_TOWNS {
            if !self.selected_towns.remove(ALL_TOWNS) {
                self.selected_towns.clear();
                self.selected_towns.insert(ALL_TOWNS);
            }
        } else {
            self.selected_towns.remove(ALL_TOWNS);
            self.selected_towns.toggle(town);
        }

        self.chart_type = if self.selected_towns.iter().any(|t| t != ALL_TOWNS) {
            ChartType::Street
        } else {
            ChartType::Town
        };

        let cleared_streets = if self.has_town_filter() {
            Vec::new()
        } else {
            self.selected_streets.clear()
        };

        TownToggle {
            previous,
            cleared_streets,
        }
    }

    /// Toggles a street. Returns `None` when grouped by town, otherwise
    /// whether the street is now selected.
    pub(crate) fn toggle_street(&mut self, street: &str) -> Option<bool> {
        self.has_town_filter()
            .then(|| self.selected_streets.toggle(street))
    }

    /// Adds a street. Returns `None` when grouped by town, otherwise
    /// whether it was newly added.
    pub(crate) fn add_street(&mut self, street: &str) -> Option<bool> {
        self.has_town_filter()
            .then(|| self.selected_streets.insert(street))
    }

    pub(crate) fn clear_streets(&mut self) -> Vec<String> {
        self.selected_streets.clear()
    }

    pub(crate) fn retain_streets(&mut self, keep: impl FnMut(&str) -> bool) -> Vec<String> {
        self.selected_streets.retain(keep)
    }

    pub(crate) const fn set_flat_type(&mut self, flat_type: FlatType) {
        self.selected_flat_type = flat_type;
    }

    pub(crate) const fn set_color_mode(&mut self, mode: ColorMode) {
        self.selected_color_mode = mode;
    }

    pub(crate) const fn set_date_window(&mut self, window: DateWindow) {
        self.date_window = window;
    }
}
