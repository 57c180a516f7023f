//! The single transition function.
//!
//! Every [`UiEvent`] and every street-price arrival goes through here. Each
//! handler mutates the [`DashboardState`] and returns the ordered
//! [`SyncEffect`]s the views must apply, plus at most one street-price
//! request for the caller to execute. Invariants hold when a handler
//! returns, including across the awaited fetch.

use chrono::NaiveDate;
use resale_map_api::ApiError;
use resale_map_property_models::{
    ALL_TOWNS, AggregatePricePoint, ChartType, ColorMode, DateWindow, FlatType,
};

use crate::dashboard::DashboardState;
use crate::data::StreetSeries;
use crate::effect::{HighlightKind, SyncEffect};
use crate::event::UiEvent;
use crate::fetch::StreetPriceRequest;
use crate::selection::{OrderedSet, TownToggle};
use crate::views::{TimeScale, TrendHover};

/// Highest pitch the map accepts.
pub const MAX_PITCH: f64 = 85.0;

/// Output of one transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Effects in the order views must observe them.
    pub effects: Vec<SyncEffect>,
    /// Street-price request to execute, if the transition issued one.
    pub request: Option<StreetPriceRequest>,
}

impl Transition {
    fn push(&mut self, effect: SyncEffect) {
        self.effects.push(effect);
    }

    fn highlight_added(&mut self, kind: HighlightKind, key: &str) {
        self.push(SyncEffect::HighlightAdded {
            kind,
            key: key.to_string(),
        });
    }

    fn highlight_removed(&mut self, kind: HighlightKind, key: &str) {
        self.push(SyncEffect::HighlightRemoved {
            kind,
            key: key.to_string(),
        });
    }
}

/// Applies one user event.
pub fn transition(state: &mut DashboardState, event: UiEvent) -> Transition {
    log::debug!("Transition: {event:?}");
    let mut out = Transition::default();

    match event {
        UiEvent::TownToggled { town } => toggle_town(state, &town, &mut out),
        UiEvent::StreetToggled { street } => toggle_street(state, &street, false, &mut out),
        UiEvent::FlatTypeChanged { flat_type } => change_flat_type(state, flat_type, &mut out),
        UiEvent::ColorModeChanged { color_mode } => change_color_mode(state, color_mode, &mut out),
        UiEvent::BrushMoved { start, end } => {
            set_date_window(state, DateWindow::new(start, end), &mut out);
        }
        UiEvent::BrushPixels { x0, x1 } => {
            let scale = TimeScale::new(state.data.full_range(), state.config.timeline.width);
            set_date_window(state, scale.invert_range(x0, x1), &mut out);
        }
        UiEvent::BrushCleared => {
            out.push(SyncEffect::BrushReset);
            let full_range = state.data.full_range();
            set_date_window(state, full_range, &mut out);
        }
        UiEvent::TrendPointClicked { group } => match state.selection.chart_type() {
            ChartType::Town => toggle_town(state, &group, &mut out),
            ChartType::Street => toggle_street(state, &group, true, &mut out),
        },
        UiEvent::TrendPointHovered { group, date } => hover(state, group, date, &mut out),
        UiEvent::TrendPointLeft => {
            if state.view.hover.take().is_some() {
                out.push(SyncEffect::TrendAppearanceChanged);
            }
        }
        UiEvent::MapMarkerClicked { street } => click_marker(state, &street, &mut out),
        UiEvent::PitchChanged { pitch } => change_pitch(state, pitch, &mut out),
        UiEvent::ClusteringToggled { enabled } => toggle_clustering(state, enabled, &mut out),
    }

    debug_assert!(state.selection.is_consistent());
    out
}

/// Applies the result of a street-price request.
///
/// Responses whose town set no longer matches the selection are dropped
/// without effects.
pub fn apply_street_prices(
    state: &mut DashboardState,
    request: &StreetPriceRequest,
    result: Result<Vec<AggregatePricePoint>, ApiError>,
) -> Transition {
    let mut out = Transition::default();
    if !state.fetches.accept(request, &state.selection) {
        return out;
    }

    let towns = request.towns.clone();
    match result {
        Ok(points) => {
            log::info!(
                "Street prices #{} arrived: {} points for {towns:?}",
                request.generation,
                points.len()
            );
            state
                .data
                .set_street_series(StreetSeries::Loaded { towns, points });
        }
        Err(e) => {
            log::warn!("Street prices #{} failed: {e}", request.generation);
            state.data.set_street_series(StreetSeries::Failed { towns });
        }
    }

    state.view.hover = None;
    out.push(SyncEffect::TrendRedraw);
    out
}

/// The dataset's spelling of `town`, or `None` if no such town exists.
fn canonical_town(state: &DashboardState, town: &str) -> Option<String> {
    if town.eq_ignore_ascii_case(ALL_TOWNS) {
        return Some(ALL_TOWNS.to_string());
    }
    state
        .data
        .towns()
        .iter()
        .find(|t| t.eq_ignore_ascii_case(town))
        .cloned()
}

fn toggle_town(state: &mut DashboardState, town: &str, out: &mut Transition) {
    let Some(town) = canonical_town(state, town) else {
        log::warn!("Ignoring toggle of unknown town {town}");
        return;
    };

    let TownToggle {
        previous,
        cleared_streets,
    } = state.selection.toggle_town(&town);
    let current = state.selection.towns().clone();
    out.push(SyncEffect::TownChecks);

    for removed in previous
        .iter()
        .filter(|t| *t != ALL_TOWNS && !current.contains(t))
    {
        out.highlight_removed(HighlightKind::Town, removed);
    }
    for added in current
        .iter()
        .filter(|t| *t != ALL_TOWNS && !previous.contains(t))
    {
        out.highlight_added(HighlightKind::Town, added);
    }

    if state.selection.has_town_filter() {
        let allowed = state.data.streets_in(&current);
        let dropped_towns: OrderedSet = previous.iter().filter(|t| !current.contains(t)).collect();
        let orphaned = state.data.streets_in(&dropped_towns);
        let pruned = state
            .selection
            .retain_streets(|s| allowed.iter().any(|a| a == s) || !orphaned.iter().any(|o| o == s));
        for street in &pruned {
            out.highlight_removed(HighlightKind::Street, street);
        }
        if !pruned.is_empty() {
            out.push(SyncEffect::StreetChecks);
        }
        out.push(SyncEffect::StreetOptionsChanged);

        let request = state.fetches.issue(&current, state.today);
        state.data.set_street_series(StreetSeries::Pending {
            towns: request.towns.clone(),
        });
        out.request = Some(request);

        state.view.hover = None;
        out.push(SyncEffect::TrendRedraw);
        out.push(SyncEffect::FitTownBounds);
    } else {
        for street in &cleared_streets {
            out.highlight_removed(HighlightKind::Street, street);
        }
        if !cleared_streets.is_empty() {
            out.push(SyncEffect::StreetChecks);
        }
        out.push(SyncEffect::StreetOptionsChanged);

        state.fetches.cancel();
        state.data.set_street_series(StreetSeries::NotLoaded);

        out.push(SyncEffect::ViewportReset);
        state.view.hover = None;
        out.push(SyncEffect::TrendRedraw);
    }

    out.push(SyncEffect::MarkersChanged);
    out.push(SyncEffect::PropertyCountChanged);
    reevaluate_clustering(state, out);
}

fn street_in_scope(state: &DashboardState, street: &str) -> bool {
    state.selection.streets().contains(street)
        || state
            .data
            .streets_in(state.selection.towns())
            .iter()
            .any(|s| s == street)
}

fn toggle_street(state: &mut DashboardState, street: &str, fly: bool, out: &mut Transition) {
    if state.selection.has_town_filter() && !street_in_scope(state, street) {
        log::warn!("Ignoring street {street} outside the selected towns");
        return;
    }
    let Some(added) = state.selection.toggle_street(street) else {
        log::warn!("Ignoring street {street} while grouped by town");
        return;
    };

    out.push(SyncEffect::StreetChecks);
    if added {
        out.highlight_added(HighlightKind::Street, street);
    } else {
        out.highlight_removed(HighlightKind::Street, street);
    }
    if state.view.hover.as_ref().is_some_and(|h| h.group == street) {
        state.view.hover = None;
    }
    out.push(SyncEffect::TrendAppearanceChanged);
    if added && fly {
        out.push(SyncEffect::FlyToHighlight {
            kind: HighlightKind::Street,
            key: street.to_string(),
        });
    }
}

fn click_marker(state: &mut DashboardState, street: &str, out: &mut Transition) {
    if state.selection.has_town_filter() && !street_in_scope(state, street) {
        log::warn!("Ignoring marker on {street} outside the selected towns");
        return;
    }
    match state.selection.add_street(street) {
        None => log::debug!("Marker click on {street} ignored while grouped by town"),
        Some(false) => log::debug!("Street {street} already selected"),
        Some(true) => {
            out.highlight_added(HighlightKind::Street, street);
            out.push(SyncEffect::StreetChecks);
            if state.view.hover.as_ref().is_some_and(|h| h.group == street) {
                state.view.hover = None;
            }
            out.push(SyncEffect::TrendAppearanceChanged);
        }
    }
}

fn change_flat_type(state: &mut DashboardState, flat_type: FlatType, out: &mut Transition) {
    if flat_type == state.selection.flat_type() {
        log::debug!("Flat type unchanged ({flat_type})");
        return;
    }

    let cleared = state.selection.clear_streets();
    for street in &cleared {
        out.highlight_removed(HighlightKind::Street, street);
    }
    if !cleared.is_empty() {
        out.push(SyncEffect::StreetChecks);
    }

    state.selection.set_flat_type(flat_type);
    state.data.reprice(flat_type);

    state.view.hover = None;
    out.push(SyncEffect::TrendRedraw);
    out.push(SyncEffect::MarkersChanged);
}

fn change_color_mode(state: &mut DashboardState, mode: ColorMode, out: &mut Transition) {
    if mode == state.selection.color_mode() {
        return;
    }
    state.selection.set_color_mode(mode);
    out.push(SyncEffect::ColorModeChanged);
    reevaluate_clustering(state, out);
}

fn set_date_window(state: &mut DashboardState, window: DateWindow, out: &mut Transition) {
    let window = window.clamp_to(&state.data.full_range());
    if window == state.selection.date_window() {
        return;
    }
    log::debug!("Date window {} to {}", window.start, window.end);
    state.selection.set_date_window(window);
    out.push(SyncEffect::MarkersChanged);
    out.push(SyncEffect::PropertyCountChanged);
}

fn hover(state: &mut DashboardState, group: String, date: NaiveDate, out: &mut Transition) {
    if state.selection.trend_selection().contains(&group) {
        return;
    }
    let target = TrendHover { group, date };
    if state.view.hover.as_ref() == Some(&target) {
        return;
    }
    state.view.hover = Some(target);
    out.push(SyncEffect::TrendAppearanceChanged);
}

fn change_pitch(state: &mut DashboardState, pitch: f64, out: &mut Transition) {
    if !pitch.is_finite() {
        log::warn!("Ignoring non-finite pitch {pitch}");
        return;
    }
    let pitch = pitch.clamp(0.0, MAX_PITCH);
    if (pitch - state.view.pitch).abs() < f64::EPSILON {
        return;
    }
    state.view.pitch = pitch;
    out.push(SyncEffect::PitchChanged);
    reevaluate_clustering(state, out);
}

fn toggle_clustering(state: &mut DashboardState, enabled: bool, out: &mut Transition) {
    if enabled == state.view.clustering {
        return;
    }
    if enabled && !state.view.clustering_available(&state.selection) {
        log::warn!("Clustering is unavailable for the current view");
        return;
    }
    state.view.clustering = enabled;
    out.push(SyncEffect::ClusteringRebuilt);
}

fn reevaluate_clustering(state: &mut DashboardState, out: &mut Transition) {
    out.push(SyncEffect::ClusteringAvailability);
    if state.view.clustering && !state.view.clustering_available(&state.selection) {
        log::info!("Clustering no longer available; rebuilding without it");
        state.view.clustering = false;
        out.push(SyncEffect::ClusteringRebuilt);
    }
}
