//! The dashboard: shared state plus the subscribers kept in sync with it.

use chrono::NaiveDate;
use resale_map_api::{ApiError, PriceApi};
use resale_map_property_models::AggregatePricePoint;

use crate::DashboardError;
use crate::config::DashboardConfig;
use crate::data::DataStore;
use crate::effect::SyncEffect;
use crate::event::UiEvent;
use crate::fetch::{FetchOrchestrator, StreetPriceRequest};
use crate::selection::SelectionState;
use crate::transition::{self, Transition};
use crate::views::{SyncContext, SyncSubscriber, ViewState};

/// Everything a transition may mutate.
#[derive(Debug)]
pub struct DashboardState {
    pub(crate) config: DashboardConfig,
    pub(crate) selection: SelectionState,
    pub(crate) data: DataStore,
    pub(crate) view: ViewState,
    pub(crate) fetches: FetchOrchestrator,
    pub(crate) today: NaiveDate,
}

impl DashboardState {
    /// Startup state from the configured defaults.
    #[must_use]
    pub fn new(config: DashboardConfig, mut data: DataStore, today: NaiveDate) -> Self {
        let selection = SelectionState::new(
            config.defaults.flat_type,
            config.defaults.color_mode,
            data.full_range(),
        );
        data.reprice(selection.flat_type());

        let mut view = ViewState::new(config.map.clustering);
        if view.clustering && !view.clustering_available(&selection) {
            log::info!("Clustering is unavailable for the default view; starting without it");
            view.clustering = false;
        }

        let fetches = FetchOrchestrator::new(config.data.street_history_years);

        Self {
            config,
            selection,
            data,
            view,
            fetches,
            today,
        }
    }

    /// Current selection.
    #[must_use]
    pub const fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Shared dataset.
    #[must_use]
    pub const fn data(&self) -> &DataStore {
        &self.data
    }

    /// Hover, pitch, and clustering.
    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Street-price fetch bookkeeping.
    #[must_use]
    pub const fn fetches(&self) -> &FetchOrchestrator {
        &self.fetches
    }

    /// Read-only view handed to subscribers.
    #[must_use]
    pub const fn context(&self) -> SyncContext<'_> {
        SyncContext {
            selection: &self.selection,
            data: &self.data,
            view: &self.view,
            config: &self.config,
        }
    }
}

/// State, subscribers, and the dispatcher between them.
pub struct Dashboard {
    state: DashboardState,
    subscribers: Vec<Box<dyn SyncSubscriber>>,
    started: bool,
}

impl Dashboard {
    /// Wraps prepared state. Nothing is rendered until [`Self::start`].
    #[must_use]
    pub fn new(state: DashboardState) -> Self {
        Self {
            state,
            subscribers: Vec::new(),
            started: false,
        }
    }

    /// Runs the all-or-nothing initial load and builds the dashboard.
    ///
    /// # Errors
    ///
    /// * If any of the four startup requests fails
    pub async fn load(
        api: &dyn PriceApi,
        config: DashboardConfig,
        today: NaiveDate,
    ) -> Result<Self, DashboardError> {
        let initial = resale_map_api::load_initial(api).await?;
        let data = DataStore::from_initial(initial, config.defaults.flat_type, &config, today);
        log::info!(
            "Dashboard ready: {} properties in {} towns, {} to {}",
            data.records().len(),
            data.towns().len(),
            data.full_range().start,
            data.full_range().end
        );
        Ok(Self::new(DashboardState::new(config, data, today)))
    }

    /// Adds a subscriber. Subscribers observe effects in registration
    /// order.
    pub fn subscribe(&mut self, subscriber: Box<dyn SyncSubscriber>) {
        log::debug!("Subscribed {}", subscriber.name());
        self.subscribers.push(subscriber);
    }

    /// Shared state.
    #[must_use]
    pub const fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Whether the first render has happened.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Performs the first render.
    pub fn start(&mut self) {
        if self.started {
            log::warn!("Dashboard already started");
            return;
        }
        self.started = true;
        self.broadcast(&[SyncEffect::Initialize]);
    }

    /// Applies a user event and synchronizes every view.
    ///
    /// Returns the street-price request the caller must execute, if the
    /// event issued one.
    pub fn dispatch(&mut self, event: UiEvent) -> Option<StreetPriceRequest> {
        if !self.started {
            log::warn!("Dispatching {event:?} before start");
        }
        let Transition { effects, request } = transition::transition(&mut self.state, event);
        self.broadcast(&effects);
        request
    }

    /// Applies a street-price response. Returns whether it was applied.
    pub fn apply_street_prices(
        &mut self,
        request: &StreetPriceRequest,
        result: Result<Vec<AggregatePricePoint>, ApiError>,
    ) -> bool {
        let Transition { effects, .. } =
            transition::apply_street_prices(&mut self.state, request, result);
        let applied = !effects.is_empty();
        self.broadcast(&effects);
        applied
    }

    fn broadcast(&mut self, effects: &[SyncEffect]) {
        let ctx = self.state.context();
        for effect in effects {
            log::trace!("Sync: {effect:?}");
            for subscriber in &mut self.subscribers {
                subscriber.on_effect(effect, &ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::HighlightKind;
    use crate::test_support;
    use resale_map_property_models::{ALL_TOWNS, FlatType};

    fn toggle(dashboard: &mut Dashboard, town: &str) -> Option<StreetPriceRequest> {
        dashboard.dispatch(UiEvent::TownToggled {
            town: town.to_string(),
        })
    }

    #[test]
    fn start_renders_every_view() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();

        let calls = rec.take();
        assert!(calls.iter().any(|c| c.starts_with("map.set_source properties")));
        assert!(calls.iter().any(|c| c.starts_with("map.set_legend")));
        assert!(calls.iter().any(|c| c.starts_with("trend.draw")));
        assert!(calls.iter().any(|c| c.starts_with("timeline.draw")));
        assert!(calls.iter().any(|c| c.starts_with("controls.set_town_options")));
        let count = dashboard.state().data().records().len();
        assert!(calls.contains(&format!("timeline.set_count {count}")));
    }

    #[test]
    fn deselecting_bedok_refits_to_tampines() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        toggle(&mut dashboard, "BEDOK");
        toggle(&mut dashboard, "TAMPINES");
        rec.take();

        toggle(&mut dashboard, "BEDOK");
        let calls = rec.take();

        assert!(calls.contains(&"map.remove_source highlight-town-BEDOK".to_string()));
        assert!(!calls.iter().any(|c| c.contains("remove_source highlight-town-TAMPINES")));
        assert!(rec.map_sources().contains("highlight-town-TAMPINES"));
        assert!(!rec.map_sources().contains("highlight-town-BEDOK"));

        let fits: Vec<&String> = calls.iter().filter(|c| c.starts_with("map.fit_bounds")).collect();
        assert_eq!(fits.len(), 1);
        assert_eq!(fits[0], &test_support::fit_call_for_tampines());
    }

    #[test]
    fn flat_type_change_removes_street_highlights() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        toggle(&mut dashboard, "BEDOK");
        for street in ["BEDOK NTH AVE 1", "BEDOK STH AVE 1"] {
            dashboard.dispatch(UiEvent::StreetToggled {
                street: street.to_string(),
            });
        }
        assert!(rec.map_sources().contains("highlight-street-BEDOK NTH AVE 1"));

        dashboard.dispatch(UiEvent::FlatTypeChanged {
            flat_type: FlatType::FiveRoom,
        });
        let sources = rec.map_sources();
        assert!(!sources.iter().any(|s| s.starts_with("highlight-street-")));
        assert!(sources.contains("highlight-town-BEDOK"));
        assert!(dashboard.state().selection().streets().is_empty());
        assert!(rec.dangling_layers().is_empty());
    }

    #[test]
    fn trend_shows_loading_until_streets_arrive() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        rec.take();

        let request = toggle(&mut dashboard, "BEDOK").unwrap();
        assert!(rec.take().contains(&"trend.placeholder Loading".to_string()));

        let applied = dashboard.apply_street_prices(
            &request,
            Ok(test_support::street_points(&["BEDOK NTH AVE 1", "BEDOK STH AVE 1"])),
        );
        assert!(applied);
        let calls = rec.take();
        assert!(calls.iter().any(|c| c.starts_with("trend.draw street groups=2")));
    }

    #[test]
    fn failed_street_fetch_shows_no_data() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        let request = toggle(&mut dashboard, "BEDOK").unwrap();
        rec.take();

        dashboard.apply_street_prices(
            &request,
            Err(ApiError::Parse {
                endpoint: "prices",
                message: "bad".to_string(),
            }),
        );
        assert!(rec.take().contains(&"trend.placeholder NoData".to_string()));
    }

    #[test]
    fn stale_response_does_not_touch_views() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        let stale = toggle(&mut dashboard, "BEDOK").unwrap();
        toggle(&mut dashboard, ALL_TOWNS);
        rec.take();

        let applied = dashboard.apply_street_prices(
            &stale,
            Ok(test_support::street_points(&["BEDOK NTH AVE 1"])),
        );
        assert!(!applied);
        assert!(rec.take().is_empty());
    }

    #[test]
    fn street_click_highlights_and_flies() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        let request = toggle(&mut dashboard, "BEDOK").unwrap();
        dashboard.apply_street_prices(
            &request,
            Ok(test_support::street_points(&["BEDOK NTH AVE 1", "BEDOK STH AVE 1"])),
        );
        rec.take();

        dashboard.dispatch(UiEvent::TrendPointClicked {
            group: "BEDOK NTH AVE 1".to_string(),
        });
        let calls = rec.take();
        assert!(calls.contains(&"controls.set_street_checks [\"BEDOK NTH AVE 1\"]".to_string()));
        assert!(calls.iter().any(|c| c.starts_with("map.fly_to")));
        assert!(calls.iter().any(|c| c.starts_with("trend.tooltip BEDOK NTH AVE 1")));
        assert!(
            dashboard
                .state()
                .selection()
                .streets()
                .contains("BEDOK NTH AVE 1")
        );
        assert!(rec.map_sources().contains(&format!(
            "highlight-{}-BEDOK NTH AVE 1",
            HighlightKind::Street
        )));
    }

    #[test]
    fn clustering_rebuild_replaces_every_base_layer() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        rec.take();

        dashboard.dispatch(UiEvent::ClusteringToggled { enabled: true });
        let calls = rec.take();
        assert!(calls.contains(&"map.remove_source properties".to_string()));
        assert!(calls.contains(&"map.set_source properties clustered=true".to_string()));
        assert!(calls.iter().any(|c| c == "map.add_layer properties-clusters"));
        assert!(rec.dangling_layers().is_empty());

        dashboard.dispatch(UiEvent::TownToggled {
            town: "BEDOK".to_string(),
        });
        let calls = rec.take();
        assert!(calls.contains(&"map.set_clustering_control false".to_string()));
        assert!(calls.contains(&"map.set_source properties clustered=false".to_string()));
        assert!(!rec.map_layers().contains("properties-clusters"));
    }

    #[test]
    fn pitch_switches_representation() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        rec.take();

        dashboard.dispatch(UiEvent::PitchChanged { pitch: 60.0 });
        let calls = rec.take();
        assert!(calls.contains(&"map.visibility properties-circles false".to_string()));
        assert!(calls.contains(&"map.visibility properties-icons-residential true".to_string()));
    }

    #[test]
    fn brush_updates_count() {
        let (mut dashboard, rec) = test_support::dashboard();
        dashboard.start();
        rec.take();

        dashboard.dispatch(UiEvent::BrushPixels { x0: 0.0, x1: 0.0 });
        let count = dashboard
            .state()
            .data()
            .visible_count(dashboard.state().selection());
        assert!(rec.take().contains(&format!("timeline.set_count {count}")));
    }

    #[test]
    fn nan_price_is_excluded_from_trend_means() {
        let (mut dashboard, _rec) = test_support::dashboard();
        dashboard.start();
        let record = dashboard
            .state()
            .data()
            .records()
            .iter()
            .find(|r| r.address.starts_with("20 TAMPINES"))
            .unwrap();
        assert_eq!(record.price.to_string(), "NA");
        assert_eq!(
            record.price_color,
            resale_map_property_models::PriceColor::Unavailable
        );
    }
}

#[cfg(test)]
mod properties {
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use resale_map_property_models::{ALL_TOWNS, ColorMode, DateWindow, FlatType};

    use super::*;
    use crate::data::StreetSeries;
    use crate::effect::HighlightKind;
    use crate::selection::OrderedSet;
    use crate::test_support::{self, Recorders};
    use crate::views::map::highlight_id;

    const TOWNS: &[&str] = &["BEDOK", "TAMPINES", "bedok", "Tampines", ALL_TOWNS, "ATLANTIS"];

    const STREETS: &[&str] = &[
        "BEDOK NTH AVE 1",
        "BEDOK STH AVE 1",
        "BEDOK RESERVOIR RD",
        "TAMPINES ST 11",
        "TAMPINES AVE 5",
        "NOWHERE RD",
    ];

    #[derive(Debug, Clone)]
    enum Op {
        Event(UiEvent),
        Deliver { newest: bool, fail: bool },
    }

    fn arb_town() -> impl Strategy<Value = String> {
        prop::sample::select(TOWNS).prop_map(str::to_string)
    }

    fn arb_street() -> impl Strategy<Value = String> {
        prop::sample::select(STREETS).prop_map(str::to_string)
    }

    fn arb_group() -> impl Strategy<Value = String> {
        prop_oneof![arb_town(), arb_street()]
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        prop::sample::select(vec![
            NaiveDate::from_ymd_opt(1900, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(1985, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            NaiveDate::from_ymd_opt(2090, 1, 1).unwrap(),
        ])
    }

    fn arb_event() -> impl Strategy<Value = UiEvent> {
        prop_oneof![
            4 => arb_town().prop_map(|town| UiEvent::TownToggled { town }),
            3 => arb_street().prop_map(|street| UiEvent::StreetToggled { street }),
            2 => arb_street().prop_map(|street| UiEvent::MapMarkerClicked { street }),
            2 => arb_group().prop_map(|group| UiEvent::TrendPointClicked { group }),
            1 => prop::sample::select(FlatType::all())
                .prop_map(|flat_type| UiEvent::FlatTypeChanged { flat_type }),
            1 => prop::sample::select(vec![ColorMode::Type, ColorMode::Age, ColorMode::Price])
                .prop_map(|color_mode| UiEvent::ColorModeChanged { color_mode }),
            1 => (arb_date(), arb_date()).prop_map(|(start, end)| UiEvent::BrushMoved { start, end }),
            1 => (-100.0..900.0_f64, -100.0..900.0_f64)
                .prop_map(|(x0, x1)| UiEvent::BrushPixels { x0, x1 }),
            1 => Just(UiEvent::BrushCleared),
            1 => (arb_group(), arb_date())
                .prop_map(|(group, date)| UiEvent::TrendPointHovered { group, date }),
            1 => Just(UiEvent::TrendPointLeft),
            1 => prop::sample::select(vec![0.0, 30.0, 60.0])
                .prop_map(|pitch| UiEvent::PitchChanged { pitch }),
            1 => any::<bool>().prop_map(|enabled| UiEvent::ClusteringToggled { enabled }),
        ]
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => arb_event().prop_map(Op::Event),
            1 => (any::<bool>(), prop::bool::weighted(0.2))
                .prop_map(|(newest, fail)| Op::Deliver { newest, fail }),
        ]
    }

    fn sorted(towns: &[String]) -> Vec<String> {
        let mut towns = towns.to_vec();
        towns.sort();
        towns
    }

    fn respond(
        dashboard: &Dashboard,
        request: &StreetPriceRequest,
        fail: bool,
    ) -> Result<Vec<AggregatePricePoint>, ApiError> {
        if fail {
            return Err(ApiError::Status {
                endpoint: "prices",
                status: 503,
            });
        }
        let towns: OrderedSet = request.towns.iter().collect();
        let streets = dashboard.state().data().streets_in(&towns);
        let streets: Vec<&str> = streets.iter().map(String::as_str).collect();
        Ok(test_support::street_points(&streets))
    }

    fn check(
        dashboard: &Dashboard,
        rec: &Recorders,
        brushed: Option<DateWindow>,
    ) -> Result<(), TestCaseError> {
        let state = dashboard.state();
        let selection = state.selection();
        let data = state.data();

        prop_assert!(selection.is_consistent());

        let filter: Vec<&str> = selection.towns().iter().filter(|t| *t != ALL_TOWNS).collect();
        let expected = data
            .records()
            .iter()
            .filter(|r| selection.date_window().contains(r.date))
            .filter(|r| filter.is_empty() || filter.iter().any(|t| t.eq_ignore_ascii_case(&r.town)))
            .count();
        prop_assert_eq!(data.visible_count(selection), expected);

        if let Some(brushed) = brushed {
            let in_brush = data
                .records()
                .iter()
                .filter(|r| brushed.contains(r.date) && selection.town_matches(&r.town))
                .count();
            prop_assert_eq!(data.visible_count(selection), in_brush);
        }

        let upper: BTreeSet<String> =
            selection.towns().iter().map(str::to_ascii_uppercase).collect();
        prop_assert_eq!(upper.len(), selection.towns().len());
        prop_assert!(
            filter
                .iter()
                .all(|t| data.towns().iter().any(|known| known.as_str() == *t))
        );

        let mut highlights: BTreeSet<String> = filter
            .iter()
            .map(|t| highlight_id(HighlightKind::Town, t))
            .collect();
        highlights.extend(
            selection
                .streets()
                .iter()
                .map(|s| highlight_id(HighlightKind::Street, s)),
        );
        let on_map: BTreeSet<String> = rec
            .map_sources()
            .into_iter()
            .filter(|s| s.starts_with("highlight-"))
            .collect();
        prop_assert_eq!(on_map, highlights);
        prop_assert!(rec.dangling_layers().is_empty());

        let allowed = data.streets_in(selection.towns());
        prop_assert!(selection.streets().iter().all(|s| allowed.iter().any(|a| a == s)));

        if let StreetSeries::Loaded { towns, .. } = data.street_series() {
            prop_assert_eq!(sorted(towns), selection.towns().sorted());
        }
        prop_assert!(!state.view().clustering || state.view().clustering_available(selection));
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn views_stay_in_sync(ops in prop::collection::vec(arb_op(), 1..40)) {
            let (mut dashboard, rec) = test_support::dashboard();
            dashboard.start();
            let mut issued: Vec<StreetPriceRequest> = Vec::new();
            let mut brushed = None;

            for op in ops {
                match op {
                    Op::Event(event) => {
                        match &event {
                            UiEvent::BrushMoved { start, end } => {
                                brushed = Some(DateWindow::new(*start, *end));
                            }
                            UiEvent::BrushPixels { .. } | UiEvent::BrushCleared => brushed = None,
                            _ => {}
                        }
                        if let Some(request) = dashboard.dispatch(event) {
                            issued.push(request);
                        }
                    }
                    Op::Deliver { newest, fail } => {
                        let request = if newest { issued.pop() } else if issued.is_empty() {
                            None
                        } else {
                            Some(issued.remove(0))
                        };
                        let Some(request) = request else {
                            continue;
                        };
                        let selection = dashboard.state().selection();
                        let fresh = selection.has_town_filter()
                            && sorted(&request.towns) == selection.towns().sorted();
                        let result = respond(&dashboard, &request, fail);
                        prop_assert_eq!(dashboard.apply_street_prices(&request, result), fresh);
                    }
                }
                check(&dashboard, &rec, brushed)?;
            }
        }
    }
}
