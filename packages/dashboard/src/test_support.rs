//! Fixtures and recording renderers shared by the unit tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use chrono::NaiveDate;
use geo::{Coord, Point, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use resale_map_aggregate::CumulativeSeries;
use resale_map_api::InitialData;
use resale_map_enrich::palette::LegendEntry;
use resale_map_property_models::{
    AddressPrice, AggregatePricePoint, ColorMode, FlatType, Price, RawProperty,
};

use crate::config::DashboardConfig;
use crate::dashboard::{Dashboard, DashboardState};
use crate::data::DataStore;
use crate::selection::SelectionState;
use crate::views::map::LayerSpec;
use crate::views::timeline::TimeScale;
use crate::views::trend::{Placeholder, PointStyle, Tooltip, TrendChart};
use crate::views::{
    ControlsRenderer, ControlsView, MapRenderer, MapSync, TimelineRenderer, TimelineView,
    TrendRenderer, TrendView,
};

/// `(min_lon, min_lat, max_lon, max_lat)` of the BEDOK boundary square.
pub const BEDOK_BOX: (f64, f64, f64, f64) = (103.90, 1.31, 103.96, 1.35);

/// `(min_lon, min_lat, max_lon, max_lat)` of the TAMPINES boundary square.
pub const TAMPINES_BOX: (f64, f64, f64, f64) = (103.93, 1.34, 103.98, 1.37);

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}

pub fn config() -> DashboardConfig {
    DashboardConfig::default()
}

fn property(
    address: &str,
    street: &str,
    town: &str,
    year: i32,
    tag: Option<&str>,
    lon: f64,
    lat: f64,
) -> RawProperty {
    RawProperty {
        tag: tag.map(str::to_string),
        lat,
        lon,
        town: town.to_string(),
        address: address.to_string(),
        street: street.to_string(),
        total_units: 120,
        year,
        max_floor_lvl: 12,
    }
}

fn properties() -> Vec<RawProperty> {
    let res = Some("Residential");
    vec![
        property("101 BEDOK NTH AVE 1", "BEDOK NTH AVE 1", "BEDOK", 1978, res, 103.930, 1.330),
        property("102 BEDOK NTH AVE 1", "BEDOK NTH AVE 1", "BEDOK", 1985, res, 103.931, 1.331),
        property("10 BEDOK STH AVE 1", "BEDOK STH AVE 1", "BEDOK", 1978, res, 103.940, 1.320),
        property("11 BEDOK STH AVE 1", "BEDOK STH AVE 1", "BEDOK", 2001, res, 103.941, 1.321),
        property(
            "700 BEDOK RESERVOIR RD",
            "BEDOK RESERVOIR RD",
            "BEDOK",
            1990,
            Some("Market and hawker"),
            103.920,
            1.340,
        ),
        property("1 OLD KAMPONG RD", "OLD KAMPONG RD", "BEDOK", 1955, None, 103.910, 1.315),
        property("20 TAMPINES ST 11", "TAMPINES ST 11", "TAMPINES", 1985, res, 103.950, 1.350),
        property("21 TAMPINES ST 11", "TAMPINES ST 11", "TAMPINES", 1995, res, 103.951, 1.351),
        property(
            "300 TAMPINES AVE 5",
            "TAMPINES AVE 5",
            "TAMPINES",
            2010,
            Some("Multi-storey carpark"),
            103.960,
            1.360,
        ),
    ]
}

fn address_prices() -> Vec<AddressPrice> {
    let row = |key: &str, flat_type, price| AddressPrice {
        block_street: key.to_string(),
        flat_type,
        price: Price::from_f64(price),
    };
    vec![
        row("101 BEDOK NTH AVE 1", FlatType::FourRoom, 450_000.0),
        row("101 BEDOK NTH AVE 1", FlatType::FiveRoom, 560_000.0),
        row("10 BEDOK STH AVE 1", FlatType::FourRoom, 520_000.0),
        row("20 TAMPINES ST 11", FlatType::FourRoom, f64::NAN),
        row("21 TAMPINES ST 11", FlatType::FourRoom, 480_000.0),
        row("21 TAMPINES ST 11", FlatType::FiveRoom, 600_000.0),
    ]
}

fn town_prices() -> Vec<AggregatePricePoint> {
    let towns = [
        ("ANG MO KIO", 470_000.0),
        ("BEDOK", 450_000.0),
        ("BISHAN", 650_000.0),
        ("CLEMENTI", 600_000.0),
        ("TAMPINES", 520_000.0),
        ("YISHUN", 420_000.0),
    ];
    let quarters = [(2023, 9, 30), (2023, 12, 31), (2024, 3, 31), (2024, 6, 30)];

    let mut points = Vec::new();
    for (town, base) in towns {
        for (i, (y, m, d)) in quarters.into_iter().enumerate() {
            for (flat_type, premium) in [(FlatType::FourRoom, 0.0), (FlatType::FiveRoom, 90_000.0)] {
                points.push(AggregatePricePoint {
                    group: town.to_string(),
                    date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
                    flat_type,
                    price: Price::Available(base + premium + 5_000.0 * i as f64),
                });
            }
        }
    }
    points
}

fn square(name: &str, (x0, y0, x1, y1): (f64, f64, f64, f64)) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("PLN_AREA_N".to_string(), name.into());
    let ring = vec![
        vec![x0, y0],
        vec![x1, y0],
        vec![x1, y1],
        vec![x0, y1],
        vec![x0, y0],
    ];
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Polygon(vec![ring]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn initial_data() -> InitialData {
    InitialData {
        properties: properties(),
        town_prices: town_prices(),
        boundaries: FeatureCollection {
            bbox: None,
            features: vec![square("BEDOK", BEDOK_BOX), square("TAMPINES", TAMPINES_BOX)],
            foreign_members: None,
        },
        address_prices: address_prices(),
    }
}

pub fn data_store() -> DataStore {
    DataStore::from_initial(initial_data(), FlatType::FourRoom, &config(), today())
}

pub fn selection(data: &DataStore) -> SelectionState {
    SelectionState::new(FlatType::FourRoom, ColorMode::Type, data.full_range())
}

pub fn state() -> DashboardState {
    DashboardState::new(config(), data_store(), today())
}

/// Six months of 4-room and 5-room history for each street.
pub fn street_points(streets: &[&str]) -> Vec<AggregatePricePoint> {
    let mut points = Vec::new();
    for (s, street) in streets.iter().enumerate() {
        for month in 1..=6_u32 {
            for (flat_type, base) in [(FlatType::FourRoom, 400_000.0), (FlatType::FiveRoom, 520_000.0)] {
                points.push(AggregatePricePoint {
                    group: (*street).to_string(),
                    date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
                    flat_type,
                    price: Price::Available(
                        base + 20_000.0 * s as f64 + 1_000.0 * f64::from(month),
                    ),
                });
            }
        }
    }
    points
}

fn rect((x0, y0, x1, y1): (f64, f64, f64, f64)) -> Rect<f64> {
    Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 })
}

fn fit_call(bounds: Rect<f64>, padding: f64) -> String {
    format!(
        "map.fit_bounds {:.4},{:.4} {:.4},{:.4} padding={padding}",
        bounds.min().x,
        bounds.min().y,
        bounds.max().x,
        bounds.max().y
    )
}

pub fn fit_call_for_tampines() -> String {
    fit_call(rect(TAMPINES_BOX), config().map.fit_padding)
}

/// Shared call log plus the map's source and layer registry.
#[derive(Clone, Default)]
pub struct Recorders {
    calls: Rc<RefCell<Vec<String>>>,
    sources: Rc<RefCell<BTreeSet<String>>>,
    layers: Rc<RefCell<BTreeMap<String, String>>>,
}

impl Recorders {
    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    /// Drains the call log.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn map_sources(&self) -> BTreeSet<String> {
        self.sources.borrow().clone()
    }

    pub fn map_layers(&self) -> BTreeSet<String> {
        self.layers.borrow().keys().cloned().collect()
    }

    /// Layers whose source is no longer on the map.
    pub fn dangling_layers(&self) -> Vec<String> {
        let sources = self.sources.borrow();
        self.layers
            .borrow()
            .iter()
            .filter(|(_, source)| !sources.contains(*source))
            .map(|(id, _)| id.clone())
            .collect()
    }
}

pub struct RecordingMap(pub Recorders);

impl MapRenderer for RecordingMap {
    fn set_source(&mut self, id: &str, _features: &FeatureCollection, cluster: bool) {
        self.0.sources.borrow_mut().insert(id.to_string());
        self.0.record(format!("map.set_source {id} clustered={cluster}"));
    }

    fn remove_source(&mut self, id: &str) {
        let orphans: Vec<String> = self
            .0
            .layers
            .borrow()
            .iter()
            .filter(|(_, source)| source.as_str() == id)
            .map(|(layer, _)| layer.clone())
            .collect();
        assert!(orphans.is_empty(), "removing {id} while {orphans:?} read it");
        self.0.sources.borrow_mut().remove(id);
        self.0.record(format!("map.remove_source {id}"));
    }

    fn add_layer(&mut self, layer: &LayerSpec) {
        assert!(
            self.0.sources.borrow().contains(&layer.source),
            "layer {} added before source {}",
            layer.id,
            layer.source
        );
        self.0
            .layers
            .borrow_mut()
            .insert(layer.id.clone(), layer.source.clone());
        self.0.record(format!("map.add_layer {}", layer.id));
    }

    fn remove_layer(&mut self, id: &str) {
        self.0.layers.borrow_mut().remove(id);
        self.0.record(format!("map.remove_layer {id}"));
    }

    fn set_layer_visibility(&mut self, id: &str, visible: bool) {
        self.0.record(format!("map.visibility {id} {visible}"));
    }

    fn set_color_property(&mut self, layer_id: &str, property: &str) {
        self.0.record(format!("map.color {layer_id} {property}"));
    }

    fn set_legend(&mut self, entries: &[LegendEntry]) {
        self.0.record(format!("map.set_legend {}", entries.len()));
    }

    fn fly_to(&mut self, center: Point<f64>, zoom: f64) {
        self.0
            .record(format!("map.fly_to {:.4},{:.4} zoom={zoom}", center.x(), center.y()));
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: f64) {
        self.0.record(fit_call(bounds, padding));
    }

    fn set_clustering_control(&mut self, enabled: bool) {
        self.0.record(format!("map.set_clustering_control {enabled}"));
    }
}

pub struct RecordingTrend(pub Recorders);

impl TrendRenderer for RecordingTrend {
    fn draw(&mut self, chart: &TrendChart) {
        self.0.record(format!(
            "trend.draw {} groups={}",
            chart.chart_type,
            chart.groups.len()
        ));
    }

    fn show_placeholder(&mut self, placeholder: Placeholder) {
        self.0.record(format!("trend.placeholder {placeholder:?}"));
    }

    fn restyle(&mut self, styles: &[PointStyle]) {
        self.0.record(format!("trend.restyle {}", styles.len()));
    }

    fn show_tooltip(&mut self, tooltip: Option<&Tooltip>) {
        self.0.record(match tooltip {
            Some(t) => format!("trend.tooltip {} {} {}", t.group, t.date, t.price),
            None => "trend.tooltip none".to_string(),
        });
    }
}

pub struct RecordingTimeline(pub Recorders);

impl TimelineRenderer for RecordingTimeline {
    fn draw(&mut self, series: &CumulativeSeries, scale: &TimeScale) {
        self.0.record(format!(
            "timeline.draw categories={} from {}",
            series.categories.len(),
            scale.domain().start
        ));
    }

    fn show_no_data(&mut self) {
        self.0.record("timeline.no_data".to_string());
    }

    fn set_brush(&mut self, pixels: Option<(f64, f64)>) {
        self.0.record(format!("timeline.brush {pixels:?}"));
    }

    fn set_count(&mut self, count: usize) {
        self.0.record(format!("timeline.set_count {count}"));
    }
}

pub struct RecordingControls(pub Recorders);

impl ControlsRenderer for RecordingControls {
    fn set_town_options(&mut self, options: &[String]) {
        self.0.record(format!("controls.set_town_options {options:?}"));
    }

    fn set_town_checks(&mut self, checked: &[String]) {
        self.0.record(format!("controls.set_town_checks {checked:?}"));
    }

    fn set_street_options(&mut self, options: &[String]) {
        self.0.record(format!("controls.set_street_options {options:?}"));
    }

    fn set_street_checks(&mut self, checked: &[String]) {
        self.0.record(format!("controls.set_street_checks {checked:?}"));
    }

    fn set_flat_type(&mut self, flat_type: FlatType, options: &[FlatType]) {
        self.0.record(format!(
            "controls.set_flat_type {flat_type} of {}",
            options.len()
        ));
    }

    fn set_color_mode(&mut self, mode: ColorMode) {
        self.0.record(format!("controls.set_color_mode {mode}"));
    }
}

/// A dashboard over the fixture data with every view subscribed to
/// recording renderers.
pub fn dashboard() -> (Dashboard, Recorders) {
    let recorders = Recorders::default();
    let mut dashboard = Dashboard::new(state());
    dashboard.subscribe(Box::new(MapSync::new(RecordingMap(recorders.clone()))));
    dashboard.subscribe(Box::new(TrendView::new(RecordingTrend(recorders.clone()))));
    dashboard.subscribe(Box::new(TimelineView::new(RecordingTimeline(
        recorders.clone(),
    ))));
    dashboard.subscribe(Box::new(ControlsView::new(RecordingControls(
        recorders.clone(),
    ))));
    (dashboard, recorders)
}
