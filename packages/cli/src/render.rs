//! Renderers that print every view update to stdout.

use geo::{Point, Rect};
use geojson::FeatureCollection;
use resale_map_aggregate::CumulativeSeries;
use resale_map_dashboard::views::map::LayerSpec;
use resale_map_dashboard::views::trend::{Placeholder, PointStyle, Tooltip, TrendChart};
use resale_map_dashboard::views::{
    ControlsRenderer, MapRenderer, TimeScale, TimelineRenderer, TrendRenderer,
};
use resale_map_enrich::palette::LegendEntry;
use resale_map_property_models::{ColorMode, FlatType};

pub struct PrintMap;

impl MapRenderer for PrintMap {
    fn set_source(&mut self, id: &str, features: &FeatureCollection, cluster: bool) {
        println!(
            "[map] source {id}: {} features{}",
            features.features.len(),
            if cluster { " (clustered)" } else { "" }
        );
    }

    fn remove_source(&mut self, id: &str) {
        println!("[map] remove source {id}");
    }

    fn add_layer(&mut self, layer: &LayerSpec) {
        log::debug!("[map] add layer {} on {}", layer.id, layer.source);
    }

    fn remove_layer(&mut self, id: &str) {
        log::debug!("[map] remove layer {id}");
    }

    fn set_layer_visibility(&mut self, id: &str, visible: bool) {
        log::debug!("[map] {id} visible={visible}");
    }

    fn set_color_property(&mut self, layer_id: &str, property: &str) {
        println!("[map] {layer_id} colored by {property}");
    }

    fn set_legend(&mut self, entries: &[LegendEntry]) {
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        println!("[map] legend: {}", labels.join(" | "));
    }

    fn fly_to(&mut self, center: Point<f64>, zoom: f64) {
        println!("[map] fly to {:.5},{:.5} zoom {zoom}", center.x(), center.y());
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: f64) {
        println!(
            "[map] fit {:.5},{:.5} .. {:.5},{:.5} padding {padding}",
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        );
    }

    fn set_clustering_control(&mut self, enabled: bool) {
        println!("[map] clustering control enabled={enabled}");
    }
}

pub struct PrintTrend;

impl TrendRenderer for PrintTrend {
    fn draw(&mut self, chart: &TrendChart) {
        println!(
            "[trend] {} groups by {} for {}; top {:?}, bottom {:?}",
            chart.groups.len(),
            chart.chart_type,
            chart.flat_type,
            chart.ranking.top(),
            chart.ranking.bottom()
        );
    }

    fn show_placeholder(&mut self, placeholder: Placeholder) {
        match placeholder {
            Placeholder::NoData => println!("[trend] no data available"),
            Placeholder::Loading => println!("[trend] loading street prices..."),
        }
    }

    fn restyle(&mut self, styles: &[PointStyle]) {
        let emphasized: Vec<&str> = styles
            .iter()
            .filter(|s| s.opacity >= 1.0)
            .map(|s| s.group.as_str())
            .collect();
        println!("[trend] emphasized: {emphasized:?}");
    }

    fn show_tooltip(&mut self, tooltip: Option<&Tooltip>) {
        if let Some(t) = tooltip {
            println!("[trend] tooltip {} on {}: {}", t.group, t.date, t.price);
        }
    }
}

pub struct PrintTimeline;

impl TimelineRenderer for PrintTimeline {
    fn draw(&mut self, series: &CumulativeSeries, scale: &TimeScale) {
        let domain = scale.domain();
        println!(
            "[timeline] {} categories, {} to {}",
            series.categories.len(),
            domain.start,
            domain.end
        );
    }

    fn show_no_data(&mut self) {
        println!("[timeline] no data available");
    }

    fn set_brush(&mut self, pixels: Option<(f64, f64)>) {
        match pixels {
            Some((x0, x1)) => println!("[timeline] brush {x0:.0}..{x1:.0}"),
            None => println!("[timeline] brush cleared"),
        }
    }

    fn set_count(&mut self, count: usize) {
        println!("[timeline] {count} properties");
    }
}

pub struct PrintControls;

impl ControlsRenderer for PrintControls {
    fn set_town_options(&mut self, options: &[String]) {
        println!("[controls] {} town options", options.len());
    }

    fn set_town_checks(&mut self, checked: &[String]) {
        println!("[controls] towns: {checked:?}");
    }

    fn set_street_options(&mut self, options: &[String]) {
        println!("[controls] {} street options", options.len());
    }

    fn set_street_checks(&mut self, checked: &[String]) {
        println!("[controls] streets: {checked:?}");
    }

    fn set_flat_type(&mut self, flat_type: FlatType, _options: &[FlatType]) {
        println!("[controls] flat type: {flat_type}");
    }

    fn set_color_mode(&mut self, mode: ColorMode) {
        println!("[controls] color mode: {mode}");
    }
}
