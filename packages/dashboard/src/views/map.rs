//! Map sync layer.
//!
//! Keeps one base marker source plus one highlight source per selected
//! town or street. Every layer this view adds is recorded in a registry so
//! removing a source always removes every layer that reads it first.

use std::collections::BTreeSet;

use geo::{Point, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, feature::Id};
use resale_map_enrich::palette::{self, LegendEntry};
use resale_map_geography::{centroid, points_bounds};
use resale_map_property_models::{ColorMode, EnrichedProperty, Price, PropertyTag};

use crate::effect::{HighlightKind, SyncEffect};

use super::{SyncContext, SyncSubscriber};

/// Id of the base marker source.
pub const BASE_SOURCE: &str = "properties";

/// 2D circle layer of the base source.
pub const CIRCLE_LAYER: &str = "properties-circles";

/// 2D cluster bubble layer, present only while clustered.
pub const CLUSTER_LAYER: &str = "properties-clusters";

/// 2D cluster count label layer, present only while clustered.
pub const CLUSTER_COUNT_LAYER: &str = "properties-cluster-count";

/// What a layer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Top-down colored circles.
    Circle,
    /// Cluster bubbles.
    Cluster,
    /// Cluster count labels.
    ClusterCount,
    /// Pitched icons for one category.
    Icon(PropertyTag),
    /// Overlay for a selected town or street.
    Highlight(HighlightKind),
}

impl LayerKind {
    /// Whether the layer belongs to the top-down representation.
    #[must_use]
    pub const fn is_2d(self) -> bool {
        matches!(self, Self::Circle | Self::Cluster | Self::ClusterCount)
    }

    /// Whether the layer belongs to the pitched representation.
    #[must_use]
    pub const fn is_3d(self) -> bool {
        matches!(self, Self::Icon(_))
    }
}

/// A styled layer bound to a source.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    /// Layer id.
    pub id: String,
    /// Source id.
    pub source: String,
    /// What it draws.
    pub kind: LayerKind,
    /// Initial visibility.
    pub visible: bool,
}

/// Mapping collaborator.
pub trait MapRenderer {
    /// Adds or replaces a point source.
    fn set_source(&mut self, id: &str, features: &FeatureCollection, cluster: bool);

    /// Removes a source. Its layers have already been removed.
    fn remove_source(&mut self, id: &str);

    /// Adds a layer.
    fn add_layer(&mut self, layer: &LayerSpec);

    /// Removes a layer.
    fn remove_layer(&mut self, id: &str);

    /// Shows or hides a layer.
    fn set_layer_visibility(&mut self, id: &str, visible: bool);

    /// Points a layer's color expression at a feature property.
    fn set_color_property(&mut self, layer_id: &str, property: &str);

    /// Replaces the legend.
    fn set_legend(&mut self, entries: &[LegendEntry]);

    /// Flies to a point.
    fn fly_to(&mut self, center: Point<f64>, zoom: f64);

    /// Fits the viewport to a region.
    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: f64);

    /// Enables or disables the clustering toggle.
    fn set_clustering_control(&mut self, enabled: bool);
}

/// Feature property the color expression reads for `mode`.
#[must_use]
pub const fn color_property(mode: ColorMode) -> &'static str {
    match mode {
        ColorMode::Type => "color",
        ColorMode::Age => "ageColor",
        ColorMode::Price => "priceColor",
    }
}

/// Icon layer id for a category.
#[must_use]
pub fn icon_layer_id(tag: PropertyTag) -> String {
    format!("properties-icons-{}", tag.slug())
}

/// Source and layer id of a highlight overlay.
#[must_use]
pub fn highlight_id(kind: HighlightKind, key: &str) -> String {
    format!("highlight-{kind}-{key}")
}

/// Converts a record to a point feature carrying every precomputed color.
#[must_use]
pub fn to_feature(record: &EnrichedProperty) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("address".to_string(), record.address.clone().into());
    properties.insert("street".to_string(), record.street.clone().into());
    properties.insert("town".to_string(), record.town.clone().into());
    properties.insert("tag".to_string(), record.tag.to_string().into());
    properties.insert("year".to_string(), record.year.into());
    properties.insert("age".to_string(), record.age.into());
    properties.insert("totalUnits".to_string(), record.total_units.into());
    properties.insert("maxFloorLvl".to_string(), record.max_floor_lvl.into());
    properties.insert(
        "price".to_string(),
        match record.price {
            Price::Available(v) => v.into(),
            Price::Unavailable => JsonValue::from(Price::SENTINEL),
        },
    );
    properties.insert("color".to_string(), record.color.clone().into());
    properties.insert("ageColor".to_string(), record.age_color.clone().into());
    properties.insert(
        "priceColor".to_string(),
        palette::price_color_hex(record.price_color).into(),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(vec![
            record.longitude,
            record.latitude,
        ]))),
        id: Some(Id::String(record.id())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Collects records into a feature collection.
pub fn feature_collection<'a, I>(records: I) -> FeatureCollection
where
    I: IntoIterator<Item = &'a EnrichedProperty>,
{
    FeatureCollection {
        bbox: None,
        features: records.into_iter().map(to_feature).collect(),
        foreign_members: None,
    }
}

fn points<'a, I>(records: I) -> Vec<Point<f64>>
where
    I: IntoIterator<Item = &'a EnrichedProperty>,
{
    records
        .into_iter()
        .map(|r| Point::new(r.longitude, r.latitude))
        .collect()
}

/// Map sync layer.
pub struct MapSync<R: MapRenderer> {
    renderer: R,
    layers: Vec<LayerSpec>,
    sources: BTreeSet<String>,
    highlights: BTreeSet<(HighlightKind, String)>,
}

impl<R: MapRenderer> MapSync<R> {
    /// Wraps a renderer.
    pub const fn new(renderer: R) -> Self {
        Self {
            renderer,
            layers: Vec::new(),
            sources: BTreeSet::new(),
            highlights: BTreeSet::new(),
        }
    }

    /// The renderer.
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Layers currently on the map, in add order.
    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Sources currently on the map.
    pub const fn sources(&self) -> &BTreeSet<String> {
        &self.sources
    }

    /// Highlight overlays currently on the map.
    pub const fn highlights(&self) -> &BTreeSet<(HighlightKind, String)> {
        &self.highlights
    }

    fn add_layer(&mut self, layer: LayerSpec) {
        self.remove_layer(&layer.id);
        self.renderer.add_layer(&layer);
        self.layers.push(layer);
    }

    fn remove_layer(&mut self, id: &str) {
        if let Some(i) = self.layers.iter().position(|l| l.id == id) {
            self.renderer.remove_layer(id);
            self.layers.remove(i);
        }
    }

    fn set_source(&mut self, id: &str, features: &FeatureCollection, cluster: bool) {
        self.renderer.set_source(id, features, cluster);
        self.sources.insert(id.to_string());
    }

    fn remove_source(&mut self, id: &str) {
        let dependent: Vec<String> = self
            .layers
            .iter()
            .rev()
            .filter(|l| l.source == id)
            .map(|l| l.id.clone())
            .collect();
        for layer in dependent {
            self.remove_layer(&layer);
        }
        if self.sources.remove(id) {
            self.renderer.remove_source(id);
        }
    }

    fn base_layer(id: &str, kind: LayerKind, flat: bool) -> LayerSpec {
        LayerSpec {
            id: id.to_string(),
            source: BASE_SOURCE.to_string(),
            kind,
            visible: if kind.is_3d() { !flat } else { flat },
        }
    }

    fn build_base(&mut self, ctx: &SyncContext<'_>) {
        let clustered = ctx.view.clustering;
        let flat = ctx.view.is_flat();
        let features = feature_collection(ctx.data.visible(ctx.selection));
        log::debug!(
            "Building base markers: {} features, clustered={clustered}",
            features.features.len()
        );
        self.set_source(BASE_SOURCE, &features, clustered);

        if clustered {
            self.add_layer(Self::base_layer(CLUSTER_LAYER, LayerKind::Cluster, flat));
            self.add_layer(Self::base_layer(
                CLUSTER_COUNT_LAYER,
                LayerKind::ClusterCount,
                flat,
            ));
        }
        self.add_layer(Self::base_layer(CIRCLE_LAYER, LayerKind::Circle, flat));
        for tag in PropertyTag::all() {
            self.add_layer(Self::base_layer(&icon_layer_id(*tag), LayerKind::Icon(*tag), flat));
        }
        self.renderer
            .set_color_property(CIRCLE_LAYER, color_property(ctx.selection.color_mode()));
    }

    fn highlight_records<'a>(
        ctx: &SyncContext<'a>,
        kind: HighlightKind,
        key: &'a str,
    ) -> Vec<&'a EnrichedProperty> {
        match kind {
            HighlightKind::Town => ctx.data.in_town(key).collect(),
            HighlightKind::Street => ctx.data.on_street(key).collect(),
        }
    }

    fn add_highlight(&mut self, ctx: &SyncContext<'_>, kind: HighlightKind, key: &str) {
        let id = highlight_id(kind, key);
        self.remove_source(&id);

        let records = Self::highlight_records(ctx, kind, key);
        log::debug!("Highlighting {kind} {key}: {} points", records.len());
        self.set_source(&id, &feature_collection(records), false);
        self.add_layer(LayerSpec {
            id: id.clone(),
            source: id,
            kind: LayerKind::Highlight(kind),
            visible: true,
        });
        self.highlights.insert((kind, key.to_string()));
    }

    fn remove_highlight(&mut self, kind: HighlightKind, key: &str) {
        log::debug!("Removing {kind} highlight {key}");
        self.remove_source(&highlight_id(kind, key));
        self.highlights.remove(&(kind, key.to_string()));
    }

    fn fly_to_highlight(&mut self, ctx: &SyncContext<'_>, kind: HighlightKind, key: &str) {
        let points = points(Self::highlight_records(ctx, kind, key));
        match centroid(&points) {
            Some(center) => self.renderer.fly_to(center, ctx.config.map.highlight_zoom),
            None => log::debug!("No points for {kind} {key}; not flying"),
        }
    }

    fn fit_towns(&mut self, ctx: &SyncContext<'_>) {
        let towns = ctx.selection.towns();
        let bounds = ctx
            .data
            .boundaries()
            .combined_bounds(towns.iter())
            .or_else(|| {
                let records = towns.iter().flat_map(|t| ctx.data.in_town(t));
                points_bounds(&points(records))
            });
        match bounds {
            Some(bounds) => self.renderer.fit_bounds(bounds, ctx.config.map.fit_padding),
            None => log::debug!("No bounds for {:?}; not fitting", towns.as_slice()),
        }
    }

    fn apply_pitch(&mut self, ctx: &SyncContext<'_>) {
        let flat = ctx.view.is_flat();
        for layer in &mut self.layers {
            let visible = if layer.kind.is_2d() {
                flat
            } else if layer.kind.is_3d() {
                !flat
            } else {
                continue;
            };
            layer.visible = visible;
            self.renderer.set_layer_visibility(&layer.id, visible);
        }
    }
}

impl<R: MapRenderer> SyncSubscriber for MapSync<R> {
    fn name(&self) -> &'static str {
        "map"
    }

    fn on_effect(&mut self, effect: &SyncEffect, ctx: &SyncContext<'_>) {
        match effect {
            SyncEffect::Initialize => {
                self.build_base(ctx);
                self.renderer
                    .set_legend(&palette::legend(ctx.selection.color_mode()));
                self.renderer
                    .set_clustering_control(ctx.view.clustering_available(ctx.selection));
            }
            SyncEffect::MarkersChanged => {
                let features = feature_collection(ctx.data.visible(ctx.selection));
                self.set_source(BASE_SOURCE, &features, ctx.view.clustering);
            }
            SyncEffect::HighlightAdded { kind, key } => self.add_highlight(ctx, *kind, key),
            SyncEffect::HighlightRemoved { kind, key } => self.remove_highlight(*kind, key),
            SyncEffect::FlyToHighlight { kind, key } => self.fly_to_highlight(ctx, *kind, key),
            SyncEffect::ViewportReset => {
                let [lon, lat] = ctx.config.map.center;
                self.renderer.fly_to(Point::new(lon, lat), ctx.config.map.zoom);
            }
            SyncEffect::FitTownBounds => self.fit_towns(ctx),
            SyncEffect::ColorModeChanged => {
                let mode = ctx.selection.color_mode();
                self.renderer
                    .set_color_property(CIRCLE_LAYER, color_property(mode));
                self.renderer.set_legend(&palette::legend(mode));
            }
            SyncEffect::ClusteringAvailability => {
                self.renderer
                    .set_clustering_control(ctx.view.clustering_available(ctx.selection));
            }
            SyncEffect::ClusteringRebuilt => {
                log::info!("Rebuilding markers with clustering={}", ctx.view.clustering);
                self.remove_source(BASE_SOURCE);
                self.build_base(ctx);
            }
            SyncEffect::PitchChanged => self.apply_pitch(ctx),
            _ => {}
        }
    }
}
