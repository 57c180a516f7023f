#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Town boundaries and viewport geometry.
//!
//! Loads planning-area polygons from the boundary endpoint's `GeoJSON`,
//! keeps one [`MultiPolygon`] and its bounding rectangle per town, and
//! provides the point-set helpers the map uses to fly to a highlight
//! (arithmetic-mean centroid) or fit several towns at once (union of
//! bounding rectangles).

use std::collections::BTreeMap;

use geo::{BoundingRect, Centroid, Contains, Coord, MultiPoint, MultiPolygon, Point, Rect};
use geojson::{FeatureCollection, GeoJson};
use thiserror::Error;

/// Errors from boundary loading.
#[derive(Debug, Error)]
pub enum GeographyError {
    /// The input was not valid `GeoJSON`.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The input was valid `GeoJSON` but not a feature collection.
    #[error("Expected a FeatureCollection, got {kind}")]
    NotFeatureCollection {
        /// What was found instead.
        kind: &'static str,
    },
}

/// A town polygon with its precomputed bounding rectangle.
struct TownBoundary {
    polygon: MultiPolygon<f64>,
    bounds: Rect<f64>,
}

/// Boundary polygons keyed by upper-cased town name.
#[derive(Default)]
pub struct TownBoundaries {
    towns: BTreeMap<String, TownBoundary>,
}

impl std::fmt::Debug for TownBoundaries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TownBoundaries")
            .field("towns", &self.towns.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TownBoundaries {
    /// Builds the index from a feature collection, reading each town's name
    /// from `name_property`.
    ///
    /// Features without a name or with a non-polygon geometry are skipped.
    /// A town that appears in several features gets the union of their
    /// polygons.
    #[must_use]
    pub fn from_feature_collection(collection: &FeatureCollection, name_property: &str) -> Self {
        let mut towns: BTreeMap<String, TownBoundary> = BTreeMap::new();

        for feature in &collection.features {
            let Some(name) = feature
                .property(name_property)
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
            else {
                log::debug!("Skipping boundary feature without '{name_property}'");
                continue;
            };

            let Some(polygon) = feature.geometry.clone().and_then(to_multipolygon) else {
                log::warn!("Failed to parse boundary geometry for {name}");
                continue;
            };
            let Some(bounds) = polygon.bounding_rect() else {
                log::warn!("Empty boundary geometry for {name}");
                continue;
            };

            match towns.get_mut(&name) {
                Some(existing) => {
                    existing.polygon.0.extend(polygon.0);
                    existing.bounds = union_rects(existing.bounds, bounds);
                }
                None => {
                    towns.insert(name, TownBoundary { polygon, bounds });
                }
            }
        }

        log::info!("Loaded {} town boundaries", towns.len());
        Self { towns }
    }

    /// Parses a `GeoJSON` string and builds the index.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the string is not a `GeoJSON` feature
    /// collection.
    pub fn from_geojson_str(geojson: &str, name_property: &str) -> Result<Self, GeographyError> {
        match geojson.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(fc) => Ok(Self::from_feature_collection(&fc, name_property)),
            GeoJson::Feature(_) => Err(GeographyError::NotFeatureCollection { kind: "Feature" }),
            GeoJson::Geometry(_) => Err(GeographyError::NotFeatureCollection { kind: "Geometry" }),
        }
    }

    /// Number of towns with a boundary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.towns.len()
    }

    /// Whether no boundaries were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towns.is_empty()
    }

    /// Bounding rectangle of a town (case-insensitive).
    #[must_use]
    pub fn bounds(&self, town: &str) -> Option<Rect<f64>> {
        self.towns.get(&town.to_uppercase()).map(|b| b.bounds)
    }

    /// Union of the bounding rectangles of every listed town that has a
    /// boundary.
    pub fn combined_bounds<'a, I: IntoIterator<Item = &'a str>>(&self, towns: I) -> Option<Rect<f64>> {
        towns
            .into_iter()
            .filter_map(|t| self.bounds(t))
            .reduce(union_rects)
    }

    /// The town whose polygon contains the point, if any.
    #[must_use]
    pub fn town_at(&self, lon: f64, lat: f64) -> Option<&str> {
        let point = Point::new(lon, lat);
        self.towns
            .iter()
            .filter(|(_, b)| b.bounds.contains(&point))
            .find(|(_, b)| b.polygon.contains(&point))
            .map(|(name, _)| name.as_str())
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Smallest rectangle covering both inputs.
#[must_use]
pub fn union_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Arithmetic mean of the points, or `None` for an empty set.
#[must_use]
pub fn centroid(points: &[Point<f64>]) -> Option<Point<f64>> {
    MultiPoint::new(points.to_vec()).centroid()
}

/// Bounding rectangle of the points, or `None` for an empty set.
#[must_use]
pub fn points_bounds(points: &[Point<f64>]) -> Option<Rect<f64>> {
    MultiPoint::new(points.to_vec()).bounding_rect()
}
