#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Property, flat type, and price types for the resale map dashboard.
//!
//! This crate defines the canonical data shapes shared by every other
//! package: the raw development rows served by the backend, the enriched
//! records the dashboard renders, and the price series points that feed
//! the trend chart. Price values are never `NaN`; anything that is not a
//! finite number decodes to [`Price::Unavailable`].

use std::fmt;

use chrono::{Datelike as _, NaiveDate};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Town selection value meaning "no town filter".
pub const ALL_TOWNS: &str = "All Towns";

/// Category tag of a development.
///
/// Variant order is the fixed render order of the timeline chart, so line
/// and stack identity never depends on which categories are present.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum PropertyTag {
    /// Residential blocks.
    #[serde(rename = "Residential")]
    #[strum(serialize = "Residential")]
    Residential,
    /// Commercial units.
    #[serde(rename = "Commercial")]
    #[strum(serialize = "Commercial")]
    Commercial,
    /// Markets and hawker centres.
    #[serde(rename = "Market and hawker")]
    #[strum(serialize = "Market and hawker")]
    MarketHawker,
    /// Multi-storey car parks.
    #[serde(rename = "Multi-storey carpark")]
    #[strum(serialize = "Multi-storey carpark")]
    MultiStoreyCarpark,
    /// Everything else, including precinct pavilions.
    #[serde(rename = "Miscellaneous")]
    #[strum(serialize = "Miscellaneous")]
    Miscellaneous,
}

impl PropertyTag {
    /// Returns all variants in render order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Residential,
            Self::Commercial,
            Self::MarketHawker,
            Self::MultiStoreyCarpark,
            Self::Miscellaneous,
        ]
    }

    /// Identifier-safe name, used for layer and icon ids.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
            Self::MarketHawker => "market_hawker",
            Self::MultiStoreyCarpark => "multistorey_carpark",
            Self::Miscellaneous => "miscellaneous",
        }
    }

    /// Parses a tag as it appears in the properties dataset.
    ///
    /// Missing or unrecognized tags fall back to [`Self::Miscellaneous`].
    #[must_use]
    pub fn from_wire(tag: Option<&str>) -> Self {
        tag.and_then(|t| t.trim().parse().ok())
            .unwrap_or(Self::Miscellaneous)
    }
}

/// Flat type used to select which resale price table is active.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum FlatType {
    /// 1-room flats.
    #[serde(rename = "1 ROOM")]
    #[strum(serialize = "1 ROOM")]
    OneRoom,
    /// 2-room flats.
    #[serde(rename = "2 ROOM")]
    #[strum(serialize = "2 ROOM")]
    TwoRoom,
    /// 3-room flats.
    #[serde(rename = "3 ROOM")]
    #[strum(serialize = "3 ROOM")]
    ThreeRoom,
    /// 4-room flats, the representative default.
    #[default]
    #[serde(rename = "4 ROOM")]
    #[strum(serialize = "4 ROOM")]
    FourRoom,
    /// 5-room flats.
    #[serde(rename = "5 ROOM")]
    #[strum(serialize = "5 ROOM")]
    FiveRoom,
    /// Executive flats.
    #[serde(rename = "EXECUTIVE")]
    #[strum(serialize = "EXECUTIVE")]
    Executive,
    /// Multi-generation flats. The source datasets spell this both ways.
    #[serde(rename = "MULTI GENERATION", alias = "MULTI-GENERATION")]
    #[strum(to_string = "MULTI GENERATION", serialize = "MULTI-GENERATION")]
    MultiGeneration,
}

impl FlatType {
    /// Returns all variants in dropdown order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::OneRoom,
            Self::TwoRoom,
            Self::ThreeRoom,
            Self::FourRoom,
            Self::FiveRoom,
            Self::Executive,
            Self::MultiGeneration,
        ]
    }
}

/// Which precomputed color field the map markers are painted with.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorMode {
    /// Color by [`PropertyTag`].
    #[default]
    Type,
    /// Color by building age bucket.
    Age,
    /// Color by resale price bucket.
    Price,
}

/// Whether the trend chart is grouped by town or by street.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartType {
    /// Grouped by town; no town filter is active.
    #[default]
    Town,
    /// Grouped by street within the selected towns.
    Street,
}

/// A resale price that is either a finite number or explicitly missing.
///
/// Serializes as the number or the `"NA"` sentinel. Deserializes leniently:
/// numbers, numeric strings, `null`, `"NaN"`, `"-"` and any other text are
/// all accepted, and everything non-finite becomes [`Price::Unavailable`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Price {
    /// A finite price in dollars.
    Available(f64),
    /// Missing, malformed, or not found in the lookup table.
    #[default]
    Unavailable,
}

impl Price {
    /// Sentinel text used when a price is unavailable.
    pub const SENTINEL: &'static str = "NA";

    /// Wraps a float, mapping non-finite values to [`Self::Unavailable`].
    #[must_use]
    pub const fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self::Available(value)
        } else {
            Self::Unavailable
        }
    }

    /// Parses a string-encoded price.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        text.trim()
            .parse::<f64>()
            .map_or(Self::Unavailable, Self::from_f64)
    }

    /// Returns the numeric value, if available.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Available(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    /// Whether a numeric value is present.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(v) => write!(f, "{v:.0}"),
            Self::Unavailable => f.write_str(Self::SENTINEL),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Available(v) => serializer.serialize_f64(*v),
            Self::Unavailable => serializer.serialize_str(Self::SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PriceVisitor;

        impl<'de> Visitor<'de> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number, a numeric string, or null")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
                Ok(Price::from_f64(v))
            }

            #[allow(clippy::cast_precision_loss)]
            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
                Ok(Price::from_f64(v as f64))
            }

            #[allow(clippy::cast_precision_loss)]
            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
                Ok(Price::from_f64(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
                Ok(Price::parse(v))
            }

            fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Price, E> {
                Ok(Price::Unavailable)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Price, E> {
                Ok(Price::Unavailable)
            }

            fn visit_none<E: de::Error>(self) -> Result<Price, E> {
                Ok(Price::Unavailable)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Price, D::Error> {
                d.deserialize_any(self)
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}

/// Bucketed price color, or the neutral "unavailable" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriceColor {
    /// Index into the price threshold palette.
    Bucket(u8),
    /// No usable price for the active flat type.
    #[default]
    Unavailable,
}

impl PriceColor {
    /// Sentinel text used when no price color applies.
    pub const SENTINEL: &'static str = "unavailable";
}

impl Serialize for PriceColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bucket(i) => serializer.serialize_u8(*i),
            Self::Unavailable => serializer.serialize_str(Self::SENTINEL),
        }
    }
}

/// A development row as served by the properties endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProperty {
    /// Category tag; may be absent in older extracts.
    #[serde(default)]
    pub tag: Option<String>,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
    /// Full town name, e.g. `"BEDOK"`.
    pub town: String,
    /// Geocoded address, starting with the block number.
    pub address: String,
    /// Street name as used in the resale price tables.
    pub street: String,
    /// Total dwelling units.
    #[serde(default)]
    pub total_units: u32,
    /// Year the block was completed.
    pub year: i32,
    /// Highest floor level.
    #[serde(default)]
    pub max_floor_lvl: u32,
}

/// A property row augmented with derived date, age, colors, block, and price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedProperty {
    /// Geocoded address.
    pub address: String,
    /// Street name.
    pub street: String,
    /// Town name.
    pub town: String,
    /// Block number extracted from the address (e.g. `"123A"`).
    pub block: Option<String>,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Completion year.
    pub year: i32,
    /// First day of the completion year.
    pub date: NaiveDate,
    /// Years since completion.
    pub age: i32,
    /// Category tag.
    pub tag: PropertyTag,
    /// Palette color for the tag.
    pub color: String,
    /// Palette color for the age bucket.
    pub age_color: String,
    /// Total dwelling units.
    pub total_units: u32,
    /// Highest floor level.
    pub max_floor_lvl: u32,
    /// Price for the active flat type.
    pub price: Price,
    /// Price bucket for the active flat type.
    pub price_color: PriceColor,
}

impl EnrichedProperty {
    /// Stable identifier of the development.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{} {}", self.address, self.street)
    }
}

/// Street-level price snapshot keyed by `"<block> <street>"`.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressPrice {
    /// Block number and street joined by one space.
    pub block_street: String,
    /// Flat type this price applies to.
    pub flat_type: FlatType,
    /// Median resale price.
    pub price: Price,
}

/// One point of a town-level or street-level price series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePricePoint {
    /// Town or street name.
    pub group: String,
    /// Period end date (quarter end for towns, month for streets).
    pub date: NaiveDate,
    /// Flat type of the series.
    pub flat_type: FlatType,
    /// Aggregated price, unavailable when there were too few samples.
    pub price: Price,
}

/// A closed interval of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    /// First date in the window.
    pub start: NaiveDate,
    /// Last date in the window.
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, swapping the bounds if given in reverse.
    #[must_use]
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Whether `date` lies in `[start, end]`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the two windows share at least one date.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Restricts this window to `bounds`. A window disjoint from `bounds`
    /// is returned unchanged so it still matches no date inside them.
    #[must_use]
    pub fn clamp_to(&self, bounds: &Self) -> Self {
        if !self.overlaps(bounds) {
            return *self;
        }
        Self {
            start: self.start.max(bounds.start),
            end: self.end.min(bounds.end),
        }
    }

    /// Smallest window covering every date, or `None` if there are none.
    pub fn spanning<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<Self> {
        dates.into_iter().fold(None, |acc, d| match acc {
            None => Some(Self { start: d, end: d }),
            Some(w) => Some(Self {
                start: w.start.min(d),
                end: w.end.max(d),
            }),
        })
    }
}

/// A calendar month, formatted `YYYY-MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
}

impl YearMonth {
    /// The month containing `date`.
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The same month `years` years earlier.
    #[must_use]
    pub const fn years_back(self, years: i32) -> Self {
        Self {
            year: self.year - years,
            month: self.month,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Town code legend used by the development dataset.
const TOWN_CODES: &[(&str, &str)] = &[
    ("AMK", "ANG MO KIO"),
    ("BB", "BUKIT BATOK"),
    ("BD", "BEDOK"),
    ("BH", "BISHAN"),
    ("BM", "BUKIT MERAH"),
    ("BP", "BUKIT PANJANG"),
    ("BT", "BUKIT TIMAH"),
    ("CCK", "CHOA CHU KANG"),
    ("CL", "CLEMENTI"),
    ("CT", "CENTRAL AREA"),
    ("GL", "GEYLANG"),
    ("HG", "HOUGANG"),
    ("JE", "JURONG EAST"),
    ("JW", "JURONG WEST"),
    ("KWN", "KALLANG"),
    ("MP", "MARINE PARADE"),
    ("PG", "PUNGGOL"),
    ("PRC", "PASIR RIS"),
    ("QT", "QUEENSTOWN"),
    ("SB", "SEMBAWANG"),
    ("SGN", "SERANGOON"),
    ("SK", "SENGKANG"),
    ("TAP", "TAMPINES"),
    ("TG", "TENGAH"),
    ("TP", "TOA PAYOH"),
    ("WL", "WOODLANDS"),
    ("YS", "YISHUN"),
];

/// Resolves a town code (e.g. `"TAP"`) to its full name.
#[must_use]
pub fn town_name(code: &str) -> Option<&'static str> {
    TOWN_CODES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Full upper-case town name for a dataset value that is either a town
/// code (`"TAP"`) or already a name.
#[must_use]
pub fn resolve_town(value: &str) -> String {
    let value = value.trim();
    town_name(value).map_or_else(|| value.to_uppercase(), str::to_string)
}
