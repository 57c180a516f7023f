#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data enrichment for development records.
//!
//! Joins each [`RawProperty`] with the street-level price snapshot for the
//! active flat type and derives the fields the map and timeline read:
//! completion date, age, tag/age/price colors, and block number.
//!
//! Enrichment is a pure function of its inputs. It runs once at startup
//! and the price annotation re-runs in place on every flat type change, so
//! both paths share [`annotate_price`] and produce identical output.

pub mod block;
pub mod lookup;
pub mod palette;

use chrono::NaiveDate;
use resale_map_property_models::{
    EnrichedProperty, FlatType, Price, PriceColor, PropertyTag, RawProperty, resolve_town,
};

pub use lookup::PriceLookup;

/// Clock and window inputs to enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentContext {
    /// Year ages are measured from.
    pub current_year: i32,
    /// Records must be completed strictly after this date.
    pub window_start: NaiveDate,
}

/// Builds the enriched record set.
///
/// Records whose completion year is not a valid date are dropped. The
/// output is filtered to `date > window_start` and sorted ascending by date
/// (stable, so equal dates keep input order).
#[must_use]
pub fn enrich(
    rows: &[RawProperty],
    lookup: &PriceLookup,
    flat_type: FlatType,
    ctx: &EnrichmentContext,
) -> Vec<EnrichedProperty> {
    let mut records: Vec<EnrichedProperty> = rows
        .iter()
        .filter_map(|row| {
            let Some(date) = NaiveDate::from_ymd_opt(row.year, 1, 1) else {
                log::warn!(
                    "Skipping {} with invalid completion year {}",
                    row.address,
                    row.year
                );
                return None;
            };

            let tag = PropertyTag::from_wire(row.tag.as_deref());
            let age = ctx.current_year - row.year;
            let block = block::first_numeric_token(&row.address);
            let (price, price_color) =
                annotate_price(block.as_deref(), &row.street, lookup, flat_type);

            Some(EnrichedProperty {
                address: row.address.clone(),
                street: row.street.clone(),
                town: resolve_town(&row.town),
                block,
                longitude: row.lon,
                latitude: row.lat,
                year: row.year,
                date,
                age,
                tag,
                color: palette::tag_color(tag).to_string(),
                age_color: palette::age_color(age).to_string(),
                total_units: row.total_units,
                max_floor_lvl: row.max_floor_lvl,
                price,
                price_color,
            })
        })
        .filter(|r| r.date > ctx.window_start)
        .collect();

    records.sort_by_key(|r| r.date);

    log::debug!(
        "Enriched {} of {} properties for {flat_type}",
        records.len(),
        rows.len()
    );

    records
}

/// Recomputes `price` and `price_color` in place for a new flat type.
pub fn reprice(records: &mut [EnrichedProperty], lookup: &PriceLookup, flat_type: FlatType) {
    let mut priced = 0_usize;
    for record in records.iter_mut() {
        let (price, price_color) =
            annotate_price(record.block.as_deref(), &record.street, lookup, flat_type);
        record.price = price;
        record.price_color = price_color;
        if price.is_available() {
            priced += 1;
        }
    }
    log::debug!(
        "Repriced {} properties for {flat_type}: {priced} with prices",
        records.len()
    );
}

/// The lookup key for a block on a street.
#[must_use]
pub fn price_key(block: &str, street: &str) -> String {
    format!("{block} {street}")
}

/// Looks up the price for a block/street under `flat_type`.
///
/// A missing block, a lookup miss, and a malformed price all yield the
/// unavailable sentinels.
#[must_use]
pub fn annotate_price(
    block: Option<&str>,
    street: &str,
    lookup: &PriceLookup,
    flat_type: FlatType,
) -> (Price, PriceColor) {
    let price = block.map_or(Price::Unavailable, |b| {
        lookup.get(flat_type, &price_key(b, street))
    });
    (price, palette::price_bucket(price.value()))
}
