//! Color palettes and threshold scales for the three map color modes.
//!
//! Thresholds follow threshold-scale semantics: a value below the first
//! threshold lands in bucket 0, a value at or above threshold `i` and
//! below threshold `i + 1` lands in bucket `i + 1`.

use resale_map_property_models::{ColorMode, PriceColor, PropertyTag};

/// Neutral color for unavailable prices and non-highlighted marks.
pub const NEUTRAL_COLOR: &str = "#bdbdbd";

/// Age thresholds in years.
pub const AGE_THRESHOLDS: &[i32] = &[10, 20, 30, 40, 50];

/// One color per age bucket (`AGE_THRESHOLDS.len() + 1`).
pub const AGE_COLORS: &[&str] = &[
    "#fee5d9", "#fcbba1", "#fc9272", "#fb6a4a", "#de2d26", "#a50f15",
];

/// Price thresholds in dollars.
pub const PRICE_THRESHOLDS: &[f64] = &[
    300_000.0,
    400_000.0,
    500_000.0,
    600_000.0,
    700_000.0,
    800_000.0,
    1_000_000.0,
];

/// One color per price bucket (`PRICE_THRESHOLDS.len() + 1`).
pub const PRICE_COLORS: &[&str] = &[
    "#440154", "#46327e", "#365c8d", "#277f8e", "#1fa187", "#4ac16d", "#a0da39", "#fde725",
];

/// Palette color for a category tag.
#[must_use]
pub const fn tag_color(tag: PropertyTag) -> &'static str {
    match tag {
        PropertyTag::Residential => "#4e79a7",
        PropertyTag::Commercial => "#f28e2b",
        PropertyTag::MarketHawker => "#e15759",
        PropertyTag::MultiStoreyCarpark => "#76b7b2",
        PropertyTag::Miscellaneous => "#59a14f",
    }
}

/// Color for a building age. Each bucket includes its lower threshold:
/// `[0, 10)`, `[10, 20)`, ..., `[50, inf)`.
#[must_use]
pub fn age_color(age: i32) -> &'static str {
    AGE_COLORS[AGE_THRESHOLDS.partition_point(|t| *t <= age)]
}

/// Bucket for a price, or the unavailable sentinel.
#[must_use]
pub fn price_bucket(price: Option<f64>) -> PriceColor {
    price.map_or(PriceColor::Unavailable, |p| {
        let idx = PRICE_THRESHOLDS.partition_point(|t| *t <= p);
        PriceColor::Bucket(u8::try_from(idx).unwrap_or(u8::MAX))
    })
}

/// Hex color for a price bucket.
#[must_use]
pub fn price_color_hex(color: PriceColor) -> &'static str {
    match color {
        PriceColor::Bucket(i) => PRICE_COLORS
            .get(usize::from(i))
            .copied()
            .unwrap_or(NEUTRAL_COLOR),
        PriceColor::Unavailable => NEUTRAL_COLOR,
    }
}

/// One row of a map legend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    /// Label text.
    pub label: String,
    /// Swatch color.
    pub color: &'static str,
}

/// Builds the legend for a color mode from the same tables used to color
/// the records.
#[must_use]
pub fn legend(mode: ColorMode) -> Vec<LegendEntry> {
    match mode {
        ColorMode::Type => PropertyTag::all()
            .iter()
            .map(|tag| LegendEntry {
                label: tag.to_string(),
                color: tag_color(*tag),
            })
            .collect(),
        ColorMode::Age => threshold_labels(AGE_THRESHOLDS, |t| format!("{t} yrs"))
            .into_iter()
            .zip(AGE_COLORS.iter().copied())
            .map(|(label, color)| LegendEntry { label, color })
            .collect(),
        ColorMode::Price => {
            let mut entries: Vec<LegendEntry> =
                threshold_labels(PRICE_THRESHOLDS, |t| format!("${:.0}k", t / 1000.0))
                    .into_iter()
                    .zip(PRICE_COLORS.iter().copied())
                    .map(|(label, color)| LegendEntry { label, color })
                    .collect();
            entries.push(LegendEntry {
                label: "No data".to_string(),
                color: NEUTRAL_COLOR,
            });
            entries
        }
    }
}

fn threshold_labels<T: Copy>(thresholds: &[T], fmt: impl Fn(T) -> String) -> Vec<String> {
    let mut labels = Vec::with_capacity(thresholds.len() + 1);
    if let Some(first) = thresholds.first() {
        labels.push(format!("< {}", fmt(*first)));
    }
    for pair in thresholds.windows(2) {
        labels.push(format!("{} - {}", fmt(pair[0]), fmt(pair[1])));
    }
    if let Some(last) = thresholds.last() {
        labels.push(format!(">= {}", fmt(*last)));
    }
    labels
}
