//! Trend chart: price over time grouped by town or street, with
//! rank-based highlighting, selection, and hover.

use chrono::NaiveDate;
use resale_map_aggregate::{Highlight, TrendRanking, group_series, rank_groups};
use resale_map_enrich::palette::NEUTRAL_COLOR;
use resale_map_property_models::{AggregatePricePoint, ChartType, FlatType, Price};

use crate::data::StreetSeries;
use crate::effect::SyncEffect;
use crate::selection::OrderedSet;

use super::{SyncContext, SyncSubscriber, TrendHover};

/// Colors of the top-ranked groups, highest first.
pub const TOP_COLORS: [&str; 3] = ["#1a9850", "#66bd63", "#a6d96a"];

/// Colors of the bottom-ranked groups, lowest first.
pub const BOTTOM_COLORS: [&str; 2] = ["#d73027", "#f46d43"];

/// Color of selected groups outside the highlighted set.
pub const ACCENT_COLOR: &str = "#3182bd";

/// Radius multiplier for selected and hovered points.
pub const EMPHASIS_SCALE: f64 = 1.35;

/// Opacity of points that are neither emphasized nor ranked.
pub const DIM_OPACITY: f64 = 0.2;

/// Why the chart shows a placeholder instead of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The grouping and filters yield no rows.
    NoData,
    /// Street data for the selected towns is in flight.
    Loading,
}

/// One plotted point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendPoint {
    /// Period date.
    pub date: NaiveDate,
    /// Price; unavailable prices are never plotted.
    pub price: f64,
}

/// The points of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendGroup {
    /// Town or street.
    pub key: String,
    /// Points in date order.
    pub points: Vec<TrendPoint>,
}

/// Visual style of every point of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct PointStyle {
    /// Town or street.
    pub group: String,
    /// Radius in pixels.
    pub radius: f64,
    /// Opacity, 0 to 1.
    pub opacity: f64,
    /// Fill color.
    pub color: &'static str,
}

/// The single visible tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    /// Town or street.
    pub group: String,
    /// Date of the point.
    pub date: NaiveDate,
    /// Price at the point.
    pub price: Price,
}

/// Everything needed to draw the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendChart {
    /// Grouping.
    pub chart_type: ChartType,
    /// Flat type of the series.
    pub flat_type: FlatType,
    /// Plotted groups, sorted by key.
    pub groups: Vec<TrendGroup>,
    /// Ranking the highlight colors come from.
    pub ranking: TrendRanking,
    /// Base point radius.
    pub base_radius: f64,
}

/// Charting collaborator.
pub trait TrendRenderer {
    /// Replaces the chart contents.
    fn draw(&mut self, chart: &TrendChart);

    /// Replaces the chart contents with a placeholder.
    fn show_placeholder(&mut self, placeholder: Placeholder);

    /// Applies point styles without redrawing.
    fn restyle(&mut self, styles: &[PointStyle]);

    /// Shows the tooltip, or hides it when `None`.
    fn show_tooltip(&mut self, tooltip: Option<&Tooltip>);
}

/// Builds the chart model from a series. Returns `None` when nothing would
/// be plotted.
#[must_use]
pub fn build_chart(
    chart_type: ChartType,
    flat_type: FlatType,
    series: &[AggregatePricePoint],
    window_months: u32,
    base_radius: f64,
) -> Option<TrendChart> {
    let groups: Vec<TrendGroup> = group_series(series)
        .into_iter()
        .map(|(key, points)| TrendGroup {
            key: key.to_string(),
            points: points
                .into_iter()
                .filter_map(|p| {
                    p.price.value().map(|price| TrendPoint {
                        date: p.date,
                        price,
                    })
                })
                .collect(),
        })
        .filter(|g| !g.points.is_empty())
        .collect();

    if groups.is_empty() {
        return None;
    }

    Some(TrendChart {
        chart_type,
        flat_type,
        groups,
        ranking: rank_groups(series, window_months),
        base_radius,
    })
}

/// Color a ranked group is drawn in.
#[must_use]
pub fn ranking_color(highlight: Highlight) -> &'static str {
    match highlight {
        Highlight::Top(i) => TOP_COLORS.get(i).copied().unwrap_or(ACCENT_COLOR),
        Highlight::Bottom(i) => BOTTOM_COLORS.get(i).copied().unwrap_or(ACCENT_COLOR),
    }
}

/// Style of `group` under the current selection and hover.
///
/// Selected or hovered points are enlarged and opaque in their ranking
/// color, or the accent color if unranked. With any selection active every
/// other point is dimmed and neutral. Without one, ranked groups keep
/// their color and the rest are dimmed and neutral.
#[must_use]
pub fn appearance(
    group: &str,
    ranking: &TrendRanking,
    selection: &OrderedSet,
    hover: Option<&str>,
    base_radius: f64,
) -> PointStyle {
    let selected = selection.contains(group);
    let hovered = !selected && hover == Some(group);
    let highlight = ranking.highlight(group);

    let (radius, opacity, color) = if selected || hovered {
        (
            base_radius * EMPHASIS_SCALE,
            1.0,
            highlight.map_or(ACCENT_COLOR, ranking_color),
        )
    } else if !selection.is_empty() {
        (base_radius, DIM_OPACITY, NEUTRAL_COLOR)
    } else if let Some(h) = highlight {
        (base_radius, 1.0, ranking_color(h))
    } else {
        (base_radius, DIM_OPACITY, NEUTRAL_COLOR)
    };

    PointStyle {
        group: group.to_string(),
        radius,
        opacity,
        color,
    }
}

/// The tooltip to show, if any.
///
/// A hovered, non-selected point wins. Otherwise the most recently
/// selected group's latest point is shown. A hover on a point missing from
/// the chart falls through to the selection.
#[must_use]
pub fn tooltip(
    chart: &TrendChart,
    selection: &OrderedSet,
    hover: Option<&TrendHover>,
) -> Option<Tooltip> {
    let find = |key: &str| chart.groups.iter().find(|g| g.key == key);

    let hovered = hover
        .filter(|h| !selection.contains(&h.group))
        .and_then(|h| {
            let group = find(&h.group)?;
            let point = group.points.iter().find(|p| p.date == h.date)?;
            Some((group, point))
        });
    if let Some((group, point)) = hovered {
        return Some(Tooltip {
            group: group.key.clone(),
            date: point.date,
            price: Price::Available(point.price),
        });
    }

    let group = find(selection.last()?)?;
    let point = group.points.iter().max_by_key(|p| p.date)?;
    Some(Tooltip {
        group: group.key.clone(),
        date: point.date,
        price: Price::Available(point.price),
    })
}

/// Trend chart view.
pub struct TrendView<R: TrendRenderer> {
    renderer: R,
    chart: Option<TrendChart>,
}

impl<R: TrendRenderer> TrendView<R> {
    /// Wraps a renderer.
    pub const fn new(renderer: R) -> Self {
        Self {
            renderer,
            chart: None,
        }
    }

    /// The last drawn chart.
    pub const fn chart(&self) -> Option<&TrendChart> {
        self.chart.as_ref()
    }

    /// The renderer.
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    fn redraw(&mut self, ctx: &SyncContext<'_>) {
        let selection = ctx.selection;
        let chart_type = selection.chart_type();

        if chart_type == ChartType::Street {
            match ctx.data.street_series() {
                StreetSeries::Pending { .. } | StreetSeries::NotLoaded => {
                    self.chart = None;
                    self.renderer.show_placeholder(Placeholder::Loading);
                    self.renderer.show_tooltip(None);
                    return;
                }
                StreetSeries::Failed { .. } | StreetSeries::Loaded { .. } => {}
            }
        }

        let base_radius = match chart_type {
            ChartType::Town => ctx.config.trend.town_radius,
            ChartType::Street => ctx.config.trend.street_radius,
        };
        let series = ctx.data.trend_series(selection);
        self.chart = build_chart(
            chart_type,
            selection.flat_type(),
            &series,
            ctx.config.trend.window_months,
            base_radius,
        );

        let Some(chart) = &self.chart else {
            log::debug!("Trend chart has no data for {chart_type}");
            self.renderer.show_placeholder(Placeholder::NoData);
            self.renderer.show_tooltip(None);
            return;
        };

        log::debug!(
            "Trend chart: {} groups by {chart_type} for {}, highlighted {:?}",
            chart.groups.len(),
            chart.flat_type,
            chart.ranking.highlighted().collect::<Vec<_>>()
        );
        self.renderer.draw(chart);
        self.restyle(ctx);
    }

    fn restyle(&mut self, ctx: &SyncContext<'_>) {
        let Some(chart) = &self.chart else {
            return;
        };
        let selection = ctx.selection.trend_selection();
        let hover = ctx.view.hover.as_ref();
        let styles: Vec<PointStyle> = chart
            .groups
            .iter()
            .map(|g| {
                appearance(
                    &g.key,
                    &chart.ranking,
                    selection,
                    hover.map(|h| h.group.as_str()),
                    chart.base_radius,
                )
            })
            .collect();
        self.renderer.restyle(&styles);
        self.renderer
            .show_tooltip(tooltip(chart, selection, hover).as_ref());
    }
}

impl<R: TrendRenderer> SyncSubscriber for TrendView<R> {
    fn name(&self) -> &'static str {
        "trend"
    }

    fn on_effect(&mut self, effect: &SyncEffect, ctx: &SyncContext<'_>) {
        match effect {
            SyncEffect::Initialize | SyncEffect::TrendRedraw => self.redraw(ctx),
            SyncEffect::TrendAppearanceChanged => self.restyle(ctx),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resale_map_aggregate::TOP_COUNT;

    fn d(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
    }

    fn series(groups: &[(&str, f64)]) -> Vec<AggregatePricePoint> {
        groups
            .iter()
            .flat_map(|(g, price)| {
                (1..=3).map(move |m| AggregatePricePoint {
                    group: (*g).to_string(),
                    date: d(2024, m),
                    flat_type: FlatType::FourRoom,
                    price: Price::Available(*price),
                })
            })
            .collect()
    }

    fn chart() -> TrendChart {
        let points = series(&[
            ("A", 900.0),
            ("B", 800.0),
            ("C", 700.0),
            ("D", 600.0),
            ("E", 500.0),
            ("F", 400.0),
            ("G", 300.0),
        ]);
        build_chart(ChartType::Street, FlatType::FourRoom, &points, 6, 4.0).unwrap()
    }

    #[test]
    fn no_selection_uses_ranking_colors() {
        let chart = chart();
        let none = OrderedSet::new();
        let a = appearance("A", &chart.ranking, &none, None, 4.0);
        assert_eq!((a.color, a.opacity, a.radius), (TOP_COLORS[0], 1.0, 4.0));
        let g = appearance("G", &chart.ranking, &none, None, 4.0);
        assert_eq!(g.color, BOTTOM_COLORS[0]);
        let d = appearance("D", &chart.ranking, &none, None, 4.0);
        assert_eq!((d.color, d.opacity), (NEUTRAL_COLOR, DIM_OPACITY));
    }

    #[test]
    fn selection_dims_everything_else() {
        let chart = chart();
        let selection: OrderedSet = ["D"].into_iter().collect();

        let d = appearance("D", &chart.ranking, &selection, None, 4.0);
        assert_eq!(d.color, ACCENT_COLOR);
        assert!((d.radius - 4.0 * EMPHASIS_SCALE).abs() < 1e-9);

        // Ranked but unselected points lose their color while a selection
        // is active.
        let a = appearance("A", &chart.ranking, &selection, None, 4.0);
        assert_eq!((a.color, a.opacity), (NEUTRAL_COLOR, DIM_OPACITY));

        let b = appearance("B", &chart.ranking, &selection, Some("B"), 4.0);
        assert_eq!((b.color, b.opacity), (TOP_COLORS[1], 1.0));
    }

    #[test]
    fn hover_revert_restores_previous_style() {
        let chart = chart();
        let selection: OrderedSet = ["D"].into_iter().collect();
        let before = appearance("E", &chart.ranking, &selection, None, 4.0);
        let during = appearance("E", &chart.ranking, &selection, Some("E"), 4.0);
        let after = appearance("E", &chart.ranking, &selection, None, 4.0);
        assert_ne!(before, during);
        assert_eq!(before, after);
    }

    #[test]
    fn tooltip_priority() {
        let chart = chart();
        let none = OrderedSet::new();
        assert_eq!(tooltip(&chart, &none, None), None);

        let selection: OrderedSet = ["B", "E"].into_iter().collect();
        let tip = tooltip(&chart, &selection, None).unwrap();
        assert_eq!((tip.group.as_str(), tip.date), ("E", d(2024, 3)));

        let hover = TrendHover {
            group: "A".to_string(),
            date: d(2024, 2),
        };
        let tip = tooltip(&chart, &selection, Some(&hover)).unwrap();
        assert_eq!((tip.group.as_str(), tip.price), ("A", Price::Available(900.0)));

        // Hovering a selected point does not override the selection tooltip.
        let hover = TrendHover {
            group: "B".to_string(),
            date: d(2024, 1),
        };
        let tip = tooltip(&chart, &selection, Some(&hover)).unwrap();
        assert_eq!(tip.group, "E");
    }

    #[test]
    fn hover_outside_chart_falls_back_to_selection() {
        let chart = chart();
        let selection: OrderedSet = ["C"].into_iter().collect();

        let unknown_group = TrendHover {
            group: "NOWHERE".to_string(),
            date: d(2024, 1),
        };
        let tip = tooltip(&chart, &selection, Some(&unknown_group)).unwrap();
        assert_eq!((tip.group.as_str(), tip.date), ("C", d(2024, 3)));

        let unknown_date = TrendHover {
            group: "A".to_string(),
            date: d(2019, 1),
        };
        let tip = tooltip(&chart, &selection, Some(&unknown_date)).unwrap();
        assert_eq!(tip.group, "C");

        assert_eq!(tooltip(&chart, &OrderedSet::new(), Some(&unknown_date)), None);
    }

    #[test]
    fn unavailable_prices_are_not_plotted() {
        let mut points = series(&[("A", 900.0)]);
        points.push(AggregatePricePoint {
            group: "Z".to_string(),
            date: d(2024, 3),
            flat_type: FlatType::FourRoom,
            price: Price::Unavailable,
        });
        let chart = build_chart(ChartType::Town, FlatType::FourRoom, &points, 6, 3.0).unwrap();
        assert_eq!(chart.groups.len(), 1);
        assert!(chart.ranking.highlight("Z").is_none());
        assert!(chart.ranking.top().len() <= TOP_COUNT);
    }

    #[test]
    fn empty_series_has_no_chart() {
        assert!(build_chart(ChartType::Town, FlatType::FourRoom, &[], 6, 3.0).is_none());
        let only_na = vec![AggregatePricePoint {
            group: "Z".to_string(),
            date: d(2024, 3),
            flat_type: FlatType::FourRoom,
            price: Price::Unavailable,
        }];
        assert!(build_chart(ChartType::Town, FlatType::FourRoom, &only_na, 6, 3.0).is_none());
    }
}
