//! Timeline: cumulative developments per category with a date brush.

use chrono::{Duration, NaiveDate};
use resale_map_aggregate::{CumulativeSeries, cumulative_by_category};
use resale_map_property_models::DateWindow;

use crate::effect::SyncEffect;

use super::{SyncContext, SyncSubscriber};

/// Linear mapping between a date domain and a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: DateWindow,
    width: f64,
}

impl TimeScale {
    /// Maps `domain` onto `[0, width]`.
    #[must_use]
    pub const fn new(domain: DateWindow, width: f64) -> Self {
        Self { domain, width }
    }

    /// The date domain.
    #[must_use]
    pub const fn domain(&self) -> DateWindow {
        self.domain
    }

    fn span_days(&self) -> i64 {
        (self.domain.end - self.domain.start).num_days()
    }

    /// Pixel position of `date`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_pixel(&self, date: NaiveDate) -> f64 {
        let span = self.span_days();
        if span == 0 {
            return 0.0;
        }
        (date - self.domain.start).num_days() as f64 / span as f64 * self.width
    }

    /// Date at pixel `x`, clamped to the domain.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn invert(&self, x: f64) -> NaiveDate {
        if self.width <= 0.0 || !x.is_finite() {
            return self.domain.start;
        }
        let fraction = (x / self.width).clamp(0.0, 1.0);
        let days = (fraction * self.span_days() as f64).round() as i64;
        self.domain.start + Duration::days(days)
    }

    /// Date window selected by a pixel range, in either direction.
    #[must_use]
    pub fn invert_range(&self, x0: f64, x1: f64) -> DateWindow {
        DateWindow::new(self.invert(x0), self.invert(x1))
    }
}

/// Charting collaborator.
pub trait TimelineRenderer {
    /// Draws the cumulative series.
    fn draw(&mut self, series: &CumulativeSeries, scale: &TimeScale);

    /// Draws an empty-chart placeholder.
    fn show_no_data(&mut self);

    /// Positions the brush, or removes it when `None`.
    fn set_brush(&mut self, pixels: Option<(f64, f64)>);

    /// Shows the visible property count.
    fn set_count(&mut self, count: usize);
}

/// Timeline view.
pub struct TimelineView<R: TimelineRenderer> {
    renderer: R,
}

impl<R: TimelineRenderer> TimelineView<R> {
    /// Wraps a renderer.
    pub const fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// The renderer.
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }
}

impl<R: TimelineRenderer> SyncSubscriber for TimelineView<R> {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn on_effect(&mut self, effect: &SyncEffect, ctx: &SyncContext<'_>) {
        match effect {
            SyncEffect::Initialize => {
                let series = cumulative_by_category(ctx.data.records());
                if series.is_empty() {
                    self.renderer.show_no_data();
                } else {
                    let scale = TimeScale::new(ctx.data.full_range(), ctx.config.timeline.width);
                    self.renderer.draw(&series, &scale);
                }
                self.renderer.set_brush(None);
                self.renderer.set_count(ctx.data.visible_count(ctx.selection));
            }
            SyncEffect::PropertyCountChanged => {
                self.renderer.set_count(ctx.data.visible_count(ctx.selection));
            }
            SyncEffect::BrushReset => self.renderer.set_brush(None),
            _ => {}
        }
    }
}
