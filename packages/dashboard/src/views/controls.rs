//! Dropdown controls: towns, streets, flat type, color mode.

use resale_map_property_models::{ALL_TOWNS, ColorMode, FlatType};

use crate::effect::SyncEffect;

use super::{SyncContext, SyncSubscriber};

/// Widget collaborator.
pub trait ControlsRenderer {
    /// Replaces the town checkbox options.
    fn set_town_options(&mut self, options: &[String]);

    /// Sets which town checkboxes are checked.
    fn set_town_checks(&mut self, checked: &[String]);

    /// Replaces the street checkbox options.
    fn set_street_options(&mut self, options: &[String]);

    /// Sets which street checkboxes are checked.
    fn set_street_checks(&mut self, checked: &[String]);

    /// Shows the selected flat type.
    fn set_flat_type(&mut self, flat_type: FlatType, options: &[FlatType]);

    /// Shows the selected color mode.
    fn set_color_mode(&mut self, mode: ColorMode);
}

/// Controls view.
pub struct ControlsView<R: ControlsRenderer> {
    renderer: R,
}

impl<R: ControlsRenderer> ControlsView<R> {
    /// Wraps a renderer.
    pub const fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// The renderer.
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    fn street_options(&mut self, ctx: &SyncContext<'_>) {
        let options = if ctx.selection.has_town_filter() {
            ctx.data.streets_in(ctx.selection.towns())
        } else {
            Vec::new()
        };
        self.renderer.set_street_options(&options);
    }
}

impl<R: ControlsRenderer> SyncSubscriber for ControlsView<R> {
    fn name(&self) -> &'static str {
        "controls"
    }

    fn on_effect(&mut self, effect: &SyncEffect, ctx: &SyncContext<'_>) {
        let selection = ctx.selection;
        match effect {
            SyncEffect::Initialize => {
                let options: Vec<String> = std::iter::once(ALL_TOWNS.to_string())
                    .chain(ctx.data.towns().iter().cloned())
                    .collect();
                self.renderer.set_town_options(&options);
                self.renderer.set_town_checks(selection.towns().as_slice());
                self.street_options(ctx);
                self.renderer.set_street_checks(selection.streets().as_slice());
                self.renderer
                    .set_flat_type(selection.flat_type(), FlatType::all());
                self.renderer.set_color_mode(selection.color_mode());
            }
            SyncEffect::TownChecks => {
                self.renderer.set_town_checks(selection.towns().as_slice());
            }
            SyncEffect::StreetChecks => {
                self.renderer.set_street_checks(selection.streets().as_slice());
            }
            SyncEffect::StreetOptionsChanged => self.street_options(ctx),
            _ => {}
        }
    }
}
