//! Views subscribed to the synchronization pass.
//!
//! Each view owns a renderer (the external map or chart collaborator) and
//! translates [`SyncEffect`]s into renderer calls. Views never talk to
//! each other and never mutate shared state.

pub mod controls;
pub mod map;
pub mod timeline;
pub mod trend;

use chrono::NaiveDate;
use resale_map_property_models::ColorMode;

use crate::config::DashboardConfig;
use crate::data::DataStore;
use crate::effect::SyncEffect;
use crate::selection::SelectionState;

pub use controls::{ControlsRenderer, ControlsView};
pub use map::{MapRenderer, MapSync};
pub use timeline::{TimeScale, TimelineRenderer, TimelineView};
pub use trend::{TrendRenderer, TrendView};

/// The trend point under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendHover {
    /// Town or street of the point.
    pub group: String,
    /// Date of the point.
    pub date: NaiveDate,
}

/// Interaction state that is not part of the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Hovered, non-selected trend point.
    pub hover: Option<TrendHover>,
    /// Map pitch in degrees; 0 is top-down.
    pub pitch: f64,
    /// Whether the base marker source is clustered.
    pub clustering: bool,
}

impl ViewState {
    /// Startup view state.
    #[must_use]
    pub const fn new(clustering: bool) -> Self {
        Self {
            hover: None,
            pitch: 0.0,
            clustering,
        }
    }

    /// Whether the map is top-down.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.pitch.abs() < f64::EPSILON
    }

    /// Clustering is offered only for type coloring, without a town
    /// filter, on a top-down map.
    #[must_use]
    pub fn clustering_available(&self, selection: &SelectionState) -> bool {
        selection.color_mode() == ColorMode::Type && !selection.has_town_filter() && self.is_flat()
    }
}

/// Read-only state handed to subscribers with every effect.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    /// Current selection.
    pub selection: &'a SelectionState,
    /// Shared dataset.
    pub data: &'a DataStore,
    /// Hover, pitch, and clustering.
    pub view: &'a ViewState,
    /// Configuration.
    pub config: &'a DashboardConfig,
}

/// A view driven by the synchronization pass.
pub trait SyncSubscriber {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Applies one effect.
    fn on_effect(&mut self, effect: &SyncEffect, ctx: &SyncContext<'_>);
}
