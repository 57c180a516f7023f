//! Synchronization effects broadcast to views after a transition.
//!
//! Effects name *what* changed; subscribers read the new state from the
//! [`crate::views::SyncContext`] they are handed alongside. The order of
//! the effects a transition emits is the order subscribers observe.

use serde::Serialize;
use strum_macros::{AsRefStr, Display};

/// Which selection set a highlight overlay belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HighlightKind {
    /// A selected town.
    Town,
    /// A selected street.
    Street,
}

/// One step of a synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SyncEffect {
    /// First render after the initial load.
    Initialize,
    /// A value joined a selection set; add its overlay.
    HighlightAdded {
        /// Set the value joined.
        kind: HighlightKind,
        /// Town or street name.
        key: String,
    },
    /// A value left a selection set; remove its overlay.
    HighlightRemoved {
        /// Set the value left.
        kind: HighlightKind,
        /// Town or street name.
        key: String,
    },
    /// Fly to the centroid of a highlighted value.
    FlyToHighlight {
        /// Set the value belongs to.
        kind: HighlightKind,
        /// Town or street name.
        key: String,
    },
    /// Return the map to the default center and zoom.
    ViewportReset,
    /// Fit the map to the combined bounds of the selected towns.
    FitTownBounds,
    /// Rebuild the base marker source.
    MarkersChanged,
    /// The visible property count may have changed.
    PropertyCountChanged,
    /// Redraw the trend chart from its series.
    TrendRedraw,
    /// Re-derive trend point styles and the tooltip.
    TrendAppearanceChanged,
    /// Swap the marker color expression and legend.
    ColorModeChanged,
    /// Clustering availability may have changed.
    ClusteringAvailability,
    /// Tear down and recreate the base source and its layers.
    ClusteringRebuilt,
    /// Switch between the 2D and 3D marker layers.
    PitchChanged,
    /// Remove the timeline brush.
    BrushReset,
    /// Sync the town checkboxes.
    TownChecks,
    /// Sync the street checkboxes.
    StreetChecks,
    /// Replace the street dropdown options.
    StreetOptionsChanged,
}
