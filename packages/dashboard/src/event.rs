//! User interactions fed into the dashboard.

use chrono::NaiveDate;
use resale_map_property_models::{ColorMode, FlatType};
use serde::{Deserialize, Serialize};

/// One user interaction.
///
/// Serialized with an `event` tag so scripted sessions can be written as
/// TOML or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// A town checkbox (or `"All Towns"`) was toggled.
    TownToggled {
        /// Town name as listed in the dropdown.
        town: String,
    },
    /// A street checkbox was toggled.
    StreetToggled {
        /// Street name.
        street: String,
    },
    /// The flat type dropdown changed.
    FlatTypeChanged {
        /// New flat type.
        flat_type: FlatType,
    },
    /// The color mode dropdown changed.
    ColorModeChanged {
        /// New color mode.
        color_mode: ColorMode,
    },
    /// The timeline brush selected a date range.
    BrushMoved {
        /// One end of the range.
        start: NaiveDate,
        /// The other end.
        end: NaiveDate,
    },
    /// The timeline brush selected a pixel range.
    BrushPixels {
        /// One edge, in plot pixels.
        x0: f64,
        /// The other edge.
        x1: f64,
    },
    /// The timeline brush was cleared.
    BrushCleared,
    /// A trend chart point was clicked.
    TrendPointClicked {
        /// Town or street of the point.
        group: String,
    },
    /// The pointer entered a trend chart point.
    TrendPointHovered {
        /// Town or street of the point.
        group: String,
        /// Date of the point.
        date: NaiveDate,
    },
    /// The pointer left a trend chart point.
    TrendPointLeft,
    /// A map marker was clicked.
    MapMarkerClicked {
        /// Street of the marker.
        street: String,
    },
    /// The map was tilted.
    PitchChanged {
        /// New pitch in degrees.
        pitch: f64,
    },
    /// The clustering control was toggled.
    ClusteringToggled {
        /// Requested state.
        enabled: bool,
    },
}

/// A recorded session: an `[[events]]` array of tables in TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventScript {
    /// Events in dispatch order.
    #[serde(default)]
    pub events: Vec<UiEvent>,
}

impl EventScript {
    /// Parses a TOML script.
    ///
    /// # Errors
    ///
    /// * If the text is not valid TOML or an event is malformed
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(text)
    }
}
