#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive resale price dashboard core.
//!
//! One [`selection::SelectionState`] drives four coordinated views: the
//! property map, the price trend chart, the completion timeline, and the
//! filter controls. Every user event goes through
//! [`transition::transition`], which mutates the state and returns the
//! ordered [`effect::SyncEffect`]s the views apply. Street-level price
//! history is fetched on demand and applied only while its town set still
//! matches the selection.
//!
//! The views talk to rendering collaborators through the
//! [`views::MapRenderer`], [`views::TrendRenderer`],
//! [`views::TimelineRenderer`], and [`views::ControlsRenderer`] traits.

pub mod config;
pub mod dashboard;
pub mod data;
pub mod effect;
pub mod event;
pub mod fetch;
pub mod selection;
pub mod session;
pub mod transition;
pub mod views;

#[cfg(test)]
mod test_support;

use resale_map_api::ApiError;
use thiserror::Error;

pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{Dashboard, DashboardState};
pub use effect::{HighlightKind, SyncEffect};
pub use event::UiEvent;
pub use fetch::StreetPriceRequest;
pub use session::{SessionStats, run_session};

/// Errors that stop the dashboard from starting.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The initial load failed.
    #[error("Initial load failed: {0}")]
    Api(#[from] ApiError),

    /// Configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
