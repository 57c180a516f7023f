//! Event loop that feeds user events to the dashboard and executes the
//! street-price requests transitions issue.

use std::sync::Arc;

use futures::StreamExt as _;
use futures::stream::FuturesUnordered;
use resale_map_api::{ApiError, PriceApi};
use resale_map_property_models::AggregatePricePoint;
use tokio::sync::mpsc;

use crate::dashboard::Dashboard;
use crate::event::UiEvent;
use crate::fetch::StreetPriceRequest;

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Events dispatched.
    pub events: usize,
    /// Street-price requests issued.
    pub requests: usize,
    /// Responses applied.
    pub applied: usize,
    /// Responses dropped as stale.
    pub discarded: usize,
}

type StreetPriceResult = (StreetPriceRequest, Result<Vec<AggregatePricePoint>, ApiError>);

async fn fetch_street_prices(
    api: Arc<dyn PriceApi>,
    request: StreetPriceRequest,
) -> StreetPriceResult {
    let query = request.query();
    log::debug!(
        "Fetching street prices #{} for {:?}",
        request.generation,
        request.towns
    );
    let result = api.street_prices(&query).await;
    (request, result)
}

fn settle(dashboard: &mut Dashboard, stats: &mut SessionStats, response: StreetPriceResult) {
    let (request, result) = response;
    if dashboard.apply_street_prices(&request, result) {
        stats.applied += 1;
    } else {
        stats.discarded += 1;
    }
}

/// Runs until `events` closes and every in-flight request has settled.
///
/// Requests run concurrently with event handling; a response is applied
/// only if its town set still matches the selection when it arrives.
pub async fn run_session(
    dashboard: &mut Dashboard,
    api: Arc<dyn PriceApi>,
    mut events: mpsc::Receiver<UiEvent>,
) -> SessionStats {
    if !dashboard.is_started() {
        dashboard.start();
    }

    let mut stats = SessionStats::default();
    let mut in_flight = FuturesUnordered::new();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                stats.events += 1;
                if let Some(request) = dashboard.dispatch(event) {
                    stats.requests += 1;
                    in_flight.push(fetch_street_prices(Arc::clone(&api), request));
                }
            }
            Some(response) = in_flight.next(), if !in_flight.is_empty() => {
                settle(dashboard, &mut stats, response);
            }
        }
    }

    log::debug!("Event channel closed; draining {} requests", in_flight.len());
    while let Some(response) = in_flight.next().await {
        settle(dashboard, &mut stats, response);
    }

    log::info!("Session finished: {stats:?}");
    stats
}
