//! Street-level price fetches issued on town selection.
//!
//! Each request is tagged with the town set it was issued for. A response
//! is applied only if that set still equals the current selection when it
//! arrives; anything else is stale and dropped.

use chrono::NaiveDate;
use resale_map_api_models::StreetPriceQuery;
use resale_map_property_models::YearMonth;

use crate::selection::{OrderedSet, SelectionState};

/// A street-price request the caller must execute and hand back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetPriceRequest {
    /// Monotonic issue counter.
    pub generation: u64,
    /// Selected towns at issue time.
    pub towns: Vec<String>,
    /// First month of the history window.
    pub start: YearMonth,
    /// Last month of the history window.
    pub end: YearMonth,
}

impl StreetPriceRequest {
    /// Backend query for this request.
    #[must_use]
    pub fn query(&self) -> StreetPriceQuery {
        StreetPriceQuery {
            towns: self.towns.clone(),
            start: self.start,
            end: self.end,
        }
    }

    fn matches(&self, towns: &OrderedSet) -> bool {
        let mut mine = self.towns.clone();
        mine.sort();
        mine == towns.sorted()
    }
}

/// Issues street-price requests and decides whether responses still apply.
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    history_years: i32,
    next_generation: u64,
    pending: Option<StreetPriceRequest>,
}

impl FetchOrchestrator {
    /// An orchestrator fetching `history_years` of trailing history.
    #[must_use]
    pub const fn new(history_years: i32) -> Self {
        Self {
            history_years,
            next_generation: 1,
            pending: None,
        }
    }

    /// The most recently issued request that has not been resolved.
    #[must_use]
    pub const fn pending(&self) -> Option<&StreetPriceRequest> {
        self.pending.as_ref()
    }

    /// Issues a request for `towns`, superseding any pending one.
    pub fn issue(&mut self, towns: &OrderedSet, today: NaiveDate) -> StreetPriceRequest {
        let end = YearMonth::of(today);
        let request = StreetPriceRequest {
            generation: self.next_generation,
            towns: towns.as_slice().to_vec(),
            start: end.years_back(self.history_years),
            end,
        };
        self.next_generation += 1;

        if let Some(previous) = self.pending.replace(request.clone()) {
            log::debug!(
                "Street price request #{} superseded by #{}",
                previous.generation,
                request.generation
            );
        }
        log::info!(
            "Fetching street prices #{} for {:?} from {} to {}",
            request.generation,
            request.towns,
            request.start,
            request.end
        );
        request
    }

    /// Forgets the pending request; its response will be stale.
    pub fn cancel(&mut self) {
        if let Some(previous) = self.pending.take() {
            log::debug!("Street price request #{} cancelled", previous.generation);
        }
    }

    /// Whether a response for `request` may be applied to `selection`.
    ///
    /// Resolves the pending slot when `request` is the pending one.
    pub fn accept(&mut self, request: &StreetPriceRequest, selection: &SelectionState) -> bool {
        let fresh = selection.has_town_filter() && request.matches(selection.towns());

        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == request.generation)
        {
            self.pending = None;
        }

        if !fresh {
            log::warn!(
                "Discarding stale street prices #{} for {:?}; selection is {:?}",
                request.generation,
                request.towns,
                selection.towns().as_slice()
            );
        }
        fresh
    }
}
