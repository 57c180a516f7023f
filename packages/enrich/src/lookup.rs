//! Street-level price lookup keyed by flat type and `"<block> <street>"`.

use std::collections::{BTreeMap, HashMap};

use resale_map_property_models::{AddressPrice, FlatType, Price};

/// Price snapshot tables, one per flat type.
#[derive(Debug, Clone, Default)]
pub struct PriceLookup {
    tables: BTreeMap<FlatType, HashMap<String, Price>>,
}

impl PriceLookup {
    /// Builds the lookup. When a key appears twice for the same flat type,
    /// the first row wins so rebuilding from the same rows is stable.
    pub fn new<I: IntoIterator<Item = AddressPrice>>(rows: I) -> Self {
        let mut tables: BTreeMap<FlatType, HashMap<String, Price>> = BTreeMap::new();
        for row in rows {
            tables
                .entry(row.flat_type)
                .or_default()
                .entry(row.block_street)
                .or_insert(row.price);
        }
        Self { tables }
    }

    /// Looks up the price for an exact key. Misses are unavailable.
    #[must_use]
    pub fn get(&self, flat_type: FlatType, block_street: &str) -> Price {
        self.tables
            .get(&flat_type)
            .and_then(|t| t.get(block_street))
            .copied()
            .unwrap_or(Price::Unavailable)
    }

    /// Number of keys for a flat type.
    #[must_use]
    pub fn len(&self, flat_type: FlatType) -> usize {
        self.tables.get(&flat_type).map_or(0, HashMap::len)
    }

    /// Whether no prices are loaded at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(HashMap::is_empty)
    }
}
