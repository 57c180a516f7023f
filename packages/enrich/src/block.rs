//! Block number extraction from geocoded addresses.
//!
//! Geocoded addresses look like `"123A BEDOK NORTH STREET 1 SINGAPORE 461123"`.
//! The resale price tables key prices by `"<block> <street>"`, so the block
//! is the first token that starts with a digit, keeping any letter suffix.

use regex::Regex;
use std::sync::LazyLock;

/// First whitespace-delimited token made of digits and an optional
/// trailing letter.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(\d+[A-Za-z]?)(?:\s|$)").unwrap_or_else(|_| unreachable!())
});

/// Extracts the block number from an address.
///
/// Returns `None` when the address has no numeric token.
#[must_use]
pub fn first_numeric_token(address: &str) -> Option<String> {
    BLOCK_RE
        .captures(address)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_uppercase())
}
