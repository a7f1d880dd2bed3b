//! Free-text order detection.
//!
//! A single heuristic: an optional leading quantity, then a phrase that is
//! matched against the first word of each catalog item name. Matching is a
//! plain substring test, so it can hit items the customer never meant
//! ("before" contains "efo"). That behaviour is kept as-is; tightening it
//! changes which messages are treated as orders.

use regex::Regex;

use foodbites_types::errors::BotError;
use foodbites_types::OrderLine;

use crate::catalog::Catalog;

/// Leading quantity, then everything else.
const ORDER_PATTERN: &str = r"(?s)^([0-9]+)?\s*(.*)$";

/// Parses inbound text into an [`OrderLine`] against a [`Catalog`].
#[derive(Debug, Clone)]
pub struct OrderMatcher {
    pattern: Regex,
}

impl OrderMatcher {
    /// Compile the order pattern.
    pub fn new() -> Result<Self, BotError> {
        let pattern = Regex::new(ORDER_PATTERN)
            .map_err(|e| BotError::Internal(format!("invalid order pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Try to read an order out of `text`.
    ///
    /// Returns `None` for empty input, a quantity that does not fit `u32`,
    /// no matching item, or a total that overflows.
    pub fn detect_order(&self, text: &str, catalog: &Catalog) -> Option<OrderLine> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        let captures = self.pattern.captures(&text)?;
        let quantity = match captures.get(1) {
            // "0 jollof" means one plate, same as no number at all.
            Some(digits) => match digits.as_str().parse::<u32>() {
                Ok(0) => 1,
                Ok(n) => n,
                Err(_) => {
                    tracing::debug!(quantity = digits.as_str(), "order quantity out of range");
                    return None;
                }
            },
            None => 1,
        };
        let phrase = captures.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

        for item in catalog.items() {
            let name = item.name.to_lowercase();
            let Some(token) = name.split_whitespace().next() else {
                continue;
            };
            if !phrase.contains(token) {
                continue;
            }

            let Some(unit_price) = parse_unit_price(&item.price) else {
                tracing::debug!(
                    item = %item.name,
                    price = %item.price,
                    "catalog price has no digits, skipping item"
                );
                continue;
            };

            let total_price = unit_price.checked_mul(u64::from(quantity))?;
            return Some(OrderLine {
                item_name: item.name.clone(),
                quantity,
                unit_price,
                total_price,
            });
        }

        None
    }
}

/// Read the unit price out of a display price string.
///
/// Takes the first `/`-separated segment and keeps only its digits:
/// `"₦2,500"` is 2500 and `"₦2,500 / ₦3,000"` is 2500.
pub fn parse_unit_price(price: &str) -> Option<u64> {
    let first = price.split('/').next()?;
    let digits: String = first.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
