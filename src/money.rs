use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Convert a textual amount into a `Decimal`.
///
/// Every amount that enters the ledger as text goes through here: CSV cells
/// on import and the `value` column read back from SQLite. Accepts a leading
/// `$`, thousands separators and surrounding double quotes.
pub(crate) fn parse_value(s: &str) -> Result<Decimal> {
    let cleaned = s.trim().trim_matches('"').replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        anyhow::bail!("Empty amount");
    }
    Decimal::from_str(cleaned).with_context(|| format!("Failed to parse '{s}' as decimal"))
}
