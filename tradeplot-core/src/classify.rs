//! Trade classification — order type, side and realized P&L to a [`Category`].
//!
//! Pure and stateless. Only three resolved fields are read.

use crate::data::columns::ResolvedColumnSet;
use crate::data::ingest::RawTradeRecord;
use crate::data::normalize::parse_number;
use crate::domain::{Category, Side};

/// Order-type literals that open a new position.
pub const ENTRY_ORDER_TYPES: &[&str] = &["CFD新規", "FXネオ新規"];

/// Order-type literals that close a position, voluntarily or by margin call.
pub const EXIT_ORDER_TYPES: &[&str] = &["CFD決済", "CFDロスカット", "FXネオ決済", "FXネオロスカット"];

/// Classify one raw export row.
pub fn classify(record: &RawTradeRecord, columns: &ResolvedColumnSet) -> Category {
    classify_fields(
        record.cell(&columns.order_type),
        &Side::parse(record.cell(&columns.side)),
        parse_number(record.cell(&columns.realized_pnl)),
    )
}

/// Classify from already-extracted fields.
///
/// An exit whose P&L is undefined takes the loss branch (`Ll` / `Sl`):
/// only a defined, non-negative P&L counts as a gain.
pub fn classify_fields(order_type: &str, side: &Side, realized_pnl: Option<f64>) -> Category {
    let order_type = order_type.trim();
    if ENTRY_ORDER_TYPES.contains(&order_type) {
        return match side {
            Side::Buy => Category::Le,
            Side::Sell => Category::Se,
            Side::Other(_) => Category::Unknown,
        };
    }
    if EXIT_ORDER_TYPES.contains(&order_type) {
        let gain = realized_pnl.is_some_and(|pnl| pnl >= 0.0);
        return match (side, gain) {
            // Closing sell unwinds a long.
            (Side::Sell, true) => Category::Lg,
            (Side::Sell, false) => Category::Ll,
            // Closing buy unwinds a short.
            (Side::Buy, true) => Category::Sg,
            (Side::Buy, false) => Category::Sl,
            (Side::Other(_), _) => Category::Unknown,
        };
    }
    Category::Unknown
}
