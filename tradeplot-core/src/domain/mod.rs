//! Domain types for tradeplot

pub mod category;
pub mod trade;

pub use category::Category;
pub use trade::{NormalizedTrade, Side, SIDE_BUY, SIDE_SELL};
