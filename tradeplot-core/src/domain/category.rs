//! Trade category — the six-way entry/exit taxonomy plotted on the chart.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one broker trade event.
///
/// The text tag of each variant is what the Pine Script template receives,
/// so the tags are fixed: `Le`, `Se`, `Lg`, `Ll`, `Sg`, `Sl`, `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Long entry (new position, buy).
    Le,
    /// Short entry (new position, sell).
    Se,
    /// Long exit with gain (settlement sell, P&L >= 0).
    Lg,
    /// Long exit with loss (settlement sell, P&L < 0 or undefined).
    Ll,
    /// Short exit with gain (settlement buy, P&L >= 0).
    Sg,
    /// Short exit with loss (settlement buy, P&L < 0 or undefined).
    Sl,
    /// Any order-type/side combination outside the table.
    Unknown,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Le,
        Category::Se,
        Category::Lg,
        Category::Ll,
        Category::Sg,
        Category::Sl,
        Category::Unknown,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Category::Le => "Le",
            Category::Se => "Se",
            Category::Lg => "Lg",
            Category::Ll => "Ll",
            Category::Sg => "Sg",
            Category::Sl => "Sl",
            Category::Unknown => "Unknown",
        }
    }

    /// Human-readable meaning, used for the legend printed after a render.
    pub fn description(self) -> &'static str {
        match self {
            Category::Le => "long entry",
            Category::Se => "short entry",
            Category::Lg => "long exit, gain",
            Category::Ll => "long exit, loss",
            Category::Sg => "short exit, gain",
            Category::Sl => "short exit, loss",
            Category::Unknown => "unclassified",
        }
    }

    pub fn is_entry(self) -> bool {
        matches!(self, Category::Le | Category::Se)
    }

    pub fn is_exit(self) -> bool {
        matches!(
            self,
            Category::Lg | Category::Ll | Category::Sg | Category::Sl
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
