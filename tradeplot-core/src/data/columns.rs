//! Column resolution — map logical trade fields to the export's header names.
//!
//! Broker headers drift between export versions and sometimes come through
//! with extra decoration (`実現損益（円貨）`, `約定単価(円)`), so each role is
//! located by a fixed substring marker. Resolution runs once per table and
//! every later row access goes through the resulting indices.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Exact header of the instrument column. Matched literally, not by substring.
pub const INSTRUMENT_COLUMN: &str = "銘柄名";

/// A logical field that must be present in every export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Timestamp,
    OrderType,
    Side,
    Price,
    Quantity,
    RealizedPnl,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 6] = [
        ColumnRole::Timestamp,
        ColumnRole::OrderType,
        ColumnRole::Side,
        ColumnRole::Price,
        ColumnRole::Quantity,
        ColumnRole::RealizedPnl,
    ];

    /// Substring that identifies this role's header.
    pub fn marker(self) -> &'static str {
        match self {
            ColumnRole::Timestamp => "約定日時",
            ColumnRole::OrderType => "取引区分",
            ColumnRole::Side => "売買区分",
            ColumnRole::Price => "約定単価",
            ColumnRole::Quantity => "約定数量",
            ColumnRole::RealizedPnl => "実現損益",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::Timestamp => "settlement timestamp",
            ColumnRole::OrderType => "order type",
            ColumnRole::Side => "side",
            ColumnRole::Price => "price",
            ColumnRole::Quantity => "quantity",
            ColumnRole::RealizedPnl => "realized P&L",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no column for {role} (expected a header containing '{marker}')", marker = .role.marker())]
pub struct ColumnResolutionError {
    pub role: ColumnRole,
}

/// A header name and its position in the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    pub name: String,
    pub index: usize,
}

/// The concrete column for every role, fixed at table-load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumnSet {
    pub timestamp: ResolvedColumn,
    pub order_type: ResolvedColumn,
    pub side: ResolvedColumn,
    pub price: ResolvedColumn,
    pub quantity: ResolvedColumn,
    pub realized_pnl: ResolvedColumn,
}

impl ResolvedColumnSet {
    pub fn get(&self, role: ColumnRole) -> &ResolvedColumn {
        match role {
            ColumnRole::Timestamp => &self.timestamp,
            ColumnRole::OrderType => &self.order_type,
            ColumnRole::Side => &self.side,
            ColumnRole::Price => &self.price,
            ColumnRole::Quantity => &self.quantity,
            ColumnRole::RealizedPnl => &self.realized_pnl,
        }
    }
}

/// Resolve every role against `headers`.
///
/// The first header (in column order) containing a role's marker wins, even
/// when later headers also match. A role with no match is an error.
pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<ResolvedColumnSet, ColumnResolutionError> {
    let find = |role: ColumnRole| -> Result<ResolvedColumn, ColumnResolutionError> {
        let marker = role.marker();
        headers
            .iter()
            .position(|h| h.as_ref().contains(marker))
            .map(|index| {
                let name = headers[index].as_ref().to_string();
                debug!(role = role.label(), column = %name, index, "resolved column");
                ResolvedColumn { name, index }
            })
            .ok_or(ColumnResolutionError { role })
    };

    Ok(ResolvedColumnSet {
        timestamp: find(ColumnRole::Timestamp)?,
        order_type: find(ColumnRole::OrderType)?,
        side: find(ColumnRole::Side)?,
        price: find(ColumnRole::Price)?,
        quantity: find(ColumnRole::Quantity)?,
        realized_pnl: find(ColumnRole::RealizedPnl)?,
    })
}

/// Index of the exact instrument column, if present.
pub fn instrument_index<S: AsRef<str>>(headers: &[S]) -> Option<usize> {
    headers.iter().position(|h| h.as_ref() == INSTRUMENT_COLUMN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gmo_headers() -> Vec<&'static str> {
        vec![
            "約定日時",
            "銘柄名",
            "取引区分",
            "売買区分",
            "約定数量",
            "約定単価",
            "手数料",
            "実現損益（円貨）",
        ]
    }

    #[test]
    fn resolves_all_roles_by_substring() {
        let cols = resolve(&gmo_headers()).unwrap();
        assert_eq!(cols.timestamp.index, 0);
        assert_eq!(cols.order_type.name, "取引区分");
        assert_eq!(cols.side.index, 3);
        assert_eq!(cols.quantity.index, 4);
        assert_eq!(cols.price.index, 5);
        assert_eq!(cols.realized_pnl.name, "実現損益（円貨）");
        assert_eq!(cols.realized_pnl.index, 7);
    }

    #[test]
    fn decorated_headers_still_match() {
        let headers = [
            "\u{feff}約定日時(JST)",
            "取引区分 ",
            "[売買区分]",
            "約定単価(円)",
            "約定数量(枚)",
            "実現損益(円)",
        ];
        let cols = resolve(&headers).unwrap();
        assert_eq!(cols.timestamp.name, "\u{feff}約定日時(JST)");
        assert_eq!(cols.price.index, 3);
    }

    #[test]
    fn first_match_wins_on_ambiguity() {
        let headers = [
            "約定日時",
            "取引区分",
            "売買区分",
            "約定単価",
            "約定数量",
            "実現損益（円貨）",
            "実現損益（外貨）",
        ];
        let cols = resolve(&headers).unwrap();
        assert_eq!(cols.realized_pnl.index, 5);
        assert_eq!(cols.realized_pnl.name, "実現損益（円貨）");
    }

    #[test]
    fn missing_role_is_named() {
        let headers: Vec<&str> = gmo_headers()
            .into_iter()
            .filter(|h| !h.contains("約定数量"))
            .collect();
        let err = resolve(&headers).unwrap_err();
        assert_eq!(err.role, ColumnRole::Quantity);
        assert!(err.to_string().contains("quantity"));
        assert!(err.to_string().contains("約定数量"));
    }

    #[test]
    fn each_role_reported_when_alone_missing() {
        for role in ColumnRole::ALL {
            let headers: Vec<&str> = gmo_headers()
                .into_iter()
                .filter(|h| !h.contains(role.marker()))
                .collect();
            assert_eq!(resolve(&headers).unwrap_err().role, role);
        }
    }

    #[test]
    fn instrument_column_is_exact() {
        assert_eq!(instrument_index(&gmo_headers()), Some(1));
        assert_eq!(instrument_index(&["銘柄名コード", "約定日時"]), None);
    }

    #[test]
    fn get_by_role_matches_fields() {
        let cols = resolve(&gmo_headers()).unwrap();
        for role in ColumnRole::ALL {
            assert!(cols.get(role).name.contains(role.marker()));
        }
    }
}
