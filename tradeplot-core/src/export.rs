//! Selection export (JSON dump / CSV tape) for debugging and interop.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::encoding::SourceEncoding;
use crate::domain::NormalizedTrade;
use crate::pipeline::{LoadedExport, Selection};
use crate::template::{format_number, pine_timestamp};

/// Current schema version of the JSON dump.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One trade as written to the dump, with its Pine rendering alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpedTrade {
    #[serde(flatten)]
    pub trade: NormalizedTrade,
    pub pine_timestamp: String,
}

/// The full dump document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDump {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub instrument: String,
    pub source_encoding: SourceEncoding,
    pub source_hash: String,
    pub total_trades: usize,
    pub start: usize,
    pub end: usize,
    pub trades: Vec<DumpedTrade>,
}

impl TradeDump {
    pub fn new(export: &LoadedExport, selection: &Selection) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            instrument: selection.instrument.clone(),
            source_encoding: export.encoding,
            source_hash: export.source_hash.clone(),
            total_trades: selection.total,
            start: selection.start,
            end: selection.end,
            trades: selection
                .trades
                .iter()
                .map(|t| DumpedTrade {
                    pine_timestamp: pine_timestamp(&t.timestamp),
                    trade: t.clone(),
                })
                .collect(),
        }
    }

}

pub fn write_trades_json(path: &Path, dump: &TradeDump) -> Result<()> {
    let json = serde_json::to_string_pretty(dump).context("Failed to serialize trade dump")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write trade dump {}", path.display()))?;
    Ok(())
}

pub fn read_trades_json(path: &Path) -> Result<TradeDump> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trade dump {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse trade dump {}", path.display()))
}

pub fn write_trades_csv(path: &Path, trades: &[NormalizedTrade]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create trades CSV {}", path.display()))?;

    writer.write_record([
        "sequence_index",
        "timestamp",
        "order_type",
        "side",
        "price",
        "quantity",
        "realized_pnl",
        "category",
    ])?;

    for trade in trades {
        writer.write_record([
            trade.sequence_index.to_string(),
            trade.timestamp.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
            trade.order_type.clone(),
            trade.side.to_string(),
            format_number(trade.price),
            format_number(trade.quantity),
            format_number(trade.realized_pnl),
            trade.category.tag().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::pipeline::{classify_and_select, load_table};

    const CSV: &str = "約定日時,銘柄名,取引区分,売買区分,約定数量,約定単価,実現損益
2024/03/01 09:00:00,NQ,CFD新規,買,1,18000,
2024/03/01 11:00:00,NQ,CFD決済,売,1,18100,1500
";

    fn dump() -> TradeDump {
        let export = load_table(CSV.as_bytes()).unwrap();
        let selection = classify_and_select(&export.table, "NQ", 1, 2).unwrap();
        TradeDump::new(&export, &selection)
    }

    #[test]
    fn dump_carries_provenance() {
        let d = dump();
        assert_eq!(d.schema_version, SCHEMA_VERSION);
        assert_eq!(d.source_encoding, SourceEncoding::Utf8);
        assert_eq!(d.total_trades, 2);
        assert_eq!(
            d.trades[0].pine_timestamp,
            "timestamp(\"GMT+9\", 2024, 3, 1, 9, 0, 0)"
        );
        assert_eq!(d.trades[1].trade.category, Category::Lg);
    }

    #[test]
    fn json_dump_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_trades.json");
        let d = dump();
        write_trades_json(&path, &d).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"source_encoding\": \"utf8\""));
        assert!(text.contains("\"category\": \"Lg\""));

        assert_eq!(read_trades_json(&path).unwrap(), d);
    }

    #[test]
    fn csv_tape_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let d = dump();
        let trades: Vec<NormalizedTrade> = d.trades.iter().map(|t| t.trade.clone()).collect();
        write_trades_csv(&path, &trades).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("sequence_index,timestamp"));
        assert_eq!(
            lines[2],
            "2,2024-03-01 11:00:00+09:00,CFD決済,売,18100,1,1500,Lg"
        );
    }
}
