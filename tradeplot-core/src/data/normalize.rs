//! Normalization — raw rows of one instrument to classified, ordered trades.

use crate::classify::classify;
use crate::data::columns::{ResolvedColumn, ResolvedColumnSet};
use crate::data::ingest::{IngestError, RawTradeRecord, TradeTable};
use crate::domain::{NormalizedTrade, Side};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Offset of the broker's wall clock (JST, no DST).
pub const JST_OFFSET_SECS: i32 = 9 * 3600;

const DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d"];

pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("JST offset is in range")
}

/// Parse a broker timestamp as JST wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    jst().from_local_datetime(&naive).single()
}

/// Parse a numeric cell. Thousands separators and a leading `+` are accepted;
/// empty, non-numeric and non-finite cells are `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A non-empty numeric cell that did not parse. The value becomes undefined
/// and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumericParseWarning {
    pub line: u64,
    pub column: String,
    pub value: String,
}

impl fmt::Display for NumericParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: '{}' in column '{}' is not a number, treated as undefined",
            self.line, self.value, self.column
        )
    }
}

/// Every trade of one instrument, classified and in chronological order.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub instrument: String,
    pub trades: Vec<NormalizedTrade>,
    pub warnings: Vec<NumericParseWarning>,
}

/// Filter `table` to `instrument`, order it by execution time and classify
/// each row. Rows with equal timestamps keep their file order.
pub fn normalize_instrument(
    table: &TradeTable,
    columns: &ResolvedColumnSet,
    instrument: &str,
) -> Result<NormalizedTable, IngestError> {
    let mut warnings = Vec::new();
    let mut dated: Vec<(DateTime<FixedOffset>, &RawTradeRecord)> = Vec::new();

    for record in table.records_for(instrument) {
        let raw_ts = record.cell(&columns.timestamp);
        let ts = parse_timestamp(raw_ts).ok_or_else(|| IngestError::InvalidTimestamp {
            line: record.line(),
            value: raw_ts.to_string(),
        })?;
        dated.push((ts, record));
    }

    if dated.is_empty() {
        return Err(IngestError::InstrumentNotFound {
            instrument: instrument.to_string(),
        });
    }

    dated.sort_by_key(|(ts, _)| *ts);

    let trades = dated
        .into_iter()
        .enumerate()
        .map(|(i, (timestamp, record))| NormalizedTrade {
            sequence_index: i + 1,
            timestamp,
            order_type: record.cell(&columns.order_type).to_string(),
            side: Side::parse(record.cell(&columns.side)),
            price: numeric_cell(record, &columns.price, &mut warnings),
            quantity: numeric_cell(record, &columns.quantity, &mut warnings),
            realized_pnl: numeric_cell(record, &columns.realized_pnl, &mut warnings),
            category: classify(record, columns),
        })
        .collect::<Vec<_>>();

    debug!(
        instrument,
        trades = trades.len(),
        warnings = warnings.len(),
        "normalized instrument trades"
    );

    Ok(NormalizedTable {
        instrument: instrument.to_string(),
        trades,
        warnings,
    })
}

fn numeric_cell(
    record: &RawTradeRecord,
    column: &ResolvedColumn,
    warnings: &mut Vec<NumericParseWarning>,
) -> Option<f64> {
    let raw = record.cell(column);
    let value = parse_number(raw);
    if value.is_none() && !raw.trim().is_empty() {
        let warning = NumericParseWarning {
            line: record.line(),
            column: column.name.clone(),
            value: raw.to_string(),
        };
        warn!("{warning}");
        warnings.push(warning);
    }
    value
}
