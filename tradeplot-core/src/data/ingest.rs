//! CSV ingestion — decoded export text to an in-memory trade table.

use crate::data::columns::{self, ColumnResolutionError, ResolvedColumn, ResolvedColumnSet};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while turning export text into normalized trades.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no '{}' column", columns::INSTRUMENT_COLUMN)]
    MissingInstrumentColumn,

    #[error("line {line}: {found} fields, header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Columns(#[from] ColumnResolutionError),

    #[error("no trades for instrument '{instrument}'")]
    InstrumentNotFound { instrument: String },

    #[error("line {line}: cannot parse timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },
}

/// One data row of the export. Cells are addressed by column index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTradeRecord {
    line: u64,
    cells: Vec<String>,
}

impl RawTradeRecord {
    pub fn new(line: u64, cells: Vec<String>) -> Self {
        Self { line, cells }
    }

    /// Line number of this row in the source file (header is line 1).
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    /// Cell for a resolved column. A short row reads as an empty cell.
    pub fn cell(&self, column: &ResolvedColumn) -> &str {
        self.get(column.index).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// Distinct instrument with the number of rows it has in the export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentSummary {
    pub name: String,
    pub trades: usize,
}

/// A parsed export: header row plus data rows, in file order.
#[derive(Debug, Clone)]
pub struct TradeTable {
    headers: Vec<String>,
    records: Vec<RawTradeRecord>,
    instrument_index: usize,
}

impl TradeTable {
    /// Parse decoded export text. A leading byte-order mark is ignored.
    pub fn parse(text: &str) -> Result<Self, IngestError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let instrument_index =
            columns::instrument_index(&headers).ok_or(IngestError::MissingInstrumentColumn)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            if row.len() > headers.len() {
                return Err(IngestError::RaggedRow {
                    line,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
            records.push(RawTradeRecord::new(
                line,
                row.iter().map(str::to_string).collect(),
            ));
        }

        Ok(Self {
            headers,
            records,
            instrument_index,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[RawTradeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve the role columns for this table's header row.
    pub fn resolve_columns(&self) -> Result<ResolvedColumnSet, ColumnResolutionError> {
        columns::resolve(&self.headers)
    }

    pub fn instrument_of<'a>(&self, record: &'a RawTradeRecord) -> &'a str {
        record.get(self.instrument_index).unwrap_or("")
    }

    /// Rows whose instrument cell equals `instrument` exactly, in file order.
    pub fn records_for<'a>(
        &'a self,
        instrument: &'a str,
    ) -> impl Iterator<Item = &'a RawTradeRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| self.instrument_of(r) == instrument)
    }

    /// Distinct instruments in order of first appearance.
    pub fn instruments(&self) -> Vec<InstrumentSummary> {
        let mut out: Vec<InstrumentSummary> = Vec::new();
        for record in &self.records {
            let name = self.instrument_of(record);
            match out.iter_mut().find(|s| s.name == name) {
                Some(summary) => summary.trades += 1,
                None => out.push(InstrumentSummary {
                    name: name.to_string(),
                    trades: 1,
                }),
            }
        }
        out
    }
}
