//! Caller-facing operations: decode, classify and select, render.
//!
//! The core holds no state between calls. Callers pass the full table and
//! the selection bounds every time and decide how to present errors.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::data::columns::ColumnResolutionError;
use crate::data::encoding::{self, EncodingError, SourceEncoding};
use crate::data::ingest::{IngestError, TradeTable};
use crate::data::normalize::{normalize_instrument, NumericParseWarning};
use crate::domain::{Category, NormalizedTrade};
use crate::range::{self, RangeError};
use crate::template::{self, TemplateError};

/// Errors from [`classify_and_select`].
#[derive(Debug, Error)]
pub enum SelectError {
    #[error(transparent)]
    Columns(#[from] ColumnResolutionError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Range(#[from] RangeError),
}

/// Errors from the file-level helpers.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
    #[error("selection error: {0}")]
    Select(#[from] SelectError),
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A decoded, parsed export plus provenance for the dump.
#[derive(Debug, Clone)]
pub struct LoadedExport {
    pub table: TradeTable,
    pub encoding: SourceEncoding,
    /// BLAKE3 hex digest of the raw export bytes.
    pub source_hash: String,
}

/// The selected window of one instrument's trades.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub instrument: String,
    /// Number of trades the instrument has in the export.
    pub total: usize,
    pub start: usize,
    pub end: usize,
    pub trades: Vec<NormalizedTrade>,
    /// Numeric parse warnings for the instrument's rows.
    pub warnings: Vec<NumericParseWarning>,
}

impl Selection {
    /// Number of selected trades per category, in [`Category::ALL`] order.
    pub fn category_counts(&self) -> Vec<(Category, usize)> {
        Category::ALL
            .into_iter()
            .map(|c| (c, self.trades.iter().filter(|t| t.category == c).count()))
            .collect()
    }
}

/// Decode raw export bytes to text.
pub fn resolve_encoding(bytes: &[u8]) -> Result<String, EncodingError> {
    encoding::resolve(bytes).map(|decoded| decoded.text)
}

/// Decode and parse raw export bytes.
pub fn load_table(bytes: &[u8]) -> Result<LoadedExport, PipelineError> {
    let decoded = encoding::resolve(bytes)?;
    let table = TradeTable::parse(&decoded.text)?;
    info!(
        encoding = decoded.encoding.name(),
        rows = table.len(),
        "loaded trade export"
    );
    Ok(LoadedExport {
        table,
        encoding: decoded.encoding,
        source_hash: blake3::hash(bytes).to_hex().to_string(),
    })
}

/// Read and load an export file.
pub fn load_table_file(path: &Path) -> Result<LoadedExport, PipelineError> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_table(&bytes)
}

/// Resolve columns, classify the instrument's trades in chronological order
/// and return the 1-based inclusive window `start..=end`.
pub fn classify_and_select(
    table: &TradeTable,
    instrument: &str,
    start: usize,
    end: usize,
) -> Result<Selection, SelectError> {
    let columns = table.resolve_columns()?;
    let normalized = normalize_instrument(table, &columns, instrument)?;
    let window = range::select(&normalized.trades, start, end)?;

    info!(
        instrument,
        total = normalized.trades.len(),
        start,
        end,
        "selected trades"
    );

    Ok(Selection {
        instrument: normalized.instrument,
        total: normalized.trades.len(),
        start,
        end,
        trades: window.to_vec(),
        warnings: normalized.warnings,
    })
}

/// Render the selected trades into `template`.
pub fn render(
    template: &str,
    trades: &[NormalizedTrade],
    instrument: &str,
) -> Result<String, TemplateError> {
    template::expand(template, trades, instrument)
}

/// Read the template at `path` and render the selected trades into it.
pub fn render_template_file(
    path: &Path,
    trades: &[NormalizedTrade],
    instrument: &str,
) -> Result<String, PipelineError> {
    let template = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(render(&template, trades, instrument)?)
}
