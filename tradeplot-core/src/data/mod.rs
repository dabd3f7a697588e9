//! Data ingestion: encoding resolution, CSV parsing, column resolution, normalization

pub mod columns;
pub mod encoding;
pub mod ingest;
pub mod normalize;

pub use columns::{
    ColumnResolutionError, ColumnRole, ResolvedColumn, ResolvedColumnSet, INSTRUMENT_COLUMN,
};
pub use encoding::{Decoded, EncodingError, SourceEncoding};
pub use ingest::{IngestError, InstrumentSummary, RawTradeRecord, TradeTable};
pub use normalize::{normalize_instrument, NormalizedTable, NumericParseWarning};
