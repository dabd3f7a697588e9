//! tradeplot core — broker trade history to Pine Script chart overlays.
//!
//! This crate contains the whole transformation, free of I/O policy:
//! - Encoding resolution over Shift_JIS / CP932 / EUC-JP / UTF-8 exports
//! - CSV parsing and substring-based column resolution
//! - Trade classification into the Le/Se/Lg/Ll/Sg/Sl taxonomy
//! - 1-based trade window selection, capped at 200 trades
//! - Literal-substitution expansion of the Pine template block
//! - JSON/CSV dumps of the selection and the TOML render profile

pub mod classify;
pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod pipeline;
pub mod range;
pub mod template;

pub use classify::{classify, classify_fields};
pub use config::{ConfigError, RenderProfile};
pub use data::{
    ColumnResolutionError, ColumnRole, EncodingError, IngestError, NumericParseWarning,
    RawTradeRecord, ResolvedColumnSet, SourceEncoding, TradeTable,
};
pub use domain::{Category, NormalizedTrade, Side};
pub use pipeline::{
    classify_and_select, load_table, load_table_file, render, render_template_file,
    resolve_encoding, LoadedExport, PipelineError, SelectError, Selection,
};
pub use range::{RangeError, RangeErrorKind, MAX_WINDOW};
pub use template::{expand, TemplateDocument, TemplateError, TemplateErrorKind};
