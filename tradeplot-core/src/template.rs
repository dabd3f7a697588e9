//! Pine Script template expansion.
//!
//! The template is opaque Pine text with a handful of literal tokens:
//!
//! ```text
//! ... prefix, may mention <銘柄名F> ...
//! //trade1
//! ... block using trade1, <1A> <1B> <1C> <1D> <1E> ...
//! //trade1_fin
//! ... suffix ...
//! ```
//!
//! The block is copied once per trade. Copy `i` first has its sequence tag
//! and slot indices rewritten from `1` to `i`, then each `<iX>` slot is
//! replaced with that trade's value. Every copy starts from the unmodified
//! block. Substitution is plain literal replacement; the Pine is never parsed.

use crate::data::normalize::jst;
use crate::domain::NormalizedTrade;
use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Replaced everywhere with the instrument label.
pub const INSTRUMENT_PLACEHOLDER: &str = "<銘柄名F>";
/// Opens the repeated block.
pub const START_MARKER: &str = "//trade1";
/// Closes the repeated block (included in the block).
pub const END_MARKER: &str = "//trade1_fin";
/// Sequence tag as written in the template block.
pub const SEQUENCE_TAG: &str = "trade1";
/// Index every slot placeholder carries in the template.
pub const TEMPLATE_INDEX: usize = 1;

/// Pine's undefined value, written for numbers that did not parse.
pub const PINE_NA: &str = "na";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateErrorKind {
    MarkersNotFound,
    EmptyInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template is missing the '{marker}' marker")]
    MarkersNotFound { marker: &'static str },

    #[error("no trades to render")]
    EmptyInput,
}

impl TemplateError {
    pub fn kind(&self) -> TemplateErrorKind {
        match self {
            TemplateError::MarkersNotFound { .. } => TemplateErrorKind::MarkersNotFound,
            TemplateError::EmptyInput => TemplateErrorKind::EmptyInput,
        }
    }
}

/// A per-trade field slot, `<{index}{letter}>` in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// `A`: execution time as a Pine `timestamp(...)` call.
    Timestamp,
    /// `B`: category tag.
    Category,
    /// `C`: execution price.
    Price,
    /// `D`: quantity.
    Quantity,
    /// `E`: realized P&L.
    RealizedPnl,
}

impl Slot {
    pub const ALL: [Slot; 5] = [
        Slot::Timestamp,
        Slot::Category,
        Slot::Price,
        Slot::Quantity,
        Slot::RealizedPnl,
    ];

    pub fn letter(self) -> char {
        match self {
            Slot::Timestamp => 'A',
            Slot::Category => 'B',
            Slot::Price => 'C',
            Slot::Quantity => 'D',
            Slot::RealizedPnl => 'E',
        }
    }

    /// Placeholder text for this slot at `index`, e.g. `<12C>`.
    pub fn token(self, index: usize) -> String {
        format!("<{index}{}>", self.letter())
    }

    /// Rendered value of this slot for `trade`.
    pub fn value(self, trade: &NormalizedTrade) -> String {
        match self {
            Slot::Timestamp => pine_timestamp(&trade.timestamp),
            Slot::Category => trade.category.tag().to_string(),
            Slot::Price => format_number(trade.price),
            Slot::Quantity => format_number(trade.quantity),
            Slot::RealizedPnl => format_number(trade.realized_pnl),
        }
    }
}

/// `timestamp("GMT+9", Y, M, D, h, m, s)` from the JST wall-clock fields.
pub fn pine_timestamp(ts: &DateTime<FixedOffset>) -> String {
    let local = ts.with_timezone(&jst());
    format!(
        "timestamp(\"GMT+9\", {}, {}, {}, {}, {}, {})",
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        local.minute(),
        local.second()
    )
}

/// Shortest decimal text that round-trips, or `na` when undefined.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v == 0.0 => "0".to_string(),
        Some(v) => v.to_string(),
        None => PINE_NA.to_string(),
    }
}

/// Template text with the instrument substituted and the block located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    text: String,
    block_start: usize,
    block_end: usize,
}

impl TemplateDocument {
    /// Substitute the instrument label, then split around the block.
    pub fn parse(template: &str, instrument: &str) -> Result<Self, TemplateError> {
        let text = template.replace(INSTRUMENT_PLACEHOLDER, instrument);

        let block_start = text.find(START_MARKER).ok_or(TemplateError::MarkersNotFound {
            marker: START_MARKER,
        })?;
        let block_end = text[block_start..]
            .find(END_MARKER)
            .map(|offset| block_start + offset + END_MARKER.len())
            .ok_or(TemplateError::MarkersNotFound { marker: END_MARKER })?;

        Ok(Self {
            text,
            block_start,
            block_end,
        })
    }

    /// Text before the block. Never rewritten.
    pub fn prefix(&self) -> &str {
        &self.text[..self.block_start]
    }

    /// The block, start marker through end marker inclusive.
    pub fn block(&self) -> &str {
        &self.text[self.block_start..self.block_end]
    }

    /// Text after the block. Never rewritten.
    pub fn suffix(&self) -> &str {
        &self.text[self.block_end..]
    }

    /// Slots the block actually uses. Reduced templates carry only some.
    pub fn slots(&self) -> Vec<Slot> {
        let block = self.block();
        Slot::ALL
            .into_iter()
            .filter(|s| block.contains(&s.token(TEMPLATE_INDEX)))
            .collect()
    }

    /// Render one copy of the block bound to `trade` at 1-based `position`.
    pub fn render_block(&self, position: usize, trade: &NormalizedTrade) -> String {
        let mut block = self
            .block()
            .replace(SEQUENCE_TAG, &format!("trade{position}"));
        for slot in Slot::ALL {
            block = block.replace(&slot.token(TEMPLATE_INDEX), &slot.token(position));
        }
        for slot in Slot::ALL {
            block = block.replace(&slot.token(position), &slot.value(trade));
        }
        block
    }
}

/// Expand `template` with one block per trade, in order.
pub fn expand(
    template: &str,
    trades: &[NormalizedTrade],
    instrument: &str,
) -> Result<String, TemplateError> {
    if trades.is_empty() {
        return Err(TemplateError::EmptyInput);
    }

    let doc = TemplateDocument::parse(template, instrument)?;
    let blocks: Vec<String> = trades
        .iter()
        .enumerate()
        .map(|(i, trade)| doc.render_block(i + 1, trade))
        .collect();

    debug!(
        instrument,
        blocks = blocks.len(),
        slots = doc.slots().len(),
        "expanded template"
    );

    let body = blocks.join("\n");
    let mut out = String::with_capacity(doc.prefix().len() + body.len() + doc.suffix().len());
    out.push_str(doc.prefix());
    out.push_str(&body);
    out.push_str(doc.suffix());
    Ok(out)
}

/// Slot tokens of the form `<{digits}{A-E}>` left in `text`.
pub fn unresolved_slots(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let digits = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let letter = i + 1 + digits;
            if digits > 0
                && letter + 1 < bytes.len()
                && (b'A'..=b'E').contains(&bytes[letter])
                && bytes[letter + 1] == b'>'
            {
                found.push(&text[i..letter + 2]);
                i = letter + 2;
                continue;
            }
        }
        i += 1;
    }
    found
}
