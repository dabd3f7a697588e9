//! Trade window selection — a 1-based inclusive slice, capped in size.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of trades rendered in one script.
pub const MAX_WINDOW: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeErrorKind {
    OutOfBounds,
    WindowTooLarge,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("trade range {start}..={end} is outside 1..={len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("trade range {start}..={end} selects {size} trades; at most {max} per script", max = MAX_WINDOW)]
    WindowTooLarge { start: usize, end: usize, size: usize },
}

impl RangeError {
    pub fn kind(&self) -> RangeErrorKind {
        match self {
            RangeError::OutOfBounds { .. } => RangeErrorKind::OutOfBounds,
            RangeError::WindowTooLarge { .. } => RangeErrorKind::WindowTooLarge,
        }
    }
}

/// Select trades `start..=end` (1-based) from `trades`.
///
/// Requires `1 <= start <= end <= trades.len()` and at most [`MAX_WINDOW`]
/// trades. Bounds are checked first. Nothing is clamped.
pub fn select<T>(trades: &[T], start: usize, end: usize) -> Result<&[T], RangeError> {
    let len = trades.len();
    if start == 0 || start > end || end > len {
        return Err(RangeError::OutOfBounds { start, end, len });
    }
    let size = end - start + 1;
    if size > MAX_WINDOW {
        return Err(RangeError::WindowTooLarge { start, end, size });
    }
    Ok(&trades[start - 1..end])
}

/// Default window end for a given start: as far as the cap allows.
pub fn default_end(start: usize, total: usize) -> usize {
    start.saturating_add(MAX_WINDOW - 1).min(total)
}
