//! Encoding resolution for broker CSV exports.
//!
//! Exports arrive as Shift_JIS, its Windows superset CP932, EUC-JP or UTF-8,
//! with nothing in the file saying which. Candidates are tried in a fixed
//! priority order and the first one that decodes the *whole* buffer without
//! a replacement character wins. There is no lossy fallback.

use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_8};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// One of the candidate source encodings, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceEncoding {
    /// JIS X 0208 Shift_JIS without vendor extensions.
    ShiftJis,
    /// Windows code page 932 (Shift_JIS plus NEC/IBM extension rows).
    Cp932,
    EucJp,
    Utf8,
}

impl SourceEncoding {
    /// Priority order used by [`resolve`].
    pub const PRIORITY: [SourceEncoding; 4] = [
        SourceEncoding::ShiftJis,
        SourceEncoding::Cp932,
        SourceEncoding::EucJp,
        SourceEncoding::Utf8,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceEncoding::ShiftJis => "shift_jis",
            SourceEncoding::Cp932 => "cp932",
            SourceEncoding::EucJp => "euc_jp",
            SourceEncoding::Utf8 => "utf-8",
        }
    }

    fn codec(self) -> &'static Encoding {
        match self {
            // encoding_rs implements the WHATWG Shift_JIS, which is CP932.
            SourceEncoding::ShiftJis | SourceEncoding::Cp932 => SHIFT_JIS,
            SourceEncoding::EucJp => EUC_JP,
            SourceEncoding::Utf8 => UTF_8,
        }
    }

    /// Strict full-buffer decode. `None` means at least one byte sequence
    /// is invalid or unmapped under this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        if self == SourceEncoding::ShiftJis && uses_cp932_extensions(bytes) {
            return None;
        }
        let text = self
            .codec()
            .decode_without_bom_handling_and_without_replacement(bytes)?;
        match self {
            SourceEncoding::ShiftJis => Some(text.chars().map(jis_x0208_char).collect()),
            _ => Some(text.into_owned()),
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded text together with the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: SourceEncoding,
}

#[derive(Debug, Error)]
#[error("could not decode {len} bytes as any of shift_jis, cp932, euc_jp, utf-8")]
pub struct EncodingError {
    pub len: usize,
}

/// Decode `bytes` with the first candidate encoding that accepts all of it.
pub fn resolve(bytes: &[u8]) -> Result<Decoded, EncodingError> {
    for encoding in SourceEncoding::PRIORITY {
        if let Some(text) = encoding.decode(bytes) {
            debug!(encoding = encoding.name(), bytes = bytes.len(), "resolved source encoding");
            return Ok(Decoded { text, encoding });
        }
        debug!(encoding = encoding.name(), "candidate encoding rejected");
    }
    Err(EncodingError { len: bytes.len() })
}

/// Row-1 code points where plain Shift_JIS and CP932 disagree, as
/// (CP932 character, Shift_JIS character). Bytes 0x8160, 0x8161, 0x817C,
/// 0x8191, 0x8192, 0x81CA. 0x815F reads as U+FF3C under both.
const JIS_X0208_DIVERGENT: [(char, char); 6] = [
    ('\u{FF5E}', '\u{301C}'),
    ('\u{2225}', '\u{2016}'),
    ('\u{FF0D}', '\u{2212}'),
    ('\u{FFE0}', '\u{00A2}'),
    ('\u{FFE1}', '\u{00A3}'),
    ('\u{FFE2}', '\u{00AC}'),
];

/// Map a CP932-decoded character back to its JIS X 0208 reading. Only valid
/// for buffers that passed [`uses_cp932_extensions`], where each of these
/// characters has a single source byte pair.
fn jis_x0208_char(c: char) -> char {
    JIS_X0208_DIVERGENT
        .iter()
        .find(|(cp932, _)| *cp932 == c)
        .map_or(c, |(_, jis)| *jis)
}

/// True if the buffer contains a byte that plain Shift_JIS does not define
/// but CP932 does: the 0x80/0xA0 single bytes, the NEC special row (0x87),
/// the NEC-selected IBM rows (0xED, 0xEE), and the user-defined and IBM
/// extension rows (0xF0..=0xFC).
fn uses_cp932_extensions(bytes: &[u8]) -> bool {
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            0x80 | 0xA0 => return true,
            0x87 | 0xED | 0xEE | 0xF0..=0xFC => return true,
            0x81..=0x9F | 0xE0..=0xEF => i += 2,
            _ => i += 1,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_resolves_to_first_candidate() {
        let decoded = resolve(b"a,b,c\n1,2,3\n").unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::ShiftJis);
        assert_eq!(decoded.text, "a,b,c\n1,2,3\n");
    }

    #[test]
    fn shift_jis_header_decodes() {
        let (bytes, _, had_errors) = SHIFT_JIS.encode("銘柄名,約定日時");
        assert!(!had_errors);
        let decoded = resolve(&bytes).unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::ShiftJis);
        assert_eq!(decoded.text, "銘柄名,約定日時");
    }

    #[test]
    fn priority_wins_when_two_candidates_disagree() {
        // 0xA4 0xA2 is two half-width katakana in Shift_JIS and "あ" in EUC-JP.
        let bytes = [0xA4, 0xA2];
        assert_eq!(SourceEncoding::EucJp.decode(&bytes).as_deref(), Some("あ"));

        let decoded = resolve(&bytes).unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::ShiftJis);
        assert_eq!(decoded.text, "\u{FF64}\u{FF62}");
    }

    #[test]
    fn wave_dash_follows_jis_x0208_under_shift_jis() {
        let bytes = [0x81, 0x60];
        assert_eq!(SourceEncoding::Cp932.decode(&bytes).as_deref(), Some("\u{FF5E}"));

        let decoded = resolve(&bytes).unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::ShiftJis);
        assert_eq!(decoded.text, "\u{301C}");
    }

    #[test]
    fn divergent_row_one_characters() {
        let bytes = [
            0x81, 0x5F, 0x81, 0x61, 0x81, 0x7C, 0x81, 0x91, 0x81, 0x92, 0x81, 0xCA,
        ];
        assert_eq!(
            SourceEncoding::ShiftJis.decode(&bytes).as_deref(),
            Some("\u{FF3C}\u{2016}\u{2212}\u{00A2}\u{00A3}\u{00AC}")
        );
        assert_eq!(
            SourceEncoding::Cp932.decode(&bytes).as_deref(),
            Some("\u{FF3C}\u{2225}\u{FF0D}\u{FFE0}\u{FFE1}\u{FFE2}")
        );
    }

    #[test]
    fn nec_special_row_falls_through_to_cp932() {
        // 0x87 0x40 is the circled digit one, a CP932-only character.
        let bytes = [0x87, 0x40];
        assert!(SourceEncoding::ShiftJis.decode(&bytes).is_none());

        let decoded = resolve(&bytes).unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::Cp932);
        assert_eq!(decoded.text, "①");
    }

    #[test]
    fn euc_jp_only_buffer() {
        // "日" in EUC-JP ends on 0xFC, a dangling Shift_JIS lead byte.
        let bytes = [0xC6, 0xFC];
        let decoded = resolve(&bytes).unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::EucJp);
        assert_eq!(decoded.text, "日");
    }

    #[test]
    fn utf8_only_buffer() {
        // 0xC3 0x9F: kana + dangling lead in Shift_JIS, bad trail in EUC-JP.
        let decoded = resolve("aß".as_bytes()).unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::Utf8);
        assert_eq!(decoded.text, "aß");
    }

    #[test]
    fn error_late_in_buffer_is_not_missed() {
        // Valid prefix, invalid under everything at the very end.
        let mut bytes = b"header1,header2\n".repeat(64);
        bytes.push(0xFF);
        let err = resolve(&bytes).unwrap_err();
        assert_eq!(err.len, bytes.len());
    }

    #[test]
    fn undecodable_buffer_is_an_error() {
        let err = resolve(&[0x81, 0xFF]).unwrap_err();
        assert!(err.to_string().contains("2 bytes"));
    }
}
