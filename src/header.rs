//! # Header Scanner
//!
//! Reads the information fields at the top of a score and finds where the
//! melody body begins.
//!
//! ## Recognised fields
//! - `L:` unit length, `num[/den]` (default 1)
//! - `Q:` tempo, `[beat-unit=]bpm` with beat-unit defaulting to 1/4
//! - `K:` key, `[A-G](#|b)?m?`, checked against the supported key tables
//! - `X:` and `T N P I Z A O R B D H F S G M C` fields, consumed without effect
//!   (`T:` and `C:` are kept as metadata)
//!
//! Blank lines are skipped. Any other `<letter>:` line, or a recognised field
//! with a value that does not parse, is skipped with a warning. The first line
//! that is not header-shaped starts the body.
//!
//! ## Example
//! ```rust
//! use abcseq::scan_header;
//! use abcseq::Rational;
//!
//! let header = scan_header("X:1\nT:Scale\nL:1/8\nQ:1/4=120\nK:G\nGABc|\n")?;
//! assert_eq!(header.unit_length, Rational::new(1, 8));
//! assert_eq!(header.tempo_multiplier, Rational::new(2, 1));
//! assert_eq!(header.key.name(), "G");
//! assert_eq!(header.body(), "GABc|\n");
//! # Ok::<(), abcseq::AbcError>(())
//! ```

use crate::error::{AbcError, Result};
use crate::key::KeyTable;
use crate::Rational;
use log::{debug, warn};
use num_traits::{CheckedDiv, CheckedMul};

/// Field letters that are accepted and ignored
const IGNORED_FIELDS: &[char] = &[
    'X', 'T', 'N', 'P', 'I', 'Z', 'A', 'O', 'R', 'B', 'D', 'H', 'F', 'S', 'G', 'M', 'C',
];

/// Descriptive fields kept from the header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub composer: Option<String>,
}

/// Everything the body stages need from the header
#[derive(Debug, Clone, PartialEq)]
pub struct Header<'a> {
    pub unit_length: Rational,
    /// Seconds per unit of `beat-unit` length: `(60 / bpm) / beat-unit`
    pub tempo_multiplier: Rational,
    pub key: KeyTable,
    pub metadata: Metadata,
    source: &'a str,
    body_offset: usize,
}

impl<'a> Header<'a> {
    /// The melody text following the header
    pub fn body(&self) -> &'a str {
        &self.source[self.body_offset..]
    }

    /// Factor turning body units into output time
    pub fn time_scale(&self) -> Result<Rational> {
        self.unit_length
            .checked_mul(&self.tempo_multiplier)
            .ok_or(AbcError::TimeOverflow)
    }
}

/// Scan the header of `source`.
///
/// Fails only when `K:` names a key without a pitch table; the body is never
/// looked at in that case.
pub fn scan_header(source: &str) -> Result<Header<'_>> {
    let mut header = Header {
        unit_length: Rational::from_integer(1),
        tempo_multiplier: Rational::from_integer(1),
        key: KeyTable::default(),
        metadata: Metadata::default(),
        source,
        body_offset: source.len(),
    };

    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let field = line.trim();
        if field.is_empty() {
            offset += line.len();
            continue;
        }

        let Some((letter, value)) = split_field(field) else {
            header.body_offset = offset;
            break;
        };

        match letter {
            'L' => match parse_fraction(value) {
                Some(length) => header.unit_length = length,
                None => warn!("Skipping malformed unit length: {}", field),
            },
            'Q' => match parse_tempo(value) {
                Some(multiplier) => header.tempo_multiplier = multiplier,
                None => warn!("Skipping malformed tempo: {}", field),
            },
            'K' => {
                if is_key_shaped(value) {
                    header.key = KeyTable::for_key(value)?;
                } else {
                    warn!("Skipping malformed key: {}", field);
                }
            }
            'T' if header.metadata.title.is_none() => {
                header.metadata.title = Some(value.to_string());
            }
            'C' if header.metadata.composer.is_none() => {
                header.metadata.composer = Some(value.to_string());
            }
            _ if IGNORED_FIELDS.contains(&letter) => {}
            _ => warn!("Skipping unrecognised header line: {}", field),
        }
        offset += line.len();
    }

    debug!(
        "Header: unit length {}, tempo multiplier {}, key {}",
        header.unit_length,
        header.tempo_multiplier,
        header.key.name()
    );
    Ok(header)
}

/// Split `X:value` into its letter and trimmed value, if the line is a field.
fn split_field(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    let letter = chars.next().filter(char::is_ascii_uppercase)?;
    let rest = chars.as_str().strip_prefix(':')?;
    Some((letter, rest.trim()))
}

fn parse_integer(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a strictly positive `num[/den]`.
fn parse_fraction(s: &str) -> Option<Rational> {
    let (numer, denom) = match s.split_once('/') {
        Some((n, d)) => (parse_integer(n)?, parse_integer(d)?),
        None => (parse_integer(s)?, 1),
    };
    if numer == 0 || denom == 0 {
        return None;
    }
    Some(Rational::new(numer, denom))
}

/// Parse `[beat-unit=]bpm` into a tempo multiplier.
fn parse_tempo(s: &str) -> Option<Rational> {
    let (beat_unit, bpm) = match s.split_once('=') {
        Some((unit, bpm)) => (parse_fraction(unit.trim())?, bpm.trim()),
        None => (Rational::new(1, 4), s),
    };
    let bpm = parse_integer(bpm).filter(|b| *b > 0)?;
    Rational::new(60, bpm).checked_div(&beat_unit)
}

/// `[A-G](#|b)?m?`
fn is_key_shaped(s: &str) -> bool {
    let rest = match s.as_bytes().first() {
        Some(b'A'..=b'G') => &s[1..],
        _ => return false,
    };
    let rest = rest
        .strip_prefix('#')
        .or_else(|| rest.strip_prefix('b'))
        .unwrap_or(rest);
    rest.is_empty() || rest == "m"
}
