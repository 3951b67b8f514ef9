//! # abcseq
//!
//! Turns ABC-style scores into timed note events for a synthesizer or
//! sequencer.
//!
//! ## Pipeline
//! 1. [`scan_header`] reads `L:`, `Q:` and `K:` and finds the body
//! 2. [`Lexer`] splits the body into tokens
//! 3. [`assemble`] builds notes and bar markers in body units
//! 4. [`resolve_repeats`] unrolls repeats into a linear timeline
//! 5. [`scale_events`] converts body units into seconds
//!
//! Times stay exact ([`Rational`]) through every stage; [`parse_score`]
//! converts them to `f64` only at the very end.
//!
//! ## Example
//! ```rust
//! let notes = abcseq::parse_score("L:1/8\nQ:1/4=120\nK:C\nC2DE|\n")?;
//! assert_eq!(notes.len(), 3);
//! assert_eq!(notes[0].pitch, Some(60));
//! assert_eq!(notes[0].duration, 0.5);
//! assert_eq!(notes[1].start_time, 0.5);
//! # Ok::<(), abcseq::AbcError>(())
//! ```

pub mod assembler;
pub mod config;
pub mod error;
pub mod header;
pub mod key;
pub mod lexer;
pub mod note;
pub mod repeat;
pub mod scale;
pub mod sheet;

pub use assembler::assemble;
pub use config::RenderConfig;
pub use error::{AbcError, Result};
pub use header::{scan_header, Header, Metadata};
pub use key::KeyTable;
pub use lexer::{Lexer, Token, TokenKind};
pub use note::{ftom, mtof, BarKind, BarMarker, Element, NoteEvent, DEFAULT_VELOCITY};
pub use repeat::resolve_repeats;
pub use scale::{scale_events, to_floats};
pub use sheet::Sheet;

/// Exact time and duration type used throughout the pipeline
pub type Rational = num_rational::Rational64;

/// Turn a melody body into notes, unscaled (times in body units).
pub fn body_to_notes(body: &str, key: &KeyTable) -> Result<Vec<NoteEvent>> {
    let elements = assemble(Lexer::new(body), key)?;
    resolve_repeats(elements)
}

/// Parse a complete score, keeping exact times in seconds.
pub fn parse_score_exact(source: &str) -> Result<Vec<NoteEvent>> {
    let header = scan_header(source)?;
    let notes = body_to_notes(header.body(), &header.key)?;
    scale_events(notes, header.time_scale()?)
}

/// Parse a complete score into notes with floating point times in seconds.
pub fn parse_score(source: &str) -> Result<Vec<NoteEvent<f64>>> {
    parse_score_exact(source).map(|notes| to_floats(&notes))
}
