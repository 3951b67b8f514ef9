//! # Error Types
//!
//! All errors the score pipeline can return.
//!
//! Lexical anomalies never show up here: malformed header lines and unknown
//! body characters are skipped where they are found. Only the conditions that
//! change the meaning of the whole score are reported.
//!
//! ## Usage
//! ```rust
//! use abcseq::{parse_score, AbcError};
//!
//! match parse_score("K:Bb\nCDEF|\n") {
//!     Ok(notes) => println!("{} notes", notes.len()),
//!     Err(AbcError::UnsupportedKeySignature(key)) => eprintln!("no table for {}", key),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use crate::Rational;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbcError {
    /// The `K:` header names a key that has no pitch table.
    ///
    /// Raised before the body is looked at.
    ///
    /// # Example
    /// ```
    /// # use abcseq::AbcError;
    /// let err = AbcError::UnsupportedKeySignature("Bb".to_string());
    /// assert_eq!(err.to_string(), "Key signature Bb is not supported");
    /// ```
    #[error("Key signature {0} is not supported")]
    UnsupportedKeySignature(String),

    /// A closing repeat (`:|` or `::`) with no section boundary before it.
    ///
    /// `time` is the marker position in units, before tempo scaling.
    #[error("Closing repeat at time {time} has no preceding section start")]
    UnmatchedClosingRepeat { time: Rational },

    /// A time or duration no longer fits in a 64-bit fraction.
    ///
    /// Durations like `/3`, `/5`, `/7` multiply the denominator of the
    /// running time, so long scores of odd tuplets can run out of range.
    ///
    /// # Example
    /// ```
    /// # use abcseq::{body_to_notes, AbcError, KeyTable};
    /// let result = body_to_notes("C/4611686018427387904/D", &KeyTable::default());
    /// assert_eq!(result, Err(AbcError::TimeOverflow));
    /// ```
    #[error("Time value is out of range")]
    TimeOverflow,

    /// Octave marks or transposition moved a pitch out of `i32`.
    #[error("Pitch is out of range")]
    PitchOverflow,

    /// Render configuration could not be read.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AbcError>;
