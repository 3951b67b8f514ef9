//! # Repeat Resolution
//!
//! Unrolls repeat bars into a linear timeline.
//!
//! Each pass takes the earliest closing repeat (`:|` or `::`), finds the
//! section it closes and plays that section a second time:
//! - the section starts at the latest section boundary (any bar other than a
//!   plain `|`) strictly before the closing bar, or at time 0
//! - everything inside the section is copied, shifted by the section length
//! - everything at or after the closing bar moves later by the same length
//! - the closing bar is demoted to a plain double bar
//!
//! Sections are assumed to be sequential or nested, never interleaved. Passes
//! stop when no closing repeats remain, so the pass count is the number of
//! closing repeats in the input.
//!
//! ## Example
//! ```rust
//! use abcseq::{body_to_notes, KeyTable};
//!
//! let notes = body_to_notes("A|:BC:|D", &KeyTable::default())?;
//! let pitches: Vec<_> = notes.iter().filter_map(|n| n.pitch).collect();
//! // A B C B C D
//! assert_eq!(pitches, vec![69, 71, 72, 71, 72, 62]);
//! # Ok::<(), abcseq::AbcError>(())
//! ```

use crate::error::{AbcError, Result};
use crate::note::{BarKind, Element, NoteEvent};
use crate::Rational;
use log::debug;
use num_traits::{CheckedAdd, CheckedSub, Zero};

fn is_closing(element: &Element) -> bool {
    matches!(element, Element::Bar(bar) if bar.kind.is_closing_repeat())
}

/// Index of the earliest closing repeat, first in stream order on ties
fn earliest_closing(elements: &[Element]) -> Option<usize> {
    elements
        .iter()
        .enumerate()
        .filter(|(_, e)| is_closing(e))
        .min_by_key(|(_, e)| e.time())
        .map(|(i, _)| i)
}

/// Start of the section closed at `end`: the nearest earlier boundary
fn section_start(elements: &[Element], end: Rational) -> Option<Rational> {
    let boundaries = elements.iter().filter_map(|e| match e {
        Element::Bar(bar) if bar.kind.is_section_boundary() => Some(bar.time),
        _ => None,
    });
    std::iter::once(Rational::zero())
        .chain(boundaries)
        .filter(|time| *time < end)
        .max()
}

fn shift(element: &mut Element, length: Rational) -> Result<()> {
    let time = element.time_mut();
    *time = time.checked_add(&length).ok_or(AbcError::TimeOverflow)?;
    Ok(())
}

/// Expand every repeat and return the notes sorted by start time.
///
/// Fails with [`AbcError::UnmatchedClosingRepeat`] when a closing repeat has
/// nothing before it to go back to, and with [`AbcError::TimeOverflow`] when a
/// shifted time leaves the range of [`Rational`].
pub fn resolve_repeats(mut elements: Vec<Element>) -> Result<Vec<NoteEvent>> {
    let passes = elements.iter().filter(|e| is_closing(e)).count();

    for pass in 0..passes {
        let Some(closing) = earliest_closing(&elements) else {
            break;
        };
        let end = elements[closing].time();
        let start = section_start(&elements, end)
            .ok_or(AbcError::UnmatchedClosingRepeat { time: end })?;
        let length = end.checked_sub(&start).ok_or(AbcError::TimeOverflow)?;
        debug!("Repeat pass {}: section {}..{} (+{})", pass + 1, start, end, length);

        if let Element::Bar(bar) = &mut elements[closing] {
            bar.kind = BarKind::ThinThin;
        }

        let copies = elements
            .iter()
            .filter(|e| (start..end).contains(&e.time()))
            .map(|e| {
                let mut copy = e.clone();
                shift(&mut copy, length)?;
                Ok(copy)
            })
            .collect::<Result<Vec<Element>>>()?;

        for element in elements.iter_mut() {
            if element.time() >= end {
                shift(element, length)?;
            }
        }
        elements.extend(copies);
    }
    debug_assert!(!elements.iter().any(is_closing));

    let mut notes: Vec<NoteEvent> = elements
        .into_iter()
        .filter_map(|e| match e {
            Element::Note(note) => Some(note),
            Element::Bar(_) => None,
        })
        .collect();
    notes.sort_by_key(|note| note.start_time);
    Ok(notes)
}
