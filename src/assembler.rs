//! # Note Assembler
//!
//! Turns the body token stream into timed notes and bar markers.
//!
//! The assembler is a two-state machine: `Idle` before the first note and
//! `Building` while a note's duration and octave marks are still being read.
//! A note is only finished when the next note (or the end of the stream)
//! arrives, because duration digits and octave marks follow the letter.
//!
//! Bars are held back until the next note starts, then stamped with that
//! note's start time. Times are in body units (multiples of `L:`), exact.
//!
//! ## Example
//! ```rust
//! use abcseq::{assemble, Element, KeyTable, Lexer, Rational};
//!
//! let elements = assemble(Lexer::new("C2|z/D"), &KeyTable::default())?;
//! let times: Vec<Rational> = elements.iter().map(Element::time).collect();
//! // C at 0, the bar and the rest at 2, D after the half-length rest
//! assert_eq!(
//!     times,
//!     vec![Rational::from_integer(0), Rational::from_integer(2), Rational::new(5, 2)]
//! );
//! # Ok::<(), abcseq::AbcError>(())
//! ```

use crate::error::{AbcError, Result};
use crate::key::KeyTable;
use crate::lexer::{Token, TokenKind};
use crate::note::{BarKind, BarMarker, Element, NoteEvent};
use crate::Rational;
use log::{debug, trace};
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, Zero};

/// Semitones in an octave mark
const OCTAVE: i32 = 12;

/// The note currently being read
#[derive(Debug, Clone, PartialEq)]
struct PendingNote {
    pitch: Option<i32>,
    duration: Rational,
    start: Rational,
    /// Next duration digits divide instead of multiply
    inverted: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
enum State {
    #[default]
    Idle,
    Building(PendingNote),
}

/// Map bar tokens to the markers they leave in the stream
fn bar_kind(kind: TokenKind) -> Option<BarKind> {
    let bar = match kind {
        TokenKind::Bar => BarKind::Bar,
        TokenKind::ThinThinBar => BarKind::ThinThin,
        TokenKind::ThinThickBar => BarKind::ThinThick,
        TokenKind::ThickThinBar => BarKind::ThickThin,
        TokenKind::StartRepeat => BarKind::StartRepeat,
        TokenKind::EndRepeat => BarKind::EndRepeat,
        TokenKind::StartEndRepeat => BarKind::StartEndRepeat,
        _ => return None,
    };
    Some(bar)
}

struct Assembler<'k> {
    key: &'k KeyTable,
    time: Rational,
    state: State,
    /// Bars seen since the last note started, in token order
    pending_bars: Vec<BarKind>,
    output: Vec<Element>,
}

impl<'k> Assembler<'k> {
    fn new(key: &'k KeyTable) -> Self {
        Self {
            key,
            time: Rational::zero(),
            state: State::Idle,
            pending_bars: Vec::new(),
            output: Vec::new(),
        }
    }

    fn step(&mut self, token: &Token<'_>) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        self.state = match (state, token.kind) {
            (state, TokenKind::Note) => {
                self.finish(state)?;
                State::Building(PendingNote {
                    pitch: self.key.pitch(token.text),
                    duration: Rational::from_integer(1),
                    start: self.time,
                    inverted: false,
                })
            }
            (state, TokenKind::End) => {
                self.finish(state)?;
                State::Idle
            }
            (State::Building(note), TokenKind::Duration) => {
                State::Building(apply_duration(note, token.text)?)
            }
            (State::Building(note), TokenKind::InvertDuration) => State::Building(PendingNote {
                inverted: true,
                ..note
            }),
            (State::Building(note), TokenKind::OctaveUp) => {
                State::Building(shift_octave(note, OCTAVE)?)
            }
            (State::Building(note), TokenKind::OctaveDown) => {
                State::Building(shift_octave(note, -OCTAVE)?)
            }
            (state, kind) => {
                match bar_kind(kind) {
                    Some(bar) => self.pending_bars.push(bar),
                    None => trace!("Ignoring {:?} token {:?}", kind, token.text),
                }
                state
            }
        };
        Ok(())
    }

    /// Close the note under construction and emit held-back bars.
    fn finish(&mut self, state: State) -> Result<()> {
        if let State::Building(mut note) = state {
            if note.inverted {
                note.duration = note
                    .duration
                    .checked_div(&Rational::from_integer(2))
                    .ok_or(AbcError::TimeOverflow)?;
            }
            self.time = self
                .time
                .checked_add(&note.duration)
                .ok_or(AbcError::TimeOverflow)?;
            if note.pitch.is_some() {
                self.output.push(Element::Note(NoteEvent::new(
                    note.pitch,
                    note.duration,
                    note.start,
                )));
            }
        }

        let time = self.time;
        self.output.extend(
            self.pending_bars
                .drain(..)
                .map(|kind| Element::Bar(BarMarker { kind, time })),
        );
        Ok(())
    }
}

fn apply_duration(mut note: PendingNote, digits: &str) -> Result<PendingNote> {
    let factor = match digits.parse::<i64>() {
        Ok(n) if n > 0 => Rational::from_integer(n),
        _ => {
            debug!("Ignoring duration {:?}", digits);
            return Ok(note);
        }
    };
    let duration = if note.inverted {
        note.duration.checked_div(&factor)
    } else {
        note.duration.checked_mul(&factor)
    };
    note.duration = duration.ok_or(AbcError::TimeOverflow)?;
    note.inverted = false;
    Ok(note)
}

fn shift_octave(mut note: PendingNote, semitones: i32) -> Result<PendingNote> {
    if let Some(pitch) = note.pitch.as_mut() {
        *pitch = pitch
            .checked_add(semitones)
            .ok_or(AbcError::PitchOverflow)?;
    }
    Ok(note)
}

/// Assemble a token stream into notes and bar markers, in emission order.
///
/// Rests move time forward but produce no element. Bars still pending when the
/// stream ends are placed at the final time so that a closing repeat on the
/// last bar line is kept.
///
/// Fails with [`AbcError::TimeOverflow`] when a duration or the running time
/// leaves the range of [`Rational`], and with [`AbcError::PitchOverflow`]
/// when octave marks push a pitch out of `i32`.
pub fn assemble<'a>(
    tokens: impl IntoIterator<Item = Token<'a>>,
    key: &KeyTable,
) -> Result<Vec<Element>> {
    let mut assembler = Assembler::new(key);
    for token in tokens {
        assembler.step(&token)?;
    }
    // A stream without its `End` token still gets its last note
    let state = std::mem::take(&mut assembler.state);
    assembler.finish(state)?;

    debug!(
        "Assembled {} elements over {} units",
        assembler.output.len(),
        assembler.time
    );
    Ok(assembler.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn run(body: &str) -> Vec<Element> {
        assemble(Lexer::new(body), &KeyTable::default()).unwrap()
    }

    fn notes(body: &str) -> Vec<(Option<i32>, Rational, Rational)> {
        run(body)
            .into_iter()
            .filter_map(|e| match e {
                Element::Note(n) => Some((n.pitch, n.duration, n.start_time)),
                Element::Bar(_) => None,
            })
            .collect()
    }

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(n, d)
    }

    #[test]
    fn test_consecutive_notes() {
        assert_eq!(
            notes("CDc"),
            vec![
                (Some(60), r(1, 1), r(0, 1)),
                (Some(62), r(1, 1), r(1, 1)),
                (Some(72), r(1, 1), r(2, 1)),
            ]
        );
    }

    #[test]
    fn test_duration_multiplies() {
        assert_eq!(
            notes("C2D"),
            vec![(Some(60), r(2, 1), r(0, 1)), (Some(62), r(1, 1), r(2, 1))]
        );
    }

    #[test]
    fn test_inverted_duration_divides() {
        assert_eq!(
            notes("C/2D3/4E"),
            vec![
                (Some(60), r(1, 2), r(0, 1)),
                (Some(62), r(3, 4), r(1, 2)),
                (Some(64), r(1, 1), r(5, 4)),
            ]
        );
    }

    #[test]
    fn test_bare_slash_halves() {
        assert_eq!(
            notes("C/D/"),
            vec![(Some(60), r(1, 2), r(0, 1)), (Some(62), r(1, 2), r(1, 2))]
        );
        // A second slash does not halve again
        assert_eq!(notes("C//")[0].1, r(1, 2));
    }

    #[test]
    fn test_rest_advances_time() {
        assert_eq!(
            notes("Cz2D"),
            vec![(Some(60), r(1, 1), r(0, 1)), (Some(62), r(1, 1), r(3, 1))]
        );
        assert!(notes("z4").is_empty());
    }

    #[test]
    fn test_octave_marks_compose() {
        assert_eq!(notes("C'',")[0].0, Some(72));
        assert_eq!(notes("c,,")[0].0, Some(48));
        // Marks on rests are ignored
        assert_eq!(notes("z'C")[0], (Some(60), r(1, 1), r(1, 1)));
    }

    #[test]
    fn test_bars_take_next_note_time() {
        let elements = run("C2|D");
        assert_eq!(
            elements,
            vec![
                Element::Note(NoteEvent::new(Some(60), r(2, 1), r(0, 1))),
                Element::Bar(BarMarker {
                    kind: BarKind::Bar,
                    time: r(2, 1)
                }),
                Element::Note(NoteEvent::new(Some(62), r(1, 1), r(2, 1))),
            ]
        );
    }

    #[test]
    fn test_adjacent_bars_keep_token_order() {
        let kinds: Vec<_> = run("C:||:D")
            .into_iter()
            .filter_map(|e| match e {
                Element::Bar(b) => Some((b.kind, b.time)),
                Element::Note(_) => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (BarKind::EndRepeat, r(1, 1)),
                (BarKind::StartRepeat, r(1, 1))
            ]
        );
    }

    #[test]
    fn test_trailing_bar_stamped_at_end() {
        let elements = run("CD:|");
        assert_eq!(
            elements.last(),
            Some(&Element::Bar(BarMarker {
                kind: BarKind::EndRepeat,
                time: r(2, 1)
            }))
        );
    }

    #[test]
    fn test_leading_bar_at_zero() {
        let elements = run("|:C");
        assert_eq!(elements[0].time(), r(0, 1));
        assert!(matches!(
            elements[0],
            Element::Bar(BarMarker {
                kind: BarKind::StartRepeat,
                ..
            })
        ));
    }

    #[test]
    fn test_ignored_tokens() {
        assert_eq!(
            notes("\"Am\"[1A[CE]B x0C"),
            vec![
                (Some(69), r(1, 1), r(0, 1)),
                (Some(71), r(1, 1), r(1, 1)),
                (Some(60), r(1, 1), r(2, 1)),
            ]
        );
        // Modifiers before the first note have nothing to act on
        assert_eq!(notes("2/'C"), vec![(Some(60), r(1, 1), r(0, 1))]);
    }

    #[test]
    fn test_times_never_decrease() {
        let elements = run("|:C2 D/E/ | z F3 ::G,A'|]");
        assert!(elements.windows(2).all(|w| w[0].time() <= w[1].time()));
    }

    #[test]
    fn test_missing_end_token_still_flushes() {
        let tokens: Vec<_> = Lexer::new("CD")
            .filter(|t| t.kind != TokenKind::End)
            .collect();
        assert_eq!(assemble(tokens, &KeyTable::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_halving_out_of_range() {
        // The digits divide down to 1/2^62, the bare slash would need 1/2^63
        let result = assemble(
            Lexer::new("C/4611686018427387904/D"),
            &KeyTable::default(),
        );
        assert_eq!(result, Err(AbcError::TimeOverflow));
    }

    #[test]
    fn test_duration_product_out_of_range() {
        let result = assemble(
            Lexer::new("C9223372036854775807 2D"),
            &KeyTable::default(),
        );
        assert_eq!(result, Err(AbcError::TimeOverflow));
    }

    #[test]
    fn test_octave_shift_out_of_range() {
        let note = PendingNote {
            pitch: Some(i32::MAX - 6),
            duration: r(1, 1),
            start: r(0, 1),
            inverted: false,
        };
        assert_eq!(shift_octave(note.clone(), -OCTAVE).unwrap().pitch, Some(i32::MAX - 18));
        assert_eq!(shift_octave(note, OCTAVE), Err(AbcError::PitchOverflow));
    }

    #[test]
    fn test_running_time_out_of_range() {
        // Denominators of the running time multiply up past i64
        let body = "C/2D/3E/5F/7G/11A/13B/17c/19d/23e/29f/31g/37a/41b/43c/47d/53e/59";
        let result = assemble(Lexer::new(body), &KeyTable::default());
        assert_eq!(result, Err(AbcError::TimeOverflow));
    }
}
