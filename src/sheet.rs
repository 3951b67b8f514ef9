//! Ordered note container for whole-sequence edits.
//!
//! A [`Sheet`] holds parsed notes and an optional explicit duration (for
//! sequences that end in silence). Sheets can be concatenated, repeated,
//! shifted, transposed and stretched in time.
//!
//! ```rust
//! use abcseq::{parse_score_exact, Rational, Sheet};
//!
//! let sheet = Sheet::from(parse_score_exact("L:1/4\nCDEF\n")?);
//! let twice = sheet.repeat(2);
//! assert_eq!(twice.notes().len(), 8);
//! assert_eq!(twice.duration(), Rational::from_integer(2));
//! # Ok::<(), abcseq::AbcError>(())
//! ```

use crate::note::NoteEvent;
use crate::Rational;
use num_traits::{CheckedAdd, Zero};
use std::ops::Add;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    notes: Vec<NoteEvent>,
    duration: Option<Rational>,
}

impl Sheet {
    pub fn new(notes: Vec<NoteEvent>) -> Self {
        Self {
            notes,
            duration: None,
        }
    }

    /// A sheet whose length is fixed rather than taken from its last note
    pub fn with_duration(notes: Vec<NoteEvent>, duration: Rational) -> Self {
        Self {
            notes,
            duration: Some(duration),
        }
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn into_notes(self) -> Vec<NoteEvent> {
        self.notes
    }

    pub fn push(&mut self, note: NoteEvent) {
        self.notes.push(note);
    }

    /// Latest time any note is still sounding (zero when empty)
    pub fn off_time(&self) -> Rational {
        self.notes
            .iter()
            .map(NoteEvent::off_time)
            .max()
            .unwrap_or_else(Rational::zero)
    }

    /// Explicit duration if set, otherwise the off time
    pub fn duration(&self) -> Rational {
        self.duration.unwrap_or_else(|| self.off_time())
    }

    pub fn set_duration(&mut self, duration: Option<Rational>) {
        self.duration = duration;
    }

    /// Move every note later by `amount`
    pub fn shift(&mut self, amount: Rational) -> &mut Self {
        for note in &mut self.notes {
            note.start_time += amount;
        }
        self
    }

    /// Move every pitched note by `interval` semitones
    pub fn transpose(&mut self, interval: i32) -> &mut Self {
        for pitch in self.notes.iter_mut().filter_map(|n| n.pitch.as_mut()) {
            *pitch += interval;
        }
        self
    }

    /// Stretch times and durations by `amount`
    pub fn dilate(&mut self, amount: Rational) -> &mut Self {
        for note in &mut self.notes {
            note.duration *= amount;
            note.start_time *= amount;
        }
        if let Some(duration) = self.duration.as_mut() {
            *duration *= amount;
        }
        self
    }

    /// This sheet followed by `other`, which starts at this sheet's duration
    pub fn concat(&self, other: &Sheet) -> Sheet {
        let offset = self.duration();
        let mut second = other.clone();
        second.shift(offset);

        let mut notes = self.notes.clone();
        notes.extend(second.notes);
        Sheet {
            notes,
            duration: other.duration.map(|d| offset + d),
        }
    }

    /// This sheet played `times` times back to back
    pub fn repeat(&self, times: usize) -> Sheet {
        if times == 0 {
            return Sheet::default();
        }
        (1..times).fold(self.clone(), |acc, _| acc.concat(self))
    }

    /// [`Sheet::duration`], or `None` if an off time leaves the range of
    /// [`Rational`]
    pub fn checked_duration(&self) -> Option<Rational> {
        if let Some(duration) = self.duration {
            return Some(duration);
        }
        self.notes.iter().try_fold(Rational::zero(), |latest, note| {
            Some(latest.max(note.start_time.checked_add(&note.duration)?))
        })
    }

    /// [`Sheet::concat`], or `None` if a shifted time leaves the range of
    /// [`Rational`]
    pub fn checked_concat(&self, other: &Sheet) -> Option<Sheet> {
        let offset = self.checked_duration()?;
        let mut notes = self.notes.clone();
        for note in &other.notes {
            let mut note = note.clone();
            note.start_time = note.start_time.checked_add(&offset)?;
            notes.push(note);
        }
        let duration = match other.duration {
            Some(duration) => Some(offset.checked_add(&duration)?),
            None => None,
        };
        Some(Sheet { notes, duration })
    }

    /// [`Sheet::repeat`], or `None` if a shifted time leaves the range of
    /// [`Rational`]
    pub fn checked_repeat(&self, times: usize) -> Option<Sheet> {
        if times == 0 {
            return Some(Sheet::default());
        }
        (1..times).try_fold(self.clone(), |acc, _| acc.checked_concat(self))
    }

    /// [`Sheet::transpose`], or `None` (leaving the sheet untouched) if a
    /// pitch would leave the range of `i32`
    pub fn checked_transpose(&mut self, interval: i32) -> Option<&mut Self> {
        let in_range = self
            .notes
            .iter()
            .filter_map(|n| n.pitch)
            .all(|pitch| pitch.checked_add(interval).is_some());
        if !in_range {
            return None;
        }
        Some(self.transpose(interval))
    }
}

impl From<Vec<NoteEvent>> for Sheet {
    fn from(notes: Vec<NoteEvent>) -> Self {
        Sheet::new(notes)
    }
}

impl Add for &Sheet {
    type Output = Sheet;

    fn add(self, other: Self) -> Sheet {
        self.concat(other)
    }
}

impl IntoIterator for Sheet {
    type Item = NoteEvent;
    type IntoIter = std::vec::IntoIter<NoteEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.into_iter()
    }
}
