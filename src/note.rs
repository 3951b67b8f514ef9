//! Note events, bar markers and the pitch convention they share.
//!
//! Pitches are MIDI-style semitone numbers: middle C is 60 and A440 is 69.

use crate::Rational;
use serde::Serialize;

/// Velocity given to every parsed note
pub const DEFAULT_VELOCITY: f64 = 0.75;

/// Pitch of the `A` above middle C
pub const A4_PITCH: i32 = 69;

/// Frequency of [`A4_PITCH`] in Hz
pub const A4_FREQ: f64 = 440.0;

/// Convert a (possibly fractional) pitch to a frequency in Hz.
pub fn mtof(pitch: f64) -> f64 {
    A4_FREQ * 2f64.powf((pitch - A4_PITCH as f64) / 12.0)
}

/// Convert a frequency in Hz back to a fractional pitch.
pub fn ftom(freq: f64) -> f64 {
    A4_PITCH as f64 + 12.0 * (freq / A4_FREQ).log2()
}

/// A single timed note.
///
/// `T` is the time representation: exact [`Rational`] inside the pipeline,
/// `f64` once the score has been scaled for a consumer that wants floats.
/// `pitch` is `None` only for non-pitched events; the parser never emits
/// those, rests just leave a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent<T = Rational> {
    pub pitch: Option<i32>,
    pub duration: T,
    pub start_time: T,
    pub velocity: f64,
}

impl<T> NoteEvent<T> {
    pub fn new(pitch: Option<i32>, duration: T, start_time: T) -> Self {
        Self {
            pitch,
            duration,
            start_time,
            velocity: DEFAULT_VELOCITY,
        }
    }

    /// Frequency in Hz, if the note is pitched
    pub fn freq(&self) -> Option<f64> {
        self.pitch.map(|p| mtof(p as f64))
    }
}

impl<T: Copy + std::ops::Add<Output = T>> NoteEvent<T> {
    /// Time at which the note stops sounding
    pub fn off_time(&self) -> T {
        self.start_time + self.duration
    }
}

impl NoteEvent<Rational> {
    /// Convert exact times to floating point.
    pub fn to_f64(&self) -> NoteEvent<f64> {
        NoteEvent {
            pitch: self.pitch,
            duration: rational_to_f64(self.duration),
            start_time: rational_to_f64(self.start_time),
            velocity: self.velocity,
        }
    }
}

pub(crate) fn rational_to_f64(value: Rational) -> f64 {
    *value.numer() as f64 / *value.denom() as f64
}

/// Bar line and repeat kinds that survive into the element stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BarKind {
    Bar,
    ThinThin,
    ThinThick,
    ThickThin,
    StartRepeat,
    EndRepeat,
    StartEndRepeat,
}

impl BarKind {
    /// Whether a repeated section may start at this bar
    pub fn is_section_boundary(self) -> bool {
        !matches!(self, BarKind::Bar)
    }

    /// Whether this bar sends playback back to the section start
    pub fn is_closing_repeat(self) -> bool {
        matches!(self, BarKind::EndRepeat | BarKind::StartEndRepeat)
    }
}

/// A bar line positioned at the start of the note that follows it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarMarker {
    pub kind: BarKind,
    pub time: Rational,
}

/// One entry of the assembled stream: a note or a bar between notes
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Note(NoteEvent),
    Bar(BarMarker),
}

impl Element {
    pub fn time(&self) -> Rational {
        match self {
            Element::Note(note) => note.start_time,
            Element::Bar(bar) => bar.time,
        }
    }

    pub fn time_mut(&mut self) -> &mut Rational {
        match self {
            Element::Note(note) => &mut note.start_time,
            Element::Bar(bar) => &mut bar.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mtof_reference_pitch() {
        assert_eq!(mtof(69.0), 440.0);
        assert!((mtof(81.0) - 880.0).abs() < 1e-9);
        assert!((mtof(60.0) - 261.625_565).abs() < 1e-5);
    }

    #[test]
    fn test_ftom_inverts_mtof() {
        for pitch in [48.0, 60.0, 69.0, 72.5] {
            assert!((ftom(mtof(pitch)) - pitch).abs() < 1e-9);
        }
    }

    #[test]
    fn test_note_freq_and_off_time() {
        let note = NoteEvent::new(Some(69), Rational::new(1, 4), Rational::new(1, 2));
        assert_eq!(note.freq(), Some(440.0));
        assert_eq!(note.off_time(), Rational::new(3, 4));
        assert_eq!(note.velocity, DEFAULT_VELOCITY);

        let silent = NoteEvent::new(None, 1.0, 0.0);
        assert_eq!(silent.freq(), None);
        assert_eq!(silent.off_time(), 1.0);
    }

    #[test]
    fn test_to_f64() {
        let note = NoteEvent::new(Some(60), Rational::new(1, 8), Rational::new(3, 8));
        let float = note.to_f64();
        assert_eq!(float.duration, 0.125);
        assert_eq!(float.start_time, 0.375);
        assert_eq!(float.pitch, Some(60));
    }

    #[test]
    fn test_bar_kind_classes() {
        assert!(!BarKind::Bar.is_section_boundary());
        assert!(BarKind::ThinThick.is_section_boundary());
        assert!(BarKind::StartRepeat.is_section_boundary());
        assert!(BarKind::EndRepeat.is_closing_repeat());
        assert!(BarKind::StartEndRepeat.is_closing_repeat());
        assert!(!BarKind::StartRepeat.is_closing_repeat());
    }
}
