//! Key signatures and the pitch table they resolve to.
//!
//! Only keys with sharps or a single flat have a table: C, G, D, A, E, B, F#,
//! C#, F and their relative minors. Naming any other key in `K:` is an error.

use crate::error::{AbcError, Result};

/// Natural letters in scale order, starting from C
const LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// Semitone offset of each natural letter from C
const NATURAL_OFFSETS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Order in which sharps are added to a key signature
const SHARP_ORDER: [char; 7] = ['F', 'C', 'G', 'D', 'A', 'E', 'B'];

/// Order in which flats are added to a key signature
const FLAT_ORDER: [char; 7] = ['B', 'E', 'A', 'D', 'G', 'C', 'F'];

/// Pitch of the uppercase `C` (middle C)
pub const MIDDLE_C: i32 = 60;

/// Letter used for rests
pub const REST: char = 'z';

/// Circle-of-fifths position of a supported key.
/// Positive = sharps, negative = flats.
fn fifths_for(key: &str) -> Option<i8> {
    let fifths = match key {
        "C" | "Am" => 0,
        "G" | "Em" => 1,
        "D" | "Bm" => 2,
        "A" | "F#m" => 3,
        "E" | "C#m" => 4,
        "B" | "G#m" => 5,
        "F#" | "D#m" => 6,
        "C#" | "A#m" => 7,
        "F" | "Dm" => -1,
        _ => return None,
    };
    Some(fifths)
}

/// Names of all keys that resolve to a table
pub fn supported_keys() -> &'static [&'static str] {
    &[
        "C", "G", "D", "A", "E", "B", "F#", "C#", "F", "Am", "Em", "Bm", "F#m", "C#m", "G#m",
        "D#m", "A#m", "Dm",
    ]
}

/// Per-key pitch table for the seven natural letters.
///
/// Immutable once built. Letters without an explicit accidental take the key's
/// accidental; `^`, `_` and `=` alter the natural letter instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTable {
    name: String,
    /// Pitch of each uppercase letter, indexed like [`LETTERS`]
    pitches: [i32; 7],
}

impl KeyTable {
    /// Build the table for a key name such as `"G"`, `"F#m"` or `"Dm"`.
    pub fn for_key(key: &str) -> Result<Self> {
        let fifths =
            fifths_for(key).ok_or_else(|| AbcError::UnsupportedKeySignature(key.to_string()))?;

        let mut pitches = [0; 7];
        for (i, letter) in LETTERS.iter().enumerate() {
            let count = fifths.unsigned_abs() as usize;
            let alteration = if fifths > 0 && SHARP_ORDER[..count].contains(letter) {
                1
            } else if fifths < 0 && FLAT_ORDER[..count].contains(letter) {
                -1
            } else {
                0
            };
            pitches[i] = MIDDLE_C + NATURAL_OFFSETS[i] + alteration;
        }

        Ok(Self {
            name: key.to_string(),
            pitches,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a note spelling (`"C"`, `"^f"`, `"=B"`, `"z"`) to a pitch.
    ///
    /// Rests and anything that is not a note spelling resolve to `None`.
    pub fn pitch(&self, spelling: &str) -> Option<i32> {
        let mut chars = spelling.chars();
        let (accidental, letter) = match (chars.next()?, chars.next()) {
            (acc @ ('^' | '_' | '='), Some(letter)) => (Some(acc), letter),
            (letter, None) => (None, letter),
            _ => return None,
        };
        if chars.next().is_some() || letter == REST {
            return None;
        }

        let index = LETTERS
            .iter()
            .position(|l| *l == letter.to_ascii_uppercase())?;
        let octave = if letter.is_ascii_lowercase() { 12 } else { 0 };
        let natural = MIDDLE_C + NATURAL_OFFSETS[index];

        let pitch = match accidental {
            Some('^') => natural + 1,
            Some('_') => natural - 1,
            Some(_) => natural,
            None => self.pitches[index],
        };
        Some(pitch + octave)
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self {
            name: "C".to_string(),
            pitches: [60, 62, 64, 65, 67, 69, 71],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_major_naturals() {
        let key = KeyTable::for_key("C").unwrap();
        let pitches: Vec<_> = ["C", "D", "E", "F", "G", "A", "B", "c"]
            .iter()
            .map(|s| key.pitch(s).unwrap())
            .collect();
        assert_eq!(pitches, vec![60, 62, 64, 65, 67, 69, 71, 72]);
        assert_eq!(key, KeyTable::default());
    }

    #[test]
    fn test_sharp_key_applies_signature() {
        let key = KeyTable::for_key("D").unwrap();
        assert_eq!(key.pitch("F"), Some(66));
        assert_eq!(key.pitch("c"), Some(73));
        assert_eq!(key.pitch("G"), Some(67));
    }

    #[test]
    fn test_f_major_flattens_b() {
        let key = KeyTable::for_key("F").unwrap();
        assert_eq!(key.pitch("B"), Some(70));
        assert_eq!(key.pitch("=B"), Some(71));
        assert_eq!(KeyTable::for_key("Dm").unwrap().pitch("b"), Some(82));
    }

    #[test]
    fn test_minor_shares_relative_major() {
        let e_minor = KeyTable::for_key("Em").unwrap();
        let g_major = KeyTable::for_key("G").unwrap();
        for letter in ["C", "D", "E", "F", "G", "A", "B"] {
            assert_eq!(e_minor.pitch(letter), g_major.pitch(letter));
        }
    }

    #[test]
    fn test_explicit_accidentals() {
        let key = KeyTable::for_key("G").unwrap();
        assert_eq!(key.pitch("^C"), Some(61));
        assert_eq!(key.pitch("_e"), Some(75));
        assert_eq!(key.pitch("=F"), Some(65));
        assert_eq!(key.pitch("^F"), Some(66));
    }

    #[test]
    fn test_rest_and_garbage() {
        let key = KeyTable::default();
        assert_eq!(key.pitch("z"), None);
        assert_eq!(key.pitch(""), None);
        assert_eq!(key.pitch("H"), None);
        assert_eq!(key.pitch("^CC"), None);
    }

    #[test]
    fn test_unsupported_keys() {
        for key in ["Bb", "Eb", "Gm", "Cb", "H"] {
            assert_eq!(
                KeyTable::for_key(key),
                Err(AbcError::UnsupportedKeySignature(key.to_string()))
            );
        }
    }

    #[test]
    fn test_every_listed_key_resolves() {
        for key in supported_keys() {
            assert_eq!(KeyTable::for_key(key).unwrap().name(), *key);
        }
    }
}
