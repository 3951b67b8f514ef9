//! Render configuration for the command line tool.
//!
//! Read from a YAML file:
//!
//! ```yaml
//! exact: true      # print times as fractions instead of floats
//! transpose: -12   # semitones applied to every note
//! repeat: 2        # play the whole score this many times
//! ```
//!
//! Every key is optional.

use crate::error::{AbcError, Result};
use crate::note::NoteEvent;
use crate::sheet::Sheet;
use serde::Deserialize;

fn default_repeat() -> usize {
    1
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default)]
    pub exact: bool,
    #[serde(default)]
    pub transpose: i32,
    #[serde(default = "default_repeat")]
    pub repeat: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            exact: false,
            transpose: 0,
            repeat: default_repeat(),
        }
    }
}

impl RenderConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| AbcError::Config(e.to_string()))
    }

    /// Apply transposition and whole-score repetition to parsed notes.
    pub fn render(&self, notes: Vec<NoteEvent>) -> Result<Sheet> {
        let mut sheet = Sheet::from(notes);
        sheet
            .checked_transpose(self.transpose)
            .ok_or(AbcError::PitchOverflow)?;
        sheet
            .checked_repeat(self.repeat)
            .ok_or(AbcError::TimeOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rational;

    #[test]
    fn test_defaults() {
        assert_eq!(RenderConfig::from_yaml("").unwrap(), RenderConfig::default());
        let config = RenderConfig::from_yaml("exact: true\n").unwrap();
        assert!(config.exact);
        assert_eq!(config.repeat, 1);
        assert_eq!(config.transpose, 0);
    }

    #[test]
    fn test_full_config() {
        let config = RenderConfig::from_yaml("exact: false\ntranspose: 7\nrepeat: 3\n").unwrap();
        assert_eq!(
            config,
            RenderConfig {
                exact: false,
                transpose: 7,
                repeat: 3
            }
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            RenderConfig::from_yaml("tempo: fast\n"),
            Err(AbcError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_yaml("repeat: -1\n"),
            Err(AbcError::Config(_))
        ));
    }

    #[test]
    fn test_render() {
        let config = RenderConfig {
            exact: true,
            transpose: 2,
            repeat: 2,
        };
        let notes = vec![NoteEvent::new(
            Some(60),
            Rational::new(1, 2),
            Rational::from_integer(0),
        )];
        let sheet = config.render(notes).unwrap();
        assert_eq!(sheet.notes().len(), 2);
        assert_eq!(sheet.notes()[1].pitch, Some(62));
        assert_eq!(sheet.notes()[1].start_time, Rational::new(1, 2));
    }

    #[test]
    fn test_render_out_of_range() {
        let notes = vec![NoteEvent::new(
            Some(60),
            Rational::from_integer(i64::MAX / 2 + 1),
            Rational::from_integer(0),
        )];
        // Fine to play twice, but a third copy would start past i64::MAX
        let config = RenderConfig {
            repeat: 3,
            ..RenderConfig::default()
        };
        assert_eq!(config.render(notes.clone()), Err(AbcError::TimeOverflow));

        let config = RenderConfig {
            transpose: i32::MAX,
            ..RenderConfig::default()
        };
        assert_eq!(config.render(notes), Err(AbcError::PitchOverflow));
    }
}
