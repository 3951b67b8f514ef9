//! Final time scaling.
//!
//! Body units become output time by multiplying with the header's unit length
//! and tempo multiplier. This is the only place exact times may be turned into
//! floats, after all repeats have been unrolled.

use crate::error::{AbcError, Result};
use crate::note::NoteEvent;
use crate::Rational;
use num_traits::CheckedMul;

/// Multiply every start time and duration by `factor`.
pub fn scale_events(mut events: Vec<NoteEvent>, factor: Rational) -> Result<Vec<NoteEvent>> {
    for event in &mut events {
        event.duration = event
            .duration
            .checked_mul(&factor)
            .ok_or(AbcError::TimeOverflow)?;
        event.start_time = event
            .start_time
            .checked_mul(&factor)
            .ok_or(AbcError::TimeOverflow)?;
    }
    Ok(events)
}

/// Convert exact events to floating point times.
pub fn to_floats(events: &[NoteEvent]) -> Vec<NoteEvent<f64>> {
    events.iter().map(|event| event.to_f64()).collect()
}
