//! Rational durations
//!
//! Durations are stored as fractions of a whole note. Tuplet ratios are not
//! powers of two, so elapsed and actual durations stay exact rationals and are
//! only converted back to EDUs at the edges.

use num_rational::Rational64;

use super::{Edu, NoteType};

/// Duration as an exact fraction of a whole note
pub type Fraction = Rational64;

/// Conversions between whole-note fractions and EDU counts
pub trait EduFraction: Sized {
    fn from_edu(edu: Edu) -> Self;
    fn zero() -> Self;
    fn one() -> Self;

    /// Truncated EDU value of this duration
    fn calc_edu_duration(&self) -> Edu;
    fn is_zero_value(&self) -> bool;
}

impl EduFraction for Fraction {
    fn from_edu(edu: Edu) -> Self {
        Fraction::new(i64::from(edu), i64::from(NoteType::Whole.edu()))
    }

    fn zero() -> Self {
        Fraction::from_integer(0)
    }

    fn one() -> Self {
        Fraction::from_integer(1)
    }

    fn calc_edu_duration(&self) -> Edu {
        (*self * Fraction::from_integer(i64::from(NoteType::Whole.edu()))).to_integer() as Edu
    }

    fn is_zero_value(&self) -> bool {
        *self.numer() == 0
    }
}
