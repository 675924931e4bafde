//! Linear key signatures
//!
//! Only the small slice of key arithmetic the pitch comparisons need: tonal
//! center and staff position of a note.

use serde::{Deserialize, Serialize};

const SHARP_ORDER: [i32; 7] = [3, 0, 4, 1, 5, 2, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySignature {
    /// Sharps (positive) or flats (negative), -7..=7
    pub key_fifths: i32,
    pub minor: bool,
}

impl KeySignature {
    /// Scale step (0 = C) of the tonic
    pub fn calc_tonal_center_index(&self) -> i32 {
        let major = (self.key_fifths * 4).rem_euclid(7);
        if self.minor {
            (major + 5).rem_euclid(7)
        } else {
            major
        }
    }

    /// Alteration the key applies to a C-based scale step
    pub fn calc_alteration_on_step(&self, step: i32) -> i32 {
        let step = step.rem_euclid(7);
        let count = self.key_fifths.unsigned_abs().min(7) as usize;
        if self.key_fifths > 0 {
            i32::from(SHARP_ORDER[..count].contains(&step))
        } else {
            let flats: Vec<i32> = SHARP_ORDER.iter().rev().take(count).copied().collect();
            -i32::from(flats.contains(&step))
        }
    }

    /// Diatonic displacement from middle C for a tonic-relative displacement.
    /// The tonic sits at or above middle C.
    pub fn calc_displacement_from_middle_c(&self, harm_lev: i32) -> i32 {
        self.calc_tonal_center_index() + harm_lev
    }
}
