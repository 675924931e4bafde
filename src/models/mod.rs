//! Record model for a serialized score document
//!
//! Records are loaded once into a [`RawDocument`] and finalized into an
//! immutable [`Document`]. Everything above this layer (frames, cursors,
//! beaming, ties) only ever borrows from the finalized document.

pub mod details;
pub mod document;
pub mod entry;
pub mod fraction;
pub mod key;
pub mod options;
pub mod others;

pub use details::*;
pub use document::{Document, DocumentPtr, RawDocument};
pub use entry::{Entry, EntryLocation, Note};
pub use fraction::{EduFraction, Fraction};
pub use key::KeySignature;
pub use options::*;
pub use others::*;

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Stable integer key into the document's record store
pub type Cmper = u16;
pub type PartId = Cmper;
pub type StaffId = Cmper;
pub type MeasureId = Cmper;
pub type EntryNumber = u32;
pub type NoteNumber = u16;
pub type LayerIndex = usize;
pub type ClefIndex = usize;

/// Symbolic duration unit: a quarter note is 1024 EDUs
pub type Edu = i32;
/// Engraving unit: 288 per inch
pub type Evpu = i32;
pub type EvpuFloat = f64;

/// The score itself; parts inherit every record they do not override
pub const SCORE_PARTID: PartId = 0;

/// Number of layers a staff can hold in one measure
pub const MAX_LAYERS: usize = 4;

/// Note values expressed as their EDU duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum NoteType {
    Note4096th = 0x1,
    Note2048th = 0x2,
    Note1024th = 0x4,
    Note512th = 0x8,
    Note256th = 0x10,
    Note128th = 0x20,
    Note64th = 0x40,
    Note32nd = 0x80,
    Note16th = 0x100,
    Eighth = 0x200,
    Quarter = 0x400,
    Half = 0x800,
    Whole = 0x1000,
    Breve = 0x2000,
    Longa = 0x4000,
    Maxima = 0x8000,
}

impl NoteType {
    pub const fn edu(self) -> Edu {
        self as Edu
    }

    fn from_power_of_two(value: Edu) -> Option<NoteType> {
        let note_type = match value {
            0x1 => NoteType::Note4096th,
            0x2 => NoteType::Note2048th,
            0x4 => NoteType::Note1024th,
            0x8 => NoteType::Note512th,
            0x10 => NoteType::Note256th,
            0x20 => NoteType::Note128th,
            0x40 => NoteType::Note64th,
            0x80 => NoteType::Note32nd,
            0x100 => NoteType::Note16th,
            0x200 => NoteType::Eighth,
            0x400 => NoteType::Quarter,
            0x800 => NoteType::Half,
            0x1000 => NoteType::Whole,
            0x2000 => NoteType::Breve,
            0x4000 => NoteType::Longa,
            0x8000 => NoteType::Maxima,
            _ => return None,
        };
        Some(note_type)
    }
}

/// Split an EDU duration into its undotted note value and augmentation dot count
///
/// Returns `None` for durations outside `1..0x10000`.
pub fn calc_note_info_from_edu(duration: Edu) -> Option<(NoteType, u32)> {
    if !(1..0x10000).contains(&duration) {
        return None;
    }
    let mut value = duration;
    let mut msb: Edu = 1;
    while value > 1 {
        value >>= 1;
        msb <<= 1;
    }
    let mut dots = 0;
    let mut dot_bit = msb >> 1;
    while dot_bit != 0 && duration & dot_bit != 0 {
        dots += 1;
        dot_bit >>= 1;
    }
    NoteType::from_power_of_two(msb).map(|note_type| (note_type, dots))
}

/// Number of beams (flags) a duration carries: 1 for an 8th, 2 for a 16th, ...
pub fn calc_number_of_beams_in_edu(duration: Edu) -> u32 {
    if duration <= 0 {
        return 0;
    }
    let mut result = 0;
    let mut duration = duration;
    while duration < NoteType::Quarter.edu() {
        result += 1;
        duration <<= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_info_from_edu() {
        assert_eq!(calc_note_info_from_edu(1024), Some((NoteType::Quarter, 0)));
        assert_eq!(calc_note_info_from_edu(1536), Some((NoteType::Quarter, 1)));
        assert_eq!(calc_note_info_from_edu(1792), Some((NoteType::Quarter, 2)));
        assert_eq!(calc_note_info_from_edu(384), Some((NoteType::Note16th, 1)));
        assert_eq!(calc_note_info_from_edu(0), None);
        assert_eq!(calc_note_info_from_edu(0x10000), None);
    }

    #[test]
    fn test_number_of_beams() {
        assert_eq!(calc_number_of_beams_in_edu(1024), 0);
        assert_eq!(calc_number_of_beams_in_edu(768), 1);
        assert_eq!(calc_number_of_beams_in_edu(512), 1);
        assert_eq!(calc_number_of_beams_in_edu(256), 2);
        assert_eq!(calc_number_of_beams_in_edu(128), 3);
    }
}
