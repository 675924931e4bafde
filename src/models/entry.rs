//! Entries (notes, chords, rests) and the notes they own

use serde::{Deserialize, Serialize};

use super::{
    calc_note_info_from_edu, Cmper, Edu, EduFraction, EntryNumber, Evpu, Fraction, LayerIndex,
    NoteNumber, NoteType,
};

fn default_true() -> bool {
    true
}

/// One note of an entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    /// Stable id; unchanged when the chord's notes are re-sorted
    pub note_id: NoteNumber,
    /// Diatonic displacement relative to the tonic
    pub harm_lev: i32,
    /// Chromatic alteration relative to the key signature
    pub harm_alt: i32,
    pub show_acci: bool,
    pub tie_start: bool,
    pub tie_end: bool,
    pub cross_staff: bool,
    /// Notehead flipped to the far side of an up stem (part of a second)
    pub up_stem_second: bool,
    /// Notehead flipped to the far side of a down stem (part of a second)
    pub down_stem_second: bool,
    /// For split stems, whether this note hangs on the up stem
    pub up_split_stem: bool,
}

/// Every (staff, measure, layer) at which an entry occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryLocation {
    pub staff: Cmper,
    pub measure: Cmper,
    pub layer: LayerIndex,
}

/// A notational event in one voice.
///
/// Immutable after load except for `locations`, which the finalize pass fills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub entnum: EntryNumber,
    /// Previous entry in the raw list, 0 if none
    pub prev: EntryNumber,
    /// Next entry in the raw list, 0 if none
    pub next: EntryNumber,
    /// Symbolic duration, before any tuplet is applied
    pub duration: Edu,
    #[serde(default = "default_true")]
    pub is_valid: bool,
    /// False for rests
    pub is_note: bool,
    pub voice2: bool,
    /// This voice 1 entry launches a voice 2 sequence after it
    pub v2_launch: bool,
    pub grace_note: bool,
    pub is_hidden: bool,
    /// A beam break: this entry starts a new beam (or stands alone)
    pub beam: bool,
    pub stem_detail: bool,
    /// Secondary beam break details exist
    pub sec_beam: bool,
    pub note_detail: bool,
    pub tuplet_start: bool,
    pub float_rest: bool,
    pub freeze_stem: bool,
    /// Stem direction as last computed by the authoring program
    pub up_stem: bool,
    pub flip_tie: bool,
    pub split_stem: bool,
    pub no_leger: bool,
    /// Manual horizontal offset of the entry
    pub h_offset: Evpu,
    /// Notes from lowest to highest
    pub notes: Vec<Note>,
    #[serde(skip)]
    pub(crate) locations: Vec<EntryLocation>,
}

impl Entry {
    pub fn num_notes(&self) -> usize {
        self.notes.len()
    }

    /// Undotted note value of the symbolic duration
    pub fn calc_note_type(&self) -> Option<NoteType> {
        calc_note_info_from_edu(self.duration).map(|(note_type, _)| note_type)
    }

    pub fn calc_augmentation_dots(&self) -> u32 {
        calc_note_info_from_edu(self.duration).map(|(_, dots)| dots).unwrap_or(0)
    }

    /// Symbolic duration as a fraction of a whole note
    pub fn calc_fraction(&self) -> Fraction {
        Fraction::from_edu(self.duration)
    }

    /// Notes shorter than a whole note are drawn with a stem
    pub fn has_stem(&self) -> bool {
        self.is_note && self.duration < NoteType::Whole.edu()
    }

    pub fn is_possible_full_measure_rest(&self) -> bool {
        !self.is_note && !self.is_hidden && self.duration == NoteType::Whole.edu()
    }

    /// Locations filled by the finalize pass
    pub fn locations(&self) -> &[EntryLocation] {
        &self.locations
    }
}
