use std::fmt;

use super::EntryCursor;
use crate::models::{Note, StaffId, StaffList};

/// Staff position of middle C when the clef is unknown (treble clef)
const DEFAULT_MIDDLE_C_POS: i32 = -10;

/// A note of an entry, addressed by its index in the entry's note list
#[derive(Clone, PartialEq, Eq)]
pub struct NoteCursor {
    entry: EntryCursor,
    note_index: usize,
}

impl NoteCursor {
    /// # Panics
    ///
    /// Panics if `note_index` is outside the entry's notes.
    pub fn new(entry: EntryCursor, note_index: usize) -> Self {
        assert!(
            note_index < entry.entry().num_notes(),
            "note index {} is out of range for entry {} with {} notes",
            note_index,
            entry.entry_number(),
            entry.entry().num_notes()
        );
        NoteCursor { entry, note_index }
    }

    pub fn entry_cursor(&self) -> &EntryCursor {
        &self.entry
    }

    pub fn note_index(&self) -> usize {
        self.note_index
    }

    pub fn note(&self) -> &Note {
        &self.entry.entry().notes[self.note_index]
    }

    /// Next higher note of the chord
    pub fn next(&self) -> Option<NoteCursor> {
        (self.note_index + 1 < self.entry.entry().num_notes())
            .then(|| NoteCursor { entry: self.entry.clone(), note_index: self.note_index + 1 })
    }

    /// Next lower note of the chord
    pub fn previous(&self) -> Option<NoteCursor> {
        (self.note_index > 0).then(|| NoteCursor { entry: self.entry.clone(), note_index: self.note_index - 1 })
    }

    pub fn is_same_note(&self, other: &NoteCursor) -> bool {
        self.entry.is_same_entry(&other.entry) && self.note().note_id == other.note().note_id
    }

    /// Staff the note is drawn on
    pub fn calc_staff(&self) -> StaffId {
        let note = self.note();
        if note.cross_staff {
            let document = self.entry.document();
            let part = self.entry.requested_part();
            if document.note_rest_options(part).do_cross_staff_notes {
                if let Some(cross) = document.cross_staff(part, self.entry.entry_number(), note.note_id) {
                    return cross.staff;
                }
            }
        }
        self.entry.staff()
    }

    /// 1 if the note is moved to a staff above, -1 below, 0 if it stays home
    pub fn calc_cross_staff_direction(&self, staff_list: Option<&StaffList>) -> i32 {
        let Some(staff_list) = staff_list else {
            return 0;
        };
        let Some(home) = staff_list.index_of(self.entry.staff()) else {
            return 0;
        };
        let actual = staff_list.index_of(self.calc_staff()).unwrap_or(home);
        match actual.cmp(&home) {
            std::cmp::Ordering::Less => 1,
            std::cmp::Ordering::Greater => -1,
            std::cmp::Ordering::Equal => 0,
        }
    }

    /// Staff position relative to the top line, on the entry's own staff
    pub fn calc_staff_position(&self) -> i32 {
        let document = self.entry.document();
        let middle_c_pos = document
            .clef_options(self.entry.requested_part())
            .clef_defs
            .get(self.entry.info().clef_index)
            .map_or(DEFAULT_MIDDLE_C_POS, |clef| clef.middle_c_pos);
        middle_c_pos + self.entry.key_signature().calc_displacement_from_middle_c(self.note().harm_lev)
    }

    /// Concert pitch as (diatonic displacement from middle C, chromatic alteration)
    pub fn calc_pitch(&self) -> (i32, i32) {
        let key = self.entry.key_signature();
        let displacement = key.calc_displacement_from_middle_c(self.note().harm_lev);
        (displacement, key.calc_alteration_on_step(displacement) + self.note().harm_alt)
    }

    pub fn is_same_pitch(&self, other: &NoteCursor) -> bool {
        self.calc_pitch() == other.calc_pitch()
    }

    /// Same raw pitch values, without resolving the key
    pub fn is_same_pitch_values(&self, other: &NoteCursor) -> bool {
        self.note().harm_lev == other.note().harm_lev && self.note().harm_alt == other.note().harm_alt
    }

    /// The note of `entry` with this note's pitch, matching unison occurrences in order
    pub fn find_equal_pitch(&self, entry: &EntryCursor) -> Option<NoteCursor> {
        if !self.entry.entry().is_note || !entry.entry().is_note || entry.entry().num_notes() == 0 {
            return None;
        }
        let mut occurrence = 1;
        let mut prev = self.previous();
        while let Some(lower) = prev {
            if !self.is_same_pitch_values(&lower) {
                break;
            }
            occurrence += 1;
            prev = lower.previous();
        }
        let mut candidate = Some(NoteCursor::new(entry.clone(), 0));
        while let Some(mut note) = candidate {
            if note.is_same_pitch(self) {
                for _ in 1..occurrence {
                    match note.next() {
                        Some(next) if next.is_same_pitch_values(&note) => note = next,
                        _ => break,
                    }
                }
                return Some(note);
            }
            candidate = note.next();
        }
        None
    }
}

impl fmt::Debug for NoteCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteCursor")
            .field("entry", &self.entry)
            .field("note_index", &self.note_index)
            .finish()
    }
}
