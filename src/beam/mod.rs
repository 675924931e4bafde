//! Beam grouping
//!
//! Beam links are computed on demand from cursor neighbors: an entry beams
//! with its nearest beamable neighbor in the same voice unless a beam break,
//! a grace boundary or the rest policy cuts the link.

mod barline;
mod feather;
mod secondary;
mod stem;

use crate::models::{calc_number_of_beams_in_edu, CustomStem, DocumentPtr, NoteType, PartId};
use crate::navigator::EntryCursor;

pub use feather::FeatheredBeam;

type Step = fn(&EntryCursor) -> Option<EntryCursor>;
type BeamStep = fn(&EntryCursor, bool) -> Option<EntryCursor>;

/// A custom stem with no shape, or a blank one, hides the stem
pub fn calc_is_hidden_stem(document: &DocumentPtr, part: PartId, stem: &CustomStem) -> bool {
    if stem.shape_def != 0 {
        if let Some(shape) = document.shape_def(part, stem.shape_def) {
            return shape.blank;
        }
    }
    true
}

impl EntryCursor {
    /// Shorter than a quarter on a staff that draws stems and beams
    pub fn can_be_beamed(&self) -> bool {
        if self.entry().duration >= NoteType::Quarter.edu() {
            return false;
        }
        let staff = self.current_staff();
        !(staff.hide_stems || staff.hide_beams)
    }

    pub fn calc_beam_must_start_here(&self) -> bool {
        self.entry().beam || !self.can_be_beamed()
    }

    fn iterate_potential_entry_in_beam(&self, step: Step) -> Option<EntryCursor> {
        let mut result = step(self)?;
        if !result.can_be_beamed() {
            return None;
        }
        let this_grace = self.entry().grace_note;
        // a grace never beams past a non-grace
        if this_grace && !result.entry().grace_note {
            return None;
        }
        if !this_grace && result.entry().grace_note {
            loop {
                if result.calc_beam_must_start_here() {
                    return None;
                }
                result = step(&result)?;
                if !result.entry().grace_note {
                    break;
                }
            }
        }
        Some(result)
    }

    /// Next beam candidate, ignoring the rest policy
    pub fn next_potential_in_beam(&self, include_hidden: bool) -> Option<EntryCursor> {
        let next = self.iterate_potential_entry_in_beam(EntryCursor::next_same_v)?;
        if next.entry().beam {
            return None;
        }
        if next.entry().is_hidden && !include_hidden {
            return next.next_potential_in_beam(include_hidden);
        }
        Some(next)
    }

    /// Previous beam candidate, ignoring the rest policy
    pub fn previous_potential_in_beam(&self, include_hidden: bool) -> Option<EntryCursor> {
        if self.entry().beam {
            return None;
        }
        let prev = self.iterate_potential_entry_in_beam(EntryCursor::previous_same_v)?;
        if prev.entry().is_hidden && !include_hidden {
            return prev.previous_potential_in_beam(include_hidden);
        }
        Some(prev)
    }

    fn iterate_beam_group(&self, include_hidden: bool, step: BeamStep, reverse: BeamStep) -> Option<EntryCursor> {
        if !self.can_be_beamed() {
            return None;
        }
        let result = step(self, include_hidden)?;
        if self.calc_displays_as_rest() || result.calc_displays_as_rest() {
            let extend_over_rests = self.document().beam_options(self.requested_part()).extend_beams_over_rests;
            let search_for_note = |from: &EntryCursor, iterate: BeamStep| {
                let mut current = Some(from.clone());
                while let Some(cursor) = current {
                    if !cursor.calc_displays_as_rest() {
                        return true;
                    }
                    current = iterate(&cursor, include_hidden);
                }
                false
            };
            let note_found = search_for_note(&result, step);
            if !note_found && !extend_over_rests {
                return None;
            }
            let reverse_note_found = search_for_note(self, reverse);
            if !reverse_note_found && !extend_over_rests {
                return None;
            }
            if extend_over_rests && !note_found && !reverse_note_found {
                return None;
            }
        }
        Some(result)
    }

    /// Next entry beamed to this one within the measure
    pub fn next_in_beam_group(&self, include_hidden: bool) -> Option<EntryCursor> {
        self.iterate_beam_group(
            include_hidden,
            EntryCursor::next_potential_in_beam,
            EntryCursor::previous_potential_in_beam,
        )
    }

    /// Previous entry beamed to this one within the measure
    pub fn previous_in_beam_group(&self, include_hidden: bool) -> Option<EntryCursor> {
        self.iterate_beam_group(
            include_hidden,
            EntryCursor::previous_potential_in_beam,
            EntryCursor::next_potential_in_beam,
        )
    }

    /// Visible beamable entry with no beamed predecessor and a beamed successor
    pub fn calc_is_beam_start(&self) -> bool {
        if self.entry().is_hidden || !self.can_be_beamed() {
            return false;
        }
        self.previous_in_beam_group(false).is_none() && self.next_in_beam_group(false).is_some()
    }

    pub fn calc_unbeamed(&self) -> bool {
        if !self.can_be_beamed() {
            return true;
        }
        let next = self.next_in_beam_group(false);
        let prev = self.previous_in_beam_group(false);
        if self.entry().is_hidden {
            return next.is_none() || prev.is_none();
        }
        next.is_none() && prev.is_none()
    }

    /// First entry of this entry's beam, or the entry itself if unbeamed
    pub fn find_beam_start_or_current(&self) -> EntryCursor {
        if !self.can_be_beamed() {
            return self.clone();
        }
        let mut start = self.clone();
        while let Some(prev) = start.previous_in_beam_group(false) {
            start = prev;
        }
        start
    }

    /// Last entry of this entry's beam; `None` if unbeamed
    pub fn find_beam_end(&self) -> Option<EntryCursor> {
        if self.calc_unbeamed() {
            return None;
        }
        let Some(mut end) = self.next_in_beam_group(false) else {
            return self.previous_in_beam_group(false).map(|_| self.clone());
        };
        while let Some(next) = end.next_in_beam_group(false) {
            end = next;
        }
        Some(end)
    }

    /// Entries of the beam group from this entry forward
    pub fn beam_group(&self) -> impl Iterator<Item = EntryCursor> {
        std::iter::successors(Some(self.clone()), |cursor| cursor.next_in_beam_group(false))
    }

    /// Beams (or flags) the symbolic duration calls for
    pub fn calc_number_of_beams(&self) -> u32 {
        calc_number_of_beams_in_edu(self.entry().duration)
    }

    /// Beams actually drawn through this entry; rests carry only the primary
    /// beam unless secondary beams extend over rests
    pub fn calc_visible_beams(&self) -> u32 {
        if self.calc_displays_as_rest()
            && !self.document().beam_options(self.requested_part()).extend_sec_beams_over_rests
        {
            return 1;
        }
        self.calc_number_of_beams()
    }
}
