//! Secondary beams: where they start, end and stub.
//!
//! Beam numbers count from 1 (the primary beam). A return value of 0 means
//! "no secondary beam starts (or ends) here".

use crate::models::{calc_note_info_from_edu, EduFraction};
use crate::navigator::EntryCursor;

use super::Step;

impl EntryCursor {
    /// Walk from this entry toward `target`, looking for an entry that cuts
    /// the secondary beams back to the primary.
    ///
    /// `Some(0)` when this entry itself cuts, `Some(2)` when an entry on the
    /// way does, `None` when nothing does.
    fn iterate_find_rests_in_secondary_beam(&self, target: &EntryCursor, step: Step) -> Option<u32> {
        let extend_over_rests = self.document().beam_options(self.requested_part()).extend_sec_beams_over_rests;
        let is_rest = self.calc_displays_as_rest();
        let cuts = |cursor: &EntryCursor| cursor.entry().is_hidden || (!extend_over_rests && is_rest);
        if cuts(self) {
            return Some(0);
        }
        let mut current = step(self);
        while let Some(cursor) = current {
            if cuts(&cursor) && self.calc_number_of_beams() >= 2 {
                return Some(2);
            }
            if cursor.is_same_entry(target) {
                break;
            }
            current = step(&cursor);
        }
        None
    }

    /// Lowest beam number that starts on this entry, or 0
    pub fn calc_lowest_beam_start(&self) -> u32 {
        if self.entry().is_hidden || !self.can_be_beamed() {
            return 0;
        }
        let Some(prev) = self.previous_in_beam_group(false) else {
            return u32::from(self.next_in_beam_group(false).is_some());
        };
        if let Some(found) = self.iterate_find_rests_in_secondary_beam(&prev, EntryCursor::previous_same_v) {
            return found;
        }
        let mut secondary_break = 0;
        if self.entry().sec_beam {
            if let Some(breaks) = self.document().secondary_beam_break(self.requested_part(), self.entry_number()) {
                secondary_break = breaks.calc_lowest_break();
                if secondary_break < 2 {
                    secondary_break = 0;
                }
            }
        }
        let visible = self.calc_visible_beams();
        let prev_visible = prev.calc_visible_beams();
        if visible > prev_visible && (secondary_break == 0 || secondary_break > prev_visible + 1) {
            secondary_break = prev_visible + 1;
        }
        secondary_break
    }

    /// Lowest beam number that ends on this entry, or 0
    pub fn calc_lowest_beam_end(&self) -> u32 {
        if self.entry().is_hidden || !self.can_be_beamed() {
            return 0;
        }
        let Some(next) = self.next_in_beam_group(false) else {
            return u32::from(self.previous_in_beam_group(false).is_some());
        };
        if let Some(found) = self.iterate_find_rests_in_secondary_beam(&next, EntryCursor::next_same_v) {
            return found;
        }
        let number_of_beams = self.calc_visible_beams();
        let next_start = next.calc_lowest_beam_start();
        if next_start != 0 && next_start <= number_of_beams {
            return next_start;
        }
        let next_visible = next.calc_visible_beams();
        if number_of_beams > next_visible {
            return next_visible + 1;
        }
        0
    }

    /// Lowest beam drawn as a stub on this entry, or 0
    pub fn calc_lowest_beam_stub(&self) -> u32 {
        let start = self.calc_lowest_beam_start();
        let end = self.calc_lowest_beam_end();
        if start != 0 && end != 0 {
            start.max(end)
        } else {
            0
        }
    }

    /// Whether beam stubs on this entry point left
    pub fn calc_beam_stub_is_left(&self) -> bool {
        let entry = self.entry();
        if entry.stem_detail {
            if let Some(direction) = self.document().beam_stub_direction(self.requested_part(), entry.entnum) {
                return direction.left;
            }
        }
        let Some(prev) = self.previous_in_beam_group(false) else {
            return false;
        };
        let Some(next) = self.next_in_beam_group(false) else {
            return true;
        };

        let number_of_beams = self.calc_number_of_beams();
        if number_of_beams >= self.calc_lowest_beam_stub() {
            let extend_over_rests = self.document().beam_options(self.requested_part()).extend_sec_beams_over_rests;
            let terminates = |lowest: u32, neighbor: &EntryCursor| {
                if lowest < number_of_beams {
                    return true;
                }
                if lowest == number_of_beams && neighbor.calc_number_of_beams() == number_of_beams {
                    return !(neighbor.calc_displays_as_rest() && !extend_over_rests);
                }
                false
            };
            if terminates(self.calc_lowest_beam_start(), &prev) {
                return false;
            }
            if terminates(self.calc_lowest_beam_end(), &next) {
                return true;
            }
        }

        let dots = |cursor: &EntryCursor| {
            calc_note_info_from_edu(cursor.info().actual_duration.calc_edu_duration()).map_or(0, |(_, dots)| dots)
        };
        let (prev_dots, next_dots) = (dots(&prev), dots(&next));
        if prev_dots > 0 || next_dots > 0 {
            return prev_dots >= next_dots;
        }
        false
    }
}
