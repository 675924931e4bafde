use std::rc::Rc;

use super::EntryFramePtr;
use crate::error::{report, IntegrityError, Result};
use crate::models::{
    calc_note_info_from_edu, BeamExtension, DownStem, EduFraction, Fraction, NoteType, TupletDef,
    UpStem,
};
use crate::navigator::{EntryCursor, NoteCursor};

/// A tuplet as placed in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct TupletInfo {
    pub tuplet: TupletDef,
    pub start_index: usize,
    /// Index of the last entry; the last entry of its voice if the tuplet is incomplete
    pub end_index: usize,
    pub start_dura: Fraction,
    /// Elapsed duration after the last entry
    pub end_dura: Fraction,
    pub voice2: bool,
}

impl TupletInfo {
    pub fn num_entries(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    pub fn includes(&self, index: usize) -> bool {
        (self.start_index..=self.end_index).contains(&index)
    }

    /// A tuplet whose real length is zero, holding exactly one entry
    pub fn calc_is_zero_length(&self) -> bool {
        self.tuplet.calc_ratio().map_or(true, |ratio| ratio.is_zero_value())
    }

    /// An invisible tuplet of beamed notes used in place of a measured tremolo
    pub fn calc_is_tremolo(&self, frame: &EntryFramePtr) -> bool {
        if self.num_entries() < 2 || !self.tuplet.is_invisible() {
            return false;
        }
        let first = EntryCursor::new(Rc::clone(frame), self.start_index);
        let target_actual = first.info().actual_duration;
        let target_notated = first.entry().duration;
        if target_actual < Fraction::from_edu(target_notated) * Fraction::from_integer(2) {
            return false;
        }
        let uniform = frame.entries()[self.start_index + 1..=self.end_index]
            .iter()
            .all(|info| info.actual_duration == target_actual && info.entry().duration == target_notated);
        if !uniform {
            return false;
        }

        // the tuplet's entries must form one contiguous beamed chain
        let mut chain = first.clone();
        for index in self.start_index + 1..=self.end_index {
            match chain.next_in_beam_group(false) {
                Some(next) if next.index() == index => chain = next,
                _ => return false,
            }
        }

        // shorter than a half, at least one beam must be detached
        if self.tuplet.calc_reference_duration().calc_edu_duration() < NoteType::Half.edu() {
            let target_type = calc_note_info_from_edu(target_notated).map_or(0, |(note_type, _)| note_type.edu());
            let detached = |extension: Option<&BeamExtension>| {
                extension.is_some_and(|ext| {
                    ext.mask >= target_type as u32 && ext.left_offset >= 0 && ext.right_offset <= 0
                })
            };
            let document = frame.document();
            let part = frame.requested_part();
            let entnum = first.entry_number();
            if !detached(document.beam_extension::<UpStem>(part, entnum))
                && !detached(document.beam_extension::<DownStem>(part, entnum))
            {
                return false;
            }
        }
        true
    }

    /// An invisible zero-length tuplet that turns one hidden note into a beam
    /// stub reaching over the barline, to the left or to the right
    pub fn calc_creates_singleton(&self, frame: &EntryFramePtr, left: bool) -> bool {
        if self.start_index != self.end_index || !self.tuplet.is_invisible() || !self.calc_is_zero_length() {
            return false;
        }
        let cursor = EntryCursor::new(Rc::clone(frame), self.start_index);
        if !cursor.calc_is_beam_start() {
            return false;
        }
        let hidden = if left { Some(cursor) } else { cursor.next_in_beam_group(false) };
        let Some(hidden) = hidden else {
            return false;
        };
        let entry = hidden.entry();
        if !entry.is_note || entry.is_hidden || !entry.no_leger || !entry.stem_detail || !entry.note_detail {
            return false;
        }
        if (left && entry.h_offset >= 0) || (!left && entry.h_offset <= 0) {
            return false;
        }
        let document = frame.document();
        let part = frame.requested_part();
        let custom_stem = document
            .custom_stem::<DownStem>(part, entry.entnum)
            .or_else(|| document.custom_stem::<UpStem>(part, entry.entnum));
        match custom_stem {
            Some(stem) if crate::beam::calc_is_hidden_stem(document, part, stem) => {}
            _ => return false,
        }
        (0..entry.num_notes()).all(|note_index| {
            let note = NoteCursor::new(hidden.clone(), note_index);
            document
                .note_alterations(part, entry.entnum, note.note().note_id)
                .is_some_and(|alterations| alterations.hides_notehead())
        })
    }

    pub fn calc_creates_singleton_beam_left(&self, frame: &EntryFramePtr) -> bool {
        self.calc_creates_singleton(frame, true)
    }

    pub fn calc_creates_singleton_beam_right(&self, frame: &EntryFramePtr) -> bool {
        self.calc_creates_singleton(frame, false)
    }

    /// An invisible tuplet spanning the whole measure of a staff with its own
    /// time signature, used to stretch the staff's time
    pub fn calc_creates_time_stretch(&self, frame: &EntryFramePtr) -> Result<bool> {
        if !self.tuplet.is_invisible() {
            return Ok(false);
        }
        let staff = frame.start_staff();
        if !staff.float_time {
            return Ok(false);
        }
        let document = frame.document();
        let part = frame.requested_part();
        let Some(measure) = document.measure(part, frame.measure()) else {
            report(IntegrityError::MissingRecord {
                kind: "measure",
                key: frame.measure().to_string(),
                referrer: format!("tuplet on entry {}", self.tuplet.entnum),
            })?;
            return Ok(false);
        };
        if self.tuplet.calc_reference_duration() != measure.calc_duration() {
            return Ok(false);
        }
        let display_duration = document
            .independent_time_sig(part, frame.staff(), frame.measure())
            .map_or_else(|| measure.calc_duration(), |time_sig| time_sig.calc_duration());
        Ok(self.tuplet.calc_display_duration() == display_duration)
    }
}
