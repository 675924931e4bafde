//! Cursors over entry frames
//!
//! An [`EntryCursor`] is a (frame, index) pair. It owns nothing but a shared
//! handle to its frame. Neighbor queries return `None` at a sequence
//! boundary; callers use that as their loop terminator.

mod note;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::{report, IntegrityError, Result};
use crate::frame::{EntryFramePtr, EntryInfo, FrameHoldContext};
use crate::models::{
    DocumentPtr, Entry, EntryNumber, Fraction, KeySignature, LayerIndex, MeasureId, PartId,
    StaffComposite, StaffId, StaffList, MAX_LAYERS,
};

pub use note::NoteCursor;

#[derive(Clone)]
pub struct EntryCursor {
    frame: EntryFramePtr,
    index: usize,
}

impl EntryCursor {
    /// # Panics
    ///
    /// Panics if `index` is outside the frame.
    pub fn new(frame: EntryFramePtr, index: usize) -> Self {
        assert!(
            index < frame.len(),
            "entry index {} is out of range for a frame of {} entries",
            index,
            frame.len()
        );
        EntryCursor { frame, index }
    }

    /// Find an entry by number in any layer of a staff and measure
    pub fn from_position(
        document: &DocumentPtr,
        part: PartId,
        staff: StaffId,
        measure: MeasureId,
        entnum: EntryNumber,
    ) -> Result<Option<EntryCursor>> {
        let Some(context) = FrameHoldContext::new(document, part, staff, measure) else {
            return Ok(None);
        };
        let mut result = None;
        context.iterate_all_entries(|cursor| {
            if cursor.entry_number() == entnum {
                result = Some(cursor.clone());
                return false;
            }
            true
        })?;
        Ok(result)
    }

    pub fn frame(&self) -> &EntryFramePtr {
        &self.frame
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn info(&self) -> &EntryInfo {
        &self.frame.entries()[self.index]
    }

    pub fn entry(&self) -> &Entry {
        self.info().entry()
    }

    pub fn entry_number(&self) -> EntryNumber {
        self.entry().entnum
    }

    pub fn document(&self) -> &DocumentPtr {
        self.frame.document()
    }

    pub fn requested_part(&self) -> PartId {
        self.frame.requested_part()
    }

    pub fn staff(&self) -> StaffId {
        self.frame.staff()
    }

    pub fn measure(&self) -> MeasureId {
        self.frame.measure()
    }

    pub fn layer_index(&self) -> LayerIndex {
        self.frame.layer_index()
    }

    pub fn key_signature(&self) -> &KeySignature {
        &self.frame.key_signature
    }

    /// Composite staff in effect at this entry
    pub fn current_staff(&self) -> &StaffComposite {
        self.frame.staff_at(self.info().staff_index)
    }

    /// Both cursors reach the same underlying entry, whatever frame they came through
    pub fn is_same_entry(&self, other: &EntryCursor) -> bool {
        self.entry_number() == other.entry_number()
    }

    fn at(&self, index: usize) -> EntryCursor {
        EntryCursor { frame: Rc::clone(&self.frame), index }
    }

    pub fn next_in_frame(&self) -> Option<EntryCursor> {
        (self.index + 1 < self.frame.len()).then(|| self.at(self.index + 1))
    }

    pub fn previous_in_frame(&self) -> Option<EntryCursor> {
        (self.index > 0).then(|| self.at(self.index - 1))
    }

    /// Next entry in the same voice; voice 1 skips a launched voice 2 sequence
    pub fn next_same_v(&self) -> Option<EntryCursor> {
        let mut next = self.next_in_frame();
        let entry = self.entry();
        if entry.voice2 {
            return next.filter(|cursor| cursor.entry().voice2);
        }
        if entry.v2_launch {
            while let Some(cursor) = next.as_ref().filter(|cursor| cursor.entry().voice2) {
                next = cursor.next_in_frame();
            }
        }
        next
    }

    pub fn previous_same_v(&self) -> Option<EntryCursor> {
        let mut prev = self.previous_in_frame();
        if self.entry().voice2 {
            return prev.filter(|cursor| cursor.entry().voice2);
        }
        while let Some(cursor) = prev.as_ref().filter(|cursor| cursor.entry().voice2) {
            prev = cursor.previous_in_frame();
        }
        prev
    }

    pub fn next_same_v_no_grace(&self) -> Option<EntryCursor> {
        let mut next = self.next_same_v();
        while let Some(cursor) = next {
            if !cursor.entry().grace_note {
                return Some(cursor);
            }
            next = cursor.next_same_v();
        }
        None
    }

    pub fn previous_same_v_no_grace(&self) -> Option<EntryCursor> {
        let mut prev = self.previous_same_v();
        while let Some(cursor) = prev {
            if !cursor.entry().grace_note {
                return Some(cursor);
            }
            prev = cursor.previous_same_v();
        }
        None
    }

    /// Next entry of voice 1 or 2, regardless of launch boundaries
    pub fn next_in_voice(&self, voice: u8) -> Option<EntryCursor> {
        let for_v2 = voice == 2;
        let mut next = self.next_in_frame();
        while let Some(cursor) = next.as_ref().filter(|cursor| cursor.entry().voice2 != for_v2) {
            next = cursor.next_in_frame();
        }
        next
    }

    pub fn previous_in_voice(&self, voice: u8) -> Option<EntryCursor> {
        let for_v2 = voice == 2;
        let mut prev = self.previous_in_frame();
        while let Some(cursor) = prev.as_ref().filter(|cursor| cursor.entry().voice2 != for_v2) {
            prev = cursor.previous_in_frame();
        }
        prev
    }

    /// Next entry in the layer, continuing into the next measure
    pub fn next_in_layer(&self) -> Result<Option<EntryCursor>> {
        if let Some(next) = self.next_in_frame() {
            return Ok(Some(next));
        }
        Ok(self
            .frame
            .next()?
            .filter(|frame| !frame.is_empty())
            .map(|frame| EntryCursor::new(frame, 0)))
    }

    /// Previous entry in the layer, continuing into the previous measure
    pub fn previous_in_layer(&self) -> Result<Option<EntryCursor>> {
        if let Some(prev) = self.previous_in_frame() {
            return Ok(Some(prev));
        }
        Ok(self.frame.previous()?.filter(|frame| !frame.is_empty()).map(|frame| {
            let last = frame.len() - 1;
            EntryCursor::new(frame, last)
        }))
    }

    /// Ordinal of a grace note counting back from the entry it precedes
    pub fn calc_reverse_grace_index(&self) -> u32 {
        self.info().reverse_grace_index
    }

    /// Index of the next tuplet starting on this entry after `current`
    pub fn calc_next_tuplet_index(&self, current: Option<usize>) -> Option<usize> {
        let first = current.map_or(0, |index| index + 1);
        for (offset, info) in self.frame.tuplet_info.iter().enumerate().skip(first) {
            if info.start_index == self.index {
                return Some(offset);
            }
            if info.start_index > self.index {
                break;
            }
        }
        None
    }

    /// Indices of every tuplet containing this entry
    pub fn find_tuplet_info(&self) -> Vec<usize> {
        self.frame
            .tuplet_info
            .iter()
            .enumerate()
            .filter(|(_, info)| info.includes(self.index))
            .map(|(index, _)| index)
            .collect()
    }

    /// Elapsed duration in the measure's global time
    pub fn calc_global_elapsed_duration(&self) -> Fraction {
        self.info().elapsed_duration * self.frame.time_stretch()
    }

    pub fn calc_global_actual_duration(&self) -> Fraction {
        self.info().actual_duration * self.frame.time_stretch()
    }

    pub fn calc_displays_as_rest(&self) -> bool {
        !self.entry().is_note
    }

    pub fn calc_is_full_measure_rest(&self) -> bool {
        self.entry().is_possible_full_measure_rest()
            && self.frame.len() == 1
            && self.info().elapsed_duration == Fraction::from_integer(0)
    }

    /// A hidden voice 2 launch rest paired with a visible stand-alone voice 2
    /// rest of the same duration, used to beam a rest in one voice
    pub fn calc_is_beamed_rest_workaround(&self) -> bool {
        let entry = self.entry();
        if entry.is_note || crate::models::calc_number_of_beams_in_edu(entry.duration) < 2 {
            return false;
        }
        if entry.is_hidden && entry.v2_launch {
            if let Some(next) = self.next_in_frame() {
                let next_entry = next.entry();
                if !next_entry.is_note && next_entry.duration == entry.duration && !next_entry.is_hidden {
                    return next.next_in_frame().map_or(true, |after| !after.entry().voice2);
                }
            }
        } else if !entry.is_hidden && entry.voice2 {
            if self.next_in_frame().map_or(true, |next| !next.entry().voice2) {
                if let Some(prev) = self.previous_in_frame() {
                    let prev_entry = prev.entry();
                    return prev_entry.v2_launch
                        && !prev_entry.is_note
                        && prev_entry.is_hidden
                        && prev_entry.duration == entry.duration;
                }
            }
        }
        false
    }

    /// Whether this layer's attributes take effect, given the
    /// "only if other layers have notes" condition
    pub fn calc_if_layer_settings_apply(&self) -> Result<bool> {
        let Some(attributes) = self.frame.layer_attributes() else {
            return Ok(false);
        };
        if !attributes.only_if_other_layers_have_notes {
            return Ok(true);
        }
        let context = self.frame.context();
        if !context.calc_is_multi_layer() {
            return Ok(false);
        }
        let layer = self.layer_index();
        for other in 0..MAX_LAYERS {
            if other == layer || context.hold().frames[other] == 0 {
                continue;
            }
            let Some(other_attributes) = self.document().layer_attributes(self.requested_part(), other) else {
                report(IntegrityError::MissingRecord {
                    kind: "layer attributes",
                    key: (other + 1).to_string(),
                    referrer: format!("layer {}", layer + 1),
                })?;
                continue;
            };
            if attributes.ignore_hidden_layers && other_attributes.hide_layer {
                continue;
            }
            if attributes.ignore_hidden_notes_only {
                if self.frame.start_staff().calc_alternate_notation_hides_entries(other) {
                    continue;
                }
                match context.create_entry_frame(other)? {
                    Some(other_frame) if !other_frame.calc_are_all_entries_hidden() => {}
                    _ => continue,
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Direction all cross-staff notes of the entry move: 1 up, -1 down,
    /// 0 for none or mixed
    pub fn calc_cross_staff_direction_for_all(&self, staff_list: Option<&StaffList>) -> i32 {
        let staff_list = staff_list.or_else(|| self.document().scroll_view(self.requested_part()));
        let mut found = 0;
        for note_index in 0..self.entry().num_notes() {
            let direction = NoteCursor::new(self.clone(), note_index).calc_cross_staff_direction(staff_list);
            if direction != 0 {
                if found == 0 {
                    found = direction;
                } else if direction != found {
                    return 0;
                }
            }
        }
        found
    }
}

impl PartialEq for EntryCursor {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_entry(other)
    }
}

impl Eq for EntryCursor {}

impl Hash for EntryCursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entry_number().hash(state);
    }
}

impl fmt::Debug for EntryCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryCursor")
            .field("entry", &self.entry_number())
            .field("staff", &self.staff())
            .field("measure", &self.measure())
            .field("layer", &self.layer_index())
            .field("index", &self.index)
            .finish()
    }
}
