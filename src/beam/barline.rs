//! Beams that continue over a barline
//!
//! Two notations are recognized. A beam extension pushing the beam past the
//! barline (optionally through a hidden singleton note) links the last beam
//! of one measure with the first beam of the next. Alternatively, the next
//! measure may open with hidden entries duplicating the tail of this
//! measure's beam, beamed to the first visible entry after them.

use crate::error::Result;
use crate::models::{BeamExtension, DownStem, EntryNumber, StemSide, UpStem};
use crate::navigator::EntryCursor;

fn has_beam_extension(cursor: &EntryCursor, check: impl Fn(&BeamExtension) -> bool) -> bool {
    fn side<S: StemSide>(cursor: &EntryCursor, entnum: EntryNumber) -> Option<&BeamExtension> {
        cursor.document().beam_extension::<S>(cursor.requested_part(), entnum)
    }
    let entnum = cursor.entry_number();
    side::<UpStem>(cursor, entnum).is_some_and(&check) || side::<DownStem>(cursor, entnum).is_some_and(&check)
}

fn extends_left(cursor: &EntryCursor) -> bool {
    has_beam_extension(cursor, |ext| ext.left_offset < 0)
}

fn extends_right(cursor: &EntryCursor) -> bool {
    has_beam_extension(cursor, |ext| ext.right_offset > 0)
}

fn voice_of(cursor: &EntryCursor) -> u8 {
    u8::from(cursor.entry().voice2) + 1
}

/// Duplicates match position for position: same duration, grace flag, notes
/// and offset from the first entry of the run
fn duplicates_match(originals: &[EntryCursor], duplicates: &[EntryCursor]) -> bool {
    let (Some(first_original), Some(first_duplicate)) = (originals.first(), duplicates.first()) else {
        return false;
    };
    if originals.len() != duplicates.len() {
        return false;
    }
    let origin = first_original.info().elapsed_duration;
    let duplicate_origin = first_duplicate.info().elapsed_duration;
    originals.iter().zip(duplicates).all(|(original, duplicate)| {
        let (a, b) = (original.entry(), duplicate.entry());
        a.duration == b.duration
            && a.grace_note == b.grace_note
            && a.is_note == b.is_note
            && a.num_notes() == b.num_notes()
            && a.notes
                .iter()
                .zip(&b.notes)
                .all(|(x, y)| x.harm_lev == y.harm_lev && x.harm_alt == y.harm_alt)
            && original.info().elapsed_duration - origin == duplicate.info().elapsed_duration - duplicate_origin
    })
}

impl EntryCursor {
    /// A zero-length tuplet starting here creates a singleton beam to the left
    pub fn calc_creates_singleton_beam_left(&self) -> bool {
        let frame = self.frame();
        frame
            .tuplet_info
            .iter()
            .any(|info| info.start_index == self.index() && info.calc_creates_singleton_beam_left(frame))
    }

    pub fn calc_creates_singleton_beam_right(&self) -> bool {
        let frame = self.frame();
        frame
            .tuplet_info
            .iter()
            .any(|info| info.start_index == self.index() && info.calc_creates_singleton_beam_right(frame))
    }

    /// Start of the measure's last beam when that beam reaches over the right barline
    pub fn find_left_beam_anchor_for_beam_over_barline(&self) -> Option<EntryCursor> {
        if self.entry().grace_note {
            return None;
        }
        let mut anchor = self.frame().last_in_voice(voice_of(self));
        while let Some(cursor) = anchor.as_ref().filter(|cursor| cursor.entry().grace_note) {
            anchor = cursor.previous_same_v();
        }
        if let Some(rest) = anchor.clone().filter(|cursor| cursor.calc_displays_as_rest() && cursor.can_be_beamed()) {
            let mut current = rest.previous_same_v_no_grace();
            while let Some(cursor) = current {
                if !cursor.calc_displays_as_rest() {
                    anchor = Some(cursor);
                    break;
                }
                if cursor.calc_beam_must_start_here() {
                    break;
                }
                current = cursor.previous_same_v_no_grace();
            }
        }
        let anchor = anchor?;
        if anchor.entry().is_hidden || anchor.calc_displays_as_rest() || !anchor.can_be_beamed() {
            return None;
        }
        let beam_start = anchor.find_beam_start_or_current();
        if beam_start.index() > self.index() {
            return None;
        }
        if !beam_start.calc_creates_singleton_beam_right() && !extends_right(&beam_start) {
            return None;
        }
        Some(beam_start)
    }

    /// Start of the measure's first beam when that beam reaches over the left barline
    pub fn find_right_beam_anchor_for_beam_over_barline(&self) -> Result<Option<EntryCursor>> {
        if self.entry().grace_note {
            return Ok(None);
        }
        let mut anchor = self.frame().first_in_voice(voice_of(self))?;
        while let Some(cursor) = anchor.as_ref().filter(|cursor| cursor.entry().grace_note) {
            anchor = cursor.next_same_v();
        }
        if let Some(rest) = anchor.clone().filter(|cursor| cursor.calc_displays_as_rest() && cursor.can_be_beamed()) {
            let mut current = rest.next_same_v_no_grace();
            while let Some(cursor) = current {
                if cursor.calc_beam_must_start_here() {
                    break;
                }
                if !cursor.calc_displays_as_rest() {
                    anchor = Some(cursor);
                    break;
                }
                current = cursor.next_same_v_no_grace();
            }
        }
        let Some(anchor) = anchor else {
            return Ok(None);
        };
        if anchor.entry().is_hidden || anchor.calc_displays_as_rest() || !anchor.can_be_beamed() {
            return Ok(None);
        }
        let beam_start = anchor.find_beam_start_or_current();
        if beam_start.index() < self.index() {
            return Ok(None);
        }
        if !beam_start.calc_creates_singleton_beam_left() && !extends_left(&beam_start) {
            return Ok(None);
        }
        Ok(Some(beam_start))
    }

    /// Entry of the previous measure this entry's beam continues from
    pub fn calc_beam_continues_left_over_barline(&self) -> Result<Option<EntryCursor>> {
        if self.entry().grace_note {
            return Ok(None);
        }
        let voice = voice_of(self);
        let left_beam_start = self.find_beam_start_or_current();
        if left_beam_start.previous_in_voice(voice).is_some() || left_beam_start.calc_unbeamed() {
            return Ok(None);
        }
        if !left_beam_start.calc_creates_singleton_beam_left() && !extends_left(&left_beam_start) {
            return Ok(None);
        }
        let Some(prev_frame) = self.frame().previous()? else {
            return Ok(None);
        };
        let Some(prev) = prev_frame.last_in_voice(voice) else {
            return Ok(None);
        };
        if prev.calc_unbeamed() {
            return Ok(None);
        }
        let right_beam_start = prev.find_beam_start_or_current();
        if right_beam_start.calc_creates_singleton_beam_right() {
            return Ok(Some(right_beam_start));
        }
        if !extends_right(&right_beam_start) {
            return Ok(None);
        }
        Ok(Some(prev))
    }

    /// Entry this entry's beam continues to, possibly in the next measure
    pub fn calc_beam_continues_right_over_barline(&self) -> Result<Option<EntryCursor>> {
        if self.entry().grace_note || self.find_left_beam_anchor_for_beam_over_barline().is_none() {
            return Ok(None);
        }
        let mut next_in_voice = self.clone();
        if self.calc_creates_singleton_beam_right() {
            match next_in_voice.next_same_v() {
                Some(next) => next_in_voice = next,
                None => return Ok(None),
            }
        }
        if let Some(next) = next_in_voice.next_same_v_no_grace() {
            return Ok(Some(next));
        }
        let Some(next_frame) = self.frame().next()? else {
            return Ok(None);
        };
        let mut current = next_frame.first_in_voice(voice_of(self))?;
        while let Some(cursor) = current {
            if cursor.entry().grace_note {
                current = cursor.next_same_v();
                continue;
            }
            if cursor.calc_is_beam_start() {
                if cursor.find_right_beam_anchor_for_beam_over_barline()?.is_none() {
                    return Ok(None);
                }
                if cursor.calc_creates_singleton_beam_left() {
                    return Ok(cursor.next_in_beam_group(false));
                }
                return Ok(Some(cursor));
            }
            break;
        }
        Ok(None)
    }

    /// First visible entry of the next measure when it opens with hidden
    /// duplicates of this entry's beam tail
    pub fn calc_beam_continues_right_by_duplicates(&self) -> Result<Option<EntryCursor>> {
        let entry = self.entry();
        if entry.grace_note || entry.is_hidden || self.calc_displays_as_rest() || !self.can_be_beamed() {
            return Ok(None);
        }
        if self.next_same_v_no_grace().is_some() {
            return Ok(None);
        }
        let mut originals = Vec::new();
        let mut current = Some(self.find_beam_start_or_current());
        while let Some(cursor) = current {
            let done = cursor.is_same_entry(self);
            current = cursor.next_same_v();
            originals.push(cursor);
            if done {
                break;
            }
        }

        let Some(next_frame) = self.frame().next()? else {
            return Ok(None);
        };
        let mut duplicates = Vec::new();
        let mut current = next_frame.first_in_voice(voice_of(self))?;
        while let Some(cursor) = current.filter(|cursor| cursor.entry().is_hidden) {
            current = cursor.next_same_v();
            duplicates.push(cursor);
        }
        if !duplicates_match(&originals, &duplicates) {
            return Ok(None);
        }
        let continuation = duplicates
            .last()
            .and_then(|last| last.next_in_beam_group(true))
            .filter(|cursor| !cursor.entry().is_hidden);
        if let Some(continuation) = &continuation {
            log::trace!(
                "entry {} continues its beam over the barline to entry {} through {} hidden duplicates",
                self.entry_number(),
                continuation.entry_number(),
                duplicates.len()
            );
        }
        Ok(continuation)
    }

    /// Last visible entry of the previous measure whose beam tail is
    /// duplicated by the hidden entries preceding this one
    pub fn calc_beam_continues_left_by_duplicates(&self) -> Result<Option<EntryCursor>> {
        let entry = self.entry();
        if entry.grace_note || entry.is_hidden || !self.can_be_beamed() {
            return Ok(None);
        }
        let mut prev = self.previous_same_v();
        if prev.is_none() {
            return Ok(None);
        }
        while let Some(cursor) = prev {
            if !cursor.entry().is_hidden {
                return Ok(None);
            }
            prev = cursor.previous_same_v();
        }
        let Some(prev_frame) = self.frame().previous()? else {
            return Ok(None);
        };
        let mut last = prev_frame.last_in_voice(voice_of(self));
        while let Some(cursor) = last.as_ref().filter(|cursor| cursor.entry().grace_note) {
            last = cursor.previous_same_v();
        }
        let Some(last) = last else {
            return Ok(None);
        };
        match last.calc_beam_continues_right_by_duplicates()? {
            Some(continuation) if continuation.is_same_entry(self) => Ok(Some(last)),
            _ => Ok(None),
        }
    }

    pub fn next_in_beam_group_across_bars(&self, include_hidden: bool) -> Result<Option<EntryCursor>> {
        if let Some(next) = self.calc_beam_continues_right_over_barline()? {
            return Ok(Some(next));
        }
        if let Some(next) = self.calc_beam_continues_right_by_duplicates()? {
            return Ok(Some(next));
        }
        Ok(self.next_in_beam_group(include_hidden))
    }

    pub fn previous_in_beam_group_across_bars(&self, include_hidden: bool) -> Result<Option<EntryCursor>> {
        if let Some(prev) = self.calc_beam_continues_left_over_barline()? {
            return Ok(Some(prev));
        }
        if let Some(prev) = self.calc_beam_continues_left_by_duplicates()? {
            return Ok(Some(prev));
        }
        Ok(self.previous_in_beam_group(include_hidden))
    }

    /// Lowest beam ending on this entry, treating a beam that continues into
    /// the next measure as unbroken
    pub fn calc_lowest_beam_end_across_barlines(&self) -> Result<u32> {
        if self.entry().is_hidden {
            return Ok(0);
        }
        let next = match self.calc_beam_continues_right_over_barline()? {
            Some(next) => Some(next),
            None => self.calc_beam_continues_right_by_duplicates()?,
        };
        let Some(next) = next else {
            return Ok(self.calc_lowest_beam_end());
        };
        let (visible, next_visible) = (self.calc_visible_beams(), next.calc_visible_beams());
        Ok(if visible > next_visible { next_visible + 1 } else { 0 })
    }

    /// Lowest beam starting on this entry, treating a beam that continues
    /// from the previous measure as unbroken
    pub fn calc_lowest_beam_start_across_barlines(&self) -> Result<u32> {
        if self.entry().is_hidden {
            return Ok(0);
        }
        let prev = match self.calc_beam_continues_left_over_barline()? {
            Some(prev) => Some(prev),
            None => self.calc_beam_continues_left_by_duplicates()?,
        };
        let Some(prev) = prev else {
            return Ok(self.calc_lowest_beam_start());
        };
        let (visible, prev_visible) = (self.calc_visible_beams(), prev.calc_visible_beams());
        Ok(if visible > prev_visible { prev_visible + 1 } else { 0 })
    }
}
