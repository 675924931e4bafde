//! Stem direction
//!
//! The direction is decided for a whole beam group at once. Rules are tried
//! in order of precedence and the first one that decides wins; when none
//! does, the notes' distance from the staff's stem reversal line decides.

use crate::error::Result;
use crate::models::{AlternateNotation, StemDirection};
use crate::navigator::{EntryCursor, NoteCursor};

/// A precedence rule over the beam group; `None` defers to the next rule
type StemRule = fn(&EntryCursor, &[EntryCursor]) -> Result<Option<bool>>;

const STEM_RULES: [StemRule; 6] = [
    rhythmic_notation_rule,
    frozen_stem_rule,
    frozen_layer_rule,
    staff_direction_rule,
    voice_rule,
    cross_staff_rule,
];

fn rhythmic_notation_rule(_: &EntryCursor, group: &[EntryCursor]) -> Result<Option<bool>> {
    Ok(group
        .iter()
        .map(EntryCursor::current_staff)
        .find(|staff| staff.alt_notation == AlternateNotation::Rhythmic)
        .map(|staff| staff.alt_rhythm_stems_up))
}

fn frozen_stem_rule(_: &EntryCursor, group: &[EntryCursor]) -> Result<Option<bool>> {
    Ok(group.iter().map(EntryCursor::entry).find(|entry| entry.freeze_stem).map(|entry| entry.up_stem))
}

fn frozen_layer_rule(cursor: &EntryCursor, _: &[EntryCursor]) -> Result<Option<bool>> {
    match cursor.frame().layer_attributes() {
        Some(attributes) if attributes.freeze_layer && cursor.calc_if_layer_settings_apply()? => {
            Ok(Some(attributes.freeze_stems_up))
        }
        _ => Ok(None),
    }
}

fn staff_direction_rule(_: &EntryCursor, group: &[EntryCursor]) -> Result<Option<bool>> {
    for cursor in group {
        match cursor.current_staff().stem_direction {
            StemDirection::AlwaysUp => return Ok(Some(true)),
            StemDirection::AlwaysDown => return Ok(Some(false)),
            StemDirection::Default => {}
        }
    }
    Ok(None)
}

fn voice_rule(_: &EntryCursor, group: &[EntryCursor]) -> Result<Option<bool>> {
    Ok(group
        .iter()
        .map(EntryCursor::entry)
        .find(|entry| entry.v2_launch || entry.voice2)
        .map(|entry| entry.up_stem))
}

fn cross_staff_rule(cursor: &EntryCursor, group: &[EntryCursor]) -> Result<Option<bool>> {
    let scroll_view = cursor.document().scroll_view(cursor.requested_part());
    let mut found = 0;
    for member in group {
        let direction = member.calc_cross_staff_direction_for_all(scroll_view);
        if direction != 0 {
            if found == 0 {
                found = direction;
            } else if direction != found {
                return Ok(None);
            }
        }
    }
    // notes crossing down get stems up
    Ok((found != 0).then_some(found < 0))
}

impl EntryCursor {
    /// Highest and lowest staff positions of the chord on the entry's own
    /// staff; `None` for rests without notes and floating rests
    pub fn calc_top_bottom_staff_positions(&self) -> Option<(i32, i32)> {
        let entry = self.entry();
        if entry.notes.is_empty() || entry.float_rest {
            return None;
        }
        let first = NoteCursor::new(self.clone(), 0).calc_staff_position();
        let last = NoteCursor::new(self.clone(), entry.num_notes() - 1).calc_staff_position();
        Some((first.max(last), first.min(last)))
    }

    /// Stem direction from note positions alone
    pub fn calc_up_stem_default(&self) -> bool {
        let mut max_top_diff = i32::MIN;
        let mut min_bottom_diff = i32::MAX;
        let (mut num_above, mut num_below) = (0, 0);
        let mut got_non_grace = false;
        let mut got_non_float_rest = false;

        for member in self.find_beam_start_or_current().beam_group() {
            if member.entry().grace_note {
                continue;
            }
            got_non_grace = true;
            let Some((top, bottom)) = member.calc_top_bottom_staff_positions() else {
                continue;
            };
            got_non_float_rest = true;
            let stem_reversal = member.current_staff().stem_reversal;
            let top_diff = top - stem_reversal;
            let bottom_diff = bottom - stem_reversal;
            max_top_diff = max_top_diff.max(top_diff);
            min_bottom_diff = min_bottom_diff.min(bottom_diff);
            let val_for_stem = if bottom_diff.abs() > top_diff.abs() { bottom_diff } else { top_diff };
            if val_for_stem > 0 {
                num_above += 1;
            } else if val_for_stem < 0 {
                num_below += 1;
            }
        }

        if !got_non_grace {
            return true;
        }
        if !got_non_float_rest {
            return self.entry().up_stem;
        }
        // a balanced beam is decided by how many entries lie on each side
        if min_bottom_diff < 0 && min_bottom_diff == -max_top_diff && !self.calc_unbeamed() {
            return num_below > num_above;
        }
        let val_for_beam = if min_bottom_diff.abs() > max_top_diff.abs() { min_bottom_diff } else { max_top_diff };
        val_for_beam < 0
    }

    /// Whether the entry's stem points up
    pub fn calc_up_stem(&self) -> Result<bool> {
        let group: Vec<EntryCursor> = self.find_beam_start_or_current().beam_group().collect();
        for rule in STEM_RULES {
            if let Some(up) = rule(self, &group)? {
                return Ok(up);
            }
        }
        Ok(self.calc_up_stem_default())
    }
}
