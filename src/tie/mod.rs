//! Tie resolution
//!
//! Given a note and which end of its tie is wanted, resolve where the tie
//! goes ([`NoteCursor::calc_tie_to`] and [`NoteCursor::calc_tie_from`]), which
//! way it curves, what each endpoint attaches to and which contour it uses.
//! Direction rules are tried in order of precedence; the first one that
//! decides wins.

mod connect;
mod contour;

use crate::error::Result;
use crate::models::{ChordTieDirType, MixedStemDirection, TieOptions};
use crate::navigator::{EntryCursor, NoteCursor};

pub use connect::{EndPointKind, EndpointTarget, TieConnection, TieEndpoint, TieEndpointOffset};
pub use contour::{ContourGeometry, ControlPoints, TieContour};

/// Entries stepped through before a tie search gives up
pub const DEFAULT_TIE_SEARCH_LIMIT: usize = 512;

/// Curvature direction of a tie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TieDirection {
    /// The note has no tie at the requested end
    #[default]
    Unspecified,
    Up,
    Down,
}

impl TieDirection {
    fn from_up(up: bool) -> Self {
        if up {
            TieDirection::Up
        } else {
            TieDirection::Down
        }
    }
}

type DirectionRule = fn(&NoteCursor, bool) -> Result<Option<TieDirection>>;

const DIRECTION_RULES: [DirectionRule; 6] = [
    frozen_direction_rule,
    split_stem_rule,
    frozen_layer_rule,
    voice_rule,
    flip_tie_rule,
    cross_staff_rule,
];

fn frozen_direction_rule(note: &NoteCursor, for_tie_end: bool) -> Result<Option<TieDirection>> {
    Ok(note
        .tie_alteration(for_tie_end)
        .filter(|alteration| alteration.freeze_direction)
        .map(|alteration| TieDirection::from_up(!alteration.down)))
}

fn split_stem_rule(note: &NoteCursor, _: bool) -> Result<Option<TieDirection>> {
    let split = note.entry_cursor().entry().split_stem;
    Ok(split.then(|| TieDirection::from_up(note.note().up_split_stem)))
}

fn frozen_layer_rule(note: &NoteCursor, _: bool) -> Result<Option<TieDirection>> {
    let cursor = note.entry_cursor();
    match cursor.frame().layer_attributes() {
        Some(attributes) if attributes.freeze_layer && cursor.calc_if_layer_settings_apply()? => Ok(Some(
            TieDirection::from_up(attributes.freeze_stems_up == attributes.freeze_ties_to_stems),
        )),
        _ => Ok(None),
    }
}

fn voice_rule(note: &NoteCursor, _: bool) -> Result<Option<TieDirection>> {
    let cursor = note.entry_cursor();
    let entry = cursor.entry();
    if entry.v2_launch || entry.voice2 {
        return Ok(Some(TieDirection::from_up(cursor.calc_up_stem()?)));
    }
    Ok(None)
}

fn flip_tie_rule(note: &NoteCursor, _: bool) -> Result<Option<TieDirection>> {
    let cursor = note.entry_cursor();
    if cursor.entry().flip_tie {
        return Ok(Some(TieDirection::from_up(cursor.calc_up_stem()?)));
    }
    Ok(None)
}

fn cross_staff_rule(note: &NoteCursor, _: bool) -> Result<Option<TieDirection>> {
    let cursor = note.entry_cursor();
    let scroll_view = cursor.document().scroll_view(cursor.requested_part());
    let direction = note.calc_cross_staff_direction(scroll_view);
    // a note moved up curves up
    Ok((direction != 0).then(|| TieDirection::from_up(direction > 0)))
}

impl NoteCursor {
    pub fn calc_is_top(&self) -> bool {
        self.note_index() + 1 == self.entry_cursor().entry().num_notes()
    }

    pub fn calc_is_bottom(&self) -> bool {
        self.note_index() == 0
    }

    fn tie_alteration(&self, for_tie_end: bool) -> Option<&crate::models::TieAlteration> {
        let cursor = self.entry_cursor();
        cursor
            .document()
            .tie_alteration(cursor.requested_part(), cursor.entry_number(), self.note().note_id, for_tie_end)
    }

    /// The note this note's tie ends on
    pub fn calc_tie_to(&self) -> Result<Option<NoteCursor>> {
        self.calc_tie_to_within(DEFAULT_TIE_SEARCH_LIMIT)
    }

    /// [`calc_tie_to`](Self::calc_tie_to), stepping through at most `limit` entries
    pub fn calc_tie_to_within(&self, limit: usize) -> Result<Option<NoteCursor>> {
        let origin = self.entry_cursor();
        if !origin.entry().is_note {
            return Ok(None);
        }
        let mut next = Some(origin.clone());
        for _ in 0..limit {
            let Some(current) = next else {
                return Ok(None);
            };
            next = if current.entry().v2_launch {
                match current.next_same_v() {
                    Some(after) => Some(after),
                    // a launch is always voice 1
                    None => match origin.frame().next()? {
                        Some(frame) => frame.first_in_voice(1)?,
                        None => None,
                    },
                }
            } else if origin.entry().voice2 {
                match current.next_same_v() {
                    Some(after) => Some(after),
                    // voice 2 exhausted: continue with whatever follows it in the layer
                    None => {
                        let next_elapsed = origin.info().calc_next_elapsed_duration();
                        let mut candidate = current.next_in_layer()?;
                        while let Some(entry) = candidate.as_ref().filter(|entry| {
                            entry.measure() == origin.measure() && entry.info().elapsed_duration < next_elapsed
                        }) {
                            candidate = entry.next_in_layer()?;
                        }
                        candidate
                    }
                }
            } else {
                current.next_in_layer()?
            };
            let Some(candidate) = next.as_ref() else {
                return Ok(None);
            };
            // a grace ties to the next non-grace entry
            if candidate.entry().grace_note {
                continue;
            }
            if let Some(result) = self.find_equal_pitch(candidate) {
                return Ok(Some(result));
            }
            if candidate.entry().v2_launch {
                return Ok(match candidate.next_in_layer()? {
                    Some(after) => self.find_equal_pitch(&after),
                    None => None,
                });
            }
            return Ok(None);
        }
        log::warn!(
            "tie search from entry {} stopped after {} entries",
            origin.entry_number(),
            limit
        );
        Ok(None)
    }

    /// The note whose tie ends on this note, searching back at most one measure.
    ///
    /// With `require_tie` the found note must carry a tie start.
    pub fn calc_tie_from(&self, require_tie: bool) -> Result<Option<NoteCursor>> {
        self.calc_tie_from_within(require_tie, DEFAULT_TIE_SEARCH_LIMIT)
    }

    pub fn calc_tie_from_within(&self, require_tie: bool, limit: usize) -> Result<Option<NoteCursor>> {
        let origin = self.entry_cursor();
        let entry = origin.entry();
        if !entry.is_note || entry.grace_note {
            return Ok(None);
        }
        let earliest = origin.measure().saturating_sub(1);
        let mut prev = origin.previous_in_layer()?;
        let mut steps = 0;
        while let Some(cursor) = prev {
            if cursor.measure() < earliest {
                break;
            }
            steps += 1;
            if steps > limit {
                log::warn!(
                    "backward tie search from entry {} stopped after {} entries",
                    origin.entry_number(),
                    limit
                );
                break;
            }
            if cursor.entry().is_note {
                for note_index in 0..cursor.entry().num_notes() {
                    let candidate = NoteCursor::new(cursor.clone(), note_index);
                    let tied_to = candidate.calc_tie_to_within(limit)?;
                    if tied_to.is_some_and(|tied_to| tied_to.is_same_note(self)) {
                        if !require_tie || candidate.note().tie_start {
                            return Ok(Some(candidate));
                        }
                        return Ok(None);
                    }
                }
            }
            prev = cursor.previous_in_layer()?;
        }
        Ok(None)
    }

    /// Direction adjustment for stems of mixed direction, comparing this
    /// entry's stem with the stem of the entry on the other side of the tie
    fn calc_mixed_stem_direction(
        &self,
        for_tie_end: bool,
        up_stem: bool,
        options: &TieOptions,
    ) -> Result<Option<TieDirection>> {
        let cursor = self.entry_cursor();
        let adjacent_up_stem = if for_tie_end {
            // the immediately preceding entry, even when it is not the one starting the tie
            match cursor.previous_in_layer()? {
                Some(prev) => Some(prev.calc_up_stem()?),
                None => None,
            }
        } else if let Some(end_note) = self.calc_tie_to()? {
            Some(end_note.entry_cursor().calc_up_stem()?)
        } else {
            match cursor.next_in_layer()? {
                Some(next) if !next.calc_displays_as_rest() => {
                    let mut next_up_stem = next.calc_up_stem()?;
                    if !next.entry().freeze_stem && next.entry().v2_launch && next_up_stem == up_stem {
                        if let Some(after) = next.next_in_layer()? {
                            next_up_stem = after.calc_up_stem()?;
                        }
                    }
                    Some(next_up_stem)
                }
                _ => None,
            }
        };
        let Some(adjacent_up_stem) = adjacent_up_stem else {
            return Ok(None);
        };
        if options.mixed_stem_direction == MixedStemDirection::OppositeFirst || adjacent_up_stem == up_stem {
            return Ok(None);
        }
        Ok(Some(TieDirection::from_up(options.mixed_stem_direction == MixedStemDirection::Over)))
    }

    /// Direction from placement alone, before any override
    pub fn calc_default_tie_direction(&self, for_tie_end: bool) -> Result<TieDirection> {
        let note = self.note();
        let has_tie = if for_tie_end { note.tie_end } else { note.tie_start };
        if !has_tie {
            return Ok(TieDirection::Unspecified);
        }
        let cursor = self.entry_cursor();
        let options = cursor.document().tie_options(cursor.requested_part());
        let note_count = cursor.entry().num_notes();
        let up_stem = cursor.calc_up_stem()?;

        if note_count > 1 {
            let apply_opposing_seconds = |direction: TieDirection| {
                if !options.chord_tie_dir_opposing_seconds {
                    return direction;
                }
                match direction {
                    TieDirection::Up if !note.up_stem_second && note.down_stem_second => TieDirection::Down,
                    TieDirection::Down if note.up_stem_second && !note.down_stem_second => TieDirection::Up,
                    _ => direction,
                }
            };
            // notes run bottom to top
            let note_index = self.note_index();
            if note_index == 0 {
                let mixed = self.calc_mixed_stem_direction(for_tie_end, up_stem, options)?;
                return Ok(mixed.unwrap_or(TieDirection::Down));
            }
            if note_index + 1 == note_count {
                let mixed = self.calc_mixed_stem_direction(for_tie_end, up_stem, options)?;
                return Ok(mixed.unwrap_or(TieDirection::Up));
            }
            if options.chord_tie_dir_type != ChordTieDirType::StemReversal {
                if note_index < note_count / 2 {
                    return Ok(apply_opposing_seconds(TieDirection::Down));
                }
                if note_index >= (note_count + 1) / 2 {
                    return Ok(apply_opposing_seconds(TieDirection::Up));
                }
                if options.chord_tie_dir_type == ChordTieDirType::OutsideInside {
                    return Ok(apply_opposing_seconds(TieDirection::from_up(!up_stem)));
                }
            }
            let stem_reversal = cursor.current_staff().stem_reversal;
            return Ok(apply_opposing_seconds(TieDirection::from_up(
                self.calc_staff_position() >= stem_reversal,
            )));
        }

        if let Some(mixed) = self.calc_mixed_stem_direction(for_tie_end, up_stem, options)? {
            return Ok(mixed);
        }
        Ok(TieDirection::from_up(!up_stem))
    }

    /// Direction the tie actually curves, after overrides
    pub fn calc_effective_tie_direction(&self, for_tie_end: bool) -> Result<TieDirection> {
        for rule in DIRECTION_RULES {
            if let Some(direction) = rule(self, for_tie_end)? {
                return Ok(direction);
            }
        }
        self.calc_default_tie_direction(for_tie_end)
    }
}

/// Effective tie directions of every note of an entry, bottom to top
pub fn calc_chord_tie_directions(cursor: &EntryCursor, for_tie_end: bool) -> Result<Vec<TieDirection>> {
    (0..cursor.entry().num_notes())
        .map(|note_index| NoteCursor::new(cursor.clone(), note_index).calc_effective_tie_direction(for_tie_end))
        .collect()
}
