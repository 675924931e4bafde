use super::TieDirection;
use crate::error::Result;
use crate::models::{ConnectPlacement, Evpu, TieConnectStyleType};
use crate::navigator::{EntryCursor, NoteCursor};

/// Geometric feature a tie endpoint attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndPointKind {
    /// Inner edge of the notehead
    Notehead,
    /// Above or below the outermost notehead of the chord
    OuterNotehead,
    /// Tip of the stem
    Stem,
}

impl From<ConnectPlacement> for EndPointKind {
    fn from(placement: ConnectPlacement) -> Self {
        match placement {
            ConnectPlacement::Inner => EndPointKind::Notehead,
            ConnectPlacement::OuterNote => EndPointKind::OuterNotehead,
            ConnectPlacement::OuterStem => EndPointKind::Stem,
        }
    }
}

/// What a tie endpoint was resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointTarget {
    /// The tied note itself
    Note,
    /// The entry following the tie start, standing in for a missing tied-to note
    NextEntry,
    /// Nothing follows the tie start in its layer
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieEndpoint {
    pub style: TieConnectStyleType,
    pub kind: EndPointKind,
    pub target: EndpointTarget,
}

impl TieEndpoint {
    fn new(style: TieConnectStyleType, target: EndpointTarget) -> Self {
        TieEndpoint { style, kind: style.placement().into(), target }
    }

    fn with_placement(self, placement: ConnectPlacement) -> Self {
        TieEndpoint::new(self.style.with_placement(placement), self.target)
    }
}

/// Both endpoints of one tie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieConnection {
    pub direction: TieDirection,
    pub start: TieEndpoint,
    pub end: TieEndpoint,
}

/// Horizontal and vertical endpoint offsets in EVPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TieEndpointOffset {
    pub x: Evpu,
    pub y: Evpu,
}

/// Tie end placed against a stem: down-stem ties under it, up-stem ties
/// over it only when the note is the displaced half of a second
fn end_uses_outer_stem(up_stem: bool, over: bool, up_stem_second: bool, down_stem_second: bool) -> bool {
    (!up_stem && !over && !down_stem_second) || (up_stem && over && up_stem_second)
}

fn start_uses_outer_stem(up_stem: bool, over: bool, up_stem_second: bool, down_stem_second: bool) -> bool {
    (up_stem && over && !up_stem_second) || (!up_stem && !over && down_stem_second)
}

impl NoteCursor {
    fn calc_uses_outer_placement(&self, direction: TieDirection, for_tie_end: bool) -> bool {
        let (is_lowest, is_highest) = (self.calc_is_bottom(), self.calc_is_top());
        if !is_lowest && !is_highest {
            return false;
        }
        // a single note is both; one outer note of a chord needs its tie pointing outward
        if !(is_lowest && is_highest) {
            if is_lowest && direction != TieDirection::Down {
                return false;
            }
            if is_highest && direction != TieDirection::Up {
                return false;
            }
        }
        if let Some(alteration) = self.tie_alteration(for_tie_end) {
            if alteration.outer_local {
                return alteration.outer_on;
            }
        }
        let cursor = self.entry_cursor();
        cursor.document().tie_options(cursor.requested_part()).use_outer_placement
    }

    /// Connect style for one end of this note's tie; `None` when the note
    /// has no tie at that end
    pub fn calc_connect_style_type(&self, for_tie_end: bool) -> Result<Option<TieConnectStyleType>> {
        let direction = self.calc_effective_tie_direction(for_tie_end)?;
        self.calc_connect_style_type_for(direction, for_tie_end)
    }

    /// Connect style for one end of a tie curving in `direction`
    fn calc_connect_style_type_for(
        &self,
        direction: TieDirection,
        for_tie_end: bool,
    ) -> Result<Option<TieConnectStyleType>> {
        if direction == TieDirection::Unspecified {
            return Ok(None);
        }
        let over = direction == TieDirection::Up;
        let start = !for_tie_end;
        if !self.calc_uses_outer_placement(direction, for_tie_end) {
            return Ok(Some(TieConnectStyleType::new(ConnectPlacement::Inner, over, start)));
        }
        let cursor = self.entry_cursor();
        if cursor.entry().has_stem() {
            let up_stem = cursor.calc_up_stem()?;
            let note = self.note();
            let outer_stem = if for_tie_end {
                end_uses_outer_stem(up_stem, over, note.up_stem_second, note.down_stem_second)
            } else {
                start_uses_outer_stem(up_stem, over, note.up_stem_second, note.down_stem_second)
            };
            if outer_stem {
                return Ok(Some(TieConnectStyleType::new(ConnectPlacement::OuterStem, over, start)));
            }
        }
        Ok(Some(TieConnectStyleType::new(ConnectPlacement::OuterNote, over, start)))
    }

    /// End style against the entry after the tie start when no note is tied to
    fn calc_stand_in_end(
        &self,
        start: TieConnectStyleType,
        next: Option<EntryCursor>,
    ) -> Result<TieEndpoint> {
        let over = start.is_over();
        let Some(next) = next else {
            return Ok(TieEndpoint::new(
                TieConnectStyleType::new(ConnectPlacement::OuterStem, over, false),
                EndpointTarget::Boundary,
            ));
        };
        let mut placement = start.placement();
        if placement != ConnectPlacement::Inner && next.entry().has_stem() {
            let up_stem = next.calc_up_stem()?;
            if end_uses_outer_stem(up_stem, over, false, false) {
                placement = ConnectPlacement::OuterStem;
            } else if placement == ConnectPlacement::OuterStem {
                placement = ConnectPlacement::OuterNote;
            }
        }
        Ok(TieEndpoint::new(
            TieConnectStyleType::new(placement, over, false),
            EndpointTarget::NextEntry,
        ))
    }

    /// Direction and both endpoint styles of the tie starting on this note.
    ///
    /// Both ends curve the way the start does. Endpoints never mix inner
    /// with outer placement; a mismatch puts both on the inner side.
    pub fn calc_tie_connection(&self) -> Result<Option<TieConnection>> {
        let direction = self.calc_effective_tie_direction(false)?;
        let Some(start_style) = self.calc_connect_style_type_for(direction, false)? else {
            return Ok(None);
        };
        let mut start = TieEndpoint::new(start_style, EndpointTarget::Note);
        let end_style = match self.calc_tie_to()? {
            Some(end_note) => end_note
                .calc_connect_style_type_for(direction, true)?
                .map(|style| TieEndpoint::new(style, EndpointTarget::Note)),
            None => None,
        };
        let mut end = match end_style {
            Some(end) => end,
            None => self.calc_stand_in_end(start_style, self.entry_cursor().next_in_layer()?)?,
        };
        if start.style.is_inner() != end.style.is_inner() {
            start = start.with_placement(ConnectPlacement::Inner);
            end = end.with_placement(ConnectPlacement::Inner);
        }
        Ok(Some(TieConnection { direction, start, end }))
    }

    /// Endpoint offset for one end of this note's tie with the given style.
    ///
    /// A local offset on the tie replaces the document's connect-style
    /// offset. Dot, accidental and second adjustments are added on top.
    pub fn calc_tie_endpoint_offset(&self, style: TieConnectStyleType, for_tie_end: bool) -> TieEndpointOffset {
        let cursor = self.entry_cursor();
        let options = cursor.document().tie_options(cursor.requested_part());
        let mut offset = match self.tie_alteration(for_tie_end).filter(|alteration| alteration.offset_local) {
            Some(alteration) => TieEndpointOffset { x: alteration.x_offset, y: alteration.y_offset },
            None => options
                .connect_style_offset(style)
                .map(|connect| TieEndpointOffset { x: connect.offset_x, y: connect.offset_y })
                .unwrap_or_default(),
        };
        if !style.is_inner() {
            return offset;
        }
        let note = self.note();
        if for_tie_end {
            if note.show_acci {
                offset.x += options.before_single_acci;
            }
        } else {
            match cursor.entry().calc_augmentation_dots() {
                0 => {}
                1 => offset.x += options.after_single_dot,
                _ => offset.x += options.after_multiple_dots,
            }
        }
        // displaced half of a second
        if (note.up_stem_second || note.down_stem_second) && !for_tie_end {
            offset.x += options.seconds_placement;
        }
        offset
    }

    /// Horizontal adjustment for a tie broken by a system break: the
    /// continuation at the left of a system, or the open end at the right
    pub fn calc_tie_system_break_adjustment(&self, at_system_start: bool) -> Evpu {
        let cursor = self.entry_cursor();
        let options = cursor.document().tie_options(cursor.requested_part());
        if at_system_start {
            options.sys_break_left_h_adj
        } else {
            options.sys_break_right_h_adj
        }
    }
}
