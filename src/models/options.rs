//! Document-wide options
//!
//! One record of each kind per part. They are required; see
//! [`Document::finalize`](super::Document::finalize).

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::{Evpu, EvpuFloat, PartId};

/// EFIX units per EVPU
pub const EFIX_PER_EVPU: EvpuFloat = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum BeamingStyle {
    #[default]
    FlattenNone = 0,
    FlattenAll = 1,
    FlattenExtreme = 2,
    OnExtremeNote = 3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamOptions {
    pub part: PartId,
    pub beaming_style: BeamingStyle,
    pub extend_beams_over_rests: bool,
    pub extend_sec_beams_over_rests: bool,
    /// Primary beam width in EFIX
    pub beam_width: i32,
    /// Distance between beams
    pub beam_separ: Evpu,
    pub max_slope: Evpu,
}

impl Default for BeamOptions {
    fn default() -> Self {
        BeamOptions {
            part: 0,
            beaming_style: BeamingStyle::FlattenNone,
            extend_beams_over_rests: false,
            extend_sec_beams_over_rests: false,
            beam_width: 768,
            beam_separ: 18,
            max_slope: 12,
        }
    }
}

/// Placement of ties on chords with stems in both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum MixedStemDirection {
    Over = 0,
    Under = 1,
    #[default]
    OppositeFirst = 2,
}

/// How the inner notes of a tied chord split between up and down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ChordTieDirType {
    OutsideInside = 0,
    #[default]
    StemReversal = 1,
    SplitEvenly = 2,
}

/// Geometric feature a tie endpoint attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TieConnectStyleType {
    OverStartPosInner = 0,
    OverEndPosInner = 1,
    UnderStartPosInner = 2,
    UnderEndPosInner = 3,
    OverHighestNoteStartPosOver = 4,
    OverHighestNoteEndPosOver = 5,
    UnderLowestNoteStartPosUnder = 6,
    UnderLowestNoteEndPosUnder = 7,
    OverHighestNoteStemStartPosOver = 8,
    OverHighestNoteStemEndPosOver = 9,
    UnderLowestNoteStemStartPosUnder = 10,
    UnderLowestNoteStemEndPosUnder = 11,
}

/// The anatomical point family of a connect style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectPlacement {
    Inner,
    OuterNote,
    OuterStem,
}

impl TieConnectStyleType {
    pub fn new(placement: ConnectPlacement, over: bool, start: bool) -> Self {
        use TieConnectStyleType::*;
        match (placement, over, start) {
            (ConnectPlacement::Inner, true, true) => OverStartPosInner,
            (ConnectPlacement::Inner, true, false) => OverEndPosInner,
            (ConnectPlacement::Inner, false, true) => UnderStartPosInner,
            (ConnectPlacement::Inner, false, false) => UnderEndPosInner,
            (ConnectPlacement::OuterNote, true, true) => OverHighestNoteStartPosOver,
            (ConnectPlacement::OuterNote, true, false) => OverHighestNoteEndPosOver,
            (ConnectPlacement::OuterNote, false, true) => UnderLowestNoteStartPosUnder,
            (ConnectPlacement::OuterNote, false, false) => UnderLowestNoteEndPosUnder,
            (ConnectPlacement::OuterStem, true, true) => OverHighestNoteStemStartPosOver,
            (ConnectPlacement::OuterStem, true, false) => OverHighestNoteStemEndPosOver,
            (ConnectPlacement::OuterStem, false, true) => UnderLowestNoteStemStartPosUnder,
            (ConnectPlacement::OuterStem, false, false) => UnderLowestNoteStemEndPosUnder,
        }
    }

    pub fn placement(self) -> ConnectPlacement {
        match self as u8 {
            0..=3 => ConnectPlacement::Inner,
            4..=7 => ConnectPlacement::OuterNote,
            _ => ConnectPlacement::OuterStem,
        }
    }

    pub fn is_inner(self) -> bool {
        self.placement() == ConnectPlacement::Inner
    }

    pub fn is_over(self) -> bool {
        use TieConnectStyleType::*;
        matches!(
            self,
            OverStartPosInner
                | OverEndPosInner
                | OverHighestNoteStartPosOver
                | OverHighestNoteEndPosOver
                | OverHighestNoteStemStartPosOver
                | OverHighestNoteStemEndPosOver
        )
    }

    pub fn is_start(self) -> bool {
        (self as u8) % 2 == 0
    }

    /// Same placement family, other end of the tie
    pub fn with_placement(self, placement: ConnectPlacement) -> Self {
        TieConnectStyleType::new(placement, self.is_over(), self.is_start())
    }
}

/// Offset applied to a tie endpoint for one connect style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectStyleOffset {
    pub style: TieConnectStyleType,
    pub offset_x: Evpu,
    pub offset_y: Evpu,
}

/// Curvature class of a tie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ContourStyleType {
    ShortSpan = 0,
    MediumSpan = 1,
    LongSpan = 2,
    TieEnds = 3,
}

/// Control-point shape of one contour style
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlStyle {
    /// Tie length at which this style applies
    pub span: Evpu,
    /// Control-point inset as a fraction of the tie length
    pub inset_ratio: EvpuFloat,
    pub height: Evpu,
    /// Control-point inset in EVPU when `inset_ratio` is not used
    pub fixed_inset: Evpu,
    pub use_inset_ratio: bool,
}

impl Default for ControlStyle {
    fn default() -> Self {
        ControlStyle {
            span: 0,
            inset_ratio: 0.2,
            height: 20,
            fixed_inset: 24,
            use_inset_ratio: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieControlStyles {
    pub short_span: ControlStyle,
    pub medium_span: ControlStyle,
    pub long_span: ControlStyle,
    pub tie_ends: ControlStyle,
}

impl Default for TieControlStyles {
    fn default() -> Self {
        TieControlStyles {
            short_span: ControlStyle { span: 48, height: 14, ..Default::default() },
            medium_span: ControlStyle { span: 192, height: 22, ..Default::default() },
            long_span: ControlStyle { span: 768, height: 36, inset_ratio: 0.1, ..Default::default() },
            tie_ends: ControlStyle { span: 96, height: 16, ..Default::default() },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TieOptions {
    pub part: PartId,
    pub mixed_stem_direction: MixedStemDirection,
    pub chord_tie_dir_type: ChordTieDirType,
    /// Opposing notes of a second in a chord tie away from each other
    pub chord_tie_dir_opposing_seconds: bool,
    /// Outermost chord notes attach outer-note / outer-stem
    pub use_outer_placement: bool,
    pub connect_styles: Vec<ConnectStyleOffset>,
    pub after_single_dot: Evpu,
    pub after_multiple_dots: Evpu,
    pub before_single_acci: Evpu,
    pub seconds_placement: Evpu,
    pub sys_break_left_h_adj: Evpu,
    pub sys_break_right_h_adj: Evpu,
    pub control_styles: TieControlStyles,
    /// Interpolate control points between span styles
    pub use_interpolation: bool,
}

impl Default for TieOptions {
    fn default() -> Self {
        TieOptions {
            part: 0,
            mixed_stem_direction: MixedStemDirection::OppositeFirst,
            chord_tie_dir_type: ChordTieDirType::StemReversal,
            chord_tie_dir_opposing_seconds: true,
            use_outer_placement: true,
            connect_styles: Vec::new(),
            after_single_dot: 2,
            after_multiple_dots: 5,
            before_single_acci: -3,
            seconds_placement: 12,
            sys_break_left_h_adj: 9,
            sys_break_right_h_adj: -9,
            control_styles: TieControlStyles::default(),
            use_interpolation: true,
        }
    }
}

impl TieOptions {
    pub fn connect_style_offset(&self, style: TieConnectStyleType) -> Option<&ConnectStyleOffset> {
        self.connect_styles.iter().find(|offset| offset.style == style)
    }

    pub fn control_style(&self, style: ContourStyleType) -> &ControlStyle {
        match style {
            ContourStyleType::ShortSpan => &self.control_styles.short_span,
            ContourStyleType::MediumSpan => &self.control_styles.medium_span,
            ContourStyleType::LongSpan => &self.control_styles.long_span,
            ContourStyleType::TieEnds => &self.control_styles.tie_ends,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteRestOptions {
    pub part: PartId,
    /// Cross-staff notes are drawn on their target staff
    pub do_cross_staff_notes: bool,
}

impl Default for NoteRestOptions {
    fn default() -> Self {
        NoteRestOptions { part: 0, do_cross_staff_notes: true }
    }
}

/// One clef definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClefDef {
    /// Staff position of middle C, relative to the top staff line
    pub middle_c_pos: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClefOptions {
    pub part: PartId,
    pub clef_defs: Vec<ClefDef>,
}

impl Default for ClefOptions {
    fn default() -> Self {
        ClefOptions {
            part: 0,
            // treble, alto, tenor, bass
            clef_defs: vec![
                ClefDef { middle_c_pos: -10 },
                ClefDef { middle_c_pos: -4 },
                ClefDef { middle_c_pos: -2 },
                ClefDef { middle_c_pos: 2 },
            ],
        }
    }
}
