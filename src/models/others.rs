//! Records keyed by a single cmper: frames, measures, staves and friends

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::{
    ClefIndex, Cmper, Edu, EduFraction, EntryNumber, Fraction, KeySignature, LayerIndex,
    MeasureId, PartId, StaffId,
};

/// The span of raw entries one layer of one measure holds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Frame {
    pub part: PartId,
    pub cmper: Cmper,
    pub inci: u16,
    pub start_entry: EntryNumber,
    pub end_entry: EntryNumber,
    /// Elapsed position of the first entry, for frames that start mid-measure
    pub start_time: Edu,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Measure {
    pub part: PartId,
    pub cmper: MeasureId,
    pub beats: i32,
    pub div_beat: Edu,
    pub key: KeySignature,
}

impl Default for Measure {
    fn default() -> Self {
        Measure { part: 0, cmper: 0, beats: 4, div_beat: 1024, key: KeySignature::default() }
    }
}

impl Measure {
    /// Nominal measure length from its time signature
    pub fn calc_duration(&self) -> Fraction {
        Fraction::from_edu(self.beats * self.div_beat)
    }
}

/// A staff-specific time signature differing from the measure's
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndependentTimeSig {
    pub part: PartId,
    pub staff: StaffId,
    pub measure: MeasureId,
    pub beats: i32,
    pub div_beat: Edu,
}

impl IndependentTimeSig {
    pub fn calc_duration(&self) -> Fraction {
        Fraction::from_edu(self.beats * self.div_beat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum StemDirection {
    #[default]
    Default = 0,
    AlwaysUp = 1,
    AlwaysDown = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum AlternateNotation {
    #[default]
    Normal = 0,
    SlashBeats = 1,
    Rhythmic = 2,
    Blank = 3,
    BlankWithRests = 4,
}

/// Transposition that may replace the staff's clef
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffTransposition {
    pub set_to_clef: bool,
    pub transposed_clef: ClefIndex,
}

/// Staff definition, or a composite staff with its staff styles applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Staff {
    pub part: PartId,
    pub cmper: StaffId,
    /// Staff position at and above which stems point down by default
    pub stem_reversal: i32,
    pub hide_stems: bool,
    pub hide_beams: bool,
    pub stem_direction: StemDirection,
    pub alt_notation: AlternateNotation,
    pub alt_notation_layer: LayerIndex,
    pub alt_rhythm_stems_up: bool,
    /// Staff keeps its own time signatures
    pub float_time: bool,
    pub transposition: Option<StaffTransposition>,
    pub default_clef: ClefIndex,
}

impl Default for Staff {
    fn default() -> Self {
        Staff {
            part: 0,
            cmper: 0,
            stem_reversal: -4,
            hide_stems: false,
            hide_beams: false,
            stem_direction: StemDirection::Default,
            alt_notation: AlternateNotation::Normal,
            alt_notation_layer: 0,
            alt_rhythm_stems_up: false,
            float_time: false,
            transposition: None,
            default_clef: 0,
        }
    }
}

/// Staff with every staff style active at a position applied
pub type StaffComposite = Staff;

impl Staff {
    /// Alternate notation of this layer draws no entries
    pub fn calc_alternate_notation_hides_entries(&self, layer: LayerIndex) -> bool {
        self.alt_notation_layer == layer
            && matches!(self.alt_notation, AlternateNotation::Blank | AlternateNotation::BlankWithRests)
    }

    fn apply_style(&mut self, style: &StaffStyle) {
        if let Some(value) = style.stem_reversal {
            self.stem_reversal = value;
        }
        if let Some(value) = style.hide_stems {
            self.hide_stems = value;
        }
        if let Some(value) = style.hide_beams {
            self.hide_beams = value;
        }
        if let Some(value) = style.stem_direction {
            self.stem_direction = value;
        }
        if let Some(value) = style.alt_notation {
            self.alt_notation = value;
        }
        if let Some(value) = style.alt_notation_layer {
            self.alt_notation_layer = value;
        }
        if let Some(value) = style.alt_rhythm_stems_up {
            self.alt_rhythm_stems_up = value;
        }
        if let Some(value) = style.float_time {
            self.float_time = value;
        }
    }

    pub(crate) fn with_styles<'a>(&self, styles: impl IntoIterator<Item = &'a StaffStyle>) -> StaffComposite {
        let mut composite = self.clone();
        for style in styles {
            composite.apply_style(style);
        }
        composite
    }
}

/// Partial staff overrides; `None` fields leave the staff unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffStyle {
    pub part: PartId,
    pub cmper: Cmper,
    pub stem_reversal: Option<i32>,
    pub hide_stems: Option<bool>,
    pub hide_beams: Option<bool>,
    pub stem_direction: Option<StemDirection>,
    pub alt_notation: Option<AlternateNotation>,
    pub alt_notation_layer: Option<LayerIndex>,
    pub alt_rhythm_stems_up: Option<bool>,
    pub float_time: Option<bool>,
}

/// Assignment of a staff style to a range of a staff
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffStyleAssign {
    pub part: PartId,
    pub staff: StaffId,
    pub style_id: Cmper,
    pub start_measure: MeasureId,
    pub start_edu: Edu,
    pub end_measure: MeasureId,
    pub end_edu: Edu,
}

impl StaffStyleAssign {
    pub fn covers(&self, measure: MeasureId, edu: Edu) -> bool {
        (self.start_measure, self.start_edu) <= (measure, edu)
            && (measure, edu) <= (self.end_measure, self.end_edu)
    }
}

/// One clef of a mid-measure clef change list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClefListItem {
    pub part: PartId,
    pub cmper: Cmper,
    pub inci: u16,
    pub clef_index: ClefIndex,
    pub x_edu_pos: Edu,
}

/// Per-layer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerAttributes {
    pub part: PartId,
    pub layer: LayerIndex,
    /// Freeze stems (and optionally ties) of this layer
    pub freeze_layer: bool,
    pub freeze_stems_up: bool,
    /// Ties follow the frozen stem direction
    pub freeze_ties_to_stems: bool,
    pub only_if_other_layers_have_notes: bool,
    pub ignore_hidden_notes_only: bool,
    pub ignore_hidden_layers: bool,
    pub hide_layer: bool,
}

/// Shape definition; only whether it draws anything matters here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDef {
    pub part: PartId,
    pub cmper: Cmper,
    pub blank: bool,
}

/// Staff order of a system or of the scroll view
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffList {
    pub part: PartId,
    pub cmper: Cmper,
    pub staves: Vec<StaffId>,
}

/// Cmper of the scroll-view staff list
pub const SCROLL_VIEW_ID: Cmper = 0xFFFE;

impl StaffList {
    pub fn index_of(&self, staff: StaffId) -> Option<usize> {
        self.staves.iter().position(|&id| id == staff)
    }
}
