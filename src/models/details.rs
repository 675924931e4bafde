//! Detail records: data attached to a staff/measure pair, an entry or a note

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::options::{BeamingStyle, ContourStyleType};
use super::{
    ClefIndex, Cmper, Edu, EduFraction, EntryNumber, Evpu, Fraction, MeasureId, NoteNumber,
    PartId, StaffId, MAX_LAYERS,
};

/// Frame holder for one staff in one measure: the frame of each layer plus clef info
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameHold {
    pub part: PartId,
    pub staff: StaffId,
    pub measure: MeasureId,
    /// Single clef when the measure has no clef changes
    pub clef_id: Option<ClefIndex>,
    /// Clef list id when the measure has mid-measure clef changes
    pub clef_list_id: Cmper,
    /// Frame cmper per layer, 0 when the layer is empty
    pub frames: [Cmper; MAX_LAYERS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TupletNumberStyle {
    Nothing = 0,
    #[default]
    Number = 1,
    UseRatio = 2,
    RatioPlusBothNotes = 3,
    RatioPlusDenominatorNote = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TupletBracketStyle {
    Nothing = 0,
    Slur = 1,
    #[default]
    Bracket = 2,
}

/// A tuplet starting on an entry: `display_number` notes of `display_duration`
/// in the time of `reference_number` notes of `reference_duration`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TupletDef {
    pub part: PartId,
    pub entnum: EntryNumber,
    pub display_number: i32,
    pub display_duration: Edu,
    pub reference_number: i32,
    pub reference_duration: Edu,
    pub hidden: bool,
    pub num_style: TupletNumberStyle,
    pub brack_style: TupletBracketStyle,
}

impl TupletDef {
    pub fn calc_reference_duration(&self) -> Fraction {
        Fraction::from_edu(self.reference_number * self.reference_duration)
    }

    pub fn calc_display_duration(&self) -> Fraction {
        Fraction::from_edu(self.display_number * self.display_duration)
    }

    /// Reference duration over display duration.
    ///
    /// `None` when the display duration is zero; the record is then unusable.
    pub fn calc_ratio(&self) -> Option<Fraction> {
        let display = i64::from(self.display_number) * i64::from(self.display_duration);
        if display == 0 {
            return None;
        }
        let reference = i64::from(self.reference_number) * i64::from(self.reference_duration);
        Some(Fraction::new(reference, display))
    }

    /// Neither number nor bracket is drawn
    pub fn is_invisible(&self) -> bool {
        self.hidden
            || (self.num_style == TupletNumberStyle::Nothing
                && self.brack_style == TupletBracketStyle::Nothing)
    }
}

/// Selects the up-stem or down-stem flavor of a record kind
pub trait StemSide {
    const INDEX: usize;
    const IS_DOWNSTEM: bool;

    /// Vertical sign of beam growth: -1 grows upward, +1 downward
    fn direction() -> i32 {
        if Self::IS_DOWNSTEM {
            1
        } else {
            -1
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UpStem;

#[derive(Debug, Clone, Copy)]
pub struct DownStem;

impl StemSide for UpStem {
    const INDEX: usize = 0;
    const IS_DOWNSTEM: bool = false;
}

impl StemSide for DownStem {
    const INDEX: usize = 1;
    const IS_DOWNSTEM: bool = true;
}

/// Beam extension for the beam that starts on `entnum`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamExtension {
    pub part: PartId,
    pub entnum: EntryNumber,
    pub left_offset: Evpu,
    pub right_offset: Evpu,
    /// Beams extended, as the EDU value of the shortest extended note type
    pub mask: u32,
}

/// Primary or secondary beam alteration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamAlteration {
    pub part: PartId,
    pub entnum: EntryNumber,
    /// The beaming style this alteration was made under
    pub flatten_style: BeamingStyle,
    pub left_offset_y: Evpu,
    pub right_offset_y: Evpu,
    /// Beam width in EFIX, negative for the document default
    pub beam_width: i32,
    #[serde(skip)]
    pub(crate) active: bool,
}

impl BeamAlteration {
    /// Only alterations made under the document's current beaming style apply
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Secondary beam breaks on an entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryBeamBreak {
    pub part: PartId,
    pub entnum: EntryNumber,
    /// Bit 0 breaks the 16th beam, bit 1 the 32nd beam, ...
    pub mask: u32,
}

impl SecondaryBeamBreak {
    /// Lowest beam number that breaks (2 is the 16th beam), or 0 for none
    pub fn calc_lowest_break(&self) -> u32 {
        if self.mask == 0 {
            return 0;
        }
        self.mask.trailing_zeros() + 2
    }
}

/// Manual beam stub direction for an entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamStubDirection {
    pub part: PartId,
    pub entnum: EntryNumber,
    pub left: bool,
}

/// Custom stem shape for an entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomStem {
    pub part: PartId,
    pub entnum: EntryNumber,
    /// Shape used for the stem, 0 for none (which hides the stem)
    pub shape_def: Cmper,
}

/// Notehead alterations for one note
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteAlterations {
    pub part: PartId,
    pub entnum: EntryNumber,
    pub note_id: NoteNumber,
    /// Replacement notehead character, `' '` for a blank notehead
    pub alt_nhead: char,
    pub custom_font_hidden: bool,
    pub enharmonic: bool,
}

impl NoteAlterations {
    pub fn hides_notehead(&self) -> bool {
        self.alt_nhead == ' ' || self.custom_font_hidden
    }
}

/// A note placed on another staff
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossStaff {
    pub part: PartId,
    pub entnum: EntryNumber,
    pub note_id: NoteNumber,
    pub staff: StaffId,
}

/// Per-tie overrides for one end of a tie
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TieAlteration {
    pub part: PartId,
    pub entnum: EntryNumber,
    pub note_id: NoteNumber,
    pub freeze_direction: bool,
    /// With `freeze_direction`, the tie curves down
    pub down: bool,
    /// `outer_on` overrides the document's outer placement option
    pub outer_local: bool,
    pub outer_on: bool,
    /// `x_offset`/`y_offset` replace the connect-style offsets
    pub offset_local: bool,
    pub x_offset: Evpu,
    pub y_offset: Evpu,
    /// Contour style fixed for this tie
    pub fixed_contour: Option<ContourStyleType>,
}
