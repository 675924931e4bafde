//! Entry frames: the time-stamped, tuplet-annotated entries of one layer
//!
//! A frame is built on demand from a frame hold (one staff in one measure) and
//! is immutable once built. Entries live in an owned vector; everything else
//! refers to them by index, so [`EntryCursor`]s stay valid however the frame
//! is moved or shared.

mod builder;
mod tuplet;

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{report, IntegrityError, Result};
use crate::models::{
    ClefIndex, DocumentPtr, Edu, EduFraction, Entry, Fraction, FrameHold, KeySignature,
    LayerAttributes, LayerIndex, MeasureId, PartId, StaffComposite, StaffId, MAX_LAYERS,
};
use crate::navigator::EntryCursor;

pub use tuplet::TupletInfo;

pub type EntryFramePtr = Rc<EntryFrame>;

/// Computed per-entry record owned by its frame
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    entry: Entry,
    /// Position of the entry within the measure, in whole notes
    pub elapsed_duration: Fraction,
    /// Duration after all active tuplets are applied; zero for graces
    pub actual_duration: Fraction,
    /// Clef index in the view (transposed clef if the staff sets one)
    pub clef_index: ClefIndex,
    pub clef_index_concert: ClefIndex,
    /// 1-based forward ordinal within a run of grace notes, 0 for non-graces
    pub grace_index: u32,
    /// 1-based ordinal counting back from the main entry, 0 for non-graces
    pub reverse_grace_index: u32,
    pub(crate) staff_index: usize,
}

impl EntryInfo {
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Elapsed duration of whatever follows this entry in its voice
    pub fn calc_next_elapsed_duration(&self) -> Fraction {
        self.elapsed_duration + self.actual_duration
    }
}

/// Frame hold for one (part, staff, measure), the source every frame is built from
#[derive(Debug, Clone)]
pub struct FrameHoldContext {
    document: DocumentPtr,
    part: PartId,
    hold: FrameHold,
}

impl FrameHoldContext {
    /// `None` when the staff has no frame hold in the measure
    pub fn new(document: &DocumentPtr, part: PartId, staff: StaffId, measure: MeasureId) -> Option<Self> {
        document.frame_hold(part, staff, measure).map(|hold| FrameHoldContext {
            document: Rc::clone(document),
            part,
            hold: hold.clone(),
        })
    }

    pub fn document(&self) -> &DocumentPtr {
        &self.document
    }

    pub fn requested_part(&self) -> PartId {
        self.part
    }

    pub fn staff(&self) -> StaffId {
        self.hold.staff
    }

    pub fn measure(&self) -> MeasureId {
        self.hold.measure
    }

    pub fn hold(&self) -> &FrameHold {
        &self.hold
    }

    /// More than one layer of the hold has a frame
    pub fn calc_is_multi_layer(&self) -> bool {
        self.hold.frames.iter().filter(|&&frame| frame != 0).count() > 1
    }

    pub fn create_entry_frame(&self, layer: LayerIndex) -> Result<Option<EntryFramePtr>> {
        builder::build(self, layer)
    }

    /// Clef in effect at an edu position of the measure
    pub fn calc_clef_index_at(&self, position: Edu) -> Result<ClefIndex> {
        if let Some(clef) = self.hold.clef_id {
            return Ok(clef);
        }
        let clef_list = self.document.clef_list(self.part, self.hold.clef_list_id);
        let Some(first) = clef_list.first() else {
            report(IntegrityError::MissingRecord {
                kind: "clef list",
                key: self.hold.clef_list_id.to_string(),
                referrer: format!("frame hold for staff {} measure {}", self.staff(), self.measure()),
            })?;
            return Ok(0);
        };
        let last = clef_list
            .iter()
            .take_while(|clef| clef.x_edu_pos <= position)
            .last()
            .unwrap_or(first);
        Ok(last.clef_index)
    }

    /// Visit every entry of one layer; returns false if the visitor stopped early
    pub fn iterate_entries(&self, layer: LayerIndex, mut visitor: impl FnMut(&EntryCursor) -> bool) -> Result<bool> {
        match self.create_entry_frame(layer)? {
            Some(frame) => Ok(iterate_entries(&frame, &mut visitor)),
            None => Ok(true),
        }
    }

    /// Visit every entry of every layer in layer order
    pub fn iterate_all_entries(&self, mut visitor: impl FnMut(&EntryCursor) -> bool) -> Result<bool> {
        for layer in 0..MAX_LAYERS {
            if !self.iterate_entries(layer, &mut visitor)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Layers with entries, mapped to whether they contain voice 2
    pub fn calc_voices(&self) -> Result<BTreeMap<LayerIndex, bool>> {
        let mut result = BTreeMap::new();
        for layer in 0..MAX_LAYERS {
            if let Some((frame, _)) = builder::find_layer_frame(self, layer)? {
                let entries = self.document.frame_entries(&frame)?;
                if !entries.is_empty() {
                    result.insert(layer, entries.iter().any(|entry| entry.voice2));
                }
            }
        }
        Ok(result)
    }

    /// Entry closest to an edu position, skipping graces.
    ///
    /// A difference of one edu counts as exact. With `find_exact` only exact
    /// matches are returned.
    pub fn calc_nearest_entry(
        &self,
        position: Edu,
        find_exact: bool,
        match_layer: Option<LayerIndex>,
        match_voice2: Option<bool>,
    ) -> Result<Option<EntryCursor>> {
        let mut result = None;
        let mut best_diff = Edu::MAX;
        let visitor = |cursor: &EntryCursor| {
            let entry = cursor.entry();
            if entry.grace_note {
                return true;
            }
            if match_voice2.is_some_and(|voice2| voice2 != entry.voice2) {
                return true;
            }
            let diff = (position - cursor.info().elapsed_duration.calc_edu_duration()).abs();
            if diff <= 1 {
                result = Some(cursor.clone());
                return false;
            }
            if !find_exact && diff < best_diff {
                best_diff = diff;
                result = Some(cursor.clone());
            }
            true
        };
        match match_layer {
            Some(layer) => self.iterate_entries(layer, visitor)?,
            None => self.iterate_all_entries(visitor)?,
        };
        Ok(result)
    }
}

/// The computed entries of one (part, staff, measure, layer)
#[derive(Debug, Clone)]
pub struct EntryFrame {
    context: FrameHoldContext,
    layer: LayerIndex,
    entries: Vec<EntryInfo>,
    pub tuplet_info: Vec<TupletInfo>,
    pub key_signature: KeySignature,
    time_stretch: Fraction,
    /// Distinct composite staves of the frame; index 0 is the staff at the barline
    staves: Vec<StaffComposite>,
}

impl EntryFrame {
    pub fn context(&self) -> &FrameHoldContext {
        &self.context
    }

    pub fn document(&self) -> &DocumentPtr {
        &self.context.document
    }

    pub fn requested_part(&self) -> PartId {
        self.context.part
    }

    pub fn staff(&self) -> StaffId {
        self.context.staff()
    }

    pub fn measure(&self) -> MeasureId {
        self.context.measure()
    }

    pub fn layer_index(&self) -> LayerIndex {
        self.layer
    }

    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ratio of the measure's length to this staff's own time signature
    pub fn time_stretch(&self) -> Fraction {
        self.time_stretch
    }

    pub fn start_staff(&self) -> &StaffComposite {
        &self.staves[0]
    }

    pub(crate) fn staff_at(&self, staff_index: usize) -> &StaffComposite {
        &self.staves[staff_index]
    }

    pub fn layer_attributes(&self) -> Option<&LayerAttributes> {
        self.document().layer_attributes(self.requested_part(), self.layer)
    }

    pub fn calc_are_all_entries_hidden(&self) -> bool {
        self.entries.iter().all(|info| info.entry.is_hidden)
    }

    /// First entry of voice 1 or 2
    pub fn first_in_voice(self: &Rc<Self>, voice: u8) -> Result<Option<EntryCursor>> {
        let for_v2 = voice == 2;
        let Some(first) = self.entries.first() else {
            return Ok(None);
        };
        let first_cursor = EntryCursor::new(Rc::clone(self), 0);
        if first.entry.voice2 {
            report(IntegrityError::InvalidRecord(format!(
                "entry frame for staff {} measure {} layer {} starts with voice 2",
                self.staff(),
                self.measure(),
                self.layer + 1
            )))?;
            if !for_v2 {
                return Ok(first_cursor.next_in_voice(voice));
            }
            return Ok(Some(first_cursor));
        }
        if for_v2 {
            return Ok(first_cursor.next_in_voice(voice));
        }
        Ok(Some(first_cursor))
    }

    /// Last entry of voice 1 or 2
    pub fn last_in_voice(self: &Rc<Self>, voice: u8) -> Option<EntryCursor> {
        let last_index = self.entries.len().checked_sub(1)?;
        let last = EntryCursor::new(Rc::clone(self), last_index);
        if last.entry().voice2 == (voice == 2) {
            return Some(last);
        }
        last.previous_in_voice(voice)
    }

    /// Same layer in the next measure
    pub fn next(&self) -> Result<Option<EntryFramePtr>> {
        let Some(measure) = self.measure().checked_add(1) else {
            return Ok(None);
        };
        match FrameHoldContext::new(self.document(), self.requested_part(), self.staff(), measure) {
            Some(context) => context.create_entry_frame(self.layer),
            None => Ok(None),
        }
    }

    /// Same layer in the previous measure
    pub fn previous(&self) -> Result<Option<EntryFramePtr>> {
        if self.measure() <= 1 {
            return Ok(None);
        }
        match FrameHoldContext::new(self.document(), self.requested_part(), self.staff(), self.measure() - 1) {
            Some(context) => context.create_entry_frame(self.layer),
            None => Ok(None),
        }
    }
}

/// Build the frame for one layer of one staff in one measure.
///
/// `Ok(None)` when the layer is empty, or when the frame cannot be built
/// and the integrity fault is tolerated.
pub fn build_frame(
    document: &DocumentPtr,
    part: PartId,
    staff: StaffId,
    measure: MeasureId,
    layer: LayerIndex,
) -> Result<Option<EntryFramePtr>> {
    match FrameHoldContext::new(document, part, staff, measure) {
        Some(context) => context.create_entry_frame(layer),
        None => Ok(None),
    }
}

/// Visit the entries of a frame in order; returns false if the visitor stopped early
pub fn iterate_entries(frame: &EntryFramePtr, mut visitor: impl FnMut(&EntryCursor) -> bool) -> bool {
    for index in 0..frame.len() {
        if !visitor(&EntryCursor::new(Rc::clone(frame), index)) {
            return false;
        }
    }
    true
}
