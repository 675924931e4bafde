//! Two-phase document construction
//!
//! A [`RawDocument`] is deserialized as-is. [`Document::finalize`] indexes its
//! records by `(part, key)`, derives entry locations and beam-alteration
//! activity, and produces a document that is never mutated again.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{
    BeamAlteration, BeamExtension, BeamOptions, BeamStubDirection, ClefListItem, ClefOptions,
    Cmper, CrossStaff, CustomStem, Edu, Entry, EntryLocation, EntryNumber, Fraction, Frame,
    FrameHold, IndependentTimeSig, LayerAttributes, LayerIndex, Measure, MeasureId,
    NoteAlterations, NoteNumber, NoteRestOptions, PartId, SecondaryBeamBreak, ShapeDef, Staff,
    StaffComposite, StaffId, StaffList, StaffStyle, StaffStyleAssign, StemSide, TieAlteration,
    TieOptions, TupletDef, SCORE_PARTID, SCROLL_VIEW_ID,
};
use crate::error::{report, DocumentError, IntegrityError, Result};

pub type DocumentPtr = Rc<Document>;

/// Records of one kind, indexed by part and key.
///
/// Lookups fall back from the requested part to the score.
#[derive(Debug, Clone)]
pub struct RecordTable<K, V> {
    map: HashMap<(PartId, K), Vec<V>>,
}

impl<K, V> Default for RecordTable<K, V> {
    fn default() -> Self {
        RecordTable { map: HashMap::new() }
    }
}

impl<K: Copy + Eq + Hash, V> RecordTable<K, V> {
    fn push(&mut self, part: PartId, key: K, value: V) {
        self.map.entry((part, key)).or_default().push(value);
    }

    fn contains(&self, part: PartId, key: K) -> bool {
        self.map.contains_key(&(part, key))
    }

    /// Every record for the key, in load order
    pub fn get_array(&self, part: PartId, key: K) -> &[V] {
        if part != SCORE_PARTID {
            if let Some(values) = self.map.get(&(part, key)) {
                return values;
            }
        }
        self.map.get(&(SCORE_PARTID, key)).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, part: PartId, key: K) -> Option<&V> {
        self.get_array(part, key).first()
    }

    /// Records stored directly under `part`, without inheritance
    fn iter_part(&self, part: PartId) -> impl Iterator<Item = (K, &[V])> + '_ {
        self.map
            .iter()
            .filter(move |((p, _), _)| *p == part)
            .map(|((_, key), values)| (*key, values.as_slice()))
    }
}

/// Document records as deserialized, before any derivation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    pub entries: Vec<Entry>,
    pub frame_holds: Vec<FrameHold>,
    pub frames: Vec<Frame>,
    pub measures: Vec<Measure>,
    pub staves: Vec<Staff>,
    pub staff_styles: Vec<StaffStyle>,
    pub staff_style_assigns: Vec<StaffStyleAssign>,
    pub clef_lists: Vec<ClefListItem>,
    pub layer_attributes: Vec<LayerAttributes>,
    pub tuplets: Vec<TupletDef>,
    pub beam_extensions_up: Vec<BeamExtension>,
    pub beam_extensions_down: Vec<BeamExtension>,
    pub beam_alterations_up: Vec<BeamAlteration>,
    pub beam_alterations_down: Vec<BeamAlteration>,
    pub secondary_beam_alterations_up: Vec<BeamAlteration>,
    pub secondary_beam_alterations_down: Vec<BeamAlteration>,
    pub secondary_beam_breaks: Vec<SecondaryBeamBreak>,
    pub beam_stub_directions: Vec<BeamStubDirection>,
    pub custom_stems_up: Vec<CustomStem>,
    pub custom_stems_down: Vec<CustomStem>,
    pub shape_defs: Vec<ShapeDef>,
    pub note_alterations: Vec<NoteAlterations>,
    pub cross_staffs: Vec<CrossStaff>,
    pub tie_alterations_start: Vec<TieAlteration>,
    pub tie_alterations_end: Vec<TieAlteration>,
    pub staff_lists: Vec<StaffList>,
    pub independent_time_sigs: Vec<IndependentTimeSig>,
    pub beam_options: Vec<BeamOptions>,
    pub tie_options: Vec<TieOptions>,
    pub note_rest_options: Vec<NoteRestOptions>,
    pub clef_options: Vec<ClefOptions>,
}

type NoteKey = (EntryNumber, NoteNumber);

/// Finalized, immutable document
#[derive(Debug, Clone, Default)]
pub struct Document {
    entries: HashMap<EntryNumber, Entry>,
    frame_holds: RecordTable<(StaffId, MeasureId), FrameHold>,
    frames: RecordTable<Cmper, Frame>,
    measures: RecordTable<MeasureId, Measure>,
    staves: RecordTable<StaffId, Staff>,
    staff_styles: RecordTable<Cmper, StaffStyle>,
    staff_style_assigns: RecordTable<StaffId, StaffStyleAssign>,
    clef_lists: RecordTable<Cmper, ClefListItem>,
    layer_attributes: RecordTable<LayerIndex, LayerAttributes>,
    tuplets: RecordTable<EntryNumber, TupletDef>,
    beam_extensions: [RecordTable<EntryNumber, BeamExtension>; 2],
    beam_alterations: [RecordTable<EntryNumber, BeamAlteration>; 2],
    secondary_beam_alterations: [RecordTable<EntryNumber, BeamAlteration>; 2],
    secondary_beam_breaks: RecordTable<EntryNumber, SecondaryBeamBreak>,
    beam_stub_directions: RecordTable<EntryNumber, BeamStubDirection>,
    custom_stems: [RecordTable<EntryNumber, CustomStem>; 2],
    shape_defs: RecordTable<Cmper, ShapeDef>,
    note_alterations: RecordTable<NoteKey, NoteAlterations>,
    cross_staffs: RecordTable<NoteKey, CrossStaff>,
    tie_alterations: [RecordTable<NoteKey, TieAlteration>; 2],
    staff_lists: RecordTable<Cmper, StaffList>,
    independent_time_sigs: RecordTable<(StaffId, MeasureId), IndependentTimeSig>,
    beam_options: RecordTable<(), BeamOptions>,
    tie_options: RecordTable<(), TieOptions>,
    note_rest_options: RecordTable<(), NoteRestOptions>,
    clef_options: RecordTable<(), ClefOptions>,
    fallback_beam_options: BeamOptions,
    fallback_tie_options: TieOptions,
    fallback_note_rest_options: NoteRestOptions,
    fallback_clef_options: ClefOptions,
}

/// Score-part options record, reported and defaulted when missing
fn require_options<V: Default>(table: &mut RecordTable<(), V>, name: &'static str) -> Result<()> {
    if !table.contains(SCORE_PARTID, ()) {
        report(IntegrityError::MissingOptions(name))?;
        table.push(SCORE_PARTID, (), V::default());
    }
    Ok(())
}

fn index_by_entry<V>(records: Vec<V>, key: impl Fn(&V) -> (PartId, EntryNumber)) -> RecordTable<EntryNumber, V> {
    let mut table = RecordTable::default();
    for record in records {
        let (part, entnum) = key(&record);
        table.push(part, entnum, record);
    }
    table
}

fn index_by_note<V>(records: Vec<V>, key: impl Fn(&V) -> (PartId, NoteKey)) -> RecordTable<NoteKey, V> {
    let mut table = RecordTable::default();
    for record in records {
        let (part, note_key) = key(&record);
        table.push(part, note_key, record);
    }
    table
}

impl Document {
    /// Deserialize a raw document from JSON and finalize it
    pub fn from_json(json: &str) -> std::result::Result<DocumentPtr, DocumentError> {
        let raw: RawDocument = serde_json::from_str(json)?;
        Ok(Rc::new(Document::finalize(raw)?))
    }

    /// Index the raw records and run the one-time derivation passes
    pub fn finalize(raw: RawDocument) -> Result<Document> {
        let mut doc = Document::default();

        for options in raw.beam_options {
            doc.beam_options.push(options.part, (), options);
        }
        for options in raw.tie_options {
            doc.tie_options.push(options.part, (), options);
        }
        for options in raw.note_rest_options {
            doc.note_rest_options.push(options.part, (), options);
        }
        for options in raw.clef_options {
            doc.clef_options.push(options.part, (), options);
        }
        require_options(&mut doc.beam_options, "beam options")?;
        require_options(&mut doc.tie_options, "tie options")?;
        require_options(&mut doc.note_rest_options, "note and rest options")?;
        require_options(&mut doc.clef_options, "clef options")?;

        for entry in raw.entries {
            let entnum = entry.entnum;
            if doc.entries.insert(entnum, entry).is_some() {
                report(IntegrityError::InvalidRecord(format!("duplicate entry number {}", entnum)))?;
            }
        }
        for hold in raw.frame_holds {
            doc.frame_holds.push(hold.part, (hold.staff, hold.measure), hold);
        }
        for frame in raw.frames {
            doc.frames.push(frame.part, frame.cmper, frame);
        }
        for measure in raw.measures {
            doc.measures.push(measure.part, measure.cmper, measure);
        }
        for staff in raw.staves {
            doc.staves.push(staff.part, staff.cmper, staff);
        }
        for style in raw.staff_styles {
            doc.staff_styles.push(style.part, style.cmper, style);
        }
        for assign in raw.staff_style_assigns {
            doc.staff_style_assigns.push(assign.part, assign.staff, assign);
        }
        for item in raw.clef_lists {
            doc.clef_lists.push(item.part, item.cmper, item);
        }
        for attributes in raw.layer_attributes {
            doc.layer_attributes.push(attributes.part, attributes.layer, attributes);
        }
        for shape in raw.shape_defs {
            doc.shape_defs.push(shape.part, shape.cmper, shape);
        }
        for list in raw.staff_lists {
            doc.staff_lists.push(list.part, list.cmper, list);
        }
        for time_sig in raw.independent_time_sigs {
            doc.independent_time_sigs.push(time_sig.part, (time_sig.staff, time_sig.measure), time_sig);
        }

        doc.tuplets = index_by_entry(raw.tuplets, |t| (t.part, t.entnum));
        doc.beam_extensions = [
            index_by_entry(raw.beam_extensions_up, |b| (b.part, b.entnum)),
            index_by_entry(raw.beam_extensions_down, |b| (b.part, b.entnum)),
        ];
        let alterations = [
            raw.beam_alterations_up,
            raw.beam_alterations_down,
            raw.secondary_beam_alterations_up,
            raw.secondary_beam_alterations_down,
        ]
        .map(|mut records| {
            for alteration in records.iter_mut() {
                alteration.active =
                    alteration.flatten_style == doc.beam_options(alteration.part).beaming_style;
            }
            index_by_entry(records, |b| (b.part, b.entnum))
        });
        let [primary_up, primary_down, secondary_up, secondary_down] = alterations;
        doc.beam_alterations = [primary_up, primary_down];
        doc.secondary_beam_alterations = [secondary_up, secondary_down];
        doc.secondary_beam_breaks = index_by_entry(raw.secondary_beam_breaks, |b| (b.part, b.entnum));
        doc.beam_stub_directions = index_by_entry(raw.beam_stub_directions, |b| (b.part, b.entnum));
        doc.custom_stems = [
            index_by_entry(raw.custom_stems_up, |s| (s.part, s.entnum)),
            index_by_entry(raw.custom_stems_down, |s| (s.part, s.entnum)),
        ];
        doc.note_alterations = index_by_note(raw.note_alterations, |n| (n.part, (n.entnum, n.note_id)));
        doc.cross_staffs = index_by_note(raw.cross_staffs, |n| (n.part, (n.entnum, n.note_id)));
        doc.tie_alterations = [
            index_by_note(raw.tie_alterations_start, |t| (t.part, (t.entnum, t.note_id))),
            index_by_note(raw.tie_alterations_end, |t| (t.part, (t.entnum, t.note_id))),
        ];

        doc.calc_entry_locations()?;

        log::debug!(
            "finalized document: {} entries, {} frame holds",
            doc.entries.len(),
            doc.frame_holds.map.len()
        );
        Ok(doc)
    }

    fn calc_entry_locations(&mut self) -> Result<()> {
        let mut found: Vec<(EntryNumber, EntryLocation)> = Vec::new();
        let mut holds: Vec<&FrameHold> = self
            .frame_holds
            .iter_part(SCORE_PARTID)
            .filter_map(|(_, holds)| holds.first())
            .collect();
        holds.sort_by_key(|hold| (hold.staff, hold.measure));
        for hold in holds {
            for (layer, &frame_id) in hold.frames.iter().enumerate() {
                if frame_id == 0 {
                    continue;
                }
                let frames = self.frames.get_array(SCORE_PARTID, frame_id);
                if frames.is_empty() {
                    report(IntegrityError::MissingFrame {
                        staff: hold.staff,
                        measure: hold.measure,
                        layer,
                        frame: frame_id,
                    })?;
                    continue;
                }
                let location = EntryLocation { staff: hold.staff, measure: hold.measure, layer };
                for frame in frames {
                    for entry in self.frame_entries(frame)? {
                        found.push((entry.entnum, location));
                    }
                }
            }
        }
        for (entnum, location) in found {
            if let Some(entry) = self.entries.get_mut(&entnum) {
                entry.locations.push(location);
            }
        }
        Ok(())
    }

    pub fn entry(&self, entnum: EntryNumber) -> Option<&Entry> {
        self.entries.get(&entnum)
    }

    /// Raw entries of a frame, following `next` links from its start to its end entry
    pub fn frame_entries(&self, frame: &Frame) -> Result<Vec<&Entry>> {
        let mut result: Vec<&Entry> = Vec::new();
        let mut current = frame.start_entry;
        while current != 0 {
            let Some(entry) = self.entries.get(&current) else {
                let referrer = match result.last() {
                    Some(prev) => format!("entry {}", prev.entnum),
                    None => format!("frame {} of part {}", frame.cmper, frame.part),
                };
                report(IntegrityError::missing_entry(current, referrer))?;
                break;
            };
            result.push(entry);
            if current == frame.end_entry || result.len() > self.entries.len() {
                break;
            }
            current = entry.next;
        }
        Ok(result)
    }

    pub fn frame_hold(&self, part: PartId, staff: StaffId, measure: MeasureId) -> Option<&FrameHold> {
        self.frame_holds.get(part, (staff, measure))
    }

    pub fn frames(&self, part: PartId, cmper: Cmper) -> &[Frame] {
        self.frames.get_array(part, cmper)
    }

    pub fn measure(&self, part: PartId, measure: MeasureId) -> Option<&Measure> {
        self.measures.get(part, measure)
    }

    pub fn staff(&self, part: PartId, staff: StaffId) -> Option<&Staff> {
        self.staves.get(part, staff)
    }

    /// Staff with all staff styles covering `(measure, edu)` applied.
    ///
    /// `None` when the staff itself does not exist.
    pub fn create_staff_composite(
        &self,
        part: PartId,
        staff: StaffId,
        measure: MeasureId,
        edu: Edu,
    ) -> Result<Option<StaffComposite>> {
        let Some(base) = self.staff(part, staff) else {
            return Ok(None);
        };
        let mut styles = Vec::new();
        for assign in self.staff_style_assigns.get_array(part, staff) {
            if !assign.covers(measure, edu) {
                continue;
            }
            match self.staff_styles.get(part, assign.style_id) {
                Some(style) => styles.push(style),
                None => report(IntegrityError::MissingRecord {
                    kind: "staff style",
                    key: assign.style_id.to_string(),
                    referrer: format!("staff {} measure {}", staff, measure),
                })?,
            }
        }
        Ok(Some(base.with_styles(styles)))
    }

    pub fn clef_list(&self, part: PartId, cmper: Cmper) -> &[ClefListItem] {
        self.clef_lists.get_array(part, cmper)
    }

    pub fn layer_attributes(&self, part: PartId, layer: LayerIndex) -> Option<&LayerAttributes> {
        self.layer_attributes.get(part, layer)
    }

    pub fn tuplets(&self, part: PartId, entnum: EntryNumber) -> &[TupletDef] {
        self.tuplets.get_array(part, entnum)
    }

    pub fn beam_extension<S: StemSide>(&self, part: PartId, entnum: EntryNumber) -> Option<&BeamExtension> {
        self.beam_extensions[S::INDEX].get(part, entnum)
    }

    pub fn beam_alteration<S: StemSide>(&self, part: PartId, entnum: EntryNumber) -> Option<&BeamAlteration> {
        self.beam_alterations[S::INDEX].get(part, entnum)
    }

    pub fn secondary_beam_alterations<S: StemSide>(&self, part: PartId, entnum: EntryNumber) -> &[BeamAlteration] {
        self.secondary_beam_alterations[S::INDEX].get_array(part, entnum)
    }

    pub fn secondary_beam_break(&self, part: PartId, entnum: EntryNumber) -> Option<&SecondaryBeamBreak> {
        self.secondary_beam_breaks.get(part, entnum)
    }

    pub fn beam_stub_direction(&self, part: PartId, entnum: EntryNumber) -> Option<&BeamStubDirection> {
        self.beam_stub_directions.get(part, entnum)
    }

    pub fn custom_stem<S: StemSide>(&self, part: PartId, entnum: EntryNumber) -> Option<&CustomStem> {
        self.custom_stems[S::INDEX].get(part, entnum)
    }

    pub fn shape_def(&self, part: PartId, cmper: Cmper) -> Option<&ShapeDef> {
        self.shape_defs.get(part, cmper)
    }

    pub fn note_alterations(&self, part: PartId, entnum: EntryNumber, note_id: NoteNumber) -> Option<&NoteAlterations> {
        self.note_alterations.get(part, (entnum, note_id))
    }

    pub fn cross_staff(&self, part: PartId, entnum: EntryNumber, note_id: NoteNumber) -> Option<&CrossStaff> {
        self.cross_staffs.get(part, (entnum, note_id))
    }

    pub fn tie_alteration(
        &self,
        part: PartId,
        entnum: EntryNumber,
        note_id: NoteNumber,
        for_tie_end: bool,
    ) -> Option<&TieAlteration> {
        self.tie_alterations[usize::from(for_tie_end)].get(part, (entnum, note_id))
    }

    pub fn scroll_view(&self, part: PartId) -> Option<&StaffList> {
        self.staff_lists.get(part, SCROLL_VIEW_ID)
    }

    pub fn independent_time_sig(&self, part: PartId, staff: StaffId, measure: MeasureId) -> Option<&IndependentTimeSig> {
        self.independent_time_sigs.get(part, (staff, measure))
    }

    /// Ratio of the measure's length to the staff's own time signature
    pub fn calc_time_stretch(&self, part: PartId, staff: StaffId, measure: MeasureId) -> Fraction {
        let one = Fraction::from_integer(1);
        let (Some(measure_rec), Some(time_sig)) =
            (self.measure(part, measure), self.independent_time_sig(part, staff, measure))
        else {
            return one;
        };
        let staff_duration = time_sig.calc_duration();
        if *staff_duration.numer() == 0 {
            return one;
        }
        measure_rec.calc_duration() / staff_duration
    }

    pub fn beam_options(&self, part: PartId) -> &BeamOptions {
        self.beam_options.get(part, ()).unwrap_or(&self.fallback_beam_options)
    }

    pub fn tie_options(&self, part: PartId) -> &TieOptions {
        self.tie_options.get(part, ()).unwrap_or(&self.fallback_tie_options)
    }

    pub fn note_rest_options(&self, part: PartId) -> &NoteRestOptions {
        self.note_rest_options.get(part, ()).unwrap_or(&self.fallback_note_rest_options)
    }

    pub fn clef_options(&self, part: PartId) -> &ClefOptions {
        self.clef_options.get(part, ()).unwrap_or(&self.fallback_clef_options)
    }
}
