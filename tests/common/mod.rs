//! Shared fixtures: a one-staff score assembled measure by measure

#![allow(dead_code)]

use std::rc::Rc;

use notation_core::models::{
    BeamOptions, ClefOptions, Document, DocumentPtr, Edu, Entry, EntryNumber, Frame, FrameHold,
    Measure, MeasureId, Note, NoteRestOptions, RawDocument, Staff, TieOptions, TupletDef,
};
use notation_core::{build_frame, EntryCursor, EntryFramePtr};

pub const STAFF: u16 = 1;
pub const SIXTEENTH: Edu = 256;
pub const EIGHTH: Edu = 512;
pub const QUARTER: Edu = 1024;

/// Builds a document with one staff; every measure gets a layer 1 frame
pub struct ScoreBuilder {
    pub raw: RawDocument,
    next_entnum: EntryNumber,
}

impl ScoreBuilder {
    pub fn new() -> Self {
        let raw = RawDocument {
            beam_options: vec![BeamOptions::default()],
            tie_options: vec![TieOptions::default()],
            note_rest_options: vec![NoteRestOptions::default()],
            clef_options: vec![ClefOptions::default()],
            staves: vec![Staff { cmper: STAFF, ..Default::default() }],
            ..Default::default()
        };
        ScoreBuilder { raw, next_entnum: 1 }
    }

    /// Add a measure holding `entries` in layer 1; returns their entry numbers
    pub fn measure(&mut self, measure: MeasureId, entries: Vec<Entry>) -> Vec<EntryNumber> {
        let numbers = self.push_entries(entries);
        self.raw.measures.push(Measure { cmper: measure, ..Default::default() });
        self.raw.frames.push(Frame {
            cmper: measure,
            start_entry: numbers.first().copied().unwrap_or(0),
            end_entry: numbers.last().copied().unwrap_or(0),
            ..Default::default()
        });
        self.raw.frame_holds.push(FrameHold {
            staff: STAFF,
            measure,
            clef_id: Some(0),
            frames: [measure, 0, 0, 0],
            ..Default::default()
        });
        numbers
    }

    /// Fill another layer of a measure added earlier
    pub fn layer(&mut self, measure: MeasureId, layer: usize, entries: Vec<Entry>) -> Vec<EntryNumber> {
        let numbers = self.push_entries(entries);
        let cmper = measure + 100 * layer as MeasureId;
        self.raw.frames.push(Frame {
            cmper,
            start_entry: numbers.first().copied().unwrap_or(0),
            end_entry: numbers.last().copied().unwrap_or(0),
            ..Default::default()
        });
        let hold = self
            .raw
            .frame_holds
            .iter_mut()
            .find(|hold| hold.measure == measure)
            .expect("measure added before its layers");
        hold.frames[layer] = cmper;
        numbers
    }

    fn push_entries(&mut self, entries: Vec<Entry>) -> Vec<EntryNumber> {
        let first = self.next_entnum;
        let count = entries.len() as EntryNumber;
        let numbers: Vec<EntryNumber> = (first..first + count).collect();
        for (offset, mut entry) in entries.into_iter().enumerate() {
            let entnum = numbers[offset];
            entry.entnum = entnum;
            entry.prev = if offset == 0 { 0 } else { entnum - 1 };
            entry.next = if offset + 1 == numbers.len() { 0 } else { entnum + 1 };
            self.raw.entries.push(entry);
        }
        self.next_entnum += count;
        numbers
    }

    pub fn tuplet(&mut self, entnum: EntryNumber, display: (i32, Edu), reference: (i32, Edu)) {
        self.raw.tuplets.push(TupletDef {
            entnum,
            display_number: display.0,
            display_duration: display.1,
            reference_number: reference.0,
            reference_duration: reference.1,
            ..Default::default()
        });
    }

    pub fn build(self) -> DocumentPtr {
        Rc::new(Document::finalize(self.raw).expect("fixture document finalizes"))
    }
}

pub fn note(duration: Edu, harm_levs: &[i32]) -> Entry {
    let mut entry = Entry::default();
    entry.duration = duration;
    entry.is_note = true;
    entry.notes = harm_levs
        .iter()
        .enumerate()
        .map(|(index, &harm_lev)| Note { note_id: index as u16 + 1, harm_lev, ..Default::default() })
        .collect();
    entry
}

pub fn rest(duration: Edu) -> Entry {
    let mut entry = Entry::default();
    entry.duration = duration;
    entry.is_note = false;
    entry
}

pub fn beam_start(mut entry: Entry) -> Entry {
    entry.beam = true;
    entry
}

pub fn hidden(mut entry: Entry) -> Entry {
    entry.is_hidden = true;
    entry
}

pub fn grace(mut entry: Entry) -> Entry {
    entry.grace_note = true;
    entry
}

pub fn tied_start(mut entry: Entry) -> Entry {
    for note in entry.notes.iter_mut() {
        note.tie_start = true;
    }
    entry
}

pub fn tied_end(mut entry: Entry) -> Entry {
    for note in entry.notes.iter_mut() {
        note.tie_end = true;
    }
    entry
}

pub fn frame(document: &DocumentPtr, measure: MeasureId) -> EntryFramePtr {
    build_frame(document, 0, STAFF, measure, 0)
        .expect("frame builds")
        .expect("layer 1 has a frame")
}

pub fn cursor(document: &DocumentPtr, measure: MeasureId, index: usize) -> EntryCursor {
    EntryCursor::new(frame(document, measure), index)
}
