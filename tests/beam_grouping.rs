//! Beam groups, secondary beams, stubs, stems and beams over barlines

mod common;

use common::{beam_start, cursor, frame, hidden, note, rest, ScoreBuilder, EIGHTH, QUARTER, SIXTEENTH};
use notation_core::beam::FeatheredBeam;
use notation_core::models::{
    BeamAlteration, BeamExtension, CustomStem, DownStem, Entry, NoteAlterations, StemDirection, TupletDef,
    UpStem,
};
use notation_core::{iterate_entries, DocumentPtr, EntryCursor};

fn indices(group: impl Iterator<Item = EntryCursor>) -> Vec<usize> {
    group.map(|cursor| cursor.index()).collect()
}

fn single_measure(entries: Vec<Entry>, extend_over_rests: bool) -> DocumentPtr {
    let mut score = ScoreBuilder::new();
    score.raw.beam_options[0].extend_beams_over_rests = extend_over_rests;
    score.measure(1, entries);
    score.build()
}

fn assert_links_symmetric(document: &DocumentPtr) {
    iterate_entries(&frame(document, 1), |current| {
        if let Some(next) = current.next_in_beam_group(false) {
            let back = next.previous_in_beam_group(false);
            assert!(back.is_some_and(|back| back.is_same_entry(current)));
        }
        if let Some(prev) = current.previous_in_beam_group(false) {
            let forward = prev.next_in_beam_group(false);
            assert!(forward.is_some_and(|forward| forward.is_same_entry(current)));
        }
        true
    });
}

#[test]
fn test_trailing_rest_ends_beam_at_note() {
    let document = single_measure(
        vec![beam_start(note(SIXTEENTH, &[0])), note(SIXTEENTH, &[1]), rest(SIXTEENTH)],
        false,
    );
    let start = cursor(&document, 1, 0);
    assert!(start.calc_is_beam_start());
    assert_eq!(start.find_beam_end().map(|end| end.index()), Some(1));
    assert!(cursor(&document, 1, 1).next_in_beam_group(false).is_none());
    assert!(cursor(&document, 1, 2).calc_unbeamed());
    assert_links_symmetric(&document);
}

#[test]
fn test_extended_beam_spans_rest() {
    let entries = vec![
        beam_start(note(SIXTEENTH, &[0])),
        note(SIXTEENTH, &[1]),
        rest(SIXTEENTH),
        note(SIXTEENTH, &[2]),
    ];
    let document = single_measure(entries, true);
    let start = cursor(&document, 1, 0);
    assert_eq!(indices(start.beam_group()), vec![0, 1, 2, 3]);
    assert_eq!(start.find_beam_end().map(|end| end.index()), Some(3));
    assert!(cursor(&document, 1, 2).find_beam_start_or_current().is_same_entry(&start));
    assert_links_symmetric(&document);
}

#[test]
fn test_leading_rest_needs_extension() {
    let entries = vec![beam_start(rest(SIXTEENTH)), note(SIXTEENTH, &[0]), note(SIXTEENTH, &[1])];
    let document = single_measure(entries.clone(), false);
    assert!(cursor(&document, 1, 0).next_in_beam_group(false).is_none());
    assert!(cursor(&document, 1, 1).calc_is_beam_start());

    let document = single_measure(entries, true);
    assert!(cursor(&document, 1, 0).calc_is_beam_start());
    assert_eq!(indices(cursor(&document, 1, 0).beam_group()), vec![0, 1, 2]);
}

#[test]
fn test_beam_breaks_and_unbeamable_entries() {
    let entries = vec![
        beam_start(note(EIGHTH, &[0])),
        note(EIGHTH, &[1]),
        beam_start(note(EIGHTH, &[2])),
        note(EIGHTH, &[3]),
        note(QUARTER, &[4]),
        note(EIGHTH, &[5]),
    ];
    let document = single_measure(entries, false);
    assert_eq!(indices(cursor(&document, 1, 0).beam_group()), vec![0, 1]);
    assert_eq!(indices(cursor(&document, 1, 2).beam_group()), vec![2, 3]);
    assert!(!cursor(&document, 1, 4).can_be_beamed());
    assert!(cursor(&document, 1, 4).calc_unbeamed());
    assert!(cursor(&document, 1, 5).calc_unbeamed());
    assert!(cursor(&document, 1, 5).find_beam_end().is_none());
    assert_links_symmetric(&document);
}

#[test]
fn test_hidden_entries_skipped_unless_requested() {
    let entries = vec![beam_start(note(EIGHTH, &[0])), hidden(note(EIGHTH, &[1])), note(EIGHTH, &[2])];
    let document = single_measure(entries, false);
    let start = cursor(&document, 1, 0);
    assert_eq!(start.next_in_beam_group(false).map(|next| next.index()), Some(2));
    assert_eq!(start.next_in_beam_group(true).map(|next| next.index()), Some(1));
    assert!(!cursor(&document, 1, 1).calc_is_beam_start());
}

#[test]
fn test_hidden_stems_and_beams_prevent_beaming() {
    let mut score = ScoreBuilder::new();
    score.raw.staves[0].hide_beams = true;
    score.measure(1, vec![beam_start(note(EIGHTH, &[0])), note(EIGHTH, &[1])]);
    let document = score.build();
    assert!(!cursor(&document, 1, 0).can_be_beamed());
    assert!(!cursor(&document, 1, 0).calc_is_beam_start());
}

#[test]
fn test_secondary_beam_levels() {
    let document = single_measure(
        vec![beam_start(note(EIGHTH, &[0])), note(SIXTEENTH, &[1]), note(SIXTEENTH, &[2])],
        false,
    );
    let starts: Vec<u32> = (0..3).map(|index| cursor(&document, 1, index).calc_lowest_beam_start()).collect();
    let ends: Vec<u32> = (0..3).map(|index| cursor(&document, 1, index).calc_lowest_beam_end()).collect();
    assert_eq!(starts, vec![1, 2, 0]);
    assert_eq!(ends, vec![0, 0, 1]);
    assert_eq!(cursor(&document, 1, 1).calc_lowest_beam_stub(), 0);
    assert_eq!(cursor(&document, 1, 1).calc_number_of_beams(), 2);
}

#[test]
fn test_rest_carries_only_primary_beam() {
    let entries = vec![
        beam_start(note(SIXTEENTH, &[0])),
        rest(SIXTEENTH),
        note(SIXTEENTH, &[1]),
    ];
    let document = single_measure(entries.clone(), false);
    let rest_cursor = cursor(&document, 1, 1);
    assert_eq!(rest_cursor.calc_number_of_beams(), 2);
    assert_eq!(rest_cursor.calc_visible_beams(), 1);
    // the rest cuts the secondary beam back to the primary
    assert_eq!(cursor(&document, 1, 1).calc_lowest_beam_start(), 0);

    let mut score = ScoreBuilder::new();
    score.raw.beam_options[0].extend_sec_beams_over_rests = true;
    score.measure(1, entries);
    let document = score.build();
    assert_eq!(cursor(&document, 1, 1).calc_visible_beams(), 2);
}

#[test]
fn test_stub_follows_the_short_note() {
    let document = single_measure(vec![beam_start(note(768, &[0])), note(SIXTEENTH, &[1])], false);
    let short = cursor(&document, 1, 1);
    assert_eq!(short.calc_lowest_beam_stub(), 2);
    assert!(short.calc_beam_stub_is_left());

    let document = single_measure(vec![beam_start(note(SIXTEENTH, &[0])), note(768, &[1])], false);
    let short = cursor(&document, 1, 0);
    assert_eq!(short.calc_lowest_beam_stub(), 2);
    assert!(!short.calc_beam_stub_is_left());
}

#[test]
fn test_stub_between_neighbors_points_at_dotted_side() {
    let document = single_measure(
        vec![beam_start(note(768, &[0])), note(SIXTEENTH, &[1]), note(EIGHTH, &[2])],
        false,
    );
    assert!(cursor(&document, 1, 1).calc_beam_stub_is_left());

    let document = single_measure(
        vec![beam_start(note(EIGHTH, &[0])), note(SIXTEENTH, &[1]), note(768, &[2])],
        false,
    );
    assert!(!cursor(&document, 1, 1).calc_beam_stub_is_left());
}

#[test]
fn test_stem_direction_from_note_positions() {
    // middle C sits well below the stem reversal line
    let document = single_measure(vec![beam_start(note(EIGHTH, &[0])), note(EIGHTH, &[2])], false);
    assert!(cursor(&document, 1, 0).calc_up_stem().unwrap());
    assert!(cursor(&document, 1, 1).calc_up_stem().unwrap());

    let document = single_measure(vec![beam_start(note(EIGHTH, &[10])), note(EIGHTH, &[12])], false);
    assert!(!cursor(&document, 1, 0).calc_up_stem().unwrap());

    // the whole beam follows its most distant note
    let document = single_measure(vec![beam_start(note(EIGHTH, &[7])), note(EIGHTH, &[14])], false);
    assert!(!cursor(&document, 1, 0).calc_up_stem().unwrap());
}

#[test]
fn test_stem_direction_overrides() {
    let mut frozen = note(QUARTER, &[0]);
    frozen.freeze_stem = true;
    frozen.up_stem = false;
    let document = single_measure(vec![frozen], false);
    assert!(!cursor(&document, 1, 0).calc_up_stem().unwrap());

    let mut score = ScoreBuilder::new();
    score.raw.staves[0].stem_direction = StemDirection::AlwaysDown;
    score.measure(1, vec![note(QUARTER, &[0])]);
    let document = score.build();
    assert!(!cursor(&document, 1, 0).calc_up_stem().unwrap());
}

fn three_quarters() -> Vec<Entry> {
    vec![note(QUARTER, &[0]), note(QUARTER, &[0]), note(QUARTER, &[0])]
}

fn duplicated_beam(duplicate_pitch: i32) -> DocumentPtr {
    let mut score = ScoreBuilder::new();
    let mut first = three_quarters();
    first.extend([beam_start(note(EIGHTH, &[0])), note(EIGHTH, &[2])]);
    score.measure(1, first);
    let mut second = vec![
        hidden(beam_start(note(EIGHTH, &[0]))),
        hidden(note(EIGHTH, &[duplicate_pitch])),
        note(SIXTEENTH, &[4]),
        note(SIXTEENTH, &[5]),
    ];
    second.extend(three_quarters());
    score.measure(2, second);
    score.build()
}

#[test]
fn test_hidden_duplicates_continue_beam_over_barline() {
    let document = duplicated_beam(2);
    let last = cursor(&document, 1, 4);
    let continuation = last.calc_beam_continues_right_by_duplicates().unwrap().unwrap();
    assert_eq!((continuation.measure(), continuation.index()), (2, 2));

    let back = continuation.calc_beam_continues_left_by_duplicates().unwrap().unwrap();
    assert!(back.is_same_entry(&last));
    assert!(last.is_same_entry(&back));

    let forward = last.next_in_beam_group_across_bars(false).unwrap().unwrap();
    assert!(forward.is_same_entry(&continuation));
    let backward = continuation.previous_in_beam_group_across_bars(false).unwrap().unwrap();
    assert!(backward.is_same_entry(&last));

    assert_eq!(continuation.calc_lowest_beam_start_across_barlines().unwrap(), 2);
    assert_eq!(last.calc_lowest_beam_end_across_barlines().unwrap(), 0);
}

#[test]
fn test_mismatched_duplicates_do_not_continue() {
    let document = duplicated_beam(3);
    let last = cursor(&document, 1, 4);
    assert!(last.calc_beam_continues_right_by_duplicates().unwrap().is_none());
    let first_visible = cursor(&document, 2, 2);
    assert!(first_visible.calc_beam_continues_left_by_duplicates().unwrap().is_none());
    // no beam reaches back past the hidden entries
    assert!(first_visible.previous_in_beam_group_across_bars(false).unwrap().is_none());
}

#[test]
fn test_beam_extension_over_barline() {
    let mut score = ScoreBuilder::new();
    let mut first = three_quarters();
    first.extend([beam_start(note(EIGHTH, &[0])), note(EIGHTH, &[2])]);
    let first = score.measure(1, first);
    let mut second = vec![beam_start(note(EIGHTH, &[4])), note(EIGHTH, &[5])];
    second.extend(three_quarters());
    let second = score.measure(2, second);
    score.raw.beam_extensions_up.push(BeamExtension { entnum: first[3], right_offset: 24, ..Default::default() });
    score.raw.beam_extensions_up.push(BeamExtension { entnum: second[0], left_offset: -24, ..Default::default() });
    let document = score.build();

    let last = cursor(&document, 1, 4);
    let next = last.calc_beam_continues_right_over_barline().unwrap().unwrap();
    assert_eq!((next.measure(), next.index()), (2, 0));
    let prev = next.calc_beam_continues_left_over_barline().unwrap().unwrap();
    assert!(prev.is_same_entry(&last));
    assert!(last.next_in_beam_group_across_bars(false).unwrap().unwrap().is_same_entry(&next));
}

/// Measure 1 ends on a beam into a singleton note standing in for the
/// continuation; measure 2 opens with a beam extended to the left
fn singleton_over_barline(hide_notehead: bool) -> DocumentPtr {
    let mut score = ScoreBuilder::new();
    let mut anchor = beam_start(note(EIGHTH, &[0]));
    anchor.tuplet_start = true;
    let mut singleton = note(EIGHTH, &[2]);
    singleton.stem_detail = true;
    singleton.note_detail = true;
    singleton.no_leger = true;
    singleton.h_offset = 36;
    let mut first = three_quarters();
    first.extend([anchor, singleton]);
    let first = score.measure(1, first);
    let mut second = vec![beam_start(note(EIGHTH, &[4])), note(EIGHTH, &[5])];
    second.extend(three_quarters());
    let second = score.measure(2, second);

    // invisible zero-length tuplet on the anchor
    score.raw.tuplets.push(TupletDef {
        entnum: first[3],
        display_number: 1,
        display_duration: EIGHTH,
        reference_number: 0,
        reference_duration: EIGHTH,
        hidden: true,
        ..Default::default()
    });
    score.raw.custom_stems_up.push(CustomStem { entnum: first[4], shape_def: 0, ..Default::default() });
    if hide_notehead {
        score.raw.note_alterations.push(NoteAlterations {
            entnum: first[4],
            note_id: 1,
            alt_nhead: ' ',
            ..Default::default()
        });
    }
    score.raw.beam_extensions_up.push(BeamExtension { entnum: second[0], left_offset: -24, ..Default::default() });
    score.build()
}

#[test]
fn test_singleton_beam_continues_over_barline() {
    let document = singleton_over_barline(true);
    let measure_frame = frame(&document, 1);
    let tuplet = &measure_frame.tuplet_info[0];
    assert!(tuplet.calc_creates_singleton_beam_right(&measure_frame));
    assert!(!tuplet.calc_creates_singleton_beam_left(&measure_frame));

    let anchor = cursor(&document, 1, 3);
    assert!(anchor.calc_creates_singleton_beam_right());
    let from_singleton = cursor(&document, 1, 4).find_left_beam_anchor_for_beam_over_barline().unwrap();
    assert!(from_singleton.is_same_entry(&anchor));

    let next = anchor.calc_beam_continues_right_over_barline().unwrap().unwrap();
    assert_eq!((next.measure(), next.index()), (2, 0));
    let prev = next.calc_beam_continues_left_over_barline().unwrap().unwrap();
    assert!(prev.is_same_entry(&anchor));
}

#[test]
fn test_visible_notehead_is_no_singleton() {
    let document = singleton_over_barline(false);
    let measure_frame = frame(&document, 1);
    assert!(!measure_frame.tuplet_info[0].calc_creates_singleton_beam_right(&measure_frame));
    assert!(cursor(&document, 1, 3).calc_beam_continues_right_over_barline().unwrap().is_none());
}

fn feathered(up: (i32, i32), down: Option<(i32, i32)>) -> DocumentPtr {
    let mut score = ScoreBuilder::new();
    let mut first = beam_start(note(SIXTEENTH, &[0]));
    first.stem_detail = true;
    let entries = score.measure(1, vec![first, note(SIXTEENTH, &[1]), note(SIXTEENTH, &[2])]);
    let alteration = |(left_offset_y, right_offset_y)| {
        let mut alteration = BeamAlteration::default();
        alteration.entnum = entries[0];
        alteration.left_offset_y = left_offset_y;
        alteration.right_offset_y = right_offset_y;
        alteration
    };
    score.raw.secondary_beam_alterations_up.push(alteration(up));
    if let Some(down) = down {
        score.raw.secondary_beam_alterations_down.push(alteration(down));
    }
    score.build()
}

#[test]
fn test_feathered_beam_from_secondary_alterations() {
    // primary width 12, separation 18
    let document = feathered((0, -30), None);
    let start = cursor(&document, 1, 0);
    assert_eq!(start.calc_is_feathered_beam::<UpStem>(), Some(FeatheredBeam { left_y: 30, right_y: 60 }));
    assert_eq!(start.calc_is_feathered_beam::<DownStem>(), None);
    assert_eq!(start.calc_is_feathered_beam_start(), Some(FeatheredBeam { left_y: 30, right_y: 60 }));
    assert_eq!(cursor(&document, 1, 1).calc_is_feathered_beam_start(), None);

    // a parallel secondary beam does not feather
    let document = feathered((0, 0), None);
    assert_eq!(cursor(&document, 1, 0).calc_is_feathered_beam::<UpStem>(), None);
}

#[test]
fn test_wider_feather_wins_and_up_stem_breaks_ties() {
    let document = feathered((0, -30), Some((30, -30)));
    let start = cursor(&document, 1, 0);
    assert_eq!(start.calc_is_feathered_beam::<DownStem>(), Some(FeatheredBeam { left_y: 60, right_y: 30 }));
    assert_eq!(start.calc_is_feathered_beam_start(), Some(FeatheredBeam { left_y: 30, right_y: 60 }));

    let document = feathered((0, -30), Some((0, 60)));
    let start = cursor(&document, 1, 0);
    assert_eq!(start.calc_is_feathered_beam_start(), Some(FeatheredBeam { left_y: 30, right_y: 90 }));
}
