//! Entry and note cursors, frame hold queries and tuplet patterns

mod common;

use std::collections::HashSet;

use common::{beam_start, cursor, frame, note, ScoreBuilder, EIGHTH, QUARTER, STAFF};
use notation_core::models::TupletDef;
use notation_core::{iterate_entries, EntryCursor, FrameHoldContext, NoteCursor};

#[test]
fn test_cursors_compare_by_entry() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0]), note(QUARTER, &[1])]);
    let document = score.build();

    // two independently built frames reach the same entries
    let a = cursor(&document, 1, 0);
    let b = cursor(&document, 1, 0);
    assert!(a.is_same_entry(&b) && b.is_same_entry(&a));
    assert_eq!(a, b);
    let other = cursor(&document, 1, 1);
    assert_ne!(a, other);

    let set: HashSet<EntryCursor> = [a, b, other].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
#[should_panic]
fn test_cursor_out_of_range_panics() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0])]);
    let document = score.build();
    let _ = EntryCursor::new(frame(&document, 1), 1);
}

#[test]
fn test_staff_position_and_pitch_follow_key() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0, 2, 6])]);
    score.raw.measures[0].key.key_fifths = 1;
    let document = score.build();

    let entry = cursor(&document, 1, 0);
    let tonic = NoteCursor::new(entry.clone(), 0);
    // G above middle C on a treble staff
    assert_eq!(tonic.calc_staff_position(), -6);
    let leading_tone = NoteCursor::new(entry.clone(), 2);
    assert_eq!(leading_tone.calc_pitch(), (10, 1));
    assert!(leading_tone.previous().is_some_and(|lower| lower.note_index() == 1));
    assert!(leading_tone.next().is_none());
    assert_eq!(entry.calc_top_bottom_staff_positions(), Some((0, -6)));
}

#[test]
fn test_unisons_match_in_order() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0, 0, 4]), note(QUARTER, &[-1, 0, 0])]);
    let document = score.build();

    let (first, second) = (cursor(&document, 1, 0), cursor(&document, 1, 1));
    let lower = NoteCursor::new(first.clone(), 0).find_equal_pitch(&second).unwrap();
    let upper = NoteCursor::new(first.clone(), 1).find_equal_pitch(&second).unwrap();
    assert_eq!((lower.note_index(), upper.note_index()), (1, 2));
    assert!(NoteCursor::new(first, 2).find_equal_pitch(&second).is_none());
}

#[test]
fn test_nearest_entry() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0]), note(QUARTER, &[1]), note(QUARTER, &[2])]);
    let document = score.build();
    let context = FrameHoldContext::new(&document, 0, STAFF, 1).unwrap();

    let nearest = context.calc_nearest_entry(1000, false, Some(0), None).unwrap().unwrap();
    assert_eq!(nearest.index(), 1);
    // one edu off still counts as exact
    let exact = context.calc_nearest_entry(2049, true, None, None).unwrap().unwrap();
    assert_eq!(exact.index(), 2);
    assert!(context.calc_nearest_entry(1500, true, None, None).unwrap().is_none());
    assert!(!context.calc_is_multi_layer());
    assert_eq!(context.calc_voices().unwrap().into_iter().collect::<Vec<_>>(), vec![(0, false)]);
}

#[test]
fn test_iteration_stops_when_asked() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0]), note(QUARTER, &[1]), note(QUARTER, &[2])]);
    let document = score.build();

    let mut visited = Vec::new();
    let finished = iterate_entries(&frame(&document, 1), |cursor| {
        visited.push(cursor.index());
        cursor.index() < 1
    });
    assert!(!finished);
    assert_eq!(visited, vec![0, 1]);
}

fn tremolo_score(hidden: bool) -> notation_core::DocumentPtr {
    let mut score = ScoreBuilder::new();
    let mut first = beam_start(note(EIGHTH, &[0]));
    first.tuplet_start = true;
    let entries = score.measure(1, vec![first, note(EIGHTH, &[4])]);
    // two eighths filling a whole note
    score.raw.tuplets.push(TupletDef {
        entnum: entries[0],
        display_number: 2,
        display_duration: EIGHTH,
        reference_number: 2,
        reference_duration: 2048,
        hidden,
        ..Default::default()
    });
    score.build()
}

#[test]
fn test_invisible_tuplet_of_beamed_notes_is_tremolo() {
    let document = tremolo_score(true);
    let hidden_frame = frame(&document, 1);
    assert!(hidden_frame.tuplet_info[0].calc_is_tremolo(&hidden_frame));
    assert!(!hidden_frame.tuplet_info[0].calc_creates_singleton_beam_right(&hidden_frame));

    let document = tremolo_score(false);
    let shown_frame = frame(&document, 1);
    assert!(!shown_frame.tuplet_info[0].calc_is_tremolo(&shown_frame));
}
