//! Frame building: elapsed and actual durations, tuplets, voices, graces

mod common;

use common::{frame, grace, note, ScoreBuilder, EIGHTH, QUARTER, STAFF};
use notation_core::models::{EduFraction, Fraction, IndependentTimeSig, TupletDef};
use notation_core::{build_frame, EntryCursor};

fn eighth() -> notation_core::models::Entry {
    note(EIGHTH, &[0])
}

#[test]
fn test_triplet_eighths() {
    let mut score = ScoreBuilder::new();
    let mut first = eighth();
    first.tuplet_start = true;
    let entries = score.measure(1, vec![first, eighth(), eighth(), note(QUARTER, &[0])]);
    score.tuplet(entries[0], (3, EIGHTH), (2, EIGHTH));
    let document = score.build();

    let frame = frame(&document, 1);
    let elapsed: Vec<Fraction> = frame.entries().iter().map(|info| info.elapsed_duration).collect();
    assert_eq!(
        elapsed,
        vec![Fraction::new(0, 1), Fraction::new(1, 12), Fraction::new(1, 6), Fraction::new(1, 4)]
    );
    assert_eq!(frame.entries()[0].actual_duration, Fraction::new(1, 12));
    assert_eq!(frame.entries()[3].actual_duration, Fraction::new(1, 4));

    assert_eq!(frame.tuplet_info.len(), 1);
    let tuplet = &frame.tuplet_info[0];
    assert_eq!((tuplet.start_index, tuplet.end_index), (0, 2));
    assert_eq!(tuplet.start_dura, Fraction::new(0, 1));
    assert_eq!(tuplet.end_dura, Fraction::new(1, 4));
}

#[test]
fn test_quarter_in_triplet_is_exact() {
    let mut score = ScoreBuilder::new();
    let mut first = note(QUARTER, &[0]);
    first.tuplet_start = true;
    let entries = score.measure(1, vec![first]);
    score.tuplet(entries[0], (3, QUARTER), (2, QUARTER));
    let document = score.build();

    let frame = frame(&document, 1);
    let expected = Fraction::from_edu(QUARTER) * Fraction::new(2, 3);
    assert_eq!(frame.entries()[0].actual_duration, expected);
    assert_eq!(expected, Fraction::new(1, 6));
    // the edu value is truncated, the fraction is not
    assert_eq!(expected.calc_edu_duration(), 682);
}

#[test]
fn test_nested_tuplets_activate_outer_first() {
    let mut score = ScoreBuilder::new();
    let mut first = eighth();
    first.tuplet_start = true;
    let entries = score.measure(
        1,
        vec![first, eighth(), eighth(), note(QUARTER, &[0]), note(QUARTER, &[0])],
    );
    // inner eighth triplet recorded before the outer quarter triplet
    score.tuplet(entries[0], (3, EIGHTH), (2, EIGHTH));
    score.tuplet(entries[0], (3, QUARTER), (2, QUARTER));
    let document = score.build();

    let frame = frame(&document, 1);
    assert_eq!(frame.tuplet_info.len(), 2);
    let (outer, inner) = (&frame.tuplet_info[0], &frame.tuplet_info[1]);
    assert_eq!(outer.tuplet.reference_duration, QUARTER);
    assert_eq!(inner.tuplet.reference_duration, EIGHTH);

    assert_eq!(frame.entries()[0].actual_duration, Fraction::new(1, 18));
    assert_eq!(frame.entries()[3].actual_duration, Fraction::new(1, 6));
    assert_eq!((inner.start_index, inner.end_index), (0, 2));
    assert_eq!(inner.end_dura, Fraction::new(1, 6));
    assert_eq!((outer.start_index, outer.end_index), (0, 4));
    assert_eq!(outer.end_dura, Fraction::new(1, 2));

    let start = EntryCursor::new(frame.clone(), 0);
    assert_eq!(start.find_tuplet_info(), vec![0, 1]);
    assert_eq!(start.calc_next_tuplet_index(None), Some(0));
    assert_eq!(start.calc_next_tuplet_index(Some(0)), Some(1));
    assert_eq!(start.calc_next_tuplet_index(Some(1)), None);
    assert_eq!(EntryCursor::new(frame, 3).find_tuplet_info(), vec![0]);
}

#[test]
fn test_tuplet_end_matches_last_entry() {
    let mut score = ScoreBuilder::new();
    let mut first = eighth();
    first.tuplet_start = true;
    let entries = score.measure(1, vec![first, eighth(), eighth(), eighth(), note(QUARTER, &[0])]);
    score.tuplet(entries[0], (5, EIGHTH), (4, EIGHTH));
    let document = score.build();

    let frame = frame(&document, 1);
    for tuplet in &frame.tuplet_info {
        assert!(tuplet.start_index <= tuplet.end_index);
        let last = &frame.entries()[tuplet.end_index];
        assert_eq!(tuplet.end_dura, last.elapsed_duration + last.actual_duration);
    }
    // the quarter overruns the remainder and closes the tuplet
    assert_eq!(frame.tuplet_info[0].end_index, 4);
}

#[test]
fn test_zero_length_tuplet_holds_one_entry() {
    let mut score = ScoreBuilder::new();
    let mut first = note(QUARTER, &[0]);
    first.tuplet_start = true;
    let entries = score.measure(1, vec![first, note(QUARTER, &[1])]);
    score.tuplet(entries[0], (1, QUARTER), (0, QUARTER));
    let document = score.build();

    let frame = frame(&document, 1);
    let tuplet = &frame.tuplet_info[0];
    assert!(tuplet.calc_is_zero_length());
    assert_eq!((tuplet.start_index, tuplet.end_index), (0, 0));
    assert_eq!((tuplet.start_dura, tuplet.end_dura), (Fraction::new(0, 1), Fraction::new(0, 1)));
    assert_eq!(frame.entries()[0].actual_duration, Fraction::new(0, 1));
    assert_eq!(frame.entries()[1].elapsed_duration, Fraction::new(0, 1));
    assert_eq!(frame.entries()[1].actual_duration, Fraction::new(1, 4));
}

/// Three quarters on a staff in 3/4 inside a 4/4 measure
fn floating_staff() -> ScoreBuilder {
    let mut score = ScoreBuilder::new();
    score.raw.staves[0].float_time = true;
    score.raw.independent_time_sigs.push(IndependentTimeSig {
        staff: STAFF,
        measure: 1,
        beats: 3,
        div_beat: QUARTER,
        ..Default::default()
    });
    score
}

#[test]
fn test_time_stretch_scales_global_durations() {
    let mut score = floating_staff();
    score.measure(1, vec![note(QUARTER, &[0]), note(QUARTER, &[1]), note(QUARTER, &[2])]);
    let document = score.build();

    let stretched = frame(&document, 1);
    assert_eq!(stretched.time_stretch(), Fraction::new(4, 3));
    let last = EntryCursor::new(stretched, 2);
    assert_eq!(last.info().elapsed_duration, Fraction::new(1, 2));
    assert_eq!(last.calc_global_elapsed_duration(), Fraction::new(2, 3));
    assert_eq!(last.calc_global_actual_duration(), Fraction::new(1, 3));

    // a staff without its own time keeps measure time
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0])]);
    let document = score.build();
    assert_eq!(frame(&document, 1).time_stretch(), Fraction::new(1, 1));
}

fn stretching_tuplet(hidden: bool) -> notation_core::DocumentPtr {
    let mut score = floating_staff();
    let mut first = note(QUARTER, &[0]);
    first.tuplet_start = true;
    let entries = score.measure(1, vec![first, note(QUARTER, &[1]), note(QUARTER, &[2])]);
    // the staff's 3/4 stands in for the measure's 4/4
    score.raw.tuplets.push(TupletDef {
        entnum: entries[0],
        display_number: 3,
        display_duration: QUARTER,
        reference_number: 4,
        reference_duration: QUARTER,
        hidden,
        ..Default::default()
    });
    score.build()
}

#[test]
fn test_invisible_whole_measure_tuplet_stretches_time() {
    let document = stretching_tuplet(true);
    let hidden_frame = frame(&document, 1);
    assert!(hidden_frame.tuplet_info[0].calc_creates_time_stretch(&hidden_frame).unwrap());

    let document = stretching_tuplet(false);
    let shown_frame = frame(&document, 1);
    assert!(!shown_frame.tuplet_info[0].calc_creates_time_stretch(&shown_frame).unwrap());
}

#[test]
fn test_voice2_launch_restarts_elapsed_without_tuplets() {
    let mut score = ScoreBuilder::new();
    let mut launch = eighth();
    launch.tuplet_start = true;
    launch.v2_launch = true;
    let mut v2_first = note(QUARTER, &[4]);
    v2_first.voice2 = true;
    let mut v2_second = note(QUARTER, &[4]);
    v2_second.voice2 = true;
    let entries = score.measure(1, vec![launch, v2_first, v2_second, eighth(), eighth()]);
    score.tuplet(entries[0], (3, EIGHTH), (2, EIGHTH));
    let document = score.build();

    let frame = frame(&document, 1);
    let infos = frame.entries();
    assert_eq!(infos[1].elapsed_duration, Fraction::new(0, 1));
    assert_eq!(infos[1].actual_duration, Fraction::new(1, 4));
    assert_eq!(infos[2].elapsed_duration, Fraction::new(1, 4));
    assert_eq!(infos[3].elapsed_duration, Fraction::new(1, 12));
    assert_eq!(infos[4].elapsed_duration, Fraction::new(1, 6));

    let tuplet = &frame.tuplet_info[0];
    assert!(!tuplet.voice2);
    assert_eq!((tuplet.start_index, tuplet.end_index), (0, 4));
    assert_eq!(tuplet.end_dura, Fraction::new(1, 4));

    let launch = EntryCursor::new(frame.clone(), 0);
    assert_eq!(launch.next_same_v().map(|cursor| cursor.index()), Some(3));
    let v2_start = frame.first_in_voice(2).unwrap().unwrap();
    assert_eq!(v2_start.index(), 1);
    assert_eq!(v2_start.next_same_v().map(|cursor| cursor.index()), Some(2));
    assert!(EntryCursor::new(frame.clone(), 2).next_same_v().is_none());
    assert_eq!(frame.last_in_voice(2).map(|cursor| cursor.index()), Some(2));
}

#[test]
fn test_grace_ordinals() {
    let mut score = ScoreBuilder::new();
    score.measure(
        1,
        vec![
            grace(eighth()),
            grace(eighth()),
            grace(eighth()),
            note(QUARTER, &[0]),
            grace(eighth()),
            note(QUARTER, &[0]),
        ],
    );
    let document = score.build();

    let frame = frame(&document, 1);
    let forward: Vec<u32> = frame.entries().iter().map(|info| info.grace_index).collect();
    let backward: Vec<u32> = frame.entries().iter().map(|info| info.reverse_grace_index).collect();
    assert_eq!(forward, vec![1, 2, 3, 0, 1, 0]);
    assert_eq!(backward, vec![3, 2, 1, 0, 1, 0]);

    assert_eq!(frame.entries()[0].actual_duration, Fraction::new(0, 1));
    assert_eq!(frame.entries()[3].elapsed_duration, Fraction::new(0, 1));
    assert_eq!(frame.entries()[4].elapsed_duration, Fraction::new(1, 4));
    assert_eq!(EntryCursor::new(frame, 0).calc_reverse_grace_index(), 3);
}

#[test]
fn test_elapsed_never_decreases() {
    let mut score = ScoreBuilder::new();
    let mut first = eighth();
    first.tuplet_start = true;
    let entries = score.measure(
        1,
        vec![first, grace(eighth()), eighth(), eighth(), note(QUARTER, &[0]), grace(eighth())],
    );
    score.tuplet(entries[0], (3, EIGHTH), (2, EIGHTH));
    let document = score.build();

    let frame = frame(&document, 1);
    for pair in frame.entries().windows(2) {
        assert!(pair[0].elapsed_duration <= pair[1].elapsed_duration);
    }
    assert!(frame.entries().iter().all(|info| info.actual_duration >= Fraction::new(0, 1)));
}

#[test]
fn test_building_twice_is_identical() {
    let mut score = ScoreBuilder::new();
    let mut first = eighth();
    first.tuplet_start = true;
    let entries = score.measure(1, vec![first, eighth(), eighth(), grace(eighth()), note(QUARTER, &[2])]);
    score.tuplet(entries[0], (3, EIGHTH), (2, EIGHTH));
    let document = score.build();

    let a = frame(&document, 1);
    let b = frame(&document, 1);
    assert_eq!(a.entries(), b.entries());
    assert_eq!(a.tuplet_info, b.tuplet_info);
}

#[test]
fn test_empty_layer_has_no_frame() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0])]);
    let document = score.build();

    assert!(build_frame(&document, 0, STAFF, 1, 1).unwrap().is_none());
    assert!(build_frame(&document, 0, STAFF, 2, 0).unwrap().is_none());
    assert!(build_frame(&document, 0, STAFF + 1, 1, 0).unwrap().is_none());
}

#[test]
#[should_panic(expected = "invalid layer index")]
fn test_layer_out_of_range_panics() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0])]);
    let document = score.build();
    let _ = build_frame(&document, 0, STAFF, 1, 4);
}

#[test]
fn test_frames_link_measures() {
    let mut score = ScoreBuilder::new();
    score.measure(1, vec![note(QUARTER, &[0]), note(QUARTER, &[1])]);
    score.measure(2, vec![note(QUARTER, &[2])]);
    let document = score.build();

    let last = EntryCursor::new(frame(&document, 1), 1);
    let next = last.next_in_layer().unwrap().unwrap();
    assert_eq!((next.measure(), next.index()), (2, 0));
    let back = next.previous_in_layer().unwrap().unwrap();
    assert!(back.is_same_entry(&last));
    assert!(next.next_in_layer().unwrap().is_none());
    assert!(frame(&document, 1).previous().unwrap().is_none());
}
