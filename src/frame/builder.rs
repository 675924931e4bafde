use std::rc::Rc;

use super::{EntryFrame, EntryFramePtr, EntryInfo, FrameHoldContext, TupletInfo};
use crate::error::{report, IntegrityError, Result};
use crate::models::{Edu, EduFraction, Fraction, Frame, LayerIndex, TupletDef, MAX_LAYERS};

/// Running state of one active tuplet while a frame is built
struct TupletState {
    remaining_symbolic_duration: Fraction,
    /// Zero for a zero-length tuplet
    ratio: Fraction,
    info_index: usize,
}

impl TupletState {
    fn new(tuplet: &TupletDef, info_index: usize) -> Result<Self> {
        let ratio = match tuplet.calc_ratio() {
            Some(ratio) => ratio,
            None => {
                report(IntegrityError::InvalidRecord(format!(
                    "tuplet on entry {} has a zero display duration",
                    tuplet.entnum
                )))?;
                Fraction::zero()
            }
        };
        Ok(TupletState {
            remaining_symbolic_duration: tuplet.calc_display_duration(),
            ratio,
            info_index,
        })
    }

    fn is_zero_length(&self) -> bool {
        self.ratio.is_zero_value()
    }
}

/// The frame inci holding the layer's entries and the latest start time of all incis
pub(super) fn find_layer_frame(context: &FrameHoldContext, layer: LayerIndex) -> Result<Option<(Frame, Edu)>> {
    let frame_id = context.hold.frames[layer];
    if frame_id == 0 {
        return Ok(None);
    }
    let mut layer_frame: Option<&Frame> = None;
    let mut start_edu: Edu = 0;
    for frame in context.document.frames(context.part, frame_id) {
        if frame.start_entry != 0 {
            if layer_frame.is_some() {
                report(IntegrityError::InvalidRecord(format!(
                    "more than one entry frame inci exists for frame {}",
                    frame_id
                )))?;
            }
            layer_frame = Some(frame);
        }
        start_edu = start_edu.max(frame.start_time);
    }
    Ok(layer_frame.map(|frame| (frame.clone(), start_edu)))
}

pub(super) fn build(context: &FrameHoldContext, layer: LayerIndex) -> Result<Option<EntryFramePtr>> {
    assert!(layer < MAX_LAYERS, "invalid layer index [{}]", layer);
    let frame_id = context.hold.frames[layer];
    if frame_id == 0 {
        return Ok(None);
    }
    let document = &context.document;
    let part = context.part;
    let (staff_id, measure_id) = (context.staff(), context.measure());

    let Some((frame, start_edu)) = find_layer_frame(context, layer)? else {
        report(IntegrityError::MissingFrame { staff: staff_id, measure: measure_id, layer, frame: frame_id })?;
        return Ok(None);
    };
    let Some(measure) = document.measure(part, measure_id) else {
        report(IntegrityError::MissingRecord {
            kind: "measure",
            key: measure_id.to_string(),
            referrer: format!("frame hold for staff {}", staff_id),
        })?;
        return Ok(None);
    };
    let Some(start_staff) = document.create_staff_composite(part, staff_id, measure_id, 0)? else {
        report(IntegrityError::UnconstructibleStaff { part, staff: staff_id, measure: measure_id })?;
        return Ok(None);
    };
    let time_stretch = if start_staff.float_time {
        document.calc_time_stretch(part, staff_id, measure_id)
    } else {
        Fraction::one()
    };
    let transposed_clef = start_staff
        .transposition
        .as_ref()
        .filter(|transposition| transposition.set_to_clef)
        .map(|transposition| transposition.transposed_clef);

    let raw_entries = document.frame_entries(&frame)?;
    let mut entries: Vec<EntryInfo> = Vec::with_capacity(raw_entries.len());
    let mut tuplet_info: Vec<TupletInfo> = Vec::new();
    let mut staves = vec![start_staff];

    let mut v1_tuplets: Vec<TupletState> = Vec::new();
    let mut v2_tuplets: Vec<TupletState> = Vec::new();
    let mut v1_elapsed = Fraction::from_edu(start_edu);
    let mut v2_elapsed = v1_elapsed;
    let mut grace_index = 0;

    for (index, &entry) in raw_entries.iter().enumerate() {
        if entry.v2_launch {
            // voice 2 starts where voice 1 is, without voice 1's tuplets
            v2_tuplets.clear();
            v2_elapsed = v1_elapsed;
        }
        let (active, elapsed) = if entry.voice2 {
            (&mut v2_tuplets, &mut v2_elapsed)
        } else {
            (&mut v1_tuplets, &mut v1_elapsed)
        };

        let elapsed_edu = elapsed.calc_edu_duration();
        let clef_index_concert = context.calc_clef_index_at(elapsed_edu)?;
        let staff_index = if elapsed_edu == 0 {
            0
        } else {
            match document.create_staff_composite(part, staff_id, measure_id, elapsed_edu)? {
                Some(staff) => match staves.iter().position(|known| *known == staff) {
                    Some(known) => known,
                    None => {
                        staves.push(staff);
                        staves.len() - 1
                    }
                },
                None => 0,
            }
        };
        let mut info = EntryInfo {
            entry: entry.clone(),
            elapsed_duration: *elapsed,
            actual_duration: Fraction::zero(),
            clef_index: transposed_clef.unwrap_or(clef_index_concert),
            clef_index_concert,
            grace_index: 0,
            reverse_grace_index: 0,
            staff_index,
        };

        let mut cumulative_ratio = Fraction::one();
        if entry.grace_note {
            grace_index += 1;
            info.grace_index = grace_index;
        } else {
            grace_index = 0;
            if entry.tuplet_start {
                let mut tuplets: Vec<&TupletDef> = document.tuplets(part, entry.entnum).iter().collect();
                tuplets.sort_by(|a, b| b.calc_reference_duration().cmp(&a.calc_reference_duration()));
                for tuplet in tuplets {
                    active.push(TupletState::new(tuplet, tuplet_info.len())?);
                    tuplet_info.push(TupletInfo {
                        tuplet: tuplet.clone(),
                        start_index: index,
                        end_index: index,
                        start_dura: *elapsed,
                        end_dura: *elapsed,
                        voice2: entry.voice2,
                    });
                }
            }
            // a zero-length tuplet holds exactly one entry, whatever its symbolic duration
            let mut zero_length_tuplet = false;
            for tuplet in active.iter() {
                if tuplet.is_zero_length() {
                    zero_length_tuplet = true;
                } else {
                    cumulative_ratio *= tuplet.ratio;
                }
            }
            if !zero_length_tuplet {
                info.actual_duration = entry.calc_fraction() * cumulative_ratio;
            }
        }

        *elapsed += info.actual_duration;
        if !entry.grace_note {
            for tuplet in active.iter_mut().rev() {
                if !tuplet.is_zero_length() {
                    tuplet.remaining_symbolic_duration -= info.actual_duration / cumulative_ratio;
                    cumulative_ratio /= tuplet.ratio;
                }
            }
            // incomplete tuplets end with the last entry of their voice sequence
            for tuplet in active.iter() {
                let record = &mut tuplet_info[tuplet.info_index];
                record.end_index = index;
                record.end_dura = *elapsed;
            }
            active.retain(|tuplet| tuplet.remaining_symbolic_duration > Fraction::zero() && !tuplet.is_zero_length());
        }
        entries.push(info);
    }

    let mut run = 0;
    for info in entries.iter_mut().rev() {
        if info.grace_index > 0 {
            run += 1;
            info.reverse_grace_index = run;
        } else {
            run = 0;
        }
    }

    log::debug!(
        "built frame for staff {} measure {} layer {}: {} entries, {} tuplets",
        staff_id,
        measure_id,
        layer + 1,
        entries.len(),
        tuplet_info.len()
    );

    Ok(Some(Rc::new(EntryFrame {
        context: context.clone(),
        layer,
        entries,
        tuplet_info,
        key_signature: measure.key,
        time_stretch,
        staves,
    })))
}
