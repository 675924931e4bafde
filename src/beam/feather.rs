use crate::models::{DownStem, Evpu, StemSide, UpStem, EFIX_PER_EVPU};
use crate::navigator::EntryCursor;

/// Left and right vertical spans of a feathered beam, in EVPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatheredBeam {
    pub left_y: Evpu,
    pub right_y: Evpu,
}

impl FeatheredBeam {
    fn span(&self) -> Evpu {
        (self.right_y - self.left_y).abs()
    }
}

impl EntryCursor {
    /// Beam width in EFIX for the primary beam on one stem side
    pub fn calc_effective_beam_width<S: StemSide>(&self) -> i32 {
        let document = self.document();
        let part = self.requested_part();
        match document.beam_alteration::<S>(part, self.entry_number()) {
            Some(alteration) if alteration.is_active() && alteration.beam_width >= 0 => alteration.beam_width,
            _ => document.beam_options(part).beam_width,
        }
    }

    /// Feathering produced by this entry's secondary beam alterations on one stem side
    pub fn calc_is_feathered_beam<S: StemSide>(&self) -> Option<FeatheredBeam> {
        let document = self.document();
        let part = self.requested_part();
        let options = document.beam_options(part);
        let direction = S::direction();
        let beam_width = (f64::from(options.beam_width) / EFIX_PER_EVPU).round() as Evpu;

        let mut left_y = direction * beam_width;
        let mut right_y = left_y;
        let (mut extreme_left, mut extreme_right) = (left_y, right_y);
        for secondary in document.secondary_beam_alterations::<S>(part, self.entry_number()) {
            if !secondary.is_active() {
                continue;
            }
            left_y += secondary.left_offset_y + direction * options.beam_separ;
            right_y += secondary.left_offset_y + secondary.right_offset_y + direction * options.beam_separ;
            if S::IS_DOWNSTEM {
                extreme_left = extreme_left.max(left_y);
                extreme_right = extreme_right.max(right_y);
            } else {
                extreme_left = extreme_left.min(left_y);
                extreme_right = extreme_right.min(right_y);
            }
        }

        let (span_left, span_right) = (direction * extreme_left, direction * extreme_right);
        (span_left != span_right).then_some(FeatheredBeam { left_y: span_left, right_y: span_right })
    }

    /// Feathering of the beam starting on this entry. With both stem sides
    /// feathered, the wider wedge wins and up-stem wins a tie.
    pub fn calc_is_feathered_beam_start(&self) -> Option<FeatheredBeam> {
        if !self.entry().stem_detail || !self.calc_is_beam_start() {
            return None;
        }
        match (self.calc_is_feathered_beam::<UpStem>(), self.calc_is_feathered_beam::<DownStem>()) {
            (Some(up), Some(down)) => Some(if up.span() >= down.span() { up } else { down }),
            (up, down) => up.or(down),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feathered_span() {
        let beam = FeatheredBeam { left_y: 12, right_y: 60 };
        assert_eq!(beam.span(), 48);
        let reversed = FeatheredBeam { left_y: 60, right_y: 12 };
        assert_eq!(reversed.span(), 48);
    }
}
