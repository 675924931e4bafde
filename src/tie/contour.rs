use super::{EndPointKind, TieDirection};
use crate::error::Result;
use crate::models::{ContourStyleType, ControlStyle, Evpu, EvpuFloat, TieOptions};
use crate::navigator::NoteCursor;

/// Horizontal layout of a tie, as measured by the caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourGeometry {
    /// From the left edge of the start notehead to the left edge of the end notehead
    pub start_to_end_left: EvpuFloat,
    pub start_notehead_width: EvpuFloat,
    /// `None` when the tie is broken by a system break
    pub end_notehead_width: Option<EvpuFloat>,
    pub start_adjustment: EvpuFloat,
    pub end_adjustment: EvpuFloat,
    pub start_point_kind: EndPointKind,
    pub end_point_kind: EndPointKind,
}

impl ContourGeometry {
    /// Distance between the two endpoints
    pub fn calc_length(&self) -> EvpuFloat {
        let start_x = match self.start_point_kind {
            EndPointKind::Notehead => self.start_notehead_width,
            EndPointKind::OuterNotehead | EndPointKind::Stem => self.start_notehead_width / 2.0,
        } + self.start_adjustment;
        let end_x = self.start_to_end_left
            + match (self.end_point_kind, self.end_notehead_width) {
                (EndPointKind::Notehead, _) | (_, None) => 0.0,
                (EndPointKind::OuterNotehead | EndPointKind::Stem, Some(width)) => width / 2.0,
            }
            + self.end_adjustment;
        (end_x - start_x).max(0.0)
    }
}

/// Control-point inset and height of a tie contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoints {
    pub inset: EvpuFloat,
    pub height: EvpuFloat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TieContour {
    pub style_type: ContourStyleType,
    pub length: Evpu,
    pub control_points: ControlPoints,
}

fn calc_inset(style: &ControlStyle, length: EvpuFloat) -> EvpuFloat {
    if style.use_inset_ratio {
        style.inset_ratio * length
    } else {
        EvpuFloat::from(style.fixed_inset)
    }
}

fn calc_control_points_for(style: &ControlStyle, length: EvpuFloat) -> ControlPoints {
    ControlPoints { inset: calc_inset(style, length), height: EvpuFloat::from(style.height) }
}

/// Span class of a tie length
pub fn calc_span_style(options: &TieOptions, length: Evpu) -> ContourStyleType {
    let styles = &options.control_styles;
    if length >= styles.long_span.span {
        ContourStyleType::LongSpan
    } else if length >= styles.medium_span.span {
        ContourStyleType::MediumSpan
    } else {
        ContourStyleType::ShortSpan
    }
}

/// Control points for a tie length, interpolated between the neighboring
/// span styles when the options ask for it
pub fn calc_control_points(options: &TieOptions, style_type: ContourStyleType, length: Evpu) -> ControlPoints {
    let length_f = EvpuFloat::from(length);
    let fixed = calc_control_points_for(options.control_style(style_type), length_f);
    if !options.use_interpolation || style_type == ContourStyleType::TieEnds {
        return fixed;
    }
    let styles = &options.control_styles;
    let (low, high) = if length <= styles.medium_span.span {
        (&styles.short_span, &styles.medium_span)
    } else {
        (&styles.medium_span, &styles.long_span)
    };
    if length <= low.span || length >= high.span || high.span <= low.span {
        return fixed;
    }
    let t = (length_f - EvpuFloat::from(low.span)) / EvpuFloat::from(high.span - low.span);
    let (a, b) = (calc_control_points_for(low, length_f), calc_control_points_for(high, length_f));
    ControlPoints {
        inset: a.inset + (b.inset - a.inset) * t,
        height: a.height + (b.height - a.height) * t,
    }
}

impl NoteCursor {
    /// Contour of one end of this note's tie; `None` when the note has no
    /// tie at that end
    pub fn calc_contour_style_type(&self, geometry: &ContourGeometry, for_tie_end: bool) -> Result<Option<TieContour>> {
        if self.calc_effective_tie_direction(for_tie_end)? == TieDirection::Unspecified {
            return Ok(None);
        }
        let cursor = self.entry_cursor();
        let options = cursor.document().tie_options(cursor.requested_part());
        let length = geometry.calc_length().round() as Evpu;
        let style_type = match self.tie_alteration(for_tie_end).and_then(|alteration| alteration.fixed_contour) {
            Some(fixed) => fixed,
            None if geometry.end_notehead_width.is_none() => ContourStyleType::TieEnds,
            None => calc_span_style(options, length),
        };
        Ok(Some(TieContour {
            style_type,
            length,
            control_points: calc_control_points(options, style_type, length),
        }))
    }
}
