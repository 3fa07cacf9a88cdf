// Candidate label positions around an anchor rectangle, most preferred first.
//
// Every ring repeats the same positions with a gap of `ring x padding`
// between label and object. The four centered compass positions come
// first, then the eight edge-aligned slides and any finer slides along
// each side (`slideSteps`), then the four outer corners. An
// inside-the-object position closes the list so there is always somewhere
// to go.

use serde::Serialize;

use crate::config::{Canvas, LayoutConfig};
use crate::geometry::Rect;

const POSITION_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Above,
    Below,
    Left,
    Right,
    /// Above, aligned to the object's left edge.
    AboveStart,
    /// Above, aligned to the object's right edge.
    AboveEnd,
    BelowStart,
    BelowEnd,
    /// Left, aligned to the object's top edge.
    LeftStart,
    /// Left, aligned to the object's bottom edge.
    LeftEnd,
    RightStart,
    RightEnd,
    /// Between the start and end slides, evenly spaced.
    AboveSlide,
    BelowSlide,
    LeftSlide,
    RightSlide,
    AboveLeft,
    AboveRight,
    BelowLeft,
    BelowRight,
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub rect: Rect,
    pub side: Side,
    pub ring: u32,
    /// The raw position was moved to stay on the canvas.
    pub clamped: bool,
    /// The label is larger than the canvas on some axis and sticks out.
    pub out_of_canvas: bool,
}

/// Ordered candidates for a `width x height` label anchored on `bbox`.
///
/// Never empty.
pub fn generate(
    bbox: &Rect,
    width: f32,
    height: f32,
    canvas: &Canvas,
    config: &LayoutConfig,
) -> Vec<Candidate> {
    let fractions = slide_fractions(config.slide_steps);
    let per_ring = 8 + 4 * fractions.len() + if config.slide_steps > 1 { 8 } else { 0 };
    let mut out: Vec<Candidate> =
        Vec::with_capacity(per_ring * (config.search_rings as usize + 1) + 1);
    let (cx, cy) = bbox.center();
    let center_x = cx - width * 0.5;
    let center_y = cy - height * 0.5;

    for ring in 0..=config.search_rings {
        let gap_x = ring as f32 * config.padding_x;
        let gap_y = ring as f32 * config.padding_y;
        let above = bbox.top - gap_y - height;
        let below = bbox.bottom + gap_y;
        let left = bbox.left - gap_x - width;
        let right = bbox.right + gap_x;
        let start_x = bbox.left;
        let end_x = bbox.right - width;
        let start_y = bbox.top;
        let end_y = bbox.bottom - height;

        let mut positions = vec![
            (Side::Above, center_x, above),
            (Side::Below, center_x, below),
            (Side::Left, left, center_y),
            (Side::Right, right, center_y),
        ];
        if config.slide_steps > 1 {
            positions.extend([
                (Side::AboveStart, start_x, above),
                (Side::AboveEnd, end_x, above),
                (Side::BelowStart, start_x, below),
                (Side::BelowEnd, end_x, below),
                (Side::LeftStart, left, start_y),
                (Side::LeftEnd, left, end_y),
                (Side::RightStart, right, start_y),
                (Side::RightEnd, right, end_y),
            ]);
        }
        for &t in &fractions {
            let slide_x = start_x + t * (end_x - start_x);
            let slide_y = start_y + t * (end_y - start_y);
            positions.extend([
                (Side::AboveSlide, slide_x, above),
                (Side::BelowSlide, slide_x, below),
                (Side::LeftSlide, left, slide_y),
                (Side::RightSlide, right, slide_y),
            ]);
        }
        positions.extend([
            (Side::AboveLeft, left, above),
            (Side::AboveRight, right, above),
            (Side::BelowLeft, left, below),
            (Side::BelowRight, right, below),
        ]);
        for (side, x, y) in positions {
            push_unique(&mut out, place(bbox, x, y, width, height, canvas, side, ring));
        }
    }

    push_unique(
        &mut out,
        place(bbox, center_x, bbox.top, width, height, canvas, Side::Inside, 0),
    );
    out
}

/// The most preferred candidate: centered above the object, or the inside
/// fallback when that would leave the canvas through the top.
pub fn first(bbox: &Rect, width: f32, height: f32, canvas: &Canvas) -> Candidate {
    let (cx, _) = bbox.center();
    place(
        bbox,
        cx - width * 0.5,
        bbox.top - height,
        width,
        height,
        canvas,
        Side::Above,
        0,
    )
}

/// A `width x height` label at `(left, top)` moved onto the canvas by the
/// rules every candidate follows.
pub fn clamp_to_canvas(
    bbox: &Rect,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    canvas: &Canvas,
) -> Rect {
    place(bbox, left, top, width, height, canvas, Side::Inside, 0).rect
}

/// Interior slide positions as fractions of the start-to-end travel,
/// excluding the ends and the center, which have their own candidates.
fn slide_fractions(steps: u32) -> Vec<f32> {
    if steps < 3 {
        return Vec::new();
    }
    let last = (steps - 1) as f32;
    (1..steps - 1)
        .map(|i| i as f32 / last)
        .filter(|t| (t - 0.5).abs() > POSITION_EPS)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn place(
    bbox: &Rect,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    canvas: &Canvas,
    side: Side,
    ring: u32,
) -> Candidate {
    let mut out_of_canvas = false;
    let left = if width > canvas.width {
        out_of_canvas = true;
        0.0
    } else {
        x.clamp(0.0, canvas.width - width)
    };
    let top = if height > canvas.height {
        out_of_canvas = true;
        0.0
    } else if y < 0.0 {
        // Same rule as the naive baseline: no room above, draw inside.
        bbox.top.clamp(0.0, canvas.height - height)
    } else {
        y.min(canvas.height - height)
    };
    Candidate {
        rect: Rect::from_origin(left, top, width, height),
        side,
        ring,
        clamped: left != x || top != y,
        out_of_canvas,
    }
}

fn push_unique(out: &mut Vec<Candidate>, candidate: Candidate) {
    let duplicate = out
        .iter()
        .any(|existing| existing.rect.approx_eq(&candidate.rect, POSITION_EPS));
    if !duplicate {
        out.push(candidate);
    }
}
