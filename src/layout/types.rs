use serde::Serialize;

use crate::geometry::Rect;
use crate::text_metrics::TextSize;

/// A registered anchor rectangle and its label text. Immutable once added.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutObject {
    /// Registration index; doubles as the key into every dense store.
    pub id: usize,
    pub bbox: Rect,
    pub text: String,
    pub font_size: f32,
    pub measured: TextSize,
}

impl LayoutObject {
    pub fn label_width(&self) -> f32 {
        self.measured.width
    }

    pub fn label_height(&self) -> f32 {
        self.measured.box_height()
    }
}

/// Current label position for one object.
///
/// Only `left`/`top` change after registration; the extent always equals
/// the owner's measured label size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub owner: usize,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub text_ascent: f32,
}

impl Placement {
    pub(crate) fn new(object: &LayoutObject, rect: Rect) -> Self {
        Self {
            owner: object.id,
            left: rect.left,
            top: rect.top,
            width: object.label_width(),
            height: object.label_height(),
            font_size: object.font_size,
            text_ascent: object.measured.height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin(self.left, self.top, self.width, self.height)
    }

    pub(crate) fn move_to(&mut self, rect: &Rect) {
        self.left = rect.left;
        self.top = rect.top;
    }
}

/// Optimizer progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SolverState {
    /// No pass has run; every label sits on its first candidate.
    Unoptimized,
    /// Some passes ran and budget remains.
    Optimizing,
    /// The last pass moved nothing.
    Converged,
    /// The pass counter reached `max_iterations`.
    Exhausted,
}

/// Outcome of one [`LabelLayout::solve`](super::LabelLayout::solve) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SolveSummary {
    /// Passes run by this call.
    pub passes: u32,
    /// Labels relocated by this call.
    pub moves: usize,
    pub state: SolverState,
}
