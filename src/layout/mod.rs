//! Occlusion-aware label layout.
//!
//! [`LabelLayout`] owns a set of anchor objects and one label placement per
//! object. Registration puts every label on its most preferred candidate
//! (centered above the object). Each optimization pass then walks the
//! objects in registration order; a label whose current spot collides with
//! another label, a foreign object or the canvas edge takes the first
//! candidate that is strictly cheaper, and the placement grid is updated
//! immediately so later labels in the same pass see the move.
//!
//! This is greedy local search. It stops at the first pass that moves
//! nothing or when the pass budget runs out, and makes no claim of finding a
//! globally optimal layout. Results depend on registration order but never
//! on hashing, clocks or randomness: the same calls produce the same layout.

pub mod candidates;
pub mod cost;
pub mod grid;
pub mod types;

use tracing::{debug, trace, warn};

use crate::config::{Canvas, LayoutConfig};
use crate::error::{LayoutError, LayoutResult};
use crate::geometry::Rect;
use crate::text_metrics::TextMeasure;

pub use candidates::{Candidate, Side};
pub use cost::{Cost, CostModel};
pub use grid::GridIndex;
pub use types::{LayoutObject, Placement, SolveSummary, SolverState};

const SAME_POSITION_EPS: f32 = 1e-3;

pub struct LabelLayout<M> {
    canvas: Canvas,
    config: LayoutConfig,
    measure: M,
    objects: Vec<LayoutObject>,
    /// `placements[id]` belongs to `objects[id]`.
    placements: Vec<Placement>,
    object_index: GridIndex,
    placement_index: GridIndex,
    passes: u32,
    converged: bool,
}

impl<M: TextMeasure> LabelLayout<M> {
    pub fn new(
        canvas_width: f32,
        canvas_height: f32,
        measure: M,
        config: LayoutConfig,
    ) -> LayoutResult<Self> {
        let canvas = Canvas::new(canvas_width, canvas_height)?;
        config.validate()?;
        let index = GridIndex::new(canvas.width, canvas.height, config.grid_size, config.padding());
        Ok(Self {
            canvas,
            config,
            measure,
            objects: Vec::new(),
            placements: Vec::new(),
            object_index: index.clone(),
            placement_index: index,
            passes: 0,
            converged: false,
        })
    }

    /// Replace the tunables. Takes effect on the next pass; labels stay
    /// where they are and the consumed pass count is kept. Call
    /// [`clear`](Self::clear) and re-register to start over.
    pub fn set_config(&mut self, config: LayoutConfig) -> LayoutResult<()> {
        config.validate()?;
        let previous = std::mem::replace(&mut self.config, config);
        if previous.grid_size != config.grid_size || previous.padding() != config.padding() {
            self.rebuild_indexes();
        }
        if previous.with_max_iterations(0) != config.with_max_iterations(0) {
            self.converged = false;
        }
        debug!(
            grid_size = config.grid_size,
            max_iterations = config.max_iterations,
            passes = self.passes,
            "label layout config replaced"
        );
        Ok(())
    }

    pub fn set_canvas_size(&mut self, width: f32, height: f32) -> LayoutResult<()> {
        let canvas = Canvas::new(width, height)?;
        if canvas != self.canvas {
            self.canvas = canvas;
            self.rebuild_indexes();
            self.reclamp_placements();
            self.converged = false;
        }
        Ok(())
    }

    /// Pull every label back onto the canvas with the same rules the
    /// candidates use. Positions already on the canvas are unchanged.
    fn reclamp_placements(&mut self) {
        for id in 0..self.placements.len() {
            let placement = &self.placements[id];
            let clamped = candidates::clamp_to_canvas(
                &self.objects[id].bbox,
                placement.left,
                placement.top,
                placement.width,
                placement.height,
                &self.canvas,
            );
            if clamped.left != placement.left || clamped.top != placement.top {
                trace!(id, left = clamped.left, top = clamped.top, "label clamped to resized canvas");
                self.placements[id].move_to(&clamped);
                self.placement_index.update(id, self.placements[id].rect());
            }
        }
    }

    /// Register an object and its label, placing the label on its first
    /// candidate. Returns the object id (its registration index).
    pub fn add(
        &mut self,
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        text: &str,
        font_size: f32,
    ) -> LayoutResult<usize> {
        let bbox = Rect::new(left, top, right, bottom);
        validate_geometry(&bbox)?;
        let measured = self.measure.measure(text, font_size);
        if !measured.is_valid() {
            return Err(LayoutError::InvalidMeasurement {
                text: text.to_string(),
                font_size,
                width: measured.width,
                height: measured.box_height(),
            });
        }

        let id = self.objects.len();
        let object = LayoutObject {
            id,
            bbox,
            text: text.to_string(),
            font_size,
            measured,
        };
        let first = candidates::first(&bbox, object.label_width(), object.label_height(), &self.canvas);
        if first.out_of_canvas {
            warn!(
                id,
                text,
                width = object.label_width(),
                height = object.label_height(),
                "label does not fit on the canvas"
            );
        }
        self.object_index.insert(id, bbox);
        self.placement_index.insert(id, first.rect);
        self.placements.push(Placement::new(&object, first.rect));
        self.objects.push(object);
        self.converged = false;
        Ok(id)
    }

    /// Drop every object and reset the pass counter.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.placements.clear();
        let index = GridIndex::new(
            self.canvas.width,
            self.canvas.height,
            self.config.grid_size,
            self.config.padding(),
        );
        self.object_index = index.clone();
        self.placement_index = index;
        self.passes = 0;
        self.converged = false;
    }

    /// Run passes until the iteration budget is used up or a pass moves
    /// nothing. A no-op once converged or exhausted.
    pub fn solve(&mut self) -> SolveSummary {
        let mut passes = 0;
        let mut moves = 0;
        while let Some(moved) = self.step() {
            passes += 1;
            moves += moved;
        }
        let state = self.state();
        if passes > 0 {
            debug!(passes, moves, total_passes = self.passes, ?state, "label layout solved");
        }
        SolveSummary {
            passes,
            moves,
            state,
        }
    }

    /// Run a single pass if budget remains. Returns the number of labels
    /// moved, or `None` when no pass was run.
    pub fn step(&mut self) -> Option<usize> {
        if self.objects.is_empty() || self.converged || self.passes >= self.config.max_iterations {
            return None;
        }
        let moves = self.run_pass();
        self.passes += 1;
        debug!(pass = self.passes, moves, "label layout pass");
        if moves == 0 {
            self.converged = true;
        }
        Some(moves)
    }

    fn run_pass(&mut self) -> usize {
        let mut moves = 0;
        for id in 0..self.objects.len() {
            let Some(candidate) = self.find_improvement(id) else {
                continue;
            };
            trace!(
                id,
                side = ?candidate.side,
                ring = candidate.ring,
                left = candidate.rect.left,
                top = candidate.rect.top,
                "label moved"
            );
            self.placements[id].move_to(&candidate.rect);
            self.placement_index.update(id, candidate.rect);
            moves += 1;
        }
        moves
    }

    /// First candidate strictly cheaper than the current spot, if the
    /// current spot collides with anything.
    fn find_improvement(&self, id: usize) -> Option<Candidate> {
        let model = self.cost_model();
        let current_rect = self.placements[id].rect();
        let current = model.evaluate(id, &current_rect);
        if !current.has_collision() {
            return None;
        }
        self.candidates_for(id)
            .into_iter()
            .filter(|candidate| !candidate.rect.approx_eq(&current_rect, SAME_POSITION_EPS))
            .find(|candidate| model.evaluate(id, &candidate.rect).improves_on(&current))
    }

    fn rebuild_indexes(&mut self) {
        let (width, height) = (self.canvas.width, self.canvas.height);
        let (grid_size, padding) = (self.config.grid_size, self.config.padding());
        self.object_index = self.object_index.rebuilt(width, height, grid_size, padding);
        self.placement_index = self.placement_index.rebuilt(width, height, grid_size, padding);
    }
}

impl<M> LabelLayout<M> {
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Snapshot of every placement, in registration order.
    pub fn layout(&self) -> Vec<Placement> {
        self.placements.clone()
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn objects(&self) -> &[LayoutObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Passes consumed since construction or the last [`clear`](LabelLayout::clear).
    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn state(&self) -> SolverState {
        if self.converged {
            SolverState::Converged
        } else if self.passes == 0 {
            SolverState::Unoptimized
        } else if self.passes >= self.config.max_iterations {
            SolverState::Exhausted
        } else {
            SolverState::Optimizing
        }
    }

    /// Ordered candidates for object `id` under the current config.
    pub fn candidates_for(&self, id: usize) -> Vec<Candidate> {
        let Some(object) = self.objects.get(id) else {
            return Vec::new();
        };
        candidates::generate(
            &object.bbox,
            object.label_width(),
            object.label_height(),
            &self.canvas,
            &self.config,
        )
    }

    /// Cost of object `id`'s label where it currently sits.
    pub fn cost_of(&self, id: usize) -> Option<Cost> {
        let placement = self.placements.get(id)?;
        Some(self.cost_model().evaluate(id, &placement.rect()))
    }

    /// Weighted overlap and off-canvas area of the whole layout. Never
    /// increases from one pass to the next.
    pub fn overlap_score(&self) -> f32 {
        self.cost_model().overlap_score()
    }

    pub fn cost_model(&self) -> CostModel<'_> {
        CostModel {
            objects: &self.objects,
            object_index: &self.object_index,
            placements: &self.placements,
            placement_index: &self.placement_index,
            canvas: self.canvas,
            weights: self.config.weights,
        }
    }
}

fn validate_geometry(bbox: &Rect) -> LayoutResult<()> {
    let reason = if !bbox.is_finite() {
        Some("coordinates must be finite")
    } else if bbox.width() <= 0.0 {
        Some("width must be positive")
    } else if bbox.height() <= 0.0 {
        Some("height must be positive")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(LayoutError::InvalidGeometry {
            left: bbox.left,
            top: bbox.top,
            right: bbox.right,
            bottom: bbox.bottom,
            reason,
        }),
        None => Ok(()),
    }
}
