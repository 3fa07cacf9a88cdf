// Axis-aligned rectangle math shared by the grid index, the candidate
// generator and the cost model. Pure geometry, no solver state.

use serde::{Deserialize, Serialize};

/// Rectangle in canvas coordinates, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_origin(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }

    /// Grow every side by `dx` horizontally and `dy` vertically.
    pub fn inflate(&self, dx: f32, dy: f32) -> Self {
        if dx == 0.0 && dy == 0.0 {
            return *self;
        }
        Self::new(
            self.left - dx,
            self.top - dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Strict intersection: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let w = (self.right.min(other.right) - self.left.max(other.left)).max(0.0);
        let h = (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0.0);
        w * h
    }

    /// Area of `self` that lies outside `[0, width] x [0, height]`.
    pub fn outside_area(&self, width: f32, height: f32) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        let inside = self.intersection_area(&Rect::new(0.0, 0.0, width, height));
        (area - inside).max(0.0)
    }

    pub fn center_distance(&self, other: &Rect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        let dx = ax - bx;
        let dy = ay - by;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn approx_eq(&self, other: &Rect, eps: f32) -> bool {
        (self.left - other.left).abs() <= eps
            && (self.top - other.top).abs() <= eps
            && (self.right - other.right).abs() <= eps
            && (self.bottom - other.bottom).abs() <= eps
    }
}

/// Clearance between two rectangles, split evenly between them.
///
/// Each rectangle is inflated by half the padding, so two rectangles count
/// as touching once their gap drops below the full padding. Symmetric in
/// its arguments, which the overlap score relies on.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Padding {
    pub x: f32,
    pub y: f32,
}

impl Padding {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn apply(&self, rect: &Rect) -> Rect {
        rect.inflate(self.x * 0.5, self.y * 0.5)
    }

    pub fn conflicts(&self, a: &Rect, b: &Rect) -> bool {
        self.apply(a).intersects(&self.apply(b))
    }

    pub fn overlap_area(&self, a: &Rect, b: &Rect) -> f32 {
        self.apply(a).intersection_area(&self.apply(b))
    }
}
