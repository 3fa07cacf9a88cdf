// Placement scoring. Two tiers compared lexicographically:
// collision (padded overlap with other labels and foreign objects, plus
// area off the canvas) and preference (distance to the anchor, plus area
// sitting on the own object). Any collision reduction beats any preference
// gain, so a clear but distant spot always wins over a close crowded one.

use serde::Serialize;

use super::grid::GridIndex;
use super::types::{LayoutObject, Placement};
use crate::config::{Canvas, CostWeights};
use crate::geometry::Rect;

const COST_EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Cost {
    pub collision: f32,
    pub preference: f32,
}

impl Cost {
    pub fn total(&self) -> f32 {
        self.collision + self.preference
    }

    pub fn has_collision(&self) -> bool {
        self.collision > 0.0
    }

    /// Strictly cheaper than `other`; ties are not improvements. A
    /// preference gain never buys any collision increase, however small.
    pub fn improves_on(&self, other: &Cost) -> bool {
        if self.collision + COST_EPS < other.collision {
            return true;
        }
        self.collision <= other.collision
            && other.collision - self.collision <= COST_EPS
            && self.preference + COST_EPS < other.preference
    }
}

/// Read-only view of the solver state a cost is computed against.
pub struct CostModel<'a> {
    pub objects: &'a [LayoutObject],
    pub object_index: &'a GridIndex,
    pub placements: &'a [Placement],
    pub placement_index: &'a GridIndex,
    pub canvas: Canvas,
    pub weights: CostWeights,
}

impl CostModel<'_> {
    /// Cost of putting `owner`'s label at `rect`, all other labels staying put.
    pub fn evaluate(&self, owner: usize, rect: &Rect) -> Cost {
        let anchor = &self.objects[owner].bbox;
        let overlap = self.label_overlap(owner, rect) + self.object_overlap(owner, rect);
        let outside = rect.outside_area(self.canvas.width, self.canvas.height);
        Cost {
            collision: self.weights.overlap * overlap + self.weights.out_of_canvas * outside,
            preference: self.weights.distance * rect.center_distance(anchor)
                + self.weights.own_object * rect.intersection_area(anchor),
        }
    }

    fn label_overlap(&self, owner: usize, rect: &Rect) -> f32 {
        let padding = self.placement_index.padding();
        self.placement_index
            .query_overlapping(rect)
            .into_iter()
            .filter(|&id| id != owner)
            .map(|id| padding.overlap_area(rect, &self.placements[id].rect()))
            .sum()
    }

    fn object_overlap(&self, owner: usize, rect: &Rect) -> f32 {
        let padding = self.object_index.padding();
        self.object_index
            .query_overlapping(rect)
            .into_iter()
            .filter(|&id| id != owner)
            .map(|id| padding.overlap_area(rect, &self.objects[id].bbox))
            .sum()
    }

    /// Layout-wide potential: each label pair counted once, plus occluded
    /// foreign objects and off-canvas area, weighted like the collision tier.
    ///
    /// A move that lowers one label's collision cost lowers this by the same
    /// amount, so it never increases across passes.
    pub fn overlap_score(&self) -> f32 {
        let label_padding = self.placement_index.padding();
        let object_padding = self.object_index.padding();
        let mut overlap = 0.0f32;
        let mut outside = 0.0f32;
        for placement in self.placements {
            let rect = placement.rect();
            for id in self.placement_index.query_overlapping(&rect) {
                if id > placement.owner {
                    overlap += label_padding.overlap_area(&rect, &self.placements[id].rect());
                }
            }
            for id in self.object_index.query_overlapping(&rect) {
                if id != placement.owner {
                    overlap += object_padding.overlap_area(&rect, &self.objects[id].bbox);
                }
            }
            outside += rect.outside_area(self.canvas.width, self.canvas.height);
        }
        self.weights.overlap * overlap + self.weights.out_of_canvas * outside
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Padding;
    use crate::text_metrics::TextSize;

    struct Fixture {
        objects: Vec<LayoutObject>,
        placements: Vec<Placement>,
        object_index: GridIndex,
        placement_index: GridIndex,
    }

    impl Fixture {
        fn new(padding: Padding, items: &[(Rect, Rect)]) -> Self {
            let mut objects = Vec::new();
            let mut placements = Vec::new();
            let mut object_index = GridIndex::new(400.0, 300.0, 50.0, padding);
            let mut placement_index = GridIndex::new(400.0, 300.0, 50.0, padding);
            for (id, (bbox, label)) in items.iter().enumerate() {
                let object = LayoutObject {
                    id,
                    bbox: *bbox,
                    text: format!("o{id}"),
                    font_size: 12.0,
                    measured: TextSize::new(label.width(), label.height()),
                };
                object_index.insert(id, *bbox);
                placement_index.insert(id, *label);
                placements.push(Placement::new(&object, *label));
                objects.push(object);
            }
            Self {
                objects,
                placements,
                object_index,
                placement_index,
            }
        }

        fn model(&self) -> CostModel<'_> {
            CostModel {
                objects: &self.objects,
                object_index: &self.object_index,
                placements: &self.placements,
                placement_index: &self.placement_index,
                canvas: Canvas {
                    width: 400.0,
                    height: 300.0,
                },
                weights: CostWeights::default(),
            }
        }
    }

    #[test]
    fn isolated_label_has_no_collision() {
        let fixture = Fixture::new(
            Padding::default(),
            &[(Rect::new(100.0, 100.0, 140.0, 140.0), Rect::new(100.0, 80.0, 140.0, 100.0))],
        );
        let cost = fixture.model().evaluate(0, &fixture.placements[0].rect());
        assert!(!cost.has_collision());
        assert_eq!(cost.preference, 30.0);
    }

    #[test]
    fn own_object_is_not_a_collision_but_costs_preference() {
        let fixture = Fixture::new(
            Padding::default(),
            &[(Rect::new(100.0, 100.0, 140.0, 140.0), Rect::new(100.0, 80.0, 140.0, 100.0))],
        );
        let inside = Rect::new(100.0, 100.0, 140.0, 120.0);
        let cost = fixture.model().evaluate(0, &inside);
        assert!(!cost.has_collision());
        assert_eq!(cost.preference, 10.0 + 0.5 * 800.0);
    }

    #[test]
    fn foreign_objects_and_labels_collide() {
        let fixture = Fixture::new(
            Padding::default(),
            &[
                (Rect::new(100.0, 100.0, 140.0, 140.0), Rect::new(100.0, 80.0, 140.0, 100.0)),
                (Rect::new(200.0, 100.0, 240.0, 140.0), Rect::new(120.0, 90.0, 160.0, 110.0)),
            ],
        );
        let model = fixture.model();
        // Label 1 covers 20x10 of label 0 and 20x10 of object 0.
        let cost = model.evaluate(1, &fixture.placements[1].rect());
        assert_eq!(cost.collision, 400.0);
        // Label 0 only overlaps label 1; object 0 is its own.
        let cost = model.evaluate(0, &fixture.placements[0].rect());
        assert_eq!(cost.collision, 200.0);
    }

    #[test]
    fn padding_counts_near_misses() {
        let items = [
            (Rect::new(100.0, 100.0, 140.0, 140.0), Rect::new(100.0, 80.0, 140.0, 100.0)),
            (Rect::new(200.0, 100.0, 240.0, 140.0), Rect::new(141.0, 80.0, 181.0, 100.0)),
        ];
        let loose = Fixture::new(Padding::default(), &items);
        assert!(!loose.model().evaluate(1, &loose.placements[1].rect()).has_collision());
        let tight = Fixture::new(Padding::new(4.0, 4.0), &items);
        assert!(tight.model().evaluate(1, &tight.placements[1].rect()).has_collision());
    }

    #[test]
    fn off_canvas_area_collides() {
        let fixture = Fixture::new(
            Padding::default(),
            &[(Rect::new(0.0, 100.0, 40.0, 140.0), Rect::new(-10.0, 80.0, 30.0, 100.0))],
        );
        let cost = fixture.model().evaluate(0, &fixture.placements[0].rect());
        assert_eq!(cost.collision, 200.0);
    }

    #[test]
    fn collision_dominates_preference() {
        let near_but_crowded = Cost {
            collision: 0.5,
            preference: 1.0,
        };
        let far_but_clear = Cost {
            collision: 0.0,
            preference: 10_000.0,
        };
        assert!(far_but_clear.improves_on(&near_but_crowded));
        assert!(!near_but_crowded.improves_on(&far_but_clear));
        assert!(!far_but_clear.improves_on(&far_but_clear));
    }

    #[test]
    fn preference_gain_cannot_raise_collision() {
        let current = Cost {
            collision: 10.0,
            preference: 50.0,
        };
        let slightly_worse = Cost {
            collision: 10.00005,
            preference: 1.0,
        };
        let equal = Cost {
            collision: 10.0,
            preference: 1.0,
        };
        assert!(!slightly_worse.improves_on(&current));
        assert!(equal.improves_on(&current));
    }

    #[test]
    fn overlap_score_counts_each_pair_once() {
        let fixture = Fixture::new(
            Padding::default(),
            &[
                (Rect::new(0.0, 200.0, 10.0, 210.0), Rect::new(100.0, 80.0, 140.0, 100.0)),
                (Rect::new(300.0, 200.0, 310.0, 210.0), Rect::new(120.0, 80.0, 160.0, 100.0)),
            ],
        );
        assert_eq!(fixture.model().overlap_score(), 400.0);
    }
}
