use crate::geometry::{Padding, Rect};

/// Upper bound on the number of cells a single index allocates. Tiny grid
/// sizes on large canvases get a coarser cell instead of unbounded memory.
const MAX_CELLS: usize = 1 << 20;

/// Uniform-cell spatial index over rectangles keyed by dense ids.
///
/// The cell array covers the canvas; rectangles reaching outside it are
/// clamped into the border cells, so off-canvas entries are still found by
/// off-canvas queries. Every rectangle is registered in each cell its padded
/// bounds touch, and queries run the exact padded intersection test on the
/// bucket contents before returning ids in ascending order.
#[derive(Debug, Clone)]
pub struct GridIndex {
    cell: f32,
    cols: usize,
    rows: usize,
    padding: Padding,
    /// Row-major cell buckets holding entry ids.
    cells: Vec<Vec<usize>>,
    /// Dense arena: `entries[id]` is the rectangle currently stored for `id`.
    entries: Vec<Option<Rect>>,
    len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSpan {
    c0: usize,
    r0: usize,
    c1: usize,
    r1: usize,
}

impl GridIndex {
    pub fn new(canvas_width: f32, canvas_height: f32, grid_size: f32, padding: Padding) -> Self {
        let width = canvas_width.max(1.0);
        let height = canvas_height.max(1.0);
        let mut cell = grid_size.max(1.0);
        while cell_count(width, height, cell) > MAX_CELLS {
            cell *= 2.0;
        }
        let cols = ((width / cell).ceil() as usize).max(1);
        let rows = ((height / cell).ceil() as usize).max(1);
        Self {
            cell,
            cols,
            rows,
            padding,
            cells: vec![Vec::new(); cols * rows],
            entries: Vec::new(),
            len: 0,
        }
    }

    /// Build a fresh index with new dimensions and re-insert every entry.
    pub fn rebuilt(&self, canvas_width: f32, canvas_height: f32, grid_size: f32, padding: Padding) -> Self {
        let mut next = Self::new(canvas_width, canvas_height, grid_size, padding);
        for (id, rect) in self.iter() {
            next.insert(id, rect);
        }
        next
    }

    pub fn cell_size(&self) -> f32 {
        self.cell
    }

    pub fn padding(&self) -> Padding {
        self.padding
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, id: usize) -> Option<&Rect> {
        self.entries.get(id).and_then(|entry| entry.as_ref())
    }

    pub fn contains(&self, id: usize) -> bool {
        self.get(id).is_some()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Rect)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(id, entry)| entry.map(|rect| (id, rect)))
    }

    /// Store `rect` under `id`. An existing entry for `id` is replaced.
    pub fn insert(&mut self, id: usize, rect: Rect) {
        if self.contains(id) {
            self.remove(id);
        }
        if self.entries.len() <= id {
            self.entries.resize(id + 1, None);
        }
        let span = self.span(&rect);
        for idx in self.cell_indices(span) {
            self.cells[idx].push(id);
        }
        self.entries[id] = Some(rect);
        self.len += 1;
    }

    pub fn remove(&mut self, id: usize) -> Option<Rect> {
        let rect = self.entries.get_mut(id)?.take()?;
        let span = self.span(&rect);
        for idx in self.cell_indices(span) {
            let bucket = &mut self.cells[idx];
            if let Some(pos) = bucket.iter().position(|&other| other == id) {
                bucket.swap_remove(pos);
            }
        }
        self.len -= 1;
        Some(rect)
    }

    /// Move `id` to `rect`, touching buckets only when the covered cells change.
    pub fn update(&mut self, id: usize, rect: Rect) {
        let Some(old) = self.get(id).copied() else {
            self.insert(id, rect);
            return;
        };
        if self.span(&old) == self.span(&rect) {
            self.entries[id] = Some(rect);
            return;
        }
        self.remove(id);
        self.insert(id, rect);
    }

    /// Ids of every entry whose padded bounds strictly intersect the padded
    /// `rect`, ascending.
    pub fn query_overlapping(&self, rect: &Rect) -> Vec<usize> {
        let span = self.span(rect);
        let mut hits: Vec<usize> = Vec::new();
        for idx in self.cell_indices(span) {
            hits.extend_from_slice(&self.cells[idx]);
        }
        hits.sort_unstable();
        hits.dedup();
        hits.retain(|&id| {
            self.get(id)
                .is_some_and(|other| self.padding.conflicts(rect, other))
        });
        hits
    }

    fn span(&self, rect: &Rect) -> CellSpan {
        let padded = self.padding.apply(rect);
        CellSpan {
            c0: axis_cell(padded.left, self.cell, self.cols),
            r0: axis_cell(padded.top, self.cell, self.rows),
            c1: axis_cell(padded.right, self.cell, self.cols),
            r1: axis_cell(padded.bottom, self.cell, self.rows),
        }
    }

    fn cell_indices(&self, span: CellSpan) -> impl Iterator<Item = usize> + use<> {
        let cols = self.cols;
        (span.r0..=span.r1).flat_map(move |r| (span.c0..=span.c1).map(move |c| r * cols + c))
    }
}

fn cell_count(width: f32, height: f32, cell: f32) -> usize {
    let cols = (width / cell).ceil().max(1.0);
    let rows = (height / cell).ceil().max(1.0);
    let count = cols * rows;
    if count >= usize::MAX as f32 {
        usize::MAX
    } else {
        count as usize
    }
}

fn axis_cell(value: f32, cell: f32, count: usize) -> usize {
    let idx = (value / cell).floor();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(count - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(cell: f32) -> GridIndex {
        GridIndex::new(400.0, 300.0, cell, Padding::default())
    }

    #[test]
    fn query_finds_overlapping_rect() {
        let mut index = grid(20.0);
        index.insert(0, Rect::from_origin(10.0, 10.0, 30.0, 30.0));
        assert_eq!(index.query_overlapping(&Rect::from_origin(15.0, 15.0, 5.0, 5.0)), vec![0]);
    }

    #[test]
    fn query_misses_distant_rect() {
        let mut index = grid(20.0);
        index.insert(0, Rect::from_origin(10.0, 10.0, 30.0, 30.0));
        assert!(index.query_overlapping(&Rect::from_origin(200.0, 200.0, 5.0, 5.0)).is_empty());
    }

    #[test]
    fn query_filters_same_cell_non_overlap() {
        let mut index = grid(100.0);
        index.insert(0, Rect::from_origin(0.0, 0.0, 10.0, 10.0));
        // Same bucket, disjoint rectangles.
        assert!(index.query_overlapping(&Rect::from_origin(50.0, 50.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn query_reports_each_id_once_in_ascending_order() {
        let mut index = grid(10.0);
        index.insert(3, Rect::new(0.0, 0.0, 95.0, 95.0));
        index.insert(1, Rect::new(5.0, 5.0, 90.0, 90.0));
        index.insert(2, Rect::new(300.0, 200.0, 310.0, 210.0));
        assert_eq!(index.query_overlapping(&Rect::new(0.0, 0.0, 100.0, 100.0)), vec![1, 3]);
    }

    #[test]
    fn remove_drops_every_bucket_entry() {
        let mut index = grid(10.0);
        let rect = Rect::new(0.0, 0.0, 55.0, 35.0);
        index.insert(0, rect);
        assert_eq!(index.remove(0), Some(rect));
        assert!(index.is_empty());
        assert!(index.cells.iter().all(|bucket| bucket.is_empty()));
        assert_eq!(index.remove(0), None);
    }

    #[test]
    fn update_moves_entry() {
        let mut index = grid(20.0);
        index.insert(0, Rect::from_origin(10.0, 10.0, 10.0, 10.0));
        index.update(0, Rect::from_origin(200.0, 200.0, 10.0, 10.0));
        assert!(index.query_overlapping(&Rect::from_origin(12.0, 12.0, 2.0, 2.0)).is_empty());
        assert_eq!(index.query_overlapping(&Rect::from_origin(202.0, 202.0, 2.0, 2.0)), vec![0]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn reinsert_replaces_instead_of_duplicating() {
        let mut index = grid(20.0);
        index.insert(0, Rect::from_origin(2.0, 2.0, 5.0, 5.0));
        index.insert(0, Rect::from_origin(22.0, 22.0, 5.0, 5.0));
        assert_eq!(index.len(), 1);
        let stored: usize = index.cells.iter().map(|bucket| bucket.len()).sum();
        assert_eq!(stored, 1);
        assert!(index.cells[0].is_empty());
        assert_eq!(index.cells[index.cols + 1], vec![0]);
    }

    #[test]
    fn reinsert_across_cells_registers_every_covered_cell() {
        let mut index = grid(20.0);
        index.insert(0, Rect::from_origin(2.0, 2.0, 5.0, 5.0));
        // Spans columns 0..=1 and rows 0..=1.
        index.insert(0, Rect::from_origin(12.0, 12.0, 10.0, 10.0));
        let stored: usize = index.cells.iter().map(|bucket| bucket.len()).sum();
        assert_eq!(stored, 4);
        assert_eq!(index.query_overlapping(&Rect::from_origin(3.0, 3.0, 2.0, 2.0)), Vec::<usize>::new());
        assert_eq!(index.query_overlapping(&Rect::from_origin(20.0, 20.0, 1.0, 1.0)), vec![0]);
    }

    #[test]
    fn off_canvas_rects_clamp_into_border_cells() {
        let mut index = grid(50.0);
        index.insert(0, Rect::new(-40.0, -30.0, -10.0, -5.0));
        assert_eq!(index.query_overlapping(&Rect::new(-35.0, -25.0, -20.0, -10.0)), vec![0]);
        index.insert(1, Rect::new(410.0, 310.0, 450.0, 330.0));
        assert_eq!(index.query_overlapping(&Rect::new(420.0, 315.0, 430.0, 320.0)), vec![1]);
    }

    #[test]
    fn padding_widens_conflicts() {
        let mut index = GridIndex::new(400.0, 300.0, 50.0, Padding::new(4.0, 4.0));
        index.insert(0, Rect::new(0.0, 0.0, 48.0, 20.0));
        // Three pixels of gap is inside the four pixel clearance.
        assert_eq!(index.query_overlapping(&Rect::new(51.0, 0.0, 80.0, 20.0)), vec![0]);
        assert!(index.query_overlapping(&Rect::new(53.0, 0.0, 80.0, 20.0)).is_empty());
    }

    #[test]
    fn huge_cell_counts_are_coarsened() {
        let index = GridIndex::new(100_000.0, 100_000.0, 1.0, Padding::default());
        assert!(index.cells.len() <= MAX_CELLS);
        assert!(index.cell_size() > 1.0);
    }

    #[test]
    fn rebuilt_keeps_entries() {
        let mut index = grid(20.0);
        index.insert(0, Rect::new(10.0, 10.0, 30.0, 30.0));
        index.insert(4, Rect::new(100.0, 100.0, 130.0, 130.0));
        let rebuilt = index.rebuilt(800.0, 600.0, 64.0, Padding::new(2.0, 2.0));
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt.get(4), Some(&Rect::new(100.0, 100.0, 130.0, 130.0)));
        assert_eq!(rebuilt.cell_size(), 64.0);
    }
}
