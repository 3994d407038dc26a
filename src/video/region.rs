//! Dirty rectangles and region coalescing.
//!
//! A [`Region`] is a damage descriptor in grid coordinates: a hint that the
//! cells inside it may have changed. Over-approximation is acceptable;
//! under-approximation is a correctness bug, so every merge here only ever
//! grows coverage.

use smallvec::SmallVec;

/// Axis-aligned rectangle of cells in grid coordinates.
///
/// Positions are signed because structural damage (window drags) can start
/// off-screen; extents are unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

impl Region {
    /// Create a region from its top-left corner and extent.
    #[inline]
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Single-cell region.
    #[inline]
    pub fn cell(x: i32, y: i32) -> Self {
        Self::new(x, y, 1, 1)
    }

    /// One past the rightmost column.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// One past the bottom row.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Area in cells.
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// True when the region covers no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Strict positive-area intersection test. Rectangles that only share
    /// an edge or a corner do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Region) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Full-edge adjacency: same row extent touching end-to-end in x, or
    /// same column extent touching end-to-end in y.
    ///
    /// Regions sharing only a partial edge (different height/width) are
    /// not adjacent. That leaves some avoidable fragmentation in the merged
    /// output; kept as-is so damage stays cheap to compute.
    #[inline]
    pub fn is_adjacent(&self, other: &Region) -> bool {
        let touch_horizontally = self.y == other.y
            && self.height == other.height
            && (self.right() == other.x || other.right() == self.x);

        let touch_vertically = self.x == other.x
            && self.width == other.width
            && (self.bottom() == other.y || other.bottom() == self.y);

        touch_horizontally || touch_vertically
    }

    /// Inclusive touch test: overlapping, edge-touching, or corner-touching.
    /// This is the coarser predicate the per-layer merge uses.
    #[inline]
    pub(crate) fn touches(&self, other: &Region) -> bool {
        !(self.right() < other.x
            || other.right() < self.x
            || self.bottom() < other.y
            || other.bottom() < self.y)
    }

    /// Smallest enclosing rectangle covering both regions.
    #[inline]
    pub fn union(&self, other: &Region) -> Region {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());

        Region::new(x1, y1, (x2 - x1) as u32, (y2 - y1) as u32)
    }

    /// Clip this region to the rectangle `[0, width) x [0, height)`.
    /// Returns `None` when nothing remains on screen.
    pub fn clipped(&self, width: u16, height: u16) -> Option<Region> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.right().min(i32::from(width));
        let y2 = self.bottom().min(i32::from(height));

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Region::new(x1, y1, (x2 - x1) as u32, (y2 - y1) as u32))
    }
}

/// Short region list that stays on the stack for typical frame damage.
pub type RegionVec = SmallVec<[Region; 8]>;

/// Coalesce regions until no two remaining entries overlap or are adjacent.
///
/// Repeatedly pops a region and tries to union it into an already-optimized
/// entry; full passes repeat until a pass makes no merge. The fixed point is
/// a minimal, pairwise-non-mergeable set. Worst case is quadratic passes
/// over the working set, which stays small in practice because writes are
/// batched before they reach this pass; the result stays inline for
/// typical frame damage.
pub fn coalesce(regions: impl IntoIterator<Item = Region>) -> RegionVec {
    coalesce_by(regions, |a, b| a.overlaps(b) || a.is_adjacent(b))
}

/// Coalesce with the inclusive touch predicate (edge- and corner-touching
/// regions merge too). Used by the per-layer spatial index.
pub(crate) fn coalesce_touching(regions: impl IntoIterator<Item = Region>) -> RegionVec {
    coalesce_by(regions, Region::touches)
}

fn coalesce_by(
    regions: impl IntoIterator<Item = Region>,
    can_merge: impl Fn(&Region, &Region) -> bool,
) -> RegionVec {
    let mut regions: RegionVec = regions.into_iter().collect();
    let mut optimized: RegionVec = SmallVec::with_capacity(regions.len());

    loop {
        let mut merged = false;

        while let Some(current) = regions.pop() {
            let mut merged_current = false;

            for existing in &mut optimized {
                if can_merge(&current, existing) {
                    *existing = current.union(existing);
                    merged_current = true;
                    merged = true;
                    break;
                }
            }

            if !merged_current {
                optimized.push(current);
            }
        }

        if !merged {
            break;
        }
        // A merge may have made two optimized entries mergeable; run
        // another pass over the whole set.
        std::mem::swap(&mut regions, &mut optimized);
    }

    optimized
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn overlap_requires_positive_area() {
        let a = Region::new(0, 0, 2, 2);
        let b = Region::new(1, 1, 2, 2);
        assert!(a.overlaps(&b));

        // Edge-touching only: zero shared area.
        let c = Region::new(2, 0, 2, 2);
        assert!(!a.overlaps(&c));

        // Corner-touching.
        let d = Region::new(2, 2, 2, 2);
        assert!(!a.overlaps(&d));

        // Disjoint.
        let e = Region::new(10, 10, 1, 1);
        assert!(!a.overlaps(&e));
    }

    #[test]
    fn adjacency_full_edge_only() {
        let a = Region::new(0, 0, 2, 1);
        let b = Region::new(2, 0, 3, 1);
        assert!(a.is_adjacent(&b));
        assert!(b.is_adjacent(&a));

        let c = Region::new(0, 1, 2, 4);
        assert!(a.is_adjacent(&c));

        // Partial edge: different heights never count.
        let d = Region::new(2, 0, 1, 2);
        assert!(!a.is_adjacent(&d));

        // Overlapping regions are not adjacent.
        let e = Region::new(1, 0, 2, 1);
        assert!(!a.is_adjacent(&e));
    }

    #[test]
    fn union_contains_both() {
        let a = Region::new(0, 0, 2, 1);
        let b = Region::new(5, 3, 1, 1);
        let u = a.union(&b);
        assert_eq!(u, Region::new(0, 0, 6, 4));
        assert!(u.area() >= a.area().max(b.area()));
    }

    #[test]
    fn union_negative_origin() {
        let a = Region::new(-2, -1, 2, 1);
        let b = Region::new(0, 0, 1, 1);
        assert_eq!(a.union(&b), Region::new(-2, -1, 3, 2));
    }

    #[test]
    fn clipped_to_screen() {
        let r = Region::new(-2, -1, 5, 4);
        assert_eq!(r.clipped(80, 25), Some(Region::new(0, 0, 3, 3)));

        // Fully off-screen.
        assert_eq!(Region::new(90, 0, 4, 4).clipped(80, 25), None);
        assert_eq!(Region::new(-4, 0, 4, 4).clipped(80, 25), None);
    }

    #[test]
    fn coalesce_merges_adjacent_cells() {
        let merged = coalesce([Region::cell(0, 0), Region::cell(1, 0)]);
        assert_eq!(merged.into_vec(), vec![Region::new(0, 0, 2, 1)]);
    }

    #[test]
    fn coalesce_keeps_disjoint_regions() {
        let mut merged = coalesce([Region::cell(0, 0), Region::cell(10, 10)]).into_vec();
        merged.sort_by_key(|r| (r.y, r.x));
        assert_eq!(merged, vec![Region::cell(0, 0), Region::cell(10, 10)]);
    }

    #[test]
    fn small_damage_lists_stay_inline() {
        // Typical per-frame damage fits the inline capacity; no heap spill.
        let merged = coalesce((0..6).map(|x| Region::cell(x * 3, 0)));
        assert_eq!(merged.len(), 6);
        assert!(!merged.spilled());
    }

    #[test]
    fn coalesce_reaches_fixed_point() {
        // A row of cells plus one overlapping block; the chain must
        // collapse into a single rectangle across passes.
        let input = (0..6)
            .map(|x| Region::cell(x, 0))
            .chain(std::iter::once(Region::new(0, 0, 6, 2)));
        let merged = coalesce(input);
        assert_eq!(merged.into_vec(), vec![Region::new(0, 0, 6, 2)]);
    }

    #[test]
    fn coalesce_output_pairwise_unmergeable() {
        let input = [
            Region::new(0, 0, 3, 2),
            Region::new(2, 1, 4, 3),
            Region::new(20, 20, 2, 2),
            Region::new(3, 0, 2, 1),
        ];
        let merged = coalesce(input);
        for (i, a) in merged.iter().enumerate() {
            for b in merged.iter().skip(i + 1) {
                assert!(!a.overlaps(b) && !a.is_adjacent(b), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn touching_predicate_includes_corners() {
        let a = Region::new(0, 0, 2, 2);
        let b = Region::new(2, 2, 2, 2);
        assert!(a.touches(&b));
        assert!(!a.overlaps(&b));

        let merged = coalesce_touching([a, b]);
        assert_eq!(merged.into_vec(), vec![Region::new(0, 0, 4, 4)]);
    }
}
