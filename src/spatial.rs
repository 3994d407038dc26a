//! Quadtree spatial index for per-layer dirty regions.
//!
//! A window manager issuing dozens of move/resize damage rectangles per
//! frame would otherwise force a quadratic merge over one unbounded global
//! list every frame. The quadtree bounds the candidate set for overlap
//! queries and keeps the whole-layer merge to one pass over a small object
//! count per subtree.

use crate::video::{coalesce_touching, Region};

/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: u8 = 4;
/// Default object count a node holds before splitting.
pub const DEFAULT_MAX_OBJECTS: usize = 10;

/// Recursive 4-way spatial partition of dirty regions.
///
/// A node starts as a leaf holding regions directly. Once it holds more
/// than `max_objects` regions and is above `max_depth`, it splits into four
/// equal quadrants and pushes down every region fully contained in one
/// quadrant. Regions straddling a midline stay at the node that holds them;
/// only fully-contained regions descend. Leaf overflow is allowed at
/// `max_depth`.
#[derive(Debug)]
pub struct QuadTree {
    bounds: Region,
    depth: u8,
    max_depth: u8,
    max_objects: usize,
    objects: Vec<Region>,
    children: Option<Box<[QuadTree; 4]>>,
}

impl QuadTree {
    /// Create an index over the given bounds with default limits.
    pub fn new(bounds: Region) -> Self {
        Self::with_limits(bounds, DEFAULT_MAX_DEPTH, DEFAULT_MAX_OBJECTS)
    }

    /// Create an index with explicit depth/object limits.
    pub fn with_limits(bounds: Region, max_depth: u8, max_objects: usize) -> Self {
        Self::node(bounds, max_depth, max_objects, 0)
    }

    fn node(bounds: Region, max_depth: u8, max_objects: usize, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            max_depth,
            max_objects,
            objects: Vec::new(),
            children: None,
        }
    }

    /// Bounds this index covers.
    pub fn bounds(&self) -> Region {
        self.bounds
    }

    /// True when no regions are stored anywhere in the subtree.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
            && self
                .children
                .as_ref()
                .map_or(true, |nodes| nodes.iter().all(QuadTree::is_empty))
    }

    /// Number of regions stored in the subtree.
    pub fn len(&self) -> usize {
        self.objects.len()
            + self.children.as_ref().map_or(0, |nodes| {
                nodes.iter().map(QuadTree::len).sum::<usize>()
            })
    }

    /// Empty the subtree and discard all child nodes. The tree rebuilds
    /// from a plain leaf on subsequent inserts.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.children = None;
    }

    /// Index of the single quadrant that fully contains `region`, or `None`
    /// when the region straddles a midline. Quadrant order: top-right,
    /// top-left, bottom-left, bottom-right.
    fn quadrant_for(&self, region: &Region) -> Option<usize> {
        let mid_x = self.bounds.x + (self.bounds.width / 2) as i32;
        let mid_y = self.bounds.y + (self.bounds.height / 2) as i32;

        let in_top = region.y < mid_y && region.bottom() < mid_y;
        let in_bottom = region.y > mid_y;

        if region.x < mid_x && region.right() < mid_x {
            if in_top {
                return Some(1);
            }
            if in_bottom {
                return Some(2);
            }
        } else if region.x > mid_x {
            if in_top {
                return Some(0);
            }
            if in_bottom {
                return Some(3);
            }
        }
        None
    }

    fn split(&mut self) {
        let half_w = self.bounds.width / 2;
        let half_h = self.bounds.height / 2;
        let rest_w = self.bounds.width - half_w;
        let rest_h = self.bounds.height - half_h;
        let x = self.bounds.x;
        let y = self.bounds.y;
        let mid_x = x + half_w as i32;
        let mid_y = y + half_h as i32;

        let child = |bounds| Self::node(bounds, self.max_depth, self.max_objects, self.depth + 1);
        self.children = Some(Box::new([
            // Top right
            child(Region::new(mid_x, y, rest_w, half_h)),
            // Top left
            child(Region::new(x, y, half_w, half_h)),
            // Bottom left
            child(Region::new(x, mid_y, half_w, rest_h)),
            // Bottom right
            child(Region::new(mid_x, mid_y, rest_w, rest_h)),
        ]));
    }

    /// Insert a region.
    ///
    /// Descends into the one child that fully contains the region, if any.
    /// When a node's object count first exceeds `max_objects` below
    /// `max_depth`, the node splits lazily and redistributes the regions
    /// that fit a single quadrant.
    pub fn insert(&mut self, region: Region) {
        if self.children.is_some() {
            if let Some(idx) = self.quadrant_for(&region) {
                if let Some(nodes) = &mut self.children {
                    nodes[idx].insert(region);
                }
                return;
            }
        }

        self.objects.push(region);

        if self.objects.len() > self.max_objects && self.depth < self.max_depth {
            if self.children.is_none() {
                self.split();
            }

            let mut i = 0;
            while i < self.objects.len() {
                match self.quadrant_for(&self.objects[i]) {
                    Some(idx) => {
                        let moved = self.objects.swap_remove(i);
                        if let Some(nodes) = &mut self.children {
                            nodes[idx].insert(moved);
                        }
                    }
                    None => i += 1,
                }
            }
        }
    }

    /// All stored regions that could intersect the query region: this
    /// node's own objects plus, when the query fits a single child, that
    /// child's results, else the results of all four children.
    pub fn retrieve(&self, region: &Region) -> Vec<Region> {
        let mut out = self.objects.clone();
        self.retrieve_into(region, &mut out);
        out
    }

    fn retrieve_into(&self, region: &Region, out: &mut Vec<Region>) {
        let Some(nodes) = &self.children else {
            return;
        };
        match self.quadrant_for(region) {
            Some(idx) => {
                out.extend_from_slice(&nodes[idx].objects);
                nodes[idx].retrieve_into(region, out);
            }
            None => {
                // Query spans multiple quadrants.
                for node in nodes.iter() {
                    out.extend_from_slice(&node.objects);
                    node.retrieve_into(region, out);
                }
            }
        }
    }

    /// Collect every region in the subtree.
    pub fn all_regions(&self) -> Vec<Region> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<Region>) {
        out.extend_from_slice(&self.objects);
        if let Some(nodes) = &self.children {
            for node in nodes.iter() {
                node.collect_into(out);
            }
        }
    }

    /// Collect the whole subtree and coalesce it into a minimal region
    /// list for the layer. Touching regions (edges and corners included)
    /// merge here, a coarser predicate than the buffer's own pass.
    pub fn merge_regions(&self) -> Vec<Region> {
        coalesce_touching(self.all_regions()).into_vec()
    }
}
