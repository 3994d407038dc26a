//! Named, z-ordered damage layers over per-layer quadtree indices.
//!
//! The layer manager owns structural damage only, never cell content: the
//! window manager marks move/resize/close damage here, queries the merged
//! dirty regions to decide what to repaint or invalidate, and clears them
//! once consumed.

use indexmap::IndexMap;
use tracing::trace;

use crate::spatial::{QuadTree, DEFAULT_MAX_DEPTH, DEFAULT_MAX_OBJECTS};
use crate::video::Region;

/// Standard layer id: the screen background.
pub const BACKGROUND_LAYER: &str = "background";
/// Standard layer id: window drop shadows.
pub const SHADOW_LAYER: &str = "shadow";
/// Standard layer id: window bodies.
pub const WINDOW_LAYER: &str = "window";
/// Standard layer id: the text cursor.
pub const CURSOR_LAYER: &str = "cursor";

/// Offset of a window's drop shadow: two cells right, one cell down.
pub const SHADOW_OFFSET: (i32, i32) = (2, 1);

/// What kind of content a layer carries; drives dispatch behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Screen background beneath everything.
    Background,
    /// Window drop shadows.
    Shadow,
    /// Window bodies.
    Window,
    /// The text cursor. Its damage is transient: cleared on every dispatch.
    Cursor,
}

/// Spec for one layer at construction time.
#[derive(Debug, Clone)]
pub struct LayerSpec {
    /// Unique layer id.
    pub id: String,
    /// Content kind.
    pub kind: LayerKind,
    /// Draw order, ascending.
    pub z_index: i32,
    /// Initial visibility.
    pub visible: bool,
}

struct Layer {
    kind: LayerKind,
    z_index: i32,
    visible: bool,
    dirty: QuadTree,
}

/// Owner of the fixed set of named layers and their dirty indices.
///
/// Layers are registered once at construction and never added or removed
/// afterward; only their dirty indices mutate. Operations on unknown layer
/// ids are silent no-ops.
pub struct LayerManager {
    layers: IndexMap<String, Layer>,
    width: u16,
    height: u16,
}

impl LayerManager {
    /// Create a manager with the four standard layers: background (z 0),
    /// shadow (z 1), window (z 2), cursor (z 3), all visible.
    pub fn new(width: u16, height: u16) -> Self {
        Self::with_layers(
            width,
            height,
            [
                LayerSpec {
                    id: BACKGROUND_LAYER.to_owned(),
                    kind: LayerKind::Background,
                    z_index: 0,
                    visible: true,
                },
                LayerSpec {
                    id: SHADOW_LAYER.to_owned(),
                    kind: LayerKind::Shadow,
                    z_index: 1,
                    visible: true,
                },
                LayerSpec {
                    id: WINDOW_LAYER.to_owned(),
                    kind: LayerKind::Window,
                    z_index: 2,
                    visible: true,
                },
                LayerSpec {
                    id: CURSOR_LAYER.to_owned(),
                    kind: LayerKind::Cursor,
                    z_index: 3,
                    visible: true,
                },
            ],
        )
    }

    /// Create a manager with a custom fixed layer set.
    pub fn with_layers(
        width: u16,
        height: u16,
        specs: impl IntoIterator<Item = LayerSpec>,
    ) -> Self {
        let bounds = Region::new(0, 0, u32::from(width), u32::from(height));
        let mut layers = IndexMap::new();
        for spec in specs {
            layers.insert(
                spec.id,
                Layer {
                    kind: spec.kind,
                    z_index: spec.z_index,
                    visible: spec.visible,
                    dirty: QuadTree::with_limits(bounds, DEFAULT_MAX_DEPTH, DEFAULT_MAX_OBJECTS),
                },
            );
        }
        // Ascending z so iteration order is draw order.
        layers.sort_by(|_, a, _, b| a.z_index.cmp(&b.z_index));
        Self {
            layers,
            width,
            height,
        }
    }

    /// Buffer extent the layers cover.
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Mark a region dirty on a layer. Unknown ids are silent no-ops.
    pub fn mark_dirty(&mut self, layer_id: &str, region: Region) {
        if let Some(layer) = self.layers.get_mut(layer_id) {
            trace!(layer = layer_id, ?region, "mark dirty");
            layer.dirty.insert(region);
        }
    }

    /// Coalesced dirty regions for a layer. Non-destructive: callers must
    /// explicitly [`clear_dirty_regions`](Self::clear_dirty_regions) once
    /// the damage has been consumed.
    pub fn dirty_regions(&self, layer_id: &str) -> Vec<Region> {
        self.layers
            .get(layer_id)
            .map_or_else(Vec::new, |layer| layer.dirty.merge_regions())
    }

    /// Reset a layer's dirty index.
    pub fn clear_dirty_regions(&mut self, layer_id: &str) {
        if let Some(layer) = self.layers.get_mut(layer_id) {
            layer.dirty.clear();
        }
    }

    /// True when the layer has stored damage overlapping the query region.
    /// A cheap existence check against the spatial index, not a full merge.
    pub fn needs_redraw(&self, layer_id: &str, region: &Region) -> bool {
        self.layers.get(layer_id).is_some_and(|layer| {
            layer
                .dirty
                .retrieve(region)
                .iter()
                .any(|r| r.overlaps(region))
        })
    }

    /// Show or hide a layer.
    pub fn set_layer_visible(&mut self, layer_id: &str, visible: bool) {
        if let Some(layer) = self.layers.get_mut(layer_id) {
            layer.visible = visible;
        }
    }

    /// Whether a layer is visible. Unknown ids report false.
    pub fn is_layer_visible(&self, layer_id: &str) -> bool {
        self.layers.get(layer_id).is_some_and(|l| l.visible)
    }

    /// The shadow rectangle associated with a window region: same size,
    /// offset by [`SHADOW_OFFSET`].
    pub fn shadow_region(&self, window_region: &Region) -> Region {
        Region::new(
            window_region.x + SHADOW_OFFSET.0,
            window_region.y + SHADOW_OFFSET.1,
            window_region.width,
            window_region.height,
        )
    }

    /// Propagate structural window damage across layers: the window layer
    /// gets the region, the shadow layer gets its offset rectangle, and the
    /// background layer gets both — revealing or hiding a window changes
    /// what the background must redraw beneath it.
    pub fn mark_window_and_shadow_dirty(&mut self, window_region: Region) {
        let shadow = self.shadow_region(&window_region);
        self.mark_dirty(WINDOW_LAYER, window_region);
        self.mark_dirty(SHADOW_LAYER, shadow);
        self.mark_dirty(BACKGROUND_LAYER, window_region);
        self.mark_dirty(BACKGROUND_LAYER, shadow);
    }

    /// Clip a region to the buffer bounds. `None` when fully off-screen.
    pub fn visible_region(&self, region: &Region) -> Option<Region> {
        region.clipped(self.width, self.height)
    }

    /// Per-frame dispatch over layers in ascending z-index, skipping
    /// invisible layers, with kind-specific dirty post-processing:
    ///
    /// - background: its dirty set is cleared (the consumer repainted it);
    /// - shadow/window: damage is left for the window manager to consume;
    /// - cursor: each dirty region still on screen dirties the background
    ///   beneath it unless window damage covers the same spot, then the
    ///   cursor layer is cleared unconditionally — cursor damage is always
    ///   one-shot.
    pub fn dispatch(&mut self) {
        let order: Vec<String> = self.layers.keys().cloned().collect();

        for id in order {
            let Some(layer) = self.layers.get(&id) else {
                continue;
            };
            if !layer.visible {
                continue;
            }

            match layer.kind {
                LayerKind::Background => self.clear_dirty_regions(&id),
                LayerKind::Shadow | LayerKind::Window => {}
                LayerKind::Cursor => {
                    let cursor_damage = self.dirty_regions(&id);
                    let window_damage = self.dirty_regions(WINDOW_LAYER);

                    for region in cursor_damage {
                        let Some(visible) = self.visible_region(&region) else {
                            continue;
                        };
                        let covered_by_window =
                            window_damage.iter().any(|w| w.overlaps(&visible));
                        if !covered_by_window {
                            // Uncovering the cursor exposes the background.
                            self.mark_dirty(BACKGROUND_LAYER, visible);
                        }
                    }
                    self.clear_dirty_regions(&id);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unknown_layer_is_silent() {
        let mut layers = LayerManager::new(80, 25);
        layers.mark_dirty("no-such-layer", Region::cell(0, 0));
        assert!(layers.dirty_regions("no-such-layer").is_empty());
        assert!(!layers.needs_redraw("no-such-layer", &Region::cell(0, 0)));
        layers.clear_dirty_regions("no-such-layer");
    }

    #[test]
    fn dirty_regions_are_not_cleared_by_reads() {
        let mut layers = LayerManager::new(80, 25);
        layers.mark_dirty(WINDOW_LAYER, Region::new(5, 5, 10, 4));

        assert_eq!(layers.dirty_regions(WINDOW_LAYER).len(), 1);
        // Distinct from the buffer's read-and-reset flush.
        assert_eq!(layers.dirty_regions(WINDOW_LAYER).len(), 1);

        layers.clear_dirty_regions(WINDOW_LAYER);
        assert!(layers.dirty_regions(WINDOW_LAYER).is_empty());
    }

    #[test]
    fn needs_redraw_checks_overlap() {
        let mut layers = LayerManager::new(80, 25);
        layers.mark_dirty(WINDOW_LAYER, Region::new(10, 10, 5, 5));

        assert!(layers.needs_redraw(WINDOW_LAYER, &Region::new(12, 12, 2, 2)));
        assert!(!layers.needs_redraw(WINDOW_LAYER, &Region::new(40, 2, 3, 3)));
        assert!(!layers.needs_redraw(SHADOW_LAYER, &Region::new(12, 12, 2, 2)));
    }

    #[test]
    fn shadow_region_is_offset() {
        let layers = LayerManager::new(80, 25);
        let shadow = layers.shadow_region(&Region::new(5, 5, 10, 4));
        assert_eq!(shadow, Region::new(7, 6, 10, 4));
    }

    #[test]
    fn window_damage_propagates_to_shadow_and_background() {
        let mut layers = LayerManager::new(80, 25);
        let region = Region::new(5, 5, 10, 4);
        layers.mark_window_and_shadow_dirty(region);

        assert!(layers.needs_redraw(WINDOW_LAYER, &region));
        assert!(layers.needs_redraw(SHADOW_LAYER, &Region::new(7, 6, 10, 4)));
        // Background covers both the window and its shadow.
        assert!(layers.needs_redraw(BACKGROUND_LAYER, &region));
        assert!(layers.needs_redraw(BACKGROUND_LAYER, &Region::new(7, 6, 10, 4)));
    }

    #[test]
    fn dispatch_clears_cursor_damage_and_exposes_background() {
        let mut layers = LayerManager::new(80, 25);
        layers.mark_dirty(CURSOR_LAYER, Region::cell(3, 3));

        layers.dispatch();

        // Cursor damage is one-shot.
        assert!(layers.dirty_regions(CURSOR_LAYER).is_empty());
        // No window covered the cursor, so the background got dirtied.
        assert!(layers.needs_redraw(BACKGROUND_LAYER, &Region::cell(3, 3)));
    }

    #[test]
    fn dispatch_skips_background_mark_under_window_damage() {
        let mut layers = LayerManager::new(80, 25);
        layers.mark_dirty(WINDOW_LAYER, Region::new(0, 0, 10, 10));
        layers.mark_dirty(CURSOR_LAYER, Region::cell(3, 3));

        layers.dispatch();

        assert!(layers.dirty_regions(CURSOR_LAYER).is_empty());
        // Window damage already covers the spot; dispatch cleared the
        // background layer and must not have re-marked it for the cursor.
        assert!(layers.dirty_regions(BACKGROUND_LAYER).is_empty());
    }

    #[test]
    fn dispatch_ignores_offscreen_cursor_damage() {
        let mut layers = LayerManager::new(80, 25);
        layers.mark_dirty(CURSOR_LAYER, Region::cell(200, 200));

        layers.dispatch();
        assert!(layers.dirty_regions(BACKGROUND_LAYER).is_empty());
    }

    #[test]
    fn invisible_layers_are_skipped_by_dispatch() {
        let mut layers = LayerManager::new(80, 25);
        layers.set_layer_visible(CURSOR_LAYER, false);
        layers.mark_dirty(CURSOR_LAYER, Region::cell(3, 3));

        layers.dispatch();

        // Hidden cursor layer was not processed: damage stays put and the
        // background was never marked.
        assert!(!layers.dirty_regions(CURSOR_LAYER).is_empty());
        assert!(layers.dirty_regions(BACKGROUND_LAYER).is_empty());
    }
}
