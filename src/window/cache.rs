//! Per-window rendered-content cache keyed by a state hash.
//!
//! The cache is purely derivative: everything in it can be rebuilt from
//! window state plus the buffer, so eviction is never a correctness
//! problem. The state hash covers exactly the fields that change a
//! window's pixels — position, size, title, focus, maximized flag, scroll —
//! and the hash check runs before any cached content is served, so a stale
//! entry that outlived its window state is never used.

use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use rustc_hash::{FxHashMap, FxHasher};
use tracing::trace;

use crate::video::{Cell, Region};
use crate::window::Window;

/// Rendered window content: rows of optional cells, window-local
/// coordinates.
pub type CellGrid = Vec<Vec<Option<Cell>>>;

struct CachedWindow {
    content: CellGrid,
    region: Region,
    last_update: Instant,
    state_hash: u64,
}

/// Cache of rendered window grids, keyed by window id.
#[derive(Default)]
pub struct WindowCache {
    entries: FxHashMap<String, CachedWindow>,
}

/// Canonical hash of the visually relevant window state.
fn state_hash(window: &Window) -> u64 {
    let mut hasher = FxHasher::default();
    (window.position.x, window.position.y).hash(&mut hasher);
    (window.size.width, window.size.height).hash(&mut hasher);
    window.title.hash(&mut hasher);
    window.active.hash(&mut hasher);
    window.maximized.hash(&mut hasher);
    (window.scroll.x, window.scroll.y).hash(&mut hasher);
    hasher.finish()
}

impl WindowCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the window has no cache entry or its state hash no longer
    /// matches the cached one.
    pub fn needs_redraw(&self, window: &Window) -> bool {
        self.entries
            .get(&window.id)
            .map_or(true, |cached| cached.state_hash != state_hash(window))
    }

    /// Cached content for a window, if present.
    pub fn content(&self, window_id: &str) -> Option<&CellGrid> {
        self.entries.get(window_id).map(|c| &c.content)
    }

    /// Store rendered content for a window, stamping the current state
    /// hash and update time.
    pub fn update(&mut self, window: &Window, content: CellGrid, region: Region) {
        self.entries.insert(
            window.id.clone(),
            CachedWindow {
                content,
                region,
                last_update: Instant::now(),
                state_hash: state_hash(window),
            },
        );
    }

    /// Drop a window's entry. Used for instant invalidation on structural
    /// change (close/move/resize); unknown ids are no-ops.
    pub fn remove(&mut self, window_id: &str) {
        if self.entries.remove(window_id).is_some() {
            trace!(window = window_id, "cache entry evicted");
        }
    }

    /// Cached screen region for a window.
    pub fn region(&self, window_id: &str) -> Option<Region> {
        self.entries.get(window_id).map(|c| c.region)
    }

    /// Ids of all cached windows whose stored region overlaps the query.
    /// Used to find which cached windows must be invalidated when another
    /// window's geometry changes over them.
    pub fn overlapping_windows(&self, region: &Region) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, cached)| cached.region.overlaps(region))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether a window has a cache entry.
    pub fn is_cached(&self, window_id: &str) -> bool {
        self.entries.contains_key(window_id)
    }

    /// Ids of all cached windows.
    pub fn cached_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Evict entries older than `max_age`. A periodic GC pass, not
    /// correctness-critical: the hash check always runs before cached
    /// content is served.
    pub fn cleanup(&mut self, max_age: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, cached| now.duration_since(cached.last_update) <= max_age);
    }
}
