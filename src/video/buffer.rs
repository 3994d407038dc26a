//! 2D character-cell video buffer with batched dirty-region tracking.

use std::time::Instant;

use tracing::trace;
use unicode_width::UnicodeWidthChar;

use super::cell::{Cell, CellAttributes};
use super::region::{coalesce, Region, RegionVec};

/// Half-period of the cursor blink cycle, in milliseconds.
const BLINK_HALF_PERIOD_MS: u64 = 500;

/// Cursor state. Exactly one cursor per buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
    /// Whether the cursor is drawn at all.
    pub visible: bool,
    /// Whether the cursor blinks when visible.
    pub blinking: bool,
}

/// Read-only view of the buffer for renderers: dimensions, cells, cursor,
/// and the current blink phase.
#[derive(Debug)]
pub struct BufferSnapshot<'a> {
    /// Buffer width in cells.
    pub width: u16,
    /// Buffer height in cells.
    pub height: u16,
    /// Cursor state at snapshot time.
    pub cursor: Cursor,
    /// True when the blink cycle is currently in its "on" half.
    pub blink_on: bool,
    cells: &'a [Option<Cell>],
}

impl BufferSnapshot<'_> {
    /// Cell at position, or `None` for out-of-bounds / never-written cells.
    #[inline]
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells[(y as usize) * (self.width as usize) + (x as usize)].as_ref()
        } else {
            None
        }
    }

    /// Raw cell slice in row-major order.
    pub fn cells(&self) -> &[Option<Cell>] {
        self.cells
    }

    /// Buffer contents as plain text, one line per row. Absent cells render
    /// as spaces.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity((self.width as usize + 1) * self.height as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                out.push(self.cell(x, y).map_or(' ', |c| c.ch));
            }
            out.push('\n');
        }
        out
    }
}

/// Character-cell video buffer.
///
/// Owns the cell grid and the cursor, and tracks dirty rectangles for
/// consumers that repaint incrementally. All coordinate errors are silently
/// absorbed: out-of-bounds writes, reads, and cursor moves are no-ops, so
/// callers never need to pre-validate draw calls.
///
/// # Batching
///
/// [`begin_batch`](Self::begin_batch) / [`end_batch`](Self::end_batch)
/// bracket a sequence of writes. While a batch is open, newly dirtied
/// regions accumulate in a side buffer and are merged into the main dirty
/// set in a single coalescing pass on `end_batch`. A multi-cell draw then
/// costs one merge pass instead of one per cell, and a reader that flushes
/// per logical frame never observes a partially-drawn intermediate state as
/// separate damage. Calling `begin_batch` while a batch is already open is
/// an ignored no-op; `end_batch` without an open batch is likewise a no-op.
pub struct VideoBuffer {
    width: u16,
    height: u16,
    cells: Vec<Option<Cell>>,
    cursor: Cursor,
    dirty: RegionVec,
    /// `Some` while a batch scope is open.
    batch: Option<RegionVec>,
    epoch: Instant,
    last_blink_ms: Option<u64>,
}

impl VideoBuffer {
    /// Create a buffer of the given size with an empty grid and a visible,
    /// blinking cursor at the origin.
    pub fn new(width: u16, height: u16) -> Self {
        let size = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            cells: vec![None; size],
            cursor: Cursor {
                x: 0,
                y: 0,
                visible: true,
                blinking: true,
            },
            dirty: RegionVec::new(),
            batch: None,
            epoch: Instant::now(),
            last_blink_ms: None,
        }
    }

    /// Buffer width.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Buffer height.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < i32::from(self.width) && y >= 0 && y < i32::from(self.height) {
            Some((y as usize) * (self.width as usize) + (x as usize))
        } else {
            None
        }
    }

    /// Write a character at position. Out-of-bounds is a silent no-op.
    /// Only the first `char` of a multi-character string is stored.
    pub fn write_char(&mut self, x: i32, y: i32, text: &str, attributes: CellAttributes) {
        let Some(ch) = text.chars().next() else {
            return;
        };
        let Some(idx) = self.index(x, y) else {
            return;
        };

        self.cells[idx] = Some(Cell::new(ch, attributes));
        self.mark_dirty(Region::cell(x, y));
    }

    /// Write a string left-to-right starting at position, one cell per
    /// character. Zero-width characters are skipped; cells past the right
    /// edge are silently dropped.
    pub fn write_str(&mut self, x: i32, y: i32, text: &str, attributes: CellAttributes) {
        let mut col = x;
        for ch in text.chars() {
            if UnicodeWidthChar::width(ch).unwrap_or(0) == 0 {
                continue;
            }
            if let Some(idx) = self.index(col, y) {
                self.cells[idx] = Some(Cell::new(ch, attributes));
                self.mark_dirty(Region::cell(col, y));
            }
            col += 1;
        }
    }

    /// Cell at position, or `None` for out-of-bounds or never-written cells.
    pub fn get_char(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).and_then(|idx| self.cells[idx].as_ref())
    }

    /// Reset every cell to empty.
    ///
    /// Only regions that held content are marked dirty; cells that were
    /// already empty generate no dirty churn.
    pub fn clear(&mut self) {
        let mut touched = Vec::new();
        for y in 0..i32::from(self.height) {
            for x in 0..i32::from(self.width) {
                let idx = (y as usize) * (self.width as usize) + (x as usize);
                if self.cells[idx].is_some() {
                    touched.push(Region::cell(x, y));
                }
            }
        }
        self.cells.fill(None);
        for region in touched {
            self.mark_dirty(region);
        }
    }

    /// Resize the grid, preserving the overlapping top-left sub-rectangle
    /// of old content. The cursor is clamped into the new bounds and the
    /// whole new extent is marked dirty.
    pub fn resize(&mut self, width: u16, height: u16) {
        let new_size = (width as usize).saturating_mul(height as usize);
        let mut new_cells = vec![None; new_size];

        let copy_w = self.width.min(width) as usize;
        let copy_h = self.height.min(height) as usize;
        for y in 0..copy_h {
            let old_start = y * self.width as usize;
            let new_start = y * width as usize;
            new_cells[new_start..new_start + copy_w]
                .clone_from_slice(&self.cells[old_start..old_start + copy_w]);
        }

        self.width = width;
        self.height = height;
        self.cells = new_cells;
        self.cursor.x = self.cursor.x.min(width.saturating_sub(1));
        self.cursor.y = self.cursor.y.min(height.saturating_sub(1));
        self.mark_dirty(Region::new(0, 0, u32::from(width), u32::from(height)));
    }

    /// Current cursor state.
    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Move the cursor. Out-of-bounds positions and moves to the current
    /// position are silently ignored; an accepted move dirties both the old
    /// and the new cell.
    pub fn set_cursor_position(&mut self, x: i32, y: i32) {
        if x < 0 || x >= i32::from(self.width) || y < 0 || y >= i32::from(self.height) {
            return;
        }
        let (x, y) = (x as u16, y as u16);
        if (x, y) == (self.cursor.x, self.cursor.y) {
            return;
        }

        self.mark_dirty(Region::cell(
            i32::from(self.cursor.x),
            i32::from(self.cursor.y),
        ));
        self.mark_dirty(Region::cell(i32::from(x), i32::from(y)));
        self.cursor.x = x;
        self.cursor.y = y;
    }

    /// Show or hide the cursor. No-op when unchanged; a change dirties the
    /// cursor cell.
    pub fn set_cursor_visible(&mut self, visible: bool) {
        if self.cursor.visible != visible {
            self.cursor.visible = visible;
            self.mark_cursor_dirty();
        }
    }

    /// Enable or disable cursor blinking. No-op when unchanged; a change
    /// dirties the cursor cell.
    pub fn set_cursor_blinking(&mut self, blinking: bool) {
        if self.cursor.blinking != blinking {
            self.cursor.blinking = blinking;
            self.mark_cursor_dirty();
        }
    }

    /// Open a batch scope. Re-entrant calls while a batch is open are
    /// ignored; the open batch keeps accumulating.
    pub fn begin_batch(&mut self) {
        if self.batch.is_none() {
            self.batch = Some(RegionVec::new());
        }
    }

    /// Close the batch scope and merge the accumulated regions into the
    /// main dirty set in one coalescing pass. No-op without an open batch.
    pub fn end_batch(&mut self) {
        if let Some(batched) = self.batch.take() {
            if !batched.is_empty() {
                trace!(regions = batched.len(), "flushing batch");
                self.optimize_and_add(batched);
            }
        }
    }

    /// Return the accumulated dirty regions and atomically clear them.
    ///
    /// Read-and-reset: a region reported once will not be reported again
    /// unless re-dirtied.
    pub fn flush(&mut self) -> Vec<Region> {
        std::mem::take(&mut self.dirty).into_vec()
    }

    /// Alias for [`flush`](Self::flush); same read-and-reset semantics.
    pub fn dirty_regions(&mut self) -> Vec<Region> {
        self.flush()
    }

    /// Snapshot the buffer for rendering.
    ///
    /// Cursor blink is sampled here, lazily, against wall-clock time: if
    /// the 500 ms blink phase changed since the last snapshot, the cursor
    /// cell is marked dirty so the next flush repaints it. No timer is
    /// involved.
    pub fn snapshot(&mut self) -> BufferSnapshot<'_> {
        let now_ms = self.epoch.elapsed().as_millis() as u64;

        if self.cursor.visible && self.cursor.blinking {
            let phase_changed = self.last_blink_ms.map_or(true, |last| {
                last / BLINK_HALF_PERIOD_MS != now_ms / BLINK_HALF_PERIOD_MS
            });
            if phase_changed {
                self.mark_cursor_dirty();
                self.last_blink_ms = Some(now_ms);
            }
        }

        BufferSnapshot {
            width: self.width,
            height: self.height,
            cursor: self.cursor,
            blink_on: (now_ms / BLINK_HALF_PERIOD_MS) % 2 == 0,
            cells: &self.cells,
        }
    }

    fn mark_cursor_dirty(&mut self) {
        self.mark_dirty(Region::cell(
            i32::from(self.cursor.x),
            i32::from(self.cursor.y),
        ));
    }

    fn mark_dirty(&mut self, region: Region) {
        if let Some(batch) = &mut self.batch {
            batch.push(region);
        } else {
            self.optimize_and_add([region]);
        }
    }

    fn optimize_and_add(&mut self, new_regions: impl IntoIterator<Item = Region>) {
        let current = std::mem::take(&mut self.dirty);
        self.dirty = coalesce(current.into_iter().chain(new_regions));
    }
}
