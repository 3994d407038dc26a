//! Window state and the window manager.
//!
//! The window manager composes the video buffer, the layer manager, and the
//! window cache. Ownership flows one direction only: the manager holds the
//! cache and is handed the layer manager and buffer by the caller; neither
//! the layers nor the cache know anything about windows above them, so
//! close/resize cascades never form an ownership cycle.

mod cache;

pub use cache::{CellGrid, WindowCache};

use std::time::Duration;

use tracing::debug;

use crate::layer::{LayerManager, SHADOW_OFFSET};
use crate::theme::{controls, BorderChars, Theme, DIALOG_BORDER, WINDOW_BORDER};
use crate::video::{Cell, CellAttributes, Region, VideoBuffer};

/// Cache entries untouched for this long are evicted during draw.
const CACHE_MAX_AGE: Duration = Duration::from_secs(5);

/// Grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

/// Grid extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in cells.
    pub width: u32,
    /// Height in cells.
    pub height: u32,
}

/// Role of a system window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemRole {
    /// The desktop backdrop.
    Background,
    /// The menu bar.
    MenuBar,
}

/// Discriminated window variant. Every consumption site matches
/// exhaustively; there is no sentinel "untyped" state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowKind {
    /// Ordinary application window.
    Plain,
    /// System chrome; never activated, never closed.
    System {
        /// What the window is chrome for.
        role: SystemRole,
    },
    /// Modal dialog with a button row.
    Dialog {
        /// Button labels, left to right.
        buttons: Vec<String>,
        /// Index of the selected button.
        selected: usize,
    },
}

impl WindowKind {
    fn is_system(&self) -> bool {
        matches!(self, WindowKind::System { .. })
    }
}

/// Full state of one window.
#[derive(Debug, Clone)]
pub struct Window {
    /// Unique id.
    pub id: String,
    /// Title text, centered in the top border.
    pub title: String,
    /// Top-left corner.
    pub position: Position,
    /// Extent.
    pub size: Size,
    /// Focus state.
    pub active: bool,
    /// Maximized state.
    pub maximized: bool,
    /// Minimized state (collapsed to the title bar).
    pub minimized: bool,
    /// Content scroll offset.
    pub scroll: Position,
    /// Skip the frame entirely.
    pub borderless: bool,
    /// Skip the drop shadow.
    pub shadowless: bool,
    /// Geometry to restore after un-maximize / un-minimize.
    pub original_size: Option<Size>,
    /// Variant.
    pub kind: WindowKind,
}

impl Window {
    /// The screen rectangle this window occupies.
    pub fn region(&self) -> Region {
        Region::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }
}

/// Options for [`WindowManager::create_window`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowOptions {
    /// Create without a frame.
    pub borderless: bool,
    /// Create without a drop shadow.
    pub shadowless: bool,
}

/// Owner of the window stack. Composes the layer manager (structural
/// damage), the window cache (rendered content), and the video buffer
/// (cells).
pub struct WindowManager {
    windows: Vec<Window>,
    active: Option<String>,
    cache: WindowCache,
    theme: Theme,
    next_id: u64,
}

impl WindowManager {
    /// Create an empty manager with the given theme.
    pub fn new(theme: Theme) -> Self {
        Self {
            windows: Vec::new(),
            active: None,
            cache: WindowCache::new(),
            theme,
            next_id: 0,
        }
    }

    /// All windows, bottom to top.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Look up a window by id.
    pub fn window(&self, id: &str) -> Option<&Window> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// The active window, if any.
    pub fn active_window(&self) -> Option<&Window> {
        self.active.as_deref().and_then(|id| self.window(id))
    }

    /// The content cache. Exposed for consumers that track overlap-driven
    /// invalidation themselves.
    pub fn cache(&self) -> &WindowCache {
        &self.cache
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    /// Create an ordinary window and activate it.
    pub fn create_window(
        &mut self,
        title: &str,
        position: Position,
        size: Size,
        options: WindowOptions,
    ) -> String {
        let id = self.fresh_id("window");
        self.windows.push(Window {
            id: id.clone(),
            title: title.to_owned(),
            position,
            size,
            active: false,
            maximized: false,
            minimized: false,
            scroll: Position { x: 0, y: 0 },
            borderless: options.borderless,
            shadowless: options.shadowless,
            original_size: None,
            kind: WindowKind::Plain,
        });
        self.set_active_window(&id, true);
        debug!(window = %id, "window created");
        id
    }

    /// Create a dialog and activate it.
    pub fn create_dialog(
        &mut self,
        title: &str,
        position: Position,
        size: Size,
        buttons: Vec<String>,
    ) -> String {
        let id = self.fresh_id("dialog");
        self.windows.push(Window {
            id: id.clone(),
            title: title.to_owned(),
            position,
            size,
            active: false,
            maximized: false,
            minimized: false,
            scroll: Position { x: 0, y: 0 },
            borderless: false,
            shadowless: false,
            original_size: None,
            kind: WindowKind::Dialog {
                buttons,
                selected: 0,
            },
        });
        self.set_active_window(&id, true);
        id
    }

    /// Register a system window (backdrop or menu bar). System windows are
    /// pushed as given and never participate in activation.
    pub fn create_system_window(&mut self, window: Window) -> String {
        let id = window.id.clone();
        self.windows.push(window);
        id
    }

    /// Activate a window, optionally raising it to the top of the stack.
    /// System windows never activate.
    pub fn set_active_window(&mut self, id: &str, move_to_front: bool) {
        let Some(idx) = self.windows.iter().position(|w| w.id == id) else {
            return;
        };
        if self.windows[idx].kind.is_system() {
            return;
        }

        if let Some(current) = self.active.as_deref() {
            if let Some(w) = self.windows.iter_mut().find(|w| w.id == current) {
                w.active = false;
            }
        }

        let idx = if move_to_front {
            let window = self.windows.remove(idx);
            self.windows.push(window);
            self.windows.len() - 1
        } else {
            idx
        };

        self.windows[idx].active = true;
        self.active = Some(id.to_owned());
    }

    /// Close a window and cascade the damage: the closed region (and its
    /// shadow) dirties the layers, the cache entry is evicted, the next
    /// non-system window is activated, and every window intersecting the
    /// closed region is re-dirtied and un-cached so it repaints on the
    /// next draw. System windows cannot be closed.
    pub fn close_window(&mut self, id: &str, layers: &mut LayerManager) {
        let Some(idx) = self.windows.iter().position(|w| w.id == id) else {
            return;
        };
        if self.windows[idx].kind.is_system() {
            return;
        }

        let closed = self.windows.remove(idx);
        let region = closed.region();
        debug!(window = %id, ?region, "window closed");

        layers.mark_window_and_shadow_dirty(region);
        self.cache.remove(id);

        if self.active.as_deref() == Some(id) {
            let next = self
                .windows
                .iter()
                .rev()
                .find(|w| !w.kind.is_system())
                .map(|w| w.id.clone());
            self.active = next.clone();

            if let Some(next_id) = next {
                if let Some(w) = self.windows.iter_mut().find(|w| w.id == next_id) {
                    w.active = true;
                    let active_region = w.region();
                    layers.mark_window_and_shadow_dirty(active_region);
                }
                self.cache.remove(&next_id);
            }
        }

        // Windows that were underneath must repaint.
        let uncovered: Vec<(String, Region)> = self
            .windows
            .iter()
            .filter(|w| w.region().overlaps(&region))
            .map(|w| (w.id.clone(), w.region()))
            .collect();
        for (other_id, other_region) in uncovered {
            layers.mark_window_and_shadow_dirty(other_region);
            self.cache.remove(&other_id);
        }
    }

    /// Move a window: dirties the old and new regions (plus shadows) and
    /// evicts the cache entry so the window repaints at its new position.
    pub fn update_window_position(
        &mut self,
        id: &str,
        position: Position,
        layers: &mut LayerManager,
    ) {
        let Some(idx) = self.windows.iter().position(|w| w.id == id) else {
            return;
        };

        let old_region = self.windows[idx].region();
        layers.mark_window_and_shadow_dirty(old_region);

        self.windows[idx].position = position;

        let new_region = self.windows[idx].region();
        layers.mark_window_and_shadow_dirty(new_region);
        self.cache.remove(id);
    }

    /// Resize a window: dirties the old and new regions (plus shadows) and
    /// evicts the cache entry.
    pub fn update_window_size(&mut self, id: &str, size: Size, layers: &mut LayerManager) {
        let Some(idx) = self.windows.iter().position(|w| w.id == id) else {
            return;
        };

        let old_region = self.windows[idx].region();
        layers.mark_window_and_shadow_dirty(old_region);

        self.windows[idx].size = size;

        let new_region = self.windows[idx].region();
        layers.mark_window_and_shadow_dirty(new_region);
        self.cache.remove(id);
    }

    /// Collapse a plain window to its title bar, or restore it. Dialogs
    /// and system windows are not minimizable.
    pub fn toggle_minimize(&mut self, id: &str, layers: &mut LayerManager) {
        let Some(idx) = self.windows.iter().position(|w| w.id == id) else {
            return;
        };
        if self.windows[idx].kind != WindowKind::Plain {
            return;
        }

        let current_region = self.windows[idx].region();
        layers.mark_window_and_shadow_dirty(current_region);

        let window = &mut self.windows[idx];
        if window.minimized {
            if let Some(original) = window.original_size.take() {
                window.size = original;
            }
        } else {
            window.original_size = Some(window.size);
            window.size = Size {
                width: window.size.width,
                height: 1,
            };
        }
        window.minimized = !window.minimized;
        self.cache.remove(id);
    }

    /// Maximize a plain window to fill the screen below the menu bar, or
    /// restore and re-center it.
    pub fn toggle_maximize(&mut self, id: &str, screen: Size, layers: &mut LayerManager) {
        let Some(idx) = self.windows.iter().position(|w| w.id == id) else {
            return;
        };
        if self.windows[idx].kind != WindowKind::Plain {
            return;
        }

        let current_region = self.windows[idx].region();
        layers.mark_window_and_shadow_dirty(current_region);

        let window = &mut self.windows[idx];
        window.maximized = !window.maximized;

        if window.maximized {
            window.original_size = Some(window.size);
            window.position = Position { x: 0, y: 1 }; // below the menu bar
            window.size = Size {
                width: screen.width,
                height: screen.height.saturating_sub(1),
            };
            let full = self.windows[idx].region();
            layers.mark_window_and_shadow_dirty(full);
        } else if let Some(original) = window.original_size.take() {
            window.size = original;
            window.position = Position {
                x: (screen.width.saturating_sub(original.width) / 2) as i32,
                y: (screen.height.saturating_sub(original.height) / 2) as i32,
            };
        }
        self.cache.remove(id);
    }

    /// Draw all windows bottom to top into the buffer, restoring from the
    /// cache where the state hash still matches. Runs inside one buffer
    /// batch scope so a whole frame of writes coalesces in one pass, then
    /// evicts cache entries for closed windows and entries past their
    /// max age.
    pub fn draw(&mut self, buffer: &mut VideoBuffer) {
        for cached_id in self.cache.cached_ids() {
            if self.window(&cached_id).is_none() {
                self.cache.remove(&cached_id);
            }
        }

        buffer.begin_batch();
        let stack = self.windows.clone();
        for window in &stack {
            self.draw_window(window, buffer);
        }
        buffer.end_batch();

        self.cache.cleanup(CACHE_MAX_AGE);
    }

    fn draw_window(&mut self, window: &Window, buffer: &mut VideoBuffer) {
        let region = window.region();

        if !window.maximized && !window.minimized && !window.shadowless && !window.kind.is_system()
        {
            self.draw_shadow(&region, buffer);
        }

        if !self.cache.needs_redraw(window) {
            if let Some(content) = self.cache.content(&window.id) {
                for (dy, row) in content.iter().enumerate() {
                    for (dx, cell) in row.iter().enumerate() {
                        if let Some(cell) = cell {
                            let mut text = [0u8; 4];
                            buffer.write_char(
                                window.position.x + dx as i32,
                                window.position.y + dy as i32,
                                cell.ch.encode_utf8(&mut text),
                                cell.attributes,
                            );
                        }
                    }
                }
                return;
            }
        }

        let width = window.size.width as usize;
        let height = window.size.height as usize;
        let mut content: CellGrid = vec![vec![None; width]; height];

        let mut put = |content: &mut CellGrid,
                       buffer: &mut VideoBuffer,
                       x: i32,
                       y: i32,
                       ch: char,
                       attrs: CellAttributes| {
            if x >= 0 && (x as usize) < width && y >= 0 && (y as usize) < height {
                content[y as usize][x as usize] = Some(Cell::new(ch, attrs));
                let mut text = [0u8; 4];
                buffer.write_char(
                    window.position.x + x,
                    window.position.y + y,
                    ch.encode_utf8(&mut text),
                    attrs,
                );
            }
        };

        let body = self.body_colors(window);

        if !window.borderless {
            let border: BorderChars = match window.kind {
                WindowKind::Dialog { .. } => DIALOG_BORDER,
                _ => WINDOW_BORDER,
            };
            let frame = self.frame_colors(window);
            let w = width as i32;
            let h = height as i32;

            for x in 0..w {
                put(&mut content, buffer, x, 0, border.horizontal, frame);
                put(&mut content, buffer, x, h - 1, border.horizontal, frame);
            }
            for y in 1..h - 1 {
                put(&mut content, buffer, 0, y, border.vertical, frame);
                put(&mut content, buffer, w - 1, y, border.vertical, frame);
            }
            put(&mut content, buffer, 0, 0, border.top_left, frame);
            put(&mut content, buffer, w - 1, 0, border.top_right, frame);
            put(&mut content, buffer, 0, h - 1, border.bottom_left, frame);
            put(&mut content, buffer, w - 1, h - 1, border.bottom_right, frame);

            if !window.title.is_empty() {
                let title_len = window.title.chars().count() as i32;
                let start = (w - title_len) / 2;
                for (i, ch) in window.title.chars().enumerate() {
                    put(&mut content, buffer, start + i as i32, 0, ch, frame);
                }
            }

            if window.active && window.kind == WindowKind::Plain {
                put(&mut content, buffer, 0, 0, controls::CLOSE, frame);
                put(&mut content, buffer, w - 1, 0, controls::MAXIMIZE, frame);
                if !window.minimized {
                    put(&mut content, buffer, w - 1, h - 1, controls::RESIZE, frame);

                    // Scroll tracks live on the right and bottom borders.
                    let track = self.theme.window.scrollbar.attributes();
                    if h > 4 {
                        put(&mut content, buffer, w - 1, 1, controls::SCROLL_UP, track);
                        for y in 2..h - 2 {
                            put(&mut content, buffer, w - 1, y, '▒', track);
                        }
                        put(&mut content, buffer, w - 1, h - 2, controls::SCROLL_DOWN, track);
                    }
                    if w > 4 {
                        put(&mut content, buffer, 1, h - 1, controls::SCROLL_LEFT, track);
                        for x in 2..w - 2 {
                            put(&mut content, buffer, x, h - 1, '▒', track);
                        }
                        put(&mut content, buffer, w - 2, h - 1, controls::SCROLL_RIGHT, track);
                    }
                }
            }
        }

        if !window.minimized {
            let (x0, x1, y0, y1) = if window.borderless {
                (0, width as i32, 0, height as i32)
            } else {
                (1, width as i32 - 1, 1, height as i32 - 1)
            };
            for y in y0..y1 {
                for x in x0..x1 {
                    put(&mut content, buffer, x, y, ' ', body);
                }
            }
        }

        if let WindowKind::Dialog { buttons, selected } = &window.kind {
            if !buttons.is_empty() {
                let button_y = height as i32 - 2;
                let joined: i32 = buttons.iter().map(|b| b.chars().count() as i32 + 2).sum::<i32>() - 2;
                let mut button_x = (width as i32 - joined) / 2;

                for (index, label) in buttons.iter().enumerate() {
                    let colors = self.theme.dialog.button.pick(index == *selected).attributes();
                    for (i, ch) in label.chars().enumerate() {
                        put(&mut content, buffer, button_x + i as i32, button_y, ch, colors);
                    }
                    button_x += label.chars().count() as i32 + 2;
                }
            }
        }

        self.cache.update(window, content, region);
    }

    /// Apply the shadow effect: re-color whatever characters already sit
    /// under the shadow rectangle. Empty cells stay empty.
    fn draw_shadow(&self, window_region: &Region, buffer: &mut VideoBuffer) {
        let shadow = Region::new(
            window_region.x + SHADOW_OFFSET.0,
            window_region.y + SHADOW_OFFSET.1,
            window_region.width,
            window_region.height,
        );
        let attrs = self.theme.window.shadow.attributes();

        for y in shadow.y..shadow.bottom() {
            for x in shadow.x..shadow.right() {
                if let Some(ch) = buffer.get_char(x, y).map(|c| c.ch) {
                    let mut text = [0u8; 4];
                    buffer.write_char(x, y, ch.encode_utf8(&mut text), attrs);
                }
            }
        }
    }

    fn frame_colors(&self, window: &Window) -> CellAttributes {
        match &window.kind {
            WindowKind::Dialog { .. } => self.theme.dialog.border.attributes(),
            WindowKind::System { .. } | WindowKind::Plain => {
                self.theme.window.border.pick(window.active).attributes()
            }
        }
    }

    fn body_colors(&self, window: &Window) -> CellAttributes {
        match &window.kind {
            WindowKind::System { role } => match role {
                SystemRole::Background => self.theme.system.background.attributes(),
                SystemRole::MenuBar => self.theme.system.menu_bar.inactive.attributes(),
            },
            WindowKind::Dialog { .. } => self.theme.dialog.background.attributes(),
            WindowKind::Plain => self
                .theme
                .window
                .background
                .pick(window.active)
                .attributes(),
        }
    }
}
