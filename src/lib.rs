//! Retro character-cell UI core with damage-driven rendering.
//!
//! Everything revolves around dirty-region tracking: writes mark damage,
//! damage coalesces into a small rectangle list, and consumers repaint
//! only what changed.
//!
//! ```text
//! writes -> VideoBuffer -> dirty regions -> Presenter -> terminal
//!              ^                               |
//!              |                               v
//!        WindowManager <- LayerManager <- QuadTree (per layer)
//!              |
//!        WindowCache (rendered content, keyed by state hash)
//! ```
//!
//! - [`video::VideoBuffer`] owns the cell grid and the cursor, and tracks
//!   coalesced dirty rectangles with read-and-reset flush semantics.
//! - [`spatial::QuadTree`] indexes structural damage per layer.
//! - [`layer::LayerManager`] holds the fixed z-ordered layer set
//!   (background, shadow, window, cursor) and propagates damage between
//!   them.
//! - [`window::WindowManager`] owns the window stack, draws frames and
//!   dialogs into the buffer, and serves unchanged windows from the
//!   [`window::WindowCache`].
//! - [`present::Presenter`] paints flushed damage to a terminal writer
//!   with batched escape sequences.
//!
//! Dirty regions are hints, never authority: they may over-approximate
//! actual change, and correctness only requires that every changed cell is
//! covered by some reported region.
//!
//! ```
//! use retrocell::video::{CellAttributes, DosColor, Region, VideoBuffer};
//!
//! let mut buffer = VideoBuffer::new(80, 25);
//! let attrs = CellAttributes::new(DosColor::White, DosColor::Blue);
//!
//! buffer.begin_batch();
//! buffer.write_char(0, 0, "H", attrs);
//! buffer.write_char(1, 0, "I", attrs);
//! buffer.end_batch();
//!
//! assert_eq!(buffer.flush(), vec![Region::new(0, 0, 2, 1)]);
//! assert!(buffer.flush().is_empty());
//! ```

pub mod events;
pub mod layer;
pub mod present;
pub mod spatial;
pub mod theme;
pub mod video;
pub mod window;

pub use events::{EventDispatcher, EventFilter, EventKind, EventPriority, UiEvent};
pub use layer::{LayerManager, BACKGROUND_LAYER, CURSOR_LAYER, SHADOW_LAYER, WINDOW_LAYER};
pub use present::{CancelToken, PresentError, Presenter};
pub use spatial::QuadTree;
pub use theme::Theme;
pub use video::{Cell, CellAttributes, CellFlags, DosColor, Region, VideoBuffer};
pub use window::{Position, Size, Window, WindowKind, WindowManager, WindowOptions};
