//! Video buffer core: cells, dirty regions, and the batched write API.
//!
//! This is the leaf of the rendering stack. External callers write
//! characters into the [`VideoBuffer`] (optionally inside a batch scope),
//! the buffer accumulates and coalesces dirty rectangles, and consumers
//! drain them with the read-and-reset [`VideoBuffer::flush`].

mod buffer;
mod cell;
mod region;

pub use buffer::{BufferSnapshot, Cursor, VideoBuffer};
pub use cell::{Cell, CellAttributes, CellFlags, DosColor};
pub use region::{coalesce, Region, RegionVec};

pub(crate) use region::coalesce_touching;
