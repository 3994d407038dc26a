//! Terminal presentation of flushed buffer damage.
//!
//! The presenter drains the buffer's dirty regions and repaints exactly
//! those rectangles with batched escape sequences: one `queue!` stream per
//! frame, style changes emitted only when a cell's colors differ from the
//! previous cell, one `flush` at the end. The first frame always paints the
//! whole screen; after that, a frame with no damage writes nothing.

use std::cell::Cell as StdCell;
use std::io::{self, Write};
use std::rc::Rc;

use crossterm::{cursor, queue, style, terminal};
use thiserror::Error;
use tracing::debug;

use crate::video::{Cell, CellAttributes, CellFlags, DosColor, Region, VideoBuffer};

/// Why a present call did not complete.
#[derive(Debug, Error)]
pub enum PresentError {
    /// The terminal writer failed.
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
    /// The frame was cancelled before completion.
    #[error("present cancelled")]
    Cancelled,
}

/// Shared cancellation flag for in-flight frames. Clones observe the same
/// flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<StdCell<bool>>);

impl CancelToken {
    /// Fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the current and all future frames until
    /// [`reset`](Self::reset).
    pub fn cancel(&self) {
        self.0.set(true);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.0.set(false);
    }
}

/// Paints flushed buffer damage to a terminal writer.
pub struct Presenter<W: Write> {
    writer: W,
    cancel: CancelToken,
    presented_once: bool,
    /// What never-written cells paint as (the bare screen fill).
    blank: Cell,
}

impl<W: Write> Presenter<W> {
    /// Wrap a writer. The first [`present`](Self::present) paints the full
    /// screen.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            cancel: CancelToken::new(),
            presented_once: false,
            blank: Cell::blank(),
        }
    }

    /// Set the colors never-written cells paint with, usually
    /// [`Theme::screen`](crate::theme::Theme). Takes effect from the next
    /// frame; call [`invalidate`](Self::invalidate) to repaint existing
    /// blanks.
    pub fn set_screen_colors(&mut self, attrs: CellAttributes) {
        self.blank = Cell::new(' ', attrs);
    }

    /// A handle that cancels in-flight and future frames.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Force the next frame to repaint the whole screen.
    pub fn invalidate(&mut self) {
        self.presented_once = false;
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Flush the buffer's damage and repaint it.
    ///
    /// Samples the cursor blink phase (which may add damage), drains the
    /// dirty list, and repaints each damaged rectangle row by row. Damage
    /// outside the buffer bounds is clipped away. Returns without writing
    /// when there is nothing to paint.
    pub fn present(&mut self, buffer: &mut VideoBuffer) -> Result<(), PresentError> {
        if self.cancel.is_cancelled() {
            return Err(PresentError::Cancelled);
        }

        // Sampling the blink phase may push a cursor-cell region.
        buffer.snapshot();
        let damage = buffer.flush();

        let width = buffer.width();
        let height = buffer.height();

        let regions: Vec<Region> = if self.presented_once {
            damage
                .iter()
                .filter_map(|r| r.clipped(width, height))
                .collect()
        } else {
            vec![Region::new(0, 0, u32::from(width), u32::from(height))]
        };

        if regions.is_empty() {
            return Ok(());
        }

        debug!(regions = regions.len(), "presenting frame");

        let first_frame = !self.presented_once;
        let view = buffer.snapshot();

        if first_frame {
            queue!(
                self.writer,
                terminal::Clear(terminal::ClearType::All),
                cursor::MoveTo(0, 0)
            )?;
        }

        let mut current_fg: Option<style::Color> = None;
        let mut current_bg: Option<style::Color> = None;

        for region in &regions {
            if self.cancel.is_cancelled() {
                return Err(PresentError::Cancelled);
            }

            for y in region.y..region.bottom() {
                let row = y as u16;
                queue!(self.writer, cursor::MoveTo(region.x as u16, row))?;

                for x in region.x..region.right() {
                    let cell = view.cell(x as u16, row).copied().unwrap_or(self.blank);
                    let (ch, fg, bg) = appearance(&cell, view.blink_on);

                    if current_fg != Some(fg) {
                        queue!(self.writer, style::SetForegroundColor(fg))?;
                        current_fg = Some(fg);
                    }
                    if current_bg != Some(bg) {
                        queue!(self.writer, style::SetBackgroundColor(bg))?;
                        current_bg = Some(bg);
                    }
                    queue!(self.writer, style::Print(ch))?;
                }
            }
        }

        let cur = view.cursor;
        if cur.visible {
            queue!(self.writer, cursor::MoveTo(cur.x, cur.y), cursor::Show)?;
        } else {
            queue!(self.writer, cursor::Hide)?;
        }

        queue!(self.writer, style::ResetColor)?;
        self.writer.flush()?;
        self.presented_once = true;
        Ok(())
    }
}

/// Resolve what a cell looks like right now: blinking cells show a blank
/// in the off half-phase.
fn appearance(cell: &Cell, blink_on: bool) -> (char, style::Color, style::Color) {
    let hidden = cell.attributes.flags.contains(CellFlags::BLINK) && !blink_on;
    let ch = if hidden { ' ' } else { cell.ch };
    (
        ch,
        to_color(cell.attributes.foreground),
        to_color(cell.attributes.background),
    )
}

fn to_color(color: DosColor) -> style::Color {
    let (r, g, b) = color.rgb();
    style::Color::Rgb { r, g, b }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::video::CellAttributes;

    fn attrs() -> CellAttributes {
        CellAttributes::new(DosColor::White, DosColor::Blue)
    }

    #[test]
    fn first_frame_paints_everything() {
        let mut buffer = VideoBuffer::new(4, 2);
        buffer.write_str(0, 0, "ok", attrs());

        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&mut buffer).unwrap();

        let out = String::from_utf8(presenter.into_inner()).unwrap();
        // Full clear then content.
        assert!(out.contains("\x1b[2J"));
        assert!(out.contains('o') && out.contains('k'));
    }

    #[test]
    fn clean_frame_writes_nothing() {
        let mut buffer = VideoBuffer::new(4, 2);
        buffer.write_str(0, 0, "ok", attrs());

        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&mut buffer).unwrap();
        presenter.present(&mut buffer).unwrap();

        // Second frame had no damage left to paint.
        let out = presenter.into_inner();
        let first_frame_len = {
            let mut fresh = VideoBuffer::new(4, 2);
            fresh.write_str(0, 0, "ok", attrs());
            let mut p = Presenter::new(Vec::new());
            p.present(&mut fresh).unwrap();
            p.into_inner().len()
        };
        assert_eq!(out.len(), first_frame_len);
    }

    #[test]
    fn incremental_frame_paints_only_damage() {
        let mut buffer = VideoBuffer::new(80, 25);
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&mut buffer).unwrap();

        let before = {
            let mut fresh = VideoBuffer::new(80, 25);
            let mut p = Presenter::new(Vec::new());
            p.present(&mut fresh).unwrap();
            p.into_inner().len()
        };

        buffer.write_char(10, 10, "X", attrs());
        presenter.present(&mut buffer).unwrap();

        let out = presenter.into_inner();
        let incremental = &out[before..];
        let text = String::from_utf8_lossy(incremental);
        assert!(text.contains('X'));
        // One damaged cell: far less output than a full frame.
        assert!(incremental.len() < before / 4);
    }

    #[test]
    fn screen_colors_fill_unwritten_cells() {
        let mut buffer = VideoBuffer::new(4, 2);

        let mut presenter = Presenter::new(Vec::new());
        presenter.set_screen_colors(crate::theme::Theme::default().screen.attributes());
        presenter.present(&mut buffer).unwrap();

        // The bare screen paints in the theme's fill (VGA blue background),
        // not the default black.
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(out.contains("48;2;0;0;170"));
    }

    #[test]
    fn cancelled_frames_fail_with_cancelled() {
        let mut buffer = VideoBuffer::new(4, 2);
        let mut presenter = Presenter::new(Vec::new());
        presenter.cancel_token().cancel();

        let err = presenter.present(&mut buffer).unwrap_err();
        assert!(matches!(err, PresentError::Cancelled));

        presenter.cancel_token().reset();
        presenter.present(&mut buffer).unwrap();
    }

    #[test]
    fn offscreen_damage_is_clipped() {
        let mut buffer = VideoBuffer::new(4, 2);
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&mut buffer).unwrap();

        // Writes outside the buffer are silently dropped and produce no
        // damage, so the next frame is clean.
        buffer.write_char(100, 100, "X", attrs());
        let len_before = {
            let mut fresh = VideoBuffer::new(4, 2);
            let mut p = Presenter::new(Vec::new());
            p.present(&mut fresh).unwrap();
            p.into_inner().len()
        };
        presenter.present(&mut buffer).unwrap();
        assert_eq!(presenter.into_inner().len(), len_before);
    }

    #[test]
    fn hidden_cursor_is_hidden_in_output() {
        let mut buffer = VideoBuffer::new(4, 2);
        buffer.set_cursor_visible(false);
        let mut presenter = Presenter::new(Vec::new());
        presenter.present(&mut buffer).unwrap();

        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(out.contains("\x1b[?25l"));
    }
}
