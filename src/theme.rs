//! FoxPro-flavored theme tables: colors per UI role, border character sets,
//! and window control glyphs.

use crate::video::{CellAttributes, DosColor};

/// Foreground/background pair for one UI role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    /// Text color.
    pub foreground: DosColor,
    /// Fill color.
    pub background: DosColor,
}

impl ColorPair {
    /// Construct a pair.
    pub const fn new(foreground: DosColor, background: DosColor) -> Self {
        Self {
            foreground,
            background,
        }
    }

    /// Convert to buffer cell attributes.
    pub fn attributes(self) -> CellAttributes {
        CellAttributes::new(self.foreground, self.background)
    }
}

/// Active/inactive variants of a color pair.
#[derive(Debug, Clone, Copy)]
pub struct ActiveInactive {
    /// Colors when the element has focus.
    pub active: ColorPair,
    /// Colors when it does not.
    pub inactive: ColorPair,
}

impl ActiveInactive {
    /// Pick the variant for the given focus state.
    pub fn pick(&self, active: bool) -> ColorPair {
        if active {
            self.active
        } else {
            self.inactive
        }
    }
}

/// System chrome colors.
#[derive(Debug, Clone, Copy)]
pub struct SystemTheme {
    /// Desktop background.
    pub background: ColorPair,
    /// Menu bar.
    pub menu_bar: ActiveInactive,
}

/// Window colors.
#[derive(Debug, Clone, Copy)]
pub struct WindowTheme {
    /// Border, by focus.
    pub border: ActiveInactive,
    /// Body fill, by focus.
    pub background: ActiveInactive,
    /// Drop shadow.
    pub shadow: ColorPair,
    /// Scrollbar track.
    pub scrollbar: ColorPair,
}

/// Dialog colors.
#[derive(Debug, Clone, Copy)]
pub struct DialogTheme {
    /// Border.
    pub border: ColorPair,
    /// Body fill.
    pub background: ColorPair,
    /// Buttons, by selection.
    pub button: ActiveInactive,
}

/// Full theme for the window manager.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// System chrome.
    pub system: SystemTheme,
    /// Windows.
    pub window: WindowTheme,
    /// Dialogs.
    pub dialog: DialogTheme,
    /// Bare screen fill.
    pub screen: ColorPair,
}

impl Default for Theme {
    /// The classic FoxPro look: white on blue desktop, gray chrome, teal
    /// window bodies, magenta dialogs.
    fn default() -> Self {
        Self {
            system: SystemTheme {
                background: ColorPair::new(DosColor::White, DosColor::Blue),
                menu_bar: ActiveInactive {
                    active: ColorPair::new(DosColor::Black, DosColor::LightGray),
                    inactive: ColorPair::new(DosColor::Black, DosColor::LightGray),
                },
            },
            window: WindowTheme {
                border: ActiveInactive {
                    active: ColorPair::new(DosColor::Yellow, DosColor::LightGray),
                    inactive: ColorPair::new(DosColor::DarkGray, DosColor::LightGray),
                },
                background: ActiveInactive {
                    active: ColorPair::new(DosColor::White, DosColor::Cyan),
                    inactive: ColorPair::new(DosColor::DarkGray, DosColor::Cyan),
                },
                shadow: ColorPair::new(DosColor::DarkGray, DosColor::Black),
                scrollbar: ColorPair::new(DosColor::White, DosColor::Blue),
            },
            dialog: DialogTheme {
                border: ColorPair::new(DosColor::White, DosColor::Magenta),
                background: ColorPair::new(DosColor::White, DosColor::Magenta),
                button: ActiveInactive {
                    active: ColorPair::new(DosColor::Yellow, DosColor::Magenta),
                    inactive: ColorPair::new(DosColor::White, DosColor::Magenta),
                },
            },
            screen: ColorPair::new(DosColor::White, DosColor::Blue),
        }
    }
}

/// Border character set for a window frame.
#[derive(Debug, Clone, Copy)]
pub struct BorderChars {
    /// Top-left corner.
    pub top_left: char,
    /// Top-right corner.
    pub top_right: char,
    /// Bottom-left corner.
    pub bottom_left: char,
    /// Bottom-right corner.
    pub bottom_right: char,
    /// Horizontal edge.
    pub horizontal: char,
    /// Vertical edge.
    pub vertical: char,
}

/// Window frames are drawn as colored spaces, FoxPro style.
pub const WINDOW_BORDER: BorderChars = BorderChars {
    top_left: ' ',
    top_right: ' ',
    bottom_left: ' ',
    bottom_right: ' ',
    horizontal: ' ',
    vertical: ' ',
};

/// Dialogs get a double-line frame.
pub const DIALOG_BORDER: BorderChars = BorderChars {
    top_left: '╔',
    top_right: '╗',
    bottom_left: '╚',
    bottom_right: '╝',
    horizontal: '═',
    vertical: '║',
};

/// Window control glyphs.
pub mod controls {
    /// Close button.
    pub const CLOSE: char = '■';
    /// Maximize button.
    pub const MAXIMIZE: char = '≡';
    /// Resize handle.
    pub const RESIZE: char = '.';
    /// Scroll-up indicator.
    pub const SCROLL_UP: char = '▲';
    /// Scroll-down indicator.
    pub const SCROLL_DOWN: char = '▼';
    /// Scroll-left indicator.
    pub const SCROLL_LEFT: char = '◄';
    /// Scroll-right indicator.
    pub const SCROLL_RIGHT: char = '►';
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_respects_focus() {
        let theme = Theme::default();
        assert_eq!(
            theme.window.border.pick(true),
            ColorPair::new(DosColor::Yellow, DosColor::LightGray)
        );
        assert_eq!(
            theme.window.border.pick(false),
            ColorPair::new(DosColor::DarkGray, DosColor::LightGray)
        );
    }

    #[test]
    fn color_pair_to_attributes() {
        let attrs = ColorPair::new(DosColor::White, DosColor::Blue).attributes();
        assert_eq!(attrs.foreground, DosColor::White);
        assert_eq!(attrs.background, DosColor::Blue);
    }
}
