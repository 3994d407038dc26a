//! Character cell representation: one glyph plus DOS color attributes.

/// The 16-color DOS palette, in VGA order.
///
/// Attribute bytes in the buffer index into this palette; [`DosColor::rgb`]
/// gives the canonical VGA RGB values for presenters that need pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DosColor {
    /// Color 0.
    #[default]
    Black = 0,
    /// Color 1.
    Blue = 1,
    /// Color 2.
    Green = 2,
    /// Color 3.
    Cyan = 3,
    /// Color 4.
    Red = 4,
    /// Color 5.
    Magenta = 5,
    /// Color 6.
    Brown = 6,
    /// Color 7.
    LightGray = 7,
    /// Color 8.
    DarkGray = 8,
    /// Color 9.
    LightBlue = 9,
    /// Color 10.
    LightGreen = 10,
    /// Color 11.
    LightCyan = 11,
    /// Color 12.
    LightRed = 12,
    /// Color 13.
    LightMagenta = 13,
    /// Color 14.
    Yellow = 14,
    /// Color 15.
    White = 15,
}

impl DosColor {
    /// Map a palette index to a color. Only the low 4 bits are used.
    pub fn from_index(index: u8) -> Self {
        match index & 0x0F {
            0 => Self::Black,
            1 => Self::Blue,
            2 => Self::Green,
            3 => Self::Cyan,
            4 => Self::Red,
            5 => Self::Magenta,
            6 => Self::Brown,
            7 => Self::LightGray,
            8 => Self::DarkGray,
            9 => Self::LightBlue,
            10 => Self::LightGreen,
            11 => Self::LightCyan,
            12 => Self::LightRed,
            13 => Self::LightMagenta,
            14 => Self::Yellow,
            _ => Self::White,
        }
    }

    /// Palette index (0..=15).
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Canonical VGA RGB value for this palette entry.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Black => (0x00, 0x00, 0x00),
            Self::Blue => (0x00, 0x00, 0xAA),
            Self::Green => (0x00, 0xAA, 0x00),
            Self::Cyan => (0x00, 0xAA, 0xAA),
            Self::Red => (0xAA, 0x00, 0x00),
            Self::Magenta => (0xAA, 0x00, 0xAA),
            Self::Brown => (0xAA, 0x55, 0x00),
            Self::LightGray => (0xAA, 0xAA, 0xAA),
            Self::DarkGray => (0x55, 0x55, 0x55),
            Self::LightBlue => (0x55, 0x55, 0xFF),
            Self::LightGreen => (0x55, 0xFF, 0x55),
            Self::LightCyan => (0x55, 0xFF, 0xFF),
            Self::LightRed => (0xFF, 0x55, 0x55),
            Self::LightMagenta => (0xFF, 0x55, 0xFF),
            Self::Yellow => (0xFF, 0xFF, 0x55),
            Self::White => (0xFF, 0xFF, 0xFF),
        }
    }
}

bitflags::bitflags! {
    /// Cell attribute flags.
    #[repr(transparent)]
    #[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        /// Blinking text (classic attribute bit 7).
        const BLINK = 0b0000_0001;
    }
}

impl std::fmt::Debug for CellFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Foreground/background colors plus flags for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAttributes {
    /// Foreground palette color.
    pub foreground: DosColor,
    /// Background palette color.
    pub background: DosColor,
    /// Attribute flags.
    pub flags: CellFlags,
}

impl CellAttributes {
    /// Attributes with the given colors and no flags.
    #[inline]
    pub fn new(foreground: DosColor, background: DosColor) -> Self {
        Self {
            foreground,
            background,
            flags: CellFlags::empty(),
        }
    }

    /// Set the blink flag (builder pattern).
    pub fn with_blink(mut self, blink: bool) -> Self {
        self.flags.set(CellFlags::BLINK, blink);
        self
    }
}

impl Default for CellAttributes {
    fn default() -> Self {
        // Light gray on black, the DOS text-mode default.
        Self::new(DosColor::LightGray, DosColor::Black)
    }
}

/// A single character cell: one glyph and its attributes.
///
/// Cells that were never written are absent from the buffer entirely
/// (`Option<Cell>` is `None`), which renderers treat as a space in default
/// colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The glyph.
    pub ch: char,
    /// Color attributes.
    pub attributes: CellAttributes,
}

impl Cell {
    /// Create a cell.
    #[inline]
    pub fn new(ch: char, attributes: CellAttributes) -> Self {
        Self { ch, attributes }
    }

    /// A space in default colors, what absent cells render as.
    #[inline]
    pub fn blank() -> Self {
        Self::new(' ', CellAttributes::default())
    }
}
