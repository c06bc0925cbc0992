//! Fixed-width fields shared by the draw commands.

use std::fmt;

/// Width of the device screen in pixels; one oscilloscope sample per column.
pub const SCREEN_WIDTH: usize = 320;

/// Height of the device screen in pixels.
pub const SCREEN_HEIGHT: usize = 240;

/// A screen position. Signed so geometry may start off-screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

/// A rectangle extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i16,
    pub height: i16,
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Position {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Read two little-endian `i16` from the first four bytes.
    pub(crate) fn from_le(bytes: &[u8; 4]) -> Self {
        let (x, y) = read_i16_pair(bytes);
        Self { x, y }
    }

    pub(crate) fn to_le(self) -> [u8; 4] {
        write_i16_pair(self.x, self.y)
    }
}

impl Size {
    pub const fn new(width: i16, height: i16) -> Self {
        Self { width, height }
    }

    pub(crate) fn from_le(bytes: &[u8; 4]) -> Self {
        let (width, height) = read_i16_pair(bytes);
        Self { width, height }
    }

    pub(crate) fn to_le(self) -> [u8; 4] {
        write_i16_pair(self.width, self.height)
    }
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub(crate) fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

fn read_i16_pair(bytes: &[u8; 4]) -> (i16, i16) {
    (
        i16::from_le_bytes([bytes[0], bytes[1]]),
        i16::from_le_bytes([bytes[2], bytes[3]]),
    )
}

fn write_i16_pair(a: i16, b: i16) -> [u8; 4] {
    let [a0, a1] = a.to_le_bytes();
    let [b0, b1] = b.to_le_bytes();
    [a0, a1, b0, b1]
}
