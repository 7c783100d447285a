// Core value types shared by every layer of the drawing surface.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Fully opaque alpha byte, already shifted into place.
pub const OPAQUE: u32 = 0xFF00_0000;

/// A raster of `width * height` pixels packed as 0xAARRGGBB.
/// The alpha byte is layer coverage (0 = transparent); minifb ignores it on present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl FrameBuffer {
    /// Fully transparent buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Set a pixel if (x,y) is inside bounds.
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[y * self.width + x] = color;
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Copy into a buffer of a new size, anchored top-left.
    /// Pixels outside the old area are transparent; pixels past the new edge are dropped.
    pub fn resized(&self, width: usize, height: usize) -> FrameBuffer {
        let mut out = FrameBuffer::new(width, height);
        out.blit(self);
        out
    }

    /// Overwrite the overlapping top-left region with `src`.
    pub fn blit(&mut self, src: &FrameBuffer) {
        let w = self.width.min(src.width);
        let h = self.height.min(src.height);
        for y in 0..h {
            let dst_row = y * self.width;
            let src_row = y * src.width;
            self.pixels[dst_row..dst_row + w].copy_from_slice(&src.pixels[src_row..src_row + w]);
        }
    }

    /// Nearest-neighbour scale of `src` into this buffer, optionally flipped horizontally.
    pub fn scale_from(&mut self, src: &FrameBuffer, mirror: bool) {
        if src.is_empty() || self.is_empty() {
            return;
        }
        for y in 0..self.height {
            let sy = y * src.height / self.height;
            let src_row = sy * src.width;
            let dst_row = y * self.width;
            for x in 0..self.width {
                let mut sx = x * src.width / self.width;
                if mirror {
                    sx = src.width - 1 - sx;
                }
                self.pixels[dst_row + x] = src.pixels[src_row + sx];
            }
        }
    }
}

/// A position in canvas pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An sRGB color. Written in config files as `"#rrggbb"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Packed as an opaque 0xAARRGGBB pixel.
    pub fn to_argb(self) -> u32 {
        OPAQUE | ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | self.2 as u32
    }

    pub fn from_argb(px: u32) -> Self {
        Rgb(((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| Error::InvalidColor(s.to_string()))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_keeps_overlap_top_left() {
        let mut fb = FrameBuffer::new(4, 3);
        fb.put(1, 1, 0xFF11_2233);
        fb.put(3, 2, 0xFF44_5566);

        let grown = fb.resized(6, 5);
        assert_eq!(grown.get(1, 1), Some(0xFF11_2233));
        assert_eq!(grown.get(3, 2), Some(0xFF44_5566));
        assert_eq!(grown.get(5, 4), Some(0));

        let shrunk = fb.resized(2, 2);
        assert_eq!(shrunk.get(1, 1), Some(0xFF11_2233));
        assert_eq!(shrunk.pixels.len(), 4);
    }

    #[test]
    fn scale_from_mirrors_columns() {
        let mut src = FrameBuffer::new(2, 1);
        src.pixels = vec![1, 2];
        let mut dst = FrameBuffer::new(4, 2);

        dst.scale_from(&src, false);
        assert_eq!(&dst.pixels[..4], &[1, 1, 2, 2]);

        dst.scale_from(&src, true);
        assert_eq!(&dst.pixels[4..], &[2, 2, 1, 1]);
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb(255, 128, 0));
        assert_eq!("00ff00".parse::<Rgb>().unwrap(), Rgb(0, 255, 0));
        assert!("#ff80".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert_eq!(Rgb(1, 2, 3).to_string(), "#010203");
        assert_eq!(Rgb::from_argb(Rgb(9, 8, 7).to_argb()), Rgb(9, 8, 7));
    }
}
