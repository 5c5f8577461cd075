/*!
## Raster graphics

An indexed-color pixel grid with clipping, the primitives the graphics
statements need, a 256 entry palette, the DRAW turtle, and
[`Screen`](Screen), a [`Device`](crate::dev::Device) built from them.

*/

mod buffer;
mod palette;
mod screen;
mod turtle;

pub use buffer::{GraphicsBuffer, Viewport};
pub use palette::Palette;
pub use screen::{Mode, Screen, Span};
pub use turtle::Turtle;

/// How PUT combines a sprite with the pixels under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    Pset,
    Preset,
    And,
    Or,
    Xor,
}

impl PutMode {
    pub fn blend(self, src: u8, dst: &mut u8) {
        match self {
            PutMode::Pset => *dst = src,
            PutMode::Preset => *dst = !src,
            PutMode::And => *dst &= src,
            PutMode::Or => *dst |= src,
            PutMode::Xor => *dst ^= src,
        }
    }
}

/// A rectangle of pixels captured by GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Sprite {
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Sprite {
        Sprite {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}
