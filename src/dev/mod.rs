/*!
## Presentation devices

The virtual machine never touches a screen or keyboard. Every console and
graphics statement becomes a call on a [`Device`](Device). Calls that have
to wait on the user answer `Poll::Pending`; the runtime then suspends and
the host resumes it with [`Runtime::enter`](crate::mach::Runtime::enter)
or [`Runtime::wake`](crate::mach::Runtime::wake).

*/

use crate::gfx::{PutMode, Sprite};
use crate::lang::draw::DrawCommand;
use crate::lang::Error;
use std::task::Poll;

mod debug;
mod null;

pub use debug::DebugDevice;
pub use null::NullDevice;

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Point {
        Point { x, y }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    Line,
    Box,
    FilledBox,
}

/// Graphics viewport set by VIEW, in absolute screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct View {
    pub from: Point,
    pub to: Point,
    pub fill: Option<u8>,
    pub border: Option<u8>,
}

/// Screen modes the raster devices know.
pub const SCREEN_MODES: &[u8] = &[0, 1, 2, 7, 8, 9, 10, 11, 12, 13];

pub trait Device {
    fn print(&mut self, text: &str) -> Result<()>;
    /// One line of keyboard input, without the line ending.
    fn input(&mut self) -> Result<Poll<String>>;
    /// A pending keystroke or the empty string.
    fn inkey(&mut self) -> Result<String>;
    /// Exactly `n` keystrokes.
    fn inkey_wait(&mut self, n: usize) -> Result<Poll<String>>;
    fn colors(&self) -> Result<(u8, u8)>;
    fn set_colors(&mut self, foreground: Option<u8>, background: Option<u8>) -> Result<()>;
    /// The last point referenced. STEP coordinates are relative to it.
    fn pen(&self) -> Result<Point>;
    fn pset(&mut self, at: Point, color: Option<u8>) -> Result<()>;
    fn preset(&mut self, at: Point, color: Option<u8>) -> Result<()>;
    /// Color attribute at a point, -1 when outside the viewport.
    fn point(&self, at: Point) -> Result<i32>;
    fn line(
        &mut self,
        from: Option<Point>,
        to: Point,
        color: Option<u8>,
        shape: LineShape,
        style: u16,
    ) -> Result<()>;
    /// Angles in radians; negative angles also draw a radius.
    fn circle(
        &mut self,
        center: Point,
        radius: f64,
        color: Option<u8>,
        start: Option<f64>,
        end: Option<f64>,
        aspect: Option<f64>,
    ) -> Result<()>;
    /// Flood fill. Returns the number of pixels filled.
    fn paint(&mut self, at: Point, fill: Option<u8>, border: Option<u8>) -> Result<usize>;
    fn draw(&mut self, commands: &[DrawCommand]) -> Result<()>;
    fn get_graphics(&mut self, from: Point, to: Point) -> Result<Sprite>;
    fn put_graphics(&mut self, at: Point, sprite: &Sprite, mode: PutMode) -> Result<()>;
    fn locate(&mut self, row: Option<u16>, column: Option<u16>) -> Result<()>;
    fn screen(
        &mut self,
        mode: u8,
        color_switch: Option<u8>,
        active_page: Option<u8>,
        visible_page: Option<u8>,
    ) -> Result<()>;
    fn screen_lines(&self) -> Result<u16>;
    fn set_view(&mut self, view: Option<View>) -> Result<()>;
    fn set_view_print(&mut self, rows: Option<(u16, u16)>) -> Result<()>;
    fn reset_palette(&mut self) -> Result<()>;
    /// Color is `65536 * blue + 256 * green + red`, each channel 0..=63.
    fn set_palette(&mut self, attribute: u8, color: u32) -> Result<()>;
    /// Seconds to wait, or until a key when absent.
    fn sleep(&mut self, seconds: Option<f64>) -> Result<Poll<()>>;
    fn cls(&mut self) -> Result<()>;
    fn cls_graphics(&mut self) -> Result<()>;
    fn cls_text(&mut self) -> Result<()>;
}
