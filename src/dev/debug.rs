use super::{Device, LineShape, Point, View};
use crate::gfx::{PutMode, Sprite};
use crate::lang::draw::DrawCommand;
use crate::lang::Error;
use std::collections::{HashMap, VecDeque};
use std::task::Poll;

type Result<T> = std::result::Result<T, Error>;

/// ## Recording device
///
/// Buffers printed text, answers input from queues and records every
/// other call as a line of text. Integration tests drive programs with it.

#[derive(Debug, Default)]
pub struct DebugDevice {
    output: String,
    calls: Vec<String>,
    lines: VecDeque<String>,
    keys: VecDeque<char>,
    pixels: HashMap<Point, u8>,
    pen: Point,
    foreground: u8,
    background: u8,
}

impl DebugDevice {
    pub fn new() -> DebugDevice {
        DebugDevice {
            foreground: 15,
            ..DebugDevice::default()
        }
    }

    /// Queue a line for INPUT and LINE INPUT.
    pub fn push_line(&mut self, line: &str) {
        self.lines.push_back(line.to_string());
    }

    /// Queue keystrokes for INKEY$ and INPUT$.
    pub fn push_keys(&mut self, keys: &str) {
        self.keys.extend(keys.chars());
    }

    /// Everything printed so far, which is then forgotten.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    fn record(&mut self, call: String) {
        self.calls.push(call);
    }
}

fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

impl Device for DebugDevice {
    fn print(&mut self, text: &str) -> Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    fn input(&mut self) -> Result<Poll<String>> {
        match self.lines.pop_front() {
            Some(line) => {
                self.output.push_str(&line);
                self.output.push('\n');
                Ok(Poll::Ready(line))
            }
            None => Ok(Poll::Pending),
        }
    }

    fn inkey(&mut self) -> Result<String> {
        Ok(self.keys.pop_front().map(String::from).unwrap_or_default())
    }

    fn inkey_wait(&mut self, n: usize) -> Result<Poll<String>> {
        if self.keys.len() < n {
            return Ok(Poll::Pending);
        }
        Ok(Poll::Ready(self.keys.drain(..n).collect()))
    }

    fn colors(&self) -> Result<(u8, u8)> {
        Ok((self.foreground, self.background))
    }

    fn set_colors(&mut self, foreground: Option<u8>, background: Option<u8>) -> Result<()> {
        self.record(format!("COLOR {} {}", opt(foreground), opt(background)));
        if let Some(fg) = foreground {
            self.foreground = fg;
        }
        if let Some(bg) = background {
            self.background = bg;
        }
        Ok(())
    }

    fn pen(&self) -> Result<Point> {
        Ok(self.pen)
    }

    fn pset(&mut self, at: Point, color: Option<u8>) -> Result<()> {
        self.record(format!("PSET {} {}", at, opt(color)));
        self.pixels.insert(at, color.unwrap_or(self.foreground));
        self.pen = at;
        Ok(())
    }

    fn preset(&mut self, at: Point, color: Option<u8>) -> Result<()> {
        self.record(format!("PRESET {} {}", at, opt(color)));
        self.pixels.insert(at, color.unwrap_or(self.background));
        self.pen = at;
        Ok(())
    }

    fn point(&self, at: Point) -> Result<i32> {
        Ok(self.pixels.get(&at).copied().unwrap_or(0) as i32)
    }

    fn line(
        &mut self,
        from: Option<Point>,
        to: Point,
        color: Option<u8>,
        shape: LineShape,
        style: u16,
    ) -> Result<()> {
        let from = from.unwrap_or(self.pen);
        self.record(format!(
            "LINE {}-{} {} {:?} {:04X}",
            from,
            to,
            opt(color),
            shape,
            style
        ));
        self.pen = to;
        Ok(())
    }

    fn circle(
        &mut self,
        center: Point,
        radius: f64,
        color: Option<u8>,
        start: Option<f64>,
        end: Option<f64>,
        aspect: Option<f64>,
    ) -> Result<()> {
        self.record(format!(
            "CIRCLE {} {} {} {} {} {}",
            center,
            radius,
            opt(color),
            opt(start),
            opt(end),
            opt(aspect)
        ));
        self.pen = center;
        Ok(())
    }

    fn paint(&mut self, at: Point, fill: Option<u8>, border: Option<u8>) -> Result<usize> {
        self.record(format!("PAINT {} {} {}", at, opt(fill), opt(border)));
        self.pen = at;
        Ok(0)
    }

    fn draw(&mut self, commands: &[DrawCommand]) -> Result<()> {
        self.record(format!("DRAW {}", commands.len()));
        Ok(())
    }

    fn get_graphics(&mut self, from: Point, to: Point) -> Result<Sprite> {
        self.record(format!("GET {}-{}", from, to));
        let width = (to.x - from.x).unsigned_abs() as usize + 1;
        let height = (to.y - from.y).unsigned_abs() as usize + 1;
        let (left, top) = (from.x.min(to.x), from.y.min(to.y));
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let p = Point::new(left + x, top + y);
                pixels.push(self.pixels.get(&p).copied().unwrap_or(0));
            }
        }
        Ok(Sprite::new(width, height, pixels))
    }

    fn put_graphics(&mut self, at: Point, sprite: &Sprite, mode: PutMode) -> Result<()> {
        self.record(format!(
            "PUT {} {}x{} {:?}",
            at,
            sprite.width(),
            sprite.height(),
            mode
        ));
        Ok(())
    }

    fn locate(&mut self, row: Option<u16>, column: Option<u16>) -> Result<()> {
        self.record(format!("LOCATE {} {}", opt(row), opt(column)));
        Ok(())
    }

    fn screen(
        &mut self,
        mode: u8,
        color_switch: Option<u8>,
        active_page: Option<u8>,
        visible_page: Option<u8>,
    ) -> Result<()> {
        self.record(format!(
            "SCREEN {} {} {} {}",
            mode,
            opt(color_switch),
            opt(active_page),
            opt(visible_page)
        ));
        Ok(())
    }

    fn screen_lines(&self) -> Result<u16> {
        Ok(25)
    }

    fn set_view(&mut self, view: Option<View>) -> Result<()> {
        match view {
            Some(v) => self.record(format!("VIEW {}-{}", v.from, v.to)),
            None => self.record("VIEW".to_string()),
        }
        Ok(())
    }

    fn set_view_print(&mut self, rows: Option<(u16, u16)>) -> Result<()> {
        match rows {
            Some((top, bottom)) => self.record(format!("VIEW PRINT {} TO {}", top, bottom)),
            None => self.record("VIEW PRINT".to_string()),
        }
        Ok(())
    }

    fn reset_palette(&mut self) -> Result<()> {
        self.record("PALETTE".to_string());
        Ok(())
    }

    fn set_palette(&mut self, attribute: u8, color: u32) -> Result<()> {
        self.record(format!("PALETTE {} {}", attribute, color));
        Ok(())
    }

    fn sleep(&mut self, seconds: Option<f64>) -> Result<Poll<()>> {
        self.record(format!("SLEEP {}", opt(seconds)));
        Ok(Poll::Ready(()))
    }

    fn cls(&mut self) -> Result<()> {
        self.record("CLS".to_string());
        Ok(())
    }

    fn cls_graphics(&mut self) -> Result<()> {
        self.record("CLS 1".to_string());
        Ok(())
    }

    fn cls_text(&mut self) -> Result<()> {
        self.record("CLS 2".to_string());
        Ok(())
    }
}
