use super::{GraphicsBuffer, Palette, PutMode, Sprite, Turtle, Viewport};
use crate::dev::{Device, LineShape, Point, View};
use crate::error;
use crate::lang::draw::DrawCommand;
use crate::lang::Error;
use std::collections::VecDeque;
use std::task::Poll;

type Result<T> = std::result::Result<T, Error>;

/// Geometry of a SCREEN mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub number: u8,
    pub width: usize,
    pub height: usize,
    pub colors: u16,
    pub columns: u16,
    pub rows: u16,
    pub graphics: bool,
}

const MODES: &[Mode] = &[
    Mode::new(0, 640, 200, 16, 80, 25, false),
    Mode::new(1, 320, 200, 4, 40, 25, true),
    Mode::new(2, 640, 200, 2, 80, 25, true),
    Mode::new(7, 320, 200, 16, 40, 25, true),
    Mode::new(8, 640, 200, 16, 80, 25, true),
    Mode::new(9, 640, 350, 16, 80, 25, true),
    Mode::new(10, 640, 350, 4, 80, 25, true),
    Mode::new(11, 640, 480, 2, 80, 30, true),
    Mode::new(12, 640, 480, 16, 80, 30, true),
    Mode::new(13, 320, 200, 256, 40, 25, true),
];

impl Mode {
    const fn new(
        number: u8,
        width: usize,
        height: usize,
        colors: u16,
        columns: u16,
        rows: u16,
        graphics: bool,
    ) -> Mode {
        Mode {
            number,
            width,
            height,
            colors,
            columns,
            rows,
            graphics,
        }
    }

    pub fn find(number: u8) -> Option<Mode> {
        MODES.iter().find(|m| m.number == number).copied()
    }

    /// CIRCLE aspect that looks round on a 4:3 display.
    pub fn aspect(&self) -> f64 {
        4.0 / 3.0 * self.height as f64 / self.width as f64
    }
}

/// Printed text with the colors it was printed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub foreground: u8,
    pub background: u8,
}

/// ## Raster screen
///
/// A [`Device`](Device) that draws into a [`GraphicsBuffer`](GraphicsBuffer)
/// and collects printed text as colored spans for the host to render.
/// Input and keystrokes are queued by the host.

#[derive(Debug)]
pub struct Screen {
    mode: Mode,
    buffer: GraphicsBuffer,
    palette: Palette,
    turtle: Turtle,
    pen: Point,
    foreground: u8,
    background: u8,
    spans: Vec<Span>,
    lines: VecDeque<String>,
    keys: VecDeque<char>,
    row: u16,
    column: u16,
    view_print: Option<(u16, u16)>,
}

impl Default for Screen {
    fn default() -> Self {
        let mode = MODES[0];
        Screen {
            mode,
            buffer: GraphicsBuffer::new(mode.width, mode.height),
            palette: Palette::default(),
            turtle: Turtle::default(),
            pen: Point::default(),
            foreground: 7,
            background: 0,
            spans: vec![],
            lines: VecDeque::new(),
            keys: VecDeque::new(),
            row: 1,
            column: 1,
            view_print: None,
        }
    }
}

impl Screen {
    pub fn new() -> Screen {
        Screen::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn buffer(&self) -> &GraphicsBuffer {
        &self.buffer
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Cursor row and column, one based.
    pub fn cursor(&self) -> (u16, u16) {
        (self.row, self.column)
    }

    pub fn push_line(&mut self, line: &str) {
        self.lines.push_back(line.to_string());
    }

    pub fn push_keys(&mut self, keys: &str) {
        self.keys.extend(keys.chars());
    }

    /// Text printed since the last call.
    pub fn take_output(&mut self) -> Vec<Span> {
        std::mem::take(&mut self.spans)
    }

    fn graphics(&mut self) -> Result<&mut GraphicsBuffer> {
        if !self.mode.graphics {
            return Err(error!(IllegalFunctionCall));
        }
        Ok(&mut self.buffer)
    }

    fn attribute(&self, color: Option<u8>, default: u8) -> Result<u8> {
        let color = color.unwrap_or(default);
        if color as u16 >= self.mode.colors {
            return Err(error!(IllegalFunctionCall));
        }
        Ok(color)
    }

    fn text_rows(&self) -> (u16, u16) {
        self.view_print.unwrap_or((1, self.mode.rows))
    }

    fn append(&mut self, text: &str) {
        let (foreground, background) = (self.foreground, self.background);
        match self.spans.last_mut() {
            Some(span) if span.foreground == foreground && span.background == background => {
                span.text.push_str(text)
            }
            _ => self.spans.push(Span {
                text: text.to_string(),
                foreground,
                background,
            }),
        }
        let (_, bottom) = self.text_rows();
        for ch in text.chars() {
            if ch == '\n' || self.column >= self.mode.columns {
                self.column = 1;
                self.row = (self.row + 1).min(bottom);
            }
            if ch != '\n' {
                self.column += 1;
            }
        }
    }
}

impl Device for Screen {
    fn print(&mut self, text: &str) -> Result<()> {
        self.append(text);
        Ok(())
    }

    fn input(&mut self) -> Result<Poll<String>> {
        match self.lines.pop_front() {
            Some(line) => {
                self.append(&line);
                self.append("\n");
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
        if let Some(fg) = foreground {
            // Text mode adds 16 for blinking.
            let limit = if self.mode.graphics { self.mode.colors } else { 32 };
            if fg as u16 >= limit {
                return Err(error!(IllegalFunctionCall));
            }
        }
        let background = background.map(|bg| self.attribute(Some(bg), 0)).transpose()?;
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
        let color = self.attribute(color, self.foreground)?;
        self.graphics()?.pset(at.x, at.y, color);
        self.pen = at;
        Ok(())
    }

    fn preset(&mut self, at: Point, color: Option<u8>) -> Result<()> {
        let color = self.attribute(color, self.background)?;
        self.graphics()?.pset(at.x, at.y, color);
        self.pen = at;
        Ok(())
    }

    fn point(&self, at: Point) -> Result<i32> {
        if !self.mode.graphics {
            return Err(error!(IllegalFunctionCall));
        }
        Ok(self.buffer.pget(at.x, at.y).map_or(-1, i32::from))
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
        let color = self.attribute(color, self.foreground)?;
        let buffer = self.graphics()?;
        match shape {
            LineShape::Line => {
                buffer.line(from.x, from.y, to.x, to.y, color, style);
            }
            LineShape::Box => buffer.rect(from.x, from.y, to.x, to.y, color, style),
            LineShape::FilledBox => buffer.filled_rect(from.x, from.y, to.x, to.y, color),
        }
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
        let color = self.attribute(color, self.foreground)?;
        let aspect = aspect.unwrap_or_else(|| self.mode.aspect());
        if radius < 0.0 || aspect <= 0.0 {
            return Err(error!(IllegalFunctionCall));
        }
        self.graphics()?
            .circle(center.x, center.y, radius, color, start, end, aspect);
        self.pen = center;
        Ok(())
    }

    fn paint(&mut self, at: Point, fill: Option<u8>, border: Option<u8>) -> Result<usize> {
        let fill = self.attribute(fill, self.foreground)?;
        let border = self.attribute(border, fill)?;
        let count = self.graphics()?.paint(at.x, at.y, fill, border);
        self.pen = at;
        Ok(count)
    }

    fn draw(&mut self, commands: &[DrawCommand]) -> Result<()> {
        let color = self.foreground;
        if !self.mode.graphics {
            return Err(error!(IllegalFunctionCall));
        }
        self.turtle.move_to(self.pen.x, self.pen.y);
        self.turtle.run(&mut self.buffer, commands, color);
        let (x, y) = self.turtle.position();
        self.pen = Point::new(x, y);
        Ok(())
    }

    fn get_graphics(&mut self, from: Point, to: Point) -> Result<Sprite> {
        self.graphics()?.get(from.x, from.y, to.x, to.y)
    }

    fn put_graphics(&mut self, at: Point, sprite: &Sprite, mode: PutMode) -> Result<()> {
        self.graphics()?.put(at.x, at.y, sprite, mode);
        Ok(())
    }

    fn locate(&mut self, row: Option<u16>, column: Option<u16>) -> Result<()> {
        let (top, bottom) = self.text_rows();
        if let Some(row) = row {
            if row < top || row > bottom {
                return Err(error!(IllegalFunctionCall));
            }
        }
        if let Some(column) = column {
            if column < 1 || column > self.mode.columns {
                return Err(error!(IllegalFunctionCall));
            }
        }
        self.row = row.unwrap_or(self.row);
        self.column = column.unwrap_or(self.column);
        Ok(())
    }

    fn screen(
        &mut self,
        mode: u8,
        _color_switch: Option<u8>,
        active_page: Option<u8>,
        visible_page: Option<u8>,
    ) -> Result<()> {
        if active_page.unwrap_or(0) != 0 || visible_page.unwrap_or(0) != 0 {
            return Err(error!(IllegalFunctionCall));
        }
        let mode = Mode::find(mode).ok_or_else(|| error!(IllegalFunctionCall))?;
        self.mode = mode;
        self.buffer = GraphicsBuffer::new(mode.width, mode.height);
        self.palette.reset();
        self.turtle = Turtle::default();
        self.pen = Point::new(mode.width as i32 / 2, mode.height as i32 / 2);
        self.foreground = (mode.colors - 1).min(15) as u8;
        self.background = 0;
        self.view_print = None;
        self.row = 1;
        self.column = 1;
        Ok(())
    }

    fn screen_lines(&self) -> Result<u16> {
        Ok(self.mode.rows)
    }

    fn set_view(&mut self, view: Option<View>) -> Result<()> {
        let view = match view {
            Some(view) => view,
            None => return self.graphics()?.set_view(None),
        };
        let fill = view.fill.map(|c| self.attribute(Some(c), 0)).transpose()?;
        let border = view.border.map(|c| self.attribute(Some(c), 0)).transpose()?;
        let rect = Viewport::new(view.from.x, view.from.y, view.to.x, view.to.y);
        let buffer = self.graphics()?;
        buffer.set_view(None)?;
        if let Some(border) = border {
            buffer.rect(
                rect.left - 1,
                rect.top - 1,
                rect.right + 1,
                rect.bottom + 1,
                border,
                0xFFFF,
            );
        }
        buffer.set_view(Some(rect))?;
        if let Some(fill) = fill {
            buffer.clear(fill);
        }
        Ok(())
    }

    fn set_view_print(&mut self, rows: Option<(u16, u16)>) -> Result<()> {
        if let Some((top, bottom)) = rows {
            if top < 1 || top > bottom || bottom > self.mode.rows {
                return Err(error!(IllegalFunctionCall));
            }
        }
        self.view_print = rows;
        self.row = self.text_rows().0;
        self.column = 1;
        Ok(())
    }

    fn reset_palette(&mut self) -> Result<()> {
        self.palette.reset();
        Ok(())
    }

    fn set_palette(&mut self, attribute: u8, color: u32) -> Result<()> {
        if attribute as u16 >= self.mode.colors || color & !0x3F3F3F != 0 {
            return Err(error!(IllegalFunctionCall));
        }
        self.palette.set(attribute, color);
        Ok(())
    }

    fn sleep(&mut self, seconds: Option<f64>) -> Result<Poll<()>> {
        match seconds {
            Some(s) if s <= 0.0 => Ok(Poll::Ready(())),
            _ => Ok(Poll::Pending),
        }
    }

    fn cls(&mut self) -> Result<()> {
        if self.mode.graphics {
            self.cls_graphics()?;
        }
        self.cls_text()
    }

    fn cls_graphics(&mut self) -> Result<()> {
        let background = self.background;
        self.graphics()?.clear(background);
        self.pen = Point::new(self.mode.width as i32 / 2, self.mode.height as i32 / 2);
        Ok(())
    }

    fn cls_text(&mut self) -> Result<()> {
        self.spans.clear();
        self.row = self.text_rows().0;
        self.column = 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::draw::parse;

    fn screen(mode: u8) -> Screen {
        let mut s = Screen::new();
        s.screen(mode, None, None, None).unwrap();
        s
    }

    #[test]
    fn test_text_mode_refuses_graphics() {
        let mut s = Screen::new();
        let err = s.pset(Point::new(1, 1), None).unwrap_err();
        assert_eq!(err.code(), 5);
        assert!(s.point(Point::new(1, 1)).is_err());
        assert!(s.print("HELLO").is_ok());
    }

    #[test]
    fn test_modes() {
        assert_eq!(Mode::find(13).unwrap().width, 320);
        assert_eq!(Mode::find(12).unwrap().rows, 30);
        assert!(Mode::find(3).is_none());
        assert!((Mode::find(13).unwrap().aspect() - 0.8333).abs() < 0.001);
        let mut s = Screen::new();
        assert!(s.screen(13, None, Some(1), None).is_err());
        assert!(s.screen(4, None, None, None).is_err());
        assert_eq!(s.mode().number, 0);
    }

    #[test]
    fn test_pset_point_and_pen() {
        let mut s = screen(13);
        assert_eq!(s.pen().unwrap(), Point::new(160, 100));
        s.pset(Point::new(3, 4), Some(200)).unwrap();
        assert_eq!(s.point(Point::new(3, 4)).unwrap(), 200);
        assert_eq!(s.point(Point::new(-1, 4)).unwrap(), -1);
        assert_eq!(s.pen().unwrap(), Point::new(3, 4));
        s.preset(Point::new(3, 4), None).unwrap();
        assert_eq!(s.point(Point::new(3, 4)).unwrap(), 0);
    }

    #[test]
    fn test_color_range_per_mode() {
        let mut s = screen(1);
        assert!(s.pset(Point::new(0, 0), Some(3)).is_ok());
        assert!(s.pset(Point::new(0, 0), Some(4)).is_err());
        assert!(s.set_colors(Some(4), None).is_err());
        let mut s = Screen::new();
        assert!(s.set_colors(Some(31), Some(7)).is_ok());
        assert!(s.set_colors(None, Some(16)).is_err());
    }

    #[test]
    fn test_boxes_and_paint() {
        let mut s = screen(13);
        s.line(Some(Point::new(10, 10)), Point::new(20, 20), Some(4), LineShape::Box, 0xFFFF)
            .unwrap();
        let filled = s.paint(Point::new(15, 15), Some(2), Some(4)).unwrap();
        assert_eq!(filled, 81);
        s.line(None, Point::new(30, 30), Some(1), LineShape::FilledBox, 0xFFFF)
            .unwrap();
        assert_eq!(s.point(Point::new(25, 25)).unwrap(), 1);
        assert_eq!(s.pen().unwrap(), Point::new(30, 30));
    }

    #[test]
    fn test_view_clips_and_frames() {
        let mut s = screen(13);
        let view = View {
            from: Point::new(10, 10),
            to: Point::new(19, 19),
            fill: Some(1),
            border: Some(2),
        };
        s.set_view(Some(view)).unwrap();
        assert_eq!(s.point(Point::new(10, 10)).unwrap(), 1);
        assert_eq!(s.point(Point::new(9, 9)).unwrap(), -1);
        s.set_view(None).unwrap();
        assert_eq!(s.point(Point::new(9, 9)).unwrap(), 2);
        assert_eq!(s.point(Point::new(20, 15)).unwrap(), 2);
    }

    #[test]
    fn test_draw_moves_pen() {
        let mut s = screen(13);
        s.pset(Point::new(50, 50), Some(0)).unwrap();
        s.draw(&parse("C9 R10").unwrap()).unwrap();
        assert_eq!(s.pen().unwrap(), Point::new(60, 50));
        assert_eq!(s.point(Point::new(55, 50)).unwrap(), 9);
    }

    #[test]
    fn test_spans_and_input() {
        let mut s = Screen::new();
        s.print("A").unwrap();
        s.set_colors(Some(4), None).unwrap();
        s.print("B").unwrap();
        s.print("C").unwrap();
        assert_eq!(s.input().unwrap(), Poll::Pending);
        s.push_line("yes");
        assert_eq!(s.input().unwrap(), Poll::Ready("yes".to_string()));
        let spans = s.take_output();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "A");
        assert_eq!(spans[1].text, "BCyes\n");
        assert_eq!(spans[1].foreground, 4);
        assert_eq!(s.cursor(), (2, 1));
    }

    #[test]
    fn test_locate_and_view_print() {
        let mut s = Screen::new();
        s.locate(Some(5), Some(10)).unwrap();
        assert_eq!(s.cursor(), (5, 10));
        assert!(s.locate(Some(26), None).is_err());
        assert!(s.locate(None, Some(81)).is_err());
        s.set_view_print(Some((10, 20))).unwrap();
        assert_eq!(s.cursor(), (10, 1));
        assert!(s.locate(Some(5), None).is_err());
        assert!(s.set_view_print(Some((20, 10))).is_err());
    }

    #[test]
    fn test_palette_and_sleep() {
        let mut s = screen(13);
        s.set_palette(1, 63).unwrap();
        assert_eq!(s.palette().get(1), (255, 0, 0));
        assert!(s.set_palette(1, 64).is_err());
        s.reset_palette().unwrap();
        assert_eq!(s.palette().get(1), (0, 0, 0xAA));
        assert_eq!(s.sleep(Some(0.0)).unwrap(), Poll::Ready(()));
        assert_eq!(s.sleep(Some(1.5)).unwrap(), Poll::Pending);
        assert_eq!(s.sleep(None).unwrap(), Poll::Pending);
    }

    #[test]
    fn test_get_put_roundtrip() {
        let mut s = screen(13);
        s.pset(Point::new(0, 0), Some(7)).unwrap();
        let sprite = s.get_graphics(Point::new(0, 0), Point::new(1, 1)).unwrap();
        s.put_graphics(Point::new(100, 100), &sprite, PutMode::Pset)
            .unwrap();
        assert_eq!(s.point(Point::new(100, 100)).unwrap(), 7);
        s.put_graphics(Point::new(100, 100), &sprite, PutMode::And)
            .unwrap();
        assert_eq!(s.point(Point::new(100, 100)).unwrap(), 7);
    }
}
