use super::{PutMode, Sprite};
use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Inclusive clipping rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Viewport {
    /// Normalizes the corners so `left <= right` and `top <= bottom`.
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Viewport {
        Viewport {
            left: x0.min(x1),
            top: y0.min(y1),
            right: x0.max(x1),
            bottom: y0.max(y1),
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn width(&self) -> usize {
        (self.right - self.left + 1) as usize
    }

    pub fn height(&self) -> usize {
        (self.bottom - self.top + 1) as usize
    }

    fn intersect(&self, other: &Viewport) -> Option<Viewport> {
        let v = Viewport {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if v.left <= v.right && v.top <= v.bottom {
            Some(v)
        } else {
            None
        }
    }
}

/// ## Graphics buffer
///
/// Fixed-size grid of color attributes. Every primitive clips to the
/// active viewport instead of failing.

#[derive(Debug, Clone)]
pub struct GraphicsBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    full: Viewport,
    view: Option<Viewport>,
}

impl GraphicsBuffer {
    pub fn new(width: usize, height: usize) -> GraphicsBuffer {
        GraphicsBuffer {
            width,
            height,
            pixels: vec![0; width * height],
            full: Viewport::new(0, 0, width as i32 - 1, height as i32 - 1),
            view: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn viewport(&self) -> Viewport {
        self.view.unwrap_or(self.full)
    }

    /// Restrict drawing to a rectangle. The result is clipped to the
    /// buffer; a rectangle entirely off the buffer is an error.
    pub fn set_view(&mut self, view: Option<Viewport>) -> Result<()> {
        self.view = match view {
            Some(v) => match v.intersect(&self.full) {
                Some(v) => Some(v),
                None => return Err(error!(IllegalFunctionCall)),
            },
            None => None,
        };
        Ok(())
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.width + x as usize
    }

    /// Returns whether the pixel was inside the viewport.
    pub fn pset(&mut self, x: i32, y: i32, color: u8) -> bool {
        if !self.viewport().contains(x, y) {
            return false;
        }
        let offset = self.offset(x, y);
        self.pixels[offset] = color;
        true
    }

    pub fn pget(&self, x: i32, y: i32) -> Option<u8> {
        if !self.viewport().contains(x, y) {
            return None;
        }
        Some(self.pixels[self.offset(x, y)])
    }

    /// Fill the viewport with one color.
    pub fn clear(&mut self, color: u8) {
        let v = self.viewport();
        for y in v.top..=v.bottom {
            let row = self.offset(v.left, y);
            self.pixels[row..row + v.width()].fill(color);
        }
    }

    /// Bresenham line with a 16-bit dash style consumed from bit 15 down,
    /// one bit per pixel along the walk. Lines are always walked toward
    /// increasing x or y; a line given the other way round walks with the
    /// style bit-reversed. Only the part inside the viewport is visited.
    /// Returns the pixels set.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u8, style: u16) -> usize {
        let (dx, dy) = ((x1 as i64 - x0 as i64).abs(), (y1 as i64 - y0 as i64).abs());
        if dx >= dy {
            if x0 <= x1 {
                self.walk_x((x0, y0), (x1, y1), color, style)
            } else {
                self.walk_x((x1, y1), (x0, y0), color, style.reverse_bits())
            }
        } else if y0 <= y1 {
            self.walk_y((x0, y0), (x1, y1), color, style)
        } else {
            self.walk_y((x1, y1), (x0, y0), color, style.reverse_bits())
        }
    }

    fn walk_x(&mut self, from: (i32, i32), to: (i32, i32), color: u8, style: u16) -> usize {
        let (x0, y0) = (from.0 as i64, from.1 as i64);
        let (x1, y1) = (to.0 as i64, to.1 as i64);
        let (dx, dy) = (x1 - x0, (y1 - y0).abs());
        let step = if y1 < y0 { -1 } else { 1 };
        let v = self.viewport();
        let first = (v.left as i64 - x0).max(0);
        let last = (v.right as i64 - x0).min(dx);
        let mut count = 0;
        for i in first..=last {
            if style & (0x8000 >> (i % 16)) == 0 {
                continue;
            }
            let y = y0 + step * minor_offset(i, dx, dy);
            if self.pset_wide(x0 + i, y, color) {
                count += 1;
            }
        }
        count
    }

    fn walk_y(&mut self, from: (i32, i32), to: (i32, i32), color: u8, style: u16) -> usize {
        let (x0, y0) = (from.0 as i64, from.1 as i64);
        let (x1, y1) = (to.0 as i64, to.1 as i64);
        let (dy, dx) = (y1 - y0, (x1 - x0).abs());
        let step = if x1 < x0 { -1 } else { 1 };
        let v = self.viewport();
        let first = (v.top as i64 - y0).max(0);
        let last = (v.bottom as i64 - y0).min(dy);
        let mut count = 0;
        for i in first..=last {
            if style & (0x8000 >> (i % 16)) == 0 {
                continue;
            }
            let x = x0 + step * minor_offset(i, dy, dx);
            if self.pset_wide(x, y0 + i, color) {
                count += 1;
            }
        }
        count
    }

    fn pset_wide(&mut self, x: i64, y: i64, color: u8) -> bool {
        match (i32::try_from(x), i32::try_from(y)) {
            (Ok(x), Ok(y)) => self.pset(x, y, color),
            _ => false,
        }
    }

    pub fn rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u8, style: u16) {
        self.line(x0, y0, x1, y0, color, style);
        self.line(x1, y0, x1, y1, color, style);
        self.line(x1, y1, x0, y1, color, style);
        self.line(x0, y1, x0, y0, color, style);
    }

    pub fn filled_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u8) {
        let rect = Viewport::new(x0, y0, x1, y1);
        if let Some(v) = rect.intersect(&self.viewport()) {
            for y in v.top..=v.bottom {
                let row = self.offset(v.left, y);
                self.pixels[row..row + v.width()].fill(color);
            }
        }
    }

    /// Ellipse or arc. Angles are radians counterclockwise from the
    /// positive x axis; a negative angle also draws a radius to the center.
    /// Aspect below 1 flattens vertically, above 1 narrows horizontally.
    #[allow(clippy::too_many_arguments)]
    pub fn circle(
        &mut self,
        cx: i32,
        cy: i32,
        radius: f64,
        color: u8,
        start: Option<f64>,
        end: Option<f64>,
        aspect: f64,
    ) {
        let (rx, ry) = if aspect < 1.0 {
            (radius, radius * aspect)
        } else {
            (radius / aspect, radius)
        };
        let limit = i32::MAX as f64;
        let (rx, ry) = (
            rx.round().clamp(0.0, limit) as i64,
            ry.round().clamp(0.0, limit) as i64,
        );
        let tau = std::f64::consts::TAU;
        let arc = match (start, end) {
            (None, None) => None,
            (s, e) => Some((s.unwrap_or(0.0).abs(), e.unwrap_or(tau).abs())),
        };
        let (cx, cy) = (cx as i64, cy as i64);
        let v = self.viewport();
        let reach = (
            (v.left as i64 - cx).abs().max((v.right as i64 - cx).abs()),
            (v.top as i64 - cy).abs().max((v.bottom as i64 - cy).abs()),
        );
        if self.ellipse_visible(cx, cy, rx, ry) {
            ellipse_quadrant(rx, ry, reach, |x, y| {
                for (px, py) in [(x, y), (-x, y), (x, -y), (-x, -y)] {
                    let inside = match arc {
                        None => true,
                        Some((s, e)) => {
                            let mut theta = (-py as f64).atan2(px as f64);
                            if theta < 0.0 {
                                theta += tau;
                            }
                            if s <= e {
                                theta >= s && theta <= e
                            } else {
                                theta >= s || theta <= e
                            }
                        }
                    };
                    if inside {
                        self.pset_wide(cx + px, cy + py, color);
                    }
                }
            });
        }
        for angle in [start, end].iter().flatten() {
            if *angle < 0.0 {
                let a = angle.abs();
                let x = cx as f64 + (rx as f64 * a.cos()).round();
                let y = cy as f64 - (ry as f64 * a.sin()).round();
                self.line(cx as i32, cy as i32, x as i32, y as i32, color, 0xFFFF);
            }
        }
    }

    /// Whether any part of an ellipse outline can meet the viewport. The
    /// outline lies between the inner and outer half-axis circles.
    fn ellipse_visible(&self, cx: i64, cy: i64, rx: i64, ry: i64) -> bool {
        let v = self.viewport();
        let (left, right) = (v.left as i64 - cx, v.right as i64 - cx);
        let (top, bottom) = (v.top as i64 - cy, v.bottom as i64 - cy);
        let far_x = left.abs().max(right.abs()) as f64;
        let far_y = top.abs().max(bottom.abs()) as f64;
        let near_x = left.max(0) + (-right).max(0);
        let near_y = top.max(0) + (-bottom).max(0);
        let (inner, outer) = (rx.min(ry) as f64, rx.max(ry) as f64);
        let near = (near_x as f64).hypot(near_y as f64);
        inner <= far_x.hypot(far_y) + 1.0 && outer + 1.0 >= near
    }

    /// Flood fill from a seed, stopping at the border color and the
    /// viewport. Returns the number of pixels filled.
    pub fn paint(&mut self, x: i32, y: i32, fill: u8, border: u8) -> usize {
        let v = self.viewport();
        if !v.contains(x, y) {
            return 0;
        }
        let mut visited = vec![false; self.pixels.len()];
        let mut stack = vec![(x, y)];
        let mut count = 0;
        while let Some((x, y)) = stack.pop() {
            let offset = self.offset(x, y);
            if visited[offset] || self.pixels[offset] == border {
                continue;
            }
            visited[offset] = true;
            self.pixels[offset] = fill;
            count += 1;
            for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
                if v.contains(nx, ny) && !visited[self.offset(nx, ny)] {
                    stack.push((nx, ny));
                }
            }
        }
        count
    }

    /// Capture a rectangle. It must lie inside the viewport.
    pub fn get(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<Sprite> {
        let rect = Viewport::new(x0, y0, x1, y1);
        let v = self.viewport();
        if !v.contains(rect.left, rect.top) || !v.contains(rect.right, rect.bottom) {
            return Err(error!(IllegalFunctionCall));
        }
        let mut pixels = Vec::with_capacity(rect.width() * rect.height());
        for y in rect.top..=rect.bottom {
            let row = self.offset(rect.left, y);
            pixels.extend_from_slice(&self.pixels[row..row + rect.width()]);
        }
        Ok(Sprite::new(rect.width(), rect.height(), pixels))
    }

    /// Blend a sprite with its top left corner at (x, y), clipped.
    pub fn put(&mut self, x: i32, y: i32, sprite: &Sprite, mode: PutMode) {
        let v = self.viewport();
        let (width, height) = (sprite.width() as i32, sprite.height() as i32);
        let src_x = (v.left - x).max(0)..(v.right + 1 - x).min(width);
        let src_y = (v.top - y).max(0)..(v.bottom + 1 - y).min(height);
        if src_x.is_empty() {
            return;
        }
        for sy in src_y {
            for sx in src_x.clone() {
                let src = sprite.pixels()[(sy * width + sx) as usize];
                let offset = self.offset(x + sx, y + sy);
                mode.blend(src, &mut self.pixels[offset]);
            }
        }
    }
}

/// Minor-axis offset of the `i`th pixel of a Bresenham walk with the given
/// major and minor extents.
fn minor_offset(i: i64, major: i64, minor: i64) -> i64 {
    if major == 0 {
        return 0;
    }
    let (i, major, minor) = (i as i128, major as i128, minor as i128);
    ((2 * minor * i + major - 1) / (2 * major)) as i64
}

/// Midpoint ellipse: offsets with x, y >= 0 from the top of the ellipse
/// around to its right edge. The walk ends once x passes `reach.0`, and
/// axis-aligned degenerate shapes stop at `reach`.
fn ellipse_quadrant(rx: i64, ry: i64, reach: (i64, i64), mut plot: impl FnMut(i64, i64)) {
    if rx == 0 {
        (0..=ry.min(reach.1)).for_each(|y| plot(0, y));
        return;
    }
    if ry == 0 {
        (0..=rx.min(reach.0)).for_each(|x| plot(x, 0));
        return;
    }
    let (rx2, ry2) = ((rx as f64).powi(2), (ry as f64).powi(2));
    let (mut x, mut y) = (0, ry);
    let mut px = 0.0;
    let mut py = 2.0 * rx2 * y as f64;
    let mut p = ry2 - rx2 * ry as f64 + 0.25 * rx2;
    while px < py {
        if x > reach.0 {
            return;
        }
        plot(x, y);
        x += 1;
        px += 2.0 * ry2;
        if p < 0.0 {
            p += ry2 + px;
        } else {
            y -= 1;
            py -= 2.0 * rx2;
            p += ry2 + px - py;
        }
    }
    p = ry2 * (x as f64 + 0.5).powi(2) + rx2 * (y as f64 - 1.0).powi(2) - rx2 * ry2;
    while y >= 0 && x <= reach.0 {
        plot(x, y);
        y -= 1;
        py -= 2.0 * rx2;
        if p > 0.0 {
            p += rx2 - py;
        } else {
            x += 1;
            px += 2.0 * ry2;
            p += rx2 - py + px;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(buf: &GraphicsBuffer) -> usize {
        buf.pixels().iter().filter(|p| **p != 0).count()
    }

    #[test]
    fn test_solid_line() {
        let mut buf = GraphicsBuffer::new(32, 32);
        assert_eq!(buf.line(0, 0, 10, 0, 1, 0xFFFF), 11);
        for x in 0..=10 {
            assert_eq!(buf.pget(x, 0), Some(1));
        }
        assert_eq!(buf.pget(11, 0), Some(0));
    }

    #[test]
    fn test_dashed_line() {
        let mut buf = GraphicsBuffer::new(32, 32);
        assert_eq!(buf.line(0, 0, 10, 0, 1, 0xAAAA), 6);
        assert_eq!(buf.pget(0, 0), Some(1));
        assert_eq!(buf.pget(1, 0), Some(0));
        let mut buf = GraphicsBuffer::new(32, 32);
        // The pattern repeats every 16 pixels.
        assert_eq!(buf.line(0, 0, 0, 20, 1, 0xF000), 8);
        assert_eq!(buf.pget(0, 16), Some(1));
        assert_eq!(buf.pget(0, 20), Some(0));
    }

    #[test]
    fn test_reversed_line_reverses_style() {
        let mut a = GraphicsBuffer::new(32, 32);
        let mut b = GraphicsBuffer::new(32, 32);
        assert_eq!(a.line(0, 5, 19, 5, 1, 0xC000), 4);
        assert_eq!(a.pget(0, 5), Some(1));
        assert_eq!(a.pget(17, 5), Some(1));
        assert_eq!(a.pget(19, 5), Some(0));
        // Walked from x = 0 with 0x0003.
        assert_eq!(b.line(19, 5, 0, 5, 1, 0xC000), 2);
        assert_eq!(b.pget(14, 5), Some(1));
        assert_eq!(b.pget(15, 5), Some(1));
        assert_eq!(b.pget(0, 5), Some(0));
        assert_eq!(b.pget(19, 5), Some(0));
        let mut c = GraphicsBuffer::new(32, 32);
        assert_eq!(c.line(10, 0, 0, 0, 1, 0x8000), 0);
        assert_eq!(c.line(0, 10, 0, 0, 1, 0x0001), 1);
        assert_eq!(c.pget(0, 0), Some(1));
    }

    #[test]
    fn test_far_endpoints_clip() {
        let mut buf = GraphicsBuffer::new(10, 10);
        assert_eq!(buf.line(-2_000_000_000, 0, 2_000_000_000, 0, 1, 0xFFFF), 10);
        assert_eq!(buf.line(i32::MIN, i32::MIN, i32::MAX, i32::MAX, 2, 0xFFFF), 10);
        assert_eq!(buf.pget(3, 3), Some(2));
        assert_eq!(buf.line(5, -2_000_000_000, 5, 2_000_000_000, 3, 0xFFFF), 10);
        // Dash bits stay counted from the true start at x = -5.
        assert_eq!(buf.line(-5, 4, 2_000_000_000, 4, 1, 0x0010), 1);
        assert_eq!(buf.pget(0, 4), Some(0));
        assert_eq!(buf.pget(6, 4), Some(1));
    }

    #[test]
    fn test_diagonal_and_steep() {
        let mut buf = GraphicsBuffer::new(32, 32);
        assert_eq!(buf.line(0, 0, 5, 5, 2, 0xFFFF), 6);
        assert_eq!(buf.pget(3, 3), Some(2));
        let mut buf = GraphicsBuffer::new(32, 32);
        assert_eq!(buf.line(4, 10, 2, 0, 2, 0xFFFF), 11);
        assert_eq!(buf.pget(4, 10), Some(2));
        assert_eq!(buf.pget(2, 0), Some(2));
    }

    #[test]
    fn test_clipping() {
        let mut buf = GraphicsBuffer::new(10, 10);
        assert_eq!(buf.line(-5, 2, 20, 2, 1, 0xFFFF), 10);
        assert!(!buf.pset(10, 0, 1));
        assert_eq!(buf.pget(-1, 0), None);
        buf.set_view(Some(Viewport::new(2, 2, 5, 5))).unwrap();
        buf.filled_rect(0, 0, 9, 9, 3);
        assert_eq!(buf.pixels().iter().filter(|p| **p == 3).count(), 16);
        assert!(buf.set_view(Some(Viewport::new(20, 20, 30, 30))).is_err());
    }

    #[test]
    fn test_rect() {
        let mut buf = GraphicsBuffer::new(16, 16);
        buf.rect(1, 1, 4, 3, 5, 0xFFFF);
        assert_eq!(lit(&buf), 10);
        assert_eq!(buf.pget(2, 2), Some(0));
    }

    #[test]
    fn test_paint_bounded_region() {
        let mut buf = GraphicsBuffer::new(16, 16);
        buf.rect(2, 2, 8, 8, 4, 0xFFFF);
        assert_eq!(buf.paint(5, 5, 1, 4), 25);
        assert_eq!(buf.pget(0, 0), Some(0));
        assert_eq!(buf.pget(2, 5), Some(4));
        // A second fill over the same region touches each pixel once.
        assert_eq!(buf.paint(5, 5, 1, 4), 25);
        // Starting on the border fills nothing.
        assert_eq!(buf.paint(2, 2, 1, 4), 0);
    }

    #[test]
    fn test_paint_stops_at_viewport() {
        let mut buf = GraphicsBuffer::new(16, 16);
        buf.set_view(Some(Viewport::new(0, 0, 3, 3))).unwrap();
        assert_eq!(buf.paint(1, 1, 2, 9), 16);
        buf.set_view(None).unwrap();
        assert_eq!(buf.pget(4, 4), Some(0));
    }

    #[test]
    fn test_circle() {
        let mut buf = GraphicsBuffer::new(64, 64);
        buf.circle(32, 32, 10.0, 1, None, None, 1.0);
        assert_eq!(buf.pget(42, 32), Some(1));
        assert_eq!(buf.pget(22, 32), Some(1));
        assert_eq!(buf.pget(32, 22), Some(1));
        assert_eq!(buf.pget(32, 42), Some(1));
        assert_eq!(buf.pget(32, 32), Some(0));
    }

    #[test]
    fn test_arc_and_radius_lines() {
        let mut buf = GraphicsBuffer::new(64, 64);
        let half_pi = std::f64::consts::FRAC_PI_2;
        buf.circle(32, 32, 10.0, 1, Some(0.0), Some(half_pi), 1.0);
        assert_eq!(buf.pget(42, 32), Some(1));
        assert_eq!(buf.pget(32, 22), Some(1));
        assert_eq!(buf.pget(22, 32), Some(0));
        assert_eq!(buf.pget(32, 42), Some(0));
        let mut buf = GraphicsBuffer::new(64, 64);
        buf.circle(32, 32, 10.0, 1, Some(-0.001), Some(-half_pi), 1.0);
        assert_eq!(buf.pget(32, 32), Some(1));
        assert_eq!(buf.pget(37, 32), Some(1));
        assert_eq!(buf.pget(32, 27), Some(1));
    }

    #[test]
    fn test_ellipse_aspect() {
        let mut buf = GraphicsBuffer::new(64, 64);
        buf.circle(32, 32, 10.0, 1, None, None, 0.5);
        assert_eq!(buf.pget(42, 32), Some(1));
        assert_eq!(buf.pget(32, 27), Some(1));
        assert_eq!(buf.pget(32, 22), Some(0));
    }

    #[test]
    fn test_huge_circle() {
        let mut buf = GraphicsBuffer::new(10, 10);
        buf.circle(5, 5, 1e10, 1, None, None, 1.0);
        assert_eq!(lit(&buf), 0);
        buf.circle(5, 5, 1e10, 1, None, None, 1e-12);
        assert_eq!(buf.pget(5, 5), Some(1));
        // A center far off the buffer with an outline crossing it.
        let mut buf = GraphicsBuffer::new(10, 10);
        buf.circle(-1000, 5, 1005.0, 1, None, None, 1.0);
        assert_eq!(buf.pget(5, 5), Some(1));
    }

    #[test]
    fn test_get_put() {
        let mut buf = GraphicsBuffer::new(16, 16);
        buf.pset(1, 1, 3);
        buf.pset(2, 2, 5);
        let sprite = buf.get(1, 1, 2, 2).unwrap();
        assert_eq!(sprite.pixels(), &[3, 0, 0, 5]);
        buf.put(10, 10, &sprite, PutMode::Pset);
        assert_eq!(buf.pget(10, 10), Some(3));
        assert_eq!(buf.pget(11, 11), Some(5));
        buf.put(10, 10, &sprite, PutMode::Xor);
        assert_eq!(buf.pget(10, 10), Some(0));
        buf.put(15, 15, &sprite, PutMode::Pset);
        assert_eq!(buf.pget(15, 15), Some(3));
        assert!(buf.get(14, 14, 16, 16).is_err());
    }
}
