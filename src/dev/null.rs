use super::{Device, LineShape, Point, View};
use crate::error;
use crate::gfx::{PutMode, Sprite};
use crate::lang::draw::DrawCommand;
use crate::lang::Error;
use std::task::Poll;

type Result<T> = std::result::Result<T, Error>;

/// A device that refuses every call. Programs that touch no console or
/// graphics run against it unchanged.
#[derive(Debug, Default)]
pub struct NullDevice {}

fn refuse<T>() -> Result<T> {
    Err(error!(InternalError; "NO DEVICE"))
}

impl Device for NullDevice {
    fn print(&mut self, _text: &str) -> Result<()> {
        refuse()
    }
    fn input(&mut self) -> Result<Poll<String>> {
        refuse()
    }
    fn inkey(&mut self) -> Result<String> {
        refuse()
    }
    fn inkey_wait(&mut self, _n: usize) -> Result<Poll<String>> {
        refuse()
    }
    fn colors(&self) -> Result<(u8, u8)> {
        refuse()
    }
    fn set_colors(&mut self, _fg: Option<u8>, _bg: Option<u8>) -> Result<()> {
        refuse()
    }
    fn pen(&self) -> Result<Point> {
        refuse()
    }
    fn pset(&mut self, _at: Point, _color: Option<u8>) -> Result<()> {
        refuse()
    }
    fn preset(&mut self, _at: Point, _color: Option<u8>) -> Result<()> {
        refuse()
    }
    fn point(&self, _at: Point) -> Result<i32> {
        refuse()
    }
    fn line(
        &mut self,
        _from: Option<Point>,
        _to: Point,
        _color: Option<u8>,
        _shape: LineShape,
        _style: u16,
    ) -> Result<()> {
        refuse()
    }
    fn circle(
        &mut self,
        _center: Point,
        _radius: f64,
        _color: Option<u8>,
        _start: Option<f64>,
        _end: Option<f64>,
        _aspect: Option<f64>,
    ) -> Result<()> {
        refuse()
    }
    fn paint(&mut self, _at: Point, _fill: Option<u8>, _border: Option<u8>) -> Result<usize> {
        refuse()
    }
    fn draw(&mut self, _commands: &[DrawCommand]) -> Result<()> {
        refuse()
    }
    fn get_graphics(&mut self, _from: Point, _to: Point) -> Result<Sprite> {
        refuse()
    }
    fn put_graphics(&mut self, _at: Point, _sprite: &Sprite, _mode: PutMode) -> Result<()> {
        refuse()
    }
    fn locate(&mut self, _row: Option<u16>, _column: Option<u16>) -> Result<()> {
        refuse()
    }
    fn screen(
        &mut self,
        _mode: u8,
        _color_switch: Option<u8>,
        _active_page: Option<u8>,
        _visible_page: Option<u8>,
    ) -> Result<()> {
        refuse()
    }
    fn screen_lines(&self) -> Result<u16> {
        refuse()
    }
    fn set_view(&mut self, _view: Option<View>) -> Result<()> {
        refuse()
    }
    fn set_view_print(&mut self, _rows: Option<(u16, u16)>) -> Result<()> {
        refuse()
    }
    fn reset_palette(&mut self) -> Result<()> {
        refuse()
    }
    fn set_palette(&mut self, _attribute: u8, _color: u32) -> Result<()> {
        refuse()
    }
    fn sleep(&mut self, _seconds: Option<f64>) -> Result<Poll<()>> {
        refuse()
    }
    fn cls(&mut self) -> Result<()> {
        refuse()
    }
    fn cls_graphics(&mut self) -> Result<()> {
        refuse()
    }
    fn cls_text(&mut self) -> Result<()> {
        refuse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_every_call_fails() {
        let mut d = NullDevice::default();
        assert!(d.print("X").unwrap_err().is(ErrorCode::InternalError));
        assert!(d.pset(Point::new(0, 0), None).is_err());
        assert!(d.input().is_err());
        assert!(d.screen_lines().is_err());
        assert!(d.cls_text().is_err());
    }
}
