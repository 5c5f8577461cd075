use super::GraphicsBuffer;
use crate::lang::draw::{DrawCommand, DrawOp};

/// ## DRAW turtle
///
/// Pen position, heading, scale and color persist between DRAW statements.
/// Heading is in degrees counterclockwise; scale is in quarter pixels.

#[derive(Debug, Clone, PartialEq)]
pub struct Turtle {
    x: f64,
    y: f64,
    angle: f64,
    scale: f64,
    color: Option<u8>,
}

impl Default for Turtle {
    fn default() -> Self {
        Turtle {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            scale: 4.0,
            color: None,
        }
    }
}

impl Turtle {
    pub fn new() -> Turtle {
        Turtle::default()
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x as f64;
        self.y = y as f64;
    }

    fn transform(&self, dx: f64, dy: f64) -> (f64, f64) {
        let theta = (-self.angle).to_radians();
        let (sin, cos) = theta.sin_cos();
        let s = self.scale / 4.0;
        (
            self.x + s * (dx * cos - dy * sin),
            self.y + s * (dx * sin + dy * cos),
        )
    }

    pub fn run(&mut self, buffer: &mut GraphicsBuffer, commands: &[DrawCommand], default_color: u8) {
        for command in commands {
            let (x, y) = match command.op {
                DrawOp::Move(direction, distance) => {
                    let (dx, dy) = direction.offset();
                    self.transform(dx * distance, dy * distance)
                }
                DrawOp::MoveXy { x, y, relative } => {
                    if relative {
                        self.transform(x, y)
                    } else {
                        (x, y)
                    }
                }
                DrawOp::SetRotation(n) => {
                    self.angle = n as f64 * 90.0;
                    continue;
                }
                DrawOp::Turn(degrees) => {
                    self.angle = degrees;
                    continue;
                }
                DrawOp::SetColor(color) => {
                    self.color = Some(color);
                    continue;
                }
                DrawOp::SetScale(scale) => {
                    self.scale = scale;
                    continue;
                }
                DrawOp::Paint { fill, border } => {
                    let (x, y) = self.position();
                    buffer.paint(x, y, fill, border);
                    continue;
                }
            };
            if !command.no_draw {
                let (x0, y0) = self.position();
                let color = self.color.unwrap_or(default_color);
                buffer.line(x0, y0, x.round() as i32, y.round() as i32, color, 0xFFFF);
            }
            if !command.return_after {
                self.x = x;
                self.y = y;
            }
        }
    }
}
