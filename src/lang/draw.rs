use super::Error;

type Result<T> = std::result::Result<T, Error>;

/// ## DRAW command language
///
/// A DRAW string is a sequence of turtle commands. Movement letters take an
/// optional distance, `M` takes a coordinate pair, and any command may be
/// prefixed by `B` (move without drawing) or `N` (return to the starting
/// point when done).
///
/// `"BM100,100 C4 R20 D20 L20 U20 TA45 NE10"`

pub fn parse(s: &str) -> Result<Vec<DrawCommand>> {
    DrawParser {
        chars: s.chars().peekable(),
    }
    .commands()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpRight,
    DownRight,
    DownLeft,
    UpLeft,
}

impl Direction {
    /// Unit offset in screen coordinates, y growing downwards.
    pub fn offset(self) -> (f64, f64) {
        use Direction::*;
        match self {
            Up => (0.0, -1.0),
            Down => (0.0, 1.0),
            Left => (-1.0, 0.0),
            Right => (1.0, 0.0),
            UpRight => (1.0, -1.0),
            DownRight => (1.0, 1.0),
            DownLeft => (-1.0, 1.0),
            UpLeft => (-1.0, -1.0),
        }
    }

    fn from_letter(ch: char) -> Option<Direction> {
        use Direction::*;
        match ch {
            'U' => Some(Up),
            'D' => Some(Down),
            'L' => Some(Left),
            'R' => Some(Right),
            'E' => Some(UpRight),
            'F' => Some(DownRight),
            'G' => Some(DownLeft),
            'H' => Some(UpLeft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Move(Direction, f64),
    MoveXy { x: f64, y: f64, relative: bool },
    SetRotation(u8),
    Turn(f64),
    SetColor(u8),
    SetScale(f64),
    Paint { fill: u8, border: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub op: DrawOp,
    pub no_draw: bool,
    pub return_after: bool,
}

impl DrawCommand {
    pub fn new(op: DrawOp) -> DrawCommand {
        DrawCommand {
            op,
            no_draw: false,
            return_after: false,
        }
    }
}

struct DrawParser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

fn invalid() -> Error {
    error!(IllegalFunctionCall; "INVALID DRAW COMMAND")
}

impl<'a> DrawParser<'a> {
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.chars.peek() {
            if *ch == ' ' || *ch == '\t' || *ch == ';' {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    fn next_upper(&mut self) -> Option<char> {
        self.chars.next().map(|c| c.to_ascii_uppercase())
    }

    fn commands(&mut self) -> Result<Vec<DrawCommand>> {
        let mut commands = vec![];
        let mut no_draw = false;
        let mut return_after = false;
        loop {
            self.skip_whitespace();
            let ch = match self.next_upper() {
                Some(ch) => ch,
                None => break,
            };
            let op = match ch {
                'B' => {
                    no_draw = true;
                    continue;
                }
                'N' => {
                    return_after = true;
                    continue;
                }
                'M' => self.move_xy()?,
                'A' => {
                    let n = self.number()?.ok_or_else(invalid)?;
                    if !(0.0..=3.0).contains(&n) {
                        return Err(invalid());
                    }
                    DrawOp::SetRotation(n as u8)
                }
                'T' => match self.next_upper() {
                    Some('A') => {
                        let degrees = self.signed_number()?.ok_or_else(invalid)?;
                        if !(-360.0..=360.0).contains(&degrees) {
                            return Err(invalid());
                        }
                        DrawOp::Turn(degrees)
                    }
                    _ => return Err(invalid()),
                },
                'C' => DrawOp::SetColor(self.byte()?),
                'S' => {
                    let n = self.number()?.ok_or_else(invalid)?;
                    if !(1.0..=255.0).contains(&n) {
                        return Err(invalid());
                    }
                    DrawOp::SetScale(n)
                }
                'P' => {
                    let fill = self.byte()?;
                    self.skip_whitespace();
                    if self.chars.next() != Some(',') {
                        return Err(invalid());
                    }
                    let border = self.byte()?;
                    DrawOp::Paint { fill, border }
                }
                _ => match Direction::from_letter(ch) {
                    Some(direction) => DrawOp::Move(direction, self.number()?.unwrap_or(1.0)),
                    None => return Err(invalid()),
                },
            };
            commands.push(DrawCommand {
                op,
                no_draw,
                return_after,
            });
            no_draw = false;
            return_after = false;
        }
        if no_draw || return_after {
            return Err(invalid());
        }
        Ok(commands)
    }

    fn move_xy(&mut self) -> Result<DrawOp> {
        self.skip_whitespace();
        let relative = matches!(self.chars.peek(), Some('+') | Some('-'));
        let x = self.signed_number()?.ok_or_else(invalid)?;
        self.skip_whitespace();
        if self.chars.next() != Some(',') {
            return Err(invalid());
        }
        let y = self.signed_number()?.ok_or_else(invalid)?;
        Ok(DrawOp::MoveXy { x, y, relative })
    }

    fn byte(&mut self) -> Result<u8> {
        match self.number()? {
            Some(n) if n <= 255.0 => Ok(n as u8),
            _ => Err(invalid()),
        }
    }

    fn signed_number(&mut self) -> Result<Option<f64>> {
        self.skip_whitespace();
        let negative = match self.chars.peek() {
            Some('-') => {
                self.chars.next();
                true
            }
            Some('+') => {
                self.chars.next();
                false
            }
            _ => false,
        };
        match self.number()? {
            Some(n) if negative => Ok(Some(-n)),
            Some(n) => Ok(Some(n)),
            None if negative => Err(invalid()),
            None => Ok(None),
        }
    }

    fn number(&mut self) -> Result<Option<f64>> {
        self.skip_whitespace();
        let mut s = String::new();
        while let Some(ch) = self.chars.peek() {
            if ch.is_ascii_digit() {
                s.push(*ch);
                self.chars.next();
            } else {
                break;
            }
        }
        if s.is_empty() {
            return Ok(None);
        }
        match s.parse::<f64>() {
            Ok(n) => Ok(Some(n)),
            Err(_) => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_with_and_without_distance() {
        let cmds = parse("u10 R").unwrap();
        assert_eq!(
            cmds,
            vec![
                DrawCommand::new(DrawOp::Move(Direction::Up, 10.0)),
                DrawCommand::new(DrawOp::Move(Direction::Right, 1.0)),
            ]
        );
    }

    #[test]
    fn test_prefixes_apply_to_next_command_only() {
        let cmds = parse("BM10,20 NE5 F5").unwrap();
        assert_eq!(cmds.len(), 3);
        assert!(cmds[0].no_draw && !cmds[0].return_after);
        assert_eq!(
            cmds[0].op,
            DrawOp::MoveXy {
                x: 10.0,
                y: 20.0,
                relative: false
            }
        );
        assert!(!cmds[1].no_draw && cmds[1].return_after);
        assert!(!cmds[2].no_draw && !cmds[2].return_after);
    }

    #[test]
    fn test_relative_move() {
        let cmds = parse("M+5,-7").unwrap();
        assert_eq!(
            cmds[0].op,
            DrawOp::MoveXy {
                x: 5.0,
                y: -7.0,
                relative: true
            }
        );
    }

    #[test]
    fn test_turn_color_scale_paint() {
        let cmds = parse("TA-45;C4;S8;A2;P1,4").unwrap();
        let ops: Vec<DrawOp> = cmds.into_iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![
                DrawOp::Turn(-45.0),
                DrawOp::SetColor(4),
                DrawOp::SetScale(8.0),
                DrawOp::SetRotation(2),
                DrawOp::Paint { fill: 1, border: 4 },
            ]
        );
    }

    #[test]
    fn test_malformed_commands() {
        for bad in &["Q", "M10", "A4", "TX", "P1", "C", "B", "M-,5", "C300"] {
            let err = parse(bad).unwrap_err();
            assert_eq!(err.to_string(), "ILLEGAL FUNCTION CALL; INVALID DRAW COMMAND");
        }
    }
}
