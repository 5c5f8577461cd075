use super::{wrap_long, Val};
use crate::error;
use crate::lang::Error;
use chrono::Timelike;

type Result<T> = std::result::Result<T, Error>;

/// ## Built-in functions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Abs,
    Sgn,
    Sqr,
    Sin,
    Cos,
    Tan,
    Atn,
    Exp,
    Log,
    Int,
    Fix,
    Cint,
    Clng,
    Csng,
    Cdbl,
    Len,
    Left,
    Right,
    Mid,
    Chr,
    Asc,
    Str,
    Val,
    Instr,
    Ucase,
    Lcase,
    Ltrim,
    Rtrim,
    Space,
    String,
    Hex,
    Oct,
    Timer,
    Date,
    Time,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        use Builtin::*;
        let builtin = match name {
            "ABS" => Abs,
            "SGN" => Sgn,
            "SQR" => Sqr,
            "SIN" => Sin,
            "COS" => Cos,
            "TAN" => Tan,
            "ATN" => Atn,
            "EXP" => Exp,
            "LOG" => Log,
            "INT" => Int,
            "FIX" => Fix,
            "CINT" => Cint,
            "CLNG" => Clng,
            "CSNG" => Csng,
            "CDBL" => Cdbl,
            "LEN" => Len,
            "LEFT$" => Left,
            "RIGHT$" => Right,
            "MID$" => Mid,
            "CHR$" => Chr,
            "ASC" => Asc,
            "STR$" => Str,
            "VAL" => Val,
            "INSTR" => Instr,
            "UCASE$" => Ucase,
            "LCASE$" => Lcase,
            "LTRIM$" => Ltrim,
            "RTRIM$" => Rtrim,
            "SPACE$" => Space,
            "STRING$" => String,
            "HEX$" => Hex,
            "OCT$" => Oct,
            "TIMER" => Timer,
            "DATE$" => Date,
            "TIME$" => Time,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn arity(self) -> std::ops::RangeInclusive<usize> {
        use Builtin::*;
        match self {
            Timer | Date | Time => 0..=0,
            Left | Right | String => 2..=2,
            Mid => 2..=3,
            Instr => 2..=3,
            _ => 1..=1,
        }
    }
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Builtin::*;
        let s = match self {
            Abs => "ABS",
            Sgn => "SGN",
            Sqr => "SQR",
            Sin => "SIN",
            Cos => "COS",
            Tan => "TAN",
            Atn => "ATN",
            Exp => "EXP",
            Log => "LOG",
            Int => "INT",
            Fix => "FIX",
            Cint => "CINT",
            Clng => "CLNG",
            Csng => "CSNG",
            Cdbl => "CDBL",
            Len => "LEN",
            Left => "LEFT$",
            Right => "RIGHT$",
            Mid => "MID$",
            Chr => "CHR$",
            Asc => "ASC",
            Str => "STR$",
            Val => "VAL",
            Instr => "INSTR",
            Ucase => "UCASE$",
            Lcase => "LCASE$",
            Ltrim => "LTRIM$",
            Rtrim => "RTRIM$",
            Space => "SPACE$",
            String => "STRING$",
            Hex => "HEX$",
            Oct => "OCT$",
            Timer => "TIMER",
            Date => "DATE$",
            Time => "TIME$",
        };
        write!(f, "{}", s)
    }
}

pub struct Function {}

/// Math functions answer in single precision unless given a double.
fn math(val: &Val, f: fn(f64) -> f64) -> Result<Val> {
    let n = f(val.to_f64()?);
    if n.is_nan() {
        return Err(error!(IllegalFunctionCall));
    }
    match val {
        Val::Double(_) => Ok(Val::Double(n)),
        _ => {
            let s = n as f32;
            if s.is_finite() {
                Ok(Val::Single(s))
            } else {
                Err(error!(Overflow))
            }
        }
    }
}

/// INT and FIX keep whole-number types as they are.
fn whole(val: &Val, f: fn(f64) -> f64) -> Result<Val> {
    match val {
        Val::Integer(_) | Val::Long(_) => Ok(val.clone()),
        Val::Double(n) => Ok(Val::Double(f(*n))),
        Val::String(_) | Val::Record(_) => Err(error!(TypeMismatch)),
        _ => Ok(Val::Single(f(val.to_f64()?) as f32)),
    }
}

/// A count or position argument: non-negative and within 32767.
fn count(val: &Val) -> Result<usize> {
    let n = val.to_i32()?;
    if !(0..=32767).contains(&n) {
        return Err(error!(IllegalFunctionCall));
    }
    Ok(n as usize)
}

fn chars(val: &Val) -> Result<Vec<char>> {
    Ok(val.as_str()?.chars().collect())
}

fn arg(args: &[Val], idx: usize) -> Result<&Val> {
    args.get(idx)
        .ok_or_else(|| error!(InternalError; "MISSING ARGUMENT"))
}

/// The numeric prefix of a string as VAL reads it. Blanks are ignored
/// and parsing stops at the first character that cannot continue a number.
pub fn parse_number(s: &str) -> f64 {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let upper = s.to_ascii_uppercase();
    if let Some(hex) = upper.strip_prefix("&H") {
        let digits: String = hex.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
        return i64::from_str_radix(&digits, 16).unwrap_or(0) as f64;
    }
    if let Some(oct) = upper.strip_prefix("&O").or_else(|| upper.strip_prefix('&')) {
        let digits: String = oct.chars().take_while(|c| ('0'..='7').contains(c)).collect();
        return i64::from_str_radix(&digits, 8).unwrap_or(0) as f64;
    }
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes: Vec<char> = upper.chars().collect();
    let mut i = 0;
    if i < bytes.len() && (bytes[i] == '-' || bytes[i] == '+') {
        i += 1;
    }
    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_digit() {
            seen_digit = true;
            end = i + 1;
        } else if c == '.' && !seen_dot && !seen_exp {
            seen_dot = true;
            if seen_digit {
                end = i + 1;
            }
        } else if (c == 'E' || c == 'D') && seen_digit && !seen_exp {
            seen_exp = true;
            if i + 1 < bytes.len() && (bytes[i + 1] == '-' || bytes[i + 1] == '+') {
                i += 1;
            }
        } else {
            break;
        }
        i += 1;
    }
    if !seen_digit {
        return 0.0;
    }
    let text: String = bytes[..end]
        .iter()
        .map(|c| if *c == 'D' { 'E' } else { *c })
        .collect();
    text.parse().unwrap_or(0.0)
}

impl Function {
    pub fn call(builtin: Builtin, args: &[Val]) -> Result<Val> {
        if !builtin.arity().contains(&args.len()) {
            return Err(error!(InternalError; "WRONG NUMBER OF ARGUMENTS"));
        }
        match builtin {
            Builtin::Abs => Function::abs(arg(args, 0)?),
            Builtin::Sgn => {
                let n = arg(args, 0)?.to_f64()?;
                Ok(Val::Integer(if n > 0.0 {
                    1
                } else if n < 0.0 {
                    -1
                } else {
                    0
                }))
            }
            Builtin::Sqr => {
                let v = arg(args, 0)?;
                if v.to_f64()? < 0.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                math(v, f64::sqrt)
            }
            Builtin::Sin => math(arg(args, 0)?, f64::sin),
            Builtin::Cos => math(arg(args, 0)?, f64::cos),
            Builtin::Tan => math(arg(args, 0)?, f64::tan),
            Builtin::Atn => math(arg(args, 0)?, f64::atan),
            Builtin::Exp => math(arg(args, 0)?, f64::exp),
            Builtin::Log => {
                let v = arg(args, 0)?;
                if v.to_f64()? <= 0.0 {
                    return Err(error!(IllegalFunctionCall));
                }
                math(v, f64::ln)
            }
            Builtin::Int => whole(arg(args, 0)?, f64::floor),
            Builtin::Fix => whole(arg(args, 0)?, f64::trunc),
            Builtin::Cint => arg(args, 0)?.to_integer(),
            Builtin::Clng => arg(args, 0)?.to_long(),
            Builtin::Csng => arg(args, 0)?.to_single(),
            Builtin::Cdbl => arg(args, 0)?.to_double(),
            Builtin::Len => Ok(Val::Long(arg(args, 0)?.as_str()?.chars().count() as i32)),
            Builtin::Left => {
                let s = chars(arg(args, 0)?)?;
                let n = count(arg(args, 1)?)?.min(s.len());
                Ok(Val::from(s[..n].iter().collect::<String>()))
            }
            Builtin::Right => {
                let s = chars(arg(args, 0)?)?;
                let n = count(arg(args, 1)?)?.min(s.len());
                Ok(Val::from(
                    s[s.len() - n..].iter().collect::<String>(),
                ))
            }
            Builtin::Mid => {
                let s = chars(arg(args, 0)?)?;
                let start = count(arg(args, 1)?)?;
                if start == 0 {
                    return Err(error!(IllegalFunctionCall));
                }
                let len = match args.get(2) {
                    Some(v) => count(v)?,
                    None => s.len(),
                };
                let from = (start - 1).min(s.len());
                let to = from.saturating_add(len).min(s.len());
                Ok(Val::from(s[from..to].iter().collect::<String>()))
            }
            Builtin::Chr => {
                let n = arg(args, 0)?.to_i32()?;
                match u8::try_from(n) {
                    Ok(b) => Ok(Val::from((b as char).to_string())),
                    Err(_) => Err(error!(IllegalFunctionCall)),
                }
            }
            Builtin::Asc => match arg(args, 0)?.as_str()?.chars().next() {
                Some(c) => Ok(Val::Integer(c as u32 as i16)),
                None => Err(error!(IllegalFunctionCall)),
            },
            Builtin::Str => Ok(Val::from(arg(args, 0)?.str_format()?)),
            Builtin::Val => Ok(Val::Double(parse_number(arg(args, 0)?.as_str()?))),
            Builtin::Instr => Function::instr(args),
            Builtin::Ucase => Ok(Val::from(arg(args, 0)?.as_str()?.to_ascii_uppercase())),
            Builtin::Lcase => Ok(Val::from(arg(args, 0)?.as_str()?.to_ascii_lowercase())),
            Builtin::Ltrim => Ok(Val::from(arg(args, 0)?.as_str()?.trim_start_matches(' '))),
            Builtin::Rtrim => Ok(Val::from(arg(args, 0)?.as_str()?.trim_end_matches(' '))),
            Builtin::Space => Ok(Val::from(" ".repeat(count(arg(args, 0)?)?))),
            Builtin::String => {
                let n = count(arg(args, 0)?)?;
                let fill = match arg(args, 1)? {
                    Val::String(s) => match s.chars().next() {
                        Some(c) => c,
                        None => return Err(error!(IllegalFunctionCall)),
                    },
                    v => match u8::try_from(v.to_i32()?) {
                        Ok(b) => b as char,
                        Err(_) => return Err(error!(IllegalFunctionCall)),
                    },
                };
                Ok(Val::from(std::iter::repeat(fill).take(n).collect::<String>()))
            }
            Builtin::Hex => Ok(Val::from(match arg(args, 0)? {
                Val::Integer(n) => format!("{:X}", *n as u16),
                v => format!("{:X}", wrap_long(v.to_f64()?)? as u32),
            })),
            Builtin::Oct => Ok(Val::from(match arg(args, 0)? {
                Val::Integer(n) => format!("{:o}", *n as u16),
                v => format!("{:o}", wrap_long(v.to_f64()?)? as u32),
            })),
            Builtin::Timer => {
                let now = chrono::Local::now();
                let secs = now.num_seconds_from_midnight() as f64
                    + now.nanosecond().min(999_999_999) as f64 / 1e9;
                Ok(Val::Single(secs as f32))
            }
            Builtin::Date => Ok(Val::from(chrono::Local::now().format("%m-%d-%Y").to_string())),
            Builtin::Time => Ok(Val::from(chrono::Local::now().format("%H:%M:%S").to_string())),
        }
    }

    fn abs(val: &Val) -> Result<Val> {
        use Val::*;
        match val {
            Null => Ok(Single(0.0)),
            Integer(n) => n.checked_abs().map(Integer).ok_or_else(|| error!(Overflow)),
            Long(n) => n.checked_abs().map(Long).ok_or_else(|| error!(Overflow)),
            Single(n) => Ok(Single(n.abs())),
            Double(n) => Ok(Double(n.abs())),
            String(_) | Record(_) => Err(error!(TypeMismatch)),
        }
    }

    /// INSTR([start,] haystack, needle) counting from 1; 0 when absent.
    fn instr(args: &[Val]) -> Result<Val> {
        let (start, hay, needle) = if args.len() == 3 {
            (count(arg(args, 0)?)?, arg(args, 1)?, arg(args, 2)?)
        } else {
            (1, arg(args, 0)?, arg(args, 1)?)
        };
        if start == 0 {
            return Err(error!(IllegalFunctionCall));
        }
        let hay = chars(hay)?;
        let needle = chars(needle)?;
        if start > hay.len() {
            return Ok(Val::Integer(0));
        }
        if needle.is_empty() {
            return Ok(Val::Integer(start as i16));
        }
        let found = hay[start - 1..]
            .windows(needle.len())
            .position(|w| w == needle.as_slice());
        Ok(Val::Integer(match found {
            Some(pos) => (pos + start) as i16,
            None => 0,
        }))
    }
}

/// ## Random number generator
///
/// The 24-bit linear congruential generator of the classic interpreters,
/// reproduced exactly so seeded programs replay the same sequence.

#[derive(Debug, Clone)]
pub struct Rnd {
    seed: u32,
}

impl Default for Rnd {
    fn default() -> Rnd {
        Rnd { seed: 327680 }
    }
}

impl Rnd {
    fn advance(&mut self) {
        self.seed = ((self.seed as u64 * 16598013 + 12820163) & 0xFFFFFF) as u32;
    }

    fn value(&self) -> f32 {
        (self.seed as f64 / 16777216.0) as f32
    }

    /// RND with an optional argument. Positive or absent gives the next
    /// value, zero repeats the last one and negative reseeds first.
    pub fn rnd(&mut self, arg: Option<f32>) -> f32 {
        let n = arg.unwrap_or(1.0);
        if n != 0.0 {
            if n < 0.0 {
                let bits = n.to_bits();
                self.seed = (bits & 0xFFFFFF) + (bits >> 24);
            }
            self.advance();
        }
        self.value()
    }

    /// RANDOMIZE n folds the high word of the double into the seed.
    pub fn randomize(&mut self, n: f64) {
        let high = (n.to_bits() >> 32) as u32;
        let mixed = (high ^ (high >> 16)) & 0xFFFF;
        self.seed = (self.seed & 0xFF) | (mixed << 8);
    }

    /// RANDOMIZE without an argument.
    pub fn randomize_entropy(&mut self) {
        self.seed = rand::random::<u32>() & 0xFFFFFF;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    fn call(b: Builtin, args: &[Val]) -> Val {
        Function::call(b, args).unwrap()
    }

    #[test]
    fn test_reference_sequence() {
        let mut r = Rnd::default();
        assert_eq!(r.rnd(None), 0.7055475115776062f32);
        assert_eq!(r.rnd(Some(1.0)), 0.5334240198135376f32);
        assert_eq!(r.rnd(Some(0.0)), 0.5334240198135376f32);
    }

    #[test]
    fn test_negative_reseeds_repeatably() {
        let mut a = Rnd::default();
        let mut b = Rnd::default();
        b.rnd(None);
        b.rnd(None);
        assert_eq!(a.rnd(Some(-3.0)), b.rnd(Some(-3.0)));
    }

    #[test]
    fn test_math() {
        assert_eq!(call(Builtin::Sqr, &[Val::Integer(16)]), Val::Single(4.0));
        assert_eq!(call(Builtin::Sqr, &[Val::Double(2.25)]), Val::Double(1.5));
        assert_eq!(call(Builtin::Int, &[Val::Single(-2.5)]), Val::Single(-3.0));
        assert_eq!(call(Builtin::Fix, &[Val::Single(-2.5)]), Val::Single(-2.0));
        assert_eq!(call(Builtin::Sgn, &[Val::Double(-0.1)]), Val::Integer(-1));
        assert_eq!(call(Builtin::Abs, &[Val::Integer(-5)]), Val::Integer(5));
        assert_eq!(call(Builtin::Cint, &[Val::Single(40000.0)]), Val::Integer(-25536));
        let e = Function::call(Builtin::Log, &[Val::Integer(0)]).unwrap_err();
        assert!(e.is(ErrorCode::IllegalFunctionCall));
        let e = Function::call(Builtin::Sqr, &[Val::Integer(-1)]).unwrap_err();
        assert!(e.is(ErrorCode::IllegalFunctionCall));
    }

    #[test]
    fn test_strings() {
        let s = Val::from("HELLO WORLD");
        assert_eq!(call(Builtin::Len, &[s.clone()]), Val::Long(11));
        assert_eq!(call(Builtin::Left, &[s.clone(), Val::Integer(5)]), Val::from("HELLO"));
        assert_eq!(call(Builtin::Right, &[s.clone(), Val::Integer(50)]), s);
        assert_eq!(
            call(Builtin::Mid, &[s.clone(), Val::Integer(7), Val::Integer(3)]),
            Val::from("WOR")
        );
        assert_eq!(call(Builtin::Mid, &[s.clone(), Val::Integer(20)]), Val::from(""));
        assert_eq!(
            call(Builtin::Instr, &[s.clone(), Val::from("O")]),
            Val::Integer(5)
        );
        assert_eq!(
            call(Builtin::Instr, &[Val::Integer(6), s.clone(), Val::from("O")]),
            Val::Integer(8)
        );
        assert_eq!(call(Builtin::Chr, &[Val::Integer(65)]), Val::from("A"));
        assert_eq!(call(Builtin::Asc, &[Val::from("a")]), Val::Integer(97));
        assert!(Function::call(Builtin::Asc, &[Val::from("")]).is_err());
        assert!(Function::call(Builtin::Chr, &[Val::Integer(256)]).is_err());
        assert_eq!(
            call(Builtin::String, &[Val::Integer(3), Val::from("*")]),
            Val::from("***")
        );
        assert_eq!(call(Builtin::Ltrim, &[Val::from("  x ")]), Val::from("x "));
        assert_eq!(call(Builtin::Ucase, &[Val::from("abc")]), Val::from("ABC"));
    }

    #[test]
    fn test_number_conversions() {
        assert_eq!(call(Builtin::Str, &[Val::Single(3.5)]), Val::from(" 3.5"));
        assert_eq!(call(Builtin::Str, &[Val::Integer(-2)]), Val::from("-2"));
        assert_eq!(call(Builtin::Val, &[Val::from(" 1 2.5E1xyz")]), Val::Double(125.0));
        assert_eq!(call(Builtin::Val, &[Val::from("&HFF")]), Val::Double(255.0));
        assert_eq!(call(Builtin::Val, &[Val::from("abc")]), Val::Double(0.0));
        assert_eq!(call(Builtin::Hex, &[Val::Integer(-1)]), Val::from("FFFF"));
        assert_eq!(call(Builtin::Hex, &[Val::Long(255)]), Val::from("FF"));
        assert_eq!(call(Builtin::Oct, &[Val::Integer(8)]), Val::from("10"));
    }

    #[test]
    fn test_names() {
        assert_eq!(Builtin::from_name("MID$"), Some(Builtin::Mid));
        assert_eq!(Builtin::Mid.to_string(), "MID$");
        assert_eq!(Builtin::from_name("NOPE"), None);
    }
}
