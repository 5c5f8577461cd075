use crate::error;
use crate::lang::Error;
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// ## Scalar values
///
/// The payload of a stack slot or of one array element. Numbers follow the
/// 16-bit/32-bit/single/double model of the classic interpreters.

#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Null,
    Integer(i16),
    Long(i32),
    Single(f32),
    Double(f64),
    String(Rc<str>),
    Record(Box<Record>),
}

/// ## Declared types
///
/// `Any` is the type of an untyped slot (temporaries and freshly grown
/// stack). Every other type normalizes values stored into it.

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Any,
    Integer,
    Long,
    Single,
    Double,
    String,
    FixedString(u16),
    Record(Rc<RecordType>),
}

#[derive(Debug, PartialEq)]
pub struct RecordType {
    pub name: Rc<str>,
    pub fields: Vec<(Rc<str>, Type)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: Rc<RecordType>,
    fields: Vec<Val>,
}

impl Record {
    pub fn new(ty: &Rc<RecordType>) -> Record {
        Record {
            ty: Rc::clone(ty),
            fields: ty.fields.iter().map(|(_, t)| t.zero()).collect(),
        }
    }

    pub fn ty(&self) -> &Rc<RecordType> {
        &self.ty
    }

    pub fn fields(&self) -> &[Val] {
        &self.fields
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Val {
        Val::String(s.into())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Val {
        Val::String(s.into())
    }
}

/// Round half to even, the rounding CINT and CLNG use.
pub fn round_even(x: f64) -> f64 {
    let r = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        r
    }
}

/// Round then wrap into 16-bit twos-complement range.
pub fn wrap_integer(x: f64) -> Result<i16> {
    if !x.is_finite() {
        return Err(error!(Overflow));
    }
    let w = round_even(x).rem_euclid(65536.0);
    let n = if w >= 32768.0 { w - 65536.0 } else { w };
    Ok(n as i16)
}

/// Round then wrap into 32-bit twos-complement range.
pub fn wrap_long(x: f64) -> Result<i32> {
    if !x.is_finite() {
        return Err(error!(Overflow));
    }
    let w = round_even(x).rem_euclid(4294967296.0);
    let n = if w >= 2147483648.0 { w - 4294967296.0 } else { w };
    Ok(n as i32)
}

impl Type {
    pub fn zero(&self) -> Val {
        match self {
            Type::Any => Val::Null,
            Type::Integer => Val::Integer(0),
            Type::Long => Val::Long(0),
            Type::Single => Val::Single(0.0),
            Type::Double => Val::Double(0.0),
            Type::String => Val::String("".into()),
            Type::FixedString(len) => Val::String(" ".repeat(*len as usize).into()),
            Type::Record(rt) => Val::Record(Box::new(Record::new(rt))),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Integer | Type::Long | Type::Single | Type::Double
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::String | Type::FixedString(_))
    }

    /// Normalize a value so its payload matches this type.
    pub fn coerce(&self, val: Val) -> Result<Val> {
        match self {
            Type::Any => Ok(val),
            Type::Integer => val.to_integer(),
            Type::Long => val.to_long(),
            Type::Single => val.to_single(),
            Type::Double => val.to_double(),
            Type::String => match val {
                Val::String(_) => Ok(val),
                Val::Null => Ok(Val::String("".into())),
                _ => Err(error!(TypeMismatch)),
            },
            Type::FixedString(len) => {
                let len = *len as usize;
                let s = match &val {
                    Val::String(s) => s.clone(),
                    Val::Null => "".into(),
                    _ => return Err(error!(TypeMismatch)),
                };
                let mut fixed: String = s.chars().take(len).collect();
                while fixed.chars().count() < len {
                    fixed.push(' ');
                }
                Ok(Val::String(fixed.into()))
            }
            Type::Record(rt) => match val {
                Val::Record(r) if r.ty.name == rt.name => Ok(Val::Record(r)),
                Val::Null => Ok(self.zero()),
                _ => Err(error!(TypeMismatch)),
            },
        }
    }
}

impl Val {
    pub fn ty(&self) -> Type {
        match self {
            Val::Null => Type::Any,
            Val::Integer(_) => Type::Integer,
            Val::Long(_) => Type::Long,
            Val::Single(_) => Type::Single,
            Val::Double(_) => Type::Double,
            Val::String(_) => Type::String,
            Val::Record(r) => Type::Record(Rc::clone(&r.ty)),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Val::Null | Val::Integer(_) | Val::Long(_) | Val::Single(_) | Val::Double(_)
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Val::String(_))
    }

    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Val::Null => Ok(0.0),
            Val::Integer(n) => Ok(*n as f64),
            Val::Long(n) => Ok(*n as f64),
            Val::Single(n) => Ok(*n as f64),
            Val::Double(n) => Ok(*n),
            Val::String(_) | Val::Record(_) => Err(error!(TypeMismatch)),
        }
    }

    /// Whole-number view used for subscripts, colors and counts.
    pub fn to_i32(&self) -> Result<i32> {
        match self {
            Val::Integer(n) => Ok(*n as i32),
            Val::Long(n) => Ok(*n),
            _ => {
                let n = round_even(self.to_f64()?);
                if n.is_finite() && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
                    Ok(n as i32)
                } else {
                    Err(error!(Overflow))
                }
            }
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Val::String(s) => Ok(s),
            Val::Null => Ok(""),
            _ => Err(error!(TypeMismatch)),
        }
    }

    /// Numeric truth: any non-zero value is true.
    pub fn is_true(&self) -> Result<bool> {
        Ok(self.to_f64()? != 0.0)
    }

    pub fn to_integer(&self) -> Result<Val> {
        match self {
            Val::Integer(_) => Ok(self.clone()),
            _ => Ok(Val::Integer(wrap_integer(self.to_f64()?)?)),
        }
    }

    pub fn to_long(&self) -> Result<Val> {
        match self {
            Val::Long(_) => Ok(self.clone()),
            _ => Ok(Val::Long(wrap_long(self.to_f64()?)?)),
        }
    }

    pub fn to_single(&self) -> Result<Val> {
        match self {
            Val::Single(_) => Ok(self.clone()),
            _ => Ok(Val::Single(self.to_f64()? as f32)),
        }
    }

    pub fn to_double(&self) -> Result<Val> {
        match self {
            Val::Double(_) => Ok(self.clone()),
            _ => Ok(Val::Double(self.to_f64()?)),
        }
    }

    /// Number as PRINT shows it: a sign position in front and one space
    /// behind. Strings print unchanged.
    pub fn print_format(&self) -> String {
        match self {
            Val::String(s) => s.to_string(),
            _ => {
                let s = self.to_string();
                if s.starts_with('-') {
                    format!("{} ", s)
                } else {
                    format!(" {} ", s)
                }
            }
        }
    }

    /// Number as STR$ returns it: a sign position but no trailing space.
    pub fn str_format(&self) -> Result<String> {
        if !self.is_numeric() {
            return Err(error!(TypeMismatch));
        }
        let s = self.to_string();
        if s.starts_with('-') {
            Ok(s)
        } else {
            Ok(format!(" {}", s))
        }
    }

    pub fn field(&self, path: &[usize]) -> Result<&Val> {
        match path.split_first() {
            None => Ok(self),
            Some((first, rest)) => match self {
                Val::Record(r) => match r.fields.get(*first) {
                    Some(v) => v.field(rest),
                    None => Err(error!(InternalError; "NO SUCH FIELD")),
                },
                _ => Err(error!(InternalError; "NOT A RECORD")),
            },
        }
    }

    /// Resolve a field path for writing. Returns the field and its
    /// declared type so the caller can normalize what it stores.
    pub fn field_mut(&mut self, path: &[usize]) -> Result<(&mut Val, Type)> {
        let (first, rest) = match path.split_first() {
            Some(split) => split,
            None => return Err(error!(InternalError; "EMPTY FIELD PATH")),
        };
        let record = match self {
            Val::Record(r) => r,
            _ => return Err(error!(InternalError; "NOT A RECORD")),
        };
        let field_type = match record.ty.fields.get(*first) {
            Some((_, t)) => t.clone(),
            None => return Err(error!(InternalError; "NO SUCH FIELD")),
        };
        let field = match record.fields.get_mut(*first) {
            Some(f) => f,
            None => return Err(error!(InternalError; "NO SUCH FIELD")),
        };
        if rest.is_empty() {
            Ok((field, field_type))
        } else {
            field.field_mut(rest)
        }
    }
}

fn format_float(sci: &str, digits: i32, exp_char: char) -> String {
    let (mantissa, exp) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci.to_string(),
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let negative = mantissa.starts_with('-');
    let all: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let sig = all.trim_end_matches('0');
    if sig.is_empty() {
        return "0".to_string();
    }
    let n = sig.len() as i32;
    let mut s = String::new();
    if negative {
        s.push('-');
    }
    if exp >= digits || (exp < 0 && -exp - 1 + n > digits) {
        s.push_str(&sig[..1]);
        if n > 1 {
            s.push('.');
            s.push_str(&sig[1..]);
        }
        s.push(exp_char);
        s.push(if exp < 0 { '-' } else { '+' });
        s.push_str(&format!("{:02}", exp.abs()));
    } else if exp < 0 {
        s.push('.');
        for _ in 0..(-exp - 1) {
            s.push('0');
        }
        s.push_str(sig);
    } else {
        let int_len = (exp + 1) as usize;
        if sig.len() <= int_len {
            s.push_str(sig);
            for _ in sig.len()..int_len {
                s.push('0');
            }
        } else {
            s.push_str(&sig[..int_len]);
            s.push('.');
            s.push_str(&sig[int_len..]);
        }
    }
    s
}

impl std::fmt::Display for Val {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Val::*;
        match self {
            Null => write!(f, "0"),
            Integer(n) => write!(f, "{}", n),
            Long(n) => write!(f, "{}", n),
            Single(n) => {
                if *n == 0.0 {
                    return write!(f, "0");
                }
                write!(f, "{}", format_float(&format!("{:.6e}", n), 7, 'E'))
            }
            Double(n) => {
                if *n == 0.0 {
                    return write!(f, "0");
                }
                write!(f, "{}", format_float(&format!("{:.15e}", n), 16, 'D'))
            }
            String(s) => write!(f, "{}", s),
            Record(r) => write!(f, "<{}>", r.ty.name),
        }
    }
}
