use super::{wrap_integer, wrap_long, Type, Val};
use crate::error;
use crate::lang::Error;
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, Error>;

/// ## Expression operations
///
/// Arithmetic keeps the type of the left operand and wraps on overflow.
/// DIV and POW always produce a double, IDIV and MOD a long.

pub struct Operation {}

/// Type an arithmetic result takes. An absent left operand defers to the right.
fn result_type(lhs: &Val, rhs: &Val) -> Type {
    match (lhs, rhs) {
        (Val::Null, Val::Null) => Type::Single,
        (Val::Null, r) => r.ty(),
        (l, _) => l.ty(),
    }
}

fn numeric(ty: Type, n: f64) -> Result<Val> {
    match ty {
        Type::Integer => Ok(Val::Integer(wrap_integer(n)?)),
        Type::Long => Ok(Val::Long(wrap_long(n)?)),
        Type::Double => {
            if n.is_finite() {
                Ok(Val::Double(n))
            } else {
                Err(error!(Overflow))
            }
        }
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

fn arithmetic(lhs: &Val, rhs: &Val, f: fn(f64, f64) -> f64) -> Result<Val> {
    if lhs.is_string() || rhs.is_string() {
        return Err(error!(TypeMismatch));
    }
    let n = f(lhs.to_f64()?, rhs.to_f64()?);
    numeric(result_type(lhs, rhs), n)
}

fn compare(lhs: &Val, rhs: &Val) -> Result<Ordering> {
    match (lhs, rhs) {
        (Val::String(l), Val::String(r)) => Ok(l.cmp(r)),
        (Val::String(_), _) | (_, Val::String(_)) => Err(error!(TypeMismatch)),
        _ => {
            let (l, r) = (lhs.to_f64()?, rhs.to_f64()?);
            l.partial_cmp(&r).ok_or_else(|| error!(Overflow))
        }
    }
}

fn truth(b: bool) -> Val {
    Val::Integer(if b { -1 } else { 0 })
}

/// Logical operators work bitwise on whole numbers. Two integers give an
/// integer, anything wider gives a long.
fn logical(lhs: &Val, rhs: &Val, f: fn(i32, i32) -> i32) -> Result<Val> {
    let narrow = |v: &Val| matches!(v, Val::Integer(_) | Val::Null);
    let l = wrap_long(lhs.to_f64()?)?;
    let r = wrap_long(rhs.to_f64()?)?;
    if narrow(lhs) && narrow(rhs) {
        Ok(Val::Integer(f(l, r) as i16))
    } else {
        Ok(Val::Long(f(l, r)))
    }
}

fn whole(val: &Val) -> Result<i32> {
    if val.is_string() {
        return Err(error!(TypeMismatch));
    }
    wrap_long(val.to_f64()?)
}

impl Operation {
    pub fn negate(val: &Val) -> Result<Val> {
        use Val::*;
        match val {
            Null => Ok(Single(0.0)),
            Integer(n) => Ok(Integer(n.wrapping_neg())),
            Long(n) => Ok(Long(n.wrapping_neg())),
            Single(n) => Ok(Single(-n)),
            Double(n) => Ok(Double(-n)),
            String(_) | Record(_) => Err(error!(TypeMismatch)),
        }
    }

    pub fn not(val: &Val) -> Result<Val> {
        use Val::*;
        match val {
            Null => Ok(Integer(-1)),
            Integer(n) => Ok(Integer(!n)),
            String(_) | Record(_) => Err(error!(TypeMismatch)),
            _ => Ok(Long(!wrap_long(val.to_f64()?)?)),
        }
    }

    pub fn add(lhs: &Val, rhs: &Val) -> Result<Val> {
        match (lhs, rhs) {
            (Val::String(l), Val::String(r)) => {
                let mut s = String::with_capacity(l.len() + r.len());
                s.push_str(l);
                s.push_str(r);
                Ok(Val::from(s))
            }
            _ => arithmetic(lhs, rhs, |l, r| l + r),
        }
    }

    pub fn subtract(lhs: &Val, rhs: &Val) -> Result<Val> {
        arithmetic(lhs, rhs, |l, r| l - r)
    }

    pub fn multiply(lhs: &Val, rhs: &Val) -> Result<Val> {
        arithmetic(lhs, rhs, |l, r| l * r)
    }

    pub fn divide(lhs: &Val, rhs: &Val) -> Result<Val> {
        if lhs.is_string() || rhs.is_string() {
            return Err(error!(TypeMismatch));
        }
        let r = rhs.to_f64()?;
        if r == 0.0 {
            return Err(error!(DivisionByZero));
        }
        numeric(Type::Double, lhs.to_f64()? / r)
    }

    pub fn divide_int(lhs: &Val, rhs: &Val) -> Result<Val> {
        let (l, r) = (whole(lhs)?, whole(rhs)?);
        if r == 0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::Long(l.wrapping_div(r)))
    }

    pub fn modulo(lhs: &Val, rhs: &Val) -> Result<Val> {
        let (l, r) = (whole(lhs)?, whole(rhs)?);
        if r == 0 {
            return Err(error!(DivisionByZero));
        }
        Ok(Val::Long(l.wrapping_rem(r)))
    }

    pub fn power(lhs: &Val, rhs: &Val) -> Result<Val> {
        if lhs.is_string() || rhs.is_string() {
            return Err(error!(TypeMismatch));
        }
        let (l, r) = (lhs.to_f64()?, rhs.to_f64()?);
        if l == 0.0 && r < 0.0 {
            return Err(error!(DivisionByZero));
        }
        let n = l.powf(r);
        if n.is_nan() {
            return Err(error!(IllegalFunctionCall));
        }
        numeric(Type::Double, n)
    }

    pub fn equal(lhs: &Val, rhs: &Val) -> Result<Val> {
        Ok(truth(compare(lhs, rhs)? == Ordering::Equal))
    }

    pub fn not_equal(lhs: &Val, rhs: &Val) -> Result<Val> {
        Ok(truth(compare(lhs, rhs)? != Ordering::Equal))
    }

    pub fn less(lhs: &Val, rhs: &Val) -> Result<Val> {
        Ok(truth(compare(lhs, rhs)? == Ordering::Less))
    }

    pub fn less_equal(lhs: &Val, rhs: &Val) -> Result<Val> {
        Ok(truth(compare(lhs, rhs)? != Ordering::Greater))
    }

    pub fn greater(lhs: &Val, rhs: &Val) -> Result<Val> {
        Ok(truth(compare(lhs, rhs)? == Ordering::Greater))
    }

    pub fn greater_equal(lhs: &Val, rhs: &Val) -> Result<Val> {
        Ok(truth(compare(lhs, rhs)? != Ordering::Less))
    }

    pub fn and(lhs: &Val, rhs: &Val) -> Result<Val> {
        logical(lhs, rhs, |l, r| l & r)
    }

    pub fn or(lhs: &Val, rhs: &Val) -> Result<Val> {
        logical(lhs, rhs, |l, r| l | r)
    }

    pub fn xor(lhs: &Val, rhs: &Val) -> Result<Val> {
        logical(lhs, rhs, |l, r| l ^ r)
    }

    pub fn eqv(lhs: &Val, rhs: &Val) -> Result<Val> {
        logical(lhs, rhs, |l, r| !(l ^ r))
    }

    pub fn imp(lhs: &Val, rhs: &Val) -> Result<Val> {
        logical(lhs, rhs, |l, r| !l | r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_left_operand_type_wins() {
        let r = Operation::add(&Val::Integer(2), &Val::Single(1.6)).unwrap();
        assert_eq!(r, Val::Integer(4));
        let r = Operation::multiply(&Val::Single(1.5), &Val::Integer(3)).unwrap();
        assert_eq!(r, Val::Single(4.5));
        let r = Operation::add(&Val::Null, &Val::Long(7)).unwrap();
        assert_eq!(r, Val::Long(7));
    }

    #[test]
    fn test_integer_wraps() {
        let r = Operation::add(&Val::Integer(32767), &Val::Integer(1)).unwrap();
        assert_eq!(r, Val::Integer(-32768));
        let r = Operation::negate(&Val::Integer(-32768)).unwrap();
        assert_eq!(r, Val::Integer(-32768));
    }

    #[test]
    fn test_division_promotes() {
        let r = Operation::divide(&Val::Integer(7), &Val::Integer(2)).unwrap();
        assert_eq!(r, Val::Double(3.5));
        let r = Operation::divide_int(&Val::Single(7.6), &Val::Integer(2)).unwrap();
        assert_eq!(r, Val::Long(4));
        let r = Operation::modulo(&Val::Integer(-7), &Val::Integer(3)).unwrap();
        assert_eq!(r, Val::Long(-1));
        let r = Operation::power(&Val::Integer(2), &Val::Integer(10)).unwrap();
        assert_eq!(r, Val::Double(1024.0));
    }

    #[test]
    fn test_division_by_zero() {
        let e = Operation::divide(&Val::Integer(1), &Val::Single(0.0)).unwrap_err();
        assert!(e.is(ErrorCode::DivisionByZero));
        let e = Operation::modulo(&Val::Integer(1), &Val::Integer(0)).unwrap_err();
        assert!(e.is(ErrorCode::DivisionByZero));
        let e = Operation::power(&Val::Single(-8.0), &Val::Single(0.5)).unwrap_err();
        assert!(e.is(ErrorCode::IllegalFunctionCall));
    }

    #[test]
    fn test_strings() {
        let r = Operation::add(&Val::from("AB"), &Val::from("CD")).unwrap();
        assert_eq!(r, Val::from("ABCD"));
        assert!(Operation::add(&Val::from("AB"), &Val::Integer(1)).is_err());
        assert!(Operation::subtract(&Val::from("AB"), &Val::from("A")).is_err());
        let r = Operation::less(&Val::from("APPLE"), &Val::from("BANANA")).unwrap();
        assert_eq!(r, Val::Integer(-1));
    }

    #[test]
    fn test_comparisons_are_basic_booleans() {
        let t = Operation::equal(&Val::Integer(3), &Val::Double(3.0)).unwrap();
        assert_eq!(t, Val::Integer(-1));
        let f = Operation::greater(&Val::Integer(3), &Val::Double(3.0)).unwrap();
        assert_eq!(f, Val::Integer(0));
        let t = Operation::greater_equal(&Val::Integer(3), &Val::Double(3.0)).unwrap();
        assert_eq!(t, Val::Integer(-1));
    }

    #[test]
    fn test_logic() {
        let r = Operation::and(&Val::Integer(12), &Val::Integer(10)).unwrap();
        assert_eq!(r, Val::Integer(8));
        let r = Operation::or(&Val::Long(12), &Val::Integer(3)).unwrap();
        assert_eq!(r, Val::Long(15));
        let r = Operation::not(&Val::Integer(0)).unwrap();
        assert_eq!(r, Val::Integer(-1));
        let r = Operation::imp(&Val::Integer(-1), &Val::Integer(0)).unwrap();
        assert_eq!(r, Val::Integer(0));
        let r = Operation::eqv(&Val::Integer(0), &Val::Integer(0)).unwrap();
        assert_eq!(r, Val::Integer(-1));
    }
}
