mod common;
use basic::mach::{Link, Opcode, Slot, Type, Val};
use common::*;
use std::rc::Rc;

#[test]
fn test_array_basics() {
    let mut link = Link::new();
    let zero = int(&mut link, 0);
    let two = int(&mut link, 2);
    let three = int(&mut link, 3);
    let five = int(&mut link, 5);
    let e = link.constant(Val::Single(2.7182818));
    let answer = text(&mut link, "THE ANSWER");
    let (a, x, s, t) = (0, 1, 2, 3);
    link.line(10);
    link.push(Opcode::Dim(a, Type::Single, Rc::from(vec![(zero, three)])));
    link.push(Opcode::Dim(x, Type::Single, Rc::from(vec![(zero, five), (zero, five)])));
    link.push(Opcode::Dim(s, Type::String, Rc::from(vec![(zero, three)])));
    link.line(20);
    link.push(Opcode::Assign(s, Some(Rc::from(vec![two])), None, answer));
    link.push(Opcode::Assign(x, Some(Rc::from(vec![three, two])), None, e));
    link.line(30);
    link.push(Opcode::Load(s, Some(Rc::from(vec![two])), None, t));
    link.push(Opcode::Print(t));
    link.push(Opcode::Load(x, Some(Rc::from(vec![three, two])), None, t));
    link.push(Opcode::Print(t));
    link.push(Opcode::Load(x, Some(Rc::from(vec![two, three])), None, t));
    link.push(Opcode::Print(t));
    link.line(40);
    link.push(Opcode::Assign(a, Some(Rc::from(vec![five])), None, e));
    let mut r = runtime(link);
    assert_eq!(
        exec(&mut r),
        "THE ANSWER 2.718282  0 ?SUBSCRIPT OUT OF RANGE IN 40\n"
    );
}

#[test]
fn test_elements_take_array_type() {
    let mut link = Link::new();
    let zero = int(&mut link, 0);
    let one = int(&mut link, 1);
    let big = link.constant(Val::Single(40000.0));
    let (a, t) = (0, 1);
    link.line(10);
    link.push(Opcode::Dim(a, Type::Integer, Rc::from(vec![(zero, one)])));
    link.push(Opcode::Assign(a, Some(Rc::from(vec![one])), None, big));
    link.push(Opcode::Load(a, Some(Rc::from(vec![one])), None, t));
    link.push(Opcode::Print(t));
    link.line(20);
    let hello = text(&mut link, "HELLO");
    link.push(Opcode::Assign(a, Some(Rc::from(vec![zero])), None, hello));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "-25536 ?TYPE MISMATCH IN 20\n");
}

#[test]
fn test_bounds() {
    let mut link = Link::new();
    let one = int(&mut link, 1);
    let two = int(&mut link, 2);
    let three = int(&mut link, 3);
    let neg = int(&mut link, -2);
    let (b, t) = (0, 1);
    link.line(10);
    link.push(Opcode::Dim(b, Type::Integer, Rc::from(vec![(one, three), (neg, two)])));
    link.line(20);
    link.push(Opcode::LBound(b, None, t));
    link.push(Opcode::Print(t));
    link.push(Opcode::UBound(b, None, t));
    link.push(Opcode::Print(t));
    link.push(Opcode::LBound(b, Some(two), t));
    link.push(Opcode::Print(t));
    link.push(Opcode::UBound(b, Some(two), t));
    link.push(Opcode::Print(t));
    link.line(30);
    link.push(Opcode::UBound(b, Some(three), t));
    let mut r = runtime(link);
    assert_eq!(
        exec(&mut r),
        " 1  3 -2  2 ?SUBSCRIPT OUT OF RANGE IN 30\n"
    );
}

#[test]
fn test_lower_bound_above_upper() {
    let mut link = Link::new();
    let (one, three) = (int(&mut link, 1), int(&mut link, 3));
    link.line(10);
    link.push(Opcode::Dim(0, Type::Integer, Rc::from(vec![(three, one)])));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "?SUBSCRIPT OUT OF RANGE IN 10\n");
}

#[test]
fn test_dim_twice() {
    let mut link = Link::new();
    let (zero, five) = (int(&mut link, 0), int(&mut link, 5));
    let bounds: Rc<[(Slot, Slot)]> = Rc::from(vec![(zero, five)]);
    link.line(10);
    link.push(Opcode::Dim(0, Type::Single, Rc::clone(&bounds)));
    link.line(20);
    link.push(Opcode::Dim(0, Type::Single, bounds));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "?REDIMENSIONED ARRAY IN 20\n");
}

#[test]
fn test_redim_and_erase() {
    let mut link = Link::new();
    let zero = int(&mut link, 0);
    let two = int(&mut link, 2);
    let nine = int(&mut link, 9);
    let seven = int(&mut link, 7);
    let (a, t) = (0, 1);
    link.line(10);
    link.push(Opcode::Dim(a, Type::Integer, Rc::from(vec![(zero, two)])));
    link.push(Opcode::Assign(a, Some(Rc::from(vec![two])), None, seven));
    link.push(Opcode::Erase(a));
    link.push(Opcode::Load(a, Some(Rc::from(vec![two])), None, t));
    link.push(Opcode::Print(t));
    link.line(20);
    link.push(Opcode::Redim(a, Type::Integer, Rc::from(vec![(zero, nine)])));
    link.push(Opcode::Assign(a, Some(Rc::from(vec![nine])), None, seven));
    link.push(Opcode::Load(a, Some(Rc::from(vec![nine])), None, t));
    link.push(Opcode::Print(t));
    link.push(Opcode::UBound(a, None, t));
    link.push(Opcode::Print(t));
    link.line(30);
    link.push(Opcode::Erase(t));
    let mut r = runtime(link);
    assert_eq!(
        exec(&mut r),
        " 0  7  9 ?ILLEGAL FUNCTION CALL IN 30\n"
    );
}

#[test]
fn test_implicit_dimension() {
    let mut link = Link::new();
    let ten = int(&mut link, 10);
    let eleven = int(&mut link, 11);
    let four = int(&mut link, 4);
    let (a, t) = (0, 1);
    link.line(10);
    link.push(Opcode::Assign(a, Some(Rc::from(vec![ten])), None, four));
    link.push(Opcode::Load(a, Some(Rc::from(vec![ten])), None, t));
    link.push(Opcode::Print(t));
    link.push(Opcode::Load(a, Some(Rc::from(vec![four])), None, t));
    link.push(Opcode::Print(t));
    link.line(20);
    link.push(Opcode::Assign(a, Some(Rc::from(vec![eleven])), None, four));
    let mut r = runtime(link);
    assert_eq!(
        exec(&mut r),
        " 4  0 ?SUBSCRIPT OUT OF RANGE IN 20\n"
    );
}
