mod common;
use basic::gfx::Screen;
use basic::mach::{Builtin, Event, InputSpec, Link, Opcode, Runtime, Slot, Type, Wait};
use common::*;
use std::rc::Rc;

fn input(prompt: Option<Slot>, question: bool, targets: &[Slot]) -> Rc<InputSpec> {
    Rc::new(InputSpec {
        prompt,
        question,
        targets: Rc::from(targets.to_vec()),
    })
}

#[test]
fn test_input_waits_for_host() {
    let mut link = Link::new();
    let age = text(&mut link, "AGE");
    link.line(10);
    link.push(Opcode::Declare(0, Type::Integer));
    link.push(Opcode::Input(input(Some(age), true, &[0])));
    link.line(20);
    link.push(Opcode::Print(0));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "AGE? ");
    assert_eq!(r.execute(10), Event::Waiting(Wait::Line));
    r.enter("X");
    assert_eq!(exec(&mut r), "Redo from start\nAGE? ");
    r.enter("42");
    assert_eq!(exec(&mut r), " 42 ");
    assert!(r.is_stopped());
}

#[test]
fn test_input_several_fields() {
    let mut link = Link::new();
    link.line(10);
    link.push(Opcode::Declare(0, Type::Integer));
    link.push(Opcode::Declare(1, Type::String));
    link.push(Opcode::Input(input(None, true, &[0, 1])));
    link.push(Opcode::Print(0));
    link.push(Opcode::Print(1));
    let mut r = runtime(link);
    r.device_mut().push_line("3, HELLO");
    assert_eq!(exec(&mut r), "? 3, HELLO\n 3 HELLO");
}

#[test]
fn test_input_wrong_field_count() {
    let mut link = Link::new();
    link.line(10);
    link.push(Opcode::Input(input(None, true, &[0, 1])));
    link.push(Opcode::Print(0));
    link.push(Opcode::Print(1));
    let mut r = runtime(link);
    r.device_mut().push_line("1");
    r.device_mut().push_line("1,2");
    assert_eq!(exec(&mut r), "? 1\nRedo from start\n? 1,2\n 1  2 ");
}

#[test]
fn test_input_quoted_string() {
    let mut link = Link::new();
    link.line(10);
    link.push(Opcode::Declare(0, Type::String));
    link.push(Opcode::Input(input(None, false, &[0])));
    link.push(Opcode::Print(0));
    let mut r = runtime(link);
    r.device_mut().push_line(r#""A, B""#);
    assert_eq!(exec(&mut r), "\"A, B\"\nA, B");
}

#[test]
fn test_line_input() {
    let mut link = Link::new();
    let prompt = text(&mut link, "NAME: ");
    link.line(10);
    link.push(Opcode::LineInput(input(Some(prompt), false, &[0])));
    link.push(Opcode::Print(0));
    let mut r = runtime(link);
    r.device_mut().push_line("A, B");
    assert_eq!(exec(&mut r), "NAME: A, B\nA, B");
}

#[test]
fn test_input_func() {
    let mut link = Link::new();
    let two = int(&mut link, 2);
    link.line(10);
    link.push(Opcode::InputFunc(two, 0));
    link.push(Opcode::Print(0));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "");
    assert_eq!(r.execute(10), Event::Waiting(Wait::Keys(2)));
    r.enter("XYZ");
    assert_eq!(exec(&mut r), "XY");
    r.restart();
    r.device_mut().push_keys("AB");
    assert_eq!(exec(&mut r), "AB");
}

#[test]
fn test_input_func_count() {
    let mut link = Link::new();
    let zero = int(&mut link, 0);
    link.line(10);
    link.push(Opcode::InputFunc(zero, 0));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "?ILLEGAL FUNCTION CALL IN 10\n");
}

#[test]
fn test_inkey() {
    let mut link = Link::new();
    link.line(10);
    link.push(Opcode::Inkey(0));
    link.push(Opcode::Print(0));
    link.push(Opcode::Inkey(0));
    link.push(Opcode::Fn(Builtin::Len, Rc::from(vec![0]), 1));
    link.push(Opcode::Print(1));
    let mut r = runtime(link);
    r.device_mut().push_keys("Q");
    assert_eq!(exec(&mut r), "Q 0 ");
}

#[test]
fn test_sleep_ready() {
    let mut link = Link::new();
    let one = int(&mut link, 1);
    let done = text(&mut link, "DONE");
    link.line(10);
    link.push(Opcode::Sleep(Some(one)));
    link.push(Opcode::Print(done));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "DONE");
    assert_eq!(r.device().calls(), &["SLEEP 1".to_string()]);
}

#[test]
fn test_sleep_waits_for_wake() {
    let mut link = Link::new();
    let two = int(&mut link, 2);
    let done = text(&mut link, "DONE");
    link.line(10);
    link.push(Opcode::Sleep(Some(two)));
    link.push(Opcode::Print(done));
    let mut r = Runtime::new(program(link), Screen::new());
    assert_eq!(r.execute(100), Event::Waiting(Wait::Sleep(Some(2.0))));
    r.enter("ignored");
    assert_eq!(r.execute(100), Event::Waiting(Wait::Sleep(Some(2.0))));
    r.wake();
    assert_eq!(r.execute(100), Event::Stopped);
    let printed: String = r
        .device_mut()
        .take_output()
        .into_iter()
        .map(|span| span.text)
        .collect();
    assert_eq!(printed, "DONE");
}

#[test]
fn test_destroy_while_waiting() {
    let mut link = Link::new();
    link.line(10);
    link.push(Opcode::Input(input(None, true, &[0])));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "? ");
    r.destroy();
    assert_eq!(exec(&mut r), "?BREAK IN 10\n");
    assert_eq!(r.execute(10), Event::Stopped);
}

#[test]
fn test_enter_without_request() {
    let mut link = Link::new();
    let ok = text(&mut link, "OK");
    link.line(10);
    link.push(Opcode::Print(ok));
    let mut r = runtime(link);
    r.enter("STRAY");
    r.wake();
    assert_eq!(exec(&mut r), "OK");
}
