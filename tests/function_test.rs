mod common;
use basic::mach::{Link, Opcode};
use common::*;
use std::rc::Rc;

#[test]
fn test_sub_arguments_by_reference() {
    let mut link = Link::new();
    let one = int(&mut link, 1);
    let x = 0;
    link.line(10);
    link.push(Opcode::Copy(one, x));
    link.branch(Opcode::CallSub(0, 1, Rc::from(vec![x])), 1000);
    link.push(Opcode::Print(x));
    link.push(Opcode::End);
    link.line(1000);
    link.push(Opcode::Add(0, one, 0));
    link.push(Opcode::ExitSub);
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), " 2 ");
}

#[test]
fn test_function_result() {
    let mut link = Link::new();
    let seven = int(&mut link, 7);
    let (n, result) = (0, 1);
    link.line(10);
    link.push(Opcode::Copy(seven, n));
    link.branch(Opcode::CallFunction(0, 2, Rc::from(vec![n]), result), 1000);
    link.push(Opcode::Print(result));
    link.push(Opcode::Print(n));
    link.push(Opcode::End);
    link.line(1000);
    link.push(Opcode::Mul(0, 0, 1));
    link.push(Opcode::SetResult(1));
    link.push(Opcode::ExitSub);
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), " 49  7 ");
}

#[test]
fn test_recursive_function() {
    let mut link = Link::new();
    let one = int(&mut link, 1);
    let five = int(&mut link, 5);
    link.line(10);
    link.push(Opcode::Copy(five, 0));
    link.branch(Opcode::CallFunction(0, 2, Rc::from(vec![0]), 1), 1000);
    link.push(Opcode::Print(1));
    link.push(Opcode::End);
    // FUNCTION FACT(N): IF N>1 THEN FACT=N*FACT(N-1) ELSE FACT=1
    link.line(1000);
    link.push(Opcode::Gt(0, one, 1));
    link.branch(Opcode::IfNot(1, 0), 1100);
    link.line(1010);
    link.push(Opcode::Sub(0, one, 1));
    link.branch(Opcode::CallFunction(0, 4, Rc::from(vec![1]), 2), 1000);
    link.push(Opcode::Mul(0, 2, 3));
    link.push(Opcode::SetResult(3));
    link.push(Opcode::ExitSub);
    link.line(1100);
    link.push(Opcode::SetResult(one));
    link.push(Opcode::ExitSub);
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), " 120 ");
}

#[test]
fn test_locals_start_empty() {
    let mut link = Link::new();
    let one = int(&mut link, 1);
    link.line(10);
    link.branch(Opcode::CallSub(0, 0, Rc::from(vec![])), 1000);
    link.branch(Opcode::CallSub(0, 0, Rc::from(vec![])), 1000);
    link.push(Opcode::End);
    link.line(1000);
    link.push(Opcode::Add(0, one, 0));
    link.push(Opcode::Print(0));
    link.push(Opcode::ExitSub);
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), " 1  1 ");
}

#[test]
fn test_shared_module_variable() {
    let mut link = Link::new();
    let five = int(&mut link, 5);
    let shared = link.module_slot(0);
    link.line(10);
    link.branch(Opcode::CallSub(0, 1, Rc::from(vec![])), 1000);
    link.push(Opcode::Print(0));
    link.push(Opcode::End);
    link.line(1000);
    link.push(Opcode::Copy(five, shared));
    link.push(Opcode::ExitSub);
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), " 5 ");
}

#[test]
fn test_gosub_inside_sub() {
    let mut link = Link::new();
    let out = text(&mut link, "OUT");
    let inside = text(&mut link, "IN");
    let no = text(&mut link, "NO");
    link.line(10);
    link.branch(Opcode::CallSub(0, 0, Rc::from(vec![])), 1000);
    link.line(20);
    link.push(Opcode::Print(out));
    link.push(Opcode::End);
    link.line(1000);
    link.branch(Opcode::Gosub(0), 1100);
    link.push(Opcode::Print(no));
    link.line(1100);
    link.push(Opcode::Print(inside));
    link.push(Opcode::ExitSub);
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "INOUT");
}

#[test]
fn test_result_set_from_gosub() {
    let mut link = Link::new();
    let nine = int(&mut link, 9);
    link.line(10);
    link.branch(Opcode::CallFunction(0, 1, Rc::from(vec![]), 0), 1000);
    link.push(Opcode::Print(0));
    link.push(Opcode::End);
    link.line(1000);
    link.branch(Opcode::Gosub(0), 1100);
    link.push(Opcode::ExitSub);
    link.line(1100);
    link.push(Opcode::SetResult(nine));
    link.push(Opcode::Return(None));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), " 9 ");
}

#[test]
fn test_return_inside_sub() {
    let mut link = Link::new();
    link.line(10);
    link.branch(Opcode::CallSub(0, 0, Rc::from(vec![])), 1000);
    link.line(1000);
    link.push(Opcode::Return(None));
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "?RETURN WITHOUT GOSUB IN 1000\n");
}

#[test]
fn test_result_outside_function() {
    let mut link = Link::new();
    let one = int(&mut link, 1);
    link.line(10);
    link.push(Opcode::SetResult(one));
    let mut r = runtime(link);
    assert_eq!(
        exec(&mut r),
        "?INTERNAL ERROR IN 10; NO FUNCTION FRAME\n"
    );
}

#[test]
fn test_result_above_frame() {
    let mut link = Link::new();
    link.line(10);
    link.branch(Opcode::CallFunction(0, 1, Rc::from(vec![]), 1), 1000);
    link.line(1000);
    link.push(Opcode::ExitSub);
    let mut r = runtime(link);
    assert_eq!(
        exec(&mut r),
        "?INTERNAL ERROR IN 10; RESULT ABOVE FRAME\n"
    );
}

#[test]
fn test_runaway_recursion() {
    let mut link = Link::new();
    link.line(10);
    link.branch(Opcode::CallSub(0, 0, Rc::from(vec![])), 1000);
    link.line(1000);
    link.branch(Opcode::CallSub(0, 0, Rc::from(vec![])), 1000);
    let mut r = runtime(link);
    assert_eq!(exec(&mut r), "?OUT OF STACK SPACE IN 1000\n");
}
