use crate::dev::LineShape;
use crate::lang::{draw, Error};
use crate::mach::{CircleSpec, Coord, InputSpec, LineSpec, Link, Opcode, Program, Val};
use std::rc::Rc;

type Op = Opcode;

/// Names accepted on the command line.
pub const DEMOS: &[&str] = &["hello", "shapes", "errors", "input"];

pub fn demo(name: &str) -> Option<Result<Program, Vec<Error>>> {
    match name {
        "hello" => Some(hello()),
        "shapes" => Some(shapes()),
        "errors" => Some(errors()),
        "input" => Some(input()),
        _ => None,
    }
}

// 10 PRINT "HELLO, WORLD"
// 20 I=1
// 30 PRINT I;:I=I+1:IF I<=3 THEN 30
// 40 PRINT
fn hello() -> Result<Program, Vec<Error>> {
    let mut link = Link::new();
    let greeting = link.constant(Val::from("HELLO, WORLD"));
    let one = link.constant(Val::Integer(1));
    let three = link.constant(Val::Integer(3));
    let (i, t) = (0, 1);
    link.line(10);
    link.push(Op::Print(greeting));
    link.push(Op::PrintNewline);
    link.line(20);
    link.push(Op::Copy(one, i));
    link.line(30);
    link.push(Op::Print(i));
    link.statement();
    link.push(Op::Add(i, one, i));
    link.statement();
    link.push(Op::Gt(i, three, t));
    link.branch(Op::IfNot(t, 0), 30);
    link.line(40);
    link.push(Op::PrintNewline);
    link.push(Op::End);
    link.link()
}

// 10 SCREEN 13
// 20 LINE (10,10)-(100,80),4,B
// 30 PAINT (50,50),1,4
// 40 CIRCLE (200,100),40,14
// 50 DRAW "BM240,20 C10 R30 D30 L30 U30 BF15 P2,10"
fn shapes() -> Result<Program, Vec<Error>> {
    let mut link = Link::new();
    let k = |link: &mut Link, n: i16| link.constant(Val::Integer(n));
    let turtle = "BM240,20 C10 R30 D30 L30 U30 BF15 P2,10";
    if let Err(error) = draw::parse(turtle) {
        return Err(vec![error]);
    }
    let mode = k(&mut link, 13);
    let (c10, c100, c80, c50) = (
        k(&mut link, 10),
        k(&mut link, 100),
        k(&mut link, 80),
        k(&mut link, 50),
    );
    let (c1, c4, c14, c40, c200) = (
        k(&mut link, 1),
        k(&mut link, 4),
        k(&mut link, 14),
        k(&mut link, 40),
        k(&mut link, 200),
    );
    let commands = link.constant(Val::from(turtle));
    link.line(10);
    link.push(Op::Screen(mode, None, None, None));
    link.line(20);
    link.push(Op::Line(Rc::new(LineSpec {
        from: Some(Coord::new(c10, c10)),
        to: Coord::new(c100, c80),
        color: Some(c4),
        shape: LineShape::Box,
        style: None,
    })));
    link.line(30);
    link.push(Op::Paint(Coord::new(c50, c50), Some(c1), Some(c4)));
    link.line(40);
    link.push(Op::Circle(Rc::new(CircleSpec {
        center: Coord::new(c200, c100),
        radius: c40,
        color: Some(c14),
        start: None,
        end: None,
        aspect: None,
    })));
    link.line(50);
    link.push(Op::Draw(commands));
    link.push(Op::End);
    link.link()
}

// 10 ON ERROR GOTO 100
// 20 X=1/0
// 30 PRINT "RESUMED"
// 40 END
// 100 PRINT "ERROR";ERR;"IN LINE";ERL
// 110 RESUME NEXT
fn errors() -> Result<Program, Vec<Error>> {
    let mut link = Link::new();
    let zero = link.constant(Val::Integer(0));
    let one = link.constant(Val::Integer(1));
    let resumed = link.constant(Val::from("RESUMED"));
    let label = link.constant(Val::from("ERROR"));
    let in_line = link.constant(Val::from("IN LINE"));
    let (x, t) = (0, 1);
    link.line(10);
    link.branch(Op::OnErrorGoto(None), 100);
    link.line(20);
    link.push(Op::Div(one, zero, t));
    link.push(Op::Copy(t, x));
    link.line(30);
    link.push(Op::Print(resumed));
    link.push(Op::PrintNewline);
    link.line(40);
    link.push(Op::End);
    link.line(100);
    link.push(Op::Print(label));
    link.push(Op::Err(t));
    link.push(Op::Print(t));
    link.push(Op::Print(in_line));
    link.push(Op::Erl(t));
    link.push(Op::Print(t));
    link.push(Op::PrintNewline);
    link.line(110);
    link.push(Op::ResumeNext);
    link.link()
}

// 10 INPUT "NAME";N$
// 20 PRINT "HELLO, ";N$
fn input() -> Result<Program, Vec<Error>> {
    let mut link = Link::new();
    let prompt = link.constant(Val::from("NAME"));
    let hello = link.constant(Val::from("HELLO, "));
    let name = 0;
    link.line(10);
    link.push(Op::Input(Rc::new(InputSpec {
        prompt: Some(prompt),
        question: true,
        targets: Rc::from(vec![name]),
    })));
    link.line(20);
    link.push(Op::Print(hello));
    link.push(Op::Print(name));
    link.push(Op::PrintNewline);
    link.link()
}
