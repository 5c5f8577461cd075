use super::{Address, Builtin, Slot, Type, GLOBAL};
use crate::dev::LineShape;
use crate::gfx::PutMode;
use std::rc::Rc;

/// ## Virtual machine instruction set
///
/// The BASIC virtual machine has no registers. Operands are stack slots
/// resolved through the current frame (or absolutely, when the global bit
/// is set). Expression opcodes read their operands and store a freshly
/// typed result; `Assign` normalizes into the declared type of its target.
///
/// For example: `LET A%=3*B` compiles to `[Mul(K3, B, T0), Assign(A%, -, -, T0)]`

#[derive(Clone)]
pub enum Opcode {
    // *** Variables
    /// Replace the destination slot with a copy of the source slot.
    Copy(Slot, Slot),
    /// Reset a slot to the zero value of a type.
    Declare(Slot, Type),
    /// Dimension an array. Bounds are (lower, upper) slot pairs.
    Dim(Slot, Type, Rc<[(Slot, Slot)]>),
    Redim(Slot, Type, Rc<[(Slot, Slot)]>),
    Erase(Slot),
    /// Read variable, optional subscripts, optional field path, into a temporary.
    Load(Slot, Option<Rc<[Slot]>>, Option<Rc<[usize]>>, Slot),
    /// Store a value into variable, optional subscripts, optional field path.
    Assign(Slot, Option<Rc<[Slot]>>, Option<Rc<[usize]>>, Slot),
    Swap(Slot, Slot),
    LBound(Slot, Option<Slot>, Slot),
    UBound(Slot, Option<Slot>, Slot),

    // *** Branch control
    /// Unconditional branch to Address.
    Jump(Address),
    /// Branch to Address if the slot is zero.
    IfNot(Slot, Address),
    OnGoto(Slot, Rc<[Address]>),
    OnGosub(Slot, Rc<[Address]>),
    Gosub(Address),
    /// Return from GOSUB, optionally to another Address.
    Return(Option<Address>),
    /// Target, size of the caller's frame, by-reference arguments.
    CallSub(Address, usize, Rc<[Slot]>),
    /// As CallSub plus the slot that receives the result.
    CallFunction(Address, usize, Rc<[Slot]>, Slot),
    SetResult(Slot),
    ExitSub,
    End,

    // *** Error handling
    OnErrorGoto(Option<Address>),
    Resume,
    ResumeNext,
    ResumeAt(Address),
    Error(Slot),
    Err(Slot),
    Erl(Slot),

    // *** DATA
    Read(Slot),
    /// Reset the DATA cursor to an offset in the data list.
    Restore(usize),

    // *** Expression operations
    Neg(Slot, Slot),
    Not(Slot, Slot),
    Add(Slot, Slot, Slot),
    Sub(Slot, Slot, Slot),
    Mul(Slot, Slot, Slot),
    Div(Slot, Slot, Slot),
    IDiv(Slot, Slot, Slot),
    Mod(Slot, Slot, Slot),
    Pow(Slot, Slot, Slot),
    Eq(Slot, Slot, Slot),
    NotEq(Slot, Slot, Slot),
    Lt(Slot, Slot, Slot),
    LtEq(Slot, Slot, Slot),
    Gt(Slot, Slot, Slot),
    GtEq(Slot, Slot, Slot),
    And(Slot, Slot, Slot),
    Or(Slot, Slot, Slot),
    Xor(Slot, Slot, Slot),
    Eqv(Slot, Slot, Slot),
    Imp(Slot, Slot, Slot),
    ToInt(Slot, Slot),
    ToLong(Slot, Slot),
    ToSingle(Slot, Slot),
    ToDouble(Slot, Slot),

    // *** Built-in functions
    Fn(Builtin, Rc<[Slot]>, Slot),
    Rnd(Option<Slot>, Slot),
    Randomize(Option<Slot>),

    // *** Console
    Print(Slot),
    PrintComma,
    PrintNewline,
    PrintTab(Slot),
    PrintSpc(Slot),
    Input(Rc<InputSpec>),
    LineInput(Rc<InputSpec>),
    /// INPUT$(n): count, destination.
    InputFunc(Slot, Slot),
    Inkey(Slot),
    Sleep(Option<Slot>),
    Cls(Option<Slot>),
    Locate(Option<Slot>, Option<Slot>),
    Color(Option<Slot>, Option<Slot>),
    ViewPrint(Option<(Slot, Slot)>),

    // *** Graphics
    /// Mode, color switch, active page, visible page.
    Screen(Slot, Option<Slot>, Option<Slot>, Option<Slot>),
    Pset(Coord, Option<Slot>),
    Preset(Coord, Option<Slot>),
    Point(Slot, Slot, Slot),
    Line(Rc<LineSpec>),
    Circle(Rc<CircleSpec>),
    Paint(Coord, Option<Slot>, Option<Slot>),
    Draw(Slot),
    /// Corners, array, optional subscripts of the first element.
    GetGraphics(Coord, Coord, Slot, Option<Rc<[Slot]>>),
    PutGraphics(Coord, Slot, Option<Rc<[Slot]>>, PutMode),
    Palette(Option<(Slot, Slot)>),
    View(Option<Rc<ViewSpec>>),
}

/// A graphics coordinate operand, optionally STEP relative to the pen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coord {
    pub x: Slot,
    pub y: Slot,
    pub step: bool,
}

impl Coord {
    pub fn new(x: Slot, y: Slot) -> Coord {
        Coord { x, y, step: false }
    }
    pub fn step(x: Slot, y: Slot) -> Coord {
        Coord { x, y, step: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub prompt: Option<Slot>,
    /// Print "? " after the prompt.
    pub question: bool,
    pub targets: Rc<[Slot]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub from: Option<Coord>,
    pub to: Coord,
    pub color: Option<Slot>,
    pub shape: LineShape,
    pub style: Option<Slot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleSpec {
    pub center: Coord,
    pub radius: Slot,
    pub color: Option<Slot>,
    pub start: Option<Slot>,
    pub end: Option<Slot>,
    pub aspect: Option<Slot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub from: Coord,
    pub to: Coord,
    pub fill: Option<Slot>,
    pub border: Option<Slot>,
}

struct S(Slot);

impl std::fmt::Display for S {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.0 & GLOBAL != 0 {
            write!(f, "G{}", self.0 & !GLOBAL)
        } else {
            write!(f, "L{}", self.0)
        }
    }
}

struct O(Option<Slot>);

impl std::fmt::Display for O {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.0 {
            Some(s) => write!(f, "{}", S(s)),
            None => write!(f, "-"),
        }
    }
}

fn list(slots: &[Slot]) -> String {
    slots
        .iter()
        .map(|s| S(*s).to_string())
        .collect::<Vec<String>>()
        .join(",")
}

fn opt_list(slots: &Option<Rc<[Slot]>>) -> String {
    match slots {
        Some(s) => format!("[{}]", list(s)),
        None => "-".to_string(),
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.step {
            write!(f, "STEP({},{})", S(self.x), S(self.y))
        } else {
            write!(f, "({},{})", S(self.x), S(self.y))
        }
    }
}

impl std::fmt::Debug for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Opcode::*;
        match self {
            Copy(a, b) => write!(f, "COPY({},{})", S(*a), S(*b)),
            Declare(a, t) => write!(f, "DECLARE({},{:?})", S(*a), t),
            Dim(a, t, b) | Redim(a, t, b) => {
                let bounds: Vec<String> = b
                    .iter()
                    .map(|(l, u)| format!("{} TO {}", S(*l), S(*u)))
                    .collect();
                let name = if matches!(self, Dim(..)) { "DIM" } else { "REDIM" };
                write!(f, "{}({},{:?},{})", name, S(*a), t, bounds.join(","))
            }
            Erase(a) => write!(f, "ERASE({})", S(*a)),
            Load(a, i, p, d) => write!(f, "LOAD({},{},{:?},{})", S(*a), opt_list(i), p, S(*d)),
            Assign(a, i, p, s) => {
                write!(f, "ASSIGN({},{},{:?},{})", S(*a), opt_list(i), p, S(*s))
            }
            Swap(a, b) => write!(f, "SWAP({},{})", S(*a), S(*b)),
            LBound(a, d, r) => write!(f, "LBOUND({},{},{})", S(*a), O(*d), S(*r)),
            UBound(a, d, r) => write!(f, "UBOUND({},{},{})", S(*a), O(*d), S(*r)),

            Jump(a) => write!(f, "JUMP({})", a),
            IfNot(s, a) => write!(f, "IFNOT({},{})", S(*s), a),
            OnGoto(s, t) => write!(f, "ONGOTO({},{:?})", S(*s), t),
            OnGosub(s, t) => write!(f, "ONGOSUB({},{:?})", S(*s), t),
            Gosub(a) => write!(f, "GOSUB({})", a),
            Return(Some(a)) => write!(f, "RETURN({})", a),
            Return(None) => write!(f, "RETURN"),
            CallSub(a, n, args) => write!(f, "CALLSUB({},{},[{}])", a, n, list(args)),
            CallFunction(a, n, args, r) => {
                write!(f, "CALLFN({},{},[{}],{})", a, n, list(args), S(*r))
            }
            SetResult(s) => write!(f, "SETRESULT({})", S(*s)),
            ExitSub => write!(f, "EXITSUB"),
            End => write!(f, "END"),

            OnErrorGoto(Some(a)) => write!(f, "ONERROR({})", a),
            OnErrorGoto(None) => write!(f, "ONERROR(0)"),
            Resume => write!(f, "RESUME"),
            ResumeNext => write!(f, "RESUMENEXT"),
            ResumeAt(a) => write!(f, "RESUME({})", a),
            Error(s) => write!(f, "ERROR({})", S(*s)),
            Err(s) => write!(f, "ERR({})", S(*s)),
            Erl(s) => write!(f, "ERL({})", S(*s)),

            Read(s) => write!(f, "READ({})", S(*s)),
            Restore(n) => write!(f, "RESTORE({})", n),

            Neg(a, d) => write!(f, "NEG({},{})", S(*a), S(*d)),
            Not(a, d) => write!(f, "NOT({},{})", S(*a), S(*d)),
            Add(a, b, d) => write!(f, "ADD({},{},{})", S(*a), S(*b), S(*d)),
            Sub(a, b, d) => write!(f, "SUB({},{},{})", S(*a), S(*b), S(*d)),
            Mul(a, b, d) => write!(f, "MUL({},{},{})", S(*a), S(*b), S(*d)),
            Div(a, b, d) => write!(f, "DIV({},{},{})", S(*a), S(*b), S(*d)),
            IDiv(a, b, d) => write!(f, "IDIV({},{},{})", S(*a), S(*b), S(*d)),
            Mod(a, b, d) => write!(f, "MOD({},{},{})", S(*a), S(*b), S(*d)),
            Pow(a, b, d) => write!(f, "POW({},{},{})", S(*a), S(*b), S(*d)),
            Eq(a, b, d) => write!(f, "EQ({},{},{})", S(*a), S(*b), S(*d)),
            NotEq(a, b, d) => write!(f, "NOTEQ({},{},{})", S(*a), S(*b), S(*d)),
            Lt(a, b, d) => write!(f, "LT({},{},{})", S(*a), S(*b), S(*d)),
            LtEq(a, b, d) => write!(f, "LTEQ({},{},{})", S(*a), S(*b), S(*d)),
            Gt(a, b, d) => write!(f, "GT({},{},{})", S(*a), S(*b), S(*d)),
            GtEq(a, b, d) => write!(f, "GTEQ({},{},{})", S(*a), S(*b), S(*d)),
            And(a, b, d) => write!(f, "AND({},{},{})", S(*a), S(*b), S(*d)),
            Or(a, b, d) => write!(f, "OR({},{},{})", S(*a), S(*b), S(*d)),
            Xor(a, b, d) => write!(f, "XOR({},{},{})", S(*a), S(*b), S(*d)),
            Eqv(a, b, d) => write!(f, "EQV({},{},{})", S(*a), S(*b), S(*d)),
            Imp(a, b, d) => write!(f, "IMP({},{},{})", S(*a), S(*b), S(*d)),
            ToInt(a, d) => write!(f, "TOINT({},{})", S(*a), S(*d)),
            ToLong(a, d) => write!(f, "TOLONG({},{})", S(*a), S(*d)),
            ToSingle(a, d) => write!(f, "TOSINGLE({},{})", S(*a), S(*d)),
            ToDouble(a, d) => write!(f, "TODOUBLE({},{})", S(*a), S(*d)),

            Fn(b, args, d) => write!(f, "{}([{}],{})", b, list(args), S(*d)),
            Rnd(a, d) => write!(f, "RND({},{})", O(*a), S(*d)),
            Randomize(a) => write!(f, "RANDOMIZE({})", O(*a)),

            Print(s) => write!(f, "PRINT({})", S(*s)),
            PrintComma => write!(f, "PRINTCOMMA"),
            PrintNewline => write!(f, "PRINTNEWLINE"),
            PrintTab(s) => write!(f, "PRINTTAB({})", S(*s)),
            PrintSpc(s) => write!(f, "PRINTSPC({})", S(*s)),
            Input(spec) => write!(f, "INPUT({},[{}])", O(spec.prompt), list(&spec.targets)),
            LineInput(spec) => {
                write!(f, "LINEINPUT({},[{}])", O(spec.prompt), list(&spec.targets))
            }
            InputFunc(n, d) => write!(f, "INPUTFUNC({},{})", S(*n), S(*d)),
            Inkey(d) => write!(f, "INKEY({})", S(*d)),
            Sleep(s) => write!(f, "SLEEP({})", O(*s)),
            Cls(s) => write!(f, "CLS({})", O(*s)),
            Locate(r, c) => write!(f, "LOCATE({},{})", O(*r), O(*c)),
            Color(fg, bg) => write!(f, "COLOR({},{})", O(*fg), O(*bg)),
            ViewPrint(Some((t, b))) => write!(f, "VIEWPRINT({},{})", S(*t), S(*b)),
            ViewPrint(None) => write!(f, "VIEWPRINT"),

            Screen(m, c, a, v) => write!(f, "SCREEN({},{},{},{})", S(*m), O(*c), O(*a), O(*v)),
            Pset(c, col) => write!(f, "PSET({},{})", c, O(*col)),
            Preset(c, col) => write!(f, "PRESET({},{})", c, O(*col)),
            Point(x, y, d) => write!(f, "POINT({},{},{})", S(*x), S(*y), S(*d)),
            Line(spec) => match &spec.from {
                Some(from) => write!(f, "LINE({}-{},{:?})", from, spec.to, spec.shape),
                None => write!(f, "LINE(-{},{:?})", spec.to, spec.shape),
            },
            Circle(spec) => write!(f, "CIRCLE({},{})", spec.center, S(spec.radius)),
            Paint(c, fill, border) => write!(f, "PAINT({},{},{})", c, O(*fill), O(*border)),
            Draw(s) => write!(f, "DRAW({})", S(*s)),
            GetGraphics(a, b, arr, i) => {
                write!(f, "GET({}-{},{},{})", a, b, S(*arr), opt_list(i))
            }
            PutGraphics(c, arr, i, m) => {
                write!(f, "PUT({},{},{},{:?})", c, S(*arr), opt_list(i), m)
            }
            Palette(Some((a, c))) => write!(f, "PALETTE({},{})", S(*a), S(*c)),
            Palette(None) => write!(f, "PALETTE"),
            View(Some(spec)) => write!(f, "VIEW({}-{})", spec.from, spec.to),
            View(None) => write!(f, "VIEW"),
        }
    }
}
