use super::function::parse_number;
use super::{
    Address, CircleSpec, Coord, Dim, FrameKind, Frames, Function, InputSpec, LineSpec, Opcode,
    Operation, Program, Rnd, Slot, Stack, Type, Val, Var, ViewSpec, GLOBAL, STACK_LIMIT,
};
use crate::dev::{Device, Point, View, SCREEN_MODES};
use crate::error;
use crate::gfx::{PutMode, Sprite};
use crate::lang::{draw, Error};
use std::rc::Rc;
use std::task::Poll;
use tracing::{debug, info, trace, warn};

type Result<T> = std::result::Result<T, Error>;
type Op = Opcode;

/// ## Events
///
/// What [`Runtime::execute`](Runtime::execute) stopped for.

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The step quota ran out. Call `execute` again.
    Yield,
    /// Suspended until the host calls `enter` or `wake`.
    Waiting(Wait),
    Stopped,
    /// A terminal fault, reported once.
    Fault(Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Wait {
    /// A line of input. Answer with `enter`.
    Line,
    /// A number of keystrokes. Answer with `enter`.
    Keys(usize),
    /// Answer with `wake`.
    Sleep(Option<f64>),
}

#[derive(Debug, Clone)]
enum Pending {
    Input(Rc<InputSpec>),
    LineInput(Rc<InputSpec>),
    Keys(usize, Slot),
    Sleep(Option<f64>),
}

impl Pending {
    fn wait(&self) -> Wait {
        match self {
            Pending::Input(_) | Pending::LineInput(_) => Wait::Line,
            Pending::Keys(n, _) => Wait::Keys(*n),
            Pending::Sleep(s) => Wait::Sleep(*s),
        }
    }
}

/// ## Runtime
///
/// Interprets a linked [`Program`](Program) one instruction at a time.
/// Errors trapped by ON ERROR unwind to the module frame and remember the
/// faulting instruction so RESUME can re-enter at a statement boundary.

pub struct Runtime<D: Device> {
    program: Rc<Program>,
    device: D,
    pc: Address,
    stack: Stack<Var>,
    frames: Frames,
    on_error: Option<Address>,
    in_handler: bool,
    err_code: u16,
    err_line: Option<u32>,
    resume_pc: Address,
    rnd: Rnd,
    data_cursor: usize,
    pending: Option<Pending>,
    fault: Option<Error>,
    stopped: bool,
    column: usize,
}

impl<D: Device> Runtime<D> {
    pub fn new(program: Program, device: D) -> Runtime<D> {
        let constants = program.constants().len();
        let mut runtime = Runtime {
            program: Rc::new(program),
            device,
            pc: 0,
            stack: Stack::new("STACK OVERFLOW", STACK_LIMIT),
            frames: Frames::new(constants),
            on_error: None,
            in_handler: false,
            err_code: 0,
            err_line: None,
            resume_pc: 0,
            rnd: Rnd::default(),
            data_cursor: 0,
            pending: None,
            fault: None,
            stopped: false,
            column: 0,
        };
        runtime.restart();
        runtime
    }

    /// Reset all execution state and run again from the first instruction.
    pub fn restart(&mut self) {
        self.pc = 0;
        self.stack.clear();
        self.frames = Frames::new(self.program.constants().len());
        self.on_error = None;
        self.in_handler = false;
        self.err_code = 0;
        self.err_line = None;
        self.resume_pc = 0;
        self.rnd = Rnd::default();
        self.data_cursor = 0;
        self.pending = None;
        self.fault = None;
        self.stopped = false;
        self.column = 0;
        let program = Rc::clone(&self.program);
        for val in program.constants() {
            if let Err(error) = self.stack.push(Var::fresh(val.clone())) {
                self.fault = Some(error);
                break;
            }
        }
        info!(
            ops = program.len(),
            constants = program.constants().len(),
            data = program.data_len(),
            "program loaded"
        );
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Cancel the program. The next `execute` reports a BREAK fault.
    pub fn destroy(&mut self) {
        if self.stopped {
            return;
        }
        // A pending request has already stepped past its instruction.
        let pc = match self.pending {
            Some(_) => self.pc.saturating_sub(1),
            None => self.pc,
        };
        let error = error!(Break, self.program.line(pc));
        warn!(%error, "program cancelled");
        self.pending = None;
        self.fault = Some(error);
    }

    /// Run up to `cycles` instructions.
    pub fn execute(&mut self, cycles: usize) -> Event {
        for _ in 0..cycles {
            if let Some(event) = self.poll() {
                return event;
            }
            let pc = self.pc;
            if let Err(error) = self.step() {
                self.pc = pc;
                self.raise(error);
            }
        }
        self.poll().unwrap_or(Event::Yield)
    }

    /// Complete a pending INPUT, LINE INPUT or INPUT$.
    pub fn enter(&mut self, text: &str) {
        let pending = match self.pending.take() {
            Some(Pending::Sleep(s)) => {
                self.pending = Some(Pending::Sleep(s));
                return;
            }
            Some(pending) => pending,
            None => return,
        };
        let faulting = self.pc.saturating_sub(1);
        if let Err(error) = self.complete(pending, text.to_string()) {
            self.pc = faulting;
            self.raise(error);
        }
    }

    /// End a pending SLEEP.
    pub fn wake(&mut self) {
        if let Some(Pending::Sleep(_)) = self.pending {
            self.pending = None;
        }
    }

    fn poll(&mut self) -> Option<Event> {
        if let Some(error) = self.fault.take() {
            self.stopped = true;
            self.pending = None;
            return Some(Event::Fault(error));
        }
        if self.stopped {
            return Some(Event::Stopped);
        }
        self.pending.as_ref().map(|p| Event::Waiting(p.wait()))
    }

    fn raise(&mut self, error: Error) {
        let line = self.program.line(self.pc);
        if error.is_recoverable() && !self.in_handler {
            if let Some(handler) = self.on_error {
                debug!(code = error.code(), ?line, handler, "error trapped");
                self.resume_pc = self.resume_point();
                self.frames.unwind();
                self.err_code = error.code();
                self.err_line = line;
                self.in_handler = true;
                self.pending = None;
                self.pc = handler;
                return;
            }
        }
        let error = match error.line_number() {
            Some(_) => error,
            None => error.in_line_number(line),
        };
        warn!(%error, "program fault");
        self.fault = Some(error);
    }

    /// Where RESUME re-enters once the frames above the module are gone:
    /// the faulting instruction, or the outermost SUB or FUNCTION call.
    fn resume_point(&self) -> Address {
        let mut point = self.pc;
        let mut called = false;
        for frame in self.frames.chain() {
            if called {
                point = frame.pc.saturating_sub(1);
            }
            called = matches!(frame.kind, FrameKind::Sub | FrameKind::Function);
        }
        point
    }

    fn index(&self, slot: Slot) -> usize {
        if slot & GLOBAL != 0 {
            return (slot & !GLOBAL) as usize;
        }
        let frame = self.frames.current();
        match frame.params.get(slot as usize) {
            Some(idx) => *idx,
            None => frame.offset + slot as usize,
        }
    }

    fn var_mut(&mut self, slot: Slot) -> Result<&mut Var> {
        let idx = self.index(slot);
        self.stack.get_mut(idx)
    }

    fn val(&self, slot: Slot) -> Result<Val> {
        match self.stack.get(self.index(slot)) {
            Some(var) if var.is_array() => Err(error!(InternalError; "ARRAY WITHOUT SUBSCRIPT")),
            Some(var) => Ok(var.value().clone()),
            None => Ok(Val::Null),
        }
    }

    fn int(&self, slot: Slot) -> Result<i32> {
        self.val(slot)?.to_i32()
    }

    fn num(&self, slot: Slot) -> Result<f64> {
        self.val(slot)?.to_f64()
    }

    fn text(&self, slot: Slot) -> Result<String> {
        Ok(self.val(slot)?.as_str()?.to_string())
    }

    fn opt_num(&self, slot: Option<Slot>) -> Result<Option<f64>> {
        slot.map(|s| self.num(s)).transpose()
    }

    fn byte(&self, slot: Slot) -> Result<u8> {
        u8::try_from(self.int(slot)?).map_err(|_| error!(IllegalFunctionCall))
    }

    fn opt_byte(&self, slot: Option<Slot>) -> Result<Option<u8>> {
        slot.map(|s| self.byte(s)).transpose()
    }

    /// SPC and TAB take a count in 0..=32767.
    fn count(&self, slot: Slot) -> Result<usize> {
        match self.int(slot)? {
            n @ 0..=32767 => Ok(n as usize),
            _ => Err(error!(IllegalFunctionCall)),
        }
    }

    fn opt_u16(&self, slot: Option<Slot>) -> Result<Option<u16>> {
        slot.map(|s| match u16::try_from(self.int(s)?) {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(error!(IllegalFunctionCall)),
        })
        .transpose()
    }

    fn store(&mut self, slot: Slot, val: Val) -> Result<()> {
        *self.var_mut(slot)? = Var::fresh(val);
        Ok(())
    }

    fn indices(&self, slots: &Option<Rc<[Slot]>>) -> Result<Option<Vec<i32>>> {
        match slots {
            None => Ok(None),
            Some(slots) => Ok(Some(
                slots
                    .iter()
                    .map(|s| self.int(*s))
                    .collect::<Result<Vec<i32>>>()?,
            )),
        }
    }

    fn point(&self, coord: Coord) -> Result<Point> {
        let base = match coord.step {
            true => Some(self.device.pen()?),
            false => None,
        };
        self.offset_point(coord, base)
    }

    /// Resolve a coordinate pair, relative to `base` for STEP. Screen
    /// coordinates are 16-bit.
    fn offset_point(&self, coord: Coord, base: Option<Point>) -> Result<Point> {
        let (mut x, mut y) = (self.int(coord.x)?, self.int(coord.y)?);
        if let Some(base) = base {
            x = x.saturating_add(base.x);
            y = y.saturating_add(base.y);
        }
        let range = i16::MIN as i32..=i16::MAX as i32;
        if !range.contains(&x) || !range.contains(&y) {
            return Err(error!(Overflow));
        }
        Ok(Point::new(x, y))
    }

    fn print(&mut self, text: &str) -> Result<()> {
        self.device.print(text)?;
        match text.rfind('\n') {
            Some(pos) => self.column = text[pos + 1..].chars().count(),
            None => self.column += text.chars().count(),
        }
        Ok(())
    }

    fn binary(&mut self, a: Slot, b: Slot, dst: Slot, f: fn(&Val, &Val) -> Result<Val>) -> Result<()> {
        let val = f(&self.val(a)?, &self.val(b)?)?;
        self.store(dst, val)
    }

    fn unary(&mut self, a: Slot, dst: Slot, f: fn(&Val) -> Result<Val>) -> Result<()> {
        let val = f(&self.val(a)?)?;
        self.store(dst, val)
    }

    fn step(&mut self) -> Result<()> {
        let program = Rc::clone(&self.program);
        let pc = self.pc;
        let op = match program.op(pc) {
            Some(op) => op,
            None => {
                self.stopped = true;
                return Ok(());
            }
        };
        trace!(pc, op = %op, "dispatch");
        self.pc += 1;
        match op {
            Op::Copy(src, dst) => {
                let var = self.stack.get(self.index(*src)).cloned().unwrap_or_default();
                *self.var_mut(*dst)? = var;
                Ok(())
            }
            Op::Declare(slot, ty) => {
                *self.var_mut(*slot)? = Var::new(ty.clone());
                Ok(())
            }
            Op::Dim(slot, ty, bounds) => {
                let exists = match self.stack.get(self.index(*slot)) {
                    Some(var) => var.is_array(),
                    None => false,
                };
                if exists {
                    return Err(error!(RedimensionedArray));
                }
                self.dim(*slot, ty, bounds)
            }
            Op::Redim(slot, ty, bounds) => self.dim(*slot, ty, bounds),
            Op::Erase(slot) => {
                let var = self.var_mut(*slot)?;
                let dims = match var.dims() {
                    Some(dims) => dims.to_vec(),
                    None => return Err(error!(IllegalFunctionCall)),
                };
                *var = Var::array(var.ty().clone(), dims)?;
                Ok(())
            }
            Op::Load(src, index, field, dst) => {
                let index = self.indices(index)?;
                let default = Var::default();
                let var = self.stack.get(self.index(*src)).unwrap_or(&default);
                let val = var.get(index.as_deref(), field.as_deref())?;
                self.store(*dst, val)
            }
            Op::Assign(dst, index, field, src) => {
                let index = self.indices(index)?;
                let val = self.val(*src)?;
                self.var_mut(*dst)?
                    .set(index.as_deref(), field.as_deref(), val)
            }
            Op::Swap(a, b) => {
                let (va, vb) = (self.val(*a)?, self.val(*b)?);
                if va.ty() != vb.ty() && !(va.is_numeric() && vb.is_numeric()) {
                    return Err(error!(TypeMismatch));
                }
                self.var_mut(*a)?.set(None, None, vb)?;
                self.var_mut(*b)?.set(None, None, va)
            }
            Op::LBound(slot, dim, dst) => self.bound(*slot, *dim, *dst, false),
            Op::UBound(slot, dim, dst) => self.bound(*slot, *dim, *dst, true),

            Op::Jump(addr) => {
                self.pc = *addr;
                Ok(())
            }
            Op::IfNot(slot, addr) => {
                if !self.val(*slot)?.is_true()? {
                    self.pc = *addr;
                }
                Ok(())
            }
            Op::OnGoto(slot, targets) => {
                if let Some(addr) = self.select(*slot, targets)? {
                    self.pc = addr;
                }
                Ok(())
            }
            Op::OnGosub(slot, targets) => match self.select(*slot, targets)? {
                Some(addr) => self.gosub(addr),
                None => Ok(()),
            },
            Op::Gosub(addr) => self.gosub(*addr),
            Op::Return(target) => {
                if self.frames.current().kind != FrameKind::Gosub {
                    return Err(error!(ReturnWithoutGosub));
                }
                self.frames.pop()?;
                self.pc = match target {
                    Some(addr) => *addr,
                    None => self.frames.current().pc,
                };
                Ok(())
            }
            Op::CallSub(addr, size, args) => self.call(FrameKind::Sub, *addr, *size, args, None),
            Op::CallFunction(addr, size, args, result) => {
                let result = self.index(*result);
                self.call(FrameKind::Function, *addr, *size, args, Some(result))
            }
            Op::SetResult(slot) => {
                let val = self.val(*slot)?;
                let result = self
                    .frames
                    .chain()
                    .find(|f| f.kind == FrameKind::Function)
                    .and_then(|f| f.result);
                match result {
                    Some(idx) => {
                        *self.stack.get_mut(idx)? = Var::fresh(val);
                        Ok(())
                    }
                    None => Err(error!(InternalError; "NO FUNCTION FRAME")),
                }
            }
            Op::ExitSub => {
                loop {
                    let frame = self.frames.pop()?;
                    if frame.kind != FrameKind::Gosub {
                        break;
                    }
                }
                self.pc = self.frames.current().pc;
                debug!(depth = self.frames.depth(), pc = self.pc, "exit sub");
                Ok(())
            }
            Op::End => {
                self.stopped = true;
                Ok(())
            }

            Op::OnErrorGoto(handler) => {
                if handler.is_none() && self.in_handler {
                    return Err(Error::user(self.err_code));
                }
                self.on_error = *handler;
                Ok(())
            }
            Op::Resume => {
                let pc = self.program.statement_start(self.resume_pc);
                self.resume(pc)
            }
            Op::ResumeNext => {
                let pc = self.program.next_statement(self.resume_pc);
                self.resume(pc)
            }
            Op::ResumeAt(addr) => self.resume(*addr),
            Op::Error(slot) => match self.int(*slot)? {
                n @ 1..=255 => Err(Error::user(n as u16)),
                _ => Err(error!(IllegalFunctionCall)),
            },
            Op::Err(dst) => self.store(*dst, Val::Integer(self.err_code as i16)),
            Op::Erl(dst) => {
                let line = self.err_line.unwrap_or(0);
                self.store(*dst, Val::Long(line as i32))
            }

            Op::Read(dst) => {
                let val = match self.program.data(self.data_cursor) {
                    Some(val) => val.clone(),
                    None => return Err(error!(OutOfData)),
                };
                self.data_cursor += 1;
                let var = self.var_mut(*dst)?;
                let val = if var.ty().is_string() && val.is_numeric() {
                    Val::from(val.to_string())
                } else {
                    val
                };
                var.set(None, None, val)
            }
            Op::Restore(cursor) => {
                if *cursor > self.program.data_len() {
                    return Err(error!(IllegalFunctionCall));
                }
                self.data_cursor = *cursor;
                Ok(())
            }

            Op::Neg(a, d) => self.unary(*a, *d, Operation::negate),
            Op::Not(a, d) => self.unary(*a, *d, Operation::not),
            Op::Add(a, b, d) => self.binary(*a, *b, *d, Operation::add),
            Op::Sub(a, b, d) => self.binary(*a, *b, *d, Operation::subtract),
            Op::Mul(a, b, d) => self.binary(*a, *b, *d, Operation::multiply),
            Op::Div(a, b, d) => self.binary(*a, *b, *d, Operation::divide),
            Op::IDiv(a, b, d) => self.binary(*a, *b, *d, Operation::divide_int),
            Op::Mod(a, b, d) => self.binary(*a, *b, *d, Operation::modulo),
            Op::Pow(a, b, d) => self.binary(*a, *b, *d, Operation::power),
            Op::Eq(a, b, d) => self.binary(*a, *b, *d, Operation::equal),
            Op::NotEq(a, b, d) => self.binary(*a, *b, *d, Operation::not_equal),
            Op::Lt(a, b, d) => self.binary(*a, *b, *d, Operation::less),
            Op::LtEq(a, b, d) => self.binary(*a, *b, *d, Operation::less_equal),
            Op::Gt(a, b, d) => self.binary(*a, *b, *d, Operation::greater),
            Op::GtEq(a, b, d) => self.binary(*a, *b, *d, Operation::greater_equal),
            Op::And(a, b, d) => self.binary(*a, *b, *d, Operation::and),
            Op::Or(a, b, d) => self.binary(*a, *b, *d, Operation::or),
            Op::Xor(a, b, d) => self.binary(*a, *b, *d, Operation::xor),
            Op::Eqv(a, b, d) => self.binary(*a, *b, *d, Operation::eqv),
            Op::Imp(a, b, d) => self.binary(*a, *b, *d, Operation::imp),
            Op::ToInt(a, d) => self.unary(*a, *d, Val::to_integer),
            Op::ToLong(a, d) => self.unary(*a, *d, Val::to_long),
            Op::ToSingle(a, d) => self.unary(*a, *d, Val::to_single),
            Op::ToDouble(a, d) => self.unary(*a, *d, Val::to_double),

            Op::Fn(builtin, args, dst) => {
                let args = args
                    .iter()
                    .map(|s| self.val(*s))
                    .collect::<Result<Vec<Val>>>()?;
                let val = Function::call(*builtin, &args)?;
                self.store(*dst, val)
            }
            Op::Rnd(arg, dst) => {
                let arg = self.opt_num(*arg)?.map(|n| n as f32);
                let val = Val::Single(self.rnd.rnd(arg));
                self.store(*dst, val)
            }
            Op::Randomize(Some(slot)) => {
                let n = self.num(*slot)?;
                self.rnd.randomize(n);
                Ok(())
            }
            Op::Randomize(None) => {
                self.rnd.randomize_entropy();
                Ok(())
            }

            Op::Print(slot) => {
                let text = self.val(*slot)?.print_format();
                self.print(&text)
            }
            Op::PrintComma => {
                let n = 14 - self.column % 14;
                self.print(&" ".repeat(n))
            }
            Op::PrintNewline => self.print("\n"),
            Op::PrintTab(slot) => {
                let target = self.count(*slot)?.max(1) - 1;
                if self.column > target {
                    self.print(&format!("\n{}", " ".repeat(target)))
                } else {
                    self.print(&" ".repeat(target - self.column))
                }
            }
            Op::PrintSpc(slot) => {
                let n = self.count(*slot)?;
                self.print(&" ".repeat(n))
            }
            Op::Input(spec) => {
                self.prompt(spec)?;
                self.poll_input(Pending::Input(Rc::clone(spec)))
            }
            Op::LineInput(spec) => {
                self.prompt(spec)?;
                self.poll_input(Pending::LineInput(Rc::clone(spec)))
            }
            Op::InputFunc(count, dst) => {
                let n = self.int(*count)?;
                if !(1..=32767).contains(&n) {
                    return Err(error!(IllegalFunctionCall));
                }
                match self.device.inkey_wait(n as usize)? {
                    Poll::Ready(keys) => self.store(*dst, Val::from(keys)),
                    Poll::Pending => {
                        self.pending = Some(Pending::Keys(n as usize, *dst));
                        Ok(())
                    }
                }
            }
            Op::Inkey(dst) => {
                let key = self.device.inkey()?;
                self.store(*dst, Val::from(key))
            }
            Op::Sleep(seconds) => {
                let seconds = self.opt_num(*seconds)?;
                if let Poll::Pending = self.device.sleep(seconds)? {
                    self.pending = Some(Pending::Sleep(seconds));
                }
                Ok(())
            }
            Op::Cls(kind) => {
                match kind.map(|s| self.int(s)).transpose()? {
                    None | Some(0) => self.device.cls()?,
                    Some(1) => return self.device.cls_graphics(),
                    Some(2) => self.device.cls_text()?,
                    Some(_) => return Err(error!(IllegalFunctionCall)),
                }
                self.column = 0;
                Ok(())
            }
            Op::Locate(row, column) => {
                let (row, column) = (self.opt_u16(*row)?, self.opt_u16(*column)?);
                self.device.locate(row, column)?;
                if let Some(column) = column {
                    self.column = column as usize - 1;
                }
                Ok(())
            }
            Op::Color(fg, bg) => {
                let (fg, bg) = (self.opt_byte(*fg)?, self.opt_byte(*bg)?);
                self.device.set_colors(fg, bg)
            }
            Op::ViewPrint(Some((top, bottom))) => {
                let (top, bottom) = (self.int(*top)?, self.int(*bottom)?);
                let lines = self.device.screen_lines()? as i32;
                if top < 1 || top > bottom || bottom > lines {
                    return Err(error!(IllegalFunctionCall));
                }
                self.device.set_view_print(Some((top as u16, bottom as u16)))
            }
            Op::ViewPrint(None) => self.device.set_view_print(None),

            Op::Screen(mode, color_switch, active, visible) => {
                let mode = self.byte(*mode)?;
                if !SCREEN_MODES.contains(&mode) {
                    return Err(error!(IllegalFunctionCall));
                }
                let color_switch = self.opt_byte(*color_switch)?;
                let (active, visible) = (self.opt_byte(*active)?, self.opt_byte(*visible)?);
                self.column = 0;
                self.device.screen(mode, color_switch, active, visible)
            }
            Op::Pset(coord, color) => {
                let (at, color) = (self.point(*coord)?, self.opt_byte(*color)?);
                self.device.pset(at, color)
            }
            Op::Preset(coord, color) => {
                let (at, color) = (self.point(*coord)?, self.opt_byte(*color)?);
                self.device.preset(at, color)
            }
            Op::Point(x, y, dst) => {
                let at = Point::new(self.int(*x)?, self.int(*y)?);
                let color = self.device.point(at)?;
                self.store(*dst, Val::Integer(color as i16))
            }
            Op::Line(spec) => self.line(spec),
            Op::Circle(spec) => self.circle(spec),
            Op::Paint(coord, fill, border) => {
                let at = self.point(*coord)?;
                let (fill, border) = (self.opt_byte(*fill)?, self.opt_byte(*border)?);
                let count = self.device.paint(at, fill, border)?;
                debug!(x = at.x, y = at.y, count, "paint");
                Ok(())
            }
            Op::Draw(slot) => {
                let commands = draw::parse(&self.text(*slot)?)?;
                self.device.draw(&commands)
            }
            Op::GetGraphics(from, to, array, index) => {
                let (from, to) = (self.point(*from)?, self.point(*to)?);
                let index = self.indices(index)?;
                let sprite = self.device.get_graphics(from, to)?;
                self.store_sprite(*array, index, &sprite)
            }
            Op::PutGraphics(coord, array, index, mode) => {
                let at = self.point(*coord)?;
                let index = self.indices(index)?;
                let sprite = self.load_sprite(*array, index)?;
                self.put(at, &sprite, *mode)
            }
            Op::Palette(Some((attribute, color))) => {
                let attribute = self.byte(*attribute)?;
                let color = u32::try_from(self.int(*color)?)
                    .map_err(|_| error!(IllegalFunctionCall))?;
                if color & !0x3F3F3F != 0 {
                    return Err(error!(IllegalFunctionCall));
                }
                self.device.set_palette(attribute, color)
            }
            Op::Palette(None) => self.device.reset_palette(),
            Op::View(Some(spec)) => self.view(spec),
            Op::View(None) => self.device.set_view(None),
        }
    }

    fn dim(&mut self, slot: Slot, ty: &Type, bounds: &[(Slot, Slot)]) -> Result<()> {
        let dims = bounds
            .iter()
            .map(|(l, u)| Ok(Dim::new(self.int(*l)?, self.int(*u)?)))
            .collect::<Result<Vec<Dim>>>()?;
        let var = Var::array(ty.clone(), dims)?;
        *self.var_mut(slot)? = var;
        Ok(())
    }

    fn bound(&mut self, slot: Slot, dim: Option<Slot>, dst: Slot, upper: bool) -> Result<()> {
        let dim = match dim {
            Some(s) => usize::try_from(self.int(s)?).map_err(|_| error!(SubscriptOutOfRange))?,
            None => 1,
        };
        let n = match self.stack.get(self.index(slot)) {
            Some(var) => var.bound(dim, upper)?,
            None => return Err(error!(SubscriptOutOfRange)),
        };
        self.store(dst, Val::Long(n))
    }

    /// ON n GOTO/GOSUB: 1-based selection, anything past the list falls through.
    fn select(&self, slot: Slot, targets: &[Address]) -> Result<Option<Address>> {
        let n = self.int(slot)?;
        if !(0..=255).contains(&n) {
            return Err(error!(IllegalFunctionCall));
        }
        Ok((n as usize)
            .checked_sub(1)
            .and_then(|i| targets.get(i))
            .copied())
    }

    fn gosub(&mut self, addr: Address) -> Result<()> {
        let (offset, params) = {
            let frame = self.frames.current();
            (frame.offset, Rc::clone(&frame.params))
        };
        self.frames.current_mut().pc = self.pc;
        self.frames.push(FrameKind::Gosub, addr, offset, params, None)?;
        self.pc = addr;
        Ok(())
    }

    fn call(
        &mut self,
        kind: FrameKind,
        addr: Address,
        size: usize,
        args: &[Slot],
        result: Option<usize>,
    ) -> Result<()> {
        let params: Rc<[usize]> = args.iter().map(|s| self.index(*s)).collect();
        let offset = self.frames.current().offset + size;
        if params.iter().any(|p| *p >= offset) {
            return Err(error!(InternalError; "ARGUMENT ABOVE FRAME"));
        }
        if result.map_or(false, |r| r >= offset) {
            return Err(error!(InternalError; "RESULT ABOVE FRAME"));
        }
        self.stack.truncate(offset);
        self.frames.current_mut().pc = self.pc;
        self.frames.push(kind, addr, offset, params, result)?;
        debug!(?kind, addr, offset, depth = self.frames.depth(), "call");
        self.pc = addr;
        Ok(())
    }

    fn resume(&mut self, pc: Address) -> Result<()> {
        if !self.in_handler {
            return Err(error!(ResumeWithoutError));
        }
        debug!(pc, code = self.err_code, "resume");
        self.in_handler = false;
        self.err_code = 0;
        self.pc = pc;
        Ok(())
    }

    fn prompt(&mut self, spec: &InputSpec) -> Result<()> {
        if let Some(prompt) = spec.prompt {
            let text = self.text(prompt)?;
            self.print(&text)?;
        }
        if spec.question {
            self.print("? ")?;
        }
        Ok(())
    }

    fn poll_input(&mut self, pending: Pending) -> Result<()> {
        match self.device.input()? {
            Poll::Ready(text) => self.complete(pending, text),
            Poll::Pending => {
                self.pending = Some(pending);
                Ok(())
            }
        }
    }

    fn complete(&mut self, pending: Pending, text: String) -> Result<()> {
        self.column = 0;
        match pending {
            Pending::Input(spec) => match self.parse_input(&spec.targets, &text)? {
                Some(vals) => {
                    for (slot, val) in spec.targets.iter().zip(vals) {
                        self.var_mut(*slot)?.set(None, None, val)?;
                    }
                    Ok(())
                }
                None => {
                    self.print("Redo from start\n")?;
                    self.prompt(&spec)?;
                    self.poll_input(Pending::Input(spec))
                }
            },
            Pending::LineInput(spec) => match spec.targets.first() {
                Some(slot) => self.var_mut(*slot)?.set(None, None, Val::from(text)),
                None => Err(error!(InternalError; "LINE INPUT WITHOUT TARGET")),
            },
            Pending::Keys(n, dst) => {
                let keys: String = text.chars().take(n).collect();
                self.store(dst, Val::from(keys))
            }
            Pending::Sleep(_) => Ok(()),
        }
    }

    /// Split an INPUT reply into values for the target types. `None`
    /// means the reply does not fit and must be entered again.
    fn parse_input(&self, targets: &[Slot], text: &str) -> Result<Option<Vec<Val>>> {
        let fields = input_fields(text);
        if fields.len() != targets.len() {
            return Ok(None);
        }
        let mut vals = Vec::with_capacity(fields.len());
        for (slot, (field, quoted)) in targets.iter().zip(fields) {
            let ty = match self.stack.get(self.index(*slot)) {
                Some(var) => var.ty().clone(),
                None => Type::Any,
            };
            let val = if ty.is_string() || (ty == Type::Any && (quoted || !is_number(&field))) {
                Val::from(field)
            } else if quoted || !is_number(&field) {
                return Ok(None);
            } else {
                let n = parse_number(&field);
                if ty.coerce(Val::Double(n)).is_err() {
                    return Ok(None);
                }
                Val::Double(n)
            };
            vals.push(val);
        }
        Ok(Some(vals))
    }

    fn line(&mut self, spec: &LineSpec) -> Result<()> {
        let from = spec.from.map(|c| self.point(c)).transpose()?;
        let base = match (spec.to.step, from) {
            (false, _) => None,
            (true, Some(p)) => Some(p),
            (true, None) => Some(self.device.pen()?),
        };
        let to = self.offset_point(spec.to, base)?;
        let color = self.opt_byte(spec.color)?;
        let style = match spec.style {
            Some(s) => (self.int(s)? & 0xFFFF) as u16,
            None => 0xFFFF,
        };
        self.device.line(from, to, color, spec.shape, style)
    }

    fn circle(&mut self, spec: &CircleSpec) -> Result<()> {
        let center = self.point(spec.center)?;
        let radius = self.num(spec.radius)?;
        if radius > i16::MAX as f64 {
            return Err(error!(Overflow));
        }
        let color = self.opt_byte(spec.color)?;
        let start = self.opt_num(spec.start)?;
        let end = self.opt_num(spec.end)?;
        let aspect = self.opt_num(spec.aspect)?;
        for angle in [start, end].iter().flatten() {
            if angle.abs() > 2.0 * std::f64::consts::PI + 1e-6 {
                return Err(error!(IllegalFunctionCall));
            }
        }
        self.device.circle(center, radius, color, start, end, aspect)
    }

    fn view(&mut self, spec: &ViewSpec) -> Result<()> {
        let from = self.point(spec.from)?;
        let to = self.point(spec.to)?;
        let fill = self.opt_byte(spec.fill)?;
        let border = self.opt_byte(spec.border)?;
        self.device.set_view(Some(View {
            from,
            to,
            fill,
            border,
        }))
    }

    fn put(&mut self, at: Point, sprite: &Sprite, mode: PutMode) -> Result<()> {
        self.device.put_graphics(at, sprite, mode)
    }

    /// GET stores `[width, height, pixels...]` from the selected element on.
    fn store_sprite(&mut self, array: Slot, index: Option<Vec<i32>>, sprite: &Sprite) -> Result<()> {
        let var = self.var_mut(array)?;
        if !var.is_array() {
            return Err(error!(IllegalFunctionCall));
        }
        let start = match &index {
            Some(index) => var.offset(index)?,
            None => 0,
        };
        let needed = 2 + sprite.pixels().len();
        if start + needed > var.len() {
            return Err(error!(IllegalFunctionCall));
        }
        var.set_element(start, Val::Long(sprite.width() as i32))?;
        var.set_element(start + 1, Val::Long(sprite.height() as i32))?;
        for (i, pixel) in sprite.pixels().iter().enumerate() {
            var.set_element(start + 2 + i, Val::Integer(*pixel as i16))?;
        }
        Ok(())
    }

    fn load_sprite(&self, array: Slot, index: Option<Vec<i32>>) -> Result<Sprite> {
        let var = match self.stack.get(self.index(array)) {
            Some(var) if var.is_array() => var,
            _ => return Err(error!(IllegalFunctionCall)),
        };
        let start = match &index {
            Some(index) => var.offset(index)?,
            None => 0,
        };
        let size = |v: Val| -> Result<usize> {
            usize::try_from(v.to_i32()?).map_err(|_| error!(IllegalFunctionCall))
        };
        let width = size(var.element(start))?;
        let height = size(var.element(start + 1))?;
        let count = width
            .checked_mul(height)
            .ok_or_else(|| error!(IllegalFunctionCall))?;
        if width == 0 || height == 0 || start + 2 + count > var.len() {
            return Err(error!(IllegalFunctionCall));
        }
        let pixels = (0..count)
            .map(|i| {
                let n = var.element(start + 2 + i).to_i32()?;
                u8::try_from(n).map_err(|_| error!(IllegalFunctionCall))
            })
            .collect::<Result<Vec<u8>>>()?;
        Ok(Sprite::new(width, height, pixels))
    }
}

/// Comma separated INPUT fields. Quoted fields keep their commas and
/// spaces; unquoted fields are trimmed.
fn input_fields(text: &str) -> Vec<(String, bool)> {
    let mut fields = vec![];
    let mut chars = text.chars().peekable();
    loop {
        while chars.peek() == Some(&' ') {
            chars.next();
        }
        let mut field = String::new();
        let quoted = chars.peek() == Some(&'"');
        if quoted {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                field.push(ch);
            }
            for ch in chars.by_ref() {
                if ch == ',' {
                    break;
                }
            }
            fields.push((field, true));
            if chars.peek().is_none() && !text.trim_end().ends_with(',') {
                break;
            }
            continue;
        }
        let mut more = false;
        for ch in chars.by_ref() {
            if ch == ',' {
                more = true;
                break;
            }
            field.push(ch);
        }
        fields.push((field.trim().to_string(), false));
        if !more {
            break;
        }
    }
    fields
}

fn is_number(field: &str) -> bool {
    let t = field.trim().to_ascii_uppercase();
    if t.is_empty() {
        return true;
    }
    if let Some(hex) = t.strip_prefix("&H") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(oct) = t.strip_prefix("&O").or_else(|| t.strip_prefix('&')) {
        return !oct.is_empty() && oct.chars().all(|c| ('0'..='7').contains(&c));
    }
    t.chars().all(|c| c.is_ascii_digit() || "+-.ED".contains(c))
        && t.replace('D', "E").parse::<f64>().is_ok()
}
