use super::{Address, Opcode, Program, Slot, Symbol, Val, GLOBAL};
use crate::error;
use crate::lang::{Error, LineNumber};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// ## Program assembler
///
/// Collects instructions, constants and DATA, then patches branch targets.
/// Line numbers are their own symbols; `next_symbol` hands out negative
/// symbols for compiler-generated labels.

#[derive(Debug, Default)]
pub struct Link {
    current_symbol: Symbol,
    line_number: LineNumber,
    ops: Vec<Opcode>,
    lines: Vec<LineNumber>,
    statements: Vec<Address>,
    constants: Vec<Val>,
    data: Vec<usize>,
    module_frozen: bool,
    symbols: BTreeMap<Symbol, Address>,
    unlinked: HashMap<Address, Vec<Symbol>>,
    errors: Vec<Error>,
}

impl Link {
    pub fn new() -> Link {
        Link::default()
    }

    /// Address the next instruction will have.
    pub fn len(&self) -> Address {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Begin a numbered source line. Also begins a statement.
    pub fn line(&mut self, number: u32) {
        self.line_number = Some(number);
        self.symbols.insert(number as Symbol, self.ops.len());
        self.statement();
    }

    /// Mark the next instruction as the start of a statement.
    pub fn statement(&mut self) {
        let addr = self.ops.len();
        if self.statements.last() != Some(&addr) {
            self.statements.push(addr);
        }
    }

    pub fn push(&mut self, op: Opcode) -> Address {
        self.ops.push(op);
        self.lines.push(self.line_number);
        self.ops.len() - 1
    }

    /// Intern a constant and return its absolute slot.
    pub fn constant(&mut self, val: Val) -> Slot {
        if let Some(idx) = self.constants.iter().position(|c| c == &val) {
            return GLOBAL | idx as Slot;
        }
        if self.module_frozen {
            self.errors
                .push(error!(InternalError, self.line_number; "CONSTANT AFTER MODULE SLOT"));
        }
        self.constants.push(val);
        GLOBAL | (self.constants.len() - 1) as Slot
    }

    /// Absolute slot of a module-level variable, for SHARED access from
    /// inside a SUB or FUNCTION. Module variables sit just above the
    /// constants, so the constant pool must be complete by now.
    pub fn module_slot(&mut self, local: Slot) -> Slot {
        self.module_frozen = true;
        GLOBAL | (self.constants.len() as Slot + local)
    }

    /// Append a DATA item.
    pub fn data(&mut self, val: Val) {
        let slot = self.constant(val);
        self.data.push((slot & !GLOBAL) as usize);
    }

    /// Offset RESTORE uses to return to the items appended from here on.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    pub fn next_symbol(&mut self) -> Symbol {
        self.current_symbol -= 1;
        self.current_symbol
    }

    /// Bind a symbol to the next instruction.
    pub fn label(&mut self, symbol: Symbol) {
        self.symbols.insert(symbol, self.ops.len());
    }

    /// Push a branching instruction whose target is resolved at link time.
    pub fn branch(&mut self, op: Opcode, symbol: Symbol) -> Address {
        let addr = self.push(op);
        self.unlinked.insert(addr, vec![symbol]);
        addr
    }

    /// Push ON GOTO or ON GOSUB with one symbol per case.
    pub fn branch_many(&mut self, op: Opcode, symbols: &[Symbol]) -> Address {
        let addr = self.push(op);
        self.unlinked.insert(addr, symbols.to_vec());
        addr
    }

    fn line_number_for(&self, op_addr: Address) -> LineNumber {
        self.lines.get(op_addr).copied().flatten()
    }

    pub fn link(mut self) -> Result<Program, Vec<Error>> {
        let mut errors = std::mem::take(&mut self.errors);
        let mut unlinked: Vec<(Address, Vec<Symbol>)> =
            std::mem::take(&mut self.unlinked).into_iter().collect();
        unlinked.sort_by_key(|(addr, _)| *addr);
        for (op_addr, symbols) in unlinked {
            let line_number = self.line_number_for(op_addr);
            let mut targets = Vec::with_capacity(symbols.len());
            for symbol in &symbols {
                match self.symbols.get(symbol) {
                    Some(dest) => targets.push(*dest),
                    None if *symbol >= 0 => {
                        errors.push(error!(UndefinedLine, line_number));
                    }
                    None => errors.push(error!(InternalError, line_number; "LINK FAILURE")),
                }
            }
            if targets.len() != symbols.len() {
                continue;
            }
            match self.ops.get(op_addr).and_then(|op| patch(op, &targets)) {
                Some(op) => self.ops[op_addr] = op,
                None => errors.push(error!(InternalError, line_number; "NOT A BRANCH")),
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Program::new(
            self.ops,
            self.constants,
            self.data,
            self.statements,
            self.lines,
        ))
    }
}

fn patch(op: &Opcode, targets: &[Address]) -> Option<Opcode> {
    use Opcode::*;
    let op = match (op, targets) {
        (Jump(_), [a]) => Jump(*a),
        (IfNot(s, _), [a]) => IfNot(*s, *a),
        (Gosub(_), [a]) => Gosub(*a),
        (Return(_), [a]) => Return(Some(*a)),
        (OnErrorGoto(_), [a]) => OnErrorGoto(Some(*a)),
        (ResumeAt(_), [a]) => ResumeAt(*a),
        (CallSub(_, size, args), [a]) => CallSub(*a, *size, Rc::clone(args)),
        (CallFunction(_, size, args, r), [a]) => CallFunction(*a, *size, Rc::clone(args), *r),
        (OnGoto(s, _), t) => OnGoto(*s, t.into()),
        (OnGosub(s, _), t) => OnGosub(*s, t.into()),
        _ => return None,
    };
    Some(op)
}
