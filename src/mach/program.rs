use super::{Address, Opcode, Val};
use crate::lang::LineNumber;

/// ## Linked program
///
/// Immutable once built by [`Link`](super::Link). Constants are copied to
/// the bottom of the stack when a runtime loads the program. `data` holds
/// constant pool indices consumed by READ. `statements` lists the first
/// instruction of every statement in ascending order.

#[derive(Debug, Default)]
pub struct Program {
    ops: Vec<Opcode>,
    constants: Vec<Val>,
    data: Vec<usize>,
    statements: Vec<Address>,
    lines: Vec<LineNumber>,
}

impl Program {
    pub(super) fn new(
        ops: Vec<Opcode>,
        constants: Vec<Val>,
        data: Vec<usize>,
        statements: Vec<Address>,
        lines: Vec<LineNumber>,
    ) -> Program {
        Program {
            ops,
            constants,
            data,
            statements,
            lines,
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[Opcode] {
        &self.ops
    }

    pub fn op(&self, pc: Address) -> Option<&Opcode> {
        self.ops.get(pc)
    }

    pub fn constants(&self) -> &[Val] {
        &self.constants
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// The DATA item at a read cursor.
    pub fn data(&self, cursor: usize) -> Option<&Val> {
        self.data.get(cursor).and_then(|idx| self.constants.get(*idx))
    }

    /// Source line an instruction was compiled from.
    pub fn line(&self, pc: Address) -> LineNumber {
        self.lines.get(pc).copied().flatten()
    }

    /// First instruction of the statement containing `pc`.
    pub fn statement_start(&self, pc: Address) -> Address {
        let idx = self.statements.partition_point(|s| *s <= pc);
        match idx.checked_sub(1) {
            Some(i) => self.statements[i],
            None => 0,
        }
    }

    /// First instruction of the statement after the one containing `pc`.
    pub fn next_statement(&self, pc: Address) -> Address {
        let idx = self.statements.partition_point(|s| *s <= pc);
        match self.statements.get(idx) {
            Some(addr) => *addr,
            None => self.ops.len(),
        }
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (pc, op) in self.ops.iter().enumerate() {
            match self.line(pc) {
                Some(line) => writeln!(f, "{:>5} {:>5}  {}", pc, line, op)?,
                None => writeln!(f, "{:>5}        {}", pc, op)?,
            }
        }
        Ok(())
    }
}
