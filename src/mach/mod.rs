/*!
## Rust Machine Module

This Rust module is the virtual machine for BASIC. It executes a linked
[`Program`](Program) against a typed stack and a presentation device.

*/

pub type Address = usize;
pub type Symbol = isize;

/// A stack address. With [`GLOBAL`](GLOBAL) set it is absolute,
/// otherwise it is relative to the current frame.
pub type Slot = u32;
pub const GLOBAL: Slot = 0x8000_0000;

/// Maximum number of stack slots.
pub const STACK_LIMIT: usize = 0x10000;
/// Maximum call depth. Exceeding it is OUT OF STACK SPACE.
pub const FRAME_LIMIT: usize = 4096;
/// Maximum elements in one array. Exceeding it is OUT OF MEMORY.
pub const ARRAY_LIMIT: usize = 1 << 20;
/// Step quota the terminal host passes to [`Runtime::execute`](Runtime::execute).
pub const DEFAULT_CYCLES: usize = 5000;

mod frame;
mod function;
mod link;
mod opcode;
mod operation;
mod program;
mod runtime;
mod stack;
mod val;
mod var;

pub use frame::{Frame, FrameKind, Frames};
pub use function::{Builtin, Function, Rnd};
pub use link::Link;
pub use opcode::{CircleSpec, Coord, InputSpec, LineSpec, Opcode, ViewSpec};
pub use operation::Operation;
pub use program::Program;
pub use runtime::{Event, Runtime, Wait};
pub use stack::Stack;
pub use val::{round_even, wrap_integer, wrap_long, Record, RecordType, Type, Val};
pub use var::{Dim, Var};
