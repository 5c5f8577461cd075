//! # BASIC virtual machine
//!
//! A bytecode interpreter for a BASIC-family language and the raster
//! graphics engine its graphics statements drive.
//!
//! A compiler assembles instructions with [`Link`](mach::Link), which
//! resolves line numbers and labels into a [`Program`](mach::Program).
//! A [`Runtime`](mach::Runtime) executes the program in bounded batches
//! against a presentation [`Device`](dev::Device). Programs suspend on
//! INPUT and SLEEP and the host resumes them.
//!
//! ```
//! use basic::dev::DebugDevice;
//! use basic::mach::{Event, Link, Opcode, Runtime, Val};
//!
//! let mut link = Link::new();
//! let hello = link.constant(Val::from("HELLO"));
//! link.line(10);
//! link.push(Opcode::Print(hello));
//! link.push(Opcode::PrintNewline);
//! let program = link.link().unwrap();
//!
//! let mut runtime = Runtime::new(program, DebugDevice::new());
//! assert_eq!(runtime.execute(100), Event::Stopped);
//! assert_eq!(runtime.device().output(), "HELLO\n");
//! ```

pub mod dev;
pub mod gfx;
pub mod lang;
pub mod mach;
pub mod term;
