//! Concrete interpreter for REIL.
//!
//! The [Interpreter] executes a [reil::ReilProgram] against a register file and a sparse
//! byte-addressable memory. Registers and memory bytes are either defined or undefined; reading
//! anything undefined is an error rather than an implicit zero.
//!
//! ### Policies
//!
//! A [CpuPolicy] names the program counter and the native registers of the target architecture.
//! An [InterpreterPolicy] is notified as execution progresses and may emulate `UNKN`
//! instructions, such as system calls, that the interpreter cannot execute on its own.

mod config;
mod error;
mod interpreter;
mod mem;
mod policy;
mod registers;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::interpreter::*;
pub use crate::mem::*;
pub use crate::policy::*;
pub use crate::registers::*;
