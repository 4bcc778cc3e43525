//! Translation of decoded x86 and x86-64 instructions into REIL.
//!
//! The input is an [Instruction] made of a mnemonic and a list of [OperandTree]s as produced by an
//! external decoder. [translate] lowers it into REIL instructions addressed by the native address
//! of the instruction and their position in the translation.
//!
//! ### Registers
//!
//! Native registers are described by an [Environment]. Overlapping registers such as `al`, `ax`,
//! `eax` and `rax` share storage: the generated REIL only names the outermost register and
//! extracts or merges the bits of the narrower ones.
//!
//! ### Flags
//!
//! Each status flag is a separate byte-sized REIL register holding 0 or 1. See [flags] for the
//! names used.

mod conditions;
mod emitter;
mod environment;
mod error;
mod instruction;
mod lower;
mod mnemonic;
mod operand;
mod translate;

/// Names of the flag registers written by translated code.
pub mod flags;

pub use crate::conditions::Condition;
pub use crate::environment::*;
pub use crate::error::*;
pub use crate::instruction::Instruction;
pub use crate::mnemonic::*;
pub use crate::operand::*;
pub use crate::translate::{translate, translate_function};
