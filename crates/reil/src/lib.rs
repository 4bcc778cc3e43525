//! Model of the Reverse Engineering Intermediate Language (REIL). REIL is a small three-operand
//! language where every instruction has explicit operand sizes. Native instructions are
//! translated into sequences of REIL instructions whose addresses are the native address plus a
//! sub-index.

mod error;
mod function;
mod instruction;
mod opcode;
mod operand;
mod size;
mod value;

pub use crate::error::*;
pub use crate::function::*;
pub use crate::instruction::*;
pub use crate::opcode::*;
pub use crate::operand::*;
pub use crate::size::*;
pub use crate::value::*;
