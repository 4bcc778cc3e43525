//! The opcode of a REIL instruction determines its semantics. Every instruction has three operand
//! slots. The first two are inputs and the third is the output, except for [Opcode::Stm] where the
//! third operand is the store address and [Opcode::Jcc] where it is the jump target.
use crate::Error;

/// A representation of opcodes for REIL instructions.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Opcode {
    /// Add two inputs: `x + y`.
    Add,

    /// Bitwise and of two inputs: `x & y`.
    And,

    /// Boolean is-zero: the output is 1 if the input is 0 and 0 otherwise.
    Bisz,

    /// Shift the first input by the second. A positive shift amount shifts left, a negative
    /// amount shifts right. The sign is taken from the size of the second operand.
    Bsh,

    /// Unsigned division: `x / y`.
    Div,

    /// Jump to the third operand if the first operand is not zero.
    Jcc,

    /// Load the value at the address given by the first operand into the third operand.
    Ldm,

    /// Unsigned remainder: `x % y`.
    Mod,

    /// Multiply two inputs: `x * y`.
    Mul,

    /// No operation.
    Nop,

    /// Bitwise complement of the first input: `!x`.
    Not,

    /// Bitwise inclusive-or of two inputs: `x | y`.
    Or,

    /// Store the first operand at the address given by the third operand.
    Stm,

    /// Copy the first operand into the third operand.
    Str,

    /// Subtract the second input from the first: `x - y`.
    Sub,

    /// Mark the third operand as undefined.
    Undef,

    /// Placeholder for native semantics that were not translated.
    Unknown,

    /// Bitwise exclusive-or of two inputs: `x ^ y`.
    Xor,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::And => "and",
            Self::Bisz => "bisz",
            Self::Bsh => "bsh",
            Self::Div => "div",
            Self::Jcc => "jcc",
            Self::Ldm => "ldm",
            Self::Mod => "mod",
            Self::Mul => "mul",
            Self::Nop => "nop",
            Self::Not => "not",
            Self::Or => "or",
            Self::Stm => "stm",
            Self::Str => "str",
            Self::Sub => "sub",
            Self::Undef => "undef",
            Self::Unknown => "unkn",
            Self::Xor => "xor",
        }
    }

    /// Whether the third operand is written by this opcode.
    pub fn writes_output(self) -> bool {
        !matches!(self, Self::Jcc | Self::Nop | Self::Stm | Self::Unknown)
    }
}

impl std::str::FromStr for Opcode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let opcode = match s.to_ascii_lowercase().as_str() {
            "add" => Self::Add,
            "and" => Self::And,
            "bisz" => Self::Bisz,
            "bsh" => Self::Bsh,
            "div" => Self::Div,
            "jcc" => Self::Jcc,
            "ldm" => Self::Ldm,
            "mod" => Self::Mod,
            "mul" => Self::Mul,
            "nop" => Self::Nop,
            "not" => Self::Not,
            "or" => Self::Or,
            "stm" => Self::Stm,
            "str" => Self::Str,
            "sub" => Self::Sub,
            "undef" => Self::Undef,
            "unkn" | "unknown" => Self::Unknown,
            "xor" => Self::Xor,
            _ => return Err(Error::UnknownOpcode(s.to_owned())),
        };

        Ok(opcode)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
