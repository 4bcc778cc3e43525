//! Condition codes shared by Jcc, SETcc, CMOVcc and LOOPcc. Each condition is a boolean
//! combination of status flags evaluated into a byte-sized 0 or 1 without modifying any flag.
use reil::{Opcode, OperandSize, ReilOperand};

use crate::emitter::Emitter;
use crate::flags::{flag, CARRY, OVERFLOW, PARITY, SIGN, ZERO};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Overflow: OF = 1
    O,

    /// Not overflow: OF = 0
    No,

    /// Below: CF = 1
    B,

    /// Above or equal: CF = 0
    Ae,

    /// Equal: ZF = 1
    E,

    /// Not equal: ZF = 0
    Ne,

    /// Below or equal: CF = 1 or ZF = 1
    Be,

    /// Above: CF = 0 and ZF = 0
    A,

    /// Sign: SF = 1
    S,

    /// Not sign: SF = 0
    Ns,

    /// Parity even: PF = 1
    P,

    /// Parity odd: PF = 0
    Np,

    /// Less: SF != OF
    L,

    /// Greater or equal: SF = OF
    Ge,

    /// Less or equal: ZF = 1 or SF != OF
    Le,

    /// Greater: ZF = 0 and SF = OF
    G,
}

impl Condition {
    /// Parse a condition code suffix such as the `nz` of `jnz`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        let condition = match suffix {
            "o" => Self::O,
            "no" => Self::No,
            "b" | "c" | "nae" => Self::B,
            "ae" | "nc" | "nb" => Self::Ae,
            "e" | "z" => Self::E,
            "ne" | "nz" => Self::Ne,
            "be" | "na" => Self::Be,
            "a" | "nbe" => Self::A,
            "s" => Self::S,
            "ns" => Self::Ns,
            "p" | "pe" => Self::P,
            "np" | "po" => Self::Np,
            "l" | "nge" => Self::L,
            "ge" | "nl" => Self::Ge,
            "le" | "ng" => Self::Le,
            "g" | "nle" => Self::G,
            _ => return None,
        };

        Some(condition)
    }

    /// The condition that holds exactly when this one does not.
    pub fn negate(self) -> Self {
        match self {
            Self::O => Self::No,
            Self::No => Self::O,
            Self::B => Self::Ae,
            Self::Ae => Self::B,
            Self::E => Self::Ne,
            Self::Ne => Self::E,
            Self::Be => Self::A,
            Self::A => Self::Be,
            Self::S => Self::Ns,
            Self::Ns => Self::S,
            Self::P => Self::Np,
            Self::Np => Self::P,
            Self::L => Self::Ge,
            Self::Ge => Self::L,
            Self::Le => Self::G,
            Self::G => Self::Le,
        }
    }

    fn is_negated(self) -> bool {
        matches!(
            self,
            Self::No | Self::Ae | Self::Ne | Self::A | Self::Ns | Self::Np | Self::Ge | Self::G
        )
    }
}

impl Emitter<'_> {
    /// Evaluate a condition into a byte-sized boolean.
    pub fn condition(&mut self, condition: Condition) -> ReilOperand {
        let byte = OperandSize::Byte;
        match condition {
            Condition::O => self.unary(Opcode::Str, &flag(OVERFLOW), byte),
            Condition::B => self.unary(Opcode::Str, &flag(CARRY), byte),
            Condition::E => self.unary(Opcode::Str, &flag(ZERO), byte),
            Condition::S => self.unary(Opcode::Str, &flag(SIGN), byte),
            Condition::P => self.unary(Opcode::Str, &flag(PARITY), byte),
            Condition::Be => self.binary(Opcode::Or, &flag(CARRY), &flag(ZERO), byte),
            Condition::L => self.binary(Opcode::Xor, &flag(SIGN), &flag(OVERFLOW), byte),
            Condition::Le => {
                let less = self.binary(Opcode::Xor, &flag(SIGN), &flag(OVERFLOW), byte);
                self.binary(Opcode::Or, &flag(ZERO), &less, byte)
            }
            _ => {
                debug_assert!(condition.is_negated());
                let positive = self.condition(condition.negate());
                self.unary(Opcode::Bisz, &positive, byte)
            }
        }
    }
}
