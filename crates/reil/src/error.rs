use crate::{OperandSize, ReilAddress};

/// Errors describing a malformed REIL instruction model.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown REIL opcode {0}")]
    UnknownOpcode(String),

    #[error("unknown operand size {0}")]
    UnknownOperandSize(String),

    #[error("invalid operand size {size}: {reason}")]
    InvalidSize {
        size: OperandSize,
        reason: &'static str,
    },

    /// A jump names a REIL address that is not part of the same function.
    #[error("jump at {origin} targets {target} which is not in the function")]
    InvalidJumpTarget {
        origin: ReilAddress,
        target: ReilAddress,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
