use reil::{OperandSize, ReilAddress};

/// Faults raised while interpreting REIL. Interpretation stops at the faulting instruction and
/// everything written before it remains observable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A register was read before it was written or after it was explicitly undefined.
    #[error("use of undefined register {register} at {address}")]
    UseOfUndefined {
        register: String,
        address: ReilAddress,
    },

    /// A load touched a byte that was never stored.
    #[error("memory not defined at {address:#x} + {relative_offset}")]
    UnmappedMemory { address: u64, relative_offset: usize },

    /// The instruction cannot be executed by the interpreter or its policy.
    #[error("unknown instruction at {address}")]
    UnknownOpcode { address: ReilAddress },

    #[error("instruction at {address} is missing operand {position}")]
    MissingOperand { address: ReilAddress, position: usize },

    /// An operand kind that is not valid in this position, e.g. a register as a store target of
    /// the wrong kind or a sub-address outside a jump.
    #[error("invalid operand {position} of instruction at {address}")]
    InvalidOperand { address: ReilAddress, position: usize },

    /// No REIL code exists for the native address execution starts at.
    #[error("no instruction at {0:#x}")]
    InstructionNotFound(u64),

    #[error("division by zero at {address}")]
    DivisionByZero { address: ReilAddress },

    /// A native register was given a size that disagrees with the CPU policy.
    #[error("register {register} is {expected} but {actual} was provided")]
    InvalidRegisterSize {
        register: String,
        expected: OperandSize,
        actual: OperandSize,
    },

    /// Execution did not terminate within the configured number of REIL instructions.
    #[error("instruction limit of {0} exceeded")]
    InstructionLimitExceeded(u64),

    #[error(transparent)]
    Reil(#[from] reil::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
