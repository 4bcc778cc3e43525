/// Errors raised while lowering a native instruction into REIL.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No translator exists for this mnemonic.
    #[error("unsupported mnemonic {0}")]
    UnsupportedMnemonic(String),

    #[error("{mnemonic} expects {expected} operands but received {actual}")]
    InvalidOperandCount {
        mnemonic: String,
        expected: usize,
        actual: usize,
    },

    /// The operand tree has a shape or size the translator does not handle.
    #[error("unsupported operand for {mnemonic}: {reason}")]
    UnsupportedOperand { mnemonic: String, reason: String },

    /// A translator jumped to a label it never placed.
    #[error("unbound label in translation of {mnemonic}")]
    UnboundLabel { mnemonic: String },

    #[error("unknown register {0}")]
    UnknownRegister(String),

    /// The REIL model rejected a value produced during translation.
    #[error(transparent)]
    Reil(#[from] reil::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
